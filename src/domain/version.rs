use crate::error::{ReleaseError, Result};
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

fn version_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^(\d+)\.(\d+)\.(\d+)$").expect("static regex is valid"))
}

/// Semantic version representation
///
/// Only the plain `X.Y.Z` form is supported; pre-release and build metadata
/// are rejected at parse time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl Version {
    /// Create a new version
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Version {
            major,
            minor,
            patch,
        }
    }

    /// Parse a version from its exact textual form (e.g., "1.2.3")
    pub fn parse(text: &str) -> Result<Self> {
        let captures = version_pattern()
            .captures(text)
            .ok_or_else(|| ReleaseError::Parse(text.to_string()))?;

        let component = |i: usize| -> Result<u64> {
            captures[i]
                .parse::<u64>()
                .map_err(|_| ReleaseError::Parse(text.to_string()))
        };

        Ok(Version {
            major: component(1)?,
            minor: component(2)?,
            patch: component(3)?,
        })
    }

    /// Bump version according to bump level, zeroing every lower component
    ///
    /// # Errors
    /// `VersionOverflow` when the bumped component is already `u64::MAX`.
    pub fn bump(&self, level: BumpLevel) -> Result<Self> {
        let overflow = || ReleaseError::VersionOverflow {
            version: self.to_string(),
            level: level.name().to_string(),
        };

        Ok(match level {
            BumpLevel::Major => Version::new(self.major.checked_add(1).ok_or_else(overflow)?, 0, 0),
            BumpLevel::Minor => {
                Version::new(self.major, self.minor.checked_add(1).ok_or_else(overflow)?, 0)
            }
            BumpLevel::Patch => Version::new(
                self.major,
                self.minor,
                self.patch.checked_add(1).ok_or_else(overflow)?,
            ),
        })
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for Version {
    type Err = ReleaseError;

    fn from_str(s: &str) -> Result<Self> {
        Version::parse(s)
    }
}

/// Which version component to increment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BumpLevel {
    Major,
    Minor,
    Patch,
}

impl BumpLevel {
    pub fn name(&self) -> &'static str {
        match self {
            BumpLevel::Major => "major",
            BumpLevel::Minor => "minor",
            BumpLevel::Patch => "patch",
        }
    }
}

impl fmt::Display for BumpLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BumpLevel {
    type Err = ReleaseError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "major" => Ok(BumpLevel::Major),
            "minor" => Ok(BumpLevel::Minor),
            "patch" => Ok(BumpLevel::Patch),
            other => Err(ReleaseError::InvalidLevel(other.to_string())),
        }
    }
}

/// Bumps a textual version by a textual level.
///
/// # Example
/// ```
/// use release_maker::domain::version::bump;
///
/// assert_eq!(bump("1.2.3", "minor").unwrap(), "1.3.0");
/// assert_eq!(bump("0.9.9", "patch").unwrap(), "0.9.10");
/// assert!(bump("v1.2.3", "major").is_err());
/// ```
pub fn bump(version: &str, level: &str) -> Result<String> {
    let version = Version::parse(version)?;
    let level = level.parse::<BumpLevel>()?;
    Ok(version.bump(level)?.to_string())
}
