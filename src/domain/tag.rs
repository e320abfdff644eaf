use crate::domain::version::Version;
use crate::error::{ReleaseError, Result};
use std::collections::BTreeSet;
use std::fmt;

/// Prefix every release tag carries in front of the version
pub const TAG_PREFIX: &str = "v";

/// A release tag of the exact form `vX.Y.Z`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Tag {
    version: Version,
}

impl Tag {
    /// Tag naming the given version
    pub fn for_version(version: Version) -> Self {
        Tag { version }
    }

    /// Parse a tag name (e.g., "v1.2.3")
    pub fn parse(name: &str) -> Result<Self> {
        let rest = name
            .strip_prefix(TAG_PREFIX)
            .ok_or_else(|| ReleaseError::Parse(name.to_string()))?;
        let version = Version::parse(rest).map_err(|_| ReleaseError::Parse(name.to_string()))?;
        Ok(Tag { version })
    }

    /// Version named by this tag
    pub fn version(&self) -> Version {
        self.version
    }

    pub fn name(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", TAG_PREFIX, self.version)
    }
}

impl From<Version> for Tag {
    fn from(version: Version) -> Self {
        Tag::for_version(version)
    }
}

/// Tags of one repository as seen at plan-creation time
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagSnapshot {
    /// Every tag known locally (after the fetch, when one happened)
    pub known: BTreeSet<String>,
    /// Tags that appeared through the fetch; `None` when no fetch was requested
    pub fetched: Option<BTreeSet<String>>,
}

impl TagSnapshot {
    /// Snapshot of local tags only, without a remote fetch
    pub fn local(known: BTreeSet<String>) -> Self {
        TagSnapshot {
            known,
            fetched: None,
        }
    }

    pub fn contains(&self, tag: &Tag) -> bool {
        self.known.contains(&tag.name())
    }

    /// Whether `tag` only became visible through this run's fetch
    pub fn was_fetched(&self, tag: &Tag) -> bool {
        self.fetched
            .as_ref()
            .is_some_and(|fetched| fetched.contains(&tag.name()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_for_version() {
        let tag = Tag::for_version(Version::new(1, 2, 3));
        assert_eq!(tag.name(), "v1.2.3");
    }

    #[test]
    fn test_tag_parse() {
        let tag = Tag::parse("v1.2.3").unwrap();
        assert_eq!(tag.version(), Version::new(1, 2, 3));
    }

    #[test]
    fn test_tag_parse_rejects_other_forms() {
        for name in ["1.2.3", "V1.2.3", "v1.2", "release-1.2.3", "v1.2.3-rc1"] {
            assert!(Tag::parse(name).is_err(), "{:?} should not parse", name);
        }
    }

    #[test]
    fn test_tag_parse_error_reports_full_name() {
        match Tag::parse("v1.x.3") {
            Err(ReleaseError::Parse(text)) => assert_eq!(text, "v1.x.3"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_snapshot_lookup() {
        let snapshot = TagSnapshot {
            known: ["v1.0.0".to_string(), "v1.1.0".to_string()].into_iter().collect(),
            fetched: Some(["v1.1.0".to_string()].into_iter().collect()),
        };
        let old = Tag::for_version(Version::new(1, 0, 0));
        let new = Tag::for_version(Version::new(1, 1, 0));

        assert!(snapshot.contains(&old));
        assert!(!snapshot.was_fetched(&old));
        assert!(snapshot.was_fetched(&new));
        assert!(!TagSnapshot::local(snapshot.known.clone()).was_fetched(&new));
    }
}
