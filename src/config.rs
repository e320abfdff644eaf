use crate::error::{ReleaseError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the project-local configuration file
pub const CONFIG_FILE_NAME: &str = "release-maker.toml";

/// Placeholder substituted with the new version in messages
pub const VERSION_PLACEHOLDER: &str = "{version}";

/// Represents the complete configuration for release-maker.
///
/// Contains manifest discovery settings, release (commit/tag/push) settings and
/// default values for the command-line switches.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct Config {
    #[serde(default)]
    pub manifest: ManifestConfig,

    #[serde(default)]
    pub release: ReleaseConfig,

    #[serde(default)]
    pub behavior: BehaviorConfig,
}

fn default_file_name() -> String {
    "pyproject.toml".to_string()
}

/// Returns the directories the manifest walk never descends into.
fn default_exclude_dirs() -> Vec<String> {
    vec![
        ".git".to_string(),
        "node_modules".to_string(),
        ".venv".to_string(),
        "__pycache__".to_string(),
    ]
}

/// Which files are manifests and where not to look for them.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ManifestConfig {
    #[serde(default = "default_file_name")]
    pub file_name: String,

    #[serde(default = "default_exclude_dirs")]
    pub exclude_dirs: Vec<String>,
}

impl Default for ManifestConfig {
    fn default() -> Self {
        ManifestConfig {
            file_name: default_file_name(),
            exclude_dirs: default_exclude_dirs(),
        }
    }
}

fn default_remote() -> String {
    "origin".to_string()
}

fn default_commit_message() -> String {
    "Bump version to v{version}".to_string()
}

fn default_tag_message() -> String {
    "Release v{version}".to_string()
}

/// Settings for the commit, tag and push steps.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ReleaseConfig {
    #[serde(default = "default_remote")]
    pub remote: String,

    #[serde(default = "default_commit_message")]
    pub commit_message: String,

    #[serde(default = "default_tag_message")]
    pub tag_message: String,
}

impl Default for ReleaseConfig {
    fn default() -> Self {
        ReleaseConfig {
            remote: default_remote(),
            commit_message: default_commit_message(),
            tag_message: default_tag_message(),
        }
    }
}

impl ReleaseConfig {
    /// Commit message for a bump to `version`
    pub fn commit_message_for(&self, version: &str) -> String {
        self.commit_message.replace(VERSION_PLACEHOLDER, version)
    }

    /// Annotation message for the tag of `version`
    pub fn tag_message_for(&self, version: &str) -> String {
        self.tag_message.replace(VERSION_PLACEHOLDER, version)
    }
}

fn default_true() -> bool {
    true
}

/// Defaults for the paired `--flag` / `--no-flag` switches.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct BehaviorConfig {
    #[serde(default = "default_true")]
    pub verbose: bool,

    #[serde(default)]
    pub dry_run: bool,

    #[serde(default)]
    pub create_tags: bool,

    #[serde(default)]
    pub fetch_remote_tags: bool,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        BehaviorConfig {
            verbose: true,
            dry_run: false,
            create_tags: false,
            fetch_remote_tags: false,
        }
    }
}

/// Loads configuration from file or returns defaults.
///
/// Attempts to load configuration in the following order:
/// 1. Custom path provided as parameter
/// 2. `release-maker.toml` in current directory
/// 3. `.release-maker.toml` in user config directory
/// 4. Default configuration if no file found
///
/// # Returns
/// * `Ok(Config)` - Loaded or default configuration
/// * `Err` - If file exists but cannot be read or parsed
pub fn load_config(config_path: Option<&Path>) -> Result<Config> {
    let path = match config_path {
        Some(path) => Some(path.to_path_buf()),
        None => default_config_path(),
    };

    match path {
        Some(path) => load_from(&path),
        None => Ok(Config::default()),
    }
}

fn default_config_path() -> Option<PathBuf> {
    let local = Path::new(".").join(CONFIG_FILE_NAME);
    if local.exists() {
        return Some(local);
    }

    dirs::config_dir()
        .map(|dir| dir.join(format!(".{}", CONFIG_FILE_NAME)))
        .filter(|path| path.exists())
}

fn load_from(path: &Path) -> Result<Config> {
    let text = fs::read_to_string(path)
        .map_err(|e| ReleaseError::config(format!("cannot read {}: {}", path.display(), e)))?;
    toml::from_str(&text)
        .map_err(|e| ReleaseError::config(format!("cannot parse {}: {}", path.display(), e)))
}
