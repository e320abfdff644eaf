use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// A repository that failed the clean-working-tree precondition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirtyRepository {
    pub path: PathBuf,
    pub reason: String,
}

impl fmt::Display for DirtyRepository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.reason)
    }
}

/// Unified error type for release-maker operations
#[derive(Error, Debug)]
pub enum ReleaseError {
    #[error("Invalid version format: '{0}' - expected X.Y.Z where X, Y, Z are integers")]
    Parse(String),

    #[error("Invalid bump level: '{0}' - must be one of: major, minor, patch")]
    InvalidLevel(String),

    #[error("Cannot bump {version} by {level}: the component is already at its maximum")]
    VersionOverflow { version: String, level: String },

    #[error("No [project] section found in {}", .0.display())]
    MissingSection(PathBuf),

    #[error("No version found in the [project] section of {}", .0.display())]
    MissingVersion(PathBuf),

    #[error("Cannot read manifest {}: {source}", .path.display())]
    ManifestRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot parse manifest {}: {message}", .path.display())]
    ManifestSyntax { path: PathBuf, message: String },

    #[error("No {file_name} found in {}", .source_path.display())]
    NoManifest {
        source_path: PathBuf,
        file_name: String,
    },

    #[error("Remote operation failed for {}: {message}", .repository.display())]
    Remote {
        repository: PathBuf,
        message: String,
    },

    #[error("Not a git repository: {}", .0.display())]
    NotARepository(PathBuf),

    #[error("Cannot read the status of {}: {message}", .repository.display())]
    RepositoryStatus {
        repository: PathBuf,
        message: String,
    },

    #[error("{} repository(ies) not clean: {}", .0.len(), join_dirty(.0))]
    DirtyRepositories(Vec<DirtyRepository>),

    #[error("Failed to write temporary file for {}: {source}", .path.display())]
    StageWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to replace {} with {}: {source}", .target.display(), .temp.display())]
    CommitRename {
        temp: PathBuf,
        target: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Publish failed for {}: {message}", .repository.display())]
    Publish {
        repository: PathBuf,
        message: String,
    },

    #[error("The root directory {} is not a directory", .0.display())]
    InvalidRoot(PathBuf),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Git operation failed: {0}")]
    Git(#[from] git2::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn join_dirty(repos: &[DirtyRepository]) -> String {
    repos
        .iter()
        .map(|r| r.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Convenience type alias for Results in release-maker
pub type Result<T> = std::result::Result<T, ReleaseError>;

impl ReleaseError {
    /// Create a configuration error with context
    pub fn config(msg: impl Into<String>) -> Self {
        ReleaseError::Config(msg.into())
    }

    /// Create a remote (fetch) error for a repository
    pub fn remote(repository: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        ReleaseError::Remote {
            repository: repository.into(),
            message: msg.into(),
        }
    }

    /// Create a publish error for a repository
    pub fn publish(repository: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        ReleaseError::Publish {
            repository: repository.into(),
            message: msg.into(),
        }
    }
}
