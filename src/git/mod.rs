//! Git operations abstraction layer
//!
//! The release flow talks to version control only through two traits:
//!
//! - [Vcs]: opens repository handles and answers "is this directory a
//!   repository root?" for the boundary walk.
//! - [Repository]: the per-repository operations (tags, cleanliness, commit,
//!   push).
//!
//! The concrete implementations are:
//!
//! - [repository::Git2Vcs] / [repository::Git2Repository]: real repositories
//!   through the `git2` crate
//! - [mock::MockVcs] / [mock::MockRepository]: in-memory repositories used by
//!   tests to inject dirty trees and failing network calls
//!
//! # Usage
//!
//! ```rust
//! # use release_maker::git::Vcs;
//! # use std::path::Path;
//! # fn example(vcs: &dyn Vcs) -> Result<(), Box<dyn std::error::Error>> {
//! let repo = vcs.open(Path::new("/work/project"))?;
//! if repo.is_dirty()? {
//!     println!("{} has uncommitted changes", repo.path().display());
//! }
//! # Ok(())
//! # }
//! ```

pub mod mock;
pub mod repository;

pub use mock::{MockRepository, MockVcs};
pub use repository::{Git2Repository, Git2Vcs};

use crate::error::Result;
use std::collections::BTreeSet;
use std::path::Path;

/// Operations on one opened repository
///
/// ## Blocking
///
/// [fetch_remote_tags](Repository::fetch_remote_tags),
/// [push](Repository::push) and [push_tag](Repository::push_tag) perform
/// network I/O and block until the underlying client returns. No timeout is
/// applied here.
///
/// ## Error Handling
///
/// Implementations map client failures to [crate::error::ReleaseError]
/// variants; callers decide whether a failure is fatal.
pub trait Repository {
    /// Working-tree root of the repository
    fn path(&self) -> &Path;

    /// Names of all tags known locally
    fn list_tags(&self) -> Result<BTreeSet<String>>;

    /// Fetch every tag from `remote` into the local tag namespace
    fn fetch_remote_tags(&self, remote: &str) -> Result<()>;

    /// True if tracked files differ from HEAD (index or working tree)
    fn is_dirty(&self) -> Result<bool>;

    /// Paths of untracked, non-ignored files, relative to [path](Repository::path)
    fn untracked_files(&self) -> Result<Vec<String>>;

    /// Add a file to the index
    fn stage(&self, path: &Path) -> Result<()>;

    /// Commit the index on the current branch
    fn commit(&self, message: &str) -> Result<()>;

    /// Push the current branch to `remote`
    fn push(&self, remote: &str) -> Result<()>;

    /// Create an annotated tag on HEAD; never overwrites an existing tag
    fn create_tag(&self, name: &str, message: &str) -> Result<()>;

    /// Push a single tag to `remote`
    fn push_tag(&self, name: &str, remote: &str) -> Result<()>;
}

/// Factory for [Repository] handles
pub trait Vcs {
    /// Open the repository whose working-tree root is exactly `path`
    ///
    /// Fails with [crate::error::ReleaseError::NotARepository] when `path`
    /// is not a repository root (parent directories are not searched).
    fn open(&self, path: &Path) -> Result<Box<dyn Repository>>;

    /// Whether `path` is itself the root of a repository
    fn is_repository_root(&self, path: &Path) -> bool {
        self.open(path).is_ok()
    }

    /// Nearest repository root at or above `path`
    fn enclosing_repository(&self, path: &Path) -> Option<std::path::PathBuf> {
        path.ancestors()
            .find(|dir| self.is_repository_root(dir))
            .map(Path::to_path_buf)
    }
}
