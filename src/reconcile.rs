//! Remote tag reconciliation for a single repository.
//!
//! Snapshot local tags, fetch every remote tag, snapshot again; the
//! difference is what the remote knew that we did not. A tag that shows up
//! here for the version about to be released usually means someone else is
//! already releasing it.

use crate::boundary::BoundaryWarning;
use crate::domain::TagSnapshot;
use crate::error::Result;
use crate::git::Repository;
use std::collections::BTreeSet;
use tracing::debug;

/// Outcome of reconciling one repository
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciled {
    pub snapshot: TagSnapshot,
    /// Set when the fetch failed and the snapshot is empty
    pub warning: Option<BoundaryWarning>,
}

/// Fetches remote tags and computes which are newly visible
#[derive(Debug, Clone)]
pub struct TagReconciler {
    remote: String,
}

impl TagReconciler {
    pub fn new(remote: impl Into<String>) -> Self {
        TagReconciler {
            remote: remote.into(),
        }
    }

    /// Fetch and diff, propagating any client error
    pub fn fetch_and_diff(&self, repo: &dyn Repository) -> Result<TagSnapshot> {
        let before = repo.list_tags()?;
        debug!(repository = %repo.path().display(), tags = ?before, "local tags before fetch");

        repo.fetch_remote_tags(&self.remote)?;

        let after = repo.list_tags()?;
        debug!(repository = %repo.path().display(), tags = ?after, "local tags after fetch");

        let fetched: BTreeSet<String> = after.difference(&before).cloned().collect();
        debug!(repository = %repo.path().display(), tags = ?fetched, "fetched tags");

        Ok(TagSnapshot {
            known: after,
            fetched: Some(fetched),
        })
    }

    /// Fetch and diff; a failure is reported as a warning and yields empty
    /// tag sets instead of aborting the run
    pub fn reconcile(&self, repo: &dyn Repository) -> Reconciled {
        match self.fetch_and_diff(repo) {
            Ok(snapshot) => Reconciled {
                snapshot,
                warning: None,
            },
            Err(e) => Reconciled {
                snapshot: TagSnapshot {
                    known: BTreeSet::new(),
                    fetched: Some(BTreeSet::new()),
                },
                warning: Some(BoundaryWarning::FetchFailed {
                    repository: repo.path().to_path_buf(),
                    reason: e.to_string(),
                }),
            },
        }
    }
}
