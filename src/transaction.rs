//! Two-phase application of bump plans to disk.
//!
//! 1. [check_preconditions]: every owning repository must be clean. All
//!    violations are collected before failing, and nothing is written.
//! 2. [stage]: each plan's new manifest is written to a hidden temporary file
//!    next to its target. Any failure removes what was staged so far.
//! 3. [StagedTransaction::commit]: temporary files are renamed onto their
//!    targets in plan order. A failure on the first rename aborts with nothing
//!    committed; a later failure is recorded and the remaining renames are
//!    still attempted. Committed files are not rolled back.
//!
//! Temporary files left behind by an aborted or partial commit are removed
//! when the [StagedTransaction] is dropped.

use crate::domain::BumpPlan;
use crate::error::{DirtyRepository, ReleaseError, Result};
use crate::git::Vcs;
use std::collections::HashSet;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Fail with every dirty owning repository if any is dirty
///
/// A repository is dirty when tracked files differ from HEAD or when it has
/// untracked files. Plans without an owning repository are not checked.
pub fn check_preconditions(plans: &[BumpPlan], vcs: &dyn Vcs) -> Result<()> {
    let mut seen = HashSet::new();
    let mut violations = Vec::new();

    for repository in plans.iter().filter_map(BumpPlan::repository) {
        if !seen.insert(repository) {
            continue;
        }

        let status_error = |e: ReleaseError| ReleaseError::RepositoryStatus {
            repository: repository.to_path_buf(),
            message: e.to_string(),
        };

        let repo = vcs.open(repository)?;
        if repo.is_dirty().map_err(status_error)? {
            violations.push(DirtyRepository {
                path: repository.to_path_buf(),
                reason: "has uncommitted changes".to_string(),
            });
        }

        let untracked = repo.untracked_files().map_err(status_error)?;
        if !untracked.is_empty() {
            violations.push(DirtyRepository {
                path: repository.to_path_buf(),
                reason: format!("has untracked files: {}", untracked.join(", ")),
            });
        }
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(ReleaseError::DirtyRepositories(violations))
    }
}

/// A temporary file waiting to replace its target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedFile {
    pub target: PathBuf,
    pub temp: PathBuf,
}

/// Every plan staged; nothing on a target path has changed yet
#[derive(Debug, Default)]
pub struct StagedTransaction {
    files: Vec<StagedFile>,
}

/// A rename that failed after earlier renames had succeeded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitFailure {
    pub path: PathBuf,
    pub message: String,
}

/// Per-file result of the commit phase
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitOutcome {
    pub committed: Vec<PathBuf>,
    pub failed: Vec<CommitFailure>,
}

impl CommitOutcome {
    /// True when every staged file reached its target
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn is_committed(&self, path: &Path) -> bool {
        self.committed.iter().any(|committed| committed == path)
    }
}

/// Write every plan's new manifest to a temporary file beside its target
///
/// # Errors
/// `StageWrite` naming the target whose temporary file could not be written.
/// Temporary files already written by this call are removed.
pub fn stage(plans: &[BumpPlan]) -> Result<StagedTransaction> {
    let mut staged = StagedTransaction::default();
    for plan in plans {
        let file = stage_one(plan)?;
        debug!(target = %file.target.display(), temp = %file.temp.display(), "staged manifest");
        staged.files.push(file);
    }
    Ok(staged)
}

fn stage_one(plan: &BumpPlan) -> Result<StagedFile> {
    let target = plan.manifest_path();
    let stage_error = |source: io::Error| ReleaseError::StageWrite {
        path: target.to_path_buf(),
        source,
    };

    let dir = match target.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let file_name = target
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let prefix = format!(".{}.", file_name);

    let mut temp = tempfile::Builder::new()
        .prefix(&prefix)
        .suffix(".tmp")
        .tempfile_in(dir)
        .map_err(stage_error)?;

    temp.write_all(plan.new_contents().as_bytes())
        .and_then(|_| temp.flush())
        .and_then(|_| temp.as_file().sync_all())
        .map_err(stage_error)?;

    // Keep the target's mode across the rename.
    if let Ok(metadata) = fs::metadata(target) {
        temp.as_file()
            .set_permissions(metadata.permissions())
            .map_err(stage_error)?;
    }

    let temp = temp
        .into_temp_path()
        .keep()
        .map_err(|e| stage_error(e.error))?;

    Ok(StagedFile {
        target: target.to_path_buf(),
        temp,
    })
}

impl StagedTransaction {
    pub fn files(&self) -> &[StagedFile] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Rename each temporary file onto its target, in staging order
    ///
    /// # Errors
    /// `CommitRename` when the very first rename fails; nothing has been
    /// committed in that case. Later failures are returned in
    /// [CommitOutcome::failed] instead.
    pub fn commit(mut self) -> Result<CommitOutcome> {
        let mut outcome = CommitOutcome::default();
        let mut pending = std::mem::take(&mut self.files).into_iter().enumerate();

        while let Some((index, file)) = pending.next() {
            match fs::rename(&file.temp, &file.target) {
                Ok(()) => {
                    debug!(target = %file.target.display(), "committed manifest");
                    outcome.committed.push(file.target);
                }
                Err(source) if index == 0 => {
                    let error = ReleaseError::CommitRename {
                        temp: file.temp.clone(),
                        target: file.target.clone(),
                        source,
                    };
                    self.files.push(file);
                    self.files.extend(pending.map(|(_, rest)| rest));
                    return Err(error);
                }
                Err(source) => {
                    warn!(
                        target = %file.target.display(),
                        error = %source,
                        "rename failed after earlier manifests were committed"
                    );
                    outcome.failed.push(CommitFailure {
                        path: file.target.clone(),
                        message: source.to_string(),
                    });
                    self.files.push(file);
                }
            }
        }

        Ok(outcome)
    }
}

impl Drop for StagedTransaction {
    fn drop(&mut self) {
        for file in &self.files {
            match fs::remove_file(&file.temp) {
                Ok(()) => debug!(temp = %file.temp.display(), "removed temporary file"),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => warn!(
                    temp = %file.temp.display(),
                    error = %e,
                    "could not remove temporary file"
                ),
            }
        }
    }
}

/// Run all three phases over `plans`
pub fn apply(plans: &[BumpPlan], vcs: &dyn Vcs) -> Result<CommitOutcome> {
    check_preconditions(plans, vcs)?;
    stage(plans)?.commit()
}
