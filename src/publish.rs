use crate::config::ReleaseConfig;
use crate::domain::BumpPlan;
use crate::error::Result;
use crate::git::{Repository, Vcs};
use crate::transaction::CommitOutcome;
use std::fmt;
use std::path::PathBuf;
use tracing::debug;

/// What happened to the release tag of one published manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagOutcome {
    /// Created and pushed
    Created,
    /// Present before this step ran; left alone
    AlreadyExists,
    /// Tag creation was not requested
    Disabled,
    /// Not attempted because the commit or push failed
    Skipped,
    /// Creating or pushing the tag failed
    Failed(String),
}

impl fmt::Display for TagOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagOutcome::Created => write!(f, "created"),
            TagOutcome::AlreadyExists => write!(f, "already exists"),
            TagOutcome::Disabled => write!(f, "not requested"),
            TagOutcome::Skipped => write!(f, "skipped"),
            TagOutcome::Failed(reason) => write!(f, "failed: {}", reason),
        }
    }
}

/// Publish result for one manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishEntry {
    pub repository: PathBuf,
    pub manifest: PathBuf,
    pub tag: String,
    /// Commit or push failure, if any
    pub error: Option<String>,
    pub tag_outcome: TagOutcome,
}

impl PublishEntry {
    pub fn is_success(&self) -> bool {
        self.error.is_none() && !matches!(self.tag_outcome, TagOutcome::Failed(_))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishReport {
    pub entries: Vec<PublishEntry>,
}

impl PublishReport {
    pub fn is_success(&self) -> bool {
        self.entries.iter().all(PublishEntry::is_success)
    }
}

/// Commits, pushes and tags committed manifests
///
/// Failures are recorded per manifest and never stop the remaining ones.
pub struct ReleasePublisher<'a> {
    vcs: &'a dyn Vcs,
    release: &'a ReleaseConfig,
    create_tags: bool,
}

impl<'a> ReleasePublisher<'a> {
    pub fn new(vcs: &'a dyn Vcs, release: &'a ReleaseConfig, create_tags: bool) -> Self {
        ReleasePublisher {
            vcs,
            release,
            create_tags,
        }
    }

    /// Publish every plan that was committed to disk and has an owning
    /// repository
    pub fn publish(&self, plans: &[BumpPlan], outcome: &CommitOutcome) -> PublishReport {
        let mut report = PublishReport::default();

        for plan in plans {
            let Some(repository) = plan.repository() else {
                debug!(manifest = %plan.manifest_path().display(), "no owning repository, not publishing");
                continue;
            };
            if !outcome.is_committed(plan.manifest_path()) {
                continue;
            }

            let tag = plan.new_tag().name();
            let mut entry = PublishEntry {
                repository: repository.to_path_buf(),
                manifest: plan.manifest_path().to_path_buf(),
                tag: tag.clone(),
                error: None,
                tag_outcome: TagOutcome::Disabled,
            };

            let repo = match self.vcs.open(repository) {
                Ok(repo) => repo,
                Err(e) => {
                    entry.error = Some(e.to_string());
                    entry.tag_outcome = self.skipped();
                    report.entries.push(entry);
                    continue;
                }
            };

            if let Err(e) = self.commit_and_push(repo.as_ref(), plan) {
                entry.error = Some(e.to_string());
                entry.tag_outcome = self.skipped();
                report.entries.push(entry);
                continue;
            }

            if self.create_tags {
                entry.tag_outcome = self.tag(repo.as_ref(), plan, &tag);
            }
            report.entries.push(entry);
        }

        report
    }

    fn skipped(&self) -> TagOutcome {
        if self.create_tags {
            TagOutcome::Skipped
        } else {
            TagOutcome::Disabled
        }
    }

    fn commit_and_push(&self, repo: &dyn Repository, plan: &BumpPlan) -> Result<()> {
        let version = plan.new_version().to_string();
        repo.stage(plan.manifest_path())?;
        repo.commit(&self.release.commit_message_for(&version))?;
        repo.push(&self.release.remote)?;
        debug!(repository = %repo.path().display(), version = %version, "committed and pushed");
        Ok(())
    }

    fn tag(&self, repo: &dyn Repository, plan: &BumpPlan, tag: &str) -> TagOutcome {
        // The snapshot is from planning time; tags created since then (by an
        // earlier manifest of this run) only show up in the live list.
        let exists = plan.new_tag_exists()
            || match repo.list_tags() {
                Ok(tags) => tags.contains(tag),
                Err(e) => return TagOutcome::Failed(e.to_string()),
            };
        if exists {
            debug!(repository = %repo.path().display(), tag, "tag already exists");
            return TagOutcome::AlreadyExists;
        }

        let version = plan.new_version().to_string();
        let result = repo
            .create_tag(tag, &self.release.tag_message_for(&version))
            .and_then(|_| repo.push_tag(tag, &self.release.remote));

        match result {
            Ok(()) => TagOutcome::Created,
            Err(e) => TagOutcome::Failed(e.to_string()),
        }
    }
}
