//! Main workflow orchestration logic
//!
//! Sequences discovery, planning, the report, the file transaction and
//! publishing. Kept apart from `main.rs` so the workflow can be driven with
//! any [Vcs] implementation and without clap.

use std::path::PathBuf;

use crate::boundary::{BoundaryTracker, BoundaryWarning};
use crate::config::Config;
use crate::domain::{BumpLevel, BumpPlan};
use crate::error::{ReleaseError, Result};
use crate::git::Vcs;
use crate::planner::BumpPlanner;
use crate::publish::{PublishReport, ReleasePublisher};
use crate::transaction::{self, CommitOutcome};
use crate::ui;

/// Arguments for the release workflow
///
/// Mirrors the CLI Args after the paired flags have been resolved against
/// the configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ReleaseWorkflowArgs {
    /// Directories to search for manifests, or manifest files
    pub sources: Vec<PathBuf>,

    pub level: BumpLevel,

    /// Directory report paths are shown relative to
    pub root: PathBuf,

    /// Compute and report, but never write
    pub dry_run: bool,

    /// Create and push `vX.Y.Z` tags after committing
    pub create_tags: bool,

    /// Fetch remote tags before planning
    pub fetch_remote_tags: bool,

    /// Print the plan report even when not a dry run
    pub verbose: bool,
}

/// Everything a release run produced
#[derive(Debug, Clone)]
pub struct WorkflowResult {
    pub plans: Vec<BumpPlan>,
    pub warnings: Vec<BoundaryWarning>,

    /// `None` for a dry run
    pub commit: Option<CommitOutcome>,

    /// `None` for a dry run
    pub publish: Option<PublishReport>,
}

impl WorkflowResult {
    /// True when every manifest was written and every publish step succeeded
    pub fn is_success(&self) -> bool {
        self.commit.as_ref().map_or(true, CommitOutcome::is_complete)
            && self.publish.as_ref().map_or(true, PublishReport::is_success)
    }
}

/// Main release workflow
///
/// 1. Discover manifests and their owning repositories
/// 2. Plan the bump (fetching remote tags once per repository if asked)
/// 3. Print the report when verbose or dry run
/// 4. Check every repository is clean, stage, commit to disk
/// 5. Commit, push and tag in each repository
///
/// # Arguments
///
/// * `args` - Resolved workflow arguments
/// * `config` - Loaded configuration
/// * `vcs` - Version control access
///
/// # Returns
///
/// The run's plans and outcomes. Errors that stop the run before any file is
/// replaced (invalid root, missing or malformed manifests, dirty
/// repositories, staging failures, a failed first rename) are returned as
/// `Err`; later per-file and per-repository failures are in the result.
pub fn run_release_workflow(
    args: &ReleaseWorkflowArgs,
    config: &Config,
    vcs: &dyn Vcs,
) -> Result<WorkflowResult> {
    if !args.root.is_dir() {
        return Err(ReleaseError::InvalidRoot(args.root.clone()));
    }
    let root = args.root.canonicalize()?;

    let discovery =
        BoundaryTracker::new(vcs, &config.manifest).discover_all(args.sources.as_slice())?;
    let plan_set = BumpPlanner::new(vcs, &config.release.remote).plan(
        &discovery.manifests,
        args.level,
        args.fetch_remote_tags,
    )?;

    let mut warnings = discovery.warnings;
    warnings.extend(plan_set.warnings);
    for warning in &warnings {
        ui::display_boundary_warning(warning);
    }

    if args.verbose || args.dry_run {
        ui::display_plan_report(args.level, &args.sources, &plan_set.plans, &root);
    }

    if args.dry_run {
        ui::display_dry_run_complete();
        return Ok(WorkflowResult {
            plans: plan_set.plans,
            warnings,
            commit: None,
            publish: None,
        });
    }

    let commit = transaction::apply(&plan_set.plans, vcs)?;
    ui::display_commit_outcome(&commit, &root);

    let publish = ReleasePublisher::new(vcs, &config.release, args.create_tags)
        .publish(&plan_set.plans, &commit);
    ui::display_publish_report(&publish, &root);

    Ok(WorkflowResult {
        plans: plan_set.plans,
        warnings,
        commit: Some(commit),
        publish: Some(publish),
    })
}
