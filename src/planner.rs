use crate::boundary::{BoundaryWarning, DiscoveredManifest};
use crate::domain::{BumpLevel, BumpPlan, TagSnapshot};
use crate::error::Result;
use crate::git::Vcs;
use crate::manifest::Manifest;
use crate::reconcile::TagReconciler;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Plans for every discovered manifest, plus the warnings raised on the way
#[derive(Debug, Clone, Default)]
pub struct PlanSet {
    pub plans: Vec<BumpPlan>,
    pub warnings: Vec<BoundaryWarning>,
}

/// Turns discovered manifests into bump plans
pub struct BumpPlanner<'a> {
    vcs: &'a dyn Vcs,
    reconciler: TagReconciler,
}

impl<'a> BumpPlanner<'a> {
    /// `remote` is where tags are fetched from when reconciliation is requested
    pub fn new(vcs: &'a dyn Vcs, remote: &str) -> Self {
        BumpPlanner {
            vcs,
            reconciler: TagReconciler::new(remote),
        }
    }

    /// Plan a bump of every manifest by `level`
    ///
    /// Tags are looked up once per distinct owning repository and shared by
    /// all plans of that repository. With `fetch_remote_tags`, the lookup
    /// fetches from the remote first.
    ///
    /// # Errors
    /// Any manifest that cannot be read, has no `[project]` version, or has a
    /// malformed version aborts the whole planning run.
    pub fn plan(
        &self,
        manifests: &[DiscoveredManifest],
        level: BumpLevel,
        fetch_remote_tags: bool,
    ) -> Result<PlanSet> {
        let mut set = PlanSet::default();
        let mut tags_by_repository: HashMap<PathBuf, TagSnapshot> = HashMap::new();

        for discovered in manifests {
            let manifest = Manifest::load(&discovered.path)?;
            // Validate before touching the network.
            manifest.version()?;

            let tags = match &discovered.repository {
                Some(repository) => match tags_by_repository.get(repository) {
                    Some(tags) => tags.clone(),
                    None => {
                        let tags = self.snapshot(repository, fetch_remote_tags, &mut set.warnings)?;
                        tags_by_repository.insert(repository.clone(), tags.clone());
                        tags
                    }
                },
                None => TagSnapshot::default(),
            };

            let plan = BumpPlan::new(&manifest, level, discovered.repository.clone(), tags)?;

            if let Some(repository) = plan.repository() {
                if plan.tags().was_fetched(&plan.new_tag()) {
                    set.warnings.push(BoundaryWarning::RemoteTagAppeared {
                        repository: repository.to_path_buf(),
                        tag: plan.new_tag().name(),
                        manifest: plan.manifest_path().to_path_buf(),
                    });
                }
            }

            set.plans.push(plan);
        }

        Ok(set)
    }

    fn snapshot(
        &self,
        repository: &Path,
        fetch_remote_tags: bool,
        warnings: &mut Vec<BoundaryWarning>,
    ) -> Result<TagSnapshot> {
        let repo = self.vcs.open(repository)?;
        if !fetch_remote_tags {
            return Ok(TagSnapshot::local(repo.list_tags()?));
        }

        let reconciled = self.reconciler.reconcile(repo.as_ref());
        warnings.extend(reconciled.warning);
        Ok(reconciled.snapshot)
    }
}
