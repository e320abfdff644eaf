//! Repository boundary tracking.
//!
//! Walks a source directory depth-first and attributes every manifest found
//! to its owning repository: the innermost directory on the path from the
//! source down to the manifest that is itself a repository root (e.g. a git
//! submodule inside a parent repository). The owner is carried down the
//! recursion as an immutable argument, so leaving a sub-repository (normally
//! or through an error) can never leak its attribution to siblings.

use crate::config::ManifestConfig;
use crate::error::{ReleaseError, Result};
use crate::git::Vcs;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Warnings raised while discovering and planning manifests.
/// These are non-fatal issues that should be reported to the user.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundaryWarning {
    /// More than one manifest attributed to the same repository
    DuplicateManifest {
        repository: Option<PathBuf>,
        first: PathBuf,
        duplicate: PathBuf,
    },
    /// Remote tags could not be fetched; the repository's tag sets are empty
    FetchFailed { repository: PathBuf, reason: String },
    /// The tag about to be created just arrived from the remote
    RemoteTagAppeared {
        repository: PathBuf,
        tag: String,
        manifest: PathBuf,
    },
}

impl fmt::Display for BoundaryWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoundaryWarning::DuplicateManifest {
                repository,
                first,
                duplicate,
            } => {
                let owner = repository
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "(no repository)".to_string());
                write!(
                    f,
                    "Multiple manifests in {}: {} and {}",
                    owner,
                    first.display(),
                    duplicate.display()
                )
            }
            BoundaryWarning::FetchFailed { repository, reason } => {
                write!(
                    f,
                    "Error fetching remote tags for repo {}: {}",
                    repository.display(),
                    reason
                )
            }
            BoundaryWarning::RemoteTagAppeared {
                repository,
                tag,
                manifest,
            } => {
                write!(
                    f,
                    "Tag '{}' for {} was just fetched from the remote of {}; someone may already be releasing it",
                    tag,
                    manifest.display(),
                    repository.display()
                )
            }
        }
    }
}

/// A manifest and the repository that owns it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredManifest {
    pub path: PathBuf,
    pub repository: Option<PathBuf>,
}

/// Everything found under one or more sources
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Discovery {
    pub manifests: Vec<DiscoveredManifest>,
    pub warnings: Vec<BoundaryWarning>,
}

/// Finds manifests and attributes them to repositories
pub struct BoundaryTracker<'a> {
    vcs: &'a dyn Vcs,
    config: &'a ManifestConfig,
}

impl<'a> BoundaryTracker<'a> {
    pub fn new(vcs: &'a dyn Vcs, config: &'a ManifestConfig) -> Self {
        BoundaryTracker { vcs, config }
    }

    /// Discover the manifests of every source, in order
    ///
    /// A manifest reached from more than one source (e.g. `repo` and
    /// `repo/pkg`) is kept once, with the attribution of the first source
    /// that found it. Fails on the first source that yields no manifest.
    pub fn discover_all<P: AsRef<Path>>(&self, sources: &[P]) -> Result<Discovery> {
        let mut all = Discovery::default();
        let mut seen = HashSet::new();
        for source in sources {
            let discovery = self.discover(source.as_ref())?;
            let before = seen.clone();
            for manifest in discovery.manifests {
                if seen.insert(manifest.path.clone()) {
                    all.manifests.push(manifest);
                } else {
                    debug!(
                        manifest = %manifest.path.display(),
                        "already discovered from an earlier source"
                    );
                }
            }
            all.warnings.extend(discovery.warnings.into_iter().filter(|warning| {
                !matches!(
                    warning,
                    BoundaryWarning::DuplicateManifest { duplicate, .. } if before.contains(duplicate)
                )
            }));
        }
        Ok(all)
    }

    /// Discover the manifests under one source
    ///
    /// A source is either a directory (walked recursively) or a manifest
    /// file. The owner of the source itself is its nearest enclosing
    /// repository.
    ///
    /// # Errors
    /// * `NoManifest` - the source does not exist or contains no manifest
    pub fn discover(&self, source: &Path) -> Result<Discovery> {
        let no_manifest = || ReleaseError::NoManifest {
            source_path: source.to_path_buf(),
            file_name: self.config.file_name.clone(),
        };

        let source = match fs::canonicalize(source) {
            Ok(path) => path,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(no_manifest()),
            Err(e) => return Err(e.into()),
        };

        let mut discovery = Discovery::default();
        let inherited = source
            .parent()
            .and_then(|parent| self.vcs.enclosing_repository(parent));

        if source.is_file() {
            discovery.manifests.push(DiscoveredManifest {
                repository: inherited,
                path: source,
            });
            return Ok(discovery);
        }

        let mut first_by_owner = HashMap::new();
        self.visit(&source, inherited.as_deref(), &mut first_by_owner, &mut discovery)?;

        if discovery.manifests.is_empty() {
            return Err(no_manifest());
        }
        Ok(discovery)
    }

    fn visit(
        &self,
        dir: &Path,
        owner: Option<&Path>,
        first_by_owner: &mut HashMap<Option<PathBuf>, PathBuf>,
        discovery: &mut Discovery,
    ) -> Result<()> {
        let owner = if self.vcs.is_repository_root(dir) {
            Some(dir)
        } else {
            owner
        };

        let candidate = dir.join(&self.config.file_name);
        if candidate.is_file() {
            let repository = owner.map(Path::to_path_buf);
            debug!(manifest = %candidate.display(), repository = ?repository, "found manifest");

            match first_by_owner.get(&repository) {
                Some(first) => discovery.warnings.push(BoundaryWarning::DuplicateManifest {
                    repository: repository.clone(),
                    first: first.clone(),
                    duplicate: candidate.clone(),
                }),
                None => {
                    first_by_owner.insert(repository.clone(), candidate.clone());
                }
            }

            discovery.manifests.push(DiscoveredManifest {
                path: candidate,
                repository,
            });
        }

        for child in self.subdirectories(dir)? {
            self.visit(&child, owner, first_by_owner, discovery)?;
        }
        Ok(())
    }

    /// Sorted, non-excluded subdirectories; symlinks are not followed
    fn subdirectories(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let with_path =
            |e: io::Error| io::Error::new(e.kind(), format!("{}: {}", dir.display(), e));

        let mut children = Vec::new();
        for entry in fs::read_dir(dir).map_err(with_path)? {
            let entry = entry.map_err(with_path)?;
            if !entry.file_type().map_err(with_path)?.is_dir() {
                continue;
            }
            let excluded = entry
                .file_name()
                .to_str()
                .is_some_and(|name| self.config.exclude_dirs.iter().any(|x| x == name));
            if !excluded {
                children.push(entry.path());
            }
        }
        children.sort();
        Ok(children)
    }
}
