use crate::domain::tag::{Tag, TagSnapshot};
use crate::domain::version::{BumpLevel, Version};
use crate::error::Result;
use crate::manifest::Manifest;
use std::path::{Path, PathBuf};

/// Planned version bump of one manifest.
///
/// Built once from the parsed manifest and never mutated afterwards: the
/// bumped document is a separate value from the parsed original, so staging
/// the same plan twice writes the same bytes.
#[derive(Debug, Clone)]
pub struct BumpPlan {
    manifest_path: PathBuf,
    repository: Option<PathBuf>,
    old_version: Version,
    new_version: Version,
    bumped: Manifest,
    tags: TagSnapshot,
}

impl BumpPlan {
    /// Plan bumping `manifest` by `level`
    ///
    /// # Errors
    /// * `MissingSection` / `MissingVersion` - the manifest has no `[project]` version
    /// * `Parse` - the current version is not `X.Y.Z`
    /// * `VersionOverflow` - the bumped component cannot grow any further
    pub fn new(
        manifest: &Manifest,
        level: BumpLevel,
        repository: Option<PathBuf>,
        tags: TagSnapshot,
    ) -> Result<Self> {
        let old_version = manifest.version()?;
        let new_version = old_version.bump(level)?;
        let bumped = manifest.with_version(&new_version)?;

        Ok(BumpPlan {
            manifest_path: manifest.path().to_path_buf(),
            repository,
            old_version,
            new_version,
            bumped,
            tags,
        })
    }

    pub fn manifest_path(&self) -> &Path {
        &self.manifest_path
    }

    /// Owning repository, if the manifest lives inside one
    pub fn repository(&self) -> Option<&Path> {
        self.repository.as_deref()
    }

    pub fn old_version(&self) -> Version {
        self.old_version
    }

    pub fn new_version(&self) -> Version {
        self.new_version
    }

    pub fn old_tag(&self) -> Tag {
        Tag::for_version(self.old_version)
    }

    pub fn new_tag(&self) -> Tag {
        Tag::for_version(self.new_version)
    }

    pub fn tags(&self) -> &TagSnapshot {
        &self.tags
    }

    /// Serialized bumped manifest
    pub fn new_contents(&self) -> String {
        self.bumped.render()
    }

    pub fn old_tag_exists(&self) -> bool {
        self.tags.contains(&self.old_tag())
    }

    pub fn new_tag_exists(&self) -> bool {
        self.tags.contains(&self.new_tag())
    }

    /// Directory of the manifest relative to `root`, or the full manifest
    /// path when it lies outside `root`
    pub fn display_dir(&self, root: &Path) -> PathBuf {
        match self.manifest_path.strip_prefix(root) {
            Ok(relative) => relative
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_default(),
            Err(_) => self.manifest_path.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn manifest(path: &str, version: &str) -> Manifest {
        let text = format!("[project]\nname = \"demo\"\nversion = \"{}\"\n", version);
        Manifest::parse(Path::new(path), &text).unwrap()
    }

    fn tags(names: &[&str]) -> TagSnapshot {
        TagSnapshot::local(names.iter().map(|s| s.to_string()).collect::<BTreeSet<_>>())
    }

    #[test]
    fn test_plan_versions() {
        let plan = BumpPlan::new(
            &manifest("/work/pkg/pyproject.toml", "1.2.3"),
            BumpLevel::Minor,
            Some(PathBuf::from("/work")),
            TagSnapshot::default(),
        )
        .unwrap();

        assert_eq!(plan.old_version(), Version::new(1, 2, 3));
        assert_eq!(plan.new_version(), Version::new(1, 3, 0));
        assert_eq!(plan.new_tag().name(), "v1.3.0");
        assert_eq!(plan.repository(), Some(Path::new("/work")));
        assert!(plan.new_contents().contains("version = \"1.3.0\""));
    }

    #[test]
    fn test_tag_existence() {
        let plan = BumpPlan::new(
            &manifest("/work/pyproject.toml", "1.2.3"),
            BumpLevel::Patch,
            None,
            tags(&["v1.2.3", "v1.2.4"]),
        )
        .unwrap();

        assert!(plan.old_tag_exists());
        assert!(plan.new_tag_exists());

        let fresh = BumpPlan::new(
            &manifest("/work/pyproject.toml", "1.2.3"),
            BumpLevel::Major,
            None,
            tags(&["v1.2.3"]),
        )
        .unwrap();
        assert!(!fresh.new_tag_exists());
    }

    #[test]
    fn test_display_dir() {
        let plan = BumpPlan::new(
            &manifest("/work/libs/geo/pyproject.toml", "0.1.0"),
            BumpLevel::Patch,
            None,
            TagSnapshot::default(),
        )
        .unwrap();

        assert_eq!(plan.display_dir(Path::new("/work")), PathBuf::from("libs/geo"));
        assert_eq!(
            plan.display_dir(Path::new("/elsewhere")),
            PathBuf::from("/work/libs/geo/pyproject.toml")
        );
    }

    #[test]
    fn test_malformed_version_fails_planning() {
        let result = BumpPlan::new(
            &manifest("/work/pyproject.toml", "1.2.3-rc1"),
            BumpLevel::Patch,
            None,
            TagSnapshot::default(),
        );
        assert!(result.is_err());
    }
}
