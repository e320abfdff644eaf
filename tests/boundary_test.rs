use std::fs;
use std::path::{Path, PathBuf};

use git2::Repository as Git2Repo;
use release_maker::boundary::{BoundaryTracker, BoundaryWarning};
use release_maker::config::ManifestConfig;
use release_maker::git::{Git2Vcs, Vcs};
use release_maker::ReleaseError;
use tempfile::TempDir;

fn write_manifest(dir: &Path) -> PathBuf {
    fs::create_dir_all(dir).unwrap();
    let path = dir.join("pyproject.toml");
    fs::write(&path, "[project]\nname = \"pkg\"\nversion = \"0.1.0\"\n").unwrap();
    path
}

/// parent/(git)  parent/sub/(git)  parent/sub/pkgA  parent/pkgB
fn nested_tree() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let parent = tmp.path().canonicalize().unwrap().join("parent");
    fs::create_dir_all(parent.join("sub")).unwrap();
    Git2Repo::init(&parent).unwrap();
    Git2Repo::init(parent.join("sub")).unwrap();
    write_manifest(&parent.join("sub").join("pkgA"));
    write_manifest(&parent.join("pkgB"));
    (tmp, parent)
}

// ============================================================================
// Attribution against real git repositories
// ============================================================================

#[test]
fn test_nested_repository_attribution() {
    let (_tmp, parent) = nested_tree();
    let config = ManifestConfig::default();

    let discovery = BoundaryTracker::new(&Git2Vcs, &config)
        .discover(&parent)
        .unwrap();

    let owners: Vec<(PathBuf, Option<PathBuf>)> = discovery
        .manifests
        .into_iter()
        .map(|m| (m.path, m.repository))
        .collect();

    assert_eq!(
        owners,
        vec![
            (
                parent.join("pkgB").join("pyproject.toml"),
                Some(parent.clone())
            ),
            (
                parent.join("sub").join("pkgA").join("pyproject.toml"),
                Some(parent.join("sub"))
            ),
        ]
    );
}

#[test]
fn test_source_below_repository_root_uses_enclosing_repository() {
    let (_tmp, parent) = nested_tree();
    let config = ManifestConfig::default();
    let tracker = BoundaryTracker::new(&Git2Vcs, &config);

    let from_dir = tracker.discover(&parent.join("sub").join("pkgA")).unwrap();
    assert_eq!(from_dir.manifests[0].repository, Some(parent.join("sub")));

    let from_file = tracker
        .discover(&parent.join("pkgB").join("pyproject.toml"))
        .unwrap();
    assert_eq!(from_file.manifests[0].repository, Some(parent.clone()));
}

#[test]
fn test_git2_vcs_finds_enclosing_repository() {
    let (_tmp, parent) = nested_tree();

    assert!(Git2Vcs.is_repository_root(&parent));
    assert!(!Git2Vcs.is_repository_root(&parent.join("pkgB")));
    assert_eq!(
        Git2Vcs.enclosing_repository(&parent.join("sub").join("pkgA")),
        Some(parent.join("sub"))
    );
}

#[test]
fn test_two_manifests_in_one_repository_warn() {
    let (_tmp, parent) = nested_tree();
    write_manifest(&parent.join("pkgC"));
    let config = ManifestConfig::default();

    let discovery = BoundaryTracker::new(&Git2Vcs, &config)
        .discover(&parent)
        .unwrap();

    assert_eq!(discovery.manifests.len(), 3);
    assert_eq!(
        discovery.warnings,
        vec![BoundaryWarning::DuplicateManifest {
            repository: Some(parent.clone()),
            first: parent.join("pkgB").join("pyproject.toml"),
            duplicate: parent.join("pkgC").join("pyproject.toml"),
        }]
    );
}

#[test]
fn test_source_without_manifest_is_fatal() {
    let (_tmp, parent) = nested_tree();
    let empty = parent.join("docs");
    fs::create_dir_all(&empty).unwrap();
    let config = ManifestConfig::default();

    let result = BoundaryTracker::new(&Git2Vcs, &config).discover_all(&[&parent, &empty]);

    match result {
        Err(ReleaseError::NoManifest {
            source_path,
            file_name,
        }) => {
            assert_eq!(source_path, empty);
            assert_eq!(file_name, "pyproject.toml");
        }
        other => panic!("expected NoManifest, got {:?}", other),
    }
}

// ============================================================================
// BoundaryWarning Display Tests
// ============================================================================

#[test]
fn test_boundary_warning_duplicate_manifest_display() {
    let warning = BoundaryWarning::DuplicateManifest {
        repository: Some(PathBuf::from("/work/repo")),
        first: PathBuf::from("/work/repo/a/pyproject.toml"),
        duplicate: PathBuf::from("/work/repo/b/pyproject.toml"),
    };

    let display_msg = warning.to_string();
    assert!(
        display_msg.contains("/work/repo/a/pyproject.toml")
            && display_msg.contains("/work/repo/b/pyproject.toml"),
        "Message should name both manifests, got: {}",
        display_msg
    );
}

#[test]
fn test_boundary_warning_duplicate_without_repository_display() {
    let warning = BoundaryWarning::DuplicateManifest {
        repository: None,
        first: PathBuf::from("/a/pyproject.toml"),
        duplicate: PathBuf::from("/b/pyproject.toml"),
    };

    assert!(warning.to_string().contains("(no repository)"));
}

#[test]
fn test_boundary_warning_fetch_failed_display() {
    let warning = BoundaryWarning::FetchFailed {
        repository: PathBuf::from("/work/repo"),
        reason: "could not resolve host".to_string(),
    };

    assert_eq!(
        warning.to_string(),
        "Error fetching remote tags for repo /work/repo: could not resolve host"
    );
}

#[test]
fn test_boundary_warning_remote_tag_display() {
    let warning = BoundaryWarning::RemoteTagAppeared {
        repository: PathBuf::from("/work/repo"),
        tag: "v1.3.0".to_string(),
        manifest: PathBuf::from("/work/repo/pyproject.toml"),
    };

    let display_msg = warning.to_string();
    assert!(
        display_msg.contains("v1.3.0"),
        "Message should contain tag 'v1.3.0', got: {}",
        display_msg
    );
    assert!(
        display_msg.contains("/work/repo/pyproject.toml"),
        "Message should contain the manifest path, got: {}",
        display_msg
    );
}
