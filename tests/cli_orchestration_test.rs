use std::collections::hash_map::DefaultHasher;
use std::fs;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

use release_maker::boundary::BoundaryWarning;
use release_maker::cli::orchestration::{run_release_workflow, ReleaseWorkflowArgs};
use release_maker::config::Config;
use release_maker::domain::{BumpLevel, Version};
use release_maker::git::MockVcs;
use release_maker::publish::TagOutcome;
use release_maker::ReleaseError;
use tempfile::TempDir;

const MANIFEST: &str = r#"# Package metadata
[project]
name = "demo"
version = "1.2.3"  # bumped by release-maker
dependencies = ["requests>=2"]

[tool.ruff]
line-length = 100
"#;

struct Workspace {
    _tmp: TempDir,
    root: PathBuf,
}

impl Workspace {
    fn new() -> Self {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().canonicalize().unwrap();
        Workspace { _tmp: tmp, root }
    }

    fn manifest(&self, relative: &str) -> PathBuf {
        let dir = self.root.join(relative);
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("pyproject.toml");
        fs::write(&path, MANIFEST).unwrap();
        path
    }

    fn args(&self, sources: &[&str]) -> ReleaseWorkflowArgs {
        ReleaseWorkflowArgs {
            sources: sources.iter().map(|s| self.root.join(s)).collect(),
            level: BumpLevel::Minor,
            root: self.root.clone(),
            dry_run: false,
            create_tags: true,
            fetch_remote_tags: false,
            verbose: true,
        }
    }
}

fn content_hash(path: &Path) -> u64 {
    let mut hasher = DefaultHasher::new();
    fs::read(path).unwrap().hash(&mut hasher);
    hasher.finish()
}

#[test]
fn test_workflow_bumps_commits_and_tags() {
    let ws = Workspace::new();
    let a = ws.manifest("repo-a");
    let b = ws.manifest("repo-b/pkg");

    let mut vcs = MockVcs::new();
    let repo_a = vcs.add_repository(ws.root.join("repo-a"));
    let repo_b = vcs.add_repository(ws.root.join("repo-b"));

    let result = run_release_workflow(&ws.args(&["repo-a", "repo-b"]), &Config::default(), &vcs)
        .unwrap();

    assert!(result.is_success());
    assert_eq!(result.plans.len(), 2);
    for path in [&a, &b] {
        assert_eq!(
            fs::read_to_string(path).unwrap(),
            MANIFEST.replace("\"1.2.3\"", "\"1.3.0\"")
        );
    }

    for repo in [&repo_a, &repo_b] {
        assert_eq!(repo.commits(), vec!["Bump version to v1.3.0".to_string()]);
        assert_eq!(repo.branch_pushes(), 1);
        assert_eq!(repo.pushed_tags(), vec!["v1.3.0".to_string()]);
    }
    assert_eq!(repo_b.staged(), vec![b]);
}

#[test]
fn test_dirty_repository_blocks_every_write() {
    let ws = Workspace::new();
    let manifests = vec![
        ws.manifest("clean"),
        ws.manifest("dirty"),
        ws.manifest("untracked"),
    ];

    let mut vcs = MockVcs::new();
    let clean = vcs.add_repository(ws.root.join("clean"));
    vcs.add_repository(ws.root.join("dirty")).set_dirty(true);
    vcs.add_repository(ws.root.join("untracked"))
        .add_untracked("scratch.py");

    let before: Vec<u64> = manifests.iter().map(|p| content_hash(p)).collect();
    let result = run_release_workflow(
        &ws.args(&["clean", "dirty", "untracked"]),
        &Config::default(),
        &vcs,
    );
    let after: Vec<u64> = manifests.iter().map(|p| content_hash(p)).collect();

    match result {
        Err(ReleaseError::DirtyRepositories(violations)) => {
            let paths: Vec<PathBuf> = violations.into_iter().map(|v| v.path).collect();
            assert_eq!(
                paths,
                vec![ws.root.join("dirty"), ws.root.join("untracked")]
            );
        }
        other => panic!("expected DirtyRepositories, got {:?}", other),
    }
    assert_eq!(before, after);
    assert!(clean.commits().is_empty());

    // Nothing left behind by staging either.
    let entries: Vec<_> = fs::read_dir(ws.root.join("clean")).unwrap().collect();
    assert_eq!(entries.len(), 1);
}

#[test]
fn test_dry_run_touches_nothing() {
    let ws = Workspace::new();
    let manifest = ws.manifest("repo");
    let mut vcs = MockVcs::new();
    let repo = vcs.add_repository(ws.root.join("repo"));

    let mut args = ws.args(&["repo"]);
    args.dry_run = true;
    let result = run_release_workflow(&args, &Config::default(), &vcs).unwrap();

    assert!(result.commit.is_none());
    assert!(result.publish.is_none());
    assert_eq!(result.plans[0].new_version(), Version::new(1, 3, 0));
    assert_eq!(fs::read_to_string(&manifest).unwrap(), MANIFEST);
    assert!(repo.commits().is_empty());
}

#[test]
fn test_existing_tag_is_reported_not_recreated() {
    let ws = Workspace::new();
    ws.manifest("repo");
    let mut vcs = MockVcs::new();
    let repo = vcs.add_repository(ws.root.join("repo"));
    repo.add_remote_tag("v1.3.0");

    let mut args = ws.args(&["repo"]);
    args.fetch_remote_tags = true;
    let result = run_release_workflow(&args, &Config::default(), &vcs).unwrap();

    assert!(result.is_success());
    assert!(matches!(
        result.warnings.as_slice(),
        [BoundaryWarning::RemoteTagAppeared { tag, .. }] if tag == "v1.3.0"
    ));
    let publish = result.publish.unwrap();
    assert_eq!(publish.entries[0].tag_outcome, TagOutcome::AlreadyExists);
    assert!(repo.created_tags().is_empty());
    assert_eq!(repo.commits().len(), 1);
}

#[test]
fn test_push_failure_is_per_repository() {
    let ws = Workspace::new();
    ws.manifest("broken");
    ws.manifest("healthy");
    let mut vcs = MockVcs::new();
    vcs.add_repository(ws.root.join("broken"))
        .fail_push("connection reset");
    let healthy = vcs.add_repository(ws.root.join("healthy"));

    let result =
        run_release_workflow(&ws.args(&["broken", "healthy"]), &Config::default(), &vcs).unwrap();

    assert!(!result.is_success());
    assert!(result.commit.as_ref().unwrap().is_complete());
    assert_eq!(healthy.pushed_tags(), vec!["v1.3.0".to_string()]);
}

#[test]
fn test_manifest_outside_repository_is_written_but_not_published() {
    let ws = Workspace::new();
    let manifest = ws.manifest("loose");
    let vcs = MockVcs::new();

    let result = run_release_workflow(&ws.args(&["loose"]), &Config::default(), &vcs).unwrap();

    assert!(result.is_success());
    assert!(fs::read_to_string(&manifest).unwrap().contains("1.3.0"));
    assert!(result.publish.unwrap().entries.is_empty());
}

#[test]
fn test_overlapping_sources_bump_once() {
    let ws = Workspace::new();
    let manifest = ws.manifest("repo/pkg");
    let mut vcs = MockVcs::new();
    let repo = vcs.add_repository(ws.root.join("repo"));

    let result =
        run_release_workflow(&ws.args(&["repo", "repo/pkg"]), &Config::default(), &vcs).unwrap();

    assert!(result.is_success());
    assert_eq!(result.plans.len(), 1);
    assert_eq!(
        fs::read_to_string(&manifest).unwrap(),
        MANIFEST.replace("\"1.2.3\"", "\"1.3.0\"")
    );
    assert_eq!(repo.commits().len(), 1);
    assert_eq!(repo.branch_pushes(), 1);
    assert_eq!(repo.pushed_tags(), vec!["v1.3.0".to_string()]);
}

#[test]
fn test_invalid_root() {
    let ws = Workspace::new();
    ws.manifest("repo");
    let mut args = ws.args(&["repo"]);
    args.root = ws.root.join("no-such-dir");

    let result = run_release_workflow(&args, &Config::default(), &MockVcs::new());
    assert!(matches!(result, Err(ReleaseError::InvalidRoot(_))));
}

#[test]
fn test_missing_manifest_aborts_run() {
    let ws = Workspace::new();
    let manifest = ws.manifest("repo");
    fs::create_dir_all(ws.root.join("empty")).unwrap();

    let result = run_release_workflow(
        &ws.args(&["repo", "empty"]),
        &Config::default(),
        &MockVcs::new(),
    );

    assert!(matches!(result, Err(ReleaseError::NoManifest { .. })));
    assert_eq!(fs::read_to_string(&manifest).unwrap(), MANIFEST);
}

#[test]
fn test_malformed_version_aborts_run() {
    let ws = Workspace::new();
    let good = ws.manifest("good");
    let bad = ws.manifest("bad");
    fs::write(&bad, "[project]\nversion = \"1.2\"\n").unwrap();

    let result = run_release_workflow(
        &ws.args(&["good", "bad"]),
        &Config::default(),
        &MockVcs::new(),
    );

    assert!(matches!(result, Err(ReleaseError::Parse(_))));
    assert_eq!(fs::read_to_string(&good).unwrap(), MANIFEST);
}
