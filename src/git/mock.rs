use crate::error::{ReleaseError, Result};
use crate::git::{Repository, Vcs};
use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::rc::Rc;

#[derive(Debug, Default)]
struct MockState {
    tags: BTreeSet<String>,
    remote_tags: BTreeSet<String>,
    dirty: bool,
    untracked: Vec<String>,
    staged: Vec<PathBuf>,
    commits: Vec<String>,
    branch_pushes: usize,
    created_tags: Vec<String>,
    pushed_tags: Vec<String>,
    fail_fetch: Option<String>,
    fail_status: Option<String>,
    fail_commit: Option<String>,
    fail_push: Option<String>,
}

/// In-memory repository for testing without actual git operations
///
/// Clones share state, so a test can keep one handle for inspection while
/// the code under test works through [MockVcs::open].
#[derive(Debug, Clone)]
pub struct MockRepository {
    path: PathBuf,
    state: Rc<RefCell<MockState>>,
}

impl MockRepository {
    /// Create a new empty mock repository rooted at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        MockRepository {
            path: path.into(),
            state: Rc::default(),
        }
    }

    /// Add a local tag
    pub fn add_tag(&self, name: impl Into<String>) {
        self.state.borrow_mut().tags.insert(name.into());
    }

    /// Add a tag that only becomes local after a fetch
    pub fn add_remote_tag(&self, name: impl Into<String>) {
        self.state.borrow_mut().remote_tags.insert(name.into());
    }

    pub fn set_dirty(&self, dirty: bool) {
        self.state.borrow_mut().dirty = dirty;
    }

    pub fn add_untracked(&self, path: impl Into<String>) {
        self.state.borrow_mut().untracked.push(path.into());
    }

    /// Make every fetch fail with `message`
    pub fn fail_fetch(&self, message: impl Into<String>) {
        self.state.borrow_mut().fail_fetch = Some(message.into());
    }

    /// Make dirty and untracked checks fail with `message`
    pub fn fail_status(&self, message: impl Into<String>) {
        self.state.borrow_mut().fail_status = Some(message.into());
    }

    pub fn fail_commit(&self, message: impl Into<String>) {
        self.state.borrow_mut().fail_commit = Some(message.into());
    }

    /// Make every branch and tag push fail with `message`
    pub fn fail_push(&self, message: impl Into<String>) {
        self.state.borrow_mut().fail_push = Some(message.into());
    }

    pub fn tags(&self) -> BTreeSet<String> {
        self.state.borrow().tags.clone()
    }

    pub fn staged(&self) -> Vec<PathBuf> {
        self.state.borrow().staged.clone()
    }

    pub fn commits(&self) -> Vec<String> {
        self.state.borrow().commits.clone()
    }

    pub fn branch_pushes(&self) -> usize {
        self.state.borrow().branch_pushes
    }

    pub fn created_tags(&self) -> Vec<String> {
        self.state.borrow().created_tags.clone()
    }

    pub fn pushed_tags(&self) -> Vec<String> {
        self.state.borrow().pushed_tags.clone()
    }

    fn check_status(&self) -> Result<()> {
        match &self.state.borrow().fail_status {
            Some(message) => Err(git2::Error::from_str(message).into()),
            None => Ok(()),
        }
    }

    fn check_push(&self) -> Result<()> {
        match &self.state.borrow().fail_push {
            Some(message) => Err(ReleaseError::publish(&self.path, message.clone())),
            None => Ok(()),
        }
    }
}

impl Repository for MockRepository {
    fn path(&self) -> &Path {
        &self.path
    }

    fn list_tags(&self) -> Result<BTreeSet<String>> {
        Ok(self.tags())
    }

    fn fetch_remote_tags(&self, _remote: &str) -> Result<()> {
        let mut state = self.state.borrow_mut();
        if let Some(message) = &state.fail_fetch {
            return Err(ReleaseError::remote(&self.path, message.clone()));
        }
        let remote = state.remote_tags.clone();
        state.tags.extend(remote);
        Ok(())
    }

    fn is_dirty(&self) -> Result<bool> {
        self.check_status()?;
        Ok(self.state.borrow().dirty)
    }

    fn untracked_files(&self) -> Result<Vec<String>> {
        self.check_status()?;
        Ok(self.state.borrow().untracked.clone())
    }

    fn stage(&self, path: &Path) -> Result<()> {
        self.state.borrow_mut().staged.push(path.to_path_buf());
        Ok(())
    }

    fn commit(&self, message: &str) -> Result<()> {
        let mut state = self.state.borrow_mut();
        if let Some(failure) = &state.fail_commit {
            return Err(ReleaseError::publish(&self.path, failure.clone()));
        }
        state.commits.push(message.to_string());
        Ok(())
    }

    fn push(&self, _remote: &str) -> Result<()> {
        self.check_push()?;
        self.state.borrow_mut().branch_pushes += 1;
        Ok(())
    }

    fn create_tag(&self, name: &str, _message: &str) -> Result<()> {
        let mut state = self.state.borrow_mut();
        if !state.tags.insert(name.to_string()) {
            return Err(ReleaseError::publish(
                &self.path,
                format!("Cannot create tag '{}': already exists", name),
            ));
        }
        state.created_tags.push(name.to_string());
        Ok(())
    }

    fn push_tag(&self, name: &str, _remote: &str) -> Result<()> {
        self.check_push()?;
        let mut state = self.state.borrow_mut();
        state.pushed_tags.push(name.to_string());
        state.remote_tags.insert(name.to_string());
        Ok(())
    }
}

/// [Vcs] serving [MockRepository] handles by exact root path
#[derive(Debug, Default)]
pub struct MockVcs {
    repositories: HashMap<PathBuf, MockRepository>,
}

impl MockVcs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a repository root and return a handle sharing its state
    pub fn add_repository(&mut self, path: impl Into<PathBuf>) -> MockRepository {
        let path = path.into();
        self.repositories
            .entry(path.clone())
            .or_insert_with(|| MockRepository::new(path))
            .clone()
    }
}

impl Vcs for MockVcs {
    fn open(&self, path: &Path) -> Result<Box<dyn Repository>> {
        self.repositories
            .get(path)
            .map(|repo| Box::new(repo.clone()) as Box<dyn Repository>)
            .ok_or_else(|| ReleaseError::NotARepository(path.to_path_buf()))
    }
}
