use crate::error::{ReleaseError, Result};
use crate::git::{Repository, Vcs};
use git2::{
    AutotagOption, Cred, CredentialType, FetchOptions, ObjectType, PushOptions, RemoteCallbacks,
    Repository as Git2Repo, Status, StatusOptions,
};
use std::cell::Cell;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Maximum credential attempts before giving up on a remote operation.
/// libgit2 keeps asking as long as the callback returns credentials.
const MAX_CREDENTIAL_ATTEMPTS: usize = 4;

/// [Vcs] backed by `git2`
#[derive(Debug, Default, Clone, Copy)]
pub struct Git2Vcs;

impl Vcs for Git2Vcs {
    fn open(&self, path: &Path) -> Result<Box<dyn Repository>> {
        Ok(Box::new(Git2Repository::open(path)?))
    }
}

/// Wrapper around git2::Repository with our trait interface
pub struct Git2Repository {
    repo: Git2Repo,
    workdir: PathBuf,
}

impl Git2Repository {
    /// Open the repository whose working tree starts exactly at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let not_a_repo = || ReleaseError::NotARepository(path.to_path_buf());

        let repo = Git2Repo::open(path).map_err(|_| not_a_repo())?;
        let workdir = repo.workdir().ok_or_else(not_a_repo)?;

        // Opening a `.git` directory also succeeds; only the working-tree
        // root counts as the repository.
        let workdir = fs::canonicalize(workdir)?;
        if fs::canonicalize(path)? != workdir {
            return Err(not_a_repo());
        }

        Ok(Git2Repository { repo, workdir })
    }

    fn relative_to_workdir(&self, path: &Path) -> Result<PathBuf> {
        let absolute = fs::canonicalize(path)?;
        absolute
            .strip_prefix(&self.workdir)
            .map(Path::to_path_buf)
            .map_err(|_| {
                ReleaseError::publish(
                    &self.workdir,
                    format!("{} is outside the repository", path.display()),
                )
            })
    }

    fn statuses(&self, include_untracked: bool) -> Result<Vec<(Status, String)>> {
        let mut options = StatusOptions::new();
        options
            .include_untracked(include_untracked)
            .recurse_untracked_dirs(include_untracked)
            .include_ignored(false);

        let statuses = self.repo.statuses(Some(&mut options))?;
        Ok(statuses
            .iter()
            .map(|entry| {
                let path = entry.path().unwrap_or("(non-utf8 path)").to_string();
                (entry.status(), path)
            })
            .collect())
    }

    fn push_refspecs(&self, remote_name: &str, refspecs: &[String]) -> Result<()> {
        let mut remote = self.repo.find_remote(remote_name).map_err(|_| {
            ReleaseError::publish(&self.workdir, format!("No remote named '{}' found", remote_name))
        })?;

        let attempts = Cell::new(0);
        let mut callbacks = credential_callbacks(&attempts);

        // Rejections are reported per reference, not through push()'s result.
        callbacks.push_update_reference(|refname, status| match status {
            Some(status) => Err(git2::Error::from_str(&format!(
                "Could not update reference {}: {}",
                refname, status
            ))),
            None => Ok(()),
        });

        let mut push_options = PushOptions::new();
        push_options.remote_callbacks(callbacks);

        let specs: Vec<&str> = refspecs.iter().map(String::as_str).collect();
        debug!(repository = %self.workdir.display(), remote = remote_name, ?specs, "pushing");

        remote
            .push(&specs, Some(&mut push_options))
            .map_err(|e| match e.class() {
                git2::ErrorClass::Net => {
                    ReleaseError::publish(&self.workdir, format!("Network error during push: {}", e))
                }
                _ => ReleaseError::publish(
                    &self.workdir,
                    format!("Failed to push {} to '{}': {}", specs.join(", "), remote_name, e),
                ),
            })
    }
}

/// Remote callbacks trying SSH keys from ~/.ssh, then the SSH agent, then
/// the default credential helper.
fn credential_callbacks(attempts: &Cell<usize>) -> RemoteCallbacks<'_> {
    let mut callbacks = RemoteCallbacks::new();
    callbacks.credentials(move |_url, username_from_url, allowed_types| {
        attempts.set(attempts.get() + 1);
        if attempts.get() > MAX_CREDENTIAL_ATTEMPTS {
            return Err(git2::Error::from_str("authentication failed"));
        }

        let username = username_from_url.unwrap_or("git");
        if allowed_types.contains(CredentialType::SSH_KEY) {
            if let Some(home) = dirs::home_dir() {
                for key in ["id_ed25519", "id_rsa", "id_ecdsa"] {
                    let path = home.join(".ssh").join(key);
                    if path.exists() {
                        if let Ok(cred) = Cred::ssh_key(username, None, &path, None) {
                            return Ok(cred);
                        }
                    }
                }
            }

            if let Ok(cred) = Cred::ssh_key_from_agent(username) {
                return Ok(cred);
            }
        }

        Cred::default()
    });
    callbacks
}

impl Repository for Git2Repository {
    fn path(&self) -> &Path {
        &self.workdir
    }

    fn list_tags(&self) -> Result<BTreeSet<String>> {
        let tags = self.repo.tag_names(None)?;
        Ok(tags.iter().flatten().map(|s| s.to_string()).collect())
    }

    fn fetch_remote_tags(&self, remote_name: &str) -> Result<()> {
        let mut remote = self.repo.find_remote(remote_name).map_err(|_| {
            ReleaseError::remote(&self.workdir, format!("Remote '{}' not found", remote_name))
        })?;

        let attempts = Cell::new(0);
        let mut fetch_options = FetchOptions::new();
        fetch_options
            .remote_callbacks(credential_callbacks(&attempts))
            .download_tags(AutotagOption::All);

        remote
            .fetch(&["refs/tags/*:refs/tags/*"], Some(&mut fetch_options), None)
            .map_err(|e| {
                ReleaseError::remote(
                    &self.workdir,
                    format!("Failed to fetch tags from '{}': {}", remote_name, e),
                )
            })
    }

    fn is_dirty(&self) -> Result<bool> {
        Ok(self
            .statuses(false)?
            .iter()
            .any(|(status, _)| !status.is_empty() && !status.intersects(Status::IGNORED | Status::WT_NEW)))
    }

    fn untracked_files(&self) -> Result<Vec<String>> {
        Ok(self
            .statuses(true)?
            .into_iter()
            .filter(|(status, _)| status.contains(Status::WT_NEW))
            .map(|(_, path)| path)
            .collect())
    }

    fn stage(&self, path: &Path) -> Result<()> {
        let relative = self.relative_to_workdir(path)?;
        let mut index = self.repo.index()?;
        index.add_path(&relative)?;
        index.write()?;
        Ok(())
    }

    fn commit(&self, message: &str) -> Result<()> {
        let mut index = self.repo.index()?;
        let tree = self.repo.find_tree(index.write_tree()?)?;
        let signature = self.repo.signature()?;

        let parent = match self.repo.head() {
            Ok(head) => Some(head.peel_to_commit()?),
            Err(e) if e.code() == git2::ErrorCode::UnbornBranch => None,
            Err(e) => return Err(e.into()),
        };
        let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();

        let oid = self
            .repo
            .commit(Some("HEAD"), &signature, &signature, message, &tree, &parents)?;
        debug!(repository = %self.workdir.display(), %oid, "committed");
        Ok(())
    }

    fn push(&self, remote_name: &str) -> Result<()> {
        let head = self.repo.head()?;
        if !head.is_branch() {
            return Err(ReleaseError::publish(
                &self.workdir,
                "HEAD is detached; cannot push a branch",
            ));
        }
        let branch = head
            .name()
            .ok_or_else(|| ReleaseError::publish(&self.workdir, "HEAD has a non-utf8 name"))?;

        self.push_refspecs(remote_name, &[format!("{0}:{0}", branch)])
    }

    fn create_tag(&self, name: &str, message: &str) -> Result<()> {
        let target = self.repo.head()?.peel(ObjectType::Commit)?;
        let signature = self.repo.signature()?;

        self.repo
            .tag(name, &target, &signature, message, false)
            .map_err(|e| {
                ReleaseError::publish(&self.workdir, format!("Cannot create tag '{}': {}", name, e))
            })?;
        Ok(())
    }

    fn push_tag(&self, name: &str, remote_name: &str) -> Result<()> {
        self.push_refspecs(remote_name, &[format!("refs/tags/{0}:refs/tags/{0}", name)])
    }
}
