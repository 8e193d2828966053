//! Git working copy operations with async support

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::traits::VersionControl;

/// Git repository wrapper that handles Send/Sync constraints
///
/// git2::Repository is not Send/Sync due to internal raw pointers.
/// We work around this by storing the path and using spawn_blocking
/// for all git operations.
#[derive(Debug, Clone)]
pub struct GitRepository {
    path: PathBuf,
    remote: String,
}

impl GitRepository {
    /// Open a repository at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        // Verify the repository exists
        let _repo = git2::Repository::open(&path)?;

        Ok(Self {
            path,
            remote: "origin".to_string(),
        })
    }

    /// Discover a repository starting from the given path
    pub fn discover<P: AsRef<Path>>(path: P) -> Result<Self> {
        let repo = git2::Repository::discover(path.as_ref())?;
        let path = repo
            .workdir()
            .map(Path::to_path_buf)
            .ok_or_else(|| Error::Git("Repository has no working directory".to_string()))?;

        Ok(Self {
            path,
            remote: "origin".to_string(),
        })
    }

    /// Use a remote other than `origin`
    pub fn with_remote(mut self, remote: impl Into<String>) -> Self {
        self.remote = remote.into();
        self
    }

    /// Get the working directory root
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Name of the branch HEAD points to, `None` when detached
    pub fn current_branch(&self) -> Result<Option<String>> {
        let repo = git2::Repository::open(&self.path)?;
        let head = repo.head()?;
        Ok(if head.is_branch() {
            head.shorthand().map(str::to_string)
        } else {
            None
        })
    }

    /// Fetch `branch` from the remote and check it out, replacing the
    /// working tree contents.
    pub async fn checkout_branch(&self, branch: &str) -> Result<()> {
        let path = self.path.clone();
        let remote = self.remote.clone();
        let branch = branch.to_string();

        tokio::task::spawn_blocking(move || {
            // Network fetch goes through the git CLI so the runner's
            // credential helpers apply
            let refspec = format!("+refs/heads/{0}:refs/remotes/{1}/{0}", branch, remote);
            let output = std::process::Command::new("git")
                .args(["fetch", "--no-tags", &remote, &refspec])
                .current_dir(&path)
                .output()
                .map_err(|e| Error::Git(format!("Failed to run git fetch: {}", e)))?;

            if !output.status.success() {
                let stderr = String::from_utf8_lossy(&output.stderr);
                return Err(Error::Git(format!(
                    "git fetch {} {} failed: {}",
                    remote,
                    branch,
                    stderr.trim()
                )));
            }

            let repo = git2::Repository::open(&path)?;
            let remote_ref = format!("refs/remotes/{}/{}", remote, branch);
            let commit = repo
                .find_reference(&remote_ref)
                .and_then(|r| r.peel_to_commit())
                .map_err(|e| {
                    Error::Git(format!("Failed to resolve '{}': {}", remote_ref, e.message()))
                })?;

            // Create or reset the local branch to the fetched commit
            repo.branch(&branch, &commit, true)?;

            let mut checkout = git2::build::CheckoutBuilder::new();
            checkout.force();
            repo.checkout_tree(commit.as_object(), Some(&mut checkout))?;
            repo.set_head(&format!("refs/heads/{}", branch))?;

            Ok::<_, Error>(())
        })
        .await
        .map_err(|e| Error::Runtime(format!("Task join error: {}", e)))?
    }
}

impl VersionControl for GitRepository {
    async fn checkout(&self, branch: &str) -> Result<()> {
        tracing::info!(%branch, path = %self.path.display(), "Checking out branch");
        self.checkout_branch(branch).await
    }
}
