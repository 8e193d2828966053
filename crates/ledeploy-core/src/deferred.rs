//! Collaborators opened on first use
//!
//! Production collaborators need environment a given event may never reach:
//! a git checkout for the Versionbot branch, `GITHUB_REPOSITORY` for tags.
//! [`Deferred`] holds the constructor and runs it the first time a trait
//! method is called.

use once_cell::sync::OnceCell;

use crate::error::Result;
use crate::traits::{BranchResolver, TagCreator, VersionControl};

/// Lazily constructed collaborator
pub struct Deferred<T, F> {
    cell: OnceCell<T>,
    init: F,
}

impl<T, F> Deferred<T, F>
where
    F: Fn() -> Result<T>,
{
    /// Wrap a constructor; nothing runs until first use
    pub fn new(init: F) -> Self {
        Self {
            cell: OnceCell::new(),
            init,
        }
    }

    /// The collaborator, constructing it on the first call.
    ///
    /// A failed construction is not cached; the next call retries.
    pub fn get(&self) -> Result<&T> {
        self.cell.get_or_try_init(|| (self.init)())
    }

    /// Whether the constructor has succeeded
    pub fn is_initialized(&self) -> bool {
        self.cell.get().is_some()
    }
}

impl<T, F> std::fmt::Debug for Deferred<T, F>
where
    T: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Deferred")
            .field("value", &self.cell.get())
            .finish_non_exhaustive()
    }
}

impl<T, F> VersionControl for Deferred<T, F>
where
    T: VersionControl + Send + Sync,
    F: Fn() -> Result<T> + Send + Sync,
{
    async fn checkout(&self, branch: &str) -> Result<()> {
        self.get()?.checkout(branch).await
    }
}

impl<T, F> BranchResolver for Deferred<T, F>
where
    T: BranchResolver + Send + Sync,
    F: Fn() -> Result<T> + Send + Sync,
{
    async fn get_branch(&self, number: u64) -> Result<String> {
        self.get()?.get_branch(number).await
    }
}

impl<T, F> TagCreator for Deferred<T, F>
where
    T: TagCreator + Send + Sync,
    F: Fn() -> Result<T> + Send + Sync,
{
    async fn create_tag(&self, version: &str, sha: &str) -> Result<()> {
        self.get()?.create_tag(version, sha).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::InputConfig;
    use crate::coordination::ReleaseOrchestrator;
    use crate::error::{Error, ErrorKind};
    use crate::event::Event;
    use crate::fakes::{MemoryBackend, MemoryBranches, MemoryCheckout, MemoryTagger};
    use crate::git::GitRepository;
    use crate::types::RunOutcome;
    use std::borrow::Cow;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    const OPENED: &str = r#"{"action":"opened","repository":{"default_branch":"main"},"pull_request":{"id":99,"number":12,"merged":false,"head":{"sha":"def456"}}}"#;

    #[tokio::test]
    async fn test_constructor_runs_once_on_use() {
        let calls = AtomicUsize::new(0);
        let checkout = Deferred::new(|| {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(MemoryCheckout::new())
        });
        assert!(!checkout.is_initialized());
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        checkout.checkout("a").await.unwrap();
        checkout.checkout("b").await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            checkout.get().unwrap().checkouts(),
            vec!["a".to_string(), "b".to_string()]
        );
    }

    #[tokio::test]
    async fn test_constructor_failure_surfaces_on_use() {
        let tagger: Deferred<MemoryTagger, _> =
            Deferred::new(|| Err(Error::Config("GITHUB_REPOSITORY not set".to_string())));
        let err = tagger.create_tag("1.0.0", "abc123").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
        assert!(!tagger.is_initialized());
    }

    #[tokio::test]
    async fn test_build_without_versionbot_never_opens_repository() {
        let dir = TempDir::new().unwrap();
        let workspace = dir.path().to_path_buf();
        let repo = Deferred::new(move || GitRepository::discover(&workspace));
        let backend = MemoryBackend::new();
        let branches = MemoryBranches::new().with_branch(12, "feature");
        let tagger = MemoryTagger::new();
        let event = Event::from_parts("pull_request", "refs/pull/12/merge", "m1", OPENED).unwrap();

        let config = InputConfig {
            fleet: Cow::Borrowed("fleet"),
            workspace: Cow::Borrowed(dir.path()),
            ..Default::default()
        };
        let outcome = ReleaseOrchestrator::new(&config, &backend, &branches, &repo, &tagger)
            .run(&event)
            .await
            .unwrap();
        assert!(matches!(outcome, RunOutcome::Built(_)));
        assert!(!repo.is_initialized());

        // With versionbot the missing checkout is reported before building
        let config = InputConfig {
            versionbot: true,
            ..config
        };
        let err = ReleaseOrchestrator::new(&config, &backend, &branches, &repo, &tagger)
            .run(&event)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Git);
        assert_eq!(backend.pushed_options().len(), 1);
    }
}
