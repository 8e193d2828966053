//! # LeDeploy Core
//!
//! Release orchestration for CI events.
//!
//! A single pass per workflow event decides whether to build a draft release,
//! build a final release, finalize an existing draft, or do nothing. The
//! decision logic is pure; every side effect goes through a collaborator trait:
//! - [`BuildBackend`] builds, looks up and finalizes releases
//! - [`BranchResolver`] maps pull request numbers to head branches
//! - [`VersionControl`] checks out branches in the working copy
//! - [`TagCreator`] creates git tags
//!
//! Production implementations live in [`balena`], [`http`] and [`git`];
//! in-memory versions for tests live in [`fakes`].
//!
//! ## Example
//!
//! ```no_run
//! use ledeploy_core::{Event, InputConfig, deploy};
//! use std::borrow::Cow;
//!
//! # async fn example() -> ledeploy_core::Result<()> {
//! let config = InputConfig {
//!     fleet: Cow::Borrowed("my-org/my-fleet"),
//!     ..Default::default()
//! };
//!
//! let event = Event::from_env()?;
//! let outcome = deploy(&config, &event).await?;
//! println!("{:?}", outcome);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs, rust_2018_idioms)]

pub mod balena;
pub mod config;
pub mod coordination;
pub mod deferred;
pub mod error;
pub mod event;
pub mod fakes;
pub mod git;
pub mod http;
pub mod output;
pub mod traits;
pub mod types;

pub use config::InputConfig;
pub use coordination::{classify, ReleaseOrchestrator};
pub use error::{Error, ErrorKind, Result};
pub use event::Event;
pub use traits::{BranchResolver, BuildBackend, TagCreator, VersionControl};
pub use types::{
    Action, BuildOptions, BuildReport, CorrelationTags, NoOpReason, ReleaseId, RunOutcome,
    TagOutcome,
};

/// Run the orchestrator for `event` against the production collaborators
///
/// Builds with the balena CLI and API for `config.environment`, resolves
/// branches and creates tags through the GitHub API of `GITHUB_REPOSITORY`,
/// and checks out branches in the repository containing `config.workspace`.
///
/// The event is classified before anything is opened. The GitHub client and
/// the repository are only constructed once a step actually calls them.
pub async fn deploy(config: &InputConfig<'_>, event: &Event) -> Result<RunOutcome> {
    config.validate()?;

    if let Action::NoOp(reason) = classify(event)? {
        tracing::info!(event = event.name(), "{}", reason.describe());
        return Ok(RunOutcome::Skipped(reason));
    }

    let backend = balena::BalenaBackend::from_env(config.api_url());
    let github = deferred::Deferred::new(http::GitHubApiClient::from_env);
    let workspace = config.workspace.to_path_buf();
    let repo = deferred::Deferred::new(move || git::GitRepository::discover(&workspace));

    ReleaseOrchestrator::new(config, &backend, &github, &repo, &github)
        .run(event)
        .await
}

/// Synchronous variant of [`deploy`]
///
/// This creates a new Tokio runtime and blocks on the async version.
/// Prefer the async version if you're already in an async context.
pub fn deploy_sync(config: &InputConfig<'_>, event: &Event) -> Result<RunOutcome> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Error::Runtime(e.to_string()))?
        .block_on(deploy(config, event))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::borrow::Cow;
    use tempfile::TempDir;

    fn config(workspace: &std::path::Path) -> InputConfig<'_> {
        InputConfig {
            fleet: Cow::Borrowed("acme/fleet"),
            workspace: Cow::Borrowed(workspace),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_closed_without_merge_outside_checkout() {
        let dir = TempDir::new().unwrap();
        let payload = r#"{"action":"closed","repository":{"default_branch":"main"},"pull_request":{"id":99,"number":12,"merged":false,"head":{"sha":"def456"}}}"#;
        let event = Event::from_parts("pull_request", "refs/pull/12/merge", "m1", payload).unwrap();

        let outcome = deploy(&config(dir.path()), &event).await.unwrap();
        assert_eq!(outcome, RunOutcome::Skipped(NoOpReason::ClosedWithoutMerge));
    }

    #[tokio::test]
    async fn test_unsupported_push_reported_before_collaborators() {
        let dir = TempDir::new().unwrap();
        let payload = r#"{"repository":{"default_branch":"main"}}"#;
        let event = Event::from_parts("push", "refs/heads/feature", "abc123", payload).unwrap();

        let err = deploy(&config(dir.path()), &event).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedPushTarget);
    }

    #[tokio::test]
    async fn test_invalid_config_rejected_first() {
        let dir = TempDir::new().unwrap();
        let payload = r#"{"repository":{"default_branch":"main"}}"#;
        let event = Event::from_parts("push", "refs/heads/main", "abc123", payload).unwrap();
        let config = InputConfig {
            fleet: Cow::Borrowed(""),
            ..config(dir.path())
        };

        let err = deploy(&config, &event).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
    }
}
