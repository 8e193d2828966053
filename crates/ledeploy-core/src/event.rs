//! GitHub event intake
//!
//! The raw webhook payload is loosely typed: fields exist only for some event
//! kinds. It is parsed once into [`Event`], a tagged union whose variants carry
//! exactly the fields valid for their kind, so the classifier can match on it
//! exhaustively.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// Raw payload subset read from `GITHUB_EVENT_PATH`
#[derive(Debug, Deserialize)]
struct RawPayload {
    action: Option<String>,
    repository: Option<RawRepository>,
    pull_request: Option<RawPullRequest>,
}

#[derive(Debug, Deserialize)]
struct RawRepository {
    master_branch: Option<String>,
    default_branch: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawPullRequest {
    id: u64,
    number: u64,
    #[serde(default)]
    merged: Option<bool>,
    head: RawHead,
}

#[derive(Debug, Deserialize)]
struct RawHead {
    sha: String,
}

/// Pull request webhook action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PullRequestAction {
    /// Pull request opened
    Opened,
    /// New commits pushed to the head branch
    Synchronize,
    /// Closed pull request reopened
    Reopened,
    /// Pull request closed, merged or not
    Closed,
    /// Any other action (labeled, edited, ...)
    Other(String),
}

impl PullRequestAction {
    /// Parse the payload's `action` field
    pub fn parse(s: &str) -> Self {
        match s {
            "opened" => Self::Opened,
            "synchronize" => Self::Synchronize,
            "reopened" => Self::Reopened,
            "closed" => Self::Closed,
            other => Self::Other(other.to_string()),
        }
    }

    /// Wire representation
    pub fn as_str(&self) -> &str {
        match self {
            Self::Opened => "opened",
            Self::Synchronize => "synchronize",
            Self::Reopened => "reopened",
            Self::Closed => "closed",
            Self::Other(s) => s,
        }
    }
}

/// Pull request fields the orchestrator needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestRef {
    /// Opaque identifier used for release correlation
    pub id: u64,
    /// Pull request number as shown in the UI
    pub number: u64,
    /// Head commit of the pull request
    pub head_sha: String,
    /// Whether the pull request was merged
    pub merged: bool,
}

impl From<RawPullRequest> for PullRequestRef {
    fn from(raw: RawPullRequest) -> Self {
        Self {
            id: raw.id,
            number: raw.number,
            head_sha: raw.head.sha,
            merged: raw.merged.unwrap_or(false),
        }
    }
}

/// Push to a branch or tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushEvent {
    /// Fully qualified ref that was pushed (`refs/heads/main`)
    pub git_ref: String,
    /// Commit the ref now points to
    pub sha: String,
    /// Repository's target branch name
    pub target_branch: String,
}

impl PushEvent {
    /// Whether this push updated the target branch
    pub fn is_target_branch(&self) -> bool {
        self.git_ref
            .strip_prefix("refs/heads/")
            .is_some_and(|branch| branch == self.target_branch)
    }
}

/// `pull_request` event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestEvent {
    /// Webhook action
    pub action: PullRequestAction,
    /// Pull request the event is about
    pub pull_request: PullRequestRef,
    /// Workflow sha (the merge commit for pull request workflows)
    pub sha: String,
}

/// Any other event kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtherEvent {
    /// `GITHUB_EVENT_NAME`
    pub name: String,
    /// Payload action, if the event has one
    pub action: Option<String>,
    /// Pull request, for pull request flavoured events such as `pull_request_target`
    pub pull_request: Option<PullRequestRef>,
    /// Workflow sha
    pub sha: String,
}

/// Triggering event, supplied once per invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// `push`
    Push(PushEvent),
    /// `pull_request`
    PullRequest(PullRequestEvent),
    /// Everything else
    Other(OtherEvent),
}

impl Event {
    /// Parse an event from its name, ref, sha and JSON payload.
    pub fn from_parts(name: &str, git_ref: &str, sha: &str, payload: &str) -> Result<Self> {
        let raw: RawPayload = serde_json::from_str(payload)
            .map_err(|e| Error::EventParse(format!("Invalid event payload: {}", e)))?;

        // Every event this orchestrator cares about carries a repository object
        let repository = raw.repository.ok_or_else(|| {
            Error::Precondition("Workflow payload was missing repository object".to_string())
        })?;
        let target_branch = repository
            .master_branch
            .or(repository.default_branch)
            .filter(|b| !b.is_empty());

        match name {
            "push" => {
                let target_branch = target_branch.ok_or_else(|| {
                    Error::Precondition(
                        "Repository object did not name a target branch".to_string(),
                    )
                })?;
                Ok(Event::Push(PushEvent {
                    git_ref: git_ref.to_string(),
                    sha: sha.to_string(),
                    target_branch,
                }))
            }
            "pull_request" => {
                let pull_request = raw.pull_request.ok_or_else(|| {
                    Error::EventParse(
                        "pull_request event payload has no pull_request object".to_string(),
                    )
                })?;
                let action = raw.action.ok_or_else(|| {
                    Error::EventParse("pull_request event payload has no action".to_string())
                })?;
                Ok(Event::PullRequest(PullRequestEvent {
                    action: PullRequestAction::parse(&action),
                    pull_request: pull_request.into(),
                    sha: sha.to_string(),
                }))
            }
            other => Ok(Event::Other(OtherEvent {
                name: other.to_string(),
                action: raw.action,
                pull_request: raw.pull_request.map(Into::into),
                sha: sha.to_string(),
            })),
        }
    }

    /// Read the event from the GitHub Actions environment
    pub fn from_env() -> Result<Self> {
        let name = required_env("GITHUB_EVENT_NAME")?;
        let git_ref = std::env::var("GITHUB_REF").unwrap_or_default();
        let sha = required_env("GITHUB_SHA")?;
        let path = required_env("GITHUB_EVENT_PATH")?;
        Self::from_file(&name, &git_ref, &sha, Path::new(&path))
    }

    /// Parse an event whose payload lives in a file
    pub fn from_file(name: &str, git_ref: &str, sha: &str, path: &Path) -> Result<Self> {
        let payload = std::fs::read_to_string(path).map_err(|e| {
            Error::EventParse(format!(
                "Failed to read event payload {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_parts(name, git_ref, sha, &payload)
    }

    /// Event name as GitHub reports it
    pub fn name(&self) -> &str {
        match self {
            Event::Push(_) => "push",
            Event::PullRequest(_) => "pull_request",
            Event::Other(other) => &other.name,
        }
    }

    /// Pull request attached to the event, if any
    pub fn pull_request(&self) -> Option<&PullRequestRef> {
        match self {
            Event::Push(_) => None,
            Event::PullRequest(pr) => Some(&pr.pull_request),
            Event::Other(other) => other.pull_request.as_ref(),
        }
    }

    /// Commit a tag should point to: the pull request head when there is one,
    /// otherwise the workflow sha.
    pub fn commit_sha(&self) -> &str {
        match self {
            Event::Push(push) => &push.sha,
            Event::PullRequest(pr) => &pr.pull_request.head_sha,
            Event::Other(other) => other
                .pull_request
                .as_ref()
                .map_or(other.sha.as_str(), |pr| pr.head_sha.as_str()),
        }
    }
}

fn required_env(name: &str) -> Result<String> {
    std::env::var(name)
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| Error::Config(format!("{} not set", name)))
}
