//! Core type definitions for release decisions

use std::fmt;

/// Release identifier assigned by the build backend.
///
/// Numeric on the wire, reported to the workflow as an opaque string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ReleaseId(pub u64);

impl fmt::Display for ReleaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ReleaseId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        s.trim().parse::<u64>().map(ReleaseId)
    }
}

/// Lookup key correlating a release with the commit and pull request it was
/// built from. Several builds may share a sha; the pair is expected to resolve
/// to at most one logical release per pull request lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CorrelationTags {
    /// Commit sha the release was built from
    pub sha: String,
    /// Pull request identifier, absent for direct pushes
    pub pull_request_id: Option<u64>,
}

impl CorrelationTags {
    /// Tags for a build triggered directly by a commit
    pub fn for_commit(sha: impl Into<String>) -> Self {
        Self {
            sha: sha.into(),
            pull_request_id: None,
        }
    }

    /// Tags for a build belonging to a pull request
    pub fn for_pull_request(sha: impl Into<String>, pull_request_id: u64) -> Self {
        Self {
            sha: sha.into(),
            pull_request_id: Some(pull_request_id),
        }
    }

    /// Key/value pairs as attached to a release by the build backend
    pub fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("sha", self.sha.clone())];
        if let Some(id) = self.pull_request_id {
            pairs.push(("pullRequestId", id.to_string()));
        }
        pairs
    }
}

impl fmt::Display for CorrelationTags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.pull_request_id {
            Some(id) => write!(f, "sha={} pullRequestId={}", self.sha, id),
            None => write!(f, "sha={}", self.sha),
        }
    }
}

/// A release previously produced by the build backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReleaseRecord {
    /// Release identifier
    pub id: ReleaseId,
    /// Whether the release has been promoted to final
    pub is_final: bool,
}

/// Options handed to the build trigger, built fresh for every invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOptions {
    /// Build a draft release that must be finalized later
    pub draft: bool,
    /// Correlation tags attached to the release
    pub tags: CorrelationTags,
}

impl BuildOptions {
    /// Draft release, promoted later by a finalize
    pub fn draft(tags: CorrelationTags) -> Self {
        Self { draft: true, tags }
    }

    /// Final release, no finalize step
    pub fn final_release(tags: CorrelationTags) -> Self {
        Self { draft: false, tags }
    }
}

/// Why an invocation ended without doing any work
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum NoOpReason {
    /// Pull request was closed without being merged
    ClosedWithoutMerge,
    /// The correlated release is already final
    AlreadyFinal,
}

impl NoOpReason {
    /// Human-readable explanation for logs and summaries
    pub const fn describe(&self) -> &'static str {
        match self {
            Self::ClosedWithoutMerge => "Pull request was closed but not merged, nothing to do.",
            Self::AlreadyFinal => "Release is already finalized so skipping.",
        }
    }
}

/// Decision produced by the event classifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Nothing to do
    NoOp(NoOpReason),
    /// Promote the draft correlated by these tags
    Finalize(CorrelationTags),
    /// Build a draft release for a pull request
    BuildDraft(CorrelationTags),
    /// Build a final release straight from the target branch
    BuildFinal(CorrelationTags),
}

impl Action {
    /// Build options for the build actions, `None` otherwise.
    ///
    /// Drafts set `draft: true` explicitly rather than relying on the
    /// backend's default.
    pub fn build_options(&self) -> Option<BuildOptions> {
        match self {
            Action::BuildDraft(tags) => Some(BuildOptions::draft(tags.clone())),
            Action::BuildFinal(tags) => Some(BuildOptions::final_release(tags.clone())),
            Action::NoOp(_) | Action::Finalize(_) => None,
        }
    }

    /// Short stable name used in logs
    pub const fn as_str(&self) -> &'static str {
        match self {
            Action::NoOp(_) => "no_op",
            Action::Finalize(_) => "finalize",
            Action::BuildDraft(_) => "build_draft",
            Action::BuildFinal(_) => "build_final",
        }
    }
}

/// Result of the idempotent tag creator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagOutcome {
    /// A new reference was created
    Created,
    /// The reference was already there; treated as success
    AlreadyExists,
}

impl TagOutcome {
    /// Short stable name used in outputs
    pub const fn as_str(&self) -> &'static str {
        match self {
            TagOutcome::Created => "created",
            TagOutcome::AlreadyExists => "already_exists",
        }
    }
}

/// Result of the finalize path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinalizeOutcome {
    /// The draft was promoted by this invocation
    Finalized(ReleaseId),
    /// The release was already final; nothing was called
    AlreadyFinal(ReleaseId),
}

/// Everything a successful build path reports
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildReport {
    /// Release built by the backend
    pub release_id: ReleaseId,
    /// Resolved semantic version of the release
    pub version: String,
    /// Whether the release was built as a draft
    pub draft: bool,
    /// Tagging result, `None` when tagging was not requested
    pub tag: Option<TagOutcome>,
}

/// Final outcome of one orchestrator invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// No work was done
    Skipped(NoOpReason),
    /// A draft release was finalized
    Finalized(ReleaseId),
    /// A release was built
    Built(BuildReport),
}

impl RunOutcome {
    /// Build report, when this outcome produced outputs
    pub fn build_report(&self) -> Option<&BuildReport> {
        match self {
            RunOutcome::Built(report) => Some(report),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_release_id_display_and_parse() {
        let id: ReleaseId = " 42\n".parse().unwrap();
        assert_eq!(id, ReleaseId(42));
        assert_eq!(id.to_string(), "42");
        assert!("abc".parse::<ReleaseId>().is_err());
    }

    #[test]
    fn test_tag_pairs() {
        let tags = CorrelationTags::for_pull_request("def456", 99);
        assert_eq!(
            tags.pairs(),
            vec![("sha", "def456".to_string()), ("pullRequestId", "99".to_string())]
        );
        assert_eq!(
            CorrelationTags::for_commit("abc123").pairs(),
            vec![("sha", "abc123".to_string())]
        );
    }

    #[test]
    fn test_build_options_draft_flag() {
        let tags = CorrelationTags::for_commit("abc123");
        let draft = Action::BuildDraft(tags.clone()).build_options().unwrap();
        assert!(draft.draft);
        let final_build = Action::BuildFinal(tags.clone()).build_options().unwrap();
        assert!(!final_build.draft);
        assert_eq!(final_build.tags, tags);
        assert!(Action::Finalize(tags).build_options().is_none());
        assert!(Action::NoOp(NoOpReason::AlreadyFinal)
            .build_options()
            .is_none());
    }
}
