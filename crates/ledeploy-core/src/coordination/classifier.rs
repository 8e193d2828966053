//! Event-to-action classification
//!
//! Pure function of the event: all I/O happens in the caller after
//! classification. Rules, in order:
//!
//! 1. `closed`: merged pull request -> finalize, otherwise nothing to do
//! 2. push to `refs/heads/<target>` -> final build, bypassing draft/finalize
//! 3. push anywhere else -> unsupported push target
//! 4. any non pull request event -> unsupported event
//! 5. open pull request -> draft build

use crate::error::{Error, Result};
use crate::event::{Event, PullRequestAction, PullRequestRef};
use crate::types::{Action, CorrelationTags, NoOpReason};

/// Map an event to the action the orchestrator should take
pub fn classify(event: &Event) -> Result<Action> {
    match event {
        Event::PullRequest(pr) if pr.action == PullRequestAction::Closed => {
            Ok(closed(Some(&pr.pull_request)))
        }
        Event::Other(other) if other.action.as_deref() == Some("closed") => {
            Ok(closed(other.pull_request.as_ref()))
        }
        Event::Push(push) if push.is_target_branch() => {
            Ok(Action::BuildFinal(CorrelationTags::for_commit(&push.sha)))
        }
        Event::Push(push) => Err(Error::UnsupportedPushTarget {
            target: push.target_branch.clone(),
            git_ref: push.git_ref.clone(),
        }),
        Event::Other(other) => Err(Error::UnsupportedEvent(other.name.clone())),
        Event::PullRequest(pr) => Ok(Action::BuildDraft(pull_request_tags(&pr.pull_request))),
    }
}

fn closed(pull_request: Option<&PullRequestRef>) -> Action {
    match pull_request {
        Some(pr) if pr.merged => Action::Finalize(pull_request_tags(pr)),
        _ => Action::NoOp(NoOpReason::ClosedWithoutMerge),
    }
}

fn pull_request_tags(pr: &PullRequestRef) -> CorrelationTags {
    CorrelationTags::for_pull_request(&pr.head_sha, pr.id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::event::{OtherEvent, PullRequestEvent, PushEvent};
    use assert_matches::assert_matches;

    fn pr(merged: bool) -> PullRequestRef {
        PullRequestRef {
            id: 99,
            number: 12,
            head_sha: "def456".into(),
            merged,
        }
    }

    fn pr_event(action: PullRequestAction, merged: bool) -> Event {
        Event::PullRequest(PullRequestEvent {
            action,
            pull_request: pr(merged),
            sha: "merge789".into(),
        })
    }

    fn push(git_ref: &str) -> Event {
        Event::Push(PushEvent {
            git_ref: git_ref.into(),
            sha: "abc123".into(),
            target_branch: "main".into(),
        })
    }

    #[test]
    fn test_closed_merged_finalizes_by_head_sha_and_id() {
        let action = classify(&pr_event(PullRequestAction::Closed, true)).unwrap();
        assert_eq!(
            action,
            Action::Finalize(CorrelationTags::for_pull_request("def456", 99))
        );
    }

    #[test]
    fn test_closed_unmerged_is_noop() {
        let action = classify(&pr_event(PullRequestAction::Closed, false)).unwrap();
        assert_eq!(action, Action::NoOp(NoOpReason::ClosedWithoutMerge));
    }

    #[test]
    fn test_push_to_target_builds_final() {
        let action = classify(&push("refs/heads/main")).unwrap();
        assert_eq!(action, Action::BuildFinal(CorrelationTags::for_commit("abc123")));
        let options = action.build_options().unwrap();
        assert!(!options.draft);
        assert_eq!(options.tags.pull_request_id, None);
    }

    #[test]
    fn test_push_elsewhere_is_unsupported() {
        let err = classify(&push("refs/heads/feature")).unwrap_err();
        assert_matches!(
            err,
            Error::UnsupportedPushTarget { ref target, ref git_ref }
                if target == "main" && git_ref == "refs/heads/feature"
        );
    }

    #[test]
    fn test_push_to_prefixed_branch_is_unsupported() {
        // refs/heads/main-old must not be mistaken for main
        let err = classify(&push("refs/heads/main-old")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedPushTarget);
    }

    #[test]
    fn test_open_pull_request_builds_draft() {
        for action in [
            PullRequestAction::Opened,
            PullRequestAction::Synchronize,
            PullRequestAction::Reopened,
            PullRequestAction::Other("labeled".into()),
        ] {
            let decided = classify(&pr_event(action, false)).unwrap();
            assert_eq!(
                decided,
                Action::BuildDraft(CorrelationTags::for_pull_request("def456", 99))
            );
            assert!(decided.build_options().unwrap().draft);
        }
    }

    #[test]
    fn test_other_event_is_unsupported() {
        let event = Event::Other(OtherEvent {
            name: "workflow_dispatch".into(),
            action: None,
            pull_request: None,
            sha: "abc".into(),
        });
        let err = classify(&event).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedEvent);
        assert!(err.to_string().contains("workflow_dispatch"));
    }

    #[test]
    fn test_other_closed_event_follows_merge_state() {
        let merged = Event::Other(OtherEvent {
            name: "pull_request_target".into(),
            action: Some("closed".into()),
            pull_request: Some(pr(true)),
            sha: "abc".into(),
        });
        assert_matches!(classify(&merged), Ok(Action::Finalize(_)));

        let no_pr = Event::Other(OtherEvent {
            name: "issues".into(),
            action: Some("closed".into()),
            pull_request: None,
            sha: "abc".into(),
        });
        assert_eq!(
            classify(&no_pr).unwrap(),
            Action::NoOp(NoOpReason::ClosedWithoutMerge)
        );
    }
}
