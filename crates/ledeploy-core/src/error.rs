//! Error types for ledeploy-core

use thiserror::Error;

/// Result type alias for ledeploy operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for ledeploy operations
#[derive(Debug, Error)]
pub enum Error {
    /// The workflow payload is missing something every supported event carries
    #[error("Precondition failed: {0}")]
    Precondition(String),

    /// Event kind this orchestrator does not know how to handle
    #[error("Unsure how to proceed with event: {0}")]
    UnsupportedEvent(String),

    /// Push to a ref other than the target branch
    #[error("Push workflow only works with {target} branch. Event tried pushing to: {git_ref}")]
    UnsupportedPushTarget {
        /// Branch that push events are expected to target
        target: String,
        /// Ref the event actually pushed to
        git_ref: String,
    },

    /// Finalize was requested but no draft was ever built for the pull request
    #[error("Reached point of finalizing a release but did not find one: {0}")]
    MissingExpectedRelease(String),

    /// The git reference being created already exists
    #[error("Reference already exists: {0}")]
    ReferenceExists(String),

    /// Tag creation failed for a reason other than the reference existing
    #[error("Tag creation failed: {0}")]
    TagCreationFailed(String),

    /// Build backend error (push, lookup, finalize, version)
    #[error("Build error: {0}")]
    Build(String),

    /// Git operation error
    #[error("Git error: {0}")]
    Git(String),

    /// HTTP/API error
    #[error("HTTP error: {0}")]
    Http(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// GitHub event parsing error
    #[error("Event parse error: {0}")]
    EventParse(String),

    /// Runtime error (Tokio, threading, etc.)
    #[error("Runtime error: {0}")]
    Runtime(String),

    /// Other errors
    #[error("Error: {0}")]
    Other(String),
}

impl From<git2::Error> for Error {
    fn from(err: git2::Error) -> Self {
        Error::Git(err.message().to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Http(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Other(format!("JSON error: {}", err))
    }
}

/// Fieldless error category for zero-cost pattern matching.
///
/// Single byte representation (`#[repr(u8)]`), `Copy`, no allocations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ErrorKind {
    /// Missing payload precondition
    Precondition,
    /// Unsupported event kind
    UnsupportedEvent,
    /// Push to a non-target branch
    UnsupportedPushTarget,
    /// Finalize without a prior draft
    MissingExpectedRelease,
    /// Reference already exists
    ReferenceExists,
    /// Tag creation failure
    TagCreationFailed,
    /// Build backend error
    Build,
    /// Git operation error
    Git,
    /// HTTP/API error
    Http,
    /// Configuration error
    Config,
    /// I/O operation error
    Io,
    /// GitHub event parsing error
    EventParse,
    /// Runtime error
    Runtime,
    /// Other errors
    Other,
}

impl Error {
    /// Get the error kind, a Copy enum.
    #[inline]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Error::Precondition(_) => ErrorKind::Precondition,
            Error::UnsupportedEvent(_) => ErrorKind::UnsupportedEvent,
            Error::UnsupportedPushTarget { .. } => ErrorKind::UnsupportedPushTarget,
            Error::MissingExpectedRelease(_) => ErrorKind::MissingExpectedRelease,
            Error::ReferenceExists(_) => ErrorKind::ReferenceExists,
            Error::TagCreationFailed(_) => ErrorKind::TagCreationFailed,
            Error::Build(_) => ErrorKind::Build,
            Error::Git(_) => ErrorKind::Git,
            Error::Http(_) => ErrorKind::Http,
            Error::Config(_) => ErrorKind::Config,
            Error::Io(_) => ErrorKind::Io,
            Error::EventParse(_) => ErrorKind::EventParse,
            Error::Runtime(_) => ErrorKind::Runtime,
            Error::Other(_) => ErrorKind::Other,
        }
    }

    /// Borrow the error message without allocating.
    #[inline]
    pub fn message(&self) -> &str {
        match self {
            Error::Precondition(msg)
            | Error::UnsupportedEvent(msg)
            | Error::MissingExpectedRelease(msg)
            | Error::ReferenceExists(msg)
            | Error::TagCreationFailed(msg)
            | Error::Build(msg)
            | Error::Git(msg)
            | Error::Http(msg)
            | Error::Config(msg)
            | Error::EventParse(msg)
            | Error::Runtime(msg)
            | Error::Other(msg) => msg,
            Error::UnsupportedPushTarget { git_ref, .. } => git_ref,
            Error::Io(_) => "I/O error",
        }
    }

    /// Whether this error means the invocation hit a broken upstream contract
    /// rather than a transient collaborator failure.
    pub const fn is_contract_violation(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Precondition
                | ErrorKind::UnsupportedEvent
                | ErrorKind::UnsupportedPushTarget
                | ErrorKind::MissingExpectedRelease
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_is_copy() {
        let err = Error::Git("test".to_string());
        let k = err.kind();
        let k2 = k;
        assert_eq!(k, k2);
    }

    #[test]
    fn test_error_kind_repr_u8() {
        assert_eq!(std::mem::size_of::<ErrorKind>(), 1);
    }

    #[test]
    fn test_error_message_borrows() {
        let err = Error::Config("bad config".to_string());
        let msg: &str = err.message();
        assert_eq!(msg, "bad config");
    }

    #[test]
    fn test_all_error_variants_have_kind() {
        let cases: Vec<(Error, ErrorKind)> = vec![
            (Error::Precondition("p".into()), ErrorKind::Precondition),
            (
                Error::UnsupportedEvent("release".into()),
                ErrorKind::UnsupportedEvent,
            ),
            (
                Error::UnsupportedPushTarget {
                    target: "main".into(),
                    git_ref: "refs/heads/dev".into(),
                },
                ErrorKind::UnsupportedPushTarget,
            ),
            (
                Error::MissingExpectedRelease("m".into()),
                ErrorKind::MissingExpectedRelease,
            ),
            (
                Error::ReferenceExists("refs/tags/v1".into()),
                ErrorKind::ReferenceExists,
            ),
            (
                Error::TagCreationFailed("t".into()),
                ErrorKind::TagCreationFailed,
            ),
            (Error::Build("b".into()), ErrorKind::Build),
            (Error::Git("g".into()), ErrorKind::Git),
            (Error::Http("h".into()), ErrorKind::Http),
            (Error::Config("c".into()), ErrorKind::Config),
            (Error::Io(std::io::Error::other("io")), ErrorKind::Io),
            (Error::EventParse("ep".into()), ErrorKind::EventParse),
            (Error::Runtime("r".into()), ErrorKind::Runtime),
            (Error::Other("o".into()), ErrorKind::Other),
        ];

        for (err, expected_kind) in cases {
            assert_eq!(err.kind(), expected_kind, "Mismatch for {:?}", err);
        }
    }

    #[test]
    fn test_unsupported_push_target_mentions_both_refs() {
        let err = Error::UnsupportedPushTarget {
            target: "main".into(),
            git_ref: "refs/heads/feature".into(),
        };
        let display = err.to_string();
        assert!(display.contains("main"));
        assert!(display.contains("refs/heads/feature"));
    }

    #[test]
    fn test_contract_violations() {
        assert!(Error::MissingExpectedRelease("x".into()).is_contract_violation());
        assert!(Error::UnsupportedEvent("x".into()).is_contract_violation());
        assert!(!Error::Build("x".into()).is_contract_violation());
        assert!(!Error::ReferenceExists("x".into()).is_contract_violation());
    }

    #[test]
    fn test_error_messages_never_contain_token_patterns() {
        let token_patterns = ["ghp_", "gho_", "ghs_", "github_pat_", "Bearer "];
        let errors: Vec<Error> = vec![
            Error::Git("git error".into()),
            Error::Config("config error".into()),
            Error::Http("http error".into()),
            Error::Build("build error".into()),
            Error::TagCreationFailed("tag error".into()),
        ];

        for err in &errors {
            let display = format!("{}", err);
            let debug = format!("{:?}", err);
            for pattern in &token_patterns {
                assert!(
                    !display.contains(pattern),
                    "Error Display contains token pattern '{}': {}",
                    pattern,
                    display
                );
                assert!(
                    !debug.contains(pattern),
                    "Error Debug contains token pattern '{}': {}",
                    pattern,
                    debug
                );
            }
        }
    }
}
