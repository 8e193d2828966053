//! Idempotent tag creation
//!
//! Creating a reference is not idempotent at the collaborator level. Re-run
//! workflows and repeated pushes of an already tagged commit must still
//! succeed, so the one benign failure (the reference already existing) is
//! downgraded to an informational log. Everything else still fails.

use crate::error::{Error, ErrorKind, Result};
use crate::traits::TagCreator;
use crate::types::TagOutcome;

/// Create tag `version` at `sha`, treating an existing reference as success
pub async fn create_tag<T: TagCreator>(creator: &T, version: &str, sha: &str) -> Result<TagOutcome> {
    match creator.create_tag(version, sha).await {
        Ok(()) => {
            tracing::info!(%version, %sha, "Created tag");
            Ok(TagOutcome::Created)
        }
        Err(e) if e.kind() == ErrorKind::ReferenceExists => {
            tracing::info!(%version, %sha, "Git reference already exists.");
            Ok(TagOutcome::AlreadyExists)
        }
        Err(e @ Error::TagCreationFailed(_)) => Err(e),
        Err(e) => Err(Error::TagCreationFailed(format!("{} at {}: {}", version, sha, e))),
    }
}
