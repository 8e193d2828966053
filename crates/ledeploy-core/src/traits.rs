//! Collaborator traits
//!
//! Every I/O boundary the orchestrator touches is a trait with
//! `impl Future` returns: static dispatch, no boxing. Production
//! implementations live in [`crate::balena`], [`crate::http`] and
//! [`crate::git`]; in-memory ones in [`crate::fakes`].

use std::future::Future;
use std::path::Path;

use crate::error::Result;
use crate::types::{BuildOptions, CorrelationTags, ReleaseId, ReleaseRecord};

/// Build backend that turns a source tree into a release
pub trait BuildBackend {
    /// Most recent release of `fleet` carrying all of `tags`
    fn get_release_by_tags(
        &self,
        fleet: &str,
        tags: &CorrelationTags,
    ) -> impl Future<Output = Result<Option<ReleaseRecord>>> + Send;

    /// Promote a release to final
    fn finalize(&self, release: ReleaseId) -> impl Future<Output = Result<()>> + Send;

    /// Build `source` for `fleet` and return the new release
    fn push(
        &self,
        fleet: &str,
        source: &Path,
        options: BuildOptions,
    ) -> impl Future<Output = Result<ReleaseId>> + Send;

    /// Resolved semantic version of a release
    fn get_release_version(&self, release: ReleaseId)
        -> impl Future<Output = Result<String>> + Send;
}

/// Resolves the auxiliary version-bookkeeping branch of a pull request
pub trait BranchResolver {
    /// Branch name for pull request `number`
    fn get_branch(&self, number: u64) -> impl Future<Output = Result<String>> + Send;
}

/// Working-copy operations
pub trait VersionControl {
    /// Fetch and check out `branch` into the workspace
    fn checkout(&self, branch: &str) -> impl Future<Output = Result<()>> + Send;
}

/// Creates tag references.
///
/// Implementations report an existing reference as
/// [`Error::ReferenceExists`](crate::error::Error::ReferenceExists) and every
/// other failure as some other variant.
pub trait TagCreator {
    /// Create `refs/tags/<version>` pointing at `sha`
    fn create_tag(&self, version: &str, sha: &str) -> impl Future<Output = Result<()>> + Send;
}
