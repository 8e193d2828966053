//! Release correlation for the finalize path
//!
//! Finalization state is rederived from the build backend's release history on
//! every invocation. Nothing is cached.

use crate::error::{Error, Result};
use crate::traits::BuildBackend;
use crate::types::{CorrelationTags, FinalizeOutcome, ReleaseRecord};

/// Finds the release built for a pull request and finalizes it at most once
pub struct ReleaseCorrelator<'a, B> {
    backend: &'a B,
    fleet: &'a str,
}

impl<'a, B: BuildBackend> ReleaseCorrelator<'a, B> {
    /// Correlator for releases of `fleet`
    pub fn new(backend: &'a B, fleet: &'a str) -> Self {
        Self { backend, fleet }
    }

    /// Most recent release matching `tags`, if any
    pub async fn find_release(&self, tags: &CorrelationTags) -> Result<Option<ReleaseRecord>> {
        self.backend.get_release_by_tags(self.fleet, tags).await
    }

    /// Finalize the draft correlated by `tags`.
    ///
    /// A missing release is a hard error: the pull request reached finalize
    /// without a draft ever being built. An already final release is left
    /// alone, which absorbs duplicate `closed` deliveries.
    pub async fn finalize(&self, tags: &CorrelationTags) -> Result<FinalizeOutcome> {
        let release = self.find_release(tags).await?.ok_or_else(|| {
            Error::MissingExpectedRelease(format!("fleet {} with tags {}", self.fleet, tags))
        })?;

        if release.is_final {
            tracing::info!(release_id = %release.id, "Release is already finalized so skipping.");
            return Ok(FinalizeOutcome::AlreadyFinal(release.id));
        }

        self.backend.finalize(release.id).await?;
        tracing::info!(release_id = %release.id, "Finalized release");
        Ok(FinalizeOutcome::Finalized(release.id))
    }
}
