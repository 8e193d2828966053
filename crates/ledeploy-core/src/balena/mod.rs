//! balena build backend

pub mod api;
pub mod push;

pub use api::BalenaApiClient;
pub use push::BalenaCli;

use std::path::Path;

use crate::error::Result;
use crate::traits::BuildBackend;
use crate::types::{BuildOptions, CorrelationTags, ReleaseId, ReleaseRecord};

/// Builds with the balena CLI, queries and finalizes through the API
#[derive(Debug)]
pub struct BalenaBackend {
    api: BalenaApiClient,
    cli: BalenaCli,
}

impl BalenaBackend {
    /// Combine an API client and a CLI driver
    pub fn new(api: BalenaApiClient, cli: BalenaCli) -> Self {
        Self { api, cli }
    }

    /// Backend for `api_url` using `BALENA_TOKEN` and the `balena` on `PATH`
    pub fn from_env(api_url: String) -> Self {
        Self::new(BalenaApiClient::from_env(api_url), BalenaCli::default())
    }
}

impl BuildBackend for BalenaBackend {
    async fn get_release_by_tags(
        &self,
        fleet: &str,
        tags: &CorrelationTags,
    ) -> Result<Option<ReleaseRecord>> {
        self.api.get_release_by_tags(fleet, tags).await
    }

    async fn finalize(&self, release: ReleaseId) -> Result<()> {
        self.api.finalize(release).await
    }

    async fn push(&self, fleet: &str, source: &Path, options: BuildOptions) -> Result<ReleaseId> {
        self.cli.push(fleet, source, &options).await
    }

    async fn get_release_version(&self, release: ReleaseId) -> Result<String> {
        self.api.get_release_version(release).await
    }
}
