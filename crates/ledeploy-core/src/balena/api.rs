//! balena REST API client for release lookup, finalization and versions

use crate::error::{Error, Result};
use crate::types::{CorrelationTags, ReleaseId, ReleaseRecord};
use serde::Deserialize;

/// OData collection envelope
#[derive(Debug, Deserialize)]
struct ODataResponse<T> {
    d: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct ApiRelease {
    id: u64,
    is_final: bool,
}

#[derive(Debug, Deserialize)]
struct ApiReleaseVersion {
    raw_version: String,
}

/// Quote a value as an OData string literal
pub(crate) fn odata_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// `$filter` selecting releases of `fleet` that carry every tag in `tags`
pub(crate) fn release_filter(fleet: &str, tags: &CorrelationTags) -> String {
    let mut filter = format!(
        "belongs_to__application/any(a:a/slug eq {})",
        odata_quote(&fleet.to_lowercase())
    );
    for (key, value) in tags.pairs() {
        filter.push_str(&format!(
            " and release_tag/any(rt:(rt/tag_key eq {}) and (rt/value eq {}))",
            odata_quote(key),
            odata_quote(&value)
        ));
    }
    filter
}

/// balena API client
pub struct BalenaApiClient {
    client: reqwest::Client,
    api_url: String,
    token: Option<String>,
}

impl std::fmt::Debug for BalenaApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BalenaApiClient")
            .field("api_url", &self.api_url)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish_non_exhaustive()
    }
}

impl BalenaApiClient {
    /// Create a new client for `api_url` (e.g. `https://api.balena-cloud.com`)
    pub fn new(api_url: String, token: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(concat!("ledeploy/", env!("CARGO_PKG_VERSION")))
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    /// Create from environment variables (`BALENA_TOKEN`)
    pub fn from_env(api_url: String) -> Self {
        let token = std::env::var("BALENA_TOKEN").ok().filter(|t| !t.is_empty());
        Self::new(api_url, token)
    }

    /// API base URL
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.token {
            Some(ref token) => request.header("Authorization", format!("Bearer {}", token)),
            None => request,
        }
    }

    async fn check(response: reqwest::Response, what: &str) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(Error::Build(format!(
            "balena API returned {} while {}: {}",
            status,
            what,
            body.trim()
        )))
    }

    /// Most recent release of `fleet` matching `tags`
    ///
    /// Endpoint: GET /v6/release
    pub async fn get_release_by_tags(
        &self,
        fleet: &str,
        tags: &CorrelationTags,
    ) -> Result<Option<ReleaseRecord>> {
        let url = format!("{}/v6/release", self.api_url);
        let filter = release_filter(fleet, tags);

        let request = self.client.get(&url).query(&[
            ("$filter", filter.as_str()),
            ("$select", "id,is_final"),
            ("$orderby", "created_at desc"),
            ("$top", "1"),
        ]);

        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| Error::Http(format!("Failed to fetch releases: {}", e)))?;
        let response = Self::check(response, "looking up release").await?;

        let releases: ODataResponse<ApiRelease> = response
            .json()
            .await
            .map_err(|e| Error::Build(format!("Failed to parse release response: {}", e)))?;

        Ok(releases.d.into_iter().next().map(|r| ReleaseRecord {
            id: ReleaseId(r.id),
            is_final: r.is_final,
        }))
    }

    /// Mark a release as final
    ///
    /// Endpoint: PATCH /v6/release({id})
    pub async fn finalize(&self, release: ReleaseId) -> Result<()> {
        let url = format!("{}/v6/release({})", self.api_url, release);
        let request = self
            .client
            .patch(&url)
            .json(&serde_json::json!({ "is_final": true }));

        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| Error::Http(format!("Failed to finalize release {}: {}", release, e)))?;
        Self::check(response, "finalizing release").await?;
        Ok(())
    }

    /// Raw semantic version of a release
    ///
    /// Endpoint: GET /v6/release({id})
    pub async fn get_release_version(&self, release: ReleaseId) -> Result<String> {
        let url = format!("{}/v6/release({})", self.api_url, release);
        let request = self.client.get(&url).query(&[("$select", "raw_version")]);

        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| Error::Http(format!("Failed to fetch release {}: {}", release, e)))?;
        let response = Self::check(response, "fetching release version").await?;

        let versions: ODataResponse<ApiReleaseVersion> = response
            .json()
            .await
            .map_err(|e| Error::Build(format!("Failed to parse release response: {}", e)))?;

        versions
            .d
            .into_iter()
            .next()
            .map(|v| v.raw_version)
            .ok_or_else(|| Error::Build(format!("Release {} not found", release)))
    }
}
