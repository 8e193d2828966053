//! GitHub REST API client for tags and pull request branches

use crate::error::{Error, Result};
use crate::traits::{BranchResolver, TagCreator};
use reqwest::StatusCode;
use serde::Deserialize;

/// Message GitHub returns when creating a ref that already exists
const REFERENCE_EXISTS: &str = "Reference already exists";

/// GitHub API error body
#[derive(Debug, Deserialize)]
struct GitHubErrorBody {
    message: String,
}

/// Pull request subset used for branch resolution
#[derive(Debug, Deserialize)]
struct GitHubPullRequest {
    head: GitHubBranchRef,
}

#[derive(Debug, Deserialize)]
struct GitHubBranchRef {
    #[serde(rename = "ref")]
    name: String,
}

/// Map a failed `POST /git/refs` to an error.
///
/// HTTP 422 carrying "Reference already exists" becomes
/// [`Error::ReferenceExists`]; everything else is [`Error::Http`].
pub(crate) fn ref_creation_error(status: StatusCode, body: &str, git_ref: &str) -> Error {
    let message = serde_json::from_str::<GitHubErrorBody>(body)
        .map(|b| b.message)
        .unwrap_or_else(|_| body.trim().to_string());

    if status == StatusCode::UNPROCESSABLE_ENTITY && message == REFERENCE_EXISTS {
        return Error::ReferenceExists(git_ref.to_string());
    }
    Error::Http(format!(
        "GitHub API returned {} creating {}: {}",
        status, git_ref, message
    ))
}

/// GitHub API client scoped to one repository
pub struct GitHubApiClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
    owner: String,
    repo: String,
}

impl std::fmt::Debug for GitHubApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubApiClient")
            .field("base_url", &self.base_url)
            .field("repository", &format_args!("{}/{}", self.owner, self.repo))
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish_non_exhaustive()
    }
}

impl GitHubApiClient {
    /// Create a new GitHub API client
    pub fn new(base_url: String, token: Option<String>, owner: String, repo: String) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(concat!("ledeploy/", env!("CARGO_PKG_VERSION")))
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            owner,
            repo,
        }
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        let base_url = std::env::var("GITHUB_API_URL")
            .unwrap_or_else(|_| "https://api.github.com".to_string());
        let token = std::env::var("GITHUB_TOKEN").ok().filter(|t| !t.is_empty());
        let (owner, repo) = extract_owner_repo()?;

        Ok(Self::new(base_url, token, owner, repo))
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let request = request.header("Accept", "application/vnd.github+json");
        match self.token {
            Some(ref token) => request.header("Authorization", format!("Bearer {}", token)),
            None => request,
        }
    }

    /// Create `refs/tags/<tag>` pointing at `sha`
    ///
    /// Endpoint: POST /repos/{owner}/{repo}/git/refs
    pub async fn create_ref(&self, tag: &str, sha: &str) -> Result<()> {
        let url = format!("{}/repos/{}/{}/git/refs", self.base_url, self.owner, self.repo);
        let git_ref = format!("refs/tags/{}", tag);

        let request = self
            .client
            .post(&url)
            .json(&serde_json::json!({ "ref": git_ref, "sha": sha }));

        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| Error::Http(format!("GitHub API request failed: {}", e)))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(ref_creation_error(status, &body, &git_ref))
    }

    /// Head branch of a pull request
    ///
    /// Endpoint: GET /repos/{owner}/{repo}/pulls/{number}
    pub async fn pull_request_head_ref(&self, number: u64) -> Result<String> {
        let url = format!(
            "{}/repos/{}/{}/pulls/{}",
            self.base_url, self.owner, self.repo, number
        );

        let response = self
            .authorize(self.client.get(&url))
            .send()
            .await
            .map_err(|e| Error::Http(format!("GitHub API request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::Http(format!(
                "GitHub API returned error fetching pull request #{}: {}",
                number,
                response.status()
            )));
        }

        let pr: GitHubPullRequest = response
            .json()
            .await
            .map_err(|e| Error::Http(format!("Failed to parse GitHub API response: {}", e)))?;

        Ok(pr.head.name)
    }
}

impl TagCreator for GitHubApiClient {
    async fn create_tag(&self, version: &str, sha: &str) -> Result<()> {
        self.create_ref(version, sha).await
    }
}

impl BranchResolver for GitHubApiClient {
    async fn get_branch(&self, number: u64) -> Result<String> {
        self.pull_request_head_ref(number).await
    }
}

/// Extract owner and repo from the GITHUB_REPOSITORY environment variable.
pub fn extract_owner_repo() -> Result<(String, String)> {
    let repository = std::env::var("GITHUB_REPOSITORY")
        .map_err(|_| Error::Config("GITHUB_REPOSITORY not set".to_string()))?;
    split_repository(&repository)
}

/// Split `owner/repo`
pub fn split_repository(repository: &str) -> Result<(String, String)> {
    match repository.split_once('/') {
        Some((owner, repo)) if !owner.is_empty() && !repo.is_empty() && !repo.contains('/') => {
            Ok((owner.to_string(), repo.to_string()))
        }
        _ => Err(Error::Config(format!(
            "Invalid GITHUB_REPOSITORY format: {}",
            repository
        ))),
    }
}
