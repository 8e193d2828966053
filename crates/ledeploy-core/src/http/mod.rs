//! HTTP client for GitHub API

pub mod client;

pub use client::{extract_owner_repo, GitHubApiClient};
