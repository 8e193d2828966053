//! In-memory collaborators (testing only)
//!
//! Provides `MemoryBackend`, `MemoryBranches`, `MemoryCheckout` and
//! `MemoryTagger` that satisfy the collaborator traits and record every call,
//! so tests can assert both results and which side effects happened.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::error::{Error, Result};
use crate::traits::{BranchResolver, BuildBackend, TagCreator, VersionControl};
use crate::types::{BuildOptions, CorrelationTags, ReleaseId, ReleaseRecord};

/// Call recorded by [`MemoryBackend`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
    /// `get_release_by_tags`
    Lookup {
        /// Fleet looked up
        fleet: String,
        /// Tags looked up
        tags: CorrelationTags,
    },
    /// `finalize`
    Finalize(ReleaseId),
    /// `push`
    Push {
        /// Fleet built
        fleet: String,
        /// Source path built
        source: PathBuf,
        /// Options passed to the build
        options: BuildOptions,
    },
    /// `get_release_version`
    Version(ReleaseId),
}

#[derive(Debug)]
struct StoredRelease {
    fleet: String,
    tags: CorrelationTags,
    is_final: bool,
    version: String,
}

#[derive(Debug, Default)]
struct BackendState {
    releases: Vec<(ReleaseId, StoredRelease)>,
    next_id: u64,
    next_version: Option<String>,
    fail_push: Option<String>,
    calls: Vec<BackendCall>,
}

/// In-memory build backend with a release history
#[derive(Debug, Default)]
pub struct MemoryBackend {
    state: Mutex<BackendState>,
}

impl MemoryBackend {
    /// Empty backend; the first pushed release gets id 1
    pub fn new() -> Self {
        Self {
            state: Mutex::new(BackendState {
                next_id: 1,
                ..Default::default()
            }),
        }
    }

    /// Id the next `push` will return
    pub fn with_next_release_id(self, id: u64) -> Self {
        self.state.lock().next_id = id;
        self
    }

    /// Version the next pushed release resolves to (default `0.0.<id>`)
    pub fn with_next_version(self, version: impl Into<String>) -> Self {
        self.state.lock().next_version = Some(version.into());
        self
    }

    /// Make every `push` fail with a build error
    pub fn failing_push(self, message: impl Into<String>) -> Self {
        self.state.lock().fail_push = Some(message.into());
        self
    }

    /// Seed a release as if an earlier invocation had built it
    pub fn insert_release(
        &self,
        fleet: &str,
        id: u64,
        tags: CorrelationTags,
        is_final: bool,
        version: &str,
    ) {
        let mut state = self.state.lock();
        state.releases.push((
            ReleaseId(id),
            StoredRelease {
                fleet: fleet.to_string(),
                tags,
                is_final,
                version: version.to_string(),
            },
        ));
        state.next_id = state.next_id.max(id + 1);
    }

    /// Current finalization state of a release
    pub fn is_final(&self, id: ReleaseId) -> Option<bool> {
        self.state
            .lock()
            .releases
            .iter()
            .find(|(rid, _)| *rid == id)
            .map(|(_, r)| r.is_final)
    }

    /// Every call made so far, in order
    pub fn calls(&self) -> Vec<BackendCall> {
        self.state.lock().calls.clone()
    }

    /// Number of `finalize` calls made so far
    pub fn finalize_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, BackendCall::Finalize(_)))
            .count()
    }

    /// Options of every `push` call made so far
    pub fn pushed_options(&self) -> Vec<BuildOptions> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                BackendCall::Push { options, .. } => Some(options),
                _ => None,
            })
            .collect()
    }
}

fn tags_match(stored: &CorrelationTags, wanted: &CorrelationTags) -> bool {
    // sha alone suffices when no pull request id is given
    stored.sha == wanted.sha
        && (wanted.pull_request_id.is_none() || stored.pull_request_id == wanted.pull_request_id)
}

impl BuildBackend for MemoryBackend {
    async fn get_release_by_tags(
        &self,
        fleet: &str,
        tags: &CorrelationTags,
    ) -> Result<Option<ReleaseRecord>> {
        let mut state = self.state.lock();
        state.calls.push(BackendCall::Lookup {
            fleet: fleet.to_string(),
            tags: tags.clone(),
        });
        // Most recent first
        Ok(state
            .releases
            .iter()
            .rev()
            .find(|(_, r)| r.fleet == fleet && tags_match(&r.tags, tags))
            .map(|(id, r)| ReleaseRecord {
                id: *id,
                is_final: r.is_final,
            }))
    }

    async fn finalize(&self, release: ReleaseId) -> Result<()> {
        let mut state = self.state.lock();
        state.calls.push(BackendCall::Finalize(release));
        match state.releases.iter_mut().find(|(id, _)| *id == release) {
            Some((_, r)) => {
                r.is_final = true;
                Ok(())
            }
            None => Err(Error::Build(format!("Release {} not found", release))),
        }
    }

    async fn push(&self, fleet: &str, source: &Path, options: BuildOptions) -> Result<ReleaseId> {
        let mut state = self.state.lock();
        state.calls.push(BackendCall::Push {
            fleet: fleet.to_string(),
            source: source.to_path_buf(),
            options: options.clone(),
        });
        if let Some(message) = &state.fail_push {
            return Err(Error::Build(message.clone()));
        }
        let id = ReleaseId(state.next_id);
        state.next_id += 1;
        let version = state
            .next_version
            .take()
            .unwrap_or_else(|| format!("0.0.{}", id));
        state.releases.push((
            id,
            StoredRelease {
                fleet: fleet.to_string(),
                tags: options.tags,
                is_final: !options.draft,
                version,
            },
        ));
        Ok(id)
    }

    async fn get_release_version(&self, release: ReleaseId) -> Result<String> {
        let mut state = self.state.lock();
        state.calls.push(BackendCall::Version(release));
        state
            .releases
            .iter()
            .find(|(id, _)| *id == release)
            .map(|(_, r)| r.version.clone())
            .ok_or_else(|| Error::Build(format!("Release {} not found", release)))
    }
}

/// In-memory pull request branch lookup
#[derive(Debug, Default)]
pub struct MemoryBranches {
    branches: HashMap<u64, String>,
    lookups: Mutex<Vec<u64>>,
}

impl MemoryBranches {
    /// Empty lookup table
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the branch for a pull request number
    pub fn with_branch(mut self, number: u64, branch: impl Into<String>) -> Self {
        self.branches.insert(number, branch.into());
        self
    }

    /// Pull request numbers looked up so far
    pub fn lookups(&self) -> Vec<u64> {
        self.lookups.lock().clone()
    }
}

impl BranchResolver for MemoryBranches {
    async fn get_branch(&self, number: u64) -> Result<String> {
        self.lookups.lock().push(number);
        self.branches
            .get(&number)
            .cloned()
            .ok_or_else(|| Error::Http(format!("No branch for pull request #{}", number)))
    }
}

/// Records checkouts instead of touching a working copy
#[derive(Debug, Default)]
pub struct MemoryCheckout {
    checkouts: Mutex<Vec<String>>,
}

impl MemoryCheckout {
    /// Fresh recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Branches checked out so far
    pub fn checkouts(&self) -> Vec<String> {
        self.checkouts.lock().clone()
    }
}

impl VersionControl for MemoryCheckout {
    async fn checkout(&self, branch: &str) -> Result<()> {
        self.checkouts.lock().push(branch.to_string());
        Ok(())
    }
}

/// Tag store that behaves like a remote: creating an existing tag fails with
/// [`Error::ReferenceExists`]
#[derive(Debug, Default)]
pub struct MemoryTagger {
    tags: Mutex<HashSet<String>>,
    attempts: Mutex<Vec<(String, String)>>,
    failure: Option<String>,
}

impl MemoryTagger {
    /// Empty tag store
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every attempt fail with an unrelated error
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Default::default()
        }
    }

    /// Seed an existing tag
    pub fn with_tag(self, version: &str) -> Self {
        self.tags.lock().insert(version.to_string());
        self
    }

    /// `(version, sha)` pairs attempted so far
    pub fn attempts(&self) -> Vec<(String, String)> {
        self.attempts.lock().clone()
    }

    /// Whether a tag exists
    pub fn has_tag(&self, version: &str) -> bool {
        self.tags.lock().contains(version)
    }
}

impl TagCreator for MemoryTagger {
    async fn create_tag(&self, version: &str, sha: &str) -> Result<()> {
        self.attempts
            .lock()
            .push((version.to_string(), sha.to_string()));
        if let Some(message) = &self.failure {
            return Err(Error::Http(message.clone()));
        }
        if !self.tags.lock().insert(version.to_string()) {
            return Err(Error::ReferenceExists(format!("refs/tags/{}", version)));
        }
        Ok(())
    }
}
