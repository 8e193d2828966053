//! Release orchestration
//!
//! One linear pass per event: classify, then either stop, finalize, or build
//! and optionally tag. Each step's result gates the next; nothing runs in
//! parallel and no state survives the invocation.

use crate::config::InputConfig;
use crate::coordination::classifier::classify;
use crate::coordination::correlator::ReleaseCorrelator;
use crate::coordination::tagger::create_tag;
use crate::error::Result;
use crate::event::Event;
use crate::traits::{BranchResolver, BuildBackend, TagCreator, VersionControl};
use crate::types::{Action, BuildOptions, BuildReport, FinalizeOutcome, NoOpReason, RunOutcome};

/// Drives one event through classification and the collaborators
pub struct ReleaseOrchestrator<'a, B, R, V, T> {
    config: &'a InputConfig<'a>,
    backend: &'a B,
    branches: &'a R,
    vcs: &'a V,
    tagger: &'a T,
}

impl<'a, B, R, V, T> ReleaseOrchestrator<'a, B, R, V, T>
where
    B: BuildBackend,
    R: BranchResolver,
    V: VersionControl,
    T: TagCreator,
{
    /// Create an orchestrator over the given collaborators
    pub fn new(
        config: &'a InputConfig<'a>,
        backend: &'a B,
        branches: &'a R,
        vcs: &'a V,
        tagger: &'a T,
    ) -> Self {
        Self {
            config,
            backend,
            branches,
            vcs,
            tagger,
        }
    }

    /// Handle one event
    pub async fn run(&self, event: &Event) -> Result<RunOutcome> {
        let action = classify(event)?;
        tracing::info!(event = event.name(), action = action.as_str(), "Classified event");

        match action {
            Action::NoOp(reason) => {
                tracing::info!("{}", reason.describe());
                Ok(RunOutcome::Skipped(reason))
            }
            Action::Finalize(tags) => {
                let correlator = ReleaseCorrelator::new(self.backend, &self.config.fleet);
                match correlator.finalize(&tags).await? {
                    FinalizeOutcome::Finalized(id) => Ok(RunOutcome::Finalized(id)),
                    FinalizeOutcome::AlreadyFinal(_) => {
                        Ok(RunOutcome::Skipped(NoOpReason::AlreadyFinal))
                    }
                }
            }
            Action::BuildDraft(tags) => self
                .build(event, BuildOptions::draft(tags))
                .await
                .map(RunOutcome::Built),
            Action::BuildFinal(tags) => self
                .build(event, BuildOptions::final_release(tags))
                .await
                .map(RunOutcome::Built),
        }
    }

    async fn build(&self, event: &Event, options: BuildOptions) -> Result<BuildReport> {
        if self.config.versionbot {
            self.checkout_versionbot_branch(event).await?;
        }

        let draft = options.draft;
        let source = self.config.source_path();
        tracing::info!(
            fleet = %self.config.fleet,
            source = %source.display(),
            draft,
            tags = %options.tags,
            "Sending source to builders"
        );
        let release_id = self.backend.push(&self.config.fleet, &source, options).await?;

        let version = self.backend.get_release_version(release_id).await?;
        tracing::info!(%release_id, %version, "Built release");

        let tag = if self.config.create_tag {
            Some(create_tag(self.tagger, &version, event.commit_sha()).await?)
        } else {
            None
        };

        Ok(BuildReport {
            release_id,
            version,
            draft,
            tag,
        })
    }

    async fn checkout_versionbot_branch(&self, event: &Event) -> Result<()> {
        let Some(pr) = event.pull_request() else {
            tracing::warn!(
                event = event.name(),
                "versionbot is enabled but the event has no pull request; building the current checkout"
            );
            return Ok(());
        };
        let branch = self.branches.get_branch(pr.number).await?;
        tracing::info!(%branch, number = pr.number, "Checking out Versionbot branch");
        self.vcs.checkout(&branch).await
    }
}
