#[cfg(target_env = "musl")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use anyhow::Context;
use clap::Parser;
use ledeploy_core::config::{parse_boolean_input, resolve_create_tag};
use ledeploy_core::output::{safe_output_escape, ActionOutputs, OutputWriter};
use ledeploy_core::{Event, InputConfig, RunOutcome};
use std::borrow::Cow;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ledeploy", version, about = "Event-driven fleet release orchestration")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Build, finalize or skip a release for the current workflow event
    Deploy(DeployArgs),
}

#[derive(clap::Args)]
struct DeployArgs {
    /// Fleet to build releases for
    #[arg(long, env = "INPUT_FLEET")]
    fleet: Option<String>,

    /// Build context, relative to the workspace
    #[arg(long, env = "INPUT_SOURCE")]
    source: Option<String>,

    /// Build from the pull request's Versionbot branch
    #[arg(long, env = "INPUT_VERSIONBOT")]
    versionbot: Option<String>,

    /// Create a git tag for the built version
    #[arg(long, env = "INPUT_CREATE_TAG")]
    create_tag: Option<String>,

    /// Deprecated alias of --create-tag
    #[arg(long, env = "INPUT_CREATE_REF", hide = true)]
    create_ref: Option<String>,

    /// balena environment (API host is api.<environment>)
    #[arg(long, env = "INPUT_ENVIRONMENT")]
    environment: Option<String>,

    /// Checkout root (default: current directory)
    #[arg(long, env = "GITHUB_WORKSPACE")]
    workspace: Option<String>,

    /// Output format: gha, json, text (default: auto-detect)
    #[arg(long, env = "LEDEPLOY_OUTPUT_FORMAT")]
    output_format: Option<String>,
}

/// Output format for the CLI
enum OutputFormat {
    /// GitHub Actions: write to $GITHUB_OUTPUT + summary to stdout
    Gha,
    /// Full JSON to stdout
    Json,
    /// Human-readable text to stdout
    Text,
}

impl OutputFormat {
    fn detect(explicit: Option<&str>) -> Self {
        match explicit {
            Some("gha") => OutputFormat::Gha,
            Some("json") => OutputFormat::Json,
            Some("text") => OutputFormat::Text,
            _ => {
                if std::env::var("GITHUB_ACTIONS").is_ok() {
                    OutputFormat::Gha
                } else {
                    OutputFormat::Text
                }
            }
        }
    }
}

fn main() {
    init_tracing();
    let cli = Cli::parse();
    let code = match cli.command {
        Commands::Deploy(args) => run_deploy(args),
    };
    std::process::exit(code);
}

/// Log to stderr, filtered by `LEDEPLOY_LOG` (default `info`)
fn init_tracing() {
    let filter = EnvFilter::try_from_env("LEDEPLOY_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Filter empty string from Option (env vars may produce "" for empty values)
fn clean_opt(v: &Option<String>) -> Option<&str> {
    v.as_deref().filter(|s| !s.is_empty())
}

fn run_deploy(args: DeployArgs) -> i32 {
    let output_format = OutputFormat::detect(clean_opt(&args.output_format));

    let result = deploy(&args).and_then(|outcome| {
        let outputs = ActionOutputs::from_outcome(&outcome);
        match output_format {
            OutputFormat::Gha => write_gha_output(&outcome, outputs.as_ref())?,
            OutputFormat::Json => write_json_output(&outcome, outputs.as_ref()),
            OutputFormat::Text => write_text_output(&outcome),
        }
        Ok(())
    });

    match result {
        Ok(()) => 0,
        Err(e) => {
            tracing::error!("{:#}", e);
            if matches!(output_format, OutputFormat::Gha) {
                println!("::error::{}", safe_output_escape(&format!("{:#}", e)));
            }
            1
        }
    }
}

fn deploy(args: &DeployArgs) -> anyhow::Result<RunOutcome> {
    let workspace = clean_opt(&args.workspace)
        .map(PathBuf::from)
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

    // Build InputConfig borrowing from args
    let mut config = InputConfig {
        fleet: Cow::Borrowed(clean_opt(&args.fleet).unwrap_or("")),
        source: Cow::Borrowed(clean_opt(&args.source).unwrap_or("")),
        workspace: Cow::Borrowed(workspace.as_path()),
        versionbot: parse_boolean_input("versionbot", clean_opt(&args.versionbot))?
            .unwrap_or(false),
        create_tag: resolve_create_tag(clean_opt(&args.create_tag), clean_opt(&args.create_ref))?,
        ..Default::default()
    };
    if let Some(environment) = clean_opt(&args.environment) {
        config.environment = Cow::Borrowed(environment);
    }
    config.validate()?;

    let event = Event::from_env().context("Failed to read workflow event")?;
    tracing::info!(
        event = event.name(),
        sha = event.commit_sha(),
        fleet = %config.fleet,
        "Processing workflow event"
    );

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to create runtime")?;

    let outcome = rt.block_on(ledeploy_core::deploy(&config, &event))?;
    Ok(outcome)
}

/// Write outputs using GitHub Actions multiline syntax to $GITHUB_OUTPUT
///
/// Failing to record the outputs of a build fails the step.
fn write_gha_output(outcome: &RunOutcome, outputs: Option<&ActionOutputs>) -> anyhow::Result<()> {
    if let Some(outputs) = outputs {
        match std::env::var("GITHUB_OUTPUT") {
            Ok(path) => {
                OutputWriter::append(Path::new(&path), outputs)
                    .with_context(|| format!("Cannot write GITHUB_OUTPUT ({})", path))?;
            }
            Err(_) => {
                tracing::warn!("GITHUB_OUTPUT not set, falling back to stdout");
                write_json_output(outcome, Some(outputs));
                return Ok(());
            }
        }
    }

    // Summary to stdout (visible in job log)
    write_text_output(outcome);
    Ok(())
}

/// Write full JSON output to stdout
fn write_json_output(outcome: &RunOutcome, outputs: Option<&ActionOutputs>) {
    let mut output = serde_json::json!({ "outcome": outcome_name(outcome) });
    match outcome {
        RunOutcome::Skipped(reason) => {
            output["reason"] = serde_json::json!(reason.describe());
        }
        RunOutcome::Finalized(id) => {
            output["release_id"] = serde_json::json!(id.to_string());
        }
        RunOutcome::Built(report) => {
            if let Some(outputs) = outputs {
                output["version"] = serde_json::json!(outputs.version);
                output["release_id"] = serde_json::json!(outputs.release_id);
            }
            output["draft"] = serde_json::json!(report.draft);
            output["tag"] = serde_json::json!(report.tag.map(|t| t.as_str()));
        }
    }

    let stdout = std::io::stdout();
    let mut lock = stdout.lock();
    let _ = serde_json::to_writer(&mut lock, &output);
    let _ = writeln!(lock);
}

/// Write human-readable text to stdout
fn write_text_output(outcome: &RunOutcome) {
    let stdout = std::io::stdout();
    let mut w = stdout.lock();

    let _ = writeln!(w, "Le Deploy Results");
    let _ = writeln!(w, "=================");
    match outcome {
        RunOutcome::Skipped(reason) => {
            let _ = writeln!(w, "Skipped: {}", reason.describe());
        }
        RunOutcome::Finalized(id) => {
            let _ = writeln!(w, "Finalized release: {id}");
        }
        RunOutcome::Built(report) => {
            let kind = if report.draft { "draft" } else { "final" };
            let _ = writeln!(w, "Built {kind} release: {}", report.release_id);
            let _ = writeln!(w, "Version: {}", report.version);
            if let Some(tag) = report.tag {
                let _ = writeln!(w, "Tag: {}", tag.as_str());
            }
        }
    }
}

fn outcome_name(outcome: &RunOutcome) -> &'static str {
    match outcome {
        RunOutcome::Skipped(_) => "skipped",
        RunOutcome::Finalized(_) => "finalized",
        RunOutcome::Built(_) => "built",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledeploy_core::{BuildReport, ReleaseId};

    #[test]
    fn test_unwritable_output_file_fails() {
        let dir = std::env::temp_dir().join(format!("ledeploy-missing-{}", std::process::id()));
        let path = dir.join("nested").join("output");
        std::env::set_var("GITHUB_OUTPUT", &path);

        let outcome = RunOutcome::Built(BuildReport {
            release_id: ReleaseId(42),
            version: "1.2.3".to_string(),
            draft: false,
            tag: None,
        });
        let outputs = ActionOutputs::from_outcome(&outcome);
        let err = write_gha_output(&outcome, outputs.as_ref()).unwrap_err();

        assert!(format!("{:#}", err).contains("Cannot write GITHUB_OUTPUT"));
        assert!(!path.exists());
    }
}
