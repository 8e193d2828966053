//! `balena push` driver

use std::path::{Path, PathBuf};
use std::process::Stdio;

use memchr::memmem;

use crate::error::{Error, Result};
use crate::types::{BuildOptions, ReleaseId};

/// Marker preceding the release id in the builder's summary line,
/// e.g. `[Info] Release: 5f8a2c1 (id: 2401933)`
const RELEASE_ID_MARKER: &[u8] = b"(id: ";

/// Extract the release id from `balena push` output.
///
/// The last occurrence wins: builder logs may echo earlier ids before the
/// final summary.
pub fn parse_release_id(output: &str) -> Option<ReleaseId> {
    let bytes = output.as_bytes();
    let start = memmem::rfind(bytes, RELEASE_ID_MARKER)? + RELEASE_ID_MARKER.len();
    let digits = bytes[start..]
        .iter()
        .take_while(|b| b.is_ascii_digit())
        .count();
    if digits == 0 || bytes.get(start + digits) != Some(&b')') {
        return None;
    }
    output[start..start + digits].parse().ok()
}

/// Runs the balena CLI to build releases
#[derive(Debug, Clone)]
pub struct BalenaCli {
    program: PathBuf,
}

impl Default for BalenaCli {
    fn default() -> Self {
        Self::new("balena")
    }
}

impl BalenaCli {
    /// Driver for the given `balena` executable
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Command line arguments for a build
    pub fn push_args(fleet: &str, source: &Path, options: &BuildOptions) -> Vec<String> {
        let mut args = vec![
            "push".to_string(),
            fleet.to_string(),
            "--source".to_string(),
            source.display().to_string(),
            "--release-tag".to_string(),
        ];
        for (key, value) in options.tags.pairs() {
            args.push(key.to_string());
            args.push(value);
        }
        if options.draft {
            args.push("--draft".to_string());
        }
        args
    }

    /// Build `source` for `fleet` and return the new release id
    pub async fn push(&self, fleet: &str, source: &Path, options: &BuildOptions) -> Result<ReleaseId> {
        let args = Self::push_args(fleet, source, options);
        tracing::debug!(program = %self.program.display(), ?args, "Running balena push");

        let output = tokio::process::Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| {
                Error::Build(format!(
                    "Failed to run {}: {}",
                    self.program.display(),
                    e
                ))
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        if !output.status.success() {
            return Err(Error::Build(format!(
                "balena push exited with {}: {}",
                output.status,
                tail(&stderr, 20)
            )));
        }

        parse_release_id(&stdout)
            .or_else(|| parse_release_id(&stderr))
            .ok_or_else(|| {
                Error::Build(format!(
                    "balena push succeeded but no release id was reported: {}",
                    tail(&stdout, 20)
                ))
            })
    }
}

/// Last `n` lines of `s`
fn tail(s: &str, n: usize) -> String {
    let lines: Vec<&str> = s.trim_end().lines().collect();
    lines[lines.len().saturating_sub(n)..].join("\n")
}
