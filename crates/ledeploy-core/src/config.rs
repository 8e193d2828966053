//! Action inputs

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Default balena environment the API host is derived from
pub const DEFAULT_ENVIRONMENT: &str = "balena-cloud.com";

/// Resolved action inputs
#[derive(Debug, Clone)]
pub struct InputConfig<'a> {
    /// Fleet to build for (required)
    pub fleet: Cow<'a, str>,
    /// Build context relative to the workspace
    pub source: Cow<'a, str>,
    /// Checkout root (`GITHUB_WORKSPACE`)
    pub workspace: Cow<'a, Path>,
    /// Check out the Versionbot branch before building
    pub versionbot: bool,
    /// Tag the built version; `create_tag` and legacy `create_ref` folded together
    pub create_tag: bool,
    /// balena environment, e.g. `balena-cloud.com`
    pub environment: Cow<'a, str>,
}

impl Default for InputConfig<'_> {
    fn default() -> Self {
        Self {
            fleet: Cow::Borrowed(""),
            source: Cow::Borrowed(""),
            workspace: Cow::Borrowed(Path::new(".")),
            versionbot: false,
            create_tag: false,
            environment: Cow::Borrowed(DEFAULT_ENVIRONMENT),
        }
    }
}

impl InputConfig<'_> {
    /// Check required inputs
    pub fn validate(&self) -> Result<()> {
        if self.fleet.trim().is_empty() {
            return Err(Error::Config("Input required and not supplied: fleet".to_string()));
        }
        if Path::new(self.source.as_ref()).is_absolute() {
            return Err(Error::Config(format!(
                "source must be relative to the workspace: {}",
                self.source
            )));
        }
        Ok(())
    }

    /// Path the build backend receives
    pub fn source_path(&self) -> PathBuf {
        let source = self.source.trim_start_matches("./");
        if source.is_empty() {
            self.workspace.to_path_buf()
        } else {
            self.workspace.join(source)
        }
    }

    /// Base URL of the balena API for the configured environment
    pub fn api_url(&self) -> String {
        format!("https://api.{}", self.environment.trim_end_matches('/'))
    }
}

/// Parse a boolean action input.
///
/// Accepts the YAML 1.2 core schema spellings GitHub Actions uses
/// (`true True TRUE false False FALSE`). Unset or empty inputs yield `None`.
pub fn parse_boolean_input(name: &str, value: Option<&str>) -> Result<Option<bool>> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some("true" | "True" | "TRUE") => Ok(Some(true)),
        Some("false" | "False" | "FALSE") => Ok(Some(false)),
        Some(other) => Err(Error::Config(format!(
            "Input does not meet YAML 1.2 \"Core Schema\" specification: {} ({:?}). \
             Support boolean input list: `true | True | TRUE | false | False | FALSE`",
            name, other
        ))),
    }
}

/// Fold `create_tag` and its deprecated alias `create_ref` into one flag.
///
/// `create_tag` is a strict boolean. `create_ref` predates that and was read
/// as a plain string: any non-empty value other than a false spelling enables
/// tagging. Either input being true enables tagging.
pub fn resolve_create_tag(create_tag: Option<&str>, create_ref: Option<&str>) -> Result<bool> {
    let tag = parse_boolean_input("create_tag", create_tag)?;
    let legacy = create_ref
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(|v| !matches!(v, "false" | "False" | "FALSE"));
    if legacy.is_some() {
        tracing::warn!("Input create_ref is deprecated, use create_tag instead");
    }
    Ok(tag.unwrap_or(false) || legacy.unwrap_or(false))
}
