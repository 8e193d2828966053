//! Output values and escaping utilities

use serde::Serialize;

use crate::types::{BuildReport, RunOutcome};

/// Escape for GitHub Actions safe output (percent-encoding special chars)
pub fn safe_output_escape(s: &str) -> String {
    s.replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

/// Values published as step outputs after a build
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionOutputs {
    /// Semantic version of the built release
    pub version: String,
    /// Backend release identifier
    pub release_id: String,
}

impl ActionOutputs {
    /// Outputs for a run, `None` unless a release was built
    pub fn from_outcome(outcome: &RunOutcome) -> Option<Self> {
        outcome.build_report().map(Self::from)
    }

    /// Name/value pairs in output order
    pub fn pairs(&self) -> [(&'static str, &str); 2] {
        [("version", &self.version), ("release_id", &self.release_id)]
    }
}

impl From<&BuildReport> for ActionOutputs {
    fn from(report: &BuildReport) -> Self {
        Self {
            version: report.version.clone(),
            release_id: report.release_id.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{NoOpReason, ReleaseId, TagOutcome};

    fn report() -> BuildReport {
        BuildReport {
            release_id: ReleaseId(2_112_233),
            version: "0.5.1".to_string(),
            draft: false,
            tag: Some(TagOutcome::Created),
        }
    }

    #[test]
    fn test_safe_output_escape() {
        assert_eq!(safe_output_escape("plain"), "plain");
        assert_eq!(safe_output_escape("a\nb"), "a%0Ab");
        assert_eq!(safe_output_escape("a\r\nb"), "a%0D%0Ab");
        assert_eq!(safe_output_escape("100%"), "100%25");
        // Percent is escaped first so encoded sequences are not double-decoded
        assert_eq!(safe_output_escape("%0A"), "%250A");
    }

    #[test]
    fn test_outputs_from_built() {
        let outcome = RunOutcome::Built(report());
        let outputs = ActionOutputs::from_outcome(&outcome).unwrap();
        assert_eq!(outputs.version, "0.5.1");
        assert_eq!(outputs.release_id, "2112233");
        assert_eq!(
            outputs.pairs(),
            [("version", "0.5.1"), ("release_id", "2112233")]
        );
    }

    #[test]
    fn test_no_outputs_without_build() {
        assert!(ActionOutputs::from_outcome(&RunOutcome::Finalized(ReleaseId(1))).is_none());
        assert!(
            ActionOutputs::from_outcome(&RunOutcome::Skipped(NoOpReason::AlreadyFinal)).is_none()
        );
    }

    #[test]
    fn test_outputs_serialize() {
        let outputs = ActionOutputs::from(&report());
        let json = serde_json::to_string(&outputs).unwrap();
        assert_eq!(json, r#"{"version":"0.5.1","release_id":"2112233"}"#);
    }
}
