//! Analysis job kinds.

use serde::{Deserialize, Serialize};

/// Tag identifying the analysis type of a job.
///
/// The pipeline routes on this tag but never interprets the payload; unknown
/// tags are carried through as [`JobKind::Custom`] so new analysis types can
/// flow end-to-end without a core change.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum JobKind {
    /// Physiological signal analysis (ECG and similar waveforms).
    SignalAnalysis,
    /// 2D-to-3D image registration.
    Registration,
    /// Any other analysis tag, carried verbatim.
    Custom(String),
}

impl JobKind {
    pub fn as_str(&self) -> &str {
        match self {
            JobKind::SignalAnalysis => "signal-analysis",
            JobKind::Registration => "registration",
            JobKind::Custom(kind) => kind,
        }
    }
}

impl From<String> for JobKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "signal-analysis" | "signal" => JobKind::SignalAnalysis,
            "registration" => JobKind::Registration,
            _ => JobKind::Custom(value),
        }
    }
}

impl From<JobKind> for String {
    fn from(value: JobKind) -> Self {
        value.as_str().to_string()
    }
}

impl core::fmt::Display for JobKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_tags_map_to_variants() {
        assert_eq!(JobKind::from("signal-analysis".to_string()), JobKind::SignalAnalysis);
        assert_eq!(JobKind::from("signal".to_string()), JobKind::SignalAnalysis);
        assert_eq!(JobKind::from("registration".to_string()), JobKind::Registration);
    }

    #[test]
    fn unknown_tags_are_preserved() {
        let kind = JobKind::from("gait-analysis".to_string());
        assert_eq!(kind, JobKind::Custom("gait-analysis".to_string()));
        assert_eq!(kind.as_str(), "gait-analysis");
    }

    #[test]
    fn serde_uses_string_form() {
        let json = serde_json::to_string(&JobKind::SignalAnalysis).unwrap();
        assert_eq!(json, "\"signal-analysis\"");

        let kind: JobKind = serde_json::from_str("\"registration\"").unwrap();
        assert_eq!(kind, JobKind::Registration);
    }
}
