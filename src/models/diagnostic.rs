//! Problems found in source data, reported alongside best-effort results.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::MatchId;

/// Record-level and structural problems.
///
/// None of these abort a batch: they are converted into [`Diagnostic`]s and
/// returned next to whatever could be built.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("Malformed record #{index}: {reason}")]
    MalformedRecord { index: usize, reason: String },

    #[error("Duplicate match id {0}, keeping first occurrence")]
    DuplicateId(MatchId),

    #[error("Round {round} has {found} matches, expected {expected}")]
    InconsistentRoundSizes { round: u32, expected: usize, found: usize },

    #[error("Found {candidates} root candidates, chose {chosen}")]
    AmbiguousBracket { candidates: usize, chosen: MatchId },

    #[error("Match {0} is finished but neither side is the winner")]
    InconsistentWinner(MatchId),

    #[error("Match {from} links to unknown match {to}")]
    DanglingLink { from: MatchId, to: MatchId },

    #[error("Match {match_id} has {count} feeder matches, expected 0 or 2")]
    InvalidFeeders { match_id: MatchId, count: usize },
}

impl EngineError {
    /// Serializable category of this error.
    pub fn kind(&self) -> DiagnosticKind {
        match self {
            EngineError::MalformedRecord { .. } => DiagnosticKind::MalformedRecord,
            EngineError::DuplicateId(_) => DiagnosticKind::DuplicateId,
            EngineError::InconsistentRoundSizes { .. } => DiagnosticKind::InconsistentRoundSizes,
            EngineError::AmbiguousBracket { .. } => DiagnosticKind::AmbiguousBracket,
            EngineError::InconsistentWinner(_) => DiagnosticKind::InconsistentWinner,
            EngineError::DanglingLink { .. } => DiagnosticKind::DanglingLink,
            EngineError::InvalidFeeders { .. } => DiagnosticKind::InvalidFeeders,
        }
    }

    /// Match the problem is attached to, if any.
    pub fn record(&self) -> Option<String> {
        match self {
            EngineError::MalformedRecord { index, .. } => Some(format!("#{}", index)),
            EngineError::DuplicateId(id) | EngineError::InconsistentWinner(id) => {
                Some(id.to_string())
            }
            EngineError::InconsistentRoundSizes { .. } => None,
            EngineError::AmbiguousBracket { chosen, .. } => Some(chosen.to_string()),
            EngineError::DanglingLink { from, .. } => Some(from.to_string()),
            EngineError::InvalidFeeders { match_id, .. } => Some(match_id.to_string()),
        }
    }
}

/// Serializable diagnostic category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiagnosticKind {
    MalformedRecord,
    DuplicateId,
    InconsistentRoundSizes,
    AmbiguousBracket,
    InconsistentWinner,
    DanglingLink,
    InvalidFeeders,
}

impl std::fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DiagnosticKind::MalformedRecord => "malformed-record",
            DiagnosticKind::DuplicateId => "duplicate-id",
            DiagnosticKind::InconsistentRoundSizes => "inconsistent-round-sizes",
            DiagnosticKind::AmbiguousBracket => "ambiguous-bracket",
            DiagnosticKind::InconsistentWinner => "inconsistent-winner",
            DiagnosticKind::DanglingLink => "dangling-link",
            DiagnosticKind::InvalidFeeders => "invalid-feeders",
        };
        write!(f, "{}", s)
    }
}

/// A reported problem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub record: Option<String>,
    pub message: String,
}

impl From<EngineError> for Diagnostic {
    fn from(err: EngineError) -> Self {
        Self {
            kind: err.kind(),
            record: err.record(),
            message: err.to_string(),
        }
    }
}

/// A best-effort result and the diagnostics gathered while producing it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnosed<T> {
    pub data: T,
    pub diagnostics: Vec<Diagnostic>,
}

impl<T> Diagnosed<T> {
    /// Wrap `data` with the diagnostics found while producing it.
    pub fn new(data: T, diagnostics: Vec<Diagnostic>) -> Self {
        Self { data, diagnostics }
    }

    /// Wrap `data` with no diagnostics.
    pub fn clean(data: T) -> Self {
        Self::new(data, Vec::new())
    }

    /// Check whether any diagnostic of `kind` was reported.
    pub fn has(&self, kind: DiagnosticKind) -> bool {
        self.diagnostics.iter().any(|d| d.kind == kind)
    }

    /// Number of diagnostics of `kind`.
    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.diagnostics.iter().filter(|d| d.kind == kind).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_from_error() {
        let diag = Diagnostic::from(EngineError::DuplicateId("m1".into()));
        assert_eq!(diag.kind, DiagnosticKind::DuplicateId);
        assert_eq!(diag.record.as_deref(), Some("m1"));
        assert!(diag.message.contains("m1"));
    }

    #[test]
    fn test_kind_serialization() {
        let json = serde_json::to_string(&DiagnosticKind::InconsistentRoundSizes).unwrap();
        assert_eq!(json, "\"inconsistent-round-sizes\"");
        assert_eq!(
            format!("{}", DiagnosticKind::InconsistentRoundSizes),
            "inconsistent-round-sizes"
        );
    }

    #[test]
    fn test_malformed_record_points_at_index() {
        let err = EngineError::MalformedRecord {
            index: 4,
            reason: "missing id".to_string(),
        };
        assert_eq!(err.record().as_deref(), Some("#4"));
        assert_eq!(err.to_string(), "Malformed record #4: missing id");
    }

    #[test]
    fn test_diagnosed_counts() {
        let out = Diagnosed::new(
            (),
            vec![
                EngineError::DuplicateId("a".into()).into(),
                EngineError::DuplicateId("b".into()).into(),
                EngineError::InconsistentWinner("c".into()).into(),
            ],
        );
        assert_eq!(out.count(DiagnosticKind::DuplicateId), 2);
        assert!(out.has(DiagnosticKind::InconsistentWinner));
        assert!(!out.has(DiagnosticKind::AmbiguousBracket));
    }
}
