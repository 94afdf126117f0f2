use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FrontierError {
    #[error("Malformed input: {field} — {reason}")]
    MalformedInput { field: String, reason: String },

    #[error("Insufficient assets: at least 2 required, got {n}")]
    InsufficientAssets { n: usize },

    #[error("Invalid covariance matrix: {0}")]
    InvalidCovariance(String),

    #[error("Singular covariance matrix: {0}")]
    SingularMatrix(String),

    #[error("Degenerate frontier: budget and return constraints are not independent (determinant {determinant:e})")]
    DegenerateFrontier { determinant: f64 },

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Condition kind, for callers that branch on the failure without parsing
/// the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    MalformedInput,
    InsufficientAssets,
    InvalidCovariance,
    SingularMatrix,
    DegenerateFrontier,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::MalformedInput => "malformed_input",
            ErrorKind::InsufficientAssets => "insufficient_assets",
            ErrorKind::InvalidCovariance => "invalid_covariance",
            ErrorKind::SingularMatrix => "singular_matrix",
            ErrorKind::DegenerateFrontier => "degenerate_frontier",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FrontierError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FrontierError::MalformedInput { .. } | FrontierError::Serialization(_) => {
                ErrorKind::MalformedInput
            }
            FrontierError::InsufficientAssets { .. } => ErrorKind::InsufficientAssets,
            FrontierError::InvalidCovariance(_) => ErrorKind::InvalidCovariance,
            FrontierError::SingularMatrix(_) => ErrorKind::SingularMatrix,
            FrontierError::DegenerateFrontier { .. } => ErrorKind::DegenerateFrontier,
        }
    }

    pub(crate) fn malformed(field: impl Into<String>, reason: impl Into<String>) -> Self {
        FrontierError::MalformedInput {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for FrontierError {
    fn from(e: serde_json::Error) -> Self {
        FrontierError::Serialization(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialization_reports_as_malformed_input() {
        let err: FrontierError = serde_json::from_str::<Vec<f64>>("[1.0,").unwrap_err().into();
        assert_eq!(err.kind(), ErrorKind::MalformedInput);
    }

    #[test]
    fn test_kind_names_are_snake_case() {
        let err = FrontierError::DegenerateFrontier { determinant: 0.0 };
        assert_eq!(err.kind().to_string(), "degenerate_frontier");
        assert_eq!(
            serde_json::to_string(&ErrorKind::SingularMatrix).unwrap(),
            "\"singular_matrix\""
        );
    }

    #[test]
    fn test_message_names_field() {
        let err = FrontierError::malformed("mu", "expected 3 values but got 2");
        assert_eq!(
            err.to_string(),
            "Malformed input: mu — expected 3 values but got 2"
        );
    }
}
