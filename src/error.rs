//! Error types.
//!
//! Two layers:
//!
//! - [`AppError`]: batch-fatal failures (bad manifest, bad flags). Carries the
//!   process exit code.
//! - [`FoldError`] / [`SkipReason`]: object-scoped failures. They abort one
//!   object, get logged and reported, and never stop the batch.

use serde::Serialize;
use thiserror::Error;

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

/// Failures of the folding engine for a single object.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FoldError {
    /// Period missing, non-numeric, non-finite, or `<= 0`.
    #[error("invalid period: {0}")]
    InvalidPeriod(String),

    /// Reference epoch handed to the folder is not finite.
    #[error("invalid epoch: {0}")]
    InvalidEpoch(f64),

    /// Input series or fit window holds too few samples.
    #[error("insufficient data: required {required}, actual {actual}")]
    InsufficientData { required: usize, actual: usize },

    /// Peak fit did not converge within its iteration budget.
    #[error("fit diverged after {iterations} iterations: {message}")]
    FitDivergence { iterations: usize, message: String },

    /// Zero flux dynamic range, or fewer than 2 samples.
    #[error("degenerate series: {0}")]
    DegenerateSeries(String),

    /// A sample with a NaN/infinite time or flux reached the engine.
    #[error("non-finite sample at index {index}")]
    NonFiniteSample { index: usize },
}

impl FoldError {
    /// Stable machine-readable tag, used in reports.
    pub fn kind(&self) -> &'static str {
        match self {
            FoldError::InvalidPeriod(_) => "InvalidPeriod",
            FoldError::InvalidEpoch(_) => "InvalidEpoch",
            FoldError::InsufficientData { .. } => "InsufficientData",
            FoldError::FitDivergence { .. } => "FitDivergence",
            FoldError::DegenerateSeries(_) => "DegenerateSeries",
            FoldError::NonFiniteSample { .. } => "NonFiniteSample",
        }
    }

    pub fn insufficient_data(required: usize, actual: usize) -> Self {
        Self::InsufficientData { required, actual }
    }

    pub fn divergence(iterations: usize, message: impl Into<String>) -> Self {
        Self::FitDivergence {
            iterations,
            message: message.into(),
        }
    }
}

/// Why an object was skipped by the batch pipeline.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SkipReason {
    #[error(transparent)]
    Fold(#[from] FoldError),

    #[error("no light curve file found")]
    CurveNotFound,

    #[error("unreadable light curve: {0}")]
    CurveUnreadable(String),

    #[error("failed to write output curve: {0}")]
    WriteFailed(String),
}

impl SkipReason {
    pub fn kind(&self) -> &'static str {
        match self {
            SkipReason::Fold(e) => e.kind(),
            SkipReason::CurveNotFound => "CurveNotFound",
            SkipReason::CurveUnreadable(_) => "CurveUnreadable",
            SkipReason::WriteFailed(_) => "WriteFailed",
        }
    }
}

impl Serialize for SkipReason {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;
        let mut s = serializer.serialize_struct("SkipReason", 2)?;
        s.serialize_field("kind", self.kind())?;
        s.serialize_field("message", &self.to_string())?;
        s.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skip_reason_forwards_fold_kind() {
        let reason: SkipReason = FoldError::DegenerateSeries("flat".to_string()).into();
        assert_eq!(reason.kind(), "DegenerateSeries");
        assert_eq!(reason.to_string(), "degenerate series: flat");
    }

    #[test]
    fn skip_reason_serializes_kind_and_message() {
        let reason = SkipReason::from(FoldError::insufficient_data(3, 1));
        let json = serde_json::to_string(&reason).unwrap();
        assert_eq!(
            json,
            r#"{"kind":"InsufficientData","message":"insufficient data: required 3, actual 1"}"#
        );
    }
}
