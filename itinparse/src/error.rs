//! Error types for itinerary timeline parsing.

use std::fmt;

/// Result type alias for parsing operations.
pub type Result<T> = std::result::Result<T, TimelineError>;

/// Errors that can occur while turning itinerary text into a timeline.
///
/// None of these ever reach the caller of
/// [`parse_timeline`](crate::parse_timeline) as a hard failure: the
/// orchestrator converts them into a failed [`ParseResult`](crate::ParseResult)
/// that still carries fallback data.
#[derive(Debug, thiserror::Error)]
pub enum TimelineError {
    /// The input was empty or whitespace only.
    #[error("Input is empty")]
    EmptyInput,

    /// The input is shorter than the minimum the parsers can work with.
    #[error("Input too short: {len} characters (minimum {min})")]
    InputTooShort {
        /// Number of meaningful characters found.
        len: usize,
        /// Minimum required.
        min: usize,
    },

    /// A strategy ran but produced no day plans.
    #[error("No day plans could be produced")]
    NoDayPlans,

    /// A single strategy failed.
    #[error("Strategy failed: {0}")]
    Strategy(StrategyError),

    /// All parsing strategies failed or declined.
    #[error("All parsing strategies failed")]
    AllStrategiesFailed {
        /// Details of each failed strategy attempt.
        attempts: Vec<StrategyError>,
    },

    /// JSON parsing error from serde_json.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl TimelineError {
    /// Creates a strategy-local error.
    #[inline]
    pub fn strategy(strategy: &'static str, error: impl Into<String>) -> Self {
        Self::Strategy(StrategyError::new(strategy, error))
    }
}

/// Details of a failed parsing strategy attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrategyError {
    /// Name of the strategy that failed.
    pub strategy: &'static str,
    /// Error message describing why it failed.
    pub error: String,
}

impl StrategyError {
    /// Creates a new strategy error.
    #[inline]
    pub fn new(strategy: &'static str, error: impl Into<String>) -> Self {
        Self {
            strategy,
            error: error.into(),
        }
    }
}

impl fmt::Display for StrategyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.strategy, self.error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_error_display() {
        let err = StrategyError::new("markdown_period", "no period labels");
        assert_eq!(err.to_string(), "markdown_period: no period labels");
    }

    #[test]
    fn test_input_too_short_message() {
        let err = TimelineError::InputTooShort { len: 1, min: 2 };
        assert!(err.to_string().contains("minimum 2"));
    }

    #[test]
    fn test_error_from_json() {
        let json_err = serde_json::from_str::<u32>("not a number").unwrap_err();
        let err: TimelineError = json_err.into();
        assert!(matches!(err, TimelineError::Json(_)));
    }

    #[test]
    fn test_strategy_constructor() {
        let err = TimelineError::strategy("json", "schema mismatch");
        match err {
            TimelineError::Strategy(inner) => assert_eq!(inner.strategy, "json"),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
