//! Records of what each strategy did during a parse.

use std::{fmt, time::Duration};

/// One invoked strategy and what came of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrategyAttempt {
    /// Name of the strategy
    pub strategy: &'static str,

    /// Priority it ran at
    pub priority: u8,

    pub status: AttemptStatus,

    /// Wall time spent inside the strategy
    pub elapsed: Duration,
}

/// Outcome of a single strategy invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptStatus {
    /// Produced this many days.
    Succeeded { days: usize },

    /// Ran, but recognised nothing.
    Declined,

    /// Returned an error.
    Failed(String),

    /// Panicked; the panic was contained.
    Panicked(String),
}

impl AttemptStatus {
    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }

    /// Failure reason, if the attempt did not succeed.
    pub fn reason(&self) -> Option<String> {
        match self {
            Self::Succeeded { .. } => None,
            Self::Declined => Some("no recognizable structure".to_string()),
            Self::Failed(reason) => Some(reason.clone()),
            Self::Panicked(message) => Some(format!("panicked: {message}")),
        }
    }
}

impl fmt::Display for AttemptStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Succeeded { days } => write!(f, "succeeded with {days} day(s)"),
            other => f.write_str(&other.reason().unwrap_or_default()),
        }
    }
}

/// Capability report for one registered strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrategyCapability {
    pub name: &'static str,
    pub priority: u8,
    pub can_handle: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_reason() {
        assert_eq!(AttemptStatus::Succeeded { days: 2 }.reason(), None);
        assert_eq!(
            AttemptStatus::Panicked("boom".into()).reason().as_deref(),
            Some("panicked: boom")
        );
    }

    #[test]
    fn test_status_display() {
        assert_eq!(
            AttemptStatus::Succeeded { days: 3 }.to_string(),
            "succeeded with 3 day(s)"
        );
        assert_eq!(
            AttemptStatus::Failed("bad json".into()).to_string(),
            "bad json"
        );
    }
}
