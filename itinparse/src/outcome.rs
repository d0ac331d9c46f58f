//! Tagged parse outcome that always carries usable data.

use serde::{ser::SerializeStruct, Serialize, Serializer};

/// Outcome of a parse.
///
/// A failure still holds fallback data, so callers can render something
/// without branching on success first.
///
/// # Examples
///
/// ```
/// use itinparse::ParseResult;
///
/// let failed: ParseResult<Vec<u32>> = ParseResult::failure(vec!["empty".into()], vec![1]);
/// assert!(!failed.is_success());
/// assert_eq!(failed.data(), &vec![1]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseResult<T> {
    Success {
        data: T,
        warnings: Vec<String>,
    },
    Failure {
        errors: Vec<String>,
        fallback: T,
    },
}

impl<T> ParseResult<T> {
    #[inline]
    pub fn success(data: T, warnings: Vec<String>) -> Self {
        Self::Success { data, warnings }
    }

    #[inline]
    pub fn failure(errors: Vec<String>, fallback: T) -> Self {
        Self::Failure { errors, fallback }
    }

    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Parsed data on success, fallback data on failure.
    pub fn data(&self) -> &T {
        match self {
            Self::Success { data, .. } => data,
            Self::Failure { fallback, .. } => fallback,
        }
    }

    pub fn into_data(self) -> T {
        match self {
            Self::Success { data, .. } => data,
            Self::Failure { fallback, .. } => fallback,
        }
    }

    /// Warnings of a success; empty for failures.
    pub fn warnings(&self) -> &[String] {
        match self {
            Self::Success { warnings, .. } => warnings,
            Self::Failure { .. } => &[],
        }
    }

    /// Errors of a failure; empty for successes.
    pub fn errors(&self) -> &[String] {
        match self {
            Self::Success { .. } => &[],
            Self::Failure { errors, .. } => errors,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ParseResult<U> {
        match self {
            Self::Success { data, warnings } => ParseResult::Success {
                data: f(data),
                warnings,
            },
            Self::Failure { errors, fallback } => ParseResult::Failure {
                errors,
                fallback: f(fallback),
            },
        }
    }
}

// Wire shape: `{success, data, warnings}` or `{success, errors, fallbackData}`.
impl<T: Serialize> Serialize for ParseResult<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ParseResult", 3)?;
        match self {
            Self::Success { data, warnings } => {
                state.serialize_field("success", &true)?;
                state.serialize_field("data", data)?;
                state.serialize_field("warnings", warnings)?;
            }
            Self::Failure { errors, fallback } => {
                state.serialize_field("success", &false)?;
                state.serialize_field("errors", errors)?;
                state.serialize_field("fallbackData", fallback)?;
            }
        }
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_success_accessors() {
        let ok = ParseResult::success(3, vec!["slow".to_string()]);
        assert!(ok.is_success());
        assert_eq!(*ok.data(), 3);
        assert_eq!(ok.warnings(), ["slow".to_string()]);
        assert!(ok.errors().is_empty());
    }

    #[test]
    fn test_map_keeps_variant() {
        let failed = ParseResult::failure(vec!["boom".to_string()], 2).map(|n| n * 10);
        assert_eq!(failed.into_data(), 20);
    }

    #[test]
    fn test_serialized_shape() {
        let ok = serde_json::to_value(ParseResult::success(vec![1], vec![])).unwrap();
        assert_eq!(ok, json!({"success": true, "data": [1], "warnings": []}));

        let failed =
            serde_json::to_value(ParseResult::failure(vec!["e".to_string()], vec![2])).unwrap();
        assert_eq!(
            failed,
            json!({"success": false, "errors": ["e"], "fallbackData": [2]})
        );
    }
}
