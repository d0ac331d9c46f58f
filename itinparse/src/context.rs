//! Per-request input bundle shared by every strategy.

use chrono::NaiveDate;

/// Destination used in synthesised text when the caller supplies none.
pub const UNKNOWN_DESTINATION: &str = "未知目的地";

/// Immutable description of the trip being parsed.
///
/// Created once per request and only ever borrowed by the parsers.
///
/// # Examples
///
/// ```
/// use itinparse::ParseContext;
///
/// let ctx = ParseContext::new("北京", 3).with_session_id("sess-42");
/// assert_eq!(ctx.total_days, 3);
/// assert_eq!(ctx.display_destination(), "北京");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParseContext {
    pub destination: String,
    /// Expected number of days; `0` means "take whatever the text says".
    pub total_days: usize,
    pub session_id: String,
    pub start_date: Option<NaiveDate>,
}

impl ParseContext {
    pub fn new(destination: impl Into<String>, total_days: usize) -> Self {
        Self {
            destination: destination.into(),
            total_days,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = session_id.into();
        self
    }

    #[must_use]
    pub fn with_start_date(mut self, start_date: NaiveDate) -> Self {
        self.start_date = Some(start_date);
        self
    }

    /// Destination for display, never empty.
    pub fn display_destination(&self) -> &str {
        let trimmed = self.destination.trim();
        if trimmed.is_empty() {
            UNKNOWN_DESTINATION
        } else {
            trimmed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_destination_falls_back() {
        let ctx = ParseContext::new("  ", 1);
        assert_eq!(ctx.display_destination(), UNKNOWN_DESTINATION);
    }

    #[test]
    fn test_builder_sets_fields() {
        let date = NaiveDate::from_ymd_opt(2025, 5, 1).unwrap();
        let ctx = ParseContext::new("杭州", 2)
            .with_session_id("abc")
            .with_start_date(date);
        assert_eq!(ctx.session_id, "abc");
        assert_eq!(ctx.start_date, Some(date));
    }
}
