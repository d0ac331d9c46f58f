//! Business-rule checks on a parsed timeline.
//!
//! None of these reject a result; they only produce warnings.

use crate::model::{DayPlan, Period};

/// Warnings for timelines that parsed but look wrong.
///
/// - day numbers must run 1, 2, 3, … without gaps
/// - every day should have a morning or an afternoon segment
///
/// # Examples
///
/// ```
/// use itinparse::validation::business_warnings;
///
/// assert!(business_warnings(&[]).is_empty());
/// ```
pub fn business_warnings(days: &[DayPlan]) -> Vec<String> {
    let mut warnings = Vec::new();

    if let Some(first) = days.first() {
        if first.day != 1 {
            warnings.push(format!("timeline starts at day {} instead of day 1", first.day));
        }
    }
    for pair in days.windows(2) {
        if pair[1].day != pair[0].day.saturating_add(1) {
            warnings.push(format!(
                "day numbers are not contiguous: day {} follows day {}",
                pair[1].day, pair[0].day
            ));
        }
    }

    for day in days {
        let has_core_period = day
            .segments
            .iter()
            .any(|s| matches!(s.period, Period::Morning | Period::Afternoon));
        if !has_core_period {
            warnings.push(format!(
                "day {} has neither a morning nor an afternoon segment",
                day.day
            ));
        }
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        context::ParseContext,
        model::Segment,
        normalizer::{build_day_plan, build_activity},
    };

    fn day(number: u32, period: Period) -> DayPlan {
        let activity = build_activity("参观故宫").unwrap();
        build_day_plan(
            number,
            format!("第{number}天"),
            vec![Segment::new(period, vec![activity])],
            &ParseContext::new("北京", 1),
        )
    }

    #[test]
    fn test_clean_timeline_has_no_warnings() {
        let days = vec![day(1, Period::Morning), day(2, Period::Afternoon)];
        assert!(business_warnings(&days).is_empty());
    }

    #[test]
    fn test_gap_in_day_numbers() {
        let days = vec![day(1, Period::Morning), day(3, Period::Morning)];
        let warnings = business_warnings(&days);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("day 3 follows day 1"));
    }

    #[test]
    fn test_evening_only_day() {
        let warnings = business_warnings(&[day(1, Period::Evening)]);
        assert_eq!(
            warnings,
            vec!["day 1 has neither a morning nor an afternoon segment".to_string()]
        );
    }
}
