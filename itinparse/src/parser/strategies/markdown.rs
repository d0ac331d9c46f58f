//! Markdown period-label strategy.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{days_from_split, StrategyOutput, TimelineStrategy};
use crate::{
    context::ParseContext,
    error::Result,
    model::Segment,
    normalizer::{extract_activities, find_time_range, normalize_period, normalize_time, split_days},
};

const NAME: &str = "markdown_period";

// `**上午**`, `**下午（14:00-17:00）**：`, `**Evening 18:00-21:00:**`
static PERIOD_LABEL: Lazy<Regex> = Lazy::new(|| {
    let time = r"\d{1,2}\s*[:：]\s*\d{2}\s*[-~～–—至到]\s*\d{1,2}\s*[:：]\s*\d{2}";
    Regex::new(&format!(
        r"(?i)\*\*\s*(上午|早上|早晨|清晨|中午|午餐|下午|傍晚|晚餐|晚上|夜晚|morning|noon|lunch|afternoon|evening|dinner|night)\s*(?:[（(]\s*({time})\s*[）)])?\s*({time})?\s*[：:]?\s*\*\*\s*[：:]?"
    ))
    .expect("Invalid period label regex")
});

/// Strategy for bodies that mark each part of the day with a bold period
/// label.
///
/// The body is split into days first (at `Day N` / `第N天` markers, or into
/// equal parts when there are too few markers); inside each day the text
/// between one label and the next becomes that period's activities.
///
/// # Examples
///
/// ```
/// use itinparse::model::Period;
/// use itinparse::parser::strategies::{MarkdownPeriodStrategy, TimelineStrategy};
/// use itinparse::ParseContext;
///
/// let input = "**上午** 参观故宫\n**下午** 游览颐和园";
/// let strategy = MarkdownPeriodStrategy::new();
/// let output = strategy.try_parse(input, &ParseContext::new("北京", 1)).unwrap().unwrap();
///
/// let periods: Vec<Period> = output.days[0].segments.iter().map(|s| s.period).collect();
/// assert_eq!(periods, vec![Period::Morning, Period::Afternoon]);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownPeriodStrategy;

impl MarkdownPeriodStrategy {
    /// Creates a new Markdown period strategy.
    #[inline]
    pub fn new() -> Self {
        Self
    }

    /// Segments of one day chunk, in textual order.
    fn segments(&self, chunk: &str) -> Vec<Segment> {
        let labels: Vec<regex::Captures<'_>> = PERIOD_LABEL.captures_iter(chunk).collect();

        labels
            .iter()
            .enumerate()
            .filter_map(|(idx, caps)| {
                let whole = caps.get(0)?;
                let end = labels
                    .get(idx + 1)
                    .and_then(|next| next.get(0))
                    .map_or(chunk.len(), |m| m.start());
                let block = chunk[whole.end()..end].trim();

                let period = normalize_period(&caps[1]);
                let label_time = caps.get(2).or_else(|| caps.get(3)).map(|m| m.as_str());
                // A range right after the label also counts as the label's time.
                let leading = find_time_range(block).filter(|r| r.start == 0);
                let (time, body) = match (label_time, &leading) {
                    (Some(t), _) => (normalize_time(t, period), block),
                    (None, Some(range)) => (range.display.clone(), block[range.end..].trim()),
                    (None, None) => (period.default_time_range().to_string(), block),
                };

                let activities = extract_activities(body);
                (!activities.is_empty()).then(|| Segment {
                    period,
                    time,
                    activities,
                })
            })
            .collect()
    }
}

impl TimelineStrategy for MarkdownPeriodStrategy {
    #[inline]
    fn name(&self) -> &'static str {
        NAME
    }

    #[inline]
    fn priority(&self) -> u8 {
        80
    }

    fn can_handle(&self, input: &str) -> bool {
        PERIOD_LABEL.is_match(input)
    }

    fn try_parse(&self, input: &str, ctx: &ParseContext) -> Result<Option<StrategyOutput>> {
        if !PERIOD_LABEL.is_match(input) {
            return Ok(None);
        }
        let split = split_days(input, ctx.total_days);
        Ok(Some(days_from_split(&split, ctx, |chunk, _| {
            self.segments(chunk)
        })))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::Period;

    /// Period labels this strategy recognises, in order of appearance.
    fn labels_in(input: &str) -> Vec<Period> {
        PERIOD_LABEL
            .captures_iter(input)
            .map(|caps| normalize_period(&caps[1]))
            .collect()
    }

    fn parse(input: &str, days: usize) -> StrategyOutput {
        MarkdownPeriodStrategy::new()
            .try_parse(input, &ParseContext::new("北京", days))
            .unwrap()
            .expect("days expected")
    }

    #[test]
    fn test_label_variants() {
        let input = "**上午**：故宫\n**中午（12:00-13:30）** 烤鸭\n**Evening 18:00-21:00:** 后海";
        assert_eq!(
            labels_in(input),
            vec![Period::Morning, Period::Noon, Period::Evening]
        );
    }

    #[test]
    fn test_slices_between_labels() {
        let output = parse("**上午** 参观故宫\n- 登景山\n**下午** 游览颐和园", 1);
        let day = &output.days[0];
        assert_eq!(day.segments.len(), 2);
        assert_eq!(day.segments[0].activities.len(), 2);
        assert_eq!(day.segments[1].activities[0].title, "游览颐和园");
        assert_eq!(day.segments[1].time, "14:00-17:00");
    }

    #[test]
    fn test_label_time_is_used() {
        let output = parse("**晚上（19:30-21:00）**：看京剧", 1);
        assert_eq!(output.days[0].segments[0].time, "19:30-21:00");
        assert_eq!(output.days[0].segments[0].period, Period::Night);
    }

    #[test]
    fn test_time_after_label_is_used() {
        let output = parse("**上午** 8:30-11:00 爬长城", 1);
        let segment = &output.days[0].segments[0];
        assert_eq!(segment.time, "08:30-11:00");
        assert_eq!(segment.activities[0].title, "爬长城");
    }

    #[test]
    fn test_multiple_days_with_markers() {
        let input = "## Day 1：皇城\n**上午** 故宫\n**下午** 景山\n## Day 2：长城\n**上午** 八达岭";
        let output = parse(input, 2);
        assert_eq!(output.days.len(), 2);
        assert_eq!(output.days[0].title, "皇城");
        assert_eq!(output.days[1].title, "长城");
        assert!(output.warnings.is_empty());
    }

    #[test]
    fn test_day_without_labels_gets_fallback() {
        let input = "Day 1\n**上午** 故宫\nDay 2\n自由活动，逛胡同";
        let output = parse(input, 2);
        assert_eq!(output.days[1].segments.len(), 1);
        assert_eq!(output.warnings.len(), 1);
    }

    #[test]
    fn test_declines_without_labels() {
        let result = MarkdownPeriodStrategy::new()
            .try_parse("上午 参观故宫", &ParseContext::new("北京", 1))
            .unwrap();
        assert!(result.is_none());
    }
}
