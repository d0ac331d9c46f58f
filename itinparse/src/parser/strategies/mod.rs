//! Parsing strategies for turning itinerary text into day plans.

mod heuristic;
mod json;
mod markdown;
mod numbered;

pub use heuristic::HeuristicStrategy;
pub use json::JsonStrategy;
pub use markdown::MarkdownPeriodStrategy;
pub use numbered::NumberedListStrategy;

use crate::{
    context::ParseContext,
    error::Result,
    model::{DayPlan, Segment},
    normalizer::{build_day_plan, extract_day_title, fallback_segment, DaySplit},
};

/// Trait for strategies that recognise one shape of itinerary text.
///
/// Strategies are stateless; the same instance may run concurrently for
/// any number of requests.
pub trait TimelineStrategy: Send + Sync + std::fmt::Debug {
    /// Returns the name of this strategy for logs and attempt records.
    fn name(&self) -> &'static str;

    /// Returns the priority of this strategy.
    ///
    /// Higher values are tried first.
    fn priority(&self) -> u8;

    /// Cheap, pattern-based check whether this strategy should run at all.
    ///
    /// Must not attempt a full parse.
    fn can_handle(&self, input: &str) -> bool;

    /// Attempts to parse the input.
    ///
    /// `Ok(None)` means the strategy recognised nothing it can use; `Err`
    /// is a strategy-local failure. Either way the next strategy runs.
    fn try_parse(&self, input: &str, ctx: &ParseContext) -> Result<Option<StrategyOutput>>;
}

/// Days produced by a strategy plus anything worth telling the caller.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StrategyOutput {
    pub days: Vec<DayPlan>,
    pub warnings: Vec<String>,
}

impl StrategyOutput {
    pub fn new(days: Vec<DayPlan>) -> Self {
        Self {
            days,
            warnings: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings = warnings;
        self
    }
}

/// The registered strategy variants, in a fixed and test-visible set.
///
/// Built-in strategies are plain variants; anything else plugs in through
/// [`Strategy::Custom`].
#[derive(Debug)]
pub enum Strategy {
    Json(JsonStrategy),
    MarkdownPeriod(MarkdownPeriodStrategy),
    NumberedList(NumberedListStrategy),
    Heuristic(HeuristicStrategy),
    Custom(Box<dyn TimelineStrategy>),
}

impl Strategy {
    /// The four built-in strategies.
    pub fn builtin() -> Vec<Strategy> {
        vec![
            Strategy::Json(JsonStrategy::new()),
            Strategy::MarkdownPeriod(MarkdownPeriodStrategy::new()),
            Strategy::NumberedList(NumberedListStrategy::new()),
            Strategy::Heuristic(HeuristicStrategy::new()),
        ]
    }

    /// Wraps a caller-supplied strategy.
    pub fn custom(strategy: impl TimelineStrategy + 'static) -> Self {
        Strategy::Custom(Box::new(strategy))
    }

    fn inner(&self) -> &dyn TimelineStrategy {
        match self {
            Strategy::Json(s) => s,
            Strategy::MarkdownPeriod(s) => s,
            Strategy::NumberedList(s) => s,
            Strategy::Heuristic(s) => s,
            Strategy::Custom(s) => s.as_ref(),
        }
    }
}

impl TimelineStrategy for Strategy {
    #[inline]
    fn name(&self) -> &'static str {
        self.inner().name()
    }

    #[inline]
    fn priority(&self) -> u8 {
        self.inner().priority()
    }

    fn can_handle(&self, input: &str) -> bool {
        self.inner().can_handle(input)
    }

    fn try_parse(&self, input: &str, ctx: &ParseContext) -> Result<Option<StrategyOutput>> {
        self.inner().try_parse(input, ctx)
    }
}

/// Builds one day per chunk of `split`, asking `segments_for` for each
/// chunk's segments.
///
/// Chunks without segments get a single all-day fallback segment and a
/// warning; a guessed split adds a low-confidence warning.
pub(crate) fn days_from_split(
    split: &DaySplit,
    ctx: &ParseContext,
    mut segments_for: impl FnMut(&str, &mut Vec<String>) -> Vec<Segment>,
) -> StrategyOutput {
    let mut warnings = Vec::new();
    if split.is_low_confidence() {
        warnings.push(format!(
            "low-confidence day split: found {} day marker(s), text cut into {} equal parts",
            split.marker_count,
            split.chunks.len()
        ));
    }

    let days = split
        .chunks
        .iter()
        .enumerate()
        .map(|(idx, chunk)| {
            let day = u32::try_from(idx + 1).unwrap_or(u32::MAX);
            let title = extract_day_title(chunk, &format!("第{day}天"));
            let mut segments = segments_for(chunk, &mut warnings);
            if segments.is_empty() {
                warnings.push(format!(
                    "day {day}: no period structure recognised, kept as one segment"
                ));
                segments.push(fallback_segment(chunk, ctx));
            }
            build_day_plan(day, title, segments, ctx)
        })
        .collect();

    StrategyOutput::new(days).with_warnings(warnings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_priorities() {
        let priorities: Vec<(&str, u8)> = Strategy::builtin()
            .iter()
            .map(|s| (s.name(), s.priority()))
            .collect();
        assert_eq!(
            priorities,
            vec![
                ("json", 100),
                ("markdown_period", 80),
                ("numbered_list", 70),
                ("heuristic", 10)
            ]
        );
    }

    #[test]
    fn test_heuristic_always_handles() {
        let strategy = Strategy::Heuristic(HeuristicStrategy::new());
        assert!(strategy.can_handle("随便写点什么"));
    }
}
