//! Catch-all heuristic strategy.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{days_from_split, StrategyOutput, TimelineStrategy};
use crate::{
    context::ParseContext,
    error::Result,
    model::{Period, Segment},
    normalizer::{
        build_activity, clean_text, find_time_range, infer_period, is_sub_heading,
        parse_period_label, split_days,
    },
};

const NAME: &str = "heuristic";

// Summary lines that are not activities.
const META_PREFIXES: &[&str] = &[
    "预算", "总计", "合计", "总费用", "注意", "提示", "温馨提示", "备注", "budget", "total", "note",
];

static CLAUSE_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[。；;！!？?，,]").expect("Invalid clause break regex"));

/// Last-resort strategy that accepts any text.
///
/// Lines become activities; each takes its period from a time range or
/// time-of-day words, else inherits the previous line's period. Consecutive
/// activities with the same period share a segment. A line that talks
/// about several periods ("上午…，下午…") is split at its clause breaks.
///
/// Always produces at least one activity per day.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicStrategy;

impl HeuristicStrategy {
    /// Creates a new heuristic strategy.
    #[inline]
    pub fn new() -> Self {
        Self
    }

    fn segments(&self, chunk: &str) -> Vec<Segment> {
        let mut segments: Vec<Segment> = Vec::new();
        let mut current: Option<Period> = None;

        for raw in chunk.lines() {
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }
            let cleaned = clean_text(line);
            // "**上午**", "### 下午" or "晚上：" alone switch the period.
            if let Some(period) = parse_period_label(&cleaned) {
                current = Some(period);
                continue;
            }
            if is_sub_heading(line) || is_meta(&cleaned) {
                continue;
            }

            for piece in split_by_period(&cleaned) {
                let range = find_time_range(&piece);
                let period = range
                    .as_ref()
                    .map(|r| r.period())
                    .or_else(|| infer_period(&piece))
                    .or(current)
                    .unwrap_or(Period::Morning);
                current = Some(period);

                let Some(activity) = build_activity(&piece) else {
                    continue;
                };
                match segments.last_mut() {
                    Some(last) if last.period == period => last.activities.push(activity),
                    _ => {
                        let mut segment = Segment::new(period, vec![activity]);
                        if let Some(range) = range {
                            segment.time = range.display;
                        }
                        segments.push(segment);
                    }
                }
            }
        }

        segments
    }
}

fn is_meta(line: &str) -> bool {
    let lower = line.to_lowercase();
    META_PREFIXES.iter().any(|p| lower.starts_with(p))
}

/// Splits a line at clause breaks when at least two clauses name a period;
/// clauses without a period word stay attached to the one before.
fn split_by_period(line: &str) -> Vec<String> {
    let clauses: Vec<&str> = CLAUSE_BREAK
        .split(line)
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .collect();
    let with_period = clauses.iter().filter(|c| infer_period(c).is_some()).count();
    if with_period < 2 {
        return vec![line.to_string()];
    }

    let mut pieces: Vec<String> = Vec::new();
    for clause in clauses {
        match pieces.last_mut() {
            Some(last) if infer_period(clause).is_none() => {
                last.push('，');
                last.push_str(clause);
            }
            _ => pieces.push(clause.to_string()),
        }
    }
    pieces
}

impl TimelineStrategy for HeuristicStrategy {
    #[inline]
    fn name(&self) -> &'static str {
        NAME
    }

    #[inline]
    fn priority(&self) -> u8 {
        10
    }

    #[inline]
    fn can_handle(&self, _input: &str) -> bool {
        true
    }

    fn try_parse(&self, input: &str, ctx: &ParseContext) -> Result<Option<StrategyOutput>> {
        let split = split_days(input, ctx.total_days);
        Ok(Some(days_from_split(&split, ctx, |chunk, _| {
            self.segments(chunk)
        })))
    }
}
