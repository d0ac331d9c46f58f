//! Numbered list / time-range strategy.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{days_from_split, StrategyOutput, TimelineStrategy};
use crate::{
    context::ParseContext,
    error::Result,
    model::{Period, Segment},
    normalizer::{
        build_activity, clean_text, days::DAY_MARKER, find_time_range, infer_period,
        parse_period_label, split_days, strip_list_marker,
    },
};

const NAME: &str = "numbered_list";

static ORDINAL_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^[ \t]*(?:\*\*)?[ \t]*(\d{1,2})[ \t]*[.、)）][ \t]*\S")
        .expect("Invalid ordinal line regex")
});

static BOLD_NUMBERED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\*\*\s*\d{1,2}\s*[.、]\s*[^*\n]{1,20}\*\*").expect("Invalid bold numbered regex")
});

static LEADING_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([^：:\s]{1,6})\s*[：:]").expect("Invalid leading label regex"));

/// A segment under construction: its items are raw text until the end.
#[derive(Debug)]
struct Draft {
    period: Period,
    time: String,
    /// Opened by an explicit time token; later items stay inside it.
    timed: bool,
    items: Vec<String>,
}

impl Draft {
    fn untimed(period: Period) -> Self {
        Self {
            period,
            time: period.default_time_range().to_string(),
            timed: false,
            items: Vec::new(),
        }
    }
}

/// Strategy for ordinal lists and bodies delimited by time ranges.
///
/// A time token (`09:00-12:00`, `9点-12点`, `09:00~12:00`) opens a segment,
/// and the list items that follow belong to it until the next token. Items
/// with no preceding token take their period from a leading label, from
/// time-of-day words, or from their position in the list.
#[derive(Debug, Clone, Copy, Default)]
pub struct NumberedListStrategy;

impl NumberedListStrategy {
    /// Creates a new numbered list strategy.
    #[inline]
    pub fn new() -> Self {
        Self
    }

    fn segments(&self, chunk: &str) -> Vec<Segment> {
        let mut drafts: Vec<Draft> = Vec::new();

        for raw in chunk.lines() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') || DAY_MARKER.is_match(line) {
                continue;
            }
            let cleaned = clean_text(line);
            if let Some(period) = parse_period_label(&cleaned) {
                drafts.push(Draft::untimed(period));
                continue;
            }

            let ordinal = ORDINAL_LINE
                .captures(&cleaned)
                .and_then(|caps| caps[1].parse::<u32>().ok());
            let body = strip_list_marker(&cleaned);
            let is_item = ordinal.is_some() || body.len() != cleaned.trim_start().len();

            if let Some(range) = find_time_range(body) {
                let rest = format!("{}{}", &body[..range.start], &body[range.end..]);
                let rest = rest.trim().trim_start_matches([':', '：', '-', ',', '，']).trim();
                let mut draft = Draft {
                    period: range.period(),
                    time: range.display.clone(),
                    timed: true,
                    items: Vec::new(),
                };
                if rest.chars().count() >= 2 {
                    draft.items.push(rest.to_string());
                }
                drafts.push(draft);
                continue;
            }

            if is_item {
                self.place_item(&mut drafts, body, ordinal);
                continue;
            }

            // Continuation of the previous item, or a loose line that names
            // its own period.
            if let Some(item) = drafts.last_mut().and_then(|d| d.items.last_mut()) {
                item.push(' ');
                item.push_str(&cleaned);
            } else if let Some(period) = infer_period(&cleaned) {
                let mut draft = Draft::untimed(period);
                draft.items.push(cleaned);
                drafts.push(draft);
            }
        }

        drafts
            .into_iter()
            .filter_map(|draft| {
                let activities: Vec<_> = draft
                    .items
                    .iter()
                    .filter_map(|item| build_activity(item))
                    .collect();
                (!activities.is_empty()).then(|| Segment {
                    period: draft.period,
                    time: draft.time,
                    activities,
                })
            })
            .collect()
    }

    fn place_item(&self, drafts: &mut Vec<Draft>, body: &str, ordinal: Option<u32>) {
        if let Some(last) = drafts.last_mut() {
            if last.timed {
                last.items.push(body.to_string());
                return;
            }
        }

        let period = leading_period(body)
            .or_else(|| infer_period(body))
            .or_else(|| ordinal.map(period_for_ordinal))
            .or_else(|| drafts.last().map(|d| d.period))
            .unwrap_or(Period::Morning);

        match drafts.last_mut() {
            Some(last) if last.period == period => last.items.push(body.to_string()),
            _ => {
                let mut draft = Draft::untimed(period);
                draft.items.push(body.to_string());
                drafts.push(draft);
            }
        }
    }
}

fn leading_period(body: &str) -> Option<Period> {
    LEADING_LABEL
        .captures(body)
        .and_then(|caps| parse_period_label(&caps[1]))
}

/// Position-based guess for unlabelled items: the first two fill the
/// morning, the next two the afternoon, the rest the evening.
const fn period_for_ordinal(ordinal: u32) -> Period {
    match ordinal {
        0..=2 => Period::Morning,
        3..=4 => Period::Afternoon,
        _ => Period::Evening,
    }
}

impl TimelineStrategy for NumberedListStrategy {
    #[inline]
    fn name(&self) -> &'static str {
        NAME
    }

    #[inline]
    fn priority(&self) -> u8 {
        70
    }

    fn can_handle(&self, input: &str) -> bool {
        find_time_range(input).is_some()
            || BOLD_NUMBERED.is_match(input)
            || ORDINAL_LINE.find_iter(input).take(2).count() == 2
    }

    fn try_parse(&self, input: &str, ctx: &ParseContext) -> Result<Option<StrategyOutput>> {
        let split = split_days(input, ctx.total_days);
        let per_chunk: Vec<Vec<Segment>> = split.chunks.iter().map(|c| self.segments(c)).collect();
        if per_chunk.iter().all(Vec::is_empty) {
            return Ok(None);
        }

        let mut per_chunk = per_chunk.into_iter();
        Ok(Some(days_from_split(&split, ctx, |_, _| {
            per_chunk.next().unwrap_or_default()
        })))
    }
}
