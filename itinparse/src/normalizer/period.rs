//! Period labels and time ranges.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::Period;

/// Closed vocabulary of period labels, matched exactly.
const LABEL_VOCABULARY: &[(&str, Period)] = &[
    ("上午", Period::Morning),
    ("早上", Period::Morning),
    ("早晨", Period::Morning),
    ("清晨", Period::Morning),
    ("中午", Period::Noon),
    ("午餐", Period::Noon),
    ("下午", Period::Afternoon),
    ("傍晚", Period::Evening),
    ("晚餐", Period::Evening),
    ("晚上", Period::Night),
    ("夜晚", Period::Night),
    ("morning", Period::Morning),
    ("noon", Period::Noon),
    ("lunch", Period::Noon),
    ("afternoon", Period::Afternoon),
    ("evening", Period::Evening),
    ("dinner", Period::Evening),
    ("night", Period::Night),
];

// Checked in order: "afternoon" must win over "noon", "傍晚" over "晚上".
const INFERENCE_KEYWORDS: &[(&[&str], Period)] = &[
    (&["下午", "afternoon"], Period::Afternoon),
    (&["中午", "午餐", "午饭", "noon", "lunch"], Period::Noon),
    (&["傍晚", "晚餐", "晚饭", "evening", "dinner"], Period::Evening),
    (&["晚上", "夜", "night"], Period::Night),
    (
        &["上午", "早上", "早晨", "清晨", "早餐", "morning", "breakfast"],
        Period::Morning,
    ),
];

static CLOCK_RANGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d{1,2})\s*[:：]\s*(\d{2})\s*[-~～–—至到]\s*(\d{1,2})\s*[:：]\s*(\d{2})")
        .expect("Invalid clock range regex")
});

static HOUR_RANGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d{1,2})\s*[点时]\s*[-~～–—至到]\s*(\d{1,2})\s*[点时]")
        .expect("Invalid hour range regex")
});

static START_TIME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{1,2})\s*[:：]\s*(\d{2})").expect("Invalid start time regex"));

/// Maps a period label from the closed vocabulary onto a [`Period`].
///
/// Surrounding whitespace, asterisks and colons are ignored; anything else
/// must match exactly.
///
/// # Examples
///
/// ```
/// use itinparse::model::Period;
/// use itinparse::normalizer::parse_period_label;
///
/// assert_eq!(parse_period_label("**下午**："), Some(Period::Afternoon));
/// assert_eq!(parse_period_label("Evening"), Some(Period::Evening));
/// assert_eq!(parse_period_label("黄昏"), None);
/// ```
pub fn parse_period_label(label: &str) -> Option<Period> {
    let key = label
        .trim_matches(|c: char| c == '*' || c == ':' || c == '：' || c.is_whitespace())
        .to_lowercase();
    LABEL_VOCABULARY
        .iter()
        .find(|(word, _)| *word == key)
        .map(|(_, period)| *period)
}

/// Like [`parse_period_label`] but defaults unknown labels to
/// [`Period::Morning`]. Callers that care should check
/// [`parse_period_label`] first and surface a warning.
pub fn normalize_period(label: &str) -> Period {
    parse_period_label(label).unwrap_or(Period::Morning)
}

/// Guesses the period a free-text line talks about from time-of-day words.
pub fn infer_period(text: &str) -> Option<Period> {
    let lower = text.to_lowercase();
    INFERENCE_KEYWORDS
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(_, period)| *period)
}

/// A time-range token found in text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeRange {
    /// Byte offset where the token starts.
    pub start: usize,
    /// Byte offset just past the token.
    pub end: usize,
    pub start_hour: u32,
    /// Canonical `HH:MM-HH:MM` rendering.
    pub display: String,
}

impl TimeRange {
    /// Period the range starts in.
    pub const fn period(&self) -> Period {
        Period::from_hour(self.start_hour)
    }
}

fn clock_ranges(text: &str) -> impl Iterator<Item = TimeRange> + '_ {
    CLOCK_RANGE.captures_iter(text).filter_map(|caps| {
        let whole = caps.get(0)?;
        let sh: u32 = caps[1].parse().ok()?;
        let sm: u32 = caps[2].parse().ok()?;
        let eh: u32 = caps[3].parse().ok()?;
        let em: u32 = caps[4].parse().ok()?;
        if sh > 23 || eh > 24 || sm > 59 || em > 59 {
            return None;
        }
        Some(TimeRange {
            start: whole.start(),
            end: whole.end(),
            start_hour: sh,
            display: format!("{sh:02}:{sm:02}-{eh:02}:{em:02}"),
        })
    })
}

fn hour_ranges(text: &str) -> impl Iterator<Item = TimeRange> + '_ {
    HOUR_RANGE.captures_iter(text).filter_map(|caps| {
        let whole = caps.get(0)?;
        let sh: u32 = caps[1].parse().ok()?;
        let eh: u32 = caps[2].parse().ok()?;
        if sh > 23 || eh > 24 {
            return None;
        }
        Some(TimeRange {
            start: whole.start(),
            end: whole.end(),
            start_hour: sh,
            display: format!("{sh:02}:00-{eh:02}:00"),
        })
    })
}

/// Finds the first valid `HH:MM-HH:MM`, `HH:MM~HH:MM` or `H点-H点` token.
///
/// # Examples
///
/// ```
/// use itinparse::normalizer::find_time_range;
///
/// let range = find_time_range("14点-17点 逛南锣鼓巷").unwrap();
/// assert_eq!(range.display, "14:00-17:00");
/// assert_eq!(range.start, 0);
/// ```
pub fn find_time_range(text: &str) -> Option<TimeRange> {
    let clock = clock_ranges(text).next();
    let hour = hour_ranges(text).next();
    match (clock, hour) {
        (Some(c), Some(h)) => Some(if h.start < c.start { h } else { c }),
        (c, h) => c.or(h),
    }
}

/// Canonicalises a display time for `period`.
///
/// Ranges are zero-padded to `HH:MM-HH:MM`; a lone start time becomes a
/// three-hour range; anything else falls back to the period default.
pub fn normalize_time(time: &str, period: Period) -> String {
    if let Some(range) = find_time_range(time) {
        return range.display;
    }
    let start = START_TIME.captures(time).and_then(|caps| {
        let h: u32 = caps[1].parse().ok()?;
        let m: u32 = caps[2].parse().ok()?;
        (h <= 23 && m <= 59).then_some((h, m))
    });
    match start {
        Some((h, m)) => format!("{h:02}:{m:02}-{:02}:{m:02}", (h + 3).min(23)),
        None => period.default_time_range().to_string(),
    }
}
