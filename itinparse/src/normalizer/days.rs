//! Day splitting and day-level assembly.

use std::collections::BTreeSet;

use chrono::{Datelike, Days, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;

use super::{activity::extract_activities, text::extract_day_title};
use crate::{
    context::ParseContext,
    model::{Activity, DayPlan, Period, Segment, Weather},
};

/// Start of a `Day N` / `第N天` line, optionally behind heading, bullet or
/// bold markers. Ranges such as `Day 1-2` and `第3-4天` also match.
pub static DAY_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?im)^[ \t>*#\-]*(?:day[ \t]*\d+(?:[ \t]*[-–~][ \t]*\d+)?|第[ \t]*[0-9一二三四五六七八九十]+(?:[ \t]*[-–~至到][ \t]*[0-9一二三四五六七八九十]+)?[ \t]*天)(?:[ \t*：:\-–—]|$)",
    )
    .expect("Invalid day marker regex")
});

static DAY_RANGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d+)[ \t]*[-–~至到][ \t]*(\d+)").expect("Invalid day range regex")
});

static PARAGRAPH_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n[ \t]*\n").expect("Invalid paragraph break regex"));

/// Longest `Day a-b` range that is expanded into separate days.
const MAX_RANGE_DAYS: u32 = 14;

const WEATHER_CONDITIONS: [&str; 3] = ["晴朗", "多云", "阴天"];
const WEATHER_TEMPERATURES: [&str; 4] = ["22°C", "24°C", "26°C", "25°C"];
const WEATHER_ICON: &str = "☀️";
const WEEKDAYS: [&str; 7] = ["一", "二", "三", "四", "五", "六", "日"];

const DEFAULT_TAG: &str = "行程安排";
const TAG_RULES: &[(&[&str], &str)] = &[
    (&["文化", "历史", "古迹", "博物馆"], "文化古迹"),
    (&["美食", "餐", "小吃"], "特色美食"),
    (&["自然", "公园", "山", "湖"], "自然风光"),
    (&["购物", "商场"], "购物体验"),
];

/// Display time of a segment synthesised for an unrecognised chunk.
pub const FALLBACK_SEGMENT_TIME: &str = "09:00-17:00";

const FULL_DAY_TIME: &str = "09:00-18:00";
const FULL_DAY_COST: u32 = 300;

/// How a body was cut into days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitMethod {
    /// At explicit `Day N` / `第N天` markers.
    Markers,
    /// Equal character ranges; a guess.
    EqualLength,
}

/// Result of [`split_days`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaySplit {
    pub chunks: Vec<String>,
    pub method: SplitMethod,
    /// Number of day marker lines found in the body. A range line such as
    /// `Day 1-2` counts once.
    pub marker_count: usize,
}

impl DaySplit {
    /// Whether day boundaries were guessed rather than read from the text.
    pub fn is_low_confidence(&self) -> bool {
        self.method == SplitMethod::EqualLength && self.chunks.len() > 1
    }
}

/// Cuts `text` into per-day chunks.
///
/// A range marker (`Day 1-2`, `第3-4天`) stands for every day it covers: its
/// section is shared out by paragraph, or by characters when there are
/// fewer paragraphs than days, and each piece gets a `Day N: <title>`
/// heading. When the markers cover at least `total_days` days the text is
/// cut there and only the first `total_days` chunks are kept (anything
/// before the first marker is dropped). Otherwise it is cut into
/// `total_days` equal character ranges, which may split mid-sentence. A
/// `total_days` of zero means "as many days as the markers cover", at
/// least one.
///
/// # Examples
///
/// ```
/// use itinparse::normalizer::{split_days, SplitMethod};
///
/// let split = split_days("Day 1: 故宫\nDay 2: 长城", 2);
/// assert_eq!(split.method, SplitMethod::Markers);
/// assert_eq!(split.chunks, vec!["Day 1: 故宫", "Day 2: 长城"]);
///
/// let ranged = split_days("Day 1-2: 市区\n故宫\n\n天坛", 0);
/// assert_eq!(ranged.chunks, vec!["Day 1: 市区\n故宫", "Day 2: 市区\n天坛"]);
///
/// let guessed = split_days("上午故宫下午景山", 2);
/// assert_eq!(guessed.chunks, vec!["上午故宫", "下午景山"]);
/// assert!(guessed.is_low_confidence());
/// ```
pub fn split_days(text: &str, total_days: usize) -> DaySplit {
    let markers: Vec<regex::Match<'_>> = DAY_MARKER.find_iter(text).collect();
    let mut marked = Vec::new();
    for (i, marker) in markers.iter().enumerate() {
        let end = markers.get(i + 1).map_or(text.len(), |next| next.start());
        let section = text[marker.start()..end].trim();
        match day_range(marker.as_str()) {
            Some((first, last)) => marked.extend(expand_range(section, first, last)),
            None => marked.push(section.to_string()),
        }
    }

    let target = if total_days == 0 {
        marked.len().max(1)
    } else {
        total_days
    };

    if !marked.is_empty() && marked.len() >= target {
        marked.truncate(target);
        return DaySplit {
            chunks: marked,
            method: SplitMethod::Markers,
            marker_count: markers.len(),
        };
    }

    DaySplit {
        chunks: split_chars(text, target, false),
        method: SplitMethod::EqualLength,
        marker_count: markers.len(),
    }
}

/// First and last day of a range marker, when it spans 2 to
/// [`MAX_RANGE_DAYS`] days.
fn day_range(marker: &str) -> Option<(u32, u32)> {
    let caps = DAY_RANGE.captures(marker)?;
    let first: u32 = caps[1].parse().ok()?;
    let last: u32 = caps[2].parse().ok()?;
    let span = last.checked_sub(first)?;
    (1..MAX_RANGE_DAYS).contains(&span).then_some((first, last))
}

fn expand_range(section: &str, first: u32, last: u32) -> Vec<String> {
    let (heading, body) = section.split_once('\n').unwrap_or((section, ""));
    let title = extract_day_title(heading, "");
    let count = (last - first + 1) as usize;
    let pieces = split_paragraphs(body, count).unwrap_or_else(|| split_chars(body, count, true));

    pieces
        .into_iter()
        .zip(first..=last)
        .map(|(piece, day)| {
            let heading = if title.is_empty() {
                format!("Day {day}")
            } else {
                format!("Day {day}: {title}")
            };
            if piece.is_empty() {
                heading
            } else {
                format!("{heading}\n{piece}")
            }
        })
        .collect()
}

/// `count` runs of consecutive paragraphs, or `None` when there are fewer
/// paragraphs than that.
fn split_paragraphs(body: &str, count: usize) -> Option<Vec<String>> {
    let paragraphs: Vec<&str> = PARAGRAPH_BREAK
        .split(body)
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();
    if paragraphs.len() < count {
        return None;
    }
    let total = paragraphs.len();
    Some(
        (0..count)
            .map(|i| paragraphs[i * total / count..(i + 1) * total / count].join("\n\n"))
            .collect(),
    )
}

/// Cuts `text` into `count` character ranges of near-equal length. With
/// `snap`, each range except the last ends at the last line break or `。`
/// in its final 30%, if there is one.
fn split_chars(text: &str, count: usize, snap: bool) -> Vec<String> {
    let chars: Vec<char> = text.trim().chars().collect();
    let mut pieces = Vec::with_capacity(count);
    let mut start = 0;
    for i in 0..count {
        let end = if snap && i + 1 < count {
            snapped_end(&chars, start, count - i)
        } else {
            (i + 1) * chars.len() / count
        };
        pieces.push(chars[start..end].iter().collect::<String>().trim().to_string());
        start = end;
    }
    pieces
}

fn snapped_end(chars: &[char], start: usize, remaining: usize) -> usize {
    let end = start + (chars.len() - start + remaining - 1) / remaining;
    let min_cut = start + (end - start) * 7 / 10;
    chars[min_cut..end]
        .iter()
        .rposition(|c| matches!(c, '\n' | '。'))
        .map_or(end, |cut| min_cut + cut + 1)
}

/// `M月D日 周X` for the given 1-based day, empty without a start date.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use itinparse::normalizer::format_day_date;
///
/// let start = NaiveDate::from_ymd_opt(2025, 5, 1);
/// assert_eq!(format_day_date(start, 3), "5月3日 周六");
/// assert_eq!(format_day_date(None, 3), "");
/// ```
pub fn format_day_date(start: Option<NaiveDate>, day: u32) -> String {
    let offset = Days::new(u64::from(day.saturating_sub(1)));
    start
        .and_then(|d| d.checked_add_days(offset))
        .map(|d| {
            let weekday = WEEKDAYS[d.weekday().num_days_from_monday() as usize];
            format!("{}月{}日 周{}", d.month(), d.day(), weekday)
        })
        .unwrap_or_default()
}

/// Placeholder weather for a day; the same day always gets the same value.
pub fn weather_for_day(day: u32) -> Weather {
    let day = day as usize;
    Weather {
        condition: WEATHER_CONDITIONS[day % WEATHER_CONDITIONS.len()].to_string(),
        temperature: WEATHER_TEMPERATURES[day % WEATHER_TEMPERATURES.len()].to_string(),
        icon: WEATHER_ICON.to_string(),
    }
}

/// Keyword tags from the day title and activity titles.
pub fn extract_tags<'a>(
    title: &str,
    activities: impl IntoIterator<Item = &'a Activity>,
) -> BTreeSet<String> {
    let mut haystack = title.to_string();
    for activity in activities {
        haystack.push(' ');
        haystack.push_str(&activity.title);
    }

    let mut tags: BTreeSet<String> = TAG_RULES
        .iter()
        .filter(|(keywords, _)| keywords.iter().any(|k| haystack.contains(k)))
        .map(|(_, tag)| tag.to_string())
        .collect();
    if tags.is_empty() {
        tags.insert(DEFAULT_TAG.to_string());
    }
    tags
}

/// Assembles a day from its segments, deriving date, weather, tags and
/// total cost.
pub fn build_day_plan(
    day: u32,
    title: impl Into<String>,
    segments: Vec<Segment>,
    ctx: &ParseContext,
) -> DayPlan {
    let title = title.into();
    let tags = extract_tags(&title, segments.iter().flat_map(|s| s.activities.iter()));
    let mut plan = DayPlan {
        day,
        date: format_day_date(ctx.start_date, day),
        location: ctx.display_destination().to_string(),
        weather: weather_for_day(day),
        total_cost: 0,
        title,
        segments,
        tags,
    };
    plan.recompute_total_cost();
    plan
}

/// Full-day free exploration placeholder for `destination`.
pub fn free_exploration_activity(destination: &str) -> Activity {
    Activity {
        title: format!("{destination}自由行"),
        description: format!(
            "自由探索{destination}\n• 根据个人兴趣安排行程\n• 发现意想不到的精彩"
        ),
        cost: FULL_DAY_COST,
        duration: "全天".to_string(),
        tips: vec!["保持行程灵活".to_string()],
        icon: "🗺️".to_string(),
    }
}

/// Segment for a chunk in which no period structure was recognised: its
/// lines as activities, or free exploration when it has none.
pub fn fallback_segment(chunk: &str, ctx: &ParseContext) -> Segment {
    let mut activities = extract_activities(chunk);
    if activities.is_empty() {
        activities.push(free_exploration_activity(ctx.display_destination()));
    }
    Segment {
        period: Period::Morning,
        time: FALLBACK_SEGMENT_TIME.to_string(),
        activities,
    }
}

/// The single emergency day returned when nothing could be parsed.
pub fn fallback_day_plans(ctx: &ParseContext) -> Vec<DayPlan> {
    let destination = ctx.display_destination();
    let segment = Segment {
        period: Period::Morning,
        time: FULL_DAY_TIME.to_string(),
        activities: vec![free_exploration_activity(destination)],
    };
    vec![build_day_plan(1, format!("{destination}自由行"), vec![segment], ctx)]
}
