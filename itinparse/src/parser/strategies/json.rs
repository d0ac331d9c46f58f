//! Structured JSON strategy.

use std::{collections::BTreeSet, str::FromStr};

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

use super::{StrategyOutput, TimelineStrategy};
use crate::{
    context::ParseContext,
    error::{Result, TimelineError},
    model::{Activity, DayPlan, Period, Segment, Weather},
    normalizer::{
        activity::MAX_ACTIVITY_TITLE_CHARS, build_activity, build_day_plan, estimate_cost,
        extract_activities, extract_activity_title, extract_cost, extract_duration, extract_tips,
        fallback_segment, find_time_range, icon_for, infer_period, normalize_time,
        parse_period_label, sanitize_title, truncate_chars, weather_for_day,
    },
};

const NAME: &str = "json";

static CODE_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```(\w*)[ \t]*\n(.*?)```").expect("Invalid code block regex"));

static DAY_KEY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:day[\s_-]*(\d+)|第\s*(\d+)\s*天)$").expect("Invalid day key regex")
});

// Keys under which models nest the day list.
const CONTAINER_KEYS: &[&str] = &[
    "days",
    "itinerary",
    "timeline",
    "dailyPlans",
    "daily_plans",
    "plan",
    "schedule",
];

const TITLE_KEYS: &[&str] = &["title", "name", "activity", "place"];
const DESCRIPTION_KEYS: &[&str] = &["description", "desc", "details", "content"];
const COST_KEYS: &[&str] = &["cost", "price", "fee"];

/// Strategy for model output that is (or contains) JSON.
///
/// Accepts the typed day-plan shape directly and repairs the common
/// deviations: a bare array of days, `day1` / `第1天` keys, days with
/// `morning` / `afternoon` fields instead of segments, activities given as
/// plain strings, costs given as strings. The JSON may be wrapped in a
/// code fence or surrounded by prose.
///
/// # Examples
///
/// ```
/// use itinparse::parser::strategies::{JsonStrategy, TimelineStrategy};
/// use itinparse::ParseContext;
///
/// let input = r#"{"days": [{"day": 1, "morning": ["参观故宫，门票60元"]}]}"#;
/// let strategy = JsonStrategy::new();
/// assert!(strategy.can_handle(input));
///
/// let output = strategy.try_parse(input, &ParseContext::new("北京", 1)).unwrap().unwrap();
/// assert_eq!(output.days[0].total_cost, 60);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonStrategy;

impl JsonStrategy {
    /// Maximum input size in bytes this strategy will look at.
    const MAX_INPUT_SIZE: usize = 1024 * 1024;

    /// Creates a new JSON strategy.
    #[inline]
    pub fn new() -> Self {
        Self
    }

    /// Finds the first JSON object or array in the input.
    ///
    /// Tries the whole input, then fenced code blocks, then the first
    /// balanced `{...}` / `[...]` span.
    fn extract_value(&self, input: &str) -> Result<Value> {
        let trimmed = input.trim();
        let mut candidates = vec![trimmed];
        candidates.extend(
            CODE_BLOCK
                .captures_iter(trimmed)
                .filter(|caps| is_json_lang(&caps[1]))
                .filter_map(|caps| caps.get(2))
                .map(|m| m.as_str().trim()),
        );
        candidates.extend(balanced_spans(trimmed));

        let mut last_error = None;
        for candidate in candidates {
            match parse_lenient(candidate) {
                Ok(value) if value.is_object() || value.is_array() => return Ok(value),
                Ok(_) => {}
                Err(err) => last_error = Some(err),
            }
        }

        Err(match last_error {
            Some(err) => TimelineError::Json(err),
            None => TimelineError::strategy(NAME, "no JSON object or array found"),
        })
    }

    fn normalize_days(
        &self,
        raw_days: Vec<Value>,
        ctx: &ParseContext,
    ) -> Result<Option<StrategyOutput>> {
        // Already the typed shape: keep it as is, so serialising and
        // re-parsing is lossless.
        if let Ok(mut days) = serde_json::from_value::<Vec<DayPlan>>(Value::Array(raw_days.clone()))
        {
            if days.iter().all(|d| d.activity_count() > 0) {
                for day in &mut days {
                    day.recompute_total_cost();
                }
                return Ok(Some(StrategyOutput::new(days)));
            }
        }

        let mut warnings = Vec::new();
        let mut parsed = Vec::with_capacity(raw_days.len());
        for (idx, raw) in raw_days.iter().enumerate() {
            match raw.as_object() {
                Some(map) => {
                    let segments = segments_from_day(map, &mut warnings);
                    parsed.push((idx, map, segments));
                }
                None => warnings.push(format!("day entry {} is not an object, skipped", idx + 1)),
            }
        }

        if parsed.iter().all(|(_, _, segments)| segments.is_empty()) {
            return Err(TimelineError::strategy(NAME, "JSON contains no activities"));
        }

        let days = parsed
            .into_iter()
            .map(|(idx, map, segments)| day_from_map(idx, map, segments, ctx, &mut warnings))
            .collect();
        Ok(Some(StrategyOutput::new(days).with_warnings(warnings)))
    }
}

impl TimelineStrategy for JsonStrategy {
    #[inline]
    fn name(&self) -> &'static str {
        NAME
    }

    #[inline]
    fn priority(&self) -> u8 {
        100
    }

    fn can_handle(&self, input: &str) -> bool {
        if input.len() > Self::MAX_INPUT_SIZE {
            return false;
        }
        let trimmed = input.trim_start();
        trimmed.starts_with('{')
            || trimmed.starts_with('[')
            || input.contains("```json")
            || (input.contains('{') && (input.contains("\"day") || input.contains("\"segments\"")))
    }

    fn try_parse(&self, input: &str, ctx: &ParseContext) -> Result<Option<StrategyOutput>> {
        let value = self.extract_value(input)?;
        match locate_days(value) {
            Some(raw_days) => self.normalize_days(raw_days, ctx),
            None => Ok(None),
        }
    }
}

#[inline]
fn is_json_lang(lang: &str) -> bool {
    lang.is_empty() || matches!(lang.to_lowercase().as_str(), "json" | "jsonc" | "json5")
}

fn parse_lenient(candidate: &str) -> serde_json::Result<Value> {
    serde_json::from_str(candidate).or_else(|err| {
        let fixed = remove_trailing_commas(candidate);
        if fixed == candidate {
            Err(err)
        } else {
            serde_json::from_str(&fixed)
        }
    })
}

/// Removes commas directly before a closing brace or bracket, outside
/// string literals.
fn remove_trailing_commas(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    let mut in_string = false;
    let mut escape_next = false;

    while let Some(c) = chars.next() {
        if in_string {
            if escape_next {
                escape_next = false;
            } else if c == '\\' {
                escape_next = true;
            } else if c == '"' {
                in_string = false;
            }
            result.push(c);
            continue;
        }

        match c {
            '"' => {
                in_string = true;
                result.push(c);
            }
            ',' => {
                let mut lookahead = chars.clone();
                let next = lookahead.find(|ch| !ch.is_whitespace());
                if !matches!(next, Some('}') | Some(']')) {
                    result.push(c);
                }
            }
            _ => result.push(c),
        }
    }

    result
}

/// Balanced spans starting at the first `{` and the first `[`, earliest
/// first.
fn balanced_spans(input: &str) -> Vec<&str> {
    let mut starts: Vec<(usize, char, char)> = [('{', '}'), ('[', ']')]
        .into_iter()
        .filter_map(|(open, close)| input.find(open).map(|idx| (idx, open, close)))
        .collect();
    starts.sort_by_key(|(idx, _, _)| *idx);

    starts
        .into_iter()
        .filter_map(|(start, open, close)| {
            find_matching_close(input, start, open, close).map(|end| &input[start..=end])
        })
        .collect()
}

/// Byte index of the bracket closing the one at `start`.
fn find_matching_close(input: &str, start: usize, open: char, close: char) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape_next = false;

    for (idx, ch) in input[start..].char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }

        match ch {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            _ if ch == open && !in_string => depth += 1,
            _ if ch == close && !in_string => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(start + idx);
                }
            }
            _ => {}
        }
    }

    None // Unbalanced
}

/// Finds the list of day objects in whatever shape the model produced.
fn locate_days(value: Value) -> Option<Vec<Value>> {
    match value {
        Value::Array(items) => {
            if items.is_empty() || !items.iter().all(Value::is_object) {
                return None;
            }
            let any_day = items
                .iter()
                .filter_map(Value::as_object)
                .any(looks_like_day);
            if any_day {
                Some(items)
            } else {
                // A flat list of activities is one day.
                let mut day = Map::new();
                day.insert("activities".to_string(), Value::Array(items));
                Some(vec![Value::Object(day)])
            }
        }
        Value::Object(mut map) => {
            for key in CONTAINER_KEYS {
                if let Some(days) = map.remove(*key).and_then(locate_days) {
                    return Some(days);
                }
            }
            let keyed = day_keyed(&map);
            if !keyed.is_empty() {
                return Some(keyed);
            }
            looks_like_day(&map).then(|| vec![Value::Object(map)])
        }
        _ => None,
    }
}

fn looks_like_day(map: &Map<String, Value>) -> bool {
    map.contains_key("segments")
        || map.contains_key("day")
        || map.contains_key("activities")
        || map.keys().any(|k| period_from_key(k).is_some())
}

/// `{"day1": ..., "day2": ...}` / `{"第1天": ...}` objects, in day order.
fn day_keyed(map: &Map<String, Value>) -> Vec<Value> {
    let mut keyed: Vec<(u64, Value)> = map
        .iter()
        .filter_map(|(key, value)| {
            let caps = DAY_KEY.captures(key.trim())?;
            let number = caps
                .get(1)
                .or_else(|| caps.get(2))?
                .as_str()
                .parse::<u64>()
                .ok()?;
            let day = match value {
                Value::Object(inner) => {
                    let mut inner = inner.clone();
                    inner.entry("day").or_insert(Value::from(number));
                    inner
                }
                Value::Array(_) | Value::String(_) => {
                    let activities = match value {
                        Value::String(_) => Value::Array(vec![value.clone()]),
                        _ => value.clone(),
                    };
                    let mut inner = Map::new();
                    inner.insert("day".to_string(), Value::from(number));
                    inner.insert("activities".to_string(), activities);
                    inner
                }
                _ => return None,
            };
            Some((number, Value::Object(day)))
        })
        .collect();
    keyed.sort_by_key(|(number, _)| *number);
    keyed.into_iter().map(|(_, day)| day).collect()
}

fn period_from_key(key: &str) -> Option<Period> {
    Period::from_str(key)
        .ok()
        .or_else(|| parse_period_label(key))
}

/// Resolves a period label, warning when it has to fall back to morning.
fn resolve_period(label: &str, warnings: &mut Vec<String>) -> Period {
    period_from_key(label)
        .or_else(|| infer_period(label))
        .unwrap_or_else(|| {
            warnings.push(format!(
                "unrecognised period label '{label}', defaulted to morning"
            ));
            Period::Morning
        })
}

fn str_field<'a>(map: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .filter_map(|k| map.get(*k).and_then(Value::as_str))
        .map(str::trim)
        .find(|s| !s.is_empty())
}

fn day_number(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => {
            let digits: String = s.chars().filter(char::is_ascii_digit).collect();
            digits.parse().ok()
        }
        _ => None,
    }
}

fn cost_from_value(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .map(|c| u32::try_from(c).unwrap_or(u32::MAX))
            .or_else(|| n.as_f64().map(|c| c.max(0.0).round().min(f64::from(u32::MAX)) as u32)),
        Value::String(s) => extract_cost(s).or_else(|| s.trim().parse().ok()),
        _ => None,
    }
}

fn tips_from_value(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        Value::String(s) if !s.trim().is_empty() => vec![s.trim().to_string()],
        _ => Vec::new(),
    }
}

fn activity_from_value(value: &Value) -> Option<Activity> {
    match value {
        Value::String(s) => build_activity(s),
        Value::Object(map) => {
            let title = str_field(map, TITLE_KEYS);
            let description = str_field(map, DESCRIPTION_KEYS);
            let text = description.or(title)?;

            let title = title
                .map(|t| truncate_chars(&sanitize_title(t), MAX_ACTIVITY_TITLE_CHARS))
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| extract_activity_title(text));
            let cost = COST_KEYS
                .iter()
                .find_map(|k| map.get(*k).and_then(cost_from_value))
                .or_else(|| extract_cost(text))
                .unwrap_or_else(|| estimate_cost(text));
            let duration = str_field(map, &["duration"])
                .map(str::to_string)
                .unwrap_or_else(|| extract_duration(text));
            let tips = match map.get("tips") {
                Some(tips) => tips_from_value(tips),
                None => extract_tips(text),
            };
            let icon = str_field(map, &["icon"]).unwrap_or_else(|| icon_for(text));

            Some(Activity {
                title,
                description: text.to_string(),
                cost,
                duration,
                tips,
                icon: icon.to_string(),
            })
        }
        _ => None,
    }
}

fn activities_from_value(value: &Value) -> Vec<Activity> {
    match value {
        Value::Array(items) => items.iter().filter_map(activity_from_value).collect(),
        Value::String(s) => extract_activities(s),
        Value::Object(_) => activity_from_value(value).into_iter().collect(),
        _ => Vec::new(),
    }
}

fn segment_from_map(
    map: &Map<String, Value>,
    period_hint: Option<Period>,
    warnings: &mut Vec<String>,
) -> Option<Segment> {
    let time = str_field(map, &["time", "timeRange"]);
    let period = match str_field(map, &["period"]) {
        Some(label) => resolve_period(label, warnings),
        None => period_hint
            .or_else(|| time.and_then(find_time_range).map(|r| r.period()))
            .unwrap_or(Period::Morning),
    };

    let activities = match map.get("activities") {
        Some(value) => activities_from_value(value),
        None => activity_from_value(&Value::Object(map.clone()))
            .into_iter()
            .collect(),
    };
    if activities.is_empty() {
        return None;
    }

    let mut segment = Segment::new(period, activities);
    if let Some(time) = time {
        segment.time = normalize_time(time, period);
    }
    Some(segment)
}

/// Groups a flat activity list into segments by each item's own time or
/// period, carrying the previous period forward.
fn segments_from_flat(items: &[Value], warnings: &mut Vec<String>) -> Vec<Segment> {
    let mut segments: Vec<Segment> = Vec::new();
    for item in items {
        let map = item.as_object();
        let time = map.and_then(|m| str_field(m, &["time", "timeRange"]));
        let hinted = match map.and_then(|m| str_field(m, &["period"])) {
            Some(label) => Some(resolve_period(label, warnings)),
            None => time.and_then(find_time_range).map(|r| r.period()),
        };
        let Some(activity) = activity_from_value(item) else {
            continue;
        };
        let period = hinted
            .or_else(|| segments.last().map(|s| s.period))
            .unwrap_or(Period::Morning);

        match segments.last_mut() {
            Some(last) if last.period == period => last.activities.push(activity),
            _ => {
                let mut segment = Segment::new(period, vec![activity]);
                if let Some(time) = time {
                    segment.time = normalize_time(time, period);
                }
                segments.push(segment);
            }
        }
    }
    segments
}

fn segments_from_day(map: &Map<String, Value>, warnings: &mut Vec<String>) -> Vec<Segment> {
    if let Some(Value::Array(raw_segments)) = map.get("segments") {
        return raw_segments
            .iter()
            .filter_map(Value::as_object)
            .filter_map(|s| segment_from_map(s, None, warnings))
            .collect();
    }

    let mut by_period: Vec<Segment> = map
        .iter()
        .filter_map(|(key, value)| {
            let period = period_from_key(key)?;
            match value {
                Value::Object(inner) => segment_from_map(inner, Some(period), warnings),
                other => {
                    let activities = activities_from_value(other);
                    (!activities.is_empty()).then(|| Segment::new(period, activities))
                }
            }
        })
        .collect();
    if !by_period.is_empty() {
        by_period.sort_by_key(|s| s.period);
        return by_period;
    }

    match map.get("activities") {
        Some(Value::Array(items)) => segments_from_flat(items, warnings),
        Some(other) => {
            let activities = activities_from_value(other);
            if activities.is_empty() {
                Vec::new()
            } else {
                vec![Segment::new(Period::Morning, activities)]
            }
        }
        None => Vec::new(),
    }
}

fn weather_from_value(value: &Value, day: u32) -> Weather {
    let mut weather = weather_for_day(day);
    match value {
        Value::Object(map) => {
            if let Some(condition) = str_field(map, &["condition"]) {
                weather.condition = condition.to_string();
            }
            if let Some(temperature) = str_field(map, &["temperature"]) {
                weather.temperature = temperature.to_string();
            }
            if let Some(icon) = str_field(map, &["icon"]) {
                weather.icon = icon.to_string();
            }
        }
        Value::String(s) if !s.trim().is_empty() => weather.condition = s.trim().to_string(),
        _ => {}
    }
    weather
}

fn day_from_map(
    idx: usize,
    map: &Map<String, Value>,
    mut segments: Vec<Segment>,
    ctx: &ParseContext,
    warnings: &mut Vec<String>,
) -> DayPlan {
    let day = map
        .get("day")
        .and_then(day_number)
        .unwrap_or_else(|| u32::try_from(idx + 1).unwrap_or(u32::MAX));
    if segments.is_empty() {
        warnings.push(format!("day {day}: no activities in JSON, kept as free time"));
        segments.push(fallback_segment("", ctx));
    }

    let title = str_field(map, &["title", "theme", "name"])
        .map(sanitize_title)
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| format!("第{day}天"));

    let mut plan = build_day_plan(day, title, segments, ctx);
    if let Some(date) = str_field(map, &["date"]) {
        plan.date = date.to_string();
    }
    if let Some(location) = str_field(map, &["location", "city", "destination"]) {
        plan.location = location.to_string();
    }
    if let Some(weather) = map.get("weather") {
        plan.weather = weather_from_value(weather, day);
    }
    if let Some(Value::Array(tags)) = map.get("tags") {
        let tags: BTreeSet<String> = tags
            .iter()
            .filter_map(Value::as_str)
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();
        if !tags.is_empty() {
            plan.tags = tags;
        }
    }
    plan
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn ctx() -> ParseContext {
        ParseContext::new("北京", 2)
    }

    fn parse(input: &str) -> StrategyOutput {
        JsonStrategy::new()
            .try_parse(input, &ctx())
            .unwrap()
            .expect("days expected")
    }

    #[test]
    fn test_segments_shape() {
        let input = r#"{"days": [{"day": 1, "title": "故宫", "segments": [
            {"period": "morning", "time": "9:00-12:00",
             "activities": [{"title": "参观故宫", "description": "参观故宫博物院", "cost": 60}]}
        ]}]}"#;
        let output = parse(input);
        let day = &output.days[0];
        assert_eq!(day.title, "故宫");
        assert_eq!(day.segments[0].time, "09:00-12:00");
        assert_eq!(day.segments[0].activities[0].cost, 60);
        assert_eq!(day.total_cost, 60);
        assert!(output.warnings.is_empty());
    }

    #[test]
    fn test_fenced_with_trailing_comma() {
        let input = "好的，行程如下：\n```json\n{\"days\": [{\"day\": 1, \"morning\": [\"参观故宫\",],}]}\n```\n祝旅途愉快";
        let output = parse(input);
        assert_eq!(output.days.len(), 1);
        assert_eq!(output.days[0].segments[0].period, Period::Morning);
    }

    #[test]
    fn test_bare_array_of_days() {
        let input = r#"[{"day": 1, "afternoon": "游览颐和园"}, {"day": 2, "evening": ["看京剧"]}]"#;
        let output = parse(input);
        assert_eq!(output.days.len(), 2);
        assert_eq!(output.days[1].segments[0].period, Period::Evening);
    }

    #[test]
    fn test_day_keyed_object() {
        let input = r#"{"day2": ["爬长城"], "day1": {"morning": ["参观天坛"]}}"#;
        let output = parse(input);
        let numbers: Vec<u32> = output.days.iter().map(|d| d.day).collect();
        assert_eq!(numbers, vec![1, 2]);
        assert_eq!(output.days[1].segments[0].activities[0].title, "爬长城");
    }

    #[test]
    fn test_period_fields_are_ordered() {
        let input = r#"{"day": 1, "evening": ["吃烤鸭"], "morning": ["逛故宫"], "afternoon": ["游景山"]}"#;
        let periods: Vec<Period> = parse(input).days[0]
            .segments
            .iter()
            .map(|s| s.period)
            .collect();
        assert_eq!(periods, vec![Period::Morning, Period::Afternoon, Period::Evening]);
    }

    #[test]
    fn test_string_cost_and_unknown_period() {
        let input = r#"{"days": [{"segments": [
            {"period": "全天", "activities": [{"name": "环湖骑行", "price": "¥80"}]}
        ]}]}"#;
        let output = parse(input);
        assert_eq!(output.days[0].segments[0].period, Period::Morning);
        assert_eq!(output.days[0].total_cost, 80);
        assert_eq!(output.warnings.len(), 1);
        assert!(output.warnings[0].contains("全天"));
    }

    #[test]
    fn test_no_activities_is_an_error() {
        let result = JsonStrategy::new().try_parse(r#"{"days": [{"day": 1}]}"#, &ctx());
        assert!(result.is_err());
    }

    #[test]
    fn test_unrelated_json_is_declined() {
        let result = JsonStrategy::new()
            .try_parse(r#"{"status": "ok"}"#, &ctx())
            .unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        let result = JsonStrategy::new().try_parse("{\"days\": [", &ctx());
        assert!(result.is_err());
    }

    #[test]
    fn test_typed_shape_round_trips() {
        let first = parse(r#"{"days": [{"day": 1, "morning": ["参观故宫（需预约），门票60元"]}]}"#);
        let serialized = serde_json::to_string(&first.days).unwrap();
        let second = parse(&serialized);
        assert_eq!(second.days, first.days);
    }

    #[test]
    fn test_can_handle() {
        let strategy = JsonStrategy::new();
        assert!(strategy.can_handle("  {\"days\": []}"));
        assert!(strategy.can_handle("结果：{\"day\": 1}"));
        assert!(!strategy.can_handle("**上午** 参观故宫"));
    }

    #[test]
    fn test_remove_trailing_commas_respects_strings() {
        assert_eq!(remove_trailing_commas(r#"{"a": "x,}", }"#), r#"{"a": "x,}" }"#);
    }
}
