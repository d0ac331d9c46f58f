//! Pure helpers shared by every parsing strategy.
//!
//! Nothing in here keeps state: each function maps text (plus, for day
//! assembly, the [`ParseContext`](crate::ParseContext)) onto typed values.

pub mod activity;
pub mod days;
pub mod period;
pub mod text;

pub use activity::{
    build_activity, estimate_cost, extract_activities, extract_activity_title, extract_cost,
    extract_duration, extract_tips, icon_for, strip_list_marker,
};
pub use days::{
    build_day_plan, extract_tags, fallback_day_plans, fallback_segment, format_day_date,
    free_exploration_activity, split_days, weather_for_day, DaySplit, SplitMethod,
};
pub use period::{
    find_time_range, infer_period, normalize_period, normalize_time, parse_period_label, TimeRange,
};
pub use text::{clean_text, extract_day_title, is_sub_heading, sanitize_title, truncate_chars};

/// 32-bit rolling hash `h = h * 31 + unit` over the UTF-16 code units of
/// `input`, returned as an absolute value.
///
/// The value is stable across processes and platforms, so it can drive
/// sticky rollout buckets and deterministic cost estimates.
///
/// # Examples
///
/// ```
/// use itinparse::normalizer::sticky_hash;
///
/// assert_eq!(sticky_hash(""), 0);
/// assert_eq!(sticky_hash("abc"), 96354);
/// ```
pub fn sticky_hash(input: &str) -> u32 {
    input
        .encode_utf16()
        .fold(0i32, |hash, unit| {
            hash.wrapping_shl(5)
                .wrapping_sub(hash)
                .wrapping_add(i32::from(unit))
        })
        .unsigned_abs()
}
