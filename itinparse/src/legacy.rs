//! Adapters to the shapes older renderers still consume.

use serde::{Deserialize, Serialize};

use crate::{
    context::ParseContext,
    model::DayPlan,
    normalizer::{extract_day_title, split_days},
};

/// Completion percentage shown by older renderers for every day.
pub const LEGACY_PROGRESS: u8 = 80;

/// `{day, title, content}` entry of the flat legacy timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyDay {
    pub day: u32,
    pub title: String,
    pub content: String,
}

/// Day card shape with a flattened activity list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyDayActivity {
    pub day: u32,
    pub title: String,
    pub date: String,
    pub weather: String,
    pub temperature: String,
    pub location: String,
    pub cost: u32,
    pub progress: u8,
    pub tags: Vec<String>,
    pub timeline: Vec<LegacyTimelineItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyTimelineItem {
    pub time: String,
    pub period: String,
    pub title: String,
    pub description: String,
    pub icon: String,
    pub cost: u32,
    pub duration: String,
    /// CSS gradient classes for the period.
    pub color: String,
}

/// Renders day plans as `{day, title, content}`.
///
/// `content` has one `【label】time` line per segment, each followed by a
/// `- title：description` line per activity. The output depends only on
/// the plans, so the same plans always render the same text.
///
/// # Examples
///
/// ```
/// use itinparse::{legacy::to_legacy_days, parse_timeline, ParseContext};
///
/// let result = parse_timeline("**上午** 参观故宫", &ParseContext::new("北京", 1));
/// let days = to_legacy_days(result.data());
/// assert!(days[0].content.starts_with("【上午】09:00-12:00\n- "));
/// ```
pub fn to_legacy_days(days: &[DayPlan]) -> Vec<LegacyDay> {
    days.iter()
        .map(|plan| LegacyDay {
            day: plan.day,
            title: plan.title.clone(),
            content: legacy_content(plan),
        })
        .collect()
}

fn legacy_content(plan: &DayPlan) -> String {
    let mut lines = Vec::new();
    for segment in &plan.segments {
        lines.push(format!("【{}】{}", segment.period.label(), segment.time));
        for activity in &segment.activities {
            if activity.description.is_empty() || activity.description == activity.title {
                lines.push(format!("- {}", activity.title));
            } else {
                lines.push(format!("- {}：{}", activity.title, activity.description));
            }
        }
    }
    lines.join("\n")
}

/// The pre-orchestrator path: split the raw text into days and keep each
/// chunk verbatim as content.
pub fn legacy_days_from_text(raw: &str, ctx: &ParseContext) -> Vec<LegacyDay> {
    let split = split_days(raw.trim(), ctx.total_days);
    split
        .chunks
        .iter()
        .enumerate()
        .map(|(idx, chunk)| {
            let day = u32::try_from(idx + 1).unwrap_or(u32::MAX);
            LegacyDay {
                day,
                title: extract_day_title(chunk, &format!("第{day}天")),
                content: chunk.clone(),
            }
        })
        .collect()
}

/// Flattens day plans into day cards with one timeline item per activity.
pub fn to_legacy_activities(days: &[DayPlan]) -> Vec<LegacyDayActivity> {
    days.iter()
        .map(|plan| LegacyDayActivity {
            day: plan.day,
            title: plan.title.clone(),
            date: plan.date.clone(),
            weather: plan.weather.condition.clone(),
            temperature: plan.weather.temperature.clone(),
            location: plan.location.clone(),
            cost: plan.total_cost,
            progress: LEGACY_PROGRESS,
            tags: plan.tags.iter().cloned().collect(),
            timeline: plan
                .segments
                .iter()
                .flat_map(|segment| {
                    segment.activities.iter().map(move |activity| LegacyTimelineItem {
                        time: segment.time.clone(),
                        period: segment.period.as_str().to_string(),
                        title: activity.title.clone(),
                        description: activity.description.clone(),
                        icon: activity.icon.clone(),
                        cost: activity.cost,
                        duration: activity.duration.clone(),
                        color: segment.period.legacy_color().to_string(),
                    })
                })
                .collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{
        model::{Activity, Period, Segment},
        normalizer::build_day_plan,
    };

    fn activity(title: &str, description: &str, cost: u32) -> Activity {
        Activity {
            title: title.to_string(),
            description: description.to_string(),
            cost,
            duration: "约2小时".to_string(),
            tips: Vec::new(),
            icon: "🏛️".to_string(),
        }
    }

    fn plan() -> DayPlan {
        let mut plan = build_day_plan(
            1,
            "故宫一日",
            vec![
                Segment::new(Period::Morning, vec![activity("故宫", "参观故宫，门票60元", 60)]),
                Segment::new(Period::Evening, vec![activity("烤鸭", "烤鸭", 120)]),
            ],
            &ParseContext::new("北京", 1),
        );
        plan.recompute_total_cost();
        plan
    }

    #[test]
    fn test_legacy_content_layout() {
        let days = to_legacy_days(&[plan()]);
        assert_eq!(days[0].title, "故宫一日");
        assert_eq!(
            days[0].content,
            "【上午】09:00-12:00\n- 故宫：参观故宫，门票60元\n【傍晚】18:00-21:00\n- 烤鸭"
        );
    }

    #[test]
    fn test_legacy_activities_flatten_segments() {
        let cards = to_legacy_activities(&[plan()]);
        assert_eq!(cards[0].cost, 180);
        assert_eq!(cards[0].progress, LEGACY_PROGRESS);
        let periods: Vec<&str> = cards[0].timeline.iter().map(|i| i.period.as_str()).collect();
        assert_eq!(periods, vec!["morning", "evening"]);
        assert_eq!(cards[0].timeline[0].color, Period::Morning.legacy_color());
    }

    #[test]
    fn test_days_from_text_keep_chunks() {
        let days = legacy_days_from_text("Day 1: 故宫\n上午参观\nDay 2: 长城", &ParseContext::new("北京", 2));
        assert_eq!(days.len(), 2);
        assert_eq!(days[0].title, "故宫");
        assert_eq!(days[0].content, "Day 1: 故宫\n上午参观");
        assert_eq!(days[1].day, 2);
    }
}
