//! Typed timeline produced by the parsers.

use std::{collections::BTreeSet, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Placeholder title used when no title can be extracted for an activity.
pub const UNTITLED_ACTIVITY: &str = "未命名活动";

/// Duration label used when the text does not say how long something takes.
pub const DEFAULT_DURATION: &str = "约2-3小时";

/// Canonical time-of-day bucket for a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    /// Roughly 09:00 to 12:00.
    Morning,
    /// Lunch time.
    Noon,
    /// Roughly 14:00 to 17:00.
    Afternoon,
    /// Dinner time.
    Evening,
    /// After dinner.
    Night,
}

impl Period {
    /// All periods in chronological order.
    pub const ALL: [Period; 5] = [
        Period::Morning,
        Period::Noon,
        Period::Afternoon,
        Period::Evening,
        Period::Night,
    ];

    /// Canonical lowercase name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Period::Morning => "morning",
            Period::Noon => "noon",
            Period::Afternoon => "afternoon",
            Period::Evening => "evening",
            Period::Night => "night",
        }
    }

    /// Chinese display label used by the rendering layer.
    pub const fn label(self) -> &'static str {
        match self {
            Period::Morning => "上午",
            Period::Noon => "中午",
            Period::Afternoon => "下午",
            Period::Evening => "傍晚",
            Period::Night => "晚上",
        }
    }

    /// Display range used when the text carries no explicit time.
    pub const fn default_time_range(self) -> &'static str {
        match self {
            Period::Morning => "09:00-12:00",
            Period::Noon => "12:00-14:00",
            Period::Afternoon => "14:00-17:00",
            Period::Evening => "18:00-21:00",
            Period::Night => "21:00-23:00",
        }
    }

    /// Gradient classes the legacy timeline renderer expects.
    pub const fn legacy_color(self) -> &'static str {
        match self {
            Period::Morning => "from-yellow-400 to-orange-500",
            Period::Noon => "from-orange-400 to-red-500",
            Period::Afternoon => "from-blue-400 to-indigo-500",
            Period::Evening => "from-purple-400 to-pink-500",
            Period::Night => "from-indigo-500 to-purple-600",
        }
    }

    /// Maps a starting hour (0-23) onto a period.
    pub const fn from_hour(hour: u32) -> Self {
        match hour {
            0..=11 => Period::Morning,
            12..=13 => Period::Noon,
            14..=17 => Period::Afternoon,
            18..=20 => Period::Evening,
            _ => Period::Night,
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = String;

    /// Strict parse of the canonical name only. Natural-language labels go
    /// through [`crate::normalizer::period::parse_period_label`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Period::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown period '{s}'"))
    }
}

/// One discrete thing to do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    /// Short title; never empty.
    pub title: String,
    /// Full cleaned text of the activity.
    pub description: String,
    /// Cost in currency units.
    pub cost: u32,
    /// Human readable duration label.
    pub duration: String,
    /// Parenthesised hints pulled out of the text.
    pub tips: Vec<String>,
    /// Symbolic icon for the activity category.
    pub icon: String,
}

/// A time-of-day block inside a day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    pub period: Period,
    /// Display range, usually `HH:MM-HH:MM`.
    pub time: String,
    /// Activities in textual order.
    pub activities: Vec<Activity>,
}

impl Segment {
    /// Creates a segment using the period's default time range.
    pub fn new(period: Period, activities: Vec<Activity>) -> Self {
        Self {
            period,
            time: period.default_time_range().to_string(),
            activities,
        }
    }

    /// Sum of activity costs.
    pub fn total_cost(&self) -> u32 {
        self.activities
            .iter()
            .fold(0u32, |acc, a| acc.saturating_add(a.cost))
    }
}

/// Placeholder weather shown until an enrichment service fills it in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Weather {
    pub condition: String,
    pub temperature: String,
    pub icon: String,
}

/// Everything planned for one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayPlan {
    /// 1-based day number; unique and increasing across a timeline.
    pub day: u32,
    pub title: String,
    /// Display date, empty when no start date is known.
    pub date: String,
    pub segments: Vec<Segment>,
    pub location: String,
    pub weather: Weather,
    /// Always derived from the activities, see [`DayPlan::recompute_total_cost`].
    pub total_cost: u32,
    pub tags: BTreeSet<String>,
}

impl DayPlan {
    /// Recomputes `total_cost` from the activities and returns it.
    ///
    /// # Examples
    ///
    /// ```
    /// use itinparse::model::{Activity, DayPlan, Period, Segment, Weather};
    ///
    /// let activity = Activity {
    ///     title: "故宫".into(),
    ///     description: "参观故宫".into(),
    ///     cost: 60,
    ///     duration: "约2-3小时".into(),
    ///     tips: vec![],
    ///     icon: "🏛️".into(),
    /// };
    /// let mut day = DayPlan {
    ///     day: 1,
    ///     title: "第1天".into(),
    ///     date: String::new(),
    ///     segments: vec![Segment::new(Period::Morning, vec![activity.clone(), activity])],
    ///     location: "北京".into(),
    ///     weather: Weather { condition: "晴朗".into(), temperature: "24°C".into(), icon: "☀️".into() },
    ///     total_cost: 0,
    ///     tags: Default::default(),
    /// };
    /// assert_eq!(day.recompute_total_cost(), 120);
    /// ```
    pub fn recompute_total_cost(&mut self) -> u32 {
        self.total_cost = self
            .segments
            .iter()
            .fold(0u32, |acc, s| acc.saturating_add(s.total_cost()));
        self.total_cost
    }

    /// Number of activities across all segments.
    pub fn activity_count(&self) -> usize {
        self.segments.iter().map(|s| s.activities.len()).sum()
    }

    /// Iterates over every activity in textual order.
    pub fn activities(&self) -> impl Iterator<Item = &Activity> {
        self.segments.iter().flat_map(|s| s.activities.iter())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_period_serializes_lowercase() {
        assert_eq!(serde_json::to_value(Period::Afternoon).unwrap(), json!("afternoon"));
        let p: Period = serde_json::from_value(json!("night")).unwrap();
        assert_eq!(p, Period::Night);
    }

    #[test]
    fn test_period_from_str_is_strict() {
        assert_eq!("Morning".parse::<Period>().unwrap(), Period::Morning);
        assert!("上午".parse::<Period>().is_err());
    }

    #[test]
    fn test_period_from_hour() {
        assert_eq!(Period::from_hour(8), Period::Morning);
        assert_eq!(Period::from_hour(12), Period::Noon);
        assert_eq!(Period::from_hour(15), Period::Afternoon);
        assert_eq!(Period::from_hour(19), Period::Evening);
        assert_eq!(Period::from_hour(22), Period::Night);
    }

    #[test]
    fn test_day_plan_uses_camel_case() {
        let day = DayPlan {
            day: 1,
            title: "第1天".into(),
            date: String::new(),
            segments: vec![],
            location: "上海".into(),
            weather: Weather {
                condition: "多云".into(),
                temperature: "24°C".into(),
                icon: "☀️".into(),
            },
            total_cost: 0,
            tags: BTreeSet::new(),
        };
        let value = serde_json::to_value(&day).unwrap();
        assert!(value.get("totalCost").is_some());
        assert!(value.get("total_cost").is_none());
    }

    #[test]
    fn test_segment_total_cost_saturates() {
        let activity = Activity {
            title: "x".into(),
            description: String::new(),
            cost: u32::MAX,
            duration: DEFAULT_DURATION.into(),
            tips: vec![],
            icon: "📍".into(),
        };
        let segment = Segment::new(Period::Night, vec![activity.clone(), activity]);
        assert_eq!(segment.total_cost(), u32::MAX);
        assert_eq!(segment.time, "21:00-23:00");
    }
}
