//! Activity extraction from free-text lines.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{
    period::parse_period_label,
    sticky_hash,
    text::{clean_text, is_sub_heading, sanitize_title, truncate_chars},
};
use crate::model::{Activity, DEFAULT_DURATION, UNTITLED_ACTIVITY};

/// Lines shorter than this (in characters, after cleaning) are not activities.
pub const MIN_ACTIVITY_CHARS: usize = 2;

/// Maximum length of an activity title, in characters.
pub const MAX_ACTIVITY_TITLE_CHARS: usize = 50;

const TITLE_FALLBACK_CHARS: usize = 30;

const DEFAULT_ICON: &str = "📍";

// Category labels that introduce a line the same way period labels do.
const ITEM_LABELS: &[&str] = &["早餐", "午饭", "晚饭", "夜宵", "住宿", "交通", "景点", "活动"];

static LIST_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?:[-*•·+]\s+|\d+\s*[.、)）]\s*|[一二三四五六七八九十]+\s*[、.]\s*)")
        .expect("Invalid list marker regex")
});

static LEADING_TIME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^\d{1,2}\s*[:：点时]\s*(?:\d{2})?\s*(?:[-~～–—至到]\s*\d{1,2}\s*[:：点时]\s*(?:\d{2})?)?\s*",
    )
    .expect("Invalid leading time regex")
});

static LABEL_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([^：:\s]{1,10})\s*[：:]\s*").expect("Invalid label prefix regex")
});

static TITLE_CLAUSE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([^，。：:；;,.!?！？（(]+)").expect("Invalid title clause regex")
});

static COST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(\d+)\s*(?:元|块|rmb|cny)|[¥￥]\s*(\d+)").expect("Invalid cost regex")
});

static TIPS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[（(]([^（）()]{1,99})[）)]").expect("Invalid tips regex"));

static DURATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(\d+(?:\.\d+)?(?:\s*[-~～]\s*\d+(?:\.\d+)?)?)\s*个?\s*(小时|钟头|hours?|hrs?|分钟|minutes?|mins?)",
    )
    .expect("Invalid duration regex")
});

struct CostBand {
    keywords: &'static [&'static str],
    low: u32,
    high: u32,
}

const COST_BANDS: &[CostBand] = &[
    CostBand {
        keywords: &["门票", "景区", "博物馆", "乐园", "ticket", "museum"],
        low: 50,
        high: 150,
    },
    CostBand {
        keywords: &["餐", "吃", "美食", "小吃", "饭", "restaurant", "food"],
        low: 40,
        high: 120,
    },
    CostBand {
        keywords: &["地铁", "公交", "打车", "出租", "高铁", "taxi", "metro"],
        low: 20,
        high: 70,
    },
    CostBand {
        keywords: &["购物", "商场", "买", "shopping", "mall"],
        low: 100,
        high: 300,
    },
];

const DEFAULT_BAND: CostBand = CostBand {
    keywords: &[],
    low: 30,
    high: 90,
};

const ICONS: &[(&[&str], &str)] = &[
    (
        &["餐", "吃", "美食", "小吃", "烤鸭", "火锅", "咖啡", "茶", "restaurant", "food"],
        "🍜",
    ),
    (
        &["博物馆", "故宫", "景区", "景点", "古迹", "寺", "塔", "参观", "游览", "museum"],
        "🏛️",
    ),
    (&["购物", "商场", "商业街", "市场", "买", "shopping", "mall"], "🛍️"),
    (
        &["机场", "高铁", "火车", "地铁", "打车", "交通", "出发", "返程", "抵达", "taxi", "airport"],
        "🚗",
    ),
    (
        &["公园", "登山", "爬山", "湖", "海边", "森林", "花园", "徒步", "自然", "park", "hike"],
        "🌳",
    ),
    (
        &["剧", "戏", "演出", "表演", "文化", "胡同", "酒吧", "show", "bar"],
        "🎭",
    ),
    (&["酒店", "入住", "民宿", "休息", "hotel"], "🏨"),
];

/// Removes a leading bullet or ordinal (`-`, `•`, `1.`, `2、`, `三、`).
///
/// # Examples
///
/// ```
/// use itinparse::normalizer::strip_list_marker;
///
/// assert_eq!(strip_list_marker("1. 参观故宫"), "参观故宫");
/// assert_eq!(strip_list_marker("- 逛南锣鼓巷"), "逛南锣鼓巷");
/// assert_eq!(strip_list_marker("三、返程"), "返程");
/// ```
pub fn strip_list_marker(line: &str) -> &str {
    match LIST_MARKER.find(line) {
        Some(m) => &line[m.end()..],
        None => line.trim_start(),
    }
}

fn strip_item_label(text: &str) -> &str {
    let Some(caps) = LABEL_PREFIX.captures(text) else {
        return text;
    };
    let label = &caps[1];
    if parse_period_label(label).is_some() || ITEM_LABELS.contains(&label) {
        caps.get(0).map_or(text, |m| &text[m.end()..])
    } else {
        text
    }
}

/// Short title for an activity: the first clause after list markers, time
/// tokens and period labels are removed.
pub fn extract_activity_title(text: &str) -> String {
    let cleaned = sanitize_title(strip_list_marker(text));
    let without_time = LEADING_TIME.replace(&cleaned, "");
    let body = strip_item_label(without_time.trim()).trim();

    let clause = TITLE_CLAUSE
        .captures(body)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .filter(|c| c.chars().count() >= MIN_ACTIVITY_CHARS);

    match clause {
        Some(c) => truncate_chars(c, MAX_ACTIVITY_TITLE_CHARS),
        None if !body.is_empty() => truncate_chars(body, TITLE_FALLBACK_CHARS),
        None => UNTITLED_ACTIVITY.to_string(),
    }
}

/// Explicit cost mentioned in the text (`60元`, `¥80`, `120 RMB`); `免费`
/// counts as zero.
///
/// # Examples
///
/// ```
/// use itinparse::normalizer::extract_cost;
///
/// assert_eq!(extract_cost("门票60元"), Some(60));
/// assert_eq!(extract_cost("人均 ¥ 120"), Some(120));
/// assert_eq!(extract_cost("免费开放"), Some(0));
/// assert_eq!(extract_cost("散步"), None);
/// ```
pub fn extract_cost(text: &str) -> Option<u32> {
    let explicit = COST.captures_iter(text).find_map(|caps| {
        caps.get(1)
            .or_else(|| caps.get(2))
            .and_then(|m| m.as_str().parse::<u32>().ok())
    });
    explicit.or_else(|| text.contains("免费").then_some(0))
}

/// Deterministic cost guess from the activity category.
///
/// The value lies in `low..high` of the category's band and only depends on
/// `text`.
pub fn estimate_cost(text: &str) -> u32 {
    let lower = text.to_lowercase();
    let band = COST_BANDS
        .iter()
        .find(|b| b.keywords.iter().any(|k| lower.contains(k)))
        .unwrap_or(&DEFAULT_BAND);
    let span = band.high - band.low;
    band.low + sticky_hash(text) % span
}

/// Parenthesised hints, e.g. `（建议提前预约）`.
pub fn extract_tips(text: &str) -> Vec<String> {
    TIPS.captures_iter(text)
        .filter_map(|caps| {
            let tip = caps[1].trim();
            (!tip.is_empty()).then(|| tip.to_string())
        })
        .collect()
}

/// Duration label from the text, [`DEFAULT_DURATION`] when none is stated.
pub fn extract_duration(text: &str) -> String {
    if let Some(caps) = DURATION.captures(text) {
        let amount: String = caps[1].chars().filter(|c| !c.is_whitespace()).collect();
        let unit = caps[2].to_lowercase();
        return if unit.starts_with('m') || unit == "分钟" {
            format!("约{amount}分钟")
        } else {
            format!("约{amount}小时")
        };
    }
    if text.contains("全天") || text.contains("一整天") {
        "全天".to_string()
    } else if text.contains("半天") {
        "半天".to_string()
    } else {
        DEFAULT_DURATION.to_string()
    }
}

/// Category icon for an activity.
pub fn icon_for(text: &str) -> &'static str {
    let lower = text.to_lowercase();
    ICONS
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| lower.contains(k)))
        .map_or(DEFAULT_ICON, |(_, icon)| *icon)
}

/// Builds an activity from one line of text.
///
/// Returns `None` for lines too short to describe anything.
pub fn build_activity(line: &str) -> Option<Activity> {
    let description = clean_text(strip_list_marker(line));
    if description.chars().count() < MIN_ACTIVITY_CHARS {
        return None;
    }

    let cost = extract_cost(&description).unwrap_or_else(|| estimate_cost(&description));
    Some(Activity {
        title: extract_activity_title(&description),
        cost,
        duration: extract_duration(&description),
        tips: extract_tips(&description),
        icon: icon_for(&description).to_string(),
        description,
    })
}

/// Extracts activities from a block, one per content line.
///
/// Headings, day markers and bare period labels are skipped. A block with
/// content but no usable line becomes a single combined activity.
pub fn extract_activities(block: &str) -> Vec<Activity> {
    let activities: Vec<Activity> = block
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter(|line| !is_sub_heading(line) && parse_period_label(line).is_none())
        .filter_map(build_activity)
        .collect();

    if !activities.is_empty() {
        return activities;
    }

    let combined = clean_text(block).replace('\n', " ");
    build_activity(&combined)
        .filter(|a| parse_period_label(&a.description).is_none())
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_title_takes_first_clause() {
        assert_eq!(extract_activity_title("参观故宫（建议提前预约），门票60元"), "参观故宫");
    }

    #[test]
    fn test_title_strips_time_and_label() {
        assert_eq!(extract_activity_title("09:00-11:00 游览天坛"), "游览天坛");
        assert_eq!(extract_activity_title("- **午餐**：全聚德烤鸭"), "全聚德烤鸭");
        assert_eq!(extract_activity_title("上午：登长城"), "登长城");
    }

    #[test]
    fn test_title_placeholder() {
        assert_eq!(extract_activity_title("**"), UNTITLED_ACTIVITY);
    }

    #[test]
    fn test_title_is_capped() {
        let long = "很".repeat(80);
        assert_eq!(
            extract_activity_title(&long).chars().count(),
            MAX_ACTIVITY_TITLE_CHARS
        );
    }

    #[test]
    fn test_estimate_cost_stays_in_band() {
        for text in ["故宫门票", "吃火锅", "打车去机场", "商场购物", "散步"] {
            let cost = estimate_cost(text);
            assert_eq!(cost, estimate_cost(text), "deterministic for {text}");
            assert!((20..=300).contains(&cost), "{text}: {cost}");
        }
        let food = estimate_cost("吃小吃");
        assert!((40..=120).contains(&food));
    }

    #[test]
    fn test_extract_tips() {
        assert_eq!(
            extract_tips("参观故宫（周一闭馆）(建议预约)"),
            vec!["周一闭馆".to_string(), "建议预约".to_string()]
        );
        assert!(extract_tips("没有提示").is_empty());
    }

    #[test]
    fn test_extract_duration() {
        assert_eq!(extract_duration("游览约2-3小时"), "约2-3小时");
        assert_eq!(extract_duration("步行30分钟"), "约30分钟");
        assert_eq!(extract_duration("1.5 hours walk"), "约1.5小时");
        assert_eq!(extract_duration("环湖骑行半天"), "半天");
        assert_eq!(extract_duration("逛街"), DEFAULT_DURATION);
    }

    #[test]
    fn test_icon_for() {
        assert_eq!(icon_for("品尝北京烤鸭"), "🍜");
        assert_eq!(icon_for("参观国家博物馆"), "🏛️");
        assert_eq!(icon_for("入住酒店"), "🏨");
        assert_eq!(icon_for("随便走走"), DEFAULT_ICON);
    }

    #[test]
    fn test_build_activity_uses_explicit_cost() {
        let activity = build_activity("1. 参观故宫，门票60元（建议提前预约）").unwrap();
        assert_eq!(activity.title, "参观故宫");
        assert_eq!(activity.cost, 60);
        assert_eq!(activity.tips, vec!["建议提前预约".to_string()]);
        assert_eq!(activity.icon, "🏛️");
    }

    #[test]
    fn test_build_activity_rejects_short_lines() {
        assert!(build_activity("-").is_none());
        assert!(build_activity("好").is_none());
    }

    #[test]
    fn test_extract_activities_skips_structure() {
        let block = "### 上午\n**上午**：\n- 参观故宫\n\n- 逛景山公园";
        let titles: Vec<String> = extract_activities(block)
            .into_iter()
            .map(|a| a.title)
            .collect();
        assert_eq!(titles, vec!["参观故宫".to_string(), "逛景山公园".to_string()]);
    }

    #[test]
    fn test_extract_activities_empty_block() {
        assert!(extract_activities("  \n ").is_empty());
        assert!(extract_activities("**下午**").is_empty());
    }
}
