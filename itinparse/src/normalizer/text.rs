//! Text cleanup and title extraction.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{days::DAY_MARKER, period::parse_period_label};

/// Maximum length of a day title, in characters.
pub const MAX_TITLE_CHARS: usize = 60;

static MARKDOWN_MARKERS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\*\*|#+|__|~~|`").expect("Invalid markdown marker regex"));

static BLANK_LINES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n(?:[ \t]*\n)+").expect("Invalid blank line regex"));

static DAY_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:day\s*\d+(?:\s*[-–~]\s*\d+)?|第\s*[0-9一二三四五六七八九十]+(?:\s*[-–~至到]\s*[0-9一二三四五六七八九十]+)?\s*天)\s*[：:]\s*")
        .expect("Invalid day prefix regex")
});

// "1. 早餐：" style list labels in front of the real title.
static NUMBERED_LABEL_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d+\.\s*[^：:\n]{1,20}[：:]\s*").expect("Invalid numbered label regex")
});

static DAY_TITLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?im)^[ \t>*#\-]*(?:day[ \t]*\d+(?:[ \t]*[-–~][ \t]*\d+)?|第[ \t]*[0-9一二三四五六七八九十]+(?:[ \t]*[-–~至到][ \t]*[0-9一二三四五六七八九十]+)?[ \t]*天)[ \t*]*[：:\-–—]?[ \t]*([^\n]*)$",
    )
    .expect("Invalid day title regex")
});

static HEADING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^[ \t]*#{1,6}[ \t]+(\S[^\n]*)$").expect("Invalid heading regex")
});

static BOLD_ONLY_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\*\*[^*]+\*\*\s*[：:]?$").expect("Invalid bold line regex")
});

/// Removes Markdown emphasis, heading and code markers and collapses blank
/// lines.
///
/// # Examples
///
/// ```
/// use itinparse::normalizer::clean_text;
///
/// assert_eq!(clean_text("## **故宫** `门票`\n\n\n午饭"), "故宫 门票\n午饭");
/// ```
pub fn clean_text(text: &str) -> String {
    let stripped = MARKDOWN_MARKERS.replace_all(text, "");
    BLANK_LINES
        .replace_all(&stripped, "\n")
        .trim()
        .to_string()
}

/// Keeps at most `max` characters, trimming trailing whitespace.
pub fn truncate_chars(text: &str, max: usize) -> String {
    let truncated: String = text.chars().take(max).collect();
    truncated.trim_end().to_string()
}

/// Cleans a title and strips day and numbered-label prefixes.
///
/// May return an empty string; callers pick their own placeholder.
pub fn sanitize_title(title: &str) -> String {
    let cleaned = clean_text(title);
    let without_day = DAY_PREFIX.replace(&cleaned, "");
    let without_label = NUMBERED_LABEL_PREFIX.replace(&without_day, "");
    truncate_chars(without_label.trim(), MAX_TITLE_CHARS)
}

/// Finds a title for a day chunk: the text after a `Day N:` / `第N天：`
/// marker, else the first Markdown heading, else `fallback`.
pub fn extract_day_title(chunk: &str, fallback: &str) -> String {
    let from_marker = DAY_TITLE
        .captures(chunk)
        .and_then(|caps| caps.get(1))
        .map(|m| sanitize_title(m.as_str()));
    let from_heading = || {
        HEADING
            .captures(chunk)
            .and_then(|caps| caps.get(1))
            .map(|m| sanitize_title(m.as_str()))
    };

    from_marker
        .filter(|t| usable_title(t))
        .or_else(|| from_heading().filter(|t| usable_title(t)))
        .unwrap_or_else(|| fallback.to_string())
}

fn usable_title(title: &str) -> bool {
    !title.is_empty() && parse_period_label(title).is_none()
}

/// Whether a line is structure rather than content: a Markdown heading, a
/// day marker or a line that is nothing but a bold label.
pub fn is_sub_heading(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.starts_with('#') || DAY_MARKER.is_match(trimmed) || BOLD_ONLY_LINE.is_match(trimmed)
}
