//! Pre-processing applied to raw model output before any strategy sees it.

use unicode_normalization::UnicodeNormalization;

use crate::context::ParseContext;

/// Normalises raw itinerary text.
///
/// Steps, in order:
/// - invisible characters removed (BOM, zero-width space and non-joiner,
///   bidi marks and overrides)
/// - `\r\n` and lone `\r` turned into `\n`
/// - NFKC normalisation, so full-width digits and punctuation become ASCII
///
/// The zero-width joiner and emoji variation selectors are kept; they are
/// part of icons such as `🏛️`.
///
/// # Examples
///
/// ```
/// use itinparse::parser::InputCleaner;
///
/// let cleaner = InputCleaner::new();
/// assert_eq!(cleaner.clean("\u{FEFF}９：００－１２：００\r\n故宫"), "9:00-12:00\n故宫");
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct InputCleaner;

impl InputCleaner {
    /// Creates a new input cleaner.
    pub fn new() -> Self {
        Self
    }

    /// Removes invisible characters that break pattern matching.
    pub fn remove_invisible_chars(&self, input: &str) -> String {
        input.replace(
            [
                '\u{FEFF}', '\u{200B}', '\u{200C}', '\u{200E}', '\u{200F}', '\u{202A}', '\u{202B}',
                '\u{202C}', '\u{202D}', '\u{202E}', '\u{2060}',
            ],
            "",
        )
    }

    /// Unifies line endings to `\n`.
    pub fn normalize_line_endings(&self, input: &str) -> String {
        input.replace("\r\n", "\n").replace('\r', "\n")
    }

    /// Runs every cleaning step.
    pub fn clean(&self, input: &str) -> String {
        let visible = self.remove_invisible_chars(input);
        self.normalize_line_endings(&visible).nfkc().collect()
    }

    /// Copy of `ctx` whose destination went through [`clean`](Self::clean),
    /// so text synthesised from it uses the same forms as the parsed body.
    pub fn clean_context(&self, ctx: &ParseContext) -> ParseContext {
        ParseContext {
            destination: self.clean(&ctx.destination),
            ..ctx.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_removes_zero_width_space() {
        let cleaner = InputCleaner::new();
        assert_eq!(cleaner.clean("故\u{200B}宫"), "故宫");
    }

    #[test]
    fn test_keeps_emoji_sequences() {
        let cleaner = InputCleaner::new();
        let icons = "🏛️ 👨\u{200D}👩\u{200D}👧";
        assert_eq!(cleaner.clean(icons), icons);
    }

    #[test]
    fn test_full_width_punctuation_is_folded() {
        let cleaner = InputCleaner::new();
        assert_eq!(cleaner.clean("｛\"ｄａｙｓ\"：［］｝"), "{\"days\":[]}");
    }

    #[test]
    fn test_clean_context_folds_destination() {
        let ctx = ParseContext::new("北京（朝阳）", 2).with_session_id("ｓ１");
        let cleaned = InputCleaner::new().clean_context(&ctx);
        assert_eq!(cleaned.destination, "北京(朝阳)");
        assert_eq!(cleaned.session_id, "ｓ１");
        assert_eq!(cleaned.total_days, 2);
    }

    #[test]
    fn test_line_endings() {
        let cleaner = InputCleaner::new();
        assert_eq!(cleaner.clean("a\r\nb\rc"), "a\nb\nc");
    }

    #[test]
    fn test_clean_is_idempotent() {
        let cleaner = InputCleaner::new();
        let once = cleaner.clean("**上午**：参观（建议预约）¥６０");
        assert_eq!(cleaner.clean(&once), once);
    }
}
