//! # itinparse
//!
//! Turns free-form itinerary text written by an LLM into a typed,
//! day-by-day timeline.
//!
//! LLM itineraries arrive in many shapes:
//! - JSON, bare or inside a code fence, sometimes with trailing commas
//! - Markdown with bold period labels such as `**上午**`
//! - Numbered lists and `09:00-12:00` time blocks
//! - Loose prose
//!
//! Several strategies are tried in priority order and the first that
//! produces days wins. Parsing never fails outright: when nothing works
//! the result still carries a minimal fallback timeline.
//!
//! ## Quick Start
//!
//! ```rust
//! use itinparse::{parse_timeline, ParseContext, Period};
//!
//! let ctx = ParseContext::new("北京", 1);
//! let result = parse_timeline("**上午** 参观故宫\n**下午** 游览颐和园", &ctx);
//!
//! assert!(result.is_success());
//! let day = &result.data()[0];
//! let periods: Vec<Period> = day.segments.iter().map(|s| s.period).collect();
//! assert_eq!(periods, vec![Period::Morning, Period::Afternoon]);
//! ```
//!
//! ## Rollout
//!
//! [`flags::FeatureFlags`] decides per session whether the orchestrated
//! pipeline or the legacy splitter serves a request, and
//! [`service::TimelineService`] wires both paths together.

pub mod context;
pub mod error;
pub mod flags;
pub mod legacy;
pub mod model;
pub mod normalizer;
pub mod outcome;
pub mod parser;
pub mod service;
pub mod validation;

use once_cell::sync::Lazy;

pub use context::ParseContext;
pub use error::{Result, StrategyError, TimelineError};
pub use flags::FeatureFlags;
pub use model::{Activity, DayPlan, Period, Segment, Weather};
pub use outcome::ParseResult;
pub use parser::{StrategyAttempt, TimelineOrchestrator};

static DEFAULT_ORCHESTRATOR: Lazy<TimelineOrchestrator> = Lazy::new(TimelineOrchestrator::new);

/// Parses itinerary text with the built-in strategies.
///
/// # Examples
///
/// ```
/// use itinparse::{parse_timeline, ParseContext};
///
/// let result = parse_timeline("", &ParseContext::new("杭州", 1));
/// assert!(!result.is_success());
/// assert_eq!(result.data()[0].title, "杭州自由行");
/// ```
pub fn parse_timeline(raw: &str, ctx: &ParseContext) -> ParseResult<Vec<DayPlan>> {
    DEFAULT_ORCHESTRATOR.parse_timeline(raw, ctx)
}

/// Like [`parse_timeline`], also returning the per-strategy attempt log.
pub fn parse_timeline_with_attempts(
    raw: &str,
    ctx: &ParseContext,
) -> (ParseResult<Vec<DayPlan>>, Vec<StrategyAttempt>) {
    DEFAULT_ORCHESTRATOR.parse_timeline_with_attempts(raw, ctx)
}

/// Whether `session_id` should get the orchestrated pipeline under `flags`.
#[inline]
pub fn is_new_pipeline_enabled(flags: &FeatureFlags, session_id: &str) -> bool {
    flags.is_new_pipeline_enabled(session_id)
}
