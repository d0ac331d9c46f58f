//! Entry point for hosts: gate, parse, and render in the legacy shape.

use serde::Serialize;

use crate::{
    context::ParseContext,
    flags::{FeatureFlags, GateDecision},
    legacy::{legacy_days_from_text, to_legacy_days, LegacyDay},
    model::DayPlan,
    outcome::ParseResult,
    parser::TimelineOrchestrator,
};

/// Which path produced a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Pipeline {
    Orchestrated,
    Legacy,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineResponse {
    pub pipeline: Pipeline,
    /// Always present, whichever path ran.
    pub days: Vec<LegacyDay>,
    /// Typed result; only set on the orchestrated path.
    pub outcome: Option<ParseResult<Vec<DayPlan>>>,
    pub gate: GateDecision,
}

/// Routes each session through the orchestrator or the legacy splitter,
/// according to the feature flags it was built with.
///
/// # Examples
///
/// ```
/// use itinparse::{flags::FeatureFlags, service::{Pipeline, TimelineService}, ParseContext};
///
/// let service = TimelineService::new(FeatureFlags::default());
/// let ctx = ParseContext::new("北京", 1).with_session_id("s-1");
/// let response = service.render("**上午** 参观故宫", &ctx);
/// assert_eq!(response.pipeline, Pipeline::Orchestrated);
/// assert_eq!(response.days.len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct TimelineService {
    orchestrator: TimelineOrchestrator,
    flags: FeatureFlags,
}

impl TimelineService {
    pub fn new(flags: FeatureFlags) -> Self {
        Self::with_orchestrator(TimelineOrchestrator::new(), flags)
    }

    pub fn with_orchestrator(orchestrator: TimelineOrchestrator, flags: FeatureFlags) -> Self {
        Self {
            orchestrator,
            flags,
        }
    }

    #[inline]
    pub fn flags(&self) -> &FeatureFlags {
        &self.flags
    }

    #[inline]
    pub fn orchestrator(&self) -> &TimelineOrchestrator {
        &self.orchestrator
    }

    pub fn render(&self, raw: &str, ctx: &ParseContext) -> TimelineResponse {
        let gate = self.flags.decide(&ctx.session_id);
        if !gate.enabled {
            return TimelineResponse {
                pipeline: Pipeline::Legacy,
                days: legacy_days_from_text(raw, ctx),
                outcome: None,
                gate,
            };
        }

        let outcome = self.orchestrator.parse_timeline(raw, ctx);
        TimelineResponse {
            pipeline: Pipeline::Orchestrated,
            days: to_legacy_days(outcome.data()),
            outcome: Some(outcome),
            gate,
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::flags::GateReason;

    #[test]
    fn test_blacklisted_session_takes_legacy_path() {
        let service = TimelineService::new(FeatureFlags::default().with_blacklist(["old"]));
        let ctx = ParseContext::new("北京", 2).with_session_id("old");
        let response = service.render("Day 1: 故宫\nDay 2: 长城", &ctx);
        assert_eq!(response.pipeline, Pipeline::Legacy);
        assert_eq!(response.gate.reason, GateReason::Blacklisted);
        assert!(response.outcome.is_none());
        assert_eq!(response.days[1].content, "Day 2: 长城");
    }

    #[test]
    fn test_empty_input_still_renders_fallback() {
        let service = TimelineService::default();
        let response = service.render("", &ParseContext::new("成都", 1));
        let outcome = response.outcome.unwrap();
        assert!(!outcome.is_success());
        assert_eq!(response.days.len(), 1);
        assert_eq!(response.days[0].title, "成都自由行");
    }
}
