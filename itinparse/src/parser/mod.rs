//! Parser module that coordinates the timeline strategies.

mod attempt;
mod cleaner;
pub mod strategies;

use std::{
    any::Any,
    cmp::Reverse,
    panic::{self, AssertUnwindSafe},
    time::{Duration, Instant},
};

pub use attempt::{AttemptStatus, StrategyAttempt, StrategyCapability};
pub use cleaner::InputCleaner;
use strategies::{Strategy, StrategyOutput, TimelineStrategy};

use crate::{
    context::ParseContext,
    error::{StrategyError, TimelineError},
    model::DayPlan,
    normalizer::fallback_day_plans,
    outcome::ParseResult,
    validation::business_warnings,
};

/// Inputs with fewer non-whitespace characters are rejected up front.
pub const MIN_INPUT_CHARS: usize = 2;

/// Parses slower than this get a warning attached.
pub const SLOW_PARSE_THRESHOLD: Duration = Duration::from_millis(100);

/// Runs the registered strategies in priority order until one produces
/// days.
///
/// Every call is independent: the orchestrator holds no per-request state
/// and can be shared across threads.
///
/// # Examples
///
/// ```
/// use itinparse::parser::TimelineOrchestrator;
/// use itinparse::ParseContext;
///
/// let orchestrator = TimelineOrchestrator::default();
/// let (result, attempts) = orchestrator.parse_timeline_with_attempts(
///     "**上午** 参观故宫\n**下午** 游览颐和园",
///     &ParseContext::new("北京", 1),
/// );
/// assert!(result.is_success());
/// assert_eq!(attempts[0].strategy, "markdown_period");
/// ```
#[derive(Debug)]
pub struct TimelineOrchestrator {
    /// Strategies, highest priority first.
    strategies: Vec<Strategy>,
    cleaner: InputCleaner,
}

impl Default for TimelineOrchestrator {
    fn default() -> Self {
        Self::new()
    }
}

impl TimelineOrchestrator {
    /// Creates an orchestrator with the built-in strategies
    /// (JSON, Markdown period, numbered list, heuristic).
    pub fn new() -> Self {
        Self::with_strategies(Strategy::builtin())
    }

    /// Creates an orchestrator with custom strategies.
    ///
    /// Strategies are sorted by descending priority; equal priorities keep
    /// the given order.
    pub fn with_strategies(mut strategies: Vec<Strategy>) -> Self {
        strategies.sort_by_key(|s| Reverse(s.priority()));
        Self {
            strategies,
            cleaner: InputCleaner::new(),
        }
    }

    /// Strategy names in the order they are tried.
    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    #[inline]
    pub fn strategy_count(&self) -> usize {
        self.strategies.len()
    }

    /// Reports which strategies would consider `raw`, without parsing it.
    pub fn capabilities(&self, raw: &str) -> Vec<StrategyCapability> {
        let input = self.cleaner.clean(raw);
        self.strategies
            .iter()
            .map(|s| StrategyCapability {
                name: s.name(),
                priority: s.priority(),
                can_handle: guarded(|| s.can_handle(&input)).unwrap_or(false),
            })
            .collect()
    }

    /// Parses `raw` into day plans.
    ///
    /// Never fails outright: on failure the result carries a single
    /// free-exploration day for the destination.
    pub fn parse_timeline(&self, raw: &str, ctx: &ParseContext) -> ParseResult<Vec<DayPlan>> {
        self.parse_timeline_with_attempts(raw, ctx).0
    }

    /// Like [`parse_timeline`](Self::parse_timeline), also returning one
    /// record per strategy that was actually invoked.
    pub fn parse_timeline_with_attempts(
        &self,
        raw: &str,
        ctx: &ParseContext,
    ) -> (ParseResult<Vec<DayPlan>>, Vec<StrategyAttempt>) {
        let started = Instant::now();
        let input = self.cleaner.clean(raw);
        let ctx = &self.cleaner.clean_context(ctx);

        if let Err(err) = check_input(&input) {
            tracing::warn!(
                stage = "fallback",
                session_id = %ctx.session_id,
                reason = %err,
                "input rejected, returning fallback timeline"
            );
            return (
                ParseResult::failure(vec![err.to_string()], fallback_day_plans(ctx)),
                Vec::new(),
            );
        }

        let mut attempts = Vec::new();
        let mut failures = Vec::new();

        for strategy in &self.strategies {
            let name = strategy.name();
            let priority = strategy.priority();

            let applicable = match guarded(|| strategy.can_handle(&input)) {
                Ok(applicable) => applicable,
                Err(message) => {
                    tracing::warn!(
                        stage = "strategy_attempt",
                        session_id = %ctx.session_id,
                        strategy = name,
                        priority,
                        reason = %message,
                        "can_handle panicked"
                    );
                    let status = AttemptStatus::Panicked(message);
                    failures.push(StrategyError::new(name, status.to_string()));
                    attempts.push(StrategyAttempt {
                        strategy: name,
                        priority,
                        status,
                        elapsed: Duration::ZERO,
                    });
                    continue;
                }
            };
            if !applicable {
                tracing::debug!(
                    stage = "strategy_attempt",
                    session_id = %ctx.session_id,
                    strategy = name,
                    priority,
                    "strategy cannot handle input, skipped"
                );
                continue;
            }

            tracing::info!(
                stage = "strategy_attempt",
                session_id = %ctx.session_id,
                strategy = name,
                priority,
                "invoking strategy"
            );
            let attempt_started = Instant::now();
            let outcome = guarded(|| strategy.try_parse(&input, ctx));
            let elapsed = attempt_started.elapsed();

            let (status, output) = match outcome {
                Ok(Ok(Some(output))) if output.days.is_empty() => (
                    AttemptStatus::Failed(TimelineError::NoDayPlans.to_string()),
                    None,
                ),
                Ok(Ok(Some(output))) => (
                    AttemptStatus::Succeeded {
                        days: output.days.len(),
                    },
                    Some(output),
                ),
                Ok(Ok(None)) => (AttemptStatus::Declined, None),
                Ok(Err(err)) => (AttemptStatus::Failed(failure_reason(err)), None),
                Err(message) => (AttemptStatus::Panicked(message), None),
            };

            tracing::info!(
                stage = "strategy_result",
                session_id = %ctx.session_id,
                strategy = name,
                priority,
                success = status.is_success(),
                elapsed_ms = elapsed.as_millis() as u64,
                reason = %status.reason().unwrap_or_default(),
                "strategy finished"
            );

            if let Some(reason) = status.reason() {
                failures.push(StrategyError::new(name, reason));
            }
            attempts.push(StrategyAttempt {
                strategy: name,
                priority,
                status,
                elapsed,
            });

            if let Some(output) = output {
                let result = finalize(output, name, started.elapsed());
                return (result, attempts);
            }
        }

        let error = TimelineError::AllStrategiesFailed { attempts: failures };
        tracing::warn!(
            stage = "fallback",
            session_id = %ctx.session_id,
            attempted = attempts.len(),
            "{error}, returning fallback timeline"
        );
        let mut errors = vec![error.to_string()];
        if let TimelineError::AllStrategiesFailed { attempts: failures } = error {
            errors.extend(failures.iter().map(ToString::to_string));
        }
        (
            ParseResult::failure(errors, fallback_day_plans(ctx)),
            attempts,
        )
    }
}

fn check_input(input: &str) -> Result<(), TimelineError> {
    let len = input.chars().filter(|c| !c.is_whitespace()).count();
    if len == 0 {
        Err(TimelineError::EmptyInput)
    } else if len < MIN_INPUT_CHARS {
        Err(TimelineError::InputTooShort {
            len,
            min: MIN_INPUT_CHARS,
        })
    } else {
        Ok(())
    }
}

/// Turns a winning strategy's output into the final result: unique
/// increasing day numbers, recomputed costs, business warnings.
fn finalize(output: StrategyOutput, strategy: &str, elapsed: Duration) -> ParseResult<Vec<DayPlan>> {
    let StrategyOutput {
        mut days,
        mut warnings,
    } = output;

    let increasing = days.first().map_or(true, |d| d.day >= 1)
        && days.windows(2).all(|pair| pair[1].day > pair[0].day);
    if !increasing {
        for (idx, day) in days.iter_mut().enumerate() {
            day.day = u32::try_from(idx + 1).unwrap_or(u32::MAX);
        }
        warnings.push("day numbers were not unique and increasing, renumbered from 1".to_string());
    }

    for day in &mut days {
        day.recompute_total_cost();
    }
    warnings.extend(business_warnings(&days));

    if elapsed > SLOW_PARSE_THRESHOLD {
        warnings.push(format!(
            "slow parse: {strategy} succeeded after {} ms",
            elapsed.as_millis()
        ));
    }

    ParseResult::success(days, warnings)
}

fn failure_reason(err: TimelineError) -> String {
    match err {
        TimelineError::Strategy(inner) => inner.error,
        other => other.to_string(),
    }
}

/// Runs `f`, turning a panic into its message.
fn guarded<T>(f: impl FnOnce() -> T) -> Result<T, String> {
    panic::catch_unwind(AssertUnwindSafe(f)).map_err(|payload| panic_message(payload.as_ref()))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::error::Result;

    #[derive(Debug)]
    struct Exploding;

    impl TimelineStrategy for Exploding {
        fn name(&self) -> &'static str {
            "exploding"
        }

        fn priority(&self) -> u8 {
            200
        }

        fn can_handle(&self, _input: &str) -> bool {
            true
        }

        fn try_parse(&self, _input: &str, _ctx: &ParseContext) -> Result<Option<StrategyOutput>> {
            panic!("strategy blew up");
        }
    }

    #[derive(Debug)]
    struct Refusing;

    impl TimelineStrategy for Refusing {
        fn name(&self) -> &'static str {
            "refusing"
        }

        fn priority(&self) -> u8 {
            50
        }

        fn can_handle(&self, _input: &str) -> bool {
            true
        }

        fn try_parse(&self, _input: &str, _ctx: &ParseContext) -> Result<Option<StrategyOutput>> {
            Err(TimelineError::strategy("refusing", "not today"))
        }
    }

    #[derive(Debug)]
    struct Empty;

    impl TimelineStrategy for Empty {
        fn name(&self) -> &'static str {
            "empty"
        }

        fn priority(&self) -> u8 {
            150
        }

        fn can_handle(&self, _input: &str) -> bool {
            true
        }

        fn try_parse(&self, _input: &str, _ctx: &ParseContext) -> Result<Option<StrategyOutput>> {
            Ok(Some(StrategyOutput::new(Vec::new())))
        }
    }

    fn ctx() -> ParseContext {
        ParseContext::new("北京", 1)
    }

    #[test]
    fn test_builtin_order() {
        assert_eq!(
            TimelineOrchestrator::new().strategy_names(),
            vec!["json", "markdown_period", "numbered_list", "heuristic"]
        );
    }

    #[test]
    fn test_custom_strategies_sorted_by_priority() {
        let orchestrator = TimelineOrchestrator::with_strategies(vec![
            Strategy::custom(Refusing),
            Strategy::custom(Exploding),
        ]);
        assert_eq!(orchestrator.strategy_names(), vec!["exploding", "refusing"]);
    }

    #[test]
    fn test_short_input_is_rejected() {
        let (result, attempts) = TimelineOrchestrator::new().parse_timeline_with_attempts("好", &ctx());
        assert!(!result.is_success());
        assert!(attempts.is_empty());
        assert!(result.errors()[0].contains("too short"));
    }

    #[test]
    fn test_panic_is_contained() {
        let mut strategies = Strategy::builtin();
        strategies.push(Strategy::custom(Exploding));
        let orchestrator = TimelineOrchestrator::with_strategies(strategies);

        let (result, attempts) = orchestrator.parse_timeline_with_attempts("上午参观故宫", &ctx());
        assert!(result.is_success());
        assert_eq!(
            attempts[0].status,
            AttemptStatus::Panicked("strategy blew up".to_string())
        );
        assert!(attempts.last().unwrap().status.is_success());
    }

    #[test]
    fn test_all_failed_returns_fallback_with_errors() {
        let orchestrator = TimelineOrchestrator::with_strategies(vec![
            Strategy::custom(Exploding),
            Strategy::custom(Refusing),
        ]);
        let (result, attempts) = orchestrator.parse_timeline_with_attempts("上午参观故宫", &ctx());
        assert!(!result.is_success());
        assert_eq!(attempts.len(), 2);
        assert_eq!(result.data().len(), 1);
        assert_eq!(result.errors().len(), 3);
        assert_eq!(result.errors()[2], "refusing: not today");
    }

    #[test]
    fn test_capabilities_without_parsing() {
        let handled: Vec<&str> = TimelineOrchestrator::new()
            .capabilities("**上午** 故宫")
            .iter()
            .filter(|c| c.can_handle)
            .map(|c| c.name)
            .collect();
        assert_eq!(handled, vec!["markdown_period", "heuristic"]);
    }

    #[test]
    fn test_empty_output_is_a_failure() {
        let mut strategies = Strategy::builtin();
        strategies.push(Strategy::custom(Empty));
        let orchestrator = TimelineOrchestrator::with_strategies(strategies);

        let (result, attempts) = orchestrator.parse_timeline_with_attempts("上午参观故宫", &ctx());
        assert!(result.is_success());
        assert_eq!(attempts[0].strategy, "empty");
        assert_eq!(
            attempts[0].status,
            AttemptStatus::Failed(TimelineError::NoDayPlans.to_string())
        );
    }

    #[test]
    fn test_destination_is_cleaned_like_the_body() {
        let wide = ParseContext::new("北京（朝阳）", 1);
        let orchestrator = TimelineOrchestrator::new();

        let result = orchestrator.parse_timeline("**上午** 参观故宫", &wide);
        assert!(result.is_success());
        assert_eq!(result.data()[0].location, "北京(朝阳)");

        let fallback = orchestrator.parse_timeline("", &wide);
        assert_eq!(fallback.data()[0].title, "北京(朝阳)自由行");
    }

    #[test]
    fn test_finalize_renumbers_duplicate_days() {
        let mut days = fallback_day_plans(&ctx());
        days.extend(fallback_day_plans(&ctx()));

        let result = finalize(StrategyOutput::new(days), "json", Duration::ZERO);
        let numbers: Vec<u32> = result.data().iter().map(|d| d.day).collect();
        assert_eq!(numbers, vec![1, 2]);
        assert!(result.warnings()[0].contains("renumbered from 1"));
    }

    #[test]
    fn test_finalize_flags_slow_parse() {
        let slow = SLOW_PARSE_THRESHOLD + Duration::from_millis(1);
        let result = finalize(StrategyOutput::new(fallback_day_plans(&ctx())), "json", slow);
        assert_eq!(
            result.warnings(),
            &["slow parse: json succeeded after 101 ms".to_string()]
        );

        let fast = finalize(
            StrategyOutput::new(fallback_day_plans(&ctx())),
            "json",
            SLOW_PARSE_THRESHOLD,
        );
        assert!(fast.warnings().is_empty());
    }

    #[test]
    fn test_each_invocation_is_logged() {
        use std::{
            io,
            sync::{Arc, Mutex},
        };

        #[derive(Clone, Default)]
        struct Captured(Arc<Mutex<Vec<u8>>>);

        impl io::Write for Captured {
            fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
                self.0.lock().unwrap().extend_from_slice(buf);
                Ok(buf.len())
            }

            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::INFO)
            .finish();

        let (_, attempts) = tracing::subscriber::with_default(subscriber, || {
            TimelineOrchestrator::new().parse_timeline_with_attempts("**上午** 参观故宫", &ctx())
        });

        let logs = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        let invoked: Vec<&str> = logs.lines().filter(|l| l.contains("invoking strategy")).collect();
        assert_eq!(invoked.len(), attempts.len());
        assert!(invoked[0].contains("markdown_period"));
        assert!(invoked[0].contains("strategy_attempt"));
    }

    #[test]
    fn test_panic_message_variants() {
        let owned: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(owned.as_ref()), "owned");
        let other: Box<dyn Any + Send> = Box::new(42u8);
        assert_eq!(panic_message(other.as_ref()), "unknown panic");
    }
}
