//! Reads itinerary text from stdin and prints the timeline as JSON.
//!
//! ```text
//! echo "**上午** 参观故宫" | cargo run --example parse_itinerary -- 北京 1 session-1
//! ```
//!
//! Rollout flags come from the `TIMELINE_V2_*` environment variables and
//! log verbosity from `RUST_LOG`.

use std::io::Read;

use itinparse::{flags::FeatureFlags, service::TimelineService, ParseContext};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut args = std::env::args().skip(1);
    let destination = args.next().unwrap_or_default();
    let total_days = args.next().and_then(|d| d.parse().ok()).unwrap_or(0);
    let session_id = args.next().unwrap_or_else(|| "cli".to_string());

    let load = FeatureFlags::from_env();
    if let Err(err) = load.flags.validate() {
        eprintln!("{err}");
        std::process::exit(2);
    }
    tracing::info!(flags = %load.flags.summary(), "feature flags loaded");

    let mut raw = String::new();
    if let Err(err) = std::io::stdin().read_to_string(&mut raw) {
        eprintln!("failed to read stdin: {err}");
        std::process::exit(1);
    }

    let ctx = ParseContext::new(destination, total_days).with_session_id(session_id);
    let service = TimelineService::new(load.flags);
    let (_, attempts) = service.orchestrator().parse_timeline_with_attempts(&raw, &ctx);
    for attempt in &attempts {
        eprintln!(
            "{:>16} (priority {:>3}): {} in {:?}",
            attempt.strategy, attempt.priority, attempt.status, attempt.elapsed
        );
    }

    let response = service.render(&raw, &ctx);
    match serde_json::to_string_pretty(&response) {
        Ok(json) => println!("{json}"),
        Err(err) => {
            eprintln!("failed to serialise response: {err}");
            std::process::exit(1);
        }
    }
}
