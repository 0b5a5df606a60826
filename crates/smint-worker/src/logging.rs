//! Tracing setup and per-segment structured logging.

use tracing::{error, info, warn, Span};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use smint_models::SegmentState;

/// Install the global subscriber: JSON when `LOG_FORMAT=json`, ANSI otherwise.
pub fn init_tracing() {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let mut env_filter = EnvFilter::from_default_env();
    if let Ok(directive) = "smint=info".parse() {
        env_filter = env_filter.add_directive(directive);
    }

    // Logs go to stderr; stdout carries the run report.
    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }
}

/// Logger carrying run and segment context.
#[derive(Debug, Clone)]
pub struct SegmentLogger {
    run_id: String,
    segment: u32,
}

impl SegmentLogger {
    pub fn new(run_id: &str, segment: u32) -> Self {
        Self {
            run_id: run_id.to_string(),
            segment,
        }
    }

    /// Log a state transition.
    pub fn log_stage(&self, state: SegmentState, message: &str) {
        info!(
            run_id = %self.run_id,
            segment = self.segment,
            state = %state,
            "Segment {}: {}", state, message
        );
    }

    pub fn log_warning(&self, message: &str) {
        warn!(
            run_id = %self.run_id,
            segment = self.segment,
            "Segment warning: {}", message
        );
    }

    /// Log a segment moving to `Failed` from `stage`.
    pub fn log_failure(&self, stage: SegmentState, kind: &str, message: &str) {
        error!(
            run_id = %self.run_id,
            segment = self.segment,
            stage = %stage,
            kind,
            "Segment failed: {}", message
        );
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn segment(&self) -> u32 {
        self.segment
    }

    pub fn create_span(&self) -> Span {
        tracing::info_span!("segment", run_id = %self.run_id, segment = self.segment)
    }
}
