//! Prometheus metrics for pipeline runs.

use std::net::SocketAddr;
use std::time::Duration;

use ::metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use smint_models::{ArtifactKind, RunDisposition, SegmentState, TxStatus};

use crate::error::{PipelineError, PipelineResult};

/// Metric names as constants for consistency.
pub mod names {
    pub const SEGMENTS_TOTAL: &str = "smint_segments_total";
    pub const SEGMENT_FAILURES_TOTAL: &str = "smint_segment_failures_total";
    pub const ARTIFACTS_PUBLISHED_TOTAL: &str = "smint_artifacts_published_total";
    pub const LEDGER_OUTCOMES_TOTAL: &str = "smint_ledger_outcomes_total";
    pub const TRANSCODE_DURATION_SECONDS: &str = "smint_transcode_duration_seconds";
    pub const RUNS_TOTAL: &str = "smint_runs_total";
}

/// Serve metrics on `addr`.
pub fn install_exporter(addr: SocketAddr) -> PipelineResult<()> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| PipelineError::config(format!("metrics exporter: {}", e)))
}

pub fn record_segment_started() {
    counter!(names::SEGMENTS_TOTAL).increment(1);
}

pub fn record_segment_failure(stage: SegmentState) {
    counter!(names::SEGMENT_FAILURES_TOTAL, "stage" => stage.as_str()).increment(1);
}

pub fn record_artifact_published(kind: ArtifactKind) {
    counter!(names::ARTIFACTS_PUBLISHED_TOTAL, "kind" => kind.as_str()).increment(1);
}

pub fn record_ledger_outcome(status: TxStatus) {
    let status = match status {
        TxStatus::Confirmed => "confirmed",
        TxStatus::Failed => "failed",
    };
    counter!(names::LEDGER_OUTCOMES_TOTAL, "status" => status).increment(1);
}

pub fn record_transcode(kind: ArtifactKind, elapsed: Duration) {
    histogram!(names::TRANSCODE_DURATION_SECONDS, "kind" => kind.as_str()).record(elapsed.as_secs_f64());
}

pub fn record_run(disposition: RunDisposition) {
    let label = match disposition {
        RunDisposition::Success => "success",
        RunDisposition::PartialSuccess => "partial_success",
        RunDisposition::Failure => "failure",
    };
    counter!(names::RUNS_TOTAL, "disposition" => label).increment(1);
}
