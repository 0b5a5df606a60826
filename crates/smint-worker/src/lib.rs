//! StreamMint segment pipeline.
//!
//! Resolves a video source, partitions it into equal segments, extracts and
//! publishes per-segment artifacts, and commits each segment's metadata
//! reference to the ledger. Failures are isolated per segment.

pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod pipeline;
pub mod task;

pub use config::{PipelineConfig, ServiceConfig};
pub use error::{PipelineError, PipelineResult};
pub use logging::{init_tracing, SegmentLogger};
pub use pipeline::{Pipeline, PipelineDeps};
pub use task::{resolve_task, RunRequest};
