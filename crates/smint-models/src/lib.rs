//! Shared data models for the StreamMint segment pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Video sources and candidate streams
//! - Interest periods and segment scoring
//! - Segment timelines
//! - Artifacts and token metadata documents
//! - Task input validation
//! - Run reports and ledger outcomes

pub mod artifact;
pub mod encoding;
pub mod interest;
pub mod metadata;
pub mod report;
pub mod segment;
pub mod source;
pub mod task;

// Re-export common types
pub use artifact::{Artifact, ArtifactKind, PublishedArtifact};
pub use encoding::ExtractionParams;
pub use interest::{max_weight, score_segment, InterestPeriod, InterestPeriodError};
pub use metadata::{compose_token_metadata, MetadataAttribute, MetadataContext, Rarity, TokenMetadata};
pub use report::{
    RunDisposition, RunReport, SegmentFailure, SegmentState, SegmentSuccess, TransactionOutcome,
    TxStatus,
};
pub use segment::{segment_timeline, Segment, SegmentationError};
pub use source::{extract_video_id, SourceIdError, StreamCandidate, VideoSource};
pub use task::{task_input_schema, CollectionTask, DirectTask, TaskInput, TaskInputError};
