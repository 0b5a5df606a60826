//! Segment timeline.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::interest::{score_segment, InterestPeriod};

/// One equal-length time slice of the source video.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Segment {
    /// 0-based index, dense over `0..count`
    pub index: u32,
    /// Start in seconds
    pub start: f64,
    /// End in seconds
    pub end: f64,
    /// Length in seconds
    pub duration: f64,
}

impl Segment {
    /// Token id this segment is committed under on the ledger.
    pub fn token_id(&self) -> u64 {
        u64::from(self.index)
    }

    /// Desirability score against the given interest periods.
    pub fn score(&self, periods: &[InterestPeriod]) -> f64 {
        score_segment(self.start, self.end, periods)
    }

    /// Stable file stem for artifacts derived from this segment.
    pub fn file_stem(&self) -> String {
        format!("segment-{:04}", self.index)
    }
}

/// Errors from partitioning a duration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SegmentationError {
    #[error("Segment count must be at least 1")]
    ZeroCount,

    #[error("Total duration must be positive and finite, got {0}")]
    InvalidDuration(f64),
}

/// Partition `[0, total_duration)` into `count` contiguous equal segments.
///
/// `duration = total / count`, `start_i = i * duration`, `end_i = start_i + duration`.
pub fn segment_timeline(total_duration: f64, count: u32) -> Result<Vec<Segment>, SegmentationError> {
    if count == 0 {
        return Err(SegmentationError::ZeroCount);
    }
    if !total_duration.is_finite() || total_duration <= 0.0 {
        return Err(SegmentationError::InvalidDuration(total_duration));
    }

    let duration = total_duration / f64::from(count);

    Ok((0..count)
        .map(|index| {
            let start = f64::from(index) * duration;
            Segment {
                index,
                start,
                end: start + duration,
                duration,
            }
        })
        .collect())
}
