//! Per-segment states, ledger outcomes and the aggregate run report.

use std::fmt;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::segment::Segment;

/// Processing state of one segment.
///
/// `Pending → Extracted → Scored → Published → MetadataReady → Submitted → Confirmed`,
/// with `Failed` reachable from any non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SegmentState {
    Pending,
    Extracted,
    Scored,
    Published,
    MetadataReady,
    Submitted,
    Confirmed,
    Failed,
}

impl SegmentState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SegmentState::Pending => "pending",
            SegmentState::Extracted => "extracted",
            SegmentState::Scored => "scored",
            SegmentState::Published => "published",
            SegmentState::MetadataReady => "metadata_ready",
            SegmentState::Submitted => "submitted",
            SegmentState::Confirmed => "confirmed",
            SegmentState::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SegmentState::Confirmed | SegmentState::Failed)
    }

    /// The single forward successor, if any.
    pub fn next(&self) -> Option<SegmentState> {
        match self {
            SegmentState::Pending => Some(SegmentState::Extracted),
            SegmentState::Extracted => Some(SegmentState::Scored),
            SegmentState::Scored => Some(SegmentState::Published),
            SegmentState::Published => Some(SegmentState::MetadataReady),
            SegmentState::MetadataReady => Some(SegmentState::Submitted),
            SegmentState::Submitted => Some(SegmentState::Confirmed),
            SegmentState::Confirmed | SegmentState::Failed => None,
        }
    }

    /// Whether `self → to` is a legal transition.
    pub fn can_transition_to(&self, to: SegmentState) -> bool {
        if self.is_terminal() {
            return false;
        }
        to == SegmentState::Failed || self.next() == Some(to)
    }
}

impl fmt::Display for SegmentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Finalized status of a ledger write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum TxStatus {
    Confirmed,
    Failed,
}

/// Ledger result for a segment that reached the commit stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TransactionOutcome {
    pub segment_index: u32,
    pub token_id: u64,
    pub status: TxStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_number: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TransactionOutcome {
    pub fn confirmed(segment_index: u32, token_id: u64, tx_hash: String, block_number: Option<u64>) -> Self {
        Self {
            segment_index,
            token_id,
            status: TxStatus::Confirmed,
            tx_hash: Some(tx_hash),
            block_number,
            error: None,
        }
    }

    /// Failed outcome; `tx_hash` is absent when submission itself failed.
    pub fn failed(
        segment_index: u32,
        token_id: u64,
        tx_hash: Option<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            segment_index,
            token_id,
            status: TxStatus::Failed,
            tx_hash,
            block_number: None,
            error: Some(error.into()),
        }
    }

    pub fn is_confirmed(&self) -> bool {
        self.status == TxStatus::Confirmed
    }
}

/// A segment whose artifacts and metadata were published.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SegmentSuccess {
    pub segment: Segment,
    pub score: f64,
    pub still_cid: String,
    pub clip_cid: String,
    pub metadata_cid: String,
    /// URI committed to the ledger
    pub metadata_uri: String,
}

/// Explicit failure marker for a segment that never reached the commit stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SegmentFailure {
    pub segment_index: u32,
    /// Last state reached before failing
    pub stage: SegmentState,
    /// Error category (e.g. `extraction`, `publish`)
    pub kind: String,
    pub error: String,
}

/// Overall disposition of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RunDisposition {
    /// Every segment was confirmed on the ledger
    Success,
    /// Some but not all segments were confirmed
    PartialSuccess,
    /// No segment was confirmed
    Failure,
}

impl RunDisposition {
    pub fn from_counts(confirmed: usize, total: usize) -> Self {
        if total > 0 && confirmed == total {
            RunDisposition::Success
        } else if confirmed > 0 {
            RunDisposition::PartialSuccess
        } else {
            RunDisposition::Failure
        }
    }

    /// Process exit code for this disposition.
    pub fn exit_code(&self) -> i32 {
        match self {
            RunDisposition::Success => 0,
            RunDisposition::Failure => 1,
            RunDisposition::PartialSuccess => 2,
        }
    }
}

/// Aggregate result of a run.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RunReport {
    pub run_id: String,
    pub video_id: String,
    pub link: String,
    pub total_duration: f64,
    pub segment_count: u32,
    /// Segments that reached `MetadataReady`, ordered by index
    pub segments: Vec<SegmentSuccess>,
    /// Segments that failed before the commit stage, ordered by index
    pub failures: Vec<SegmentFailure>,
    /// One outcome per segment that reached the commit stage, ordered by index
    pub ledger: Vec<TransactionOutcome>,
    pub disposition: RunDisposition,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunReport {
    pub fn confirmed_count(&self) -> usize {
        self.ledger.iter().filter(|o| o.is_confirmed()).count()
    }

    /// Final state of a segment as recorded in this report.
    pub fn state_of(&self, segment_index: u32) -> Option<SegmentState> {
        if let Some(outcome) = self.ledger.iter().find(|o| o.segment_index == segment_index) {
            return Some(if outcome.is_confirmed() {
                SegmentState::Confirmed
            } else {
                SegmentState::Failed
            });
        }
        if self.failures.iter().any(|f| f.segment_index == segment_index) {
            return Some(SegmentState::Failed);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_transitions() {
        let mut state = SegmentState::Pending;
        let mut path = vec![state];
        while let Some(next) = state.next() {
            assert!(state.can_transition_to(next));
            state = next;
            path.push(state);
        }
        assert_eq!(path.len(), 7);
        assert_eq!(state, SegmentState::Confirmed);
    }

    #[test]
    fn test_failed_reachable_from_non_terminal() {
        for state in [
            SegmentState::Pending,
            SegmentState::Extracted,
            SegmentState::Scored,
            SegmentState::Published,
            SegmentState::MetadataReady,
            SegmentState::Submitted,
        ] {
            assert!(state.can_transition_to(SegmentState::Failed));
        }
        assert!(!SegmentState::Confirmed.can_transition_to(SegmentState::Failed));
        assert!(!SegmentState::Failed.can_transition_to(SegmentState::Pending));
        assert!(!SegmentState::Pending.can_transition_to(SegmentState::Scored));
    }

    #[test]
    fn test_disposition() {
        assert_eq!(RunDisposition::from_counts(4, 4), RunDisposition::Success);
        assert_eq!(RunDisposition::from_counts(3, 4), RunDisposition::PartialSuccess);
        assert_eq!(RunDisposition::from_counts(0, 4), RunDisposition::Failure);
        assert_eq!(RunDisposition::from_counts(0, 0), RunDisposition::Failure);
        assert_eq!(RunDisposition::PartialSuccess.exit_code(), 2);
    }

    #[test]
    fn test_outcome_serialization() {
        let outcome = TransactionOutcome::failed(2, 2, None, "insufficient funds");
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "failed");
        assert!(json.get("tx_hash").is_none());
        assert_eq!(json["error"], "insufficient funds");
    }
}
