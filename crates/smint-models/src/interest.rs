//! Interest periods and segment scoring.
//!
//! An interest period is an externally supplied time window with a
//! desirability weight. A segment's score is the strongest single
//! overlap it has with any period, never a blend of several.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A weighted time window reported by the interest oracle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct InterestPeriod {
    /// Window start in seconds
    pub start: f64,
    /// Window end in seconds
    pub end: f64,
    /// Window length in seconds
    pub duration: f64,
    /// Desirability weight (the oracle calls it `score`)
    #[serde(alias = "score")]
    pub weight: f64,
}

/// Reasons a period is rejected at the oracle boundary.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InterestPeriodError {
    #[error("period has a non-finite field")]
    NonFinite,

    #[error("period starts before zero: {0}")]
    NegativeStart(f64),

    #[error("period end {end} is not after start {start}")]
    EmptyRange { start: f64, end: f64 },

    #[error("period duration must be positive, got {0}")]
    NonPositiveDuration(f64),

    #[error("period weight must not be negative, got {0}")]
    NegativeWeight(f64),
}

impl InterestPeriod {
    /// Create a period whose duration is `end - start`.
    pub fn new(start: f64, end: f64, weight: f64) -> Self {
        Self {
            start,
            end,
            duration: end - start,
            weight,
        }
    }

    /// Check the period is usable for scoring.
    pub fn validate(&self) -> Result<(), InterestPeriodError> {
        if ![self.start, self.end, self.duration, self.weight]
            .iter()
            .all(|v| v.is_finite())
        {
            return Err(InterestPeriodError::NonFinite);
        }
        if self.start < 0.0 {
            return Err(InterestPeriodError::NegativeStart(self.start));
        }
        if self.end <= self.start {
            return Err(InterestPeriodError::EmptyRange {
                start: self.start,
                end: self.end,
            });
        }
        if self.duration <= 0.0 {
            return Err(InterestPeriodError::NonPositiveDuration(self.duration));
        }
        if self.weight < 0.0 {
            return Err(InterestPeriodError::NegativeWeight(self.weight));
        }
        Ok(())
    }

    /// Seconds of `[start, end)` shared with this period.
    pub fn overlap(&self, start: f64, end: f64) -> f64 {
        (end.min(self.end) - start.max(self.start)).max(0.0)
    }
}

/// Score the range `[start, end)` against a list of interest periods.
///
/// Each overlapping period contributes `weight * overlap / duration`
/// (the ratio is capped at 1 so a score never exceeds the period's weight);
/// the result is the maximum contribution, or 0 when nothing overlaps.
pub fn score_segment(start: f64, end: f64, periods: &[InterestPeriod]) -> f64 {
    periods
        .iter()
        .filter_map(|period| {
            let overlap = period.overlap(start, end);
            if overlap > 0.0 && period.duration > 0.0 {
                let ratio = (overlap / period.duration).min(1.0);
                Some(period.weight * ratio)
            } else {
                None
            }
        })
        .fold(0.0, f64::max)
}

/// Largest weight in the list (0 for an empty list).
pub fn max_weight(periods: &[InterestPeriod]) -> f64 {
    periods.iter().map(|p| p.weight).fold(0.0, f64::max)
}
