//! Wire schemas for upstream responses.
//!
//! Responses are parsed into these types at the boundary; anything that does
//! not match is an [`SourceError::InvalidResponse`](crate::SourceError).

use serde::{Deserialize, Deserializer};

use smint_models::{InterestPeriod, StreamCandidate};

/// Numeric field some providers send as a string.
#[derive(Deserialize)]
#[serde(untagged)]
enum Lenient {
    Number(f64),
    Text(String),
}

fn lenient_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    match Lenient::deserialize(deserializer)? {
        Lenient::Number(n) => Ok(n),
        Lenient::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

fn lenient_u64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    let value = lenient_f64(deserializer)?;
    if value.is_finite() && value >= 0.0 {
        Ok(value as u64)
    } else {
        Err(serde::de::Error::custom(format!("invalid size {}", value)))
    }
}

/// `GET /v2/video/details` response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DetailsResponse {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(deserialize_with = "lenient_f64")]
    pub length_seconds: f64,
    #[serde(default)]
    pub videos: Option<StreamList>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StreamList {
    #[serde(default)]
    pub items: Vec<StreamItem>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StreamItem {
    pub url: String,
    pub extension: String,
    #[serde(deserialize_with = "lenient_u64")]
    pub size: u64,
    #[serde(default)]
    pub quality: Option<String>,
}

impl From<StreamItem> for StreamCandidate {
    fn from(item: StreamItem) -> Self {
        StreamCandidate {
            url: item.url,
            container: item.extension,
            quality: item.quality,
            size: item.size,
        }
    }
}

/// Interest oracle response.
#[derive(Debug, Deserialize)]
pub(crate) struct PeriodsResponse {
    pub periods: Vec<InterestPeriod>,
}

/// Provider view of a video, before any policy is applied.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoDetails {
    pub video_id: String,
    pub title: Option<String>,
    pub duration_secs: f64,
    pub candidates: Vec<StreamCandidate>,
}
