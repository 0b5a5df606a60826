//! Token metadata documents.
//!
//! The document follows the common NFT metadata layout (`name`, `image`,
//! `animation_url`, `attributes`) so wallets and the collection page can
//! render a segment without extra lookups.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::segment::Segment;

/// Score at or above which a segment is `Epic`.
pub const EPIC_THRESHOLD: f64 = 0.75;
/// Score at or above which a segment is `Rare`.
pub const RARE_THRESHOLD: f64 = 0.5;

/// Rarity tier derived from a segment's score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum Rarity {
    Epic,
    Rare,
    Usual,
}

impl Rarity {
    pub fn from_score(score: f64) -> Self {
        if score >= EPIC_THRESHOLD {
            Rarity::Epic
        } else if score >= RARE_THRESHOLD {
            Rarity::Rare
        } else {
            Rarity::Usual
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Rarity::Epic => "Epic",
            Rarity::Rare => "Rare",
            Rarity::Usual => "Usual",
        }
    }
}

/// Attribute value: numeric or text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum AttributeValue {
    Number(f64),
    Text(String),
}

/// One entry of the `attributes` array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct MetadataAttribute {
    pub trait_type: String,
    pub value: AttributeValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_type: Option<String>,
}

impl MetadataAttribute {
    pub fn number(trait_type: &str, value: f64) -> Self {
        Self {
            trait_type: trait_type.to_string(),
            value: AttributeValue::Number(value),
            display_type: Some("number".to_string()),
        }
    }

    pub fn text(trait_type: &str, value: impl Into<String>) -> Self {
        Self {
            trait_type: trait_type.to_string(),
            value: AttributeValue::Text(value.into()),
            display_type: None,
        }
    }
}

/// Metadata document committed (by reference) to the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TokenMetadata {
    pub name: String,
    pub description: String,
    /// Still frame URI
    pub image: String,
    /// Animated clip URI
    pub animation_url: String,
    /// Back-link to the source at the segment start
    pub external_url: String,
    pub attributes: Vec<MetadataAttribute>,
}

impl TokenMetadata {
    /// Look up an attribute by trait type.
    pub fn attribute(&self, trait_type: &str) -> Option<&AttributeValue> {
        self.attributes
            .iter()
            .find(|a| a.trait_type == trait_type)
            .map(|a| &a.value)
    }

    pub fn to_json_bytes(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec_pretty(self)
    }
}

/// Run-wide values every segment's document shares.
#[derive(Debug, Clone)]
pub struct MetadataContext<'a> {
    pub collection_name: &'a str,
    pub source_link: &'a str,
    pub source_title: Option<&'a str>,
    pub gateway_prefix: &'a str,
    pub segment_count: u32,
}

/// Assemble the metadata document for a segment. Pure; no I/O.
pub fn compose_token_metadata(
    ctx: &MetadataContext<'_>,
    segment: &Segment,
    still_cid: &str,
    clip_cid: &str,
    score: f64,
) -> TokenMetadata {
    let rarity = Rarity::from_score(score);
    let source_label = ctx.source_title.unwrap_or(ctx.source_link);

    TokenMetadata {
        name: format!("{} #{}", ctx.collection_name, segment.index),
        description: format!(
            "Segment {} of {} from \"{}\" ({} - {}).",
            segment.index + 1,
            ctx.segment_count,
            source_label,
            format_clock(segment.start),
            format_clock(segment.end)
        ),
        image: format!("{}{}", ctx.gateway_prefix, still_cid),
        animation_url: format!("{}{}", ctx.gateway_prefix, clip_cid),
        external_url: timestamped_link(ctx.source_link, segment.start),
        attributes: vec![
            MetadataAttribute::number("Segment", f64::from(segment.index)),
            MetadataAttribute::number("Start Time", round_to(segment.start, 3)),
            MetadataAttribute::number("End Time", round_to(segment.end, 3)),
            MetadataAttribute::number("Duration", round_to(segment.duration, 3)),
            MetadataAttribute::number("Quality Score", round_to(score, 4)),
            MetadataAttribute::text("Rarity", rarity.as_str()),
        ],
    }
}

/// Append a `t=<seconds>s` parameter to the source link.
fn timestamped_link(link: &str, start: f64) -> String {
    let separator = if link.contains('?') { '&' } else { '?' };
    format!("{}{}t={}s", link, separator, start.floor() as u64)
}

/// Format seconds as `mm:ss` (or `h:mm:ss` past an hour).
fn format_clock(seconds: f64) -> String {
    let total = seconds.max(0.0).floor() as u64;
    let (hours, minutes, secs) = (total / 3600, (total % 3600) / 60, total % 60);
    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{:02}:{:02}", minutes, secs)
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::segment_timeline;

    fn ctx() -> MetadataContext<'static> {
        MetadataContext {
            collection_name: "StreamMint",
            source_link: "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            source_title: Some("Launch stream"),
            gateway_prefix: "ipfs://",
            segment_count: 4,
        }
    }

    #[test]
    fn test_compose() {
        let segment = segment_timeline(1200.0, 4).unwrap()[1];
        let doc = compose_token_metadata(&ctx(), &segment, "stillcid", "clipcid", 0.45);

        assert_eq!(doc.name, "StreamMint #1");
        assert_eq!(doc.image, "ipfs://stillcid");
        assert_eq!(doc.animation_url, "ipfs://clipcid");
        assert_eq!(
            doc.external_url,
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=300s"
        );
        assert!(doc.description.contains("Segment 2 of 4"));
        assert!(doc.description.contains("05:00 - 10:00"));
        assert_eq!(doc.attribute("Start Time"), Some(&AttributeValue::Number(300.0)));
        assert_eq!(doc.attribute("End Time"), Some(&AttributeValue::Number(600.0)));
        assert_eq!(doc.attribute("Quality Score"), Some(&AttributeValue::Number(0.45)));
        assert_eq!(
            doc.attribute("Rarity"),
            Some(&AttributeValue::Text("Usual".to_string()))
        );
    }

    #[test]
    fn test_compose_is_pure() {
        let segment = segment_timeline(90.0, 3).unwrap()[2];
        let a = compose_token_metadata(&ctx(), &segment, "s", "c", 0.8);
        let b = compose_token_metadata(&ctx(), &segment, "s", "c", 0.8);
        assert_eq!(a, b);
    }

    #[test]
    fn test_rarity_tiers() {
        assert_eq!(Rarity::from_score(0.9), Rarity::Epic);
        assert_eq!(Rarity::from_score(0.75), Rarity::Epic);
        assert_eq!(Rarity::from_score(0.5), Rarity::Rare);
        assert_eq!(Rarity::from_score(0.1), Rarity::Usual);
        assert_eq!(Rarity::from_score(0.0), Rarity::Usual);
    }

    #[test]
    fn test_link_without_query() {
        assert_eq!(timestamped_link("https://youtu.be/dQw4w9WgXcQ", 61.9), "https://youtu.be/dQw4w9WgXcQ?t=61s");
    }

    #[test]
    fn test_clock_format() {
        assert_eq!(format_clock(0.0), "00:00");
        assert_eq!(format_clock(125.7), "02:05");
        assert_eq!(format_clock(3725.0), "1:02:05");
    }

    #[test]
    fn test_json_shape() {
        let segment = segment_timeline(60.0, 1).unwrap()[0];
        let doc = compose_token_metadata(&ctx(), &segment, "s", "c", 0.9);
        let json: serde_json::Value = serde_json::from_slice(&doc.to_json_bytes().unwrap()).unwrap();
        assert_eq!(json["attributes"][4]["trait_type"], "Quality Score");
        assert_eq!(json["attributes"][4]["value"], 0.9);
        assert_eq!(json["attributes"][5]["value"], "Epic");
        assert!(json["attributes"][5].get("display_type").is_none());
    }
}
