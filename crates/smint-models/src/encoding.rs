//! Transcoding parameters for segment artifacts.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Default clip frame rate
pub const DEFAULT_CLIP_FPS: u32 = 5;
/// Default clip width (height keeps aspect ratio)
pub const DEFAULT_CLIP_WIDTH: u32 = 320;
/// Default still frame width
pub const DEFAULT_STILL_WIDTH: u32 = 640;
/// Default JPEG quality for stills (2 best .. 31 worst)
pub const DEFAULT_STILL_QUALITY: u8 = 3;
/// Default scaler used for clips
pub const DEFAULT_SCALE_FLAGS: &str = "fast_bilinear";

/// Parameters for still and clip extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ExtractionParams {
    /// Clip frame rate
    #[serde(default = "default_clip_fps")]
    pub clip_fps: u32,

    /// Clip width in pixels
    #[serde(default = "default_clip_width")]
    pub clip_width: u32,

    /// Still width in pixels
    #[serde(default = "default_still_width")]
    pub still_width: u32,

    /// Still JPEG quality
    #[serde(default = "default_still_quality")]
    pub still_quality: u8,

    /// Scaler flags for the clip filter
    #[serde(default = "default_scale_flags")]
    pub scale_flags: String,
}

fn default_clip_fps() -> u32 {
    DEFAULT_CLIP_FPS
}
fn default_clip_width() -> u32 {
    DEFAULT_CLIP_WIDTH
}
fn default_still_width() -> u32 {
    DEFAULT_STILL_WIDTH
}
fn default_still_quality() -> u8 {
    DEFAULT_STILL_QUALITY
}
fn default_scale_flags() -> String {
    DEFAULT_SCALE_FLAGS.to_string()
}

impl Default for ExtractionParams {
    fn default() -> Self {
        Self {
            clip_fps: DEFAULT_CLIP_FPS,
            clip_width: DEFAULT_CLIP_WIDTH,
            still_width: DEFAULT_STILL_WIDTH,
            still_quality: DEFAULT_STILL_QUALITY,
            scale_flags: DEFAULT_SCALE_FLAGS.to_string(),
        }
    }
}

impl ExtractionParams {
    /// Video filter for the animated clip.
    pub fn clip_filter(&self) -> String {
        format!(
            "fps={},scale={}:-1:flags={}",
            self.clip_fps, self.clip_width, self.scale_flags
        )
    }

    /// Video filter for the still frame.
    pub fn still_filter(&self) -> String {
        format!("scale={}:-2", self.still_width)
    }

    pub fn with_clip_fps(mut self, fps: u32) -> Self {
        self.clip_fps = fps;
        self
    }

    pub fn with_clip_width(mut self, width: u32) -> Self {
        self.clip_width = width;
        self
    }

    pub fn with_still_width(mut self, width: u32) -> Self {
        self.still_width = width;
        self
    }
}
