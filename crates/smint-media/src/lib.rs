//! FFmpeg CLI wrapper and source download for segment artifacts.
//!
//! This crate provides:
//! - Type-safe transcoder command building
//! - A runner with timeouts, cancellation and stderr capture
//! - Still frame and animated clip extraction per segment
//! - Streaming download of the selected source stream
//! - The per-run temporary workspace

pub mod command;
pub mod download;
pub mod error;
pub mod extract;
pub mod workspace;

pub use command::{check_transcoder, TranscodeCommand, TranscodeRunner};
pub use download::{HttpDownloader, SourceFetcher};
pub use error::{MediaError, MediaResult};
pub use extract::{FfmpegExtractor, SegmentExtractor};
pub use workspace::Workspace;
