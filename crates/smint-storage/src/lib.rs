//! Content-addressable artifact publishing.
//!
//! Provides the [`ContentStore`] seam with two implementations:
//! - [`PinataClient`]: multipart uploads to the Pinata v3 files API
//! - [`MemoryStore`]: in-process store keyed by a Keccak-256 digest

pub mod client;
pub mod error;
pub mod memory;
pub mod store;

pub use client::{PinataClient, PinataConfig};
pub use error::{StorageError, StorageResult};
pub use memory::{keccak_cid, MemoryStore};
pub use store::ContentStore;
