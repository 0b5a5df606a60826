//! Source resolution and interest signals.
//!
//! - [`RapidApiProvider`]: video details (duration, encoded streams)
//! - [`SourceResolver`]: link parsing, duration policy and stream selection
//! - [`HttpOracle`]: weighted interest periods for a link

pub mod error;
pub mod oracle;
pub mod provider;
pub mod resolver;
pub mod types;

pub use error::{SourceError, SourceResult};
pub use oracle::{HttpOracle, InterestOracle, OracleConfig};
pub use provider::{ProviderConfig, RapidApiProvider, VideoMetadataProvider};
pub use resolver::{select_stream, SourceResolver};
pub use types::VideoDetails;
