//! Upstream collaborators: HTTP fetch, markdown schema extraction and the
//! on-disk dataset layout.

pub mod fetch;
pub mod files;
pub mod markdown;

pub use fetch::{HttpFetcher, SourceFetcher};
pub use markdown::extract_json_block;
