//! File search abstraction.
//!
//! This module provides a `FileSearch` trait for querying a Usenet file
//! index, plus the decoding that turns raw provider rows into
//! credential-free [`SearchCandidate`]s.

pub mod decode;
mod easynews;
mod types;

pub use decode::{materialize_stream_url, to_candidate, RawResultRow, SearchResponse};
pub use easynews::{EasynewsClient, VIDEO_EXTENSIONS};
pub use types::*;
