//! Elementary stream extraction with mkvextract.

mod mkvextract;

pub use mkvextract::{build_extract_invocation, extract_streams, extract_track, ExtractedStreams};
