//! Media inspection.
//!
//! Runs mediainfo, parses its XML report into a typed tree and picks the
//! video and audio streams to convert.

mod mediainfo;
mod queries;
mod report;

pub use mediainfo::{build_mediainfo_invocation, inspect, run_mediainfo, summarize};
pub use queries::{
    is_english_or_unspecified, parse_bitrate_kbps, parse_channels, parse_fps, parse_level,
    parse_track_index, query, query_text, Query,
};
pub use report::{MediaReport, ReportTrack, TrackKind};
