//! Data models for mkv2m2ts.
//!
//! - Media structures (selected video/audio streams, codecs, levels)
//! - The per-run session record

mod media;
mod session;

pub use media::{
    AudioCodec, AudioSelection, AudioStream, DtsDetails, MediaSummary, VideoLevel, VideoStream,
    AVC_CODEC_ID,
};
pub use session::{ExtractionSource, Session};
