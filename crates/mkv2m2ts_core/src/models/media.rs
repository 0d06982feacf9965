//! Media-related data structures (selected streams, codecs, levels).

use std::fmt;

use serde::{Deserialize, Serialize};

/// Matroska codec ID of the only accepted video codec.
pub const AVC_CODEC_ID: &str = "V_MPEG4/ISO/AVC";

/// Audio codecs the pipeline can deliver to the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AudioCodec {
    /// DTS, converted to AC3 before muxing.
    #[serde(rename = "DTS")]
    Dts,
    /// Dolby Digital, muxed as is.
    #[serde(rename = "AC3")]
    Ac3,
    /// AAC, muxed as is.
    #[serde(rename = "AAC")]
    Aac,
}

impl AudioCodec {
    /// Map a Matroska codec ID to a supported codec.
    ///
    /// AAC is reported with profile suffixes (`A_AAC/MPEG4/LC`, `A_AAC-2`),
    /// so any `A_AAC` prefix is accepted.
    pub fn from_codec_id(codec_id: &str) -> Option<Self> {
        let codec_id = codec_id.trim();
        if codec_id.eq_ignore_ascii_case("A_DTS") {
            Some(AudioCodec::Dts)
        } else if codec_id.eq_ignore_ascii_case("A_AC3") {
            Some(AudioCodec::Ac3)
        } else if codec_id.to_ascii_uppercase().starts_with("A_AAC") {
            Some(AudioCodec::Aac)
        } else {
            None
        }
    }

    /// Matroska/tsMuxeR codec identifier.
    pub fn codec_id(self) -> &'static str {
        match self {
            AudioCodec::Dts => "A_DTS",
            AudioCodec::Ac3 => "A_AC3",
            AudioCodec::Aac => "A_AAC",
        }
    }

    /// Elementary stream file extension.
    pub fn extension(self) -> &'static str {
        match self {
            AudioCodec::Dts => "dts",
            AudioCodec::Ac3 => "ac3",
            AudioCodec::Aac => "aac",
        }
    }

    /// Codec that ends up in the output (DTS is delivered as AC3).
    pub fn delivered(self) -> Self {
        match self {
            AudioCodec::Dts => AudioCodec::Ac3,
            other => other,
        }
    }

    /// Whether this codec must go through the decoder/encoder pair.
    pub fn needs_transcode(self) -> bool {
        self == AudioCodec::Dts
    }

    /// Rank under the codec-priority selection policy (lower wins).
    pub fn priority(self) -> u8 {
        match self {
            AudioCodec::Dts => 0,
            AudioCodec::Ac3 => 1,
            AudioCodec::Aac => 2,
        }
    }
}

impl fmt::Display for AudioCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AudioCodec::Dts => "DTS",
            AudioCodec::Ac3 => "AC3",
            AudioCodec::Aac => "AAC",
        };
        f.write_str(name)
    }
}

/// How the audio track is picked among language-matching tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AudioSelection {
    /// First supported track in report order.
    #[default]
    FirstMatch,
    /// DTS over AC3 over AAC; report order breaks ties.
    CodecPriority,
}

/// H.264 level as `major.minor` (e.g. 4.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VideoLevel {
    pub major: u8,
    pub minor: u8,
}

impl VideoLevel {
    /// Level forced by the descriptor override.
    pub const OVERRIDE: VideoLevel = VideoLevel { major: 4, minor: 1 };

    pub const fn new(major: u8, minor: u8) -> Self {
        Self { major, minor }
    }

    /// Whether the descriptor carries the `level=4.1` override.
    ///
    /// True for exactly 4.1 (a no-op rewrite) and for anything above 5.
    pub fn needs_override(self) -> bool {
        self == Self::OVERRIDE || self > VideoLevel::new(5, 0)
    }
}

impl fmt::Display for VideoLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl Serialize for VideoLevel {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// The selected video stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VideoStream {
    /// 0-based index for mkvextract (report ID - 1).
    pub track_index: usize,
    /// Matroska codec ID (always [`AVC_CODEC_ID`] once validated).
    pub codec_id: String,
    /// H.264 level from the format profile.
    pub level: VideoLevel,
    /// Frame rate exactly as reported, e.g. `"23.976"`.
    pub fps: String,
}

/// DTS-only properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DtsDetails {
    /// Source bitrate in kbps.
    pub bitrate_kbps: u32,
    /// Channel count (informational).
    pub channels: u8,
}

/// The selected audio stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AudioStream {
    /// 0-based index for mkvextract (report ID - 1).
    pub track_index: usize,
    /// Source codec.
    pub codec: AudioCodec,
    /// Reported language, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Present when `codec` is DTS.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dts: Option<DtsDetails>,
}

/// Everything the inspector derives from the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediaSummary {
    /// General track format (e.g. "Matroska").
    pub container: String,
    /// Selected video stream.
    pub video: VideoStream,
    /// Selected audio stream.
    pub audio: AudioStream,
}
