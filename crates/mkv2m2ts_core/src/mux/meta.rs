//! tsMuxeR descriptor (`.meta`) builder.
//!
//! The descriptor has three lines:
//!
//! ```text
//! MUXOPT --no-pcr-on-video-pid --new-audio-pes --vbr --vbv-len=500
//! V_MPEG4/ISO/AVC, "/tmp/video.h264", level=4.1, insertSEI, contSPS, lang=eng, fps=23.976
//! A_AC3, "/tmp/audio.ac3"
//! ```
//!
//! The `level=4.1` override is only written when [`VideoLevel::needs_override`]
//! holds for the source level.

use std::fs;
use std::path::Path;

use crate::errors::{ConvertError, ConvertResult};
use crate::models::{AudioCodec, VideoLevel, AVC_CODEC_ID};

/// Global mux options for player-compatible output.
pub const MUX_OPTIONS: &str = "MUXOPT --no-pcr-on-video-pid --new-audio-pes --vbr --vbv-len=500";

/// Builder for the tsMuxeR descriptor text.
pub struct MetaBuilder<'a> {
    video_path: &'a Path,
    level: VideoLevel,
    fps: &'a str,
    audio_path: &'a Path,
    audio_codec: AudioCodec,
}

impl<'a> MetaBuilder<'a> {
    /// Create a builder for the given streams.
    ///
    /// `audio_codec` is the codec actually present in `audio_path` (AC3 or
    /// AAC; DTS is converted before muxing).
    pub fn new(
        video_path: &'a Path,
        level: VideoLevel,
        fps: &'a str,
        audio_path: &'a Path,
        audio_codec: AudioCodec,
    ) -> Self {
        Self {
            video_path,
            level,
            fps,
            audio_path,
            audio_codec,
        }
    }

    /// Render the descriptor text.
    pub fn build(&self) -> String {
        let mut video_line = format!("{}, \"{}\", ", AVC_CODEC_ID, self.video_path.display());
        if self.level.needs_override() {
            video_line.push_str(&format!("level={}, ", VideoLevel::OVERRIDE));
        }
        video_line.push_str(&format!("insertSEI, contSPS, lang=eng, fps={}", self.fps));

        let audio_line = format!(
            "{}, \"{}\"",
            self.audio_codec.codec_id(),
            self.audio_path.display()
        );

        format!("{}\n{}\n{}\n", MUX_OPTIONS, video_line, audio_line)
    }

    /// Write the descriptor to `meta_path`, replacing any existing file.
    pub fn write(&self, meta_path: &Path) -> ConvertResult<()> {
        let content = self.build();
        fs::write(meta_path, &content).map_err(|e| {
            ConvertError::io_error(format!("writing {}", meta_path.display()), e)
        })?;
        tracing::debug!("Wrote tsMuxeR descriptor to {}", meta_path.display());
        Ok(())
    }
}
