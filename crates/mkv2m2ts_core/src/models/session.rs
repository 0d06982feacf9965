//! The per-run session record.

use std::path::{Path, PathBuf};

use crate::params::ResolvedParams;
use crate::tools::Toolchain;

use super::media::{AudioCodec, MediaSummary};

/// State carried through one conversion.
///
/// Built once inspection succeeds; the only field written afterwards is
/// `rebuilt_container`, set by the rebuild fallback.
#[derive(Debug, Clone)]
pub struct Session {
    /// Validated input/output/temp paths.
    pub params: ResolvedParams,
    /// Resolved external tools.
    pub tools: Toolchain,
    /// Streams selected by the inspector.
    pub media: MediaSummary,
    /// Container rebuilt by mkvmerge, once the fallback has run.
    rebuilt_container: Option<PathBuf>,
}

impl Session {
    /// Create a session for a freshly inspected input.
    pub fn new(params: ResolvedParams, tools: Toolchain, media: MediaSummary) -> Self {
        Self {
            params,
            tools,
            media,
            rebuilt_container: None,
        }
    }

    /// Path of the rebuilt container, if the fallback ran.
    pub fn rebuilt_container(&self) -> Option<&Path> {
        self.rebuilt_container.as_deref()
    }

    /// Record the rebuilt container. Later extraction reads from it.
    pub fn set_rebuilt_container(&mut self, path: PathBuf) {
        debug_assert!(self.rebuilt_container.is_none(), "container rebuilt twice");
        self.rebuilt_container = Some(path);
    }

    /// Where and what the extractor should read.
    ///
    /// A rebuilt container always holds video as track 0 and the already
    /// delivered audio (AC3 or AAC) as track 1.
    pub fn extraction_source(&self) -> ExtractionSource {
        match &self.rebuilt_container {
            Some(path) => ExtractionSource {
                path: path.clone(),
                video_index: 0,
                audio_index: 1,
                audio_codec: self.media.audio.codec.delivered(),
            },
            None => ExtractionSource {
                path: self.params.input_path.clone(),
                video_index: self.media.video.track_index,
                audio_index: self.media.audio.track_index,
                audio_codec: self.media.audio.codec,
            },
        }
    }
}

/// Container and track indices for one extraction pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionSource {
    /// Container to read.
    pub path: PathBuf,
    /// 0-based video track index.
    pub video_index: usize,
    /// 0-based audio track index.
    pub audio_index: usize,
    /// Codec of the audio track in this container.
    pub audio_codec: AudioCodec,
}
