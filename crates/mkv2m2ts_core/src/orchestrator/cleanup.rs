//! Temp file registry and cleanup.
//!
//! Stages ask the registry for the path of each intermediate file before
//! writing it, so cleanup only touches files a reached stage may have
//! created. Names are fixed; two runs sharing a temp directory collide.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::logging::RunLogger;
use crate::models::AudioCodec;

/// Extracted H.264 elementary stream.
pub const VIDEO_FILE: &str = "video.h264";
/// tsMuxeR descriptor.
pub const META_FILE: &str = "tsmuxer.meta";
/// Container written by the rebuild fallback.
pub const REBUILT_FILE: &str = "rebuilt.mkv";

/// Audio stream file name for a codec (`audio.dts`, `audio.ac3`, `audio.aac`).
pub fn audio_file_name(codec: AudioCodec) -> String {
    format!("audio.{}", codec.extension())
}

/// Intermediate files of one run.
#[derive(Debug)]
pub struct TempFiles {
    dir: PathBuf,
    registered: Vec<PathBuf>,
}

impl TempFiles {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            registered: Vec::new(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Register and return the video stream path.
    pub fn video(&mut self) -> PathBuf {
        self.track(VIDEO_FILE)
    }

    /// Register and return the audio stream path for `codec`.
    pub fn audio(&mut self, codec: AudioCodec) -> PathBuf {
        self.track(&audio_file_name(codec))
    }

    /// Register and return the descriptor path.
    pub fn meta(&mut self) -> PathBuf {
        self.track(META_FILE)
    }

    /// Register and return the rebuilt container path.
    pub fn rebuilt_container(&mut self) -> PathBuf {
        self.track(REBUILT_FILE)
    }

    /// Register a file name inside the temp directory.
    pub fn track(&mut self, name: &str) -> PathBuf {
        let path = self.dir.join(name);
        if !self.registered.contains(&path) {
            self.registered.push(path.clone());
        }
        path
    }

    /// Registered paths in registration order.
    pub fn registered(&self) -> &[PathBuf] {
        &self.registered
    }

    /// Remove every registered file.
    ///
    /// Never fails: absent files and removal errors become warnings.
    /// Consumes the registry so it can only run once.
    pub fn cleanup(self, logger: &RunLogger) -> CleanupReport {
        logger.phase("Cleanup");
        let mut report = CleanupReport::default();

        for path in self.registered {
            match fs::remove_file(&path) {
                Ok(()) => {
                    logger.debug(&format!("Removed {}", path.display()));
                    report.removed.push(path);
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    logger.warn(&format!("Temp file {} was not found", path.display()));
                    report.missing.push(path);
                }
                Err(e) => {
                    logger.warn(&format!("Could not remove {}: {}", path.display(), e));
                    report.failed.push(path);
                }
            }
        }

        report
    }
}

/// What cleanup did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleanupReport {
    pub removed: Vec<PathBuf>,
    pub missing: Vec<PathBuf>,
    pub failed: Vec<PathBuf>,
}

impl CleanupReport {
    /// Whether every registered file was removed.
    pub fn is_clean(&self) -> bool {
        self.missing.is_empty() && self.failed.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn paths_follow_fixed_layout() {
        let mut temp = TempFiles::new("/tmp/work/");
        assert_eq!(temp.video(), PathBuf::from("/tmp/work/video.h264"));
        assert_eq!(temp.audio(AudioCodec::Dts), PathBuf::from("/tmp/work/audio.dts"));
        assert_eq!(temp.audio(AudioCodec::Aac), PathBuf::from("/tmp/work/audio.aac"));
        assert_eq!(temp.meta(), PathBuf::from("/tmp/work/tsmuxer.meta"));
        assert_eq!(temp.rebuilt_container(), PathBuf::from("/tmp/work/rebuilt.mkv"));
    }

    #[test]
    fn registration_is_deduplicated() {
        let mut temp = TempFiles::new("/tmp");
        temp.video();
        temp.audio(AudioCodec::Ac3);
        temp.video();
        temp.audio(AudioCodec::Ac3);
        assert_eq!(temp.registered().len(), 2);
    }

    #[test]
    fn cleanup_removes_files_and_tolerates_missing() {
        let dir = tempdir().unwrap();
        let mut temp = TempFiles::new(dir.path());
        let video = temp.video();
        let meta = temp.meta();
        let audio = temp.audio(AudioCodec::Ac3);
        fs::write(&video, b"h264").unwrap();
        fs::write(&meta, b"MUXOPT").unwrap();

        let unrelated = dir.path().join("keep.txt");
        fs::write(&unrelated, b"keep").unwrap();

        let logger = RunLogger::default();
        let report = temp.cleanup(&logger);

        assert_eq!(report.removed, vec![video.clone(), meta.clone()]);
        assert_eq!(report.missing, vec![audio]);
        assert!(!report.is_clean());
        assert!(!video.exists());
        assert!(!meta.exists());
        assert!(unrelated.exists());
        assert_eq!(logger.warnings().len(), 1);
    }
}
