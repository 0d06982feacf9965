//! Low-level mkvextract command wrapper.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::errors::{ConvertError, ConvertResult};
use crate::logging::RunLogger;
use crate::models::{AudioCodec, ExtractionSource};
use crate::tools::{CommandRunner, Invocation, Tool, Toolchain};

/// Elementary streams written by one extraction pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedStreams {
    /// H.264 elementary stream.
    pub video: PathBuf,
    /// Audio elementary stream.
    pub audio: PathBuf,
    /// Codec of `audio`.
    pub audio_codec: AudioCodec,
}

/// `<index>:<path>` track specification.
fn track_spec(track_index: usize, output_path: &Path) -> OsString {
    let mut spec = OsString::from(format!("{}:", track_index));
    spec.push(output_path.as_os_str());
    spec
}

/// Build `mkvextract <source> tracks <index>:<path>`.
pub fn build_extract_invocation(
    mkvextract: &Path,
    source: &Path,
    track_index: usize,
    output_path: &Path,
) -> Invocation {
    Invocation::new(mkvextract)
        .path_arg(source)
        .arg("tracks")
        .arg(track_spec(track_index, output_path))
}

/// Extract a single track from a Matroska file.
pub fn extract_track<R: CommandRunner + ?Sized>(
    runner: &R,
    tools: &Toolchain,
    source: &Path,
    track_index: usize,
    output_path: &Path,
    logger: &RunLogger,
) -> ConvertResult<()> {
    let invocation = build_extract_invocation(
        tools.require(Tool::MkvExtract)?,
        source,
        track_index,
        output_path,
    );
    logger.command(&invocation.display());

    let output = runner
        .run(&invocation)
        .map_err(|e| ConvertError::io_error("running mkvextract", e))?;
    logger.tool_output(&output.combined());

    if !output.success() {
        return Err(ConvertError::ExtractionFailed {
            message: format!(
                "mkvextract exited with code {} extracting track {} from {}",
                output.code(),
                track_index,
                source.display()
            ),
            output,
        });
    }

    tracing::debug!(
        "Extracted track {} from {} to {}",
        track_index,
        source.display(),
        output_path.display()
    );
    Ok(())
}

/// Extract the selected video and audio tracks.
///
/// Video goes first; an audio failure leaves the video file behind for
/// cleanup to remove.
pub fn extract_streams<R: CommandRunner + ?Sized>(
    runner: &R,
    tools: &Toolchain,
    source: &ExtractionSource,
    video_out: &Path,
    audio_out: &Path,
    logger: &RunLogger,
) -> ConvertResult<ExtractedStreams> {
    extract_track(runner, tools, &source.path, source.video_index, video_out, logger)?;
    extract_track(runner, tools, &source.path, source.audio_index, audio_out, logger)?;

    Ok(ExtractedStreams {
        video: video_out.to_path_buf(),
        audio: audio_out.to_path_buf(),
        audio_codec: source.audio_codec,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invocation_uses_tracks_mode() {
        let inv = build_extract_invocation(
            Path::new("/usr/bin/mkvextract"),
            Path::new("/media/movie.mkv"),
            2,
            Path::new("/tmp/audio.dts"),
        );
        assert_eq!(
            inv.args_lossy(),
            vec!["/media/movie.mkv", "tracks", "2:/tmp/audio.dts"]
        );
    }
}
