//! Container rebuild with mkvmerge.
//!
//! Used once, when tsMuxeR cannot detect the H.264 frame rate. Remuxing the
//! extracted streams with an explicit default duration gives tsMuxeR a
//! container it can read.

use std::fs;
use std::path::Path;

use crate::errors::{ConvertError, ConvertResult};
use crate::extraction::ExtractedStreams;
use crate::logging::RunLogger;
use crate::models::AudioCodec;
use crate::tools::{CommandRunner, Invocation, Tool, Toolchain};

/// mkvmerge exit code for "finished with warnings".
const MKVMERGE_WARNING_EXIT: i32 = 1;

/// Build the mkvmerge command for the rebuilt container.
///
/// ```text
/// mkvmerge -o <rebuilt> --default-duration 0:<fps>fps <video> [--aac-is-sbr 0:0] <audio>
/// ```
pub fn build_rebuild_invocation(
    mkvmerge: &Path,
    rebuilt: &Path,
    fps: &str,
    video: &Path,
    audio: &Path,
    audio_codec: AudioCodec,
) -> Invocation {
    let mut invocation = Invocation::new(mkvmerge)
        .arg("-o")
        .path_arg(rebuilt)
        .arg("--default-duration")
        .arg(format!("0:{}fps", fps))
        .path_arg(video);

    if audio_codec == AudioCodec::Aac {
        invocation = invocation.arg("--aac-is-sbr").arg("0:0");
    }

    invocation.path_arg(audio)
}

/// Rebuild a Matroska container from the extracted streams.
///
/// On success the input streams are removed, since the next extraction
/// pass rewrites them from the rebuilt container. On failure the partial
/// container is removed.
pub fn rebuild_container<R: CommandRunner + ?Sized>(
    runner: &R,
    tools: &Toolchain,
    streams: &ExtractedStreams,
    fps: &str,
    rebuilt: &Path,
    logger: &RunLogger,
) -> ConvertResult<()> {
    let invocation = build_rebuild_invocation(
        tools.require(Tool::MkvMerge)?,
        rebuilt,
        fps,
        &streams.video,
        &streams.audio,
        streams.audio_codec,
    );
    logger.command(&invocation.display());

    let output = runner
        .run(&invocation)
        .map_err(|e| ConvertError::io_error("running mkvmerge", e))?;
    logger.tool_output(&output.combined());

    match output.exit_code {
        Some(0) => {}
        Some(MKVMERGE_WARNING_EXIT) => {
            logger.warn("mkvmerge finished with warnings");
        }
        _ => {
            remove_quietly(rebuilt, logger);
            return Err(ConvertError::RebuildFailed {
                message: format!("mkvmerge exited with code {}", output.code()),
                output,
            });
        }
    }

    remove_quietly(&streams.video, logger);
    remove_quietly(&streams.audio, logger);

    logger.info(&format!("Rebuilt container at {}", rebuilt.display()));
    Ok(())
}

fn remove_quietly(path: &Path, logger: &RunLogger) {
    match fs::remove_file(path) {
        Ok(()) => logger.debug(&format!("Removed {}", path.display())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => logger.warn(&format!("Could not remove {}: {}", path.display(), e)),
    }
}
