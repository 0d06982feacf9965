//! tsMuxeR invocation and failure classification.

use std::path::Path;

use crate::errors::{ConvertError, ConvertResult};
use crate::logging::RunLogger;
use crate::tools::{CommandRunner, Invocation, Tool, Toolchain, ToolOutput};

/// Both lines tsMuxeR prints when it cannot find the H.264 frame rate.
const FPS_NOT_FOUND: &str = "frame rate: not found";
const NO_FPS_FIELD: &str = "h.264 stream does not contain fps field";

/// Result of one tsMuxeR run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MuxOutcome {
    /// Output written.
    Muxed,
    /// Failed with the frame-rate detection signature; a rebuilt container
    /// may succeed.
    FrameRateUndetected(ToolOutput),
    /// Any other failure.
    Failed(ToolOutput),
}

/// `MuxFailed` carrying the tsMuxeR output.
pub fn mux_failed(output: ToolOutput) -> ConvertError {
    ConvertError::MuxFailed {
        message: format!("tsMuxeR exited with code {}", output.code()),
        output,
    }
}

/// Whether tsMuxeR output carries the frame-rate detection failure.
///
/// Both lines must be present; either one alone is an ordinary failure.
pub fn is_frame_rate_failure(output: &str) -> bool {
    let lower = output.to_lowercase();
    lower.contains(FPS_NOT_FOUND) && lower.contains(NO_FPS_FIELD)
}

/// Classify a finished tsMuxeR run.
pub fn classify(output: ToolOutput) -> MuxOutcome {
    if output.success() {
        MuxOutcome::Muxed
    } else if is_frame_rate_failure(&output.combined()) {
        MuxOutcome::FrameRateUndetected(output)
    } else {
        MuxOutcome::Failed(output)
    }
}

/// Build `tsMuxeR <meta> <output>`.
pub fn build_tsmuxer_invocation(tsmuxer: &Path, meta: &Path, output: &Path) -> Invocation {
    Invocation::new(tsmuxer).path_arg(meta).path_arg(output)
}

/// Run tsMuxeR once.
///
/// Refuses to run when `output` already exists so a previous result is
/// never overwritten.
pub fn run_tsmuxer<R: CommandRunner + ?Sized>(
    runner: &R,
    tools: &Toolchain,
    meta: &Path,
    output: &Path,
    logger: &RunLogger,
) -> ConvertResult<MuxOutcome> {
    if output.exists() {
        return Err(ConvertError::invalid_output(output, "file already exists"));
    }

    let invocation = build_tsmuxer_invocation(tools.require(Tool::TsMuxer)?, meta, output);
    logger.command(&invocation.display());

    let result = runner
        .run(&invocation)
        .map_err(|e| ConvertError::io_error("running tsMuxeR", e))?;
    logger.tool_output(&result.combined());

    Ok(classify(result))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failed(stdout: &str) -> ToolOutput {
        ToolOutput {
            exit_code: Some(1),
            stdout: stdout.to_string(),
            stderr: String::new(),
        }
    }

    #[test]
    fn signature_needs_both_lines() {
        let both = "Decoding H264 stream (track 1): Frame rate: not found\n\
                    H.264 stream does not contain fps field. Muxing fps=25";
        assert!(is_frame_rate_failure(both));
        assert!(is_frame_rate_failure(&both.to_uppercase()));
        assert!(!is_frame_rate_failure("Frame rate: not found"));
        assert!(!is_frame_rate_failure("H.264 stream does not contain fps field"));
    }

    #[test]
    fn classify_outcomes() {
        let ok = ToolOutput {
            exit_code: Some(0),
            ..Default::default()
        };
        assert_eq!(classify(ok), MuxOutcome::Muxed);

        let fps = failed("Frame rate: not found\nH.264 stream does not contain fps field");
        assert!(matches!(classify(fps), MuxOutcome::FrameRateUndetected(_)));

        let other = failed("Can't open file");
        match classify(other) {
            MuxOutcome::Failed(output) => {
                let err = mux_failed(output);
                assert!(matches!(err, ConvertError::MuxFailed { .. }));
                assert!(err.to_string().contains("code 1"));
            }
            outcome => panic!("expected Failed, got {:?}", outcome),
        }
    }

    #[test]
    fn invocation_is_meta_then_output() {
        let inv = build_tsmuxer_invocation(
            Path::new("/opt/tsMuxeR"),
            Path::new("/tmp/tsmuxer.meta"),
            Path::new("/out/movie.m2ts"),
        );
        assert_eq!(inv.args_lossy(), vec!["/tmp/tsmuxer.meta", "/out/movie.m2ts"]);
    }
}
