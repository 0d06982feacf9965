//! DTS to AC3 conversion through `dcadec | aften`.
//!
//! The decoder writes audio to stdout, which is connected directly to the
//! encoder's stdin. Both processes are waited on together.
//!
//! Besides the bitrate and verbosity flags the encoder also gets
//! `-readtoeof 1`. A WAV header written to a pipe carries no valid data
//! length, and without the flag aften stops after the length it reads
//! from that header.

use std::path::Path;

use crate::config::AudioSettings;
use crate::errors::{ConvertError, ConvertResult};
use crate::logging::RunLogger;
use crate::tools::{CommandRunner, Invocation, PipedOutput, Tool, Toolchain, ToolOutput};

/// Build `dcadec -o <driver> <dts>`.
pub fn build_decoder_invocation(dcadec: &Path, driver: &str, dts: &Path) -> Invocation {
    Invocation::new(dcadec).arg("-o").arg(driver).path_arg(dts)
}

/// Build `aften -v 0 -readtoeof 1 -b <kbps> - <ac3>`.
///
/// The WAV header coming through a pipe has no valid data size, so the
/// encoder reads until end of input.
pub fn build_encoder_invocation(aften: &Path, bitrate_kbps: u32, ac3: &Path) -> Invocation {
    Invocation::new(aften)
        .arg("-v")
        .arg("0")
        .arg("-readtoeof")
        .arg("1")
        .arg("-b")
        .arg(bitrate_kbps.to_string())
        .arg("-")
        .path_arg(ac3)
}

/// Convert a DTS elementary stream into AC3 at `ac3`.
pub fn transcode_dts_to_ac3<R: CommandRunner + ?Sized>(
    runner: &R,
    tools: &Toolchain,
    settings: &AudioSettings,
    dts: &Path,
    ac3: &Path,
    logger: &RunLogger,
) -> ConvertResult<()> {
    let decoder = build_decoder_invocation(
        tools.require(Tool::DcaDec)?,
        &settings.decoder_output,
        dts,
    );
    let encoder = build_encoder_invocation(
        tools.require(Tool::Aften)?,
        settings.ac3_bitrate_kbps,
        ac3,
    );
    logger.command(&format!("{} | {}", decoder.display(), encoder.display()));

    let piped = runner
        .run_piped(&decoder, &encoder)
        .map_err(|e| ConvertError::io_error("running dcadec | aften", e))?;
    logger.tool_output(&piped.producer.combined());
    logger.tool_output(&piped.consumer.combined());

    if let Some((tool, output)) = pipe_failure(piped) {
        return Err(ConvertError::AudioTranscodeFailed {
            message: format!("{} exited with code {}", tool, output.code()),
            output,
        });
    }

    logger.info(&format!("Converted DTS to AC3 at {} kbps", settings.ac3_bitrate_kbps));
    Ok(())
}

/// Pick the process to blame for a failed pipe.
///
/// A decoder killed by a signal while the encoder also failed was most
/// likely cut off by the encoder closing the pipe.
fn pipe_failure(piped: PipedOutput) -> Option<(Tool, ToolOutput)> {
    let PipedOutput { producer, consumer } = piped;
    match (producer.success(), consumer.success()) {
        (true, true) => None,
        (true, false) => Some((Tool::Aften, consumer)),
        (false, false) if producer.exit_code.is_none() => Some((Tool::Aften, consumer)),
        (false, _) => Some((Tool::DcaDec, producer)),
    }
}
