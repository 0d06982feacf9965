//! Conversion driver.
//!
//! Runs the stages in order through the state machine, takes the rebuild
//! fallback at most once, and cleans up temp files exactly once on every
//! path out of a run.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::audio::transcode_dts_to_ac3;
use crate::config::Settings;
use crate::errors::{ConvertError, ConvertResult};
use crate::extraction::{extract_streams, ExtractedStreams};
use crate::inspect::inspect;
use crate::logging::RunLogger;
use crate::models::{AudioCodec, MediaSummary, Session};
use crate::mux::{mux_failed, rebuild_container, run_tsmuxer, MetaBuilder, MuxOutcome};
use crate::params::{resolve, ConvertRequest, ResolvedParams};
use crate::tools::{CommandRunner, Tool, Toolchain};

use super::cleanup::{CleanupReport, TempFiles};
use super::state::{PipelineEvent, PipelineState, StateMachine};

/// Result of a successful conversion.
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Written transport stream.
    pub output_path: PathBuf,
    /// Streams that were converted.
    pub media: MediaSummary,
    /// Whether the container rebuild fallback ran.
    pub rebuilt: bool,
    /// States visited, in order.
    pub states: Vec<PipelineState>,
    /// Temp file removal results.
    pub cleanup: CleanupReport,
    /// Warnings logged during the run.
    pub warnings: Vec<String>,
}

/// Drives one conversion through the external toolchain.
pub struct Converter<'a, R: CommandRunner + ?Sized> {
    runner: &'a R,
    settings: &'a Settings,
    logger: &'a RunLogger,
}

impl<'a, R: CommandRunner + ?Sized> Converter<'a, R> {
    pub fn new(runner: &'a R, settings: &'a Settings, logger: &'a RunLogger) -> Self {
        Self {
            runner,
            settings,
            logger,
        }
    }

    /// Resolve paths, locate tools and convert.
    pub fn run(&self, request: &ConvertRequest) -> ConvertResult<RunSummary> {
        self.logger.phase("Prepare");
        let params = resolve(request).inspect_err(|e| self.logger.error(&e.to_string()))?;
        let tools = Toolchain::locate(&self.settings.tools)
            .inspect_err(|e| self.logger.error(&e.to_string()))?;
        self.run_with(params, tools)
    }

    /// Convert with already resolved paths and tools.
    pub fn run_with(&self, params: ResolvedParams, tools: Toolchain) -> ConvertResult<RunSummary> {
        self.logger.info(&format!(
            "Converting {} -> {}",
            params.input_path.display(),
            params.output_path.display()
        ));

        let mut machine = StateMachine::new();
        let mut temp = TempFiles::new(&params.temp_dir);

        let result = self.drive(params, tools, &mut machine, &mut temp);
        if result.is_err() {
            machine.fail();
        }

        let cleanup = temp.cleanup(self.logger);
        self.logger.debug(&format!("States: {:?}", machine.history()));

        match result {
            Ok(session) => {
                self.logger.success(&format!(
                    "Wrote {}",
                    session.params.output_path.display()
                ));
                Ok(RunSummary {
                    rebuilt: session.rebuilt_container().is_some(),
                    output_path: session.params.output_path,
                    media: session.media,
                    states: machine.history().to_vec(),
                    cleanup,
                    warnings: self.logger.warnings(),
                })
            }
            Err(e) => {
                self.logger.error(&e.to_string());
                self.logger.show_tail("tool output");
                Err(e)
            }
        }
    }

    /// Run only the inspection stage and return the selection.
    pub fn inspect_only(&self, input: &Path) -> ConvertResult<MediaSummary> {
        if !input.is_file() {
            return Err(ConvertError::InvalidInput(input.to_path_buf()));
        }
        let tools = Toolchain::locate_tools(&self.settings.tools, &[Tool::MediaInfo], &[])?;

        self.logger.phase("Inspect");
        inspect(
            self.runner,
            &tools,
            input,
            self.settings.audio.selection,
            self.logger,
        )
    }

    fn drive(
        &self,
        params: ResolvedParams,
        tools: Toolchain,
        machine: &mut StateMachine,
        temp: &mut TempFiles,
    ) -> ConvertResult<Session> {
        self.logger.phase("Inspect");
        let media = inspect(
            self.runner,
            &tools,
            &params.input_path,
            self.settings.audio.selection,
            self.logger,
        )?;
        machine.apply(PipelineEvent::Inspected)?;

        let mut session = Session::new(params, tools, media);

        loop {
            let streams = self.extract(&session, temp)?;
            machine.apply(PipelineEvent::Extracted)?;

            let streams = self.prepare_audio(&session, streams, temp)?;
            machine.apply(PipelineEvent::AudioReady)?;

            self.logger.phase("Mux");
            let meta = temp.meta();
            MetaBuilder::new(
                &streams.video,
                session.media.video.level,
                &session.media.video.fps,
                &streams.audio,
                streams.audio_codec,
            )
            .write(&meta)?;
            machine.apply(PipelineEvent::MuxStarted)?;

            let output_path = session.params.output_path.clone();
            match run_tsmuxer(self.runner, &session.tools, &meta, &output_path, self.logger)? {
                MuxOutcome::Muxed => {
                    machine.apply(PipelineEvent::Muxed)?;
                    return Ok(session);
                }
                MuxOutcome::FrameRateUndetected(output) => {
                    self.remove_partial_output(&output_path);
                    if machine.apply(PipelineEvent::FrameRateUndetected)?
                        != PipelineState::Rebuilding
                    {
                        return Err(mux_failed(output));
                    }

                    self.logger
                        .warn("tsMuxeR could not detect the frame rate, rebuilding the container");
                    self.logger.phase("Rebuild");
                    let rebuilt = temp.rebuilt_container();
                    rebuild_container(
                        self.runner,
                        &session.tools,
                        &streams,
                        &session.media.video.fps,
                        &rebuilt,
                        self.logger,
                    )?;
                    session.set_rebuilt_container(rebuilt);
                }
                MuxOutcome::Failed(output) => {
                    self.remove_partial_output(&output_path);
                    return Err(mux_failed(output));
                }
            }
        }
    }

    fn extract(&self, session: &Session, temp: &mut TempFiles) -> ConvertResult<ExtractedStreams> {
        self.logger.phase("Extract");
        let source = session.extraction_source();
        let video = temp.video();
        let audio = temp.audio(source.audio_codec);
        extract_streams(self.runner, &session.tools, &source, &video, &audio, self.logger)
    }

    /// Convert DTS to AC3; other codecs pass through unchanged.
    fn prepare_audio(
        &self,
        session: &Session,
        streams: ExtractedStreams,
        temp: &mut TempFiles,
    ) -> ConvertResult<ExtractedStreams> {
        if !streams.audio_codec.needs_transcode() {
            return Ok(streams);
        }

        self.logger.phase("Convert audio");
        if let Some(dts) = &session.media.audio.dts {
            self.logger.info(&format!(
                "DTS source: {} kbps, {} channels",
                dts.bitrate_kbps, dts.channels
            ));
        }

        let ac3 = temp.audio(AudioCodec::Ac3);
        transcode_dts_to_ac3(
            self.runner,
            &session.tools,
            &self.settings.audio,
            &streams.audio,
            &ac3,
            self.logger,
        )?;

        Ok(ExtractedStreams {
            video: streams.video,
            audio: ac3,
            audio_codec: AudioCodec::Ac3,
        })
    }

    fn remove_partial_output(&self, output_path: &Path) {
        match fs::remove_file(output_path) {
            Ok(()) => self
                .logger
                .debug(&format!("Removed partial output {}", output_path.display())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => self.logger.warn(&format!(
                "Could not remove partial output {}: {}",
                output_path.display(),
                e
            )),
        }
    }
}
