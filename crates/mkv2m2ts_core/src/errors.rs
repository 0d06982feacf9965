//! Error types for the conversion pipeline.
//!
//! Every error is fatal to a run. Failures of external tools carry the
//! captured tool output so the caller can print it under the error line.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;
use crate::orchestrator::InvalidTransition;
use crate::tools::ToolOutput;

/// Error raised by any stage of the conversion pipeline.
#[derive(Error, Debug)]
pub enum ConvertError {
    /// The input file does not exist.
    #[error("Input file not found: {}", .0.display())]
    InvalidInput(PathBuf),

    /// The output path cannot be used.
    #[error("Invalid output path {}: {reason}", path.display())]
    InvalidOutput { path: PathBuf, reason: String },

    /// The temp directory does not exist.
    #[error("Temp directory not found: {}", .0.display())]
    InvalidTempDir(PathBuf),

    /// A required external tool could not be located.
    #[error("Required tool '{0}' not found")]
    MissingDependency(String),

    /// The input is not a Matroska container.
    #[error("Unsupported container format '{0}', expected Matroska")]
    UnsupportedContainer(String),

    /// The video track is not H.264.
    #[error("Unsupported video codec '{0}', expected V_MPEG4/ISO/AVC")]
    UnsupportedVideoCodec(String),

    /// A report field is absent or malformed.
    #[error("Failed to parse {field}: {message}")]
    ParseError { field: String, message: String },

    /// mediainfo itself failed to produce a report.
    #[error("mediainfo failed: {message}")]
    InspectionFailed { message: String, output: ToolOutput },

    /// No English/unspecified DTS, AC3 or AAC audio track was found.
    #[error("No supported audio track found (DTS, AC3 or AAC in English or unspecified language)")]
    NoSupportedAudioTrack,

    /// mkvextract failed.
    #[error("Extraction failed: {message}")]
    ExtractionFailed { message: String, output: ToolOutput },

    /// dcadec or aften failed.
    #[error("Audio transcode failed: {message}")]
    AudioTranscodeFailed { message: String, output: ToolOutput },

    /// File I/O error.
    #[error("I/O error while {operation}: {source}")]
    IOError {
        operation: String,
        #[source]
        source: io::Error,
    },

    /// tsMuxeR failed.
    #[error("Mux failed: {message}")]
    MuxFailed { message: String, output: ToolOutput },

    /// mkvmerge failed to rebuild the fallback container.
    #[error("Container rebuild failed: {message}")]
    RebuildFailed { message: String, output: ToolOutput },

    /// The settings file could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A stage reported an event the pipeline state does not accept.
    #[error(transparent)]
    State(#[from] InvalidTransition),
}

impl ConvertError {
    /// Create an invalid output error.
    pub fn invalid_output(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::InvalidOutput {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a parse error for a report field.
    pub fn parse_error(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ParseError {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create an I/O error with context.
    pub fn io_error(operation: impl Into<String>, source: io::Error) -> Self {
        Self::IOError {
            operation: operation.into(),
            source,
        }
    }

    /// Captured output of the external tool that caused this error, if any.
    pub fn tool_output(&self) -> Option<&ToolOutput> {
        match self {
            Self::InspectionFailed { output, .. }
            | Self::ExtractionFailed { output, .. }
            | Self::AudioTranscodeFailed { output, .. }
            | Self::MuxFailed { output, .. }
            | Self::RebuildFailed { output, .. } => Some(output),
            _ => None,
        }
    }
}

/// Result type for pipeline operations.
pub type ConvertResult<T> = Result<T, ConvertError>;
