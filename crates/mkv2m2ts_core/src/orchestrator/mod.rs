//! Orchestrator: runs a conversion end to end.
//!
//! - [`Converter`] sequences the stages against a [`CommandRunner`](crate::tools::CommandRunner)
//! - [`StateMachine`] enforces stage order and the single rebuild attempt
//! - [`TempFiles`] tracks intermediate files and removes them once at the end
//!
//! # Example
//!
//! ```no_run
//! use mkv2m2ts_core::config::Settings;
//! use mkv2m2ts_core::logging::RunLogger;
//! use mkv2m2ts_core::orchestrator::Converter;
//! use mkv2m2ts_core::params::ConvertRequest;
//! use mkv2m2ts_core::tools::SystemRunner;
//!
//! let settings = Settings::default();
//! let logger = RunLogger::default();
//! let runner = SystemRunner::new();
//!
//! let summary = Converter::new(&runner, &settings, &logger)
//!     .run(&ConvertRequest::new("movie.mkv"))
//!     .unwrap();
//! println!("wrote {}", summary.output_path.display());
//! ```

mod cleanup;
mod pipeline;
mod state;

pub use cleanup::{audio_file_name, CleanupReport, TempFiles, META_FILE, REBUILT_FILE, VIDEO_FILE};
pub use pipeline::{Converter, RunSummary};
pub use state::{InvalidTransition, PipelineEvent, PipelineState, StateMachine};
