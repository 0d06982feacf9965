//! mkv2m2ts Core - MKV to M2TS conversion pipeline
//!
//! This crate contains all conversion logic with zero CLI dependencies.
//! It drives the external toolchain (mediainfo, mkvextract, dcadec, aften,
//! tsMuxeR and optionally mkvmerge) to turn a Matroska file with H.264 video
//! and DTS/AC3/AAC audio into a transport stream for hardware players.

pub mod audio;
pub mod config;
pub mod errors;
pub mod extraction;
pub mod inspect;
pub mod logging;
pub mod models;
pub mod mux;
pub mod orchestrator;
pub mod params;
pub mod tools;

pub use errors::{ConvertError, ConvertResult};

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
