//! Configuration management for mkv2m2ts.
//!
//! This module provides:
//! - TOML-based configuration with logical sections
//! - Defaults for every field, so the file is optional
//!
//! # Example
//!
//! ```no_run
//! use mkv2m2ts_core::config::ConfigManager;
//!
//! let mut config = ConfigManager::new("mkv2m2ts.toml");
//! config.load_or_default().unwrap();
//!
//! println!("AC3 bitrate: {}", config.settings().audio.ac3_bitrate_kbps);
//! ```
//!
//! ```toml
//! [tools]
//! tsmuxer = "/opt/tsmuxer/tsMuxeR"
//!
//! [audio]
//! selection = "first-match"   # or "codec-priority"
//! ac3_bitrate_kbps = 640
//! decoder_output = "wavall"
//!
//! [logging]
//! level = "info"
//! error_tail = 20
//! ```

mod manager;
mod settings;

pub use manager::{parse_settings, ConfigError, ConfigManager, ConfigResult};
pub use settings::{AudioSettings, LoggingSettings, Settings, ToolSettings};
