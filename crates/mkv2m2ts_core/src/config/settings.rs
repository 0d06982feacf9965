//! Settings struct with TOML-based sections.
//!
//! Every field has a default, so an empty or partial file is valid.

use serde::{Deserialize, Serialize};

use crate::logging::LogLevel;
use crate::models::AudioSelection;
use crate::tools::Tool;

/// Root settings structure containing all configuration sections.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Executable overrides.
    #[serde(default)]
    pub tools: ToolSettings,

    /// Audio selection and transcoding.
    #[serde(default)]
    pub audio: AudioSettings,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Per-tool executable overrides.
///
/// Each value is either an absolute path or a program name searched on
/// `PATH`. Unset tools use their default program name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mediainfo: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mkvextract: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dcadec: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aften: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tsmuxer: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mkvmerge: Option<String>,
}

impl ToolSettings {
    /// Configured override for a tool (empty strings are ignored).
    pub fn override_for(&self, tool: Tool) -> Option<&str> {
        let value = match tool {
            Tool::MediaInfo => &self.mediainfo,
            Tool::MkvExtract => &self.mkvextract,
            Tool::DcaDec => &self.dcadec,
            Tool::Aften => &self.aften,
            Tool::TsMuxer => &self.tsmuxer,
            Tool::MkvMerge => &self.mkvmerge,
        };
        value.as_deref().map(str::trim).filter(|v| !v.is_empty())
    }
}

/// Audio track selection and DTS transcoding settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioSettings {
    /// How the audio track is chosen among English/unspecified tracks.
    #[serde(default)]
    pub selection: AudioSelection,

    /// AC3 bitrate in kbps for converted DTS.
    #[serde(default = "default_ac3_bitrate")]
    pub ac3_bitrate_kbps: u32,

    /// dcadec output driver (`-o` value) writing decoded audio to stdout.
    #[serde(default = "default_decoder_output")]
    pub decoder_output: String,
}

fn default_ac3_bitrate() -> u32 {
    640
}

fn default_decoder_output() -> String {
    "wavall".to_string()
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            selection: AudioSelection::default(),
            ac3_bitrate_kbps: default_ac3_bitrate(),
            decoder_output: default_decoder_output(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Default log level when `RUST_LOG` is not set.
    #[serde(default)]
    pub level: LogLevel,

    /// Number of tool output lines kept for error diagnosis.
    #[serde(default = "default_error_tail")]
    pub error_tail: usize,

    /// Optional per-run log file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_file: Option<String>,
}

fn default_error_tail() -> usize {
    20
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: LogLevel::default(),
            error_tail: default_error_tail(),
            log_file: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_serialize() {
        let settings = Settings::default();
        let toml_str = toml::to_string_pretty(&settings).unwrap();
        assert!(toml_str.contains("[audio]"));
        assert!(toml_str.contains("ac3_bitrate_kbps = 640"));
        assert!(toml_str.contains("[logging]"));
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let toml_str = r#"
[tools]
tsmuxer = "/opt/tsmuxer/tsMuxeR"

[audio]
selection = "codec-priority"
"#;
        let settings: Settings = toml::from_str(toml_str).unwrap();
        assert_eq!(
            settings.tools.override_for(Tool::TsMuxer),
            Some("/opt/tsmuxer/tsMuxeR")
        );
        assert_eq!(settings.tools.override_for(Tool::MediaInfo), None);
        assert_eq!(settings.audio.selection, AudioSelection::CodecPriority);
        assert_eq!(settings.audio.ac3_bitrate_kbps, 640);
        assert_eq!(settings.logging.level, LogLevel::Info);
    }

    #[test]
    fn blank_override_is_ignored() {
        let tools = ToolSettings {
            aften: Some("  ".to_string()),
            ..Default::default()
        };
        assert_eq!(tools.override_for(Tool::Aften), None);
    }
}
