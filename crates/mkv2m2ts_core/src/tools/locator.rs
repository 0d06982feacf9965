//! Toolchain lookup.
//!
//! Resolves every external executable once at startup so a missing tool
//! aborts the run before anything touches the disk.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config::ToolSettings;
use crate::errors::{ConvertError, ConvertResult};

/// External tools used by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Tool {
    /// Diagnostic report generator.
    MediaInfo,
    /// Matroska demuxer.
    MkvExtract,
    /// DTS decoder.
    DcaDec,
    /// AC3 encoder.
    Aften,
    /// Transport stream muxer.
    TsMuxer,
    /// Matroska muxer, only needed for the container rebuild fallback.
    MkvMerge,
}

impl Tool {
    /// Tools that must be present before a conversion starts.
    pub const REQUIRED: [Tool; 5] = [
        Tool::MediaInfo,
        Tool::MkvExtract,
        Tool::DcaDec,
        Tool::Aften,
        Tool::TsMuxer,
    ];

    /// Tools whose absence only matters when they are actually needed.
    pub const OPTIONAL: [Tool; 1] = [Tool::MkvMerge];

    /// Default executable name searched for on `PATH`.
    pub fn program_name(self) -> &'static str {
        match self {
            Tool::MediaInfo => "mediainfo",
            Tool::MkvExtract => "mkvextract",
            Tool::DcaDec => "dcadec",
            Tool::Aften => "aften",
            Tool::TsMuxer => "tsMuxeR",
            Tool::MkvMerge => "mkvmerge",
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.program_name())
    }
}

/// Resolved executable paths for one run.
#[derive(Debug, Clone, Default)]
pub struct Toolchain {
    paths: HashMap<Tool, PathBuf>,
}

impl Toolchain {
    /// Locate the full toolchain on the host (required + optional tools).
    pub fn locate(settings: &ToolSettings) -> ConvertResult<Self> {
        Self::locate_tools(settings, &Tool::REQUIRED, &Tool::OPTIONAL)
    }

    /// Locate a specific set of tools on the host.
    pub fn locate_tools(
        settings: &ToolSettings,
        required: &[Tool],
        optional: &[Tool],
    ) -> ConvertResult<Self> {
        Self::locate_with(settings, required, optional, |name| which::which(name).ok())
    }

    /// Locate tools with a custom lookup function.
    ///
    /// `lookup` receives either the configured override or the default
    /// program name and returns the resolved executable path.
    pub fn locate_with<F>(
        settings: &ToolSettings,
        required: &[Tool],
        optional: &[Tool],
        lookup: F,
    ) -> ConvertResult<Self>
    where
        F: Fn(&str) -> Option<PathBuf>,
    {
        let mut toolchain = Self::default();

        for &tool in required {
            let name = settings.override_for(tool).unwrap_or(tool.program_name());
            match lookup(name) {
                Some(path) => {
                    tracing::debug!("Found {} at {}", tool, path.display());
                    toolchain.paths.insert(tool, path);
                }
                None => {
                    tracing::error!("Required tool '{}' not found", name);
                    return Err(ConvertError::MissingDependency(name.to_string()));
                }
            }
        }

        for &tool in optional {
            let name = settings.override_for(tool).unwrap_or(tool.program_name());
            match lookup(name) {
                Some(path) => {
                    tracing::debug!("Found {} at {}", tool, path.display());
                    toolchain.paths.insert(tool, path);
                }
                None => {
                    tracing::debug!("Optional tool '{}' not found", name);
                }
            }
        }

        Ok(toolchain)
    }

    /// Build a toolchain from known paths.
    pub fn from_paths<I>(paths: I) -> Self
    where
        I: IntoIterator<Item = (Tool, PathBuf)>,
    {
        Self {
            paths: paths.into_iter().collect(),
        }
    }

    /// Path of a tool, if it was found.
    pub fn path(&self, tool: Tool) -> Option<&Path> {
        self.paths.get(&tool).map(PathBuf::as_path)
    }

    /// Path of a tool, failing with `MissingDependency` when absent.
    pub fn require(&self, tool: Tool) -> ConvertResult<&Path> {
        self.path(tool)
            .ok_or_else(|| ConvertError::MissingDependency(tool.program_name().to_string()))
    }

    /// Whether a tool was found.
    pub fn has(&self, tool: Tool) -> bool {
        self.paths.contains_key(&tool)
    }
}
