//! Per-run logger with optional file output.
//!
//! Each conversion gets one logger that:
//! - Forwards every message to `tracing`
//! - Optionally mirrors a timestamped transcript into a log file
//! - Maintains a tail buffer of tool output for error diagnosis

use std::collections::VecDeque;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Local;
use parking_lot::Mutex;

use super::types::{LogConfig, LogLevel, MessagePrefix};

/// Per-run logger.
pub struct RunLogger {
    /// Path to the transcript file, if any.
    log_path: Option<PathBuf>,
    /// File writer (buffered).
    file_writer: Mutex<Option<BufWriter<File>>>,
    /// Logging configuration.
    config: LogConfig,
    /// Tail buffer for recent tool output lines.
    tail_buffer: Mutex<VecDeque<String>>,
    /// Warnings emitted during the run.
    warnings: Mutex<Vec<String>>,
}

impl RunLogger {
    /// Create a logger that only forwards to `tracing`.
    pub fn new(config: LogConfig) -> Self {
        Self {
            log_path: None,
            file_writer: Mutex::new(None),
            tail_buffer: Mutex::new(VecDeque::with_capacity(config.error_tail)),
            warnings: Mutex::new(Vec::new()),
            config,
        }
    }

    /// Create a logger that also writes a transcript to `log_path`.
    ///
    /// The parent directory is created if needed; an existing file is
    /// truncated.
    pub fn with_file(config: LogConfig, log_path: impl AsRef<Path>) -> std::io::Result<Self> {
        let log_path = log_path.as_ref();

        if let Some(parent) = log_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let file = File::create(log_path)?;

        let mut logger = Self::new(config);
        logger.log_path = Some(log_path.to_path_buf());
        *logger.file_writer.get_mut() = Some(BufWriter::new(file));
        Ok(logger)
    }

    /// Get the log file path.
    pub fn log_path(&self) -> Option<&Path> {
        self.log_path.as_deref()
    }

    /// Log a message at the specified level.
    pub fn log(&self, level: LogLevel, message: &str) {
        match level {
            LogLevel::Trace => tracing::trace!("{}", message),
            LogLevel::Debug => tracing::debug!("{}", message),
            LogLevel::Info => tracing::info!("{}", message),
            LogLevel::Warn => tracing::warn!("{}", message),
            LogLevel::Error => tracing::error!("{}", message),
        }

        if level < self.config.level {
            return;
        }
        self.write_file(&self.format_message(message));
    }

    /// Log an info message.
    pub fn info(&self, message: &str) {
        self.log(LogLevel::Info, message);
    }

    /// Log a debug message.
    pub fn debug(&self, message: &str) {
        self.log(LogLevel::Debug, message);
    }

    /// Log a warning message and remember it for the run summary.
    pub fn warn(&self, message: &str) {
        self.warnings.lock().push(message.to_string());
        let msg = MessagePrefix::Warning.format(message);
        self.log(LogLevel::Warn, &msg);
    }

    /// Log an error message.
    pub fn error(&self, message: &str) {
        let msg = MessagePrefix::Error.format(message);
        self.log(LogLevel::Error, &msg);
    }

    /// Log a command being executed.
    pub fn command(&self, command: &str) {
        let msg = MessagePrefix::Command.format(command);
        self.log(LogLevel::Info, &msg);
    }

    /// Log a phase marker.
    pub fn phase(&self, phase_name: &str) {
        let msg = MessagePrefix::Phase.format(phase_name);
        self.log(LogLevel::Info, &msg);
    }

    /// Log a success message.
    pub fn success(&self, message: &str) {
        let msg = MessagePrefix::Success.format(message);
        self.log(LogLevel::Info, &msg);
    }

    /// Record captured tool output.
    ///
    /// Lines go to the tail buffer and are logged at debug level.
    pub fn tool_output(&self, text: &str) {
        for line in text.lines().filter(|l| !l.trim().is_empty()) {
            {
                let mut buffer = self.tail_buffer.lock();
                if self.config.error_tail > 0 && buffer.len() >= self.config.error_tail {
                    buffer.pop_front();
                }
                if self.config.error_tail > 0 {
                    buffer.push_back(line.to_string());
                }
            }
            self.log(LogLevel::Debug, line);
        }
    }

    /// Write the tail buffer to the log (typically after an error).
    pub fn show_tail(&self, header: &str) {
        let tail = self.get_tail();
        if tail.is_empty() {
            return;
        }

        self.log(LogLevel::Error, &format!("[{}/tail]", header));
        for line in &tail {
            self.log(LogLevel::Error, line);
        }
    }

    /// Get the current tail buffer contents.
    pub fn get_tail(&self) -> Vec<String> {
        self.tail_buffer.lock().iter().cloned().collect()
    }

    /// Warnings emitted so far.
    pub fn warnings(&self) -> Vec<String> {
        self.warnings.lock().clone()
    }

    /// Flush the log file.
    pub fn flush(&self) {
        if let Some(ref mut writer) = *self.file_writer.lock() {
            let _ = writer.flush();
        }
    }

    fn format_message(&self, message: &str) -> String {
        format!("[{}] {}", Local::now().format("%H:%M:%S"), message)
    }

    fn write_file(&self, formatted: &str) {
        if let Some(ref mut writer) = *self.file_writer.lock() {
            let _ = writeln!(writer, "{}", formatted);
        }
    }
}

impl Default for RunLogger {
    fn default() -> Self {
        Self::new(LogConfig::default())
    }
}

impl Drop for RunLogger {
    fn drop(&mut self) {
        self.flush();
    }
}
