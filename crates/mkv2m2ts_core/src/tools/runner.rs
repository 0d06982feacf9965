//! External process execution.
//!
//! Tools are always invoked with an explicit argument vector, never through
//! a shell. The decoder/encoder pair is connected with an OS pipe.

use std::ffi::OsString;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

/// A single program invocation (program path + argument vector).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Resolved executable path.
    pub program: PathBuf,
    /// Arguments, passed verbatim.
    pub args: Vec<OsString>,
}

impl Invocation {
    /// Create an invocation with no arguments.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Append one argument (builder pattern).
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append a path argument.
    pub fn path_arg(self, path: &Path) -> Self {
        self.arg(path.as_os_str().to_os_string())
    }

    /// Arguments as lossy UTF-8 strings.
    pub fn args_lossy(&self) -> Vec<String> {
        self.args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    /// Human-readable command line for logging.
    pub fn display(&self) -> String {
        let mut line = self.program.display().to_string();
        for arg in self.args_lossy() {
            line.push(' ');
            if arg.contains(' ') {
                line.push('"');
                line.push_str(&arg);
                line.push('"');
            } else {
                line.push_str(&arg);
            }
        }
        line
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        cmd
    }
}

/// Captured result of one finished process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    /// Exit code, `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
    /// Captured standard output (lossy UTF-8).
    pub stdout: String,
    /// Captured standard error (lossy UTF-8).
    pub stderr: String,
}

impl ToolOutput {
    /// Whether the process exited with code 0.
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Exit code for messages, -1 when killed by a signal.
    pub fn code(&self) -> i32 {
        self.exit_code.unwrap_or(-1)
    }

    /// Stdout followed by stderr, for signature matching and diagnostics.
    pub fn combined(&self) -> String {
        match (self.stdout.trim().is_empty(), self.stderr.trim().is_empty()) {
            (false, false) => format!("{}\n{}", self.stdout.trim_end(), self.stderr.trim_end()),
            (false, true) => self.stdout.trim_end().to_string(),
            (true, false) => self.stderr.trim_end().to_string(),
            (true, true) => String::new(),
        }
    }

    fn from_output(output: Output) -> Self {
        Self {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }
}

/// Results of a producer | consumer pipe.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipedOutput {
    /// Output of the process writing into the pipe (stdout not captured).
    pub producer: ToolOutput,
    /// Output of the process reading from the pipe.
    pub consumer: ToolOutput,
}

/// Trait for running external tools.
///
/// The pipeline talks to the outside world only through this trait, so the
/// whole state machine can be exercised with a scripted implementation.
pub trait CommandRunner {
    /// Run a program to completion, capturing stdout and stderr.
    ///
    /// Returns `Err` only when the process could not be started or waited on;
    /// a non-zero exit is reported through [`ToolOutput::exit_code`].
    fn run(&self, invocation: &Invocation) -> io::Result<ToolOutput>;

    /// Run `producer | consumer`, waiting for both to finish.
    fn run_piped(&self, producer: &Invocation, consumer: &Invocation) -> io::Result<PipedOutput>;
}

/// Runner backed by `std::process`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl SystemRunner {
    pub fn new() -> Self {
        Self
    }
}

impl CommandRunner for SystemRunner {
    fn run(&self, invocation: &Invocation) -> io::Result<ToolOutput> {
        tracing::debug!("Running: {}", invocation.display());

        let output = invocation
            .command()
            .stdin(Stdio::null())
            .output()?;

        Ok(ToolOutput::from_output(output))
    }

    fn run_piped(&self, producer: &Invocation, consumer: &Invocation) -> io::Result<PipedOutput> {
        tracing::debug!("Running: {} | {}", producer.display(), consumer.display());

        let mut producer_child = producer
            .command()
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        let pipe = producer_child
            .stdout
            .take()
            .ok_or_else(|| io::Error::other("producer stdout was not captured"))?;

        let consumer_child = consumer
            .command()
            .stdin(Stdio::from(pipe))
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn();

        let consumer_child = match consumer_child {
            Ok(child) => child,
            Err(e) => {
                let _ = producer_child.kill();
                let _ = producer_child.wait();
                return Err(e);
            }
        };

        // The producer's stderr must be drained while the consumer runs,
        // otherwise a chatty producer blocks on a full pipe.
        let producer_stderr = producer_child.stderr.take();
        let (consumer_output, stderr_bytes) = std::thread::scope(|scope| {
            let drain = scope.spawn(move || {
                let mut buf = Vec::new();
                if let Some(mut stderr) = producer_stderr {
                    let _ = stderr.read_to_end(&mut buf);
                }
                buf
            });
            let consumer_output = consumer_child.wait_with_output();
            let stderr_bytes = drain.join().unwrap_or_default();
            (consumer_output, stderr_bytes)
        });
        let consumer_output = consumer_output?;

        let status = producer_child.wait()?;

        Ok(PipedOutput {
            producer: ToolOutput {
                exit_code: status.code(),
                stdout: String::new(),
                stderr: String::from_utf8_lossy(&stderr_bytes).into_owned(),
            },
            consumer: ToolOutput::from_output(consumer_output),
        })
    }
}
