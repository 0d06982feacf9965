//! Command-line tool converting MKV (H.264 + DTS/AC3/AAC) into M2TS.

use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;

use mkv2m2ts_core::config::{ConfigManager, Settings};
use mkv2m2ts_core::logging::{init_tracing, LogConfig, LogLevel, RunLogger};
use mkv2m2ts_core::orchestrator::Converter;
use mkv2m2ts_core::params::ConvertRequest;
use mkv2m2ts_core::tools::SystemRunner;
use mkv2m2ts_core::{ConvertError, ConvertResult};

#[derive(Parser, Debug)]
#[command(name = "mkv2m2ts")]
#[command(
    version,
    about = "Convert MKV (H.264 + DTS/AC3/AAC) to M2TS for hardware players",
    long_about = None
)]
struct Args {
    /// Input MKV file
    #[arg(short, long)]
    input: PathBuf,

    /// Output file or directory (defaults to the input with .m2ts)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Directory for intermediate files (defaults to the current directory)
    #[arg(short, long)]
    temp_dir: Option<PathBuf>,

    /// TOML settings file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Write a log of the run, including every command, to this file
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Print the selected streams as JSON and exit without converting
    #[arg(long)]
    inspect_only: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            if let Some(output) = e.tool_output() {
                let text = output.combined();
                if !text.is_empty() {
                    eprintln!("{}", text);
                }
            }
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> ConvertResult<()> {
    let settings = load_settings(args.config.as_deref())?;

    let level = if args.verbose {
        LogLevel::Debug
    } else {
        settings.logging.level
    };
    init_tracing(level);

    let log_config = LogConfig {
        level,
        error_tail: settings.logging.error_tail,
    };
    let log_file = args
        .log_file
        .or_else(|| settings.logging.log_file.as_ref().map(PathBuf::from));
    let logger = match log_file {
        Some(path) => RunLogger::with_file(log_config, &path).map_err(|e| {
            ConvertError::io_error(format!("creating log file {}", path.display()), e)
        })?,
        None => RunLogger::new(log_config),
    };

    let runner = SystemRunner::new();
    let converter = Converter::new(&runner, &settings, &logger);

    if args.inspect_only {
        let media = converter.inspect_only(&args.input)?;
        let json = serde_json::to_string_pretty(&media).map_err(|e| {
            ConvertError::io_error("serializing inspection result", io::Error::other(e))
        })?;
        println!("{}", json);
        return Ok(());
    }

    let request = ConvertRequest {
        input: args.input,
        output: args.output,
        temp_dir: args.temp_dir,
    };
    let summary = converter.run(&request)?;

    if summary.rebuilt {
        tracing::info!("Output was muxed from a rebuilt container");
    }
    println!("{}", summary.output_path.display());
    Ok(())
}

fn load_settings(path: Option<&Path>) -> ConvertResult<Settings> {
    match path {
        Some(path) => {
            let mut manager = ConfigManager::new(path);
            manager.load()?;
            Ok(manager.into_settings())
        }
        None => Ok(Settings::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn input_is_required() {
        assert!(Args::try_parse_from(["mkv2m2ts"]).is_err());
    }

    #[test]
    fn short_flags_parse() {
        let args = Args::try_parse_from([
            "mkv2m2ts", "-i", "movie.mkv", "-o", "/out/", "-t", "/tmp", "-v",
        ])
        .unwrap();
        assert_eq!(args.input, PathBuf::from("movie.mkv"));
        assert_eq!(args.output, Some(PathBuf::from("/out/")));
        assert_eq!(args.temp_dir, Some(PathBuf::from("/tmp")));
        assert!(args.verbose);
        assert!(!args.inspect_only);
    }
}
