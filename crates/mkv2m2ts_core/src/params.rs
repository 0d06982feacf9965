//! Parameter resolution.
//!
//! Turns the raw command-line paths into validated input, output and temp
//! locations. Nothing here touches the disk beyond metadata lookups.

use std::ffi::OsString;
use std::path::{Path, PathBuf, MAIN_SEPARATOR, MAIN_SEPARATOR_STR};

use serde::Serialize;

use crate::errors::{ConvertError, ConvertResult};

/// Extension of the produced transport stream.
pub const OUTPUT_EXTENSION: &str = "m2ts";

/// Raw paths as given on the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConvertRequest {
    /// Source MKV file (required).
    pub input: PathBuf,
    /// Output file or directory.
    pub output: Option<PathBuf>,
    /// Directory for intermediate files.
    pub temp_dir: Option<PathBuf>,
}

impl ConvertRequest {
    /// Create a request for an input file with default output and temp dir.
    pub fn new(input: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            ..Default::default()
        }
    }

    /// Set the output file or directory.
    pub fn with_output(mut self, output: impl Into<PathBuf>) -> Self {
        self.output = Some(output.into());
        self
    }

    /// Set the temp directory.
    pub fn with_temp_dir(mut self, temp_dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(temp_dir.into());
        self
    }
}

/// Validated paths for one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedParams {
    /// Existing input file.
    pub input_path: PathBuf,
    /// Output file; does not exist yet and ends in `.m2ts`.
    pub output_path: PathBuf,
    /// Existing temp directory, always ending with a separator.
    pub temp_dir: PathBuf,
}

/// Resolve a request, defaulting the temp dir to the working directory.
pub fn resolve(request: &ConvertRequest) -> ConvertResult<ResolvedParams> {
    let cwd = std::env::current_dir()
        .map_err(|e| ConvertError::io_error("reading the current directory", e))?;
    resolve_in(request, &cwd)
}

/// Resolve a request against an explicit working directory.
pub fn resolve_in(request: &ConvertRequest, cwd: &Path) -> ConvertResult<ResolvedParams> {
    let input_path = request.input.clone();
    if !input_path.is_file() {
        return Err(ConvertError::InvalidInput(input_path));
    }

    let output_path = resolve_output(&input_path, request.output.as_deref())?;

    let temp_dir = match &request.temp_dir {
        Some(dir) if dir.is_dir() => dir.clone(),
        Some(dir) => return Err(ConvertError::InvalidTempDir(dir.clone())),
        None => cwd.to_path_buf(),
    };

    Ok(ResolvedParams {
        input_path,
        output_path,
        temp_dir: with_trailing_separator(temp_dir),
    })
}

fn resolve_output(input: &Path, output: Option<&Path>) -> ConvertResult<PathBuf> {
    let output_path = match output {
        Some(dir) if dir.is_dir() => dir.join(output_file_name(input)),
        Some(file) => {
            let parent = file
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            if !parent.is_dir() {
                return Err(ConvertError::invalid_output(
                    file,
                    format!("parent directory {} does not exist", parent.display()),
                ));
            }
            if !has_output_extension(file) {
                return Err(ConvertError::invalid_output(
                    file,
                    format!("output file must end with .{}", OUTPUT_EXTENSION),
                ));
            }
            file.to_path_buf()
        }
        None => input.with_file_name(output_file_name(input)),
    };

    if output_path.exists() {
        return Err(ConvertError::invalid_output(&output_path, "file already exists"));
    }

    Ok(output_path)
}

/// Input basename with the extension replaced by `.m2ts`.
fn output_file_name(input: &Path) -> OsString {
    let stem = input
        .file_stem()
        .map(|s| s.to_os_string())
        .unwrap_or_else(|| OsString::from("output"));
    let mut name = stem;
    name.push(".");
    name.push(OUTPUT_EXTENSION);
    name
}

fn has_output_extension(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().eq_ignore_ascii_case(OUTPUT_EXTENSION))
        .unwrap_or(false)
}

fn with_trailing_separator(path: PathBuf) -> PathBuf {
    let mut raw = path.into_os_string();
    let ends_with_separator = {
        let text = raw.to_string_lossy();
        text.ends_with(MAIN_SEPARATOR) || text.ends_with('/')
    };
    if !ends_with_separator {
        raw.push(MAIN_SEPARATOR_STR);
    }
    PathBuf::from(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn touch(path: &Path) {
        fs::write(path, b"").unwrap();
    }

    #[test]
    fn missing_input_is_invalid() {
        let dir = tempdir().unwrap();
        let request = ConvertRequest::new(dir.path().join("absent.mkv"));
        assert!(matches!(
            resolve_in(&request, dir.path()),
            Err(ConvertError::InvalidInput(_))
        ));
    }

    #[test]
    fn output_defaults_next_to_input() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("movie.mkv");
        touch(&input);

        let params = resolve_in(&ConvertRequest::new(&input), dir.path()).unwrap();
        assert_eq!(params.output_path, dir.path().join("movie.m2ts"));
        assert_eq!(params.input_path, input);
    }

    #[test]
    fn output_directory_gets_input_basename() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("movie.mkv");
        touch(&input);
        let out = dir.path().join("out");
        fs::create_dir(&out).unwrap();

        let plain = ConvertRequest::new(&input).with_output(&out);
        let params = resolve_in(&plain, dir.path()).unwrap();
        assert_eq!(params.output_path, out.join("movie.m2ts"));

        let mut with_sep = out.clone().into_os_string();
        with_sep.push(MAIN_SEPARATOR_STR);
        let trailing = ConvertRequest::new(&input).with_output(PathBuf::from(with_sep));
        let params = resolve_in(&trailing, dir.path()).unwrap();
        assert_eq!(params.output_path, out.join("movie.m2ts"));
    }

    #[test]
    fn explicit_output_file_is_validated() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("movie.mkv");
        touch(&input);

        let ok = ConvertRequest::new(&input).with_output(dir.path().join("final.m2ts"));
        assert_eq!(
            resolve_in(&ok, dir.path()).unwrap().output_path,
            dir.path().join("final.m2ts")
        );

        let wrong_ext = ConvertRequest::new(&input).with_output(dir.path().join("final.ts"));
        assert!(matches!(
            resolve_in(&wrong_ext, dir.path()),
            Err(ConvertError::InvalidOutput { .. })
        ));

        let no_parent =
            ConvertRequest::new(&input).with_output(dir.path().join("missing").join("a.m2ts"));
        assert!(matches!(
            resolve_in(&no_parent, dir.path()),
            Err(ConvertError::InvalidOutput { .. })
        ));

        let existing = dir.path().join("exists.m2ts");
        touch(&existing);
        let clash = ConvertRequest::new(&input).with_output(&existing);
        assert!(matches!(
            resolve_in(&clash, dir.path()),
            Err(ConvertError::InvalidOutput { .. })
        ));
    }

    #[test]
    fn temp_dir_defaults_to_cwd_with_separator() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("movie.mkv");
        touch(&input);
        let cwd = dir.path().join("work");
        fs::create_dir(&cwd).unwrap();

        let params = resolve_in(&ConvertRequest::new(&input), &cwd).unwrap();
        assert!(params.temp_dir.to_string_lossy().ends_with(MAIN_SEPARATOR));
        assert_eq!(params.temp_dir, cwd);
    }

    #[test]
    fn missing_temp_dir_is_invalid() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("movie.mkv");
        touch(&input);

        let request = ConvertRequest::new(&input).with_temp_dir(dir.path().join("nope"));
        assert!(matches!(
            resolve_in(&request, dir.path()),
            Err(ConvertError::InvalidTempDir(_))
        ));
    }
}
