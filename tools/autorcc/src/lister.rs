//! Resource discovery for `.qrc` files.
//!
//! Newer rcc versions can list the files a `.qrc` references. For older ones
//! (no list options configured) the `.qrc` XML is scanned directly.

use std::fs;
use std::path::{Component, Path, PathBuf};
use std::process::Command;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{RccError, Result};
use crate::verbose::{quoted, quoted_command, vprintln};

/// Prefix of an rcc stderr line that reports a problem in the `.qrc` file.
const ERROR_LINE_PREFIX: &str = "RCC: Error in";

/// Marker preceding a missing file name in an rcc error line.
const MISSING_FILE_MARKER: &str = "Cannot find file '";

/// Text of a `<file>` element, with or without attributes.
static FILE_ENTRY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<file(?:\s[^>]*)?>([^<]+)").expect("valid regex"));

/// Enumerates the resource files referenced by a `.qrc` file.
pub trait ResourceLister {
    /// List the resources of `qrc`, as absolute paths.
    fn list(&self, qrc: &Path) -> Result<Vec<PathBuf>>;
}

/// Lists resources by asking rcc, or by parsing the `.qrc` file.
#[derive(Debug, Clone)]
pub struct RccLister {
    executable: PathBuf,
    list_options: Vec<String>,
}

impl RccLister {
    /// Create a lister for the given rcc and its list flags.
    pub fn new(executable: impl Into<PathBuf>, list_options: Vec<String>) -> Self {
        Self {
            executable: executable.into(),
            list_options,
        }
    }

    /// Run rcc in the `.qrc` directory so that it reports relative paths.
    fn list_with_rcc(&self, qrc: &Path, dir: &Path) -> Result<Vec<PathBuf>> {
        let file_name = qrc.file_name().unwrap_or(qrc.as_os_str());

        let mut cmd = Command::new(&self.executable);
        cmd.args(&self.list_options).arg(file_name).current_dir(dir);

        let command = quoted_command(&cmd);
        vprintln!("Running command:\n{command}");

        let output = cmd.output().map_err(|source| RccError::ToolLaunch {
            message: format!(
                "the rcc list process could not be started for {}",
                quoted(qrc.display())
            ),
            command: command.clone(),
            source,
        })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        if !output.status.success() {
            return Err(RccError::ToolFailed {
                message: format!("the rcc list process failed for {}", quoted(qrc.display())),
                command,
                output: format!("{stdout}{stderr}"),
            });
        }

        let mut files: Vec<PathBuf> = stdout
            .lines()
            .map(|line| line.trim_end_matches('\r'))
            .filter(|line| !line.is_empty())
            .map(PathBuf::from)
            .collect();

        for line in stderr.lines().map(|line| line.trim_end_matches('\r')) {
            if !line.starts_with(ERROR_LINE_PREFIX) {
                continue;
            }
            files.push(missing_file_from_error(line).ok_or_else(|| RccError::ListOutput {
                source_file: qrc.to_path_buf(),
                line: line.to_string(),
            })?);
        }

        Ok(files)
    }

    /// Pull `<file>` entries out of the `.qrc` XML.
    fn list_from_qrc(qrc: &Path) -> Result<Vec<PathBuf>> {
        let content = fs::read_to_string(qrc)
            .map_err(|e| RccError::io("could not read resources file", qrc, e))?;
        Ok(parse_qrc_entries(&content))
    }
}

impl ResourceLister for RccLister {
    fn list(&self, qrc: &Path) -> Result<Vec<PathBuf>> {
        if !qrc.is_file() {
            return Err(RccError::MissingSource {
                path: qrc.to_path_buf(),
            });
        }

        let dir = match qrc.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let base =
            std::path::absolute(&dir).map_err(|e| RccError::io("could not resolve", &dir, e))?;

        let files = if self.list_options.is_empty() {
            Self::list_from_qrc(qrc)?
        } else {
            self.list_with_rcc(qrc, &dir)?
        };

        Ok(files.iter().map(|f| collapse_path(f, &base)).collect())
    }
}

/// Extract `path` from `RCC: Error in '...': Cannot find file 'path'`.
fn missing_file_from_error(line: &str) -> Option<PathBuf> {
    let start = line.find(MISSING_FILE_MARKER)? + MISSING_FILE_MARKER.len();
    let rest = &line[start..];
    let end = rest.rfind('\'')?;
    Some(PathBuf::from(&rest[..end]))
}

/// All `<file>` element texts of a `.qrc` document, in order.
fn parse_qrc_entries(content: &str) -> Vec<PathBuf> {
    FILE_ENTRY
        .captures_iter(content)
        .map(|caps| PathBuf::from(&caps[1]))
        .collect()
}

/// Resolve `path` against `base` and fold away `.` and `..` lexically.
fn collapse_path(path: &Path, base: &Path) -> PathBuf {
    let joined = base.join(path);
    let mut out = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
