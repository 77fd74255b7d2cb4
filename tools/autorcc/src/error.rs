//! Error types for rcc job processing.

use std::path::PathBuf;

use nix::errno::Errno;

/// Convenience alias used throughout the library.
pub type Result<T> = std::result::Result<T, RccError>;

/// Everything that can abort an rcc job.
///
/// None of these are recoverable within a run. Errors that touch the
/// settings record leave it cleared or removed, so the next run rebuilds.
#[derive(Debug, thiserror::Error)]
pub enum RccError {
    /// A required manifest value is empty, missing or malformed.
    #[error("in {}: {message}", info_file.display())]
    Config {
        /// The manifest that was being loaded.
        info_file: PathBuf,
        /// What is wrong with it.
        message: String,
    },

    /// A file could not be created, read, written, touched or removed.
    #[error("{action} {}: {source}", path.display())]
    Io {
        /// Short description of the failed operation.
        action: &'static str,
        /// The file or directory involved.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The exclusive lock on the lock file could not be taken.
    #[error("file lock failed on {}: {source}", path.display())]
    Lock {
        /// The lock file.
        path: PathBuf,
        /// The error reported by `flock(2)`.
        source: Errno,
    },

    /// The primary `.qrc` input does not exist.
    #[error("the resources file \"{}\" does not exist", path.display())]
    MissingSource {
        /// The missing `.qrc` file.
        path: PathBuf,
    },

    /// A resource referenced by the `.qrc` file does not exist.
    #[error("in \"{}\": could not find the resource file\n  \"{}\"", source_file.display(), path.display())]
    MissingResource {
        /// The `.qrc` file that references the resource.
        source_file: PathBuf,
        /// The missing resource.
        path: PathBuf,
    },

    /// The lister printed something that could not be interpreted.
    #[error("in \"{}\": rcc lists unparsable output:\n{line}", source_file.display())]
    ListOutput {
        /// The `.qrc` file being listed.
        source_file: PathBuf,
        /// The offending line.
        line: String,
    },

    /// An external tool could not be started at all.
    #[error("{message}\ncommand: {command}\n{source}")]
    ToolLaunch {
        /// What the tool was supposed to do.
        message: String,
        /// The quoted command line.
        command: String,
        /// Why the process could not be spawned.
        source: std::io::Error,
    },

    /// An external tool ran but exited unsuccessfully.
    #[error("{message}\ncommand: {command}\n{output}")]
    ToolFailed {
        /// What the tool was supposed to do.
        message: String,
        /// The quoted command line.
        command: String,
        /// Captured stdout followed by stderr.
        output: String,
    },
}

impl RccError {
    /// Build an [`RccError::Io`] for `path`.
    pub fn io(action: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            action,
            path: path.into(),
            source,
        }
    }
}
