//! Running rcc to regenerate the output.
//!
//! The command line is always `<rcc> <options...> -o <output> <qrc>`, run
//! from the autogen build directory. A failed run removes whatever rcc left
//! at the output path so a later run can't mistake it for a valid file.

use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::Path;
use std::process::{Command, Output};

use crate::error::{RccError, Result};
use crate::evaluate::RebuildReason;
use crate::info::RccInfo;
use crate::verbose::{Timer, dprintln, quoted, quoted_command, vprintln, wprintln};

/// A typed builder for rcc invocations.
pub struct RccCommandBuilder {
    cmd: Command,
}

impl RccCommandBuilder {
    /// Start a command line for the given rcc executable.
    pub fn new(executable: &Path) -> Self {
        Self {
            cmd: Command::new(executable),
        }
    }

    /// Append user options in order.
    pub fn options<I, S>(&mut self, options: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.cmd.args(options);
        self
    }

    /// Set the output file (`-o <path>`).
    pub fn output(&mut self, path: &Path) -> &mut Self {
        self.cmd.arg("-o").arg(path);
        self
    }

    /// Set the `.qrc` input. Must come last.
    pub fn source(&mut self, path: &Path) -> &mut Self {
        self.cmd.arg(path);
        self
    }

    /// Run from `dir`.
    pub fn current_dir(&mut self, dir: &Path) -> &mut Self {
        self.cmd.current_dir(dir);
        self
    }

    /// The command line, quoted for display.
    pub fn display(&self) -> String {
        quoted_command(&self.cmd)
    }

    /// Execute the command, capturing stdout and stderr.
    pub fn run(&mut self) -> io::Result<Output> {
        self.cmd.output()
    }
}

/// Regenerate the output of `info`.
///
/// On success rcc's stdout, if any, is printed. On failure the partial
/// output is removed and the captured output is returned in the error.
pub fn generate(info: &RccInfo, reason: &RebuildReason) -> Result<()> {
    let output = info.output_path();

    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| RccError::io("could not create parent directory", parent, e))?;
    }

    let mut cmd = RccCommandBuilder::new(&info.executable);
    cmd.options(&info.options)
        .output(&output)
        .source(&info.source)
        .current_dir(&info.build_dir);
    let command = cmd.display();

    vprintln!(
        "Generating {}, because {reason}, from {}\n{command}",
        quoted(output.display()),
        quoted(info.source.display()),
    );

    let failure_message = || {
        format!(
            "the rcc process failed to compile\n  {}\ninto\n  {}",
            quoted(info.source.display()),
            quoted(output.display()),
        )
    };

    let result = {
        let _t = Timer::start("rcc");
        cmd.run()
    };

    let out = match result {
        Ok(out) => out,
        Err(source) => {
            remove_partial_output(&output);
            return Err(RccError::ToolLaunch {
                message: failure_message(),
                command,
                source,
            });
        }
    };

    let stdout = String::from_utf8_lossy(&out.stdout);
    if !out.status.success() {
        remove_partial_output(&output);
        let stderr = String::from_utf8_lossy(&out.stderr);
        return Err(RccError::ToolFailed {
            message: failure_message(),
            command,
            output: format!("{stdout}{stderr}"),
        });
    }

    if !stdout.is_empty() {
        dprintln!("{}", stdout.trim_end());
    }
    Ok(())
}

/// Delete whatever a failed rcc run left behind.
fn remove_partial_output(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => wprintln!("could not remove partial output {}: {e}", quoted(path.display())),
    }
}
