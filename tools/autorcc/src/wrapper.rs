//! Stable wrapper for configuration specific outputs.
//!
//! In multi-config builds rcc writes into a per-configuration include
//! directory, but consumers reference one stable path. That path holds a tiny
//! source file that includes the real output.

use std::fs;
use std::path::Path;

use crate::error::{RccError, Result};
use crate::timestamp::touch;
use crate::verbose::{quoted, vprintln};

/// What [`publish`] did to the wrapper file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WrapperAction {
    /// The wrapper content was (re)written.
    Written,
    /// Content was already correct; only the mtime was advanced.
    Touched,
    /// Nothing changed.
    Unchanged,
}

/// The exact wrapper file text for `include`.
pub fn wrapper_content(include: &str) -> String {
    format!(
        "// This file was generated by autorcc for multi-config builds.\n\
         // Do not edit, changes will be overwritten.\n\
         #include <{include}>\n"
    )
}

/// Bring the wrapper at `wrapper` up to date.
///
/// The file is rewritten only if its content differs. Otherwise, if the
/// wrapped output changed, only its mtime is advanced so content-hashing
/// consumers see nothing new while mtime-based ones see freshness.
pub fn publish(include: &str, wrapper: &Path, output_changed: bool) -> Result<WrapperAction> {
    let content = wrapper_content(include);

    let differs = fs::read_to_string(wrapper).ok().as_deref() != Some(content.as_str());

    if differs {
        vprintln!("Generating RCC wrapper file {}", quoted(wrapper.display()));
        if let Some(parent) = wrapper.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| RccError::io("could not create parent directory", parent, e))?;
        }
        fs::write(wrapper, content)
            .map_err(|e| RccError::io("RCC wrapper file writing failed for", wrapper, e))?;
        return Ok(WrapperAction::Written);
    }

    if output_changed {
        vprintln!("Touching RCC wrapper file {}", quoted(wrapper.display()));
        touch(wrapper).map_err(|e| RccError::io("RCC wrapper file touch failed for", wrapper, e))?;
        return Ok(WrapperAction::Touched);
    }

    Ok(WrapperAction::Unchanged)
}
