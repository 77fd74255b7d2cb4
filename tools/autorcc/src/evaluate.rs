//! Rebuild decision for the rcc output.
//!
//! Rules are checked in a fixed order and the first match wins:
//!
//! 1. missing `.qrc` input: error
//! 2. missing output: rebuild
//! 3. settings digest changed: rebuild
//! 4. output older than the `.qrc`: rebuild
//! 5. output older than the rcc executable: rebuild
//! 6. output older than any resource (missing resource: error): rebuild
//! 7. otherwise up to date
//!
//! The resource list is only resolved when rule 6 is reached, because
//! resolving it may spawn rcc.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{RccError, Result};
use crate::lister::ResourceLister;
use crate::timestamp::Timestamp;
use crate::verbose::quoted;

/// Why the output has to be regenerated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RebuildReason {
    /// The output file does not exist.
    OutputMissing,
    /// The settings digest differs from the stored one.
    SettingsChanged,
    /// The `.qrc` file is newer than the output.
    SourceNewer(PathBuf),
    /// The rcc executable is newer than the output.
    ExecutableNewer,
    /// A resource file is newer than the output.
    ResourceNewer(PathBuf),
}

impl fmt::Display for RebuildReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutputMissing => f.write_str("it doesn't exist"),
            Self::SettingsChanged => f.write_str("the rcc settings changed"),
            Self::SourceNewer(path) | Self::ResourceNewer(path) => {
                write!(f, "it is older than {}", quoted(path.display()))
            }
            Self::ExecutableNewer => f.write_str("it is older than the rcc executable"),
        }
    }
}

/// What to do with the output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildDecision {
    /// Nothing to do.
    UpToDate,
    /// Content is valid but the output must become newer than the manifest.
    TouchOnly,
    /// Run rcc.
    Rebuild(RebuildReason),
}

impl BuildDecision {
    /// Whether the output file changes (content or mtime) under this decision.
    pub fn changes_output(&self) -> bool {
        !matches!(self, Self::UpToDate)
    }
}

/// The `.qrc` input and its resources, resolved at most once.
#[derive(Debug, Clone)]
pub struct InputSet {
    source: PathBuf,
    resources: Option<Vec<PathBuf>>,
}

impl InputSet {
    /// An input set with an explicit resource list. An empty list means the
    /// resources will be asked for when first needed.
    pub fn new(source: impl Into<PathBuf>, resources: Vec<PathBuf>) -> Self {
        Self {
            source: source.into(),
            resources: (!resources.is_empty()).then_some(resources),
        }
    }

    /// The `.qrc` file.
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// The resource list, invoking `lister` on first use if none was given.
    pub fn resources(&mut self, lister: &dyn ResourceLister) -> Result<&[PathBuf]> {
        if self.resources.is_none() {
            self.resources = Some(lister.list(&self.source)?);
        }
        Ok(self.resources.as_deref().unwrap_or_default())
    }
}

/// The parts of a job the staleness rules look at, besides the inputs.
#[derive(Debug, Clone, Copy)]
pub struct StalenessCheck<'a> {
    /// The file rcc writes.
    pub output: &'a Path,
    /// The rcc executable.
    pub executable: &'a Path,
    /// Whether the settings digest changed since the last successful run.
    pub settings_changed: bool,
}

/// Decide between [`BuildDecision::Rebuild`] and [`BuildDecision::UpToDate`].
pub fn evaluate(
    check: &StalenessCheck<'_>,
    inputs: &mut InputSet,
    lister: &dyn ResourceLister,
) -> Result<BuildDecision> {
    let Some(source_time) = Timestamp::load(inputs.source()) else {
        return Err(RccError::MissingSource {
            path: inputs.source().to_path_buf(),
        });
    };

    let Some(output_time) = Timestamp::load(check.output) else {
        return Ok(BuildDecision::Rebuild(RebuildReason::OutputMissing));
    };

    if check.settings_changed {
        return Ok(BuildDecision::Rebuild(RebuildReason::SettingsChanged));
    }

    if output_time.is_older_than(&source_time) {
        return Ok(BuildDecision::Rebuild(RebuildReason::SourceNewer(
            inputs.source().to_path_buf(),
        )));
    }

    if output_time.is_older_than_opt(Timestamp::load(check.executable).as_ref()) {
        return Ok(BuildDecision::Rebuild(RebuildReason::ExecutableNewer));
    }

    let source = inputs.source().to_path_buf();
    for resource in inputs.resources(lister)? {
        let Some(resource_time) = Timestamp::load(resource) else {
            return Err(RccError::MissingResource {
                source_file: source,
                path: resource.clone(),
            });
        };
        if output_time.is_older_than(&resource_time) {
            return Ok(BuildDecision::Rebuild(RebuildReason::ResourceNewer(
                resource.clone(),
            )));
        }
    }

    Ok(BuildDecision::UpToDate)
}

/// Turn an up to date decision into [`BuildDecision::TouchOnly`] when the
/// output is older than the manifest it was configured from.
///
/// Other decisions pass through unchanged.
pub fn check_info_file(decision: BuildDecision, output: &Path, info_file: &Path) -> BuildDecision {
    if decision != BuildDecision::UpToDate {
        return decision;
    }
    match Timestamp::load(output) {
        Some(output_time)
            if output_time.is_older_than_opt(Timestamp::load(info_file).as_ref()) =>
        {
            BuildDecision::TouchOnly
        }
        _ => BuildDecision::UpToDate,
    }
}
