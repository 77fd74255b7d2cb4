//! Job manifest ("info file") loading.
//!
//! The build system writes one TOML info file per `.qrc` job. Keys that may
//! differ between build configurations can be overridden in a
//! `[config.<NAME>]` table, selected by the configuration name passed on the
//! command line.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{RccError, Result};
use crate::settings::DigestParts;

/// Infix inserted into the output file name in multi-config mode.
const MULTI_CONFIG_SUFFIX: &str = "_CMAKE_";

/// Raw manifest as written by the build system.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct InfoFile {
    #[serde(default)]
    verbosity: u32,
    #[serde(default)]
    multi_config: bool,
    #[serde(default)]
    build_dir: String,
    #[serde(default)]
    include_dir: String,
    #[serde(default)]
    rcc_executable: String,
    #[serde(default)]
    rcc_list_options: Vec<String>,
    #[serde(default)]
    lock_file: String,
    #[serde(default)]
    source: String,
    #[serde(default)]
    output_checksum: String,
    #[serde(default)]
    output_name: String,
    #[serde(default)]
    options: Vec<String>,
    #[serde(default)]
    inputs: Vec<String>,
    #[serde(default)]
    settings_file: String,
    #[serde(default)]
    config: BTreeMap<String, ConfigOverride>,
}

/// `[config.<NAME>]` table.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct ConfigOverride {
    include_dir: Option<String>,
    options: Option<Vec<String>>,
    settings_file: Option<String>,
}

/// Fully resolved, validated parameters of one rcc job.
#[derive(Debug, Clone)]
pub struct RccInfo {
    /// The manifest this job was loaded from.
    pub info_file: PathBuf,
    /// Manifest verbosity; anything above zero requests verbose output.
    pub verbosity: u32,
    /// Whether the physical output is configuration specific.
    pub multi_config: bool,
    /// Autogen build directory; also the generator's working directory.
    pub build_dir: PathBuf,
    /// Configuration specific include directory.
    pub include_dir: PathBuf,
    /// The rcc executable.
    pub executable: PathBuf,
    /// Flags that make rcc list the resources of a `.qrc` file.
    pub list_options: Vec<String>,
    /// Lock file guarding the settings record.
    pub lock_file: PathBuf,
    /// The `.qrc` input.
    pub source: PathBuf,
    /// Checksum sub-directory token.
    pub output_checksum: String,
    /// Output file name, e.g. `qrc_app.cpp`.
    pub output_name: String,
    /// Generator options, in order.
    pub options: Vec<String>,
    /// Explicit resource list; empty means "ask the lister".
    pub inputs: Vec<PathBuf>,
    /// The settings record.
    pub settings_file: PathBuf,
}

impl RccInfo {
    /// Load and validate the manifest at `info_file`.
    ///
    /// `config` selects a `[config.<NAME>]` override table. An unknown
    /// configuration name is not an error; the base values are used.
    pub fn load(info_file: &Path, config: Option<&str>) -> Result<Self> {
        let text = fs::read_to_string(info_file)
            .map_err(|e| RccError::io("failed to read info file", info_file, e))?;
        Self::parse(info_file, &text, config)
    }

    /// Parse manifest text that was read from `info_file`.
    pub fn parse(info_file: &Path, text: &str, config: Option<&str>) -> Result<Self> {
        let config_error = |message: String| RccError::Config {
            info_file: info_file.to_path_buf(),
            message,
        };

        let mut raw: InfoFile = toml::from_str(text)
            .map_err(|e| config_error(format!("file processing failed: {e}")))?;

        if let Some(ov) = config.and_then(|name| raw.config.remove(name)) {
            if let Some(dir) = ov.include_dir {
                raw.include_dir = dir;
            }
            if let Some(options) = ov.options {
                raw.options = options;
            }
            if let Some(file) = ov.settings_file {
                raw.settings_file = file;
            }
        }

        if raw.build_dir.is_empty() {
            return Err(config_error("build directory empty".into()));
        }
        if raw.include_dir.is_empty() {
            return Err(config_error("include directory empty".into()));
        }
        if raw.rcc_executable.is_empty() {
            return Err(config_error("rcc executable missing".into()));
        }
        if !Path::new(&raw.rcc_executable).exists() {
            return Err(config_error(format!(
                "the rcc executable \"{}\" does not exist",
                raw.rcc_executable
            )));
        }
        if raw.lock_file.is_empty() {
            return Err(config_error("lock file name missing".into()));
        }
        if raw.settings_file.is_empty() {
            return Err(config_error("settings file name missing".into()));
        }
        if raw.source.is_empty() {
            return Err(config_error("rcc input file missing".into()));
        }
        if raw.output_name.is_empty() {
            return Err(config_error("rcc output file missing".into()));
        }

        Ok(Self {
            info_file: info_file.to_path_buf(),
            verbosity: raw.verbosity,
            multi_config: raw.multi_config,
            build_dir: raw.build_dir.into(),
            include_dir: raw.include_dir.into(),
            executable: raw.rcc_executable.into(),
            list_options: raw.rcc_list_options,
            lock_file: raw.lock_file.into(),
            source: raw.source.into(),
            output_checksum: raw.output_checksum,
            output_name: raw.output_name,
            options: raw.options,
            inputs: raw.inputs.into_iter().map(PathBuf::from).collect(),
            settings_file: raw.settings_file.into(),
        })
    }

    /// The stable path downstream consumers reference.
    pub fn public_path(&self) -> PathBuf {
        self.build_dir
            .join(&self.output_checksum)
            .join(&self.output_name)
    }

    /// The configuration specific output, relative to the include directory.
    pub fn multi_config_output(&self) -> String {
        format!(
            "{}/{}",
            self.output_checksum,
            append_filename_suffix(&self.output_name, MULTI_CONFIG_SUFFIX)
        )
    }

    /// The file rcc actually writes.
    pub fn output_path(&self) -> PathBuf {
        if self.multi_config {
            self.include_dir.join(self.multi_config_output())
        } else {
            self.public_path()
        }
    }

    /// The configuration values that feed the settings digest.
    pub fn digest_parts(&self) -> DigestParts<'_> {
        DigestParts {
            executable: &self.executable,
            list_options: &self.list_options,
            source: &self.source,
            output_checksum: &self.output_checksum,
            output_name: &self.output_name,
            options: &self.options,
            inputs: &self.inputs,
        }
    }
}

/// Insert `suffix` before the extension of `name`, or append it if there is none.
fn append_filename_suffix(name: &str, suffix: &str) -> String {
    match name.rfind('.') {
        Some(pos) => format!("{}{suffix}{}", &name[..pos], &name[pos..]),
        None => format!("{name}{suffix}"),
    }
}
