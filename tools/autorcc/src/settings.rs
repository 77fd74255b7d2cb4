//! Persisted settings digest with lock-guarded change detection.
//!
//! The settings record holds a SHA-256 digest of every option that affects
//! the generated output, so that option changes force a rebuild even when
//! no file timestamp moved. The record is only read and written while the
//! job's lock file is held.
//!
//! Record format: a single line `rcc:<hex digest>\n`. Anything else reads as
//! "changed".

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::error::{RccError, Result};
use crate::lock::FileLock;
use crate::verbose::{quoted, vprintln};

/// Key of the digest line inside the settings record.
const RECORD_KEY: &str = "rcc";

/// Separator between digest fields. Can't appear in sane paths or options.
const FIELD_SEP: &str = " ~~~ ";

/// Separator between list elements inside one digest field.
const LIST_SEP: &str = ";";

/// The configuration values a settings digest is computed over.
#[derive(Debug, Clone, Copy)]
pub struct DigestParts<'a> {
    /// The rcc executable.
    pub executable: &'a Path,
    /// Lister flags.
    pub list_options: &'a [String],
    /// The `.qrc` input.
    pub source: &'a Path,
    /// Checksum sub-directory token.
    pub output_checksum: &'a str,
    /// Output file name.
    pub output_name: &'a str,
    /// Generator options, order preserved.
    pub options: &'a [String],
    /// Explicit resource list, order preserved.
    pub inputs: &'a [PathBuf],
}

/// Hex encoded SHA-256 of the canonical settings string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsDigest(String);

impl SettingsDigest {
    /// Digest the given configuration.
    pub fn compute(parts: &DigestParts<'_>) -> Self {
        let inputs: Vec<_> = parts
            .inputs
            .iter()
            .map(|p| p.to_string_lossy())
            .collect();

        let fields = [
            parts.executable.to_string_lossy().into_owned(),
            parts.list_options.join(LIST_SEP),
            parts.source.to_string_lossy().into_owned(),
            parts.output_checksum.to_owned(),
            parts.output_name.to_owned(),
            parts.options.join(LIST_SEP),
            inputs.join(LIST_SEP),
        ];

        let mut canonical = String::new();
        for field in &fields {
            canonical.push_str(field);
            canonical.push_str(FIELD_SEP);
        }

        Self(hash_bytes(canonical.as_bytes()))
    }

    /// Wrap an already computed hex digest.
    pub fn from_hex(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }

    /// The hex string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The full record line for this digest.
    fn record(&self) -> String {
        format!("{RECORD_KEY}:{}\n", self.0)
    }
}

/// An open, locked settings record.
///
/// Dropping the store without calling [`SettingsStore::close`] releases the
/// lock and leaves the record as it was after [`SettingsStore::open`]: if the
/// settings changed, that is an empty file, so the next run rebuilds.
pub struct SettingsStore {
    path: PathBuf,
    digest: SettingsDigest,
    changed: bool,
    lock: FileLock,
}

impl SettingsStore {
    /// Lock `lock_path`, then compare the record at `path` against `digest`.
    ///
    /// Both files are created empty if missing. If the settings changed the
    /// record is truncated before returning.
    pub fn open(path: &Path, lock_path: &Path, digest: SettingsDigest) -> Result<Self> {
        ensure_file(path, "settings file creation failed for")?;
        ensure_file(lock_path, "lock file creation failed for")?;

        let lock = FileLock::acquire(lock_path)?;

        let changed = match fs::read_to_string(path) {
            Ok(content) => find_value(&content, RECORD_KEY) != Some(digest.as_str()),
            Err(_) => true,
        };

        if changed {
            fs::write(path, "")
                .map_err(|e| RccError::io("settings file clearing failed for", path, e))?;
        }

        Ok(Self {
            path: path.to_path_buf(),
            digest,
            changed,
            lock,
        })
    }

    /// Whether the stored digest differs from the current one.
    pub fn changed(&self) -> bool {
        self.changed
    }

    /// Finish the locked section.
    ///
    /// With `write` set and changed settings, the new record is written. A
    /// failed write removes the record entirely. The lock is released in all
    /// cases.
    pub fn close(self, write: bool) -> Result<()> {
        let Self {
            path,
            digest,
            changed,
            lock,
        } = self;

        let result = if write && changed {
            vprintln!("Writing settings file {}", quoted(path.display()));
            fs::write(&path, digest.record()).map_err(|e| {
                let _ = fs::remove_file(&path);
                RccError::io("settings file writing failed for", &path, e)
            })
        } else {
            Ok(())
        };

        lock.release();
        result
    }
}

/// Create `path` as an empty file if it does not exist yet.
fn ensure_file(path: &Path, action: &'static str) -> Result<()> {
    if path.exists() {
        return Ok(());
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map(drop)
        .map_err(|e| RccError::io(action, path, e))
}

/// Look up `<key>:<value>\n` in a settings record.
///
/// The value must be non-empty and newline terminated.
fn find_value<'a>(content: &'a str, key: &str) -> Option<&'a str> {
    let prefix = format!("{key}:");
    let start = content.find(&prefix)? + prefix.len();
    let rest = &content[start..];
    let end = rest.find('\n')?;
    (end > 0).then(|| &rest[..end])
}

/// SHA-256 hash of a byte slice, returned as a hex string.
fn hash_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}
