//! File modification times.
//!
//! Staleness is decided purely on modification times. Only a strictly older
//! output counts as stale; equal times are treated as up to date so that
//! filesystems with coarse mtime resolution don't cause rebuild storms.

use std::fs;
use std::io;
use std::path::Path;

use filetime::FileTime;

/// The last-modification instant of a file.
///
/// An absent or unreadable file has no timestamp; callers represent that
/// as `None` and must handle it before comparing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Timestamp(FileTime);

impl Timestamp {
    /// Read the modification time of `path`.
    ///
    /// Returns `None` if the file does not exist or its metadata can't be read.
    pub fn load(path: &Path) -> Option<Self> {
        let meta = fs::metadata(path).ok()?;
        Some(Self(FileTime::from_last_modification_time(&meta)))
    }

    /// Returns `true` if `self` is strictly before `other`.
    pub fn is_older_than(&self, other: &Timestamp) -> bool {
        self.0 < other.0
    }

    /// Returns `true` if `self` is strictly before `other`, where an absent
    /// `other` is never newer than anything.
    pub fn is_older_than_opt(&self, other: Option<&Timestamp>) -> bool {
        other.is_some_and(|other| self.is_older_than(other))
    }
}

/// Advance the modification time of an existing file to now.
///
/// The file content is left untouched.
pub fn touch(path: &Path) -> io::Result<()> {
    filetime::set_file_mtime(path, FileTime::now())
}
