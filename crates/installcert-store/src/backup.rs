//! Timestamped copies of the store file taken before a save.

use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, NaiveDateTime};
use installcert_core::{InstallCertError, Result};
use tracing::info;

use crate::locate::real_path;

/// Suffix format appended to backup file names.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// Backup path for `path` taken at `at`: `<name>.<YYYY-MM-DD_HH-MM-SS>` in the same directory.
#[must_use]
pub fn backup_path(path: &Path, at: DateTime<Local>) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".");
    name.push(at.format(TIMESTAMP_FORMAT).to_string());
    path.with_file_name(name)
}

/// Recover the timestamp from a backup of `original`, if `candidate` is one.
#[must_use]
pub fn backup_timestamp(original: &Path, candidate: &Path) -> Option<NaiveDateTime> {
    let base = original.file_name()?.to_str()?;
    let name = candidate.file_name()?.to_str()?;
    let suffix = name.strip_prefix(base)?.strip_prefix('.')?;
    NaiveDateTime::parse_from_str(suffix, TIMESTAMP_FORMAT).ok()
}

/// Copy `path` to a timestamped sibling, keeping permissions and modification time.
///
/// A symlinked `path` is backed up next to the file it points to.
/// Refuses to overwrite an existing backup taken in the same second.
///
/// # Errors
///
/// Returns `InstallCertError::Backup`; callers report it and carry on with the save.
pub fn backup(path: &Path) -> Result<PathBuf> {
    let real = real_path(path);
    let path = real.as_path();
    let target = backup_path(path, Local::now());
    info!(from = %path.display(), to = %target.display(), "backing up key store");

    copy_preserving(path, &target).map_err(|e| InstallCertError::Backup {
        path: target.display().to_string(),
        reason: e.to_string(),
    })?;
    Ok(target)
}

fn copy_preserving(from: &Path, to: &Path) -> io::Result<()> {
    let meta = fs::metadata(from)?;
    let mut src = fs::File::open(from)?;
    let mut dst = OpenOptions::new().write(true).create_new(true).open(to)?;
    io::copy(&mut src, &mut dst)?;
    dst.sync_all()?;
    dst.set_modified(meta.modified()?)?;
    fs::set_permissions(to, meta.permissions())?;
    Ok(())
}
