//! Default trust store location under a Java installation.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use installcert_core::{InstallCertError, Result};
use tracing::debug;

/// Site-local override store, consulted first.
pub const OVERRIDE_STORE: &str = "jssecacerts";

/// Store shipped with the runtime.
pub const DEFAULT_STORE: &str = "cacerts";

/// Security directories relative to `JAVA_HOME`: JDK 9+ first, then the JDK 8 `jre/` layout.
const SECURITY_DIRS: &[&str] = &["lib/security", "jre/lib/security"];

/// Pick the store under `java_home`: `jssecacerts` if present, else `cacerts`.
#[must_use]
pub fn default_store_path(java_home: &Path) -> PathBuf {
    let dir = SECURITY_DIRS
        .iter()
        .map(|d| java_home.join(d))
        .find(|d| d.is_dir())
        .unwrap_or_else(|| java_home.join(SECURITY_DIRS[0]));

    let preferred = dir.join(OVERRIDE_STORE);
    if preferred.exists() {
        preferred
    } else {
        debug!(path = %preferred.display(), "no override store, using default");
        dir.join(DEFAULT_STORE)
    }
}

/// Resolve the store path from an explicit choice or `JAVA_HOME`.
///
/// # Errors
///
/// `Usage` if neither is available.
pub fn resolve_store_path(explicit: Option<&Path>, java_home: Option<&Path>) -> Result<PathBuf> {
    match (explicit, java_home) {
        (Some(path), _) => Ok(path.to_path_buf()),
        (None, Some(home)) => Ok(default_store_path(home)),
        (None, None) => Err(InstallCertError::Usage(
            "no keystore given and JAVA_HOME is not set; pass --keystore".to_string(),
        )),
    }
}

/// The file `path` finally points to, following symlinks.
///
/// Falls back to `path` itself when it cannot be resolved (for instance
/// because it does not exist yet).
#[must_use]
pub fn real_path(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Check the store exists and can be opened for writing.
///
/// # Errors
///
/// `StoreRead` ("cannot open" / "cannot write to").
pub fn check_access(path: &Path) -> Result<()> {
    let path_str = path.display().to_string();
    if !path.is_file() {
        return Err(InstallCertError::StoreRead {
            action: "open",
            path: path_str,
            reason: "no such file".to_string(),
        });
    }
    OpenOptions::new()
        .write(true)
        .open(path)
        .map_err(|e| InstallCertError::store_io("write to", path_str, &e))?;
    Ok(())
}
