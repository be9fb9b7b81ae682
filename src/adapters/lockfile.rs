//! Stale lock artifact cleanup.
//!
//! A previous run may leave its lock file behind after a crash or power
//! loss.  Startup removes it; a missing file is the normal case.

use std::io::ErrorKind;
use std::path::Path;

use log::{info, warn};

/// Remove `path` if it exists.  Returns `true` when a file was removed.
pub fn remove_stale_lock(path: impl AsRef<Path>) -> bool {
    let path = path.as_ref();
    match std::fs::remove_file(path) {
        Ok(()) => {
            info!("Removed stale lock {}", path.display());
            true
        }
        Err(e) if e.kind() == ErrorKind::NotFound => false,
        Err(e) => {
            warn!("Could not remove lock {}: {}", path.display(), e);
            false
        }
    }
}
