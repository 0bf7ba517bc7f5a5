// src/pipeline/clean.rs

//! Retention sweep over the download tree.
//!
//! Removes `.xml` files older than the retention window anywhere under
//! the destination root. This is an independent maintenance operation,
//! not tied to any particular harvest job; records a live job still
//! references get rewritten on its next run anyway.

use std::fs;
use std::path::Path;
use std::time::{Duration, SystemTime};

use crate::error::Result;

/// Delete `.xml` files under `path` older than `max_days` days.
/// Returns how many files were removed.
pub fn force_clean(path: &Path, max_days: u64) -> Result<u64> {
    let cutoff = SystemTime::now()
        .checked_sub(Duration::from_secs(max_days * 24 * 3600))
        .unwrap_or(SystemTime::UNIX_EPOCH);
    let mut removed = 0;
    sweep(path, cutoff, &mut removed)?;
    Ok(removed)
}

fn sweep(dir: &Path, cutoff: SystemTime, removed: &mut u64) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            sweep(&path, cutoff, removed)?;
            continue;
        }
        if path.extension().and_then(|e| e.to_str()) != Some("xml") {
            continue;
        }
        let modified = entry.metadata()?.modified()?;
        if modified < cutoff {
            log::info!("Removing {}", path.display());
            fs::remove_file(&path)?;
            *removed += 1;
        }
    }
    Ok(())
}
