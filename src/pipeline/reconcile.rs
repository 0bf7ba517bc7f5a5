// src/pipeline/reconcile.rs

//! Stale-record garbage collection.
//!
//! After a run, any file the previous run produced that the new run
//! did not is stale and gets unlinked. The store rows were already
//! cleared at the start of the run, so only the files need tending.

use std::collections::HashSet;
use std::path::PathBuf;

use crate::error::Result;

/// Delete from disk every old location absent from the new set.
pub async fn purge_stale(
    new_locations: &HashSet<PathBuf>,
    old_locations: &HashSet<PathBuf>,
) -> Result<()> {
    log::info!("Purging old records");
    for location in old_locations.difference(new_locations) {
        match tokio::fs::remove_file(location).await {
            Ok(()) => log::info!("Removed {}", location.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}
