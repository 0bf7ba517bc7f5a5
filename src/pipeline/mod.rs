//! Pipeline entry points for harvest operations.
//!
//! - `run_all_harvests`: run every publishable job, containing per-job
//!   failures
//! - `run_harvest`: run a single job end to end
//! - `request_run`: the external trigger surface (reset to pending)
//! - `delete_harvest`: cascading admin deletion
//! - `purge_stale`: reconcile a run's file set against the previous one
//! - `force_clean`: retention sweep over the download tree

pub mod clean;
pub mod harvest;
pub mod reconcile;

pub use clean::force_clean;
pub use harvest::{HarvestContext, delete_harvest, request_run, run_all_harvests, run_harvest};
pub use reconcile::purge_stale;
