//! Storage abstractions for harvest persistence.
//!
//! The [`CatalogStore`] trait defines every persistence operation the
//! pipeline needs — harvest jobs, records, attempts, organizations and
//! users — enabling pluggable backends. Crawlers and validators never
//! touch the store; the orchestrator is its only writer for job state.
//!
//! Implementations must be `Send + Sync` and tolerate concurrent
//! access scoped by harvest id.

pub mod memory;

use std::path::PathBuf;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{Attempt, HarvestJob, Organization, Record, User};

// Re-export for convenience
pub use memory::MemoryStore;

/// Abstract persistence backend for the harvester.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Jobs flagged for publication, in no particular order.
    async fn publishable_harvests(&self) -> Result<Vec<HarvestJob>>;

    /// Look up one harvest job by id.
    async fn find_harvest(&self, id: &str) -> Result<Option<HarvestJob>>;

    /// Insert or replace a harvest job keyed by id.
    async fn upsert_harvest(&self, job: &HarvestJob) -> Result<()>;

    /// Delete a harvest job row. Cascading cleanup of records,
    /// attempts and files is the pipeline's responsibility.
    async fn delete_harvest(&self, id: &str) -> Result<()>;

    /// All records belonging to a harvest.
    async fn records_for(&self, harvest_id: &str) -> Result<Vec<Record>>;

    /// File locations of a harvest's records, for reconciliation.
    async fn record_locations(&self, harvest_id: &str) -> Result<Vec<PathBuf>>;

    /// Insert or replace a record keyed by (harvest, source URL).
    /// Returns the record id.
    async fn upsert_record(&self, record: &Record) -> Result<String>;

    /// Delete every record belonging to a harvest; returns how many.
    async fn delete_records(&self, harvest_id: &str) -> Result<u64>;

    /// Append one attempt to the audit log. Returns the attempt id.
    async fn insert_attempt(&self, attempt: &Attempt) -> Result<String>;

    /// Attempts for a harvest, oldest first.
    async fn attempts_for(&self, harvest_id: &str) -> Result<Vec<Attempt>>;

    /// Delete every attempt belonging to a harvest; returns how many.
    async fn delete_attempts(&self, harvest_id: &str) -> Result<u64>;

    /// Look up an organization by name.
    async fn find_organization(&self, name: &str) -> Result<Option<Organization>>;

    /// Users belonging to an organization.
    async fn users_in_organization(&self, organization: &str) -> Result<Vec<User>>;
}
