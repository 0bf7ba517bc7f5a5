//! In-memory [`CatalogStore`] implementation.
//!
//! Backs single-process CLI runs and tests. Uses `HashMap` and `Vec`
//! behind `std::sync::RwLock` for thread safety; ids are minted from a
//! process-local counter.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{Attempt, HarvestJob, Organization, Record, User};

use super::CatalogStore;

/// In-memory store for CLI runs and tests.
#[derive(Default)]
pub struct MemoryStore {
    harvests: RwLock<HashMap<String, HarvestJob>>,
    records: RwLock<Vec<Record>>,
    attempts: RwLock<Vec<Attempt>>,
    organizations: RwLock<HashMap<String, Organization>>,
    users: RwLock<Vec<User>>,
    next_id: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn mint_id(&self, prefix: &str) -> String {
        let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        format!("{prefix}-{n}")
    }

    /// Seed an organization.
    pub fn add_organization(&self, organization: Organization) {
        self.organizations
            .write()
            .unwrap()
            .insert(organization.name.clone(), organization);
    }

    /// Seed a user.
    pub fn add_user(&self, user: User) {
        self.users.write().unwrap().push(user);
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn publishable_harvests(&self) -> Result<Vec<HarvestJob>> {
        let harvests = self.harvests.read().unwrap();
        Ok(harvests.values().filter(|j| j.publish).cloned().collect())
    }

    async fn find_harvest(&self, id: &str) -> Result<Option<HarvestJob>> {
        let harvests = self.harvests.read().unwrap();
        Ok(harvests.get(id).cloned())
    }

    async fn upsert_harvest(&self, job: &HarvestJob) -> Result<()> {
        let mut harvests = self.harvests.write().unwrap();
        harvests.insert(job.id.clone(), job.clone());
        Ok(())
    }

    async fn delete_harvest(&self, id: &str) -> Result<()> {
        self.harvests.write().unwrap().remove(id);
        Ok(())
    }

    async fn records_for(&self, harvest_id: &str) -> Result<Vec<Record>> {
        let records = self.records.read().unwrap();
        Ok(records
            .iter()
            .filter(|r| r.harvest_id == harvest_id)
            .cloned()
            .collect())
    }

    async fn record_locations(&self, harvest_id: &str) -> Result<Vec<PathBuf>> {
        let records = self.records.read().unwrap();
        Ok(records
            .iter()
            .filter(|r| r.harvest_id == harvest_id)
            .map(|r| r.location.clone())
            .collect())
    }

    async fn upsert_record(&self, record: &Record) -> Result<String> {
        let mut records = self.records.write().unwrap();
        let mut stored = record.clone();
        if let Some(existing) = records
            .iter_mut()
            .find(|r| r.harvest_id == record.harvest_id && r.url == record.url)
        {
            stored.id = existing.id.clone();
            *existing = stored;
            return Ok(existing.id.clone());
        }
        stored.id = self.mint_id("rec");
        let id = stored.id.clone();
        records.push(stored);
        Ok(id)
    }

    async fn delete_records(&self, harvest_id: &str) -> Result<u64> {
        let mut records = self.records.write().unwrap();
        let before = records.len();
        records.retain(|r| r.harvest_id != harvest_id);
        Ok((before - records.len()) as u64)
    }

    async fn insert_attempt(&self, attempt: &Attempt) -> Result<String> {
        let mut attempts = self.attempts.write().unwrap();
        let mut stored = attempt.clone();
        stored.id = self.mint_id("att");
        let id = stored.id.clone();
        attempts.push(stored);
        Ok(id)
    }

    async fn attempts_for(&self, harvest_id: &str) -> Result<Vec<Attempt>> {
        let attempts = self.attempts.read().unwrap();
        Ok(attempts
            .iter()
            .filter(|a| a.harvest_id == harvest_id)
            .cloned()
            .collect())
    }

    async fn delete_attempts(&self, harvest_id: &str) -> Result<u64> {
        let mut attempts = self.attempts.write().unwrap();
        let before = attempts.len();
        attempts.retain(|a| a.harvest_id != harvest_id);
        Ok((before - attempts.len()) as u64)
    }

    async fn find_organization(&self, name: &str) -> Result<Option<Organization>> {
        let organizations = self.organizations.read().unwrap();
        Ok(organizations.get(name).cloned())
    }

    async fn users_in_organization(&self, organization: &str) -> Result<Vec<User>> {
        let users = self.users.read().unwrap();
        Ok(users
            .iter()
            .filter(|u| u.organization == organization)
            .cloned()
            .collect())
    }
}
