//! Harvest job data structures.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Source protocol a harvest job is driven by.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum HarvestType {
    /// Plain HTTP directory listing
    #[serde(rename = "WAF")]
    Waf,

    /// ERDDAP-flavored directory listing (version-dependent markup)
    #[serde(rename = "ERDDAP-WAF")]
    ErddapWaf,

    /// Catalogue Service for the Web endpoint
    #[serde(rename = "CSW")]
    Csw,
}

impl fmt::Display for HarvestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            HarvestType::Waf => "WAF",
            HarvestType::ErddapWaf => "ERDDAP-WAF",
            HarvestType::Csw => "CSW",
        };
        f.write_str(s)
    }
}

impl FromStr for HarvestType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "WAF" => Ok(HarvestType::Waf),
            "ERDDAP-WAF" => Ok(HarvestType::ErddapWaf),
            "CSW" => Ok(HarvestType::Csw),
            other => Err(AppError::UnsupportedHarvestType(other.to_string())),
        }
    }
}

/// Outcome of the most recent run of a harvest job.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum HarvestStatus {
    /// Queued for execution
    #[default]
    Pending,
    /// A run is in flight
    Harvesting,
    /// Last run completed
    Ok,
    /// Last run failed
    Fail,
}

/// A configured harvest source. Status and counts are mutated only by
/// the orchestrator; the job itself outlives any single run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HarvestJob {
    /// Unique identifier
    pub id: String,

    /// Human-readable name
    pub name: String,

    /// URL of the WAF root or CSW endpoint
    pub url: String,

    /// Protocol used to enumerate documents
    pub harvest_type: HarvestType,

    /// Owning organization (also the on-disk subdirectory name)
    pub organization: String,

    /// Whether scheduled runs pick this job up
    pub publish: bool,

    /// Status of the most recent run
    #[serde(default)]
    pub last_status: HarvestStatus,

    /// Completion time of the most recent run
    #[serde(default)]
    pub last_harvest_at: Option<DateTime<Utc>>,

    /// Documents seen on the most recent run
    #[serde(default)]
    pub last_record_count: u64,

    /// Documents without errors on the most recent run
    #[serde(default)]
    pub last_good_count: u64,

    /// Documents with errors on the most recent run
    #[serde(default)]
    pub last_bad_count: u64,
}

impl HarvestJob {
    /// Create a job that has never run.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        url: impl Into<String>,
        harvest_type: HarvestType,
        organization: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            url: url.into(),
            harvest_type,
            organization: organization.into(),
            publish: true,
            last_status: HarvestStatus::Pending,
            last_harvest_at: None,
            last_record_count: 0,
            last_good_count: 0,
            last_bad_count: 0,
        }
    }
}
