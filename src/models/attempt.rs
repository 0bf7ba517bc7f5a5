//! Append-only audit log of harvest runs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Why an attempt failed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AttemptFailure {
    /// Status code from the source, or 500 for internal failures
    pub code: u16,
    pub message: String,
}

/// One orchestration run of a harvest job. Attempts are only ever
/// inserted, never updated or deleted (except by cascading job
/// deletion).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Attempt {
    /// Store-assigned identifier (empty until inserted)
    #[serde(default)]
    pub id: String,

    /// Parent harvest job
    pub harvest_id: String,

    /// When the run finished
    pub date: DateTime<Utc>,

    /// Number of records collected
    pub num_records: u64,

    pub successful: bool,

    /// Present only on failed attempts
    pub failure: Option<AttemptFailure>,
}

impl Attempt {
    /// Record a successful run.
    pub fn success(harvest_id: impl Into<String>, num_records: u64) -> Self {
        Self {
            id: String::new(),
            harvest_id: harvest_id.into(),
            date: Utc::now(),
            num_records,
            successful: true,
            failure: None,
        }
    }

    /// Record a failed run.
    pub fn failed(harvest_id: impl Into<String>, code: u16, message: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            harvest_id: harvest_id.into(),
            date: Utc::now(),
            num_records: 0,
            successful: false,
            failure: Some(AttemptFailure {
                code,
                message: message.into(),
            }),
        }
    }
}
