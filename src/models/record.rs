//! Harvested metadata record structures.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A service endpoint advertised by a metadata record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServiceEndpoint {
    /// Protocol name as written in the record (e.g. "OPeNDAP:OPeNDAP")
    pub service_type: Option<String>,

    /// Connect-point URL
    pub service_url: String,
}

/// One schema violation reported for a record.
///
/// `line_number` is `None` when the position is unknown, e.g. for
/// documents that did not parse at all.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidationError {
    pub line_number: Option<u64>,
    pub error: String,
}

impl ValidationError {
    pub fn new(line_number: Option<u64>, error: impl Into<String>) -> Self {
        Self {
            line_number,
            error: error.into(),
        }
    }
}

/// One document discovered during a harvest run.
///
/// Records are re-created on every run; a record carrying validation
/// errors counts toward the bad tally but is persisted all the same.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Record {
    /// Store-assigned identifier (empty until inserted)
    #[serde(default)]
    pub id: String,

    /// Parent harvest job
    pub harvest_id: String,

    /// URL the document was downloaded from
    pub url: String,

    /// Public URL of the mirrored document; `None` when the contents
    /// are suspect (failed geometry repair, malformed XML)
    pub record_url: Option<String>,

    /// Where the document was written on local disk
    pub location: PathBuf,

    /// Title extracted from the identification section
    pub title: String,

    /// Abstract extracted from the identification section
    pub description: String,

    /// Service endpoints advertised by the record
    pub services: Vec<ServiceEndpoint>,

    /// Hex digest of the raw bytes; `None` for malformed documents
    pub fingerprint: Option<String>,

    /// Date stamp as written in the document
    pub metadata_date: Option<String>,

    /// ISO 19115 file identifier
    pub file_identifier: Option<String>,

    /// Schema violations; empty means the record validated cleanly
    pub validation_errors: Vec<ValidationError>,

    /// When this record was produced
    pub update_time: DateTime<Utc>,
}

impl Record {
    /// True when the record carries no validation errors.
    pub fn is_clean(&self) -> bool {
        self.validation_errors.is_empty()
    }
}
