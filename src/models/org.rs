//! Organization and user records consumed by notifications and
//! catalog registration.

use serde::{Deserialize, Serialize};

/// A data-provider organization.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Organization {
    pub name: String,

    /// CKAN harvest-source page for this organization, when registered
    /// (ends in `/harvest/<id>`)
    #[serde(default)]
    pub ckan_harvest_url: Option<String>,
}

/// A user belonging to an organization. Only the addresses matter to
/// the harvester; the first one is treated as primary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub organization: String,
    pub emails: Vec<String>,
}

impl User {
    /// The address failure notifications go to.
    pub fn primary_email(&self) -> Option<&str> {
        self.emails.first().map(|s| s.as_str()).filter(|s| !s.is_empty())
    }
}
