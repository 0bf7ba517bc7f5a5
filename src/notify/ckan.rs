// src/notify/ckan.rs

//! CKAN catalog registration.
//!
//! After a successful harvest the downstream CKAN catalog is told to
//! re-import the organization's source. Registration is best-effort:
//! failures are logged, never propagated into the harvest result.

use std::time::Duration;

use crate::config::{HttpConfig, RegistryConfig};
use crate::error::{AppError, Result};
use crate::models::HarvestJob;
use crate::storage::CatalogStore;

/// Thin client for the two CKAN harvest endpoints the pipeline drives.
pub struct CkanClient {
    client: reqwest::Client,
    api_root: String,
    api_key: Option<String>,
}

impl CkanClient {
    /// Build a client when a CKAN API root is configured; `None`
    /// disables registration triggering entirely.
    pub fn from_config(registry: &RegistryConfig, http: &HttpConfig) -> Result<Option<Self>> {
        let Some(api) = &registry.ckan_api else {
            return Ok(None);
        };
        let client = reqwest::Client::builder()
            .user_agent(&http.user_agent)
            .timeout(Duration::from_secs(http.timeout_secs))
            .build()?;
        Ok(Some(Self {
            client,
            api_root: format!("{}/api/3", api.trim_end_matches('/')),
            api_key: registry.ckan_api_key.clone(),
        }))
    }

    /// Fetch the CKAN harvest source object (harvest_source_show).
    pub async fn harvest_source(&self, ckan_harvest_id: &str) -> Result<serde_json::Value> {
        let url = format!("{}/action/harvest_source_show", self.api_root);
        let response = self
            .client
            .get(&url)
            .query(&[("id", ckan_harvest_id)])
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            log::error!("CKAN error: HTTP {}", status);
            return Err(AppError::harvest(
                "ckan",
                format!("harvest_source_show returned HTTP {status}"),
            ));
        }
        let payload: serde_json::Value = response.json().await?;
        Ok(payload.get("result").cloned().unwrap_or_default())
    }

    /// Create a new harvest job on CKAN (harvest_job_create).
    pub async fn create_harvest_job(&self, source_id: &str) -> Result<serde_json::Value> {
        let url = format!("{}/action/harvest_job_create", self.api_root);
        let mut request = self
            .client
            .post(&url)
            .json(&serde_json::json!({ "source_id": source_id }));
        if let Some(key) = &self.api_key {
            request = request.header("Authorization", key);
        }
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            log::error!("CKAN error: HTTP {}", status);
            return Err(AppError::harvest(
                "ckan",
                format!("harvest_job_create returned HTTP {status}"),
            ));
        }
        Ok(response.json().await?)
    }
}

/// Extract the CKAN harvest id from an organization's harvest page URL
/// (`.../harvest/<id>`).
pub fn harvest_id_from_url(ckan_harvest_url: &str) -> Result<String> {
    match ckan_harvest_url.rsplit_once("/harvest/") {
        Some((_, id)) if !id.trim_matches('/').is_empty() => {
            Ok(id.trim_matches('/').to_string())
        }
        _ => Err(AppError::harvest(
            "ckan",
            format!("no harvest id in ckan_harvest_url {ckan_harvest_url}"),
        )),
    }
}

/// Fire-and-forget registration trigger. Failures are logged and
/// swallowed so a flaky catalog cannot fail an otherwise good harvest.
pub async fn trigger_source_update(
    store: &dyn CatalogStore,
    ckan: Option<&CkanClient>,
    job: &HarvestJob,
) {
    let Some(client) = ckan else {
        return;
    };
    if let Err(e) = try_trigger(store, client, job).await {
        log::error!("Failed to initiate CKAN harvest: {}", e);
    }
}

async fn try_trigger(
    store: &dyn CatalogStore,
    client: &CkanClient,
    job: &HarvestJob,
) -> Result<()> {
    let organization = store
        .find_organization(&job.organization)
        .await?
        .ok_or_else(|| {
            AppError::harvest(
                "ckan",
                format!("harvest has no valid organization: {}", job.organization),
            )
        })?;
    let ckan_url = organization.ckan_harvest_url.ok_or_else(|| {
        AppError::harvest(
            "ckan",
            format!("organization {} has no ckan_harvest_url", organization.name),
        )
    })?;

    let ckan_harvest_id = harvest_id_from_url(&ckan_url)?;
    let source = client.harvest_source(&ckan_harvest_id).await?;
    let source_id = source
        .get("id")
        .and_then(|v| v.as_str())
        .ok_or_else(|| AppError::harvest("ckan", "harvest_source_show result has no id"))?;
    client.create_harvest_job(source_id).await?;
    Ok(())
}
