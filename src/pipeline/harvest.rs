// src/pipeline/harvest.rs

//! Harvest orchestration.
//!
//! Runs one job end to end: enumerate source documents over the job's
//! protocol, download each one, validate and repair it, persist the
//! record, then reconcile the file set against the previous run. A
//! failed document is counted and skipped; a failed job is marked
//! `fail` and notified; only an operator interrupt escapes.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Utc;
use sha2::{Digest, Sha256};

use crate::config::Config;
use crate::error::Result;
use crate::models::{Attempt, HarvestJob, HarvestStatus, HarvestType, Record, RunSummary, ValidationError};
use crate::notify::ckan::{self, CkanClient};
use crate::notify::{NotificationThrottle, Notifier, send_failure_notifications};
use crate::services::csw::CswClient;
use crate::services::geometry;
use crate::services::links::ErddapLinkExtractor;
use crate::services::validate::{ValidationOutcome, validate};
use crate::services::waf::{LinkMode, WafCrawler};
use crate::storage::CatalogStore;
use crate::utils::Interrupt;
use crate::utils::http::{self, Fetcher};
use crate::utils::url::{public_record_url, sanitize_document_name};

/// Everything a harvest run needs, passed explicitly; there is no
/// process-wide registry of connections or configuration.
pub struct HarvestContext<'a> {
    pub config: &'a Config,
    pub store: &'a dyn CatalogStore,
    pub fetcher: &'a dyn Fetcher,
    pub notifier: &'a dyn Notifier,
    pub throttle: &'a NotificationThrottle,
    pub ckan: Option<&'a CkanClient>,
    /// Root directory documents are downloaded under
    pub dest: PathBuf,
    pub interrupt: Interrupt,
}

/// Run every publishable harvest job. A job failing never stops the
/// others; an interrupt stops everything.
pub async fn run_all_harvests(ctx: &HarvestContext<'_>) -> Result<()> {
    for job in ctx.store.publishable_harvests().await? {
        match run_harvest(ctx, &job).await {
            Ok(()) => {}
            Err(e) if e.is_interrupt() => return Err(e),
            Err(e) => {
                log::error!("Failed to harvest {}: {}", job.url, e);
            }
        }
    }
    Ok(())
}

/// External trigger surface: reset a job to pending with cleared
/// counts and acknowledge. Actual execution happens out of band.
pub async fn request_run(store: &dyn CatalogStore, harvest_id: &str) -> Result<()> {
    let mut job = store.find_harvest(harvest_id).await?.ok_or_else(|| {
        crate::error::AppError::harvest("trigger", format!("no harvest with id {harvest_id}"))
    })?;
    job.last_status = HarvestStatus::Pending;
    job.last_record_count = 0;
    job.last_good_count = 0;
    job.last_bad_count = 0;
    store.upsert_harvest(&job).await
}

/// Admin deletion: remove a job's files, records, attempts and finally
/// the job itself.
pub async fn delete_harvest(store: &dyn CatalogStore, harvest_id: &str) -> Result<()> {
    for record in store.records_for(harvest_id).await? {
        match tokio::fs::remove_file(&record.location).await {
            Ok(()) => log::info!("Removed {}", record.location.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
    }
    store.delete_records(harvest_id).await?;
    store.delete_attempts(harvest_id).await?;
    store.delete_harvest(harvest_id).await?;
    Ok(())
}

/// Run one harvest job end to end, updating its status and counts.
///
/// The returned `Err` is reserved for interrupts and for failures to
/// write the job's own bookkeeping; harvesting failures are folded
/// into a `fail` status instead.
pub async fn run_harvest(ctx: &HarvestContext<'_>, job: &HarvestJob) -> Result<()> {
    log::info!("Harvesting: {}", job.url);

    // visible to status queries before any network traffic
    let mut running = job.clone();
    running.last_status = HarvestStatus::Harvesting;
    ctx.store.upsert_harvest(&running).await?;

    match execute_harvest(ctx, job).await {
        Ok(summary) => {
            let mut updated = job.clone();
            updated.last_harvest_at = Some(Utc::now());
            updated.last_record_count = summary.count;
            updated.last_good_count = summary.good();
            updated.last_bad_count = summary.errors;
            updated.last_status = HarvestStatus::Ok;
            ctx.store.upsert_harvest(&updated).await?;
            ctx.store
                .insert_attempt(&Attempt::success(&job.id, summary.count))
                .await?;
            ckan::trigger_source_update(ctx.store, ctx.ckan, job).await;
            Ok(())
        }
        Err(e) if e.is_interrupt() => Err(e),
        Err(e) => {
            log::error!("Failed to successfully harvest {}: {}", job.url, e);
            if let Err(notify_err) =
                send_failure_notifications(ctx.store, ctx.notifier, ctx.throttle, job).await
            {
                log::error!("Failed to send failure notifications: {}", notify_err);
            }
            ctx.store
                .insert_attempt(&Attempt::failed(&job.id, 500, e.to_string()))
                .await?;
            let mut updated = job.clone();
            updated.last_harvest_at = Some(Utc::now());
            updated.last_status = HarvestStatus::Fail;
            ctx.store.upsert_harvest(&updated).await?;
            Ok(())
        }
    }
}

async fn execute_harvest(ctx: &HarvestContext<'_>, job: &HarvestJob) -> Result<RunSummary> {
    let dest = ctx.dest.join(&job.organization);
    tokio::fs::create_dir_all(&dest).await?;

    // snapshot the previous run's file locations, then clear the slate
    let old_locations: HashSet<PathBuf> = ctx
        .store
        .record_locations(&job.id)
        .await?
        .into_iter()
        .collect();
    ctx.store.delete_records(&job.id).await?;

    let (summary, new_locations) = match job.harvest_type {
        HarvestType::Waf => harvest_waf(ctx, job, &dest, LinkMode::Standard).await?,
        HarvestType::ErddapWaf => {
            let extractor = ErddapLinkExtractor::new(&ctx.config.erddap.version_threshold);
            harvest_waf(ctx, job, &dest, LinkMode::Erddap(extractor)).await?
        }
        HarvestType::Csw => harvest_csw(ctx, job, &dest).await?,
    };

    crate::pipeline::reconcile::purge_stale(&new_locations, &old_locations).await?;
    Ok(summary)
}

/// Crawl a WAF and process each discovered document.
async fn harvest_waf(
    ctx: &HarvestContext<'_>,
    job: &HarvestJob,
    dest: &Path,
    mode: LinkMode,
) -> Result<(RunSummary, HashSet<PathBuf>)> {
    let crawler = WafCrawler::new(ctx.fetcher, ctx.config.waf.max_depth, mode);
    let links = crawler.crawl(&job.url, &ctx.interrupt).await?;

    let delay = Duration::from_millis(ctx.config.http.request_delay_ms);
    let mut summary = RunSummary::default();
    let mut new_locations = HashSet::new();

    for link in links {
        ctx.interrupt.check()?;
        log::info!("Downloading {}", link);

        let file_name = match job.harvest_type {
            // ERDDAP names are stable and meaningful; keep them
            HarvestType::ErddapWaf => {
                sanitize_document_name(link.rsplit('/').next().unwrap_or(&link))
            }
            // WAF paths can collide across subdirectories; hash the
            // full link instead
            _ => format!("{}.xml", hex::encode(Sha256::digest(link.as_bytes()))),
        };

        match process_document(ctx, job, dest, &link, &file_name).await {
            Ok(record) => {
                new_locations.insert(record.location.clone());
                summary.count += 1;
                if !record.is_clean() {
                    summary.errors += 1;
                }
            }
            Err(e) if e.is_interrupt() => return Err(e),
            Err(e) => {
                summary.errors += 1;
                log::error!("Failed to download {}: {}", link, e);
            }
        }

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    Ok((summary, new_locations))
}

/// Page a CSW endpoint and process each returned record.
async fn harvest_csw(
    ctx: &HarvestContext<'_>,
    job: &HarvestJob,
    dest: &Path,
) -> Result<(RunSummary, HashSet<PathBuf>)> {
    let client = CswClient::new(ctx.fetcher, &ctx.config.csw);
    let mut pager = client.pager(&job.url);

    let mut summary = RunSummary::default();
    let mut new_locations = HashSet::new();

    while let Some(records) = pager.next_page(&ctx.interrupt).await? {
        for csw_record in records {
            ctx.interrupt.check()?;
            let name = csw_record
                .identifier
                .clone()
                .unwrap_or_else(|| format!("record-{}", summary.count + 1));

            match process_csw_record(ctx, job, dest, &name, &csw_record.xml).await {
                Ok(record) => {
                    new_locations.insert(record.location.clone());
                    summary.count += 1;
                    if !record.is_clean() {
                        summary.errors += 1;
                    }
                }
                Err(e) if e.is_interrupt() => return Err(e),
                Err(e) => {
                    summary.errors += 1;
                    log::error!("Failed to process record {}: {}", name, e);
                }
            }
        }
    }

    Ok((summary, new_locations))
}

/// Download one WAF document, build its record and persist it.
async fn process_document(
    ctx: &HarvestContext<'_>,
    job: &HarvestJob,
    dest: &Path,
    link: &str,
    file_name: &str,
) -> Result<Record> {
    let location = dest.join(file_name);
    log::info!("Saving to {}", location.display());
    http::download_file(ctx.fetcher, link, &location).await?;
    let raw = tokio::fs::read(&location).await?;

    let record = build_record(ctx, job, link, &location, file_name, &raw).await;
    ctx.store.upsert_record(&record).await?;
    Ok(record)
}

/// Write one CSW record to disk, build its record and persist it.
async fn process_csw_record(
    ctx: &HarvestContext<'_>,
    job: &HarvestJob,
    dest: &Path,
    name: &str,
    raw: &[u8],
) -> Result<Record> {
    let file_name = sanitize_document_name(name);
    let location = dest.join(&file_name);
    log::info!("Writing to file {}", location.display());
    if let Some(parent) = location.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(&location, raw).await?;

    let link = CswClient::get_record_url(&job.url, name)?;
    let record = build_record(ctx, job, &link, &location, &file_name, raw).await;
    ctx.store.upsert_record(&record).await?;
    Ok(record)
}

/// Validate, repair and assemble the record for one document. Never
/// fails: malformed documents and broken geometry degrade into
/// validation errors on the record.
async fn build_record(
    ctx: &HarvestContext<'_>,
    job: &HarvestJob,
    link: &str,
    location: &Path,
    file_name: &str,
    raw: &[u8],
) -> Record {
    let record_url = public_record_url(
        &ctx.config.registry.waf_url_root,
        &job.organization,
        file_name,
    );

    match validate(raw) {
        ValidationOutcome::Parsed(parsed) => {
            let mut record = Record {
                id: String::new(),
                harvest_id: job.id.clone(),
                url: link.to_string(),
                record_url: Some(record_url.clone()),
                location: location.to_path_buf(),
                title: parsed.title.unwrap_or_default(),
                description: parsed.description.unwrap_or_default(),
                services: parsed.services,
                fingerprint: Some(parsed.fingerprint),
                metadata_date: parsed.metadata_date,
                file_identifier: parsed.file_identifier,
                validation_errors: parsed.validation_errors,
                update_time: Utc::now(),
            };

            // validation first, then the geometry fix; a document we
            // cannot repair is suspect, so drop its public URL
            if let Err(e) = geometry::patch(location).await {
                log::error!("Failed to patch geometry for {}: {}", record_url, e);
                record.validation_errors = vec![ValidationError::new(
                    None,
                    "Invalid Geometry. See gmd:EX_GeographicBoundingBox",
                )];
                record.record_url = None;
            }
            record
        }
        ValidationOutcome::Malformed { error } => {
            log::error!("Record from '{}' had malformed XML, keeping degraded record", link);
            Record {
                id: String::new(),
                harvest_id: job.id.clone(),
                url: link.to_string(),
                record_url: None,
                location: location.to_path_buf(),
                title: record_url,
                description: String::new(),
                services: Vec::new(),
                fingerprint: None,
                metadata_date: None,
                file_identifier: None,
                validation_errors: vec![ValidationError::new(
                    None,
                    format!("XML Syntax Error: {error}"),
                )],
                update_time: Utc::now(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Organization, User};
    use crate::notify::testing::RecordingNotifier;
    use crate::services::validate::fixtures::CLEAN_RECORD;
    use crate::storage::MemoryStore;
    use crate::utils::http::testing::StaticFetcher;
    use tempfile::TempDir;

    fn listing(hrefs: &[&str]) -> String {
        let mut html = String::from("<html><body><pre>");
        for href in hrefs {
            html.push_str(&format!(r#"<a href="{href}">{href}</a>"#));
        }
        html.push_str("</pre></body></html>");
        html
    }

    struct Harness {
        config: Config,
        store: MemoryStore,
        notifier: RecordingNotifier,
        throttle: NotificationThrottle,
        dest: TempDir,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                config: Config::default(),
                store: MemoryStore::new(),
                notifier: RecordingNotifier::new(),
                throttle: NotificationThrottle::new(Duration::from_secs(3600)),
                dest: TempDir::new().unwrap(),
            }
        }

        fn ctx<'a>(&'a self, fetcher: &'a dyn Fetcher) -> HarvestContext<'a> {
            HarvestContext {
                config: &self.config,
                store: &self.store,
                fetcher,
                notifier: &self.notifier,
                throttle: &self.throttle,
                ckan: None,
                dest: self.dest.path().to_path_buf(),
                interrupt: Interrupt::new(),
            }
        }
    }

    fn waf_job() -> HarvestJob {
        HarvestJob::new(
            "h1",
            "test waf",
            "http://waf.example.com/",
            HarvestType::Waf,
            "neracoos",
        )
    }

    fn two_document_fetcher() -> StaticFetcher {
        StaticFetcher::new()
            .page(
                "http://waf.example.com/",
                listing(&["good.xml", "bad.xml"]),
            )
            .page("http://waf.example.com/good.xml", CLEAN_RECORD)
            .page("http://waf.example.com/bad.xml", "<gmd:MD_Metadata><oops")
    }

    #[tokio::test]
    async fn test_waf_run_counts_and_persists_partial_failures() {
        let harness = Harness::new();
        let fetcher = two_document_fetcher();
        let ctx = harness.ctx(&fetcher);
        let job = waf_job();

        harness.store.upsert_harvest(&job).await.unwrap();
        run_harvest(&ctx, &job).await.unwrap();

        let updated = harness.store.find_harvest("h1").await.unwrap().unwrap();
        assert_eq!(updated.last_status, HarvestStatus::Ok);
        assert_eq!(updated.last_record_count, 2);
        assert_eq!(updated.last_good_count, 1);
        assert_eq!(updated.last_bad_count, 1);
        assert!(updated.last_harvest_at.is_some());

        let records = harness.store.records_for("h1").await.unwrap();
        assert_eq!(records.len(), 2);
        let clean: Vec<_> = records.iter().filter(|r| r.is_clean()).collect();
        let degraded: Vec<_> = records.iter().filter(|r| !r.is_clean()).collect();
        assert_eq!(clean.len(), 1);
        assert_eq!(degraded.len(), 1);

        assert_eq!(
            clean[0].file_identifier.as_deref(),
            Some("urn:ioos:station:wmo:44013")
        );
        assert!(clean[0].fingerprint.is_some());
        assert!(clean[0].record_url.is_some());
        assert!(clean[0].location.exists());

        assert!(degraded[0].fingerprint.is_none());
        assert!(degraded[0].record_url.is_none());
        assert!(degraded[0].validation_errors[0].error.contains("XML Syntax Error"));
        assert!(degraded[0].location.exists());

        let attempts = harness.store.attempts_for("h1").await.unwrap();
        assert_eq!(attempts.len(), 1);
        assert!(attempts[0].successful);
        assert_eq!(attempts[0].num_records, 2);

        assert_eq!(harness.notifier.message_count(), 0);
    }

    #[tokio::test]
    async fn test_rerunning_an_unchanged_source_is_idempotent() {
        let harness = Harness::new();
        let fetcher = two_document_fetcher();
        let ctx = harness.ctx(&fetcher);
        let job = waf_job();
        harness.store.upsert_harvest(&job).await.unwrap();

        run_harvest(&ctx, &job).await.unwrap();
        let first: Vec<_> = harness.store.records_for("h1").await.unwrap();

        run_harvest(&ctx, &job).await.unwrap();
        let second: Vec<_> = harness.store.records_for("h1").await.unwrap();

        assert_eq!(first.len(), 2);
        assert_eq!(second.len(), 2);

        let fingerprints = |records: &[Record]| {
            let mut prints: Vec<Option<String>> =
                records.iter().map(|r| r.fingerprint.clone()).collect();
            prints.sort();
            prints
        };
        assert_eq!(fingerprints(&first), fingerprints(&second));

        // reconciliation found nothing stale: every first-run file is
        // still on disk
        for record in &first {
            assert!(record.location.exists());
        }
    }

    #[tokio::test]
    async fn test_stale_documents_are_purged_on_the_next_run() {
        let harness = Harness::new();
        let job = waf_job();
        harness.store.upsert_harvest(&job).await.unwrap();

        let fetcher = StaticFetcher::new()
            .page(
                "http://waf.example.com/",
                listing(&["keep.xml", "stale.xml"]),
            )
            .page("http://waf.example.com/keep.xml", CLEAN_RECORD)
            .page("http://waf.example.com/stale.xml", CLEAN_RECORD);
        let ctx = harness.ctx(&fetcher);
        run_harvest(&ctx, &job).await.unwrap();

        let first_locations: Vec<PathBuf> = harness
            .store
            .record_locations("h1")
            .await
            .unwrap();
        assert_eq!(first_locations.len(), 2);

        // the source dropped stale.xml
        let fetcher = StaticFetcher::new()
            .page("http://waf.example.com/", listing(&["keep.xml"]))
            .page("http://waf.example.com/keep.xml", CLEAN_RECORD);
        let ctx = harness.ctx(&fetcher);
        run_harvest(&ctx, &job).await.unwrap();

        let second_locations: Vec<PathBuf> = harness
            .store
            .record_locations("h1")
            .await
            .unwrap();
        assert_eq!(second_locations.len(), 1);

        for location in &first_locations {
            if second_locations.contains(location) {
                assert!(location.exists());
            } else {
                assert!(!location.exists(), "stale file should be unlinked");
            }
        }
    }

    #[tokio::test]
    async fn test_failed_run_marks_fail_and_notifies() {
        let harness = Harness::new();
        harness.store.add_organization(Organization {
            name: "neracoos".into(),
            ckan_harvest_url: None,
        });
        harness.store.add_user(User {
            organization: "neracoos".into(),
            emails: vec!["ops@example.com".into()],
        });

        // CSW endpoint that 404s on every page request
        let fetcher = StaticFetcher::new();
        let ctx = harness.ctx(&fetcher);
        let job = HarvestJob::new(
            "h1",
            "bad csw",
            "http://csw.example.com/csw",
            HarvestType::Csw,
            "neracoos",
        );
        harness.store.upsert_harvest(&job).await.unwrap();

        run_harvest(&ctx, &job).await.unwrap();

        let updated = harness.store.find_harvest("h1").await.unwrap().unwrap();
        assert_eq!(updated.last_status, HarvestStatus::Fail);

        let attempts = harness.store.attempts_for("h1").await.unwrap();
        assert_eq!(attempts.len(), 1);
        assert!(!attempts[0].successful);
        assert!(attempts[0].failure.is_some());

        assert_eq!(harness.notifier.message_count(), 1);
        let messages = harness.notifier.messages.lock().unwrap();
        assert_eq!(messages[0].0, vec!["ops@example.com".to_string()]);
    }

    #[tokio::test]
    async fn test_interrupt_propagates_out_of_a_run() {
        let harness = Harness::new();
        let fetcher = two_document_fetcher();
        let mut ctx = harness.ctx(&fetcher);
        let interrupt = Interrupt::new();
        interrupt.trigger();
        ctx.interrupt = interrupt;

        let job = waf_job();
        harness.store.upsert_harvest(&job).await.unwrap();
        let err = run_harvest(&ctx, &job).await.unwrap_err();
        assert!(err.is_interrupt());
        // no failure notification on interrupt
        assert_eq!(harness.notifier.message_count(), 0);
    }

    #[tokio::test]
    async fn test_run_all_contains_single_job_failures() {
        let harness = Harness::new();
        let fetcher = two_document_fetcher();
        let ctx = harness.ctx(&fetcher);

        let good = waf_job();
        let mut bad = HarvestJob::new(
            "h2",
            "bad csw",
            "http://csw.example.com/csw",
            HarvestType::Csw,
            "neracoos",
        );
        bad.publish = true;
        harness.store.upsert_harvest(&good).await.unwrap();
        harness.store.upsert_harvest(&bad).await.unwrap();

        run_all_harvests(&ctx).await.unwrap();

        let good_after = harness.store.find_harvest("h1").await.unwrap().unwrap();
        let bad_after = harness.store.find_harvest("h2").await.unwrap().unwrap();
        assert_eq!(good_after.last_status, HarvestStatus::Ok);
        assert_eq!(bad_after.last_status, HarvestStatus::Fail);
    }

    #[tokio::test]
    async fn test_request_run_resets_job_to_pending() {
        let store = MemoryStore::new();
        let mut job = waf_job();
        job.last_status = HarvestStatus::Ok;
        job.last_record_count = 10;
        job.last_good_count = 9;
        job.last_bad_count = 1;
        store.upsert_harvest(&job).await.unwrap();

        request_run(&store, "h1").await.unwrap();

        let updated = store.find_harvest("h1").await.unwrap().unwrap();
        assert_eq!(updated.last_status, HarvestStatus::Pending);
        assert_eq!(updated.last_record_count, 0);
        assert_eq!(updated.last_good_count, 0);
        assert_eq!(updated.last_bad_count, 0);

        assert!(request_run(&store, "missing").await.is_err());
    }

    #[tokio::test]
    async fn test_delete_harvest_cascades() {
        let harness = Harness::new();
        let fetcher = two_document_fetcher();
        let ctx = harness.ctx(&fetcher);
        let job = waf_job();
        harness.store.upsert_harvest(&job).await.unwrap();
        run_harvest(&ctx, &job).await.unwrap();

        let locations = harness.store.record_locations("h1").await.unwrap();
        assert!(!locations.is_empty());
        for location in &locations {
            assert!(location.exists());
        }

        delete_harvest(&harness.store, "h1").await.unwrap();

        assert!(harness.store.find_harvest("h1").await.unwrap().is_none());
        assert!(harness.store.records_for("h1").await.unwrap().is_empty());
        assert!(harness.store.attempts_for("h1").await.unwrap().is_empty());
        for location in &locations {
            assert!(!location.exists());
        }
    }

    #[tokio::test]
    async fn test_degenerate_geometry_is_patched_during_the_run() {
        let record_with_point = CLEAN_RECORD.replace(
            "</gmd:MD_DataIdentification>",
            r#"<gmd:extent><gmd:EX_Extent><gmd:geographicElement>
<gmd:EX_GeographicBoundingBox>
<gmd:westBoundLongitude><gco:Decimal>-70.5</gco:Decimal></gmd:westBoundLongitude>
<gmd:eastBoundLongitude><gco:Decimal>-70.5</gco:Decimal></gmd:eastBoundLongitude>
<gmd:southBoundLatitude><gco:Decimal>42.3</gco:Decimal></gmd:southBoundLatitude>
<gmd:northBoundLatitude><gco:Decimal>42.3</gco:Decimal></gmd:northBoundLatitude>
</gmd:EX_GeographicBoundingBox>
</gmd:geographicElement></gmd:EX_Extent></gmd:extent></gmd:MD_DataIdentification>"#,
        );

        let harness = Harness::new();
        let fetcher = StaticFetcher::new()
            .page("http://waf.example.com/", listing(&["point.xml"]))
            .page("http://waf.example.com/point.xml", record_with_point);
        let ctx = harness.ctx(&fetcher);
        let job = waf_job();
        harness.store.upsert_harvest(&job).await.unwrap();

        run_harvest(&ctx, &job).await.unwrap();

        let records = harness.store.records_for("h1").await.unwrap();
        assert_eq!(records.len(), 1);
        assert!(records[0].is_clean());

        let patched = tokio::fs::read(&records[0].location).await.unwrap();
        let bbox = geometry::find_bounding_box(&patched).unwrap().unwrap();
        assert!(bbox.east > bbox.west);
        assert!(bbox.north > bbox.south);
        assert!((bbox.east - bbox.west - 2.0 * geometry::EPSILON).abs() < 1e-9);
        assert!((bbox.north - bbox.south - 2.0 * geometry::EPSILON).abs() < 1e-9);
    }
}
