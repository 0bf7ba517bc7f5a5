// src/services/csw.rs

//! Catalogue Service for the Web client.
//!
//! Drives a CSW 2.0.2 endpoint with paged GetRecords requests until
//! the server reports exhaustion, requesting full ISO 19115 element
//! sets. Some CSW servers cap the records returned per request and
//! fetching everything at once is not memory friendly, so records come
//! back one page at a time.

use std::io::Cursor;

use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::events::{BytesStart, Event};
use url::Url;

use crate::config::CswConfig;
use crate::error::{AppError, Result};
use crate::utils::Interrupt;
use crate::utils::http::Fetcher;

/// ISO 19115 output schema requested from the endpoint.
const ISO_OUTPUT_SCHEMA: &str = "http://www.isotc211.org/2005/gmd";

/// One raw metadata record captured from a GetRecords response.
#[derive(Debug, Clone)]
pub struct CswRecord {
    /// The record's file identifier, when the document carries one
    pub identifier: Option<String>,
    /// The record subtree, serialized verbatim
    pub xml: Vec<u8>,
}

/// One parsed GetRecords response page.
#[derive(Debug)]
struct CswPage {
    matches: u64,
    next_record: u64,
    records: Vec<CswRecord>,
}

/// CSW endpoint client.
pub struct CswClient<'a> {
    fetcher: &'a dyn Fetcher,
    page_size: u32,
    max_batches: u32,
}

impl<'a> CswClient<'a> {
    pub fn new(fetcher: &'a dyn Fetcher, config: &CswConfig) -> Self {
        Self {
            fetcher,
            page_size: config.page_size,
            max_batches: config.max_batches,
        }
    }

    /// Start paging the endpoint from the first record.
    pub fn pager(&self, endpoint: &str) -> CswPager<'_, 'a> {
        CswPager {
            client: self,
            endpoint: endpoint.to_string(),
            position: 1,
            batches: 0,
            done: false,
        }
    }

    /// GetRecordById URL recorded on each harvested record so
    /// consumers can fetch the source document directly.
    pub fn get_record_url(endpoint: &str, record_id: &str) -> Result<String> {
        let mut url = Url::parse(endpoint)?;
        url.query_pairs_mut()
            .append_pair("service", "CSW")
            .append_pair("version", "2.0.2")
            .append_pair("request", "GetRecordById")
            .append_pair("id", record_id)
            .append_pair("elementsetname", "full")
            .append_pair("outputSchema", ISO_OUTPUT_SCHEMA);
        Ok(url.to_string())
    }

    fn page_url(&self, endpoint: &str, position: u64) -> Result<String> {
        let mut url = Url::parse(endpoint)?;
        url.query_pairs_mut()
            .append_pair("service", "CSW")
            .append_pair("version", "2.0.2")
            .append_pair("request", "GetRecords")
            .append_pair("typeNames", "gmd:MD_Metadata")
            .append_pair("resultType", "results")
            .append_pair("elementSetName", "full")
            .append_pair("outputSchema", ISO_OUTPUT_SCHEMA)
            .append_pair("maxRecords", &self.page_size.to_string())
            .append_pair("startPosition", &position.to_string());
        Ok(url.to_string())
    }
}

/// Cursor over a paged GetRecords query.
///
/// Terminates when the server reports exhaustion (`nextRecord == 0`
/// per CSW 2.0.2, or `nextRecord > matches` for GeoNetwork
/// implementations that report `matches + 1`), or after `max_batches`
/// pages as a safety valve against servers that never report
/// completion. Restartable only by building a fresh pager.
pub struct CswPager<'p, 'f> {
    client: &'p CswClient<'f>,
    endpoint: String,
    position: u64,
    batches: u32,
    done: bool,
}

impl CswPager<'_, '_> {
    /// Fetch the next page of records, or `None` once exhausted.
    pub async fn next_page(&mut self, interrupt: &Interrupt) -> Result<Option<Vec<CswRecord>>> {
        if self.done {
            return Ok(None);
        }
        interrupt.check()?;

        let url = self.client.page_url(&self.endpoint, self.position)?;
        let response = self.client.fetcher.get(&url).await?;
        if !response.is_success() {
            return Err(AppError::harvest(
                self.endpoint.clone(),
                format!("GetRecords returned HTTP {}", response.status),
            ));
        }

        let page = parse_get_records(&response.body)?;
        if page.next_record == 0
            || page.next_record > page.matches
            || self.batches >= self.client.max_batches
        {
            self.done = true;
        } else {
            self.position = page.next_record;
            self.batches += 1;
        }
        Ok(Some(page.records))
    }
}

/// Capture state for one record subtree being copied out of the
/// response stream.
struct RecordCapture {
    writer: Writer<Cursor<Vec<u8>>>,
    depth: usize,
    identifier: Option<String>,
    in_file_identifier: bool,
    in_character_string: bool,
}

impl RecordCapture {
    fn new() -> Self {
        Self {
            writer: Writer::new(Cursor::new(Vec::new())),
            depth: 0,
            identifier: None,
            in_file_identifier: false,
            in_character_string: false,
        }
    }
}

/// Parse a GetRecords response: the SearchResults counters plus every
/// MD_Metadata subtree, re-serialized verbatim.
fn parse_get_records(body: &[u8]) -> Result<CswPage> {
    let mut reader = Reader::from_reader(body);
    let mut buf = Vec::new();

    let mut counters: Option<(u64, u64)> = None;
    let mut records = Vec::new();
    let mut capture: Option<RecordCapture> = None;

    loop {
        let event = reader.read_event_into(&mut buf).map_err(AppError::xml)?;
        match &event {
            Event::Start(e) => {
                let name = e.local_name();
                if capture.is_none() && name.as_ref() == b"MD_Metadata" {
                    capture = Some(RecordCapture::new());
                } else if let Some(c) = capture.as_mut() {
                    c.depth += 1;
                    if name.as_ref() == b"fileIdentifier" {
                        c.in_file_identifier = true;
                    } else if c.in_file_identifier && name.as_ref() == b"CharacterString" {
                        c.in_character_string = true;
                    }
                } else if name.as_ref() == b"SearchResults" {
                    counters = Some(search_result_counters(e)?);
                }
            }
            Event::Empty(e) => {
                if capture.is_none() && e.local_name().as_ref() == b"SearchResults" {
                    counters = Some(search_result_counters(e)?);
                }
            }
            Event::Text(t) => {
                if let Some(c) = capture.as_mut() {
                    if c.in_character_string && c.identifier.is_none() {
                        let text = t.unescape().map_err(AppError::xml)?;
                        c.identifier = Some(text.trim().to_string());
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }

        let mut record_complete = false;
        if let Some(c) = capture.as_mut() {
            c.writer.write_event(event.clone()).map_err(AppError::xml)?;
            if let Event::End(e) = &event {
                let name = e.local_name();
                if name.as_ref() == b"fileIdentifier" {
                    c.in_file_identifier = false;
                }
                if name.as_ref() == b"CharacterString" {
                    c.in_character_string = false;
                }
                if c.depth == 0 {
                    // closing MD_Metadata tag just written
                    record_complete = true;
                } else {
                    c.depth -= 1;
                }
            }
        }
        if record_complete {
            if let Some(finished) = capture.take() {
                records.push(CswRecord {
                    identifier: finished.identifier,
                    xml: finished.writer.into_inner().into_inner(),
                });
            }
        }
        buf.clear();
    }

    let (matches, next_record) = counters.ok_or_else(|| {
        AppError::xml("response has no SearchResults element; not a GetRecords response")
    })?;

    Ok(CswPage {
        matches,
        next_record,
        records,
    })
}

fn search_result_counters(e: &BytesStart<'_>) -> Result<(u64, u64)> {
    let matches = required_u64_attr(e, b"numberOfRecordsMatched")?;
    let next_record = required_u64_attr(e, b"nextRecord")?;
    Ok((matches, next_record))
}

fn required_u64_attr(e: &BytesStart<'_>, name: &[u8]) -> Result<u64> {
    for attr in e.attributes() {
        let attr = attr.map_err(AppError::xml)?;
        if attr.key.local_name().as_ref() == name {
            let value = attr.unescape_value().map_err(AppError::xml)?;
            return value.trim().parse::<u64>().map_err(|err| {
                AppError::xml(format!(
                    "bad {} attribute: {}",
                    String::from_utf8_lossy(name),
                    err
                ))
            });
        }
    }
    Err(AppError::xml(format!(
        "SearchResults missing {} attribute",
        String::from_utf8_lossy(name)
    )))
}
