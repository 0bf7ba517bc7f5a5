// src/services/validate.rs

//! ISO 19115 record validation.
//!
//! Parses a metadata document, extracts its descriptive fields,
//! fingerprints the raw bytes, and checks the elements the catalog
//! schema requires. Violations are data carried on the record, not a
//! reason to reject it; only bytes that fail to parse as XML at all
//! produce the degraded [`ValidationOutcome::Malformed`] variant.

use quick_xml::Reader;
use quick_xml::events::Event;
use sha2::{Digest, Sha256};

use crate::error::{AppError, Result};
use crate::models::{ServiceEndpoint, ValidationError};

/// Result of validating one document.
#[derive(Debug, Clone)]
pub enum ValidationOutcome {
    /// The document parsed; fields and schema findings attached
    Parsed(ParsedRecord),
    /// The bytes are not well-formed XML
    Malformed { error: String },
}

/// Fields extracted from a well-formed document.
#[derive(Debug, Clone, Default)]
pub struct ParsedRecord {
    pub title: Option<String>,
    pub description: Option<String>,
    pub services: Vec<ServiceEndpoint>,
    /// Hex digest of the raw bytes, for change detection between runs
    pub fingerprint: String,
    pub metadata_date: Option<String>,
    pub file_identifier: Option<String>,
    pub validation_errors: Vec<ValidationError>,
}

/// Validate a raw metadata document.
pub fn validate(raw: &[u8]) -> ValidationOutcome {
    match parse_document(raw) {
        Ok(parsed) => ValidationOutcome::Parsed(parsed),
        Err(e) => ValidationOutcome::Malformed {
            error: e.to_string(),
        },
    }
}

/// Elements the catalog schema requires of every record.
#[derive(Debug, Default)]
struct SeenElements {
    file_identifier: bool,
    language: bool,
    contact: bool,
    date_stamp: bool,
    identification: bool,
    identification_line: Option<u64>,
}

/// In-flight service connect point.
#[derive(Debug, Default)]
struct EndpointBuilder {
    protocol: Option<String>,
    url: Option<String>,
}

fn parse_document(raw: &[u8]) -> Result<ParsedRecord> {
    let mut reader = Reader::from_reader(raw);
    reader.config_mut().check_end_names = true;
    let mut buf = Vec::new();

    let mut record = ParsedRecord {
        fingerprint: hex::encode(Sha256::digest(raw)),
        ..ParsedRecord::default()
    };

    let mut stack: Vec<String> = Vec::new();
    let mut seen = SeenElements::default();
    let mut root_line: Option<u64> = None;
    let mut endpoint: Option<EndpointBuilder> = None;

    loop {
        let event = reader.read_event_into(&mut buf).map_err(AppError::xml)?;
        match event {
            Event::Start(e) => {
                let name = local_name_string(e.local_name().as_ref());
                if root_line.is_none() {
                    root_line = Some(line_of(raw, reader.buffer_position() as usize));
                }
                track_element(&name, &mut seen, raw, &reader);
                if name == "CI_OnlineResource" && stack.iter().any(|n| n == "connectPoint") {
                    endpoint = Some(EndpointBuilder::default());
                }
                stack.push(name);
            }
            Event::Empty(e) => {
                let name = local_name_string(e.local_name().as_ref());
                if root_line.is_none() {
                    root_line = Some(line_of(raw, reader.buffer_position() as usize));
                }
                track_element(&name, &mut seen, raw, &reader);
            }
            Event::Text(t) => {
                let text = t.unescape().map_err(AppError::xml)?;
                let text = text.trim();
                if !text.is_empty() {
                    capture_text(text, &stack, &mut record, &mut endpoint);
                }
            }
            Event::End(_) => {
                let name = stack.pop().unwrap_or_default();
                if name == "CI_OnlineResource" {
                    if let Some(built) = endpoint.take() {
                        if let Some(url) = built.url {
                            record.services.push(ServiceEndpoint {
                                service_type: built.protocol,
                                service_url: url,
                            });
                        }
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if let Some(open) = stack.last() {
        return Err(AppError::xml(format!("unclosed element {open}")));
    }
    let root_line = root_line
        .ok_or_else(|| AppError::xml("document contains no XML elements"))?;

    record.validation_errors = schema_findings(&seen, &record, root_line);
    Ok(record)
}

fn track_element(name: &str, seen: &mut SeenElements, raw: &[u8], reader: &Reader<&[u8]>) {
    match name {
        "fileIdentifier" => seen.file_identifier = true,
        "language" => seen.language = true,
        "contact" => seen.contact = true,
        "dateStamp" => seen.date_stamp = true,
        "MD_DataIdentification" => {
            seen.identification = true;
            if seen.identification_line.is_none() {
                seen.identification_line =
                    Some(line_of(raw, reader.buffer_position() as usize));
            }
        }
        _ => {}
    }
}

fn capture_text(
    text: &str,
    stack: &[String],
    record: &mut ParsedRecord,
    endpoint: &mut Option<EndpointBuilder>,
) {
    if record.file_identifier.is_none()
        && ends_with(stack, &["fileIdentifier", "CharacterString"])
    {
        record.file_identifier = Some(text.to_string());
    } else if stack.iter().any(|n| n == "MD_DataIdentification") {
        if record.title.is_none() && ends_with(stack, &["title", "CharacterString"]) {
            record.title = Some(text.to_string());
        } else if record.description.is_none()
            && ends_with(stack, &["abstract", "CharacterString"])
        {
            record.description = Some(text.to_string());
        }
    }

    if record.metadata_date.is_none()
        && (ends_with(stack, &["dateStamp", "Date"])
            || ends_with(stack, &["dateStamp", "DateTime"]))
    {
        record.metadata_date = Some(text.to_string());
    }

    if stack.iter().any(|n| n == "SV_ServiceIdentification") {
        if let Some(builder) = endpoint.as_mut() {
            if ends_with(stack, &["protocol", "CharacterString"]) {
                builder.protocol = Some(text.to_string());
            } else if ends_with(stack, &["linkage", "URL"]) {
                builder.url = Some(text.to_string());
            }
        }
    }
}

fn schema_findings(
    seen: &SeenElements,
    record: &ParsedRecord,
    root_line: u64,
) -> Vec<ValidationError> {
    let at_root = Some(root_line);
    let mut findings = Vec::new();

    if !seen.file_identifier {
        findings.push(ValidationError::new(
            at_root,
            "Missing required element gmd:fileIdentifier",
        ));
    }
    if !seen.language {
        findings.push(ValidationError::new(
            at_root,
            "Missing required element gmd:language",
        ));
    }
    if !seen.contact {
        findings.push(ValidationError::new(
            at_root,
            "Missing required element gmd:contact",
        ));
    }
    if !seen.date_stamp {
        findings.push(ValidationError::new(
            at_root,
            "Missing required element gmd:dateStamp",
        ));
    }
    if !seen.identification {
        findings.push(ValidationError::new(
            at_root,
            "Missing required element gmd:identificationInfo/gmd:MD_DataIdentification",
        ));
    } else {
        let at_identification = seen.identification_line.or(at_root);
        if record.title.is_none() {
            findings.push(ValidationError::new(
                at_identification,
                "Identification section has no citation title",
            ));
        }
        if record.description.is_none() {
            findings.push(ValidationError::new(
                at_identification,
                "Identification section has no gmd:abstract",
            ));
        }
    }
    findings
}

fn ends_with(stack: &[String], suffix: &[&str]) -> bool {
    stack.len() >= suffix.len()
        && stack[stack.len() - suffix.len()..]
            .iter()
            .zip(suffix)
            .all(|(name, expected)| name == expected)
}

fn local_name_string(name: &[u8]) -> String {
    String::from_utf8_lossy(name).into_owned()
}

/// 1-based line number of a byte offset.
fn line_of(raw: &[u8], offset: usize) -> u64 {
    let end = offset.min(raw.len());
    raw[..end].iter().filter(|b| **b == b'\n').count() as u64 + 1
}
