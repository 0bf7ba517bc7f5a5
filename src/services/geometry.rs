// src/services/geometry.rs

//! Degenerate bounding-box repair.
//!
//! Some providers describe a point location as a bounding box whose
//! corners coincide. Catalog consumers reject zero-area boxes, so the
//! box is widened by a small epsilon on the degenerate axis and the
//! document rewritten in place. At five decimal places of a degree the
//! offset stays within about a meter of the original location.

use std::io::Cursor;
use std::path::Path;

use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::events::{BytesText, Event};

use crate::error::{AppError, Result};

/// Half-width added to each side of a degenerate axis, in degrees.
pub const EPSILON: f64 = 1e-5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct BoundingBox {
    pub(crate) west: f64,
    pub(crate) south: f64,
    pub(crate) east: f64,
    pub(crate) north: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Corner {
    West,
    South,
    East,
    North,
}

impl Corner {
    fn from_local_name(name: &[u8]) -> Option<Self> {
        match name {
            b"westBoundLongitude" => Some(Corner::West),
            b"southBoundLatitude" => Some(Corner::South),
            b"eastBoundLongitude" => Some(Corner::East),
            b"northBoundLatitude" => Some(Corner::North),
            _ => None,
        }
    }
}

/// Repair the file at `location` if its bounding box is degenerate.
///
/// Returns `Ok(false)` when there is no bounding box or the box
/// already has area, `Ok(true)` when the file was rewritten. A box
/// with missing or non-numeric coordinates is an error; the caller
/// records it as an invalid-geometry finding on the record.
pub async fn patch(location: &Path) -> Result<bool> {
    let raw = tokio::fs::read(location).await?;

    let Some(bbox) = find_bounding_box(&raw)? else {
        return Ok(false);
    };

    let widen_lon = (bbox.east - bbox.west).abs() < EPSILON;
    let widen_lat = (bbox.north - bbox.south).abs() < EPSILON;
    if !widen_lon && !widen_lat {
        return Ok(false);
    }

    let rewritten = rewrite(&raw, bbox, widen_lon, widen_lat)?;

    // write-then-rename so a crash mid-write cannot leave a truncated
    // document behind
    let tmp = location.with_extension("xml.tmp");
    tokio::fs::write(&tmp, &rewritten).await?;
    tokio::fs::rename(&tmp, location).await?;
    Ok(true)
}

/// Locate the first geographic bounding box and parse its corners.
pub(crate) fn find_bounding_box(raw: &[u8]) -> Result<Option<BoundingBox>> {
    let mut reader = Reader::from_reader(raw);
    let mut buf = Vec::new();

    let mut in_bbox = false;
    let mut corner: Option<Corner> = None;
    let mut in_decimal = false;
    let mut west = None;
    let mut south = None;
    let mut east = None;
    let mut north = None;

    loop {
        let event = reader.read_event_into(&mut buf).map_err(AppError::xml)?;
        match event {
            Event::Start(e) => {
                let name = e.local_name();
                if name.as_ref() == b"EX_GeographicBoundingBox" {
                    in_bbox = true;
                } else if in_bbox {
                    if let Some(c) = Corner::from_local_name(name.as_ref()) {
                        corner = Some(c);
                    } else if corner.is_some() && name.as_ref() == b"Decimal" {
                        in_decimal = true;
                    }
                }
            }
            Event::Text(t) if in_decimal => {
                let text = t.unescape().map_err(AppError::xml)?;
                let value: f64 = text.trim().parse().map_err(|_| {
                    AppError::geometry(format!("non-numeric bound \"{}\"", text.trim()))
                })?;
                match corner {
                    Some(Corner::West) => west = Some(value),
                    Some(Corner::South) => south = Some(value),
                    Some(Corner::East) => east = Some(value),
                    Some(Corner::North) => north = Some(value),
                    None => {}
                }
            }
            Event::End(e) => {
                let name = e.local_name();
                if name.as_ref() == b"EX_GeographicBoundingBox" {
                    break;
                } else if in_bbox {
                    if name.as_ref() == b"Decimal" {
                        in_decimal = false;
                    } else if Corner::from_local_name(name.as_ref()).is_some() {
                        corner = None;
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if !in_bbox {
        return Ok(None);
    }
    match (west, south, east, north) {
        (Some(west), Some(south), Some(east), Some(north)) => Ok(Some(BoundingBox {
            west,
            south,
            east,
            north,
        })),
        _ => Err(AppError::geometry(
            "bounding box is missing one or more coordinate bounds",
        )),
    }
}

/// Stream-copy the document, substituting widened coordinate values in
/// the first bounding box.
fn rewrite(raw: &[u8], bbox: BoundingBox, widen_lon: bool, widen_lat: bool) -> Result<Vec<u8>> {
    let mut reader = Reader::from_reader(raw);
    let mut writer = Writer::new(Cursor::new(Vec::new()));
    let mut buf = Vec::new();

    let mut in_bbox = false;
    let mut bbox_done = false;
    let mut corner: Option<Corner> = None;
    let mut in_decimal = false;

    loop {
        let event = reader.read_event_into(&mut buf).map_err(AppError::xml)?;
        match &event {
            Event::Start(e) => {
                let name = e.local_name();
                if !bbox_done && name.as_ref() == b"EX_GeographicBoundingBox" {
                    in_bbox = true;
                } else if in_bbox {
                    if let Some(c) = Corner::from_local_name(name.as_ref()) {
                        corner = Some(c);
                    } else if corner.is_some() && name.as_ref() == b"Decimal" {
                        in_decimal = true;
                    }
                }
            }
            Event::Text(_) if in_decimal => {
                let replacement = match corner {
                    Some(Corner::West) if widen_lon => Some(bbox.west - EPSILON),
                    Some(Corner::East) if widen_lon => Some(bbox.east + EPSILON),
                    Some(Corner::South) if widen_lat => Some(bbox.south - EPSILON),
                    Some(Corner::North) if widen_lat => Some(bbox.north + EPSILON),
                    _ => None,
                };
                if let Some(value) = replacement {
                    let text = value.to_string();
                    writer
                        .write_event(Event::Text(BytesText::new(&text)))
                        .map_err(AppError::xml)?;
                    buf.clear();
                    continue;
                }
            }
            Event::End(e) => {
                let name = e.local_name();
                if in_bbox && name.as_ref() == b"EX_GeographicBoundingBox" {
                    in_bbox = false;
                    bbox_done = true;
                    corner = None;
                } else if in_bbox {
                    if name.as_ref() == b"Decimal" {
                        in_decimal = false;
                    } else if Corner::from_local_name(name.as_ref()).is_some() {
                        corner = None;
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
        writer.write_event(event.clone()).map_err(AppError::xml)?;
        buf.clear();
    }

    Ok(writer.into_inner().into_inner())
}
