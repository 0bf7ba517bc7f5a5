// src/services/links.rs

//! Anchor extraction from directory-listing HTML.
//!
//! WAF servers expose their contents as plain `<a>` tags; ERDDAP
//! servers wrap them in markup that changed across releases, so the
//! ERDDAP variant picks its link container based on the version string
//! printed in the page footer.

use scraper::{Html, Selector};

use crate::error::{AppError, Result};

/// Extract every anchor's (href, label) in document order. Anchors
/// without an href are skipped.
pub fn extract_links(html: &str) -> Result<Vec<(String, String)>> {
    let document = Html::parse_document(html);
    let anchor_sel = parse_selector("a")?;

    let mut links = Vec::new();
    for anchor in document.select(&anchor_sel) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        let label: String = anchor.text().collect();
        links.push((href.to_string(), label.trim().to_string()));
    }
    Ok(links)
}

/// Extract only the anchors whose label ends in `.xml`, preserving
/// document order.
pub fn extract_xml_links(html: &str) -> Result<Vec<(String, String)>> {
    Ok(extract_links(html)?
        .into_iter()
        .filter(|(_, label)| label.ends_with(".xml"))
        .collect())
}

/// Link extraction for ERDDAP directory listings.
///
/// Listings older than the threshold release keep their links inside a
/// `<pre>` block; newer ones use a table inside `div.standard_width`.
/// A missing or unparsable version string is treated as the lowest
/// version.
pub struct ErddapLinkExtractor {
    threshold: Vec<u32>,
}

impl ErddapLinkExtractor {
    pub fn new(version_threshold: &str) -> Self {
        Self {
            threshold: parse_version(version_threshold).unwrap_or_else(|| vec![1, 82]),
        }
    }

    /// Extract the `.xml`-labeled anchors from the version-appropriate
    /// container.
    pub fn extract(&self, html: &str) -> Result<Vec<(String, String)>> {
        let document = Html::parse_document(html);
        let version = find_erddap_version(&document);
        let use_table = matches!(&version, Some(v) if *v >= self.threshold);

        let (container, anchors) = if use_table {
            ("div.standard_width table", "div.standard_width table a")
        } else {
            ("pre", "pre a")
        };

        let container_sel = parse_selector(container)?;
        if document.select(&container_sel).next().is_none() {
            return Err(AppError::harvest(
                "erddap",
                format!("listing has no {} link container", container),
            ));
        }

        let anchor_sel = parse_selector(anchors)?;
        let mut links = Vec::new();
        for anchor in document.select(&anchor_sel) {
            let Some(href) = anchor.value().attr("href") else {
                continue;
            };
            let label: String = anchor.text().collect();
            let label = label.trim().to_string();
            if label.ends_with(".xml") {
                links.push((href.to_string(), label));
            }
        }
        Ok(links)
    }
}

/// Locate the "ERDDAP, Version x.y" footer text and parse the trailing
/// token as a version.
fn find_erddap_version(document: &Html) -> Option<Vec<u32>> {
    for text in document.root_element().text() {
        if text.contains("ERDDAP, Version") {
            let token = text.trim().split_whitespace().last()?;
            return parse_version(token);
        }
    }
    None
}

/// Parse a dotted version string into numeric segments. Each segment
/// contributes its leading digits; a version with no leading digits at
/// all is unparsable.
pub(crate) fn parse_version(s: &str) -> Option<Vec<u32>> {
    let segments: Vec<u32> = s
        .split('.')
        .map_while(|segment| {
            let digits: String = segment.chars().take_while(|c| c.is_ascii_digit()).collect();
            digits.parse::<u32>().ok()
        })
        .collect();
    if segments.is_empty() { None } else { Some(segments) }
}

fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PRE_LISTING: &str = r#"
        <html><body>
        <pre>
        <a href="../">Parent Directory</a>
        <a href="station_a.xml">station_a.xml</a>
        <a href="station_b.xml">station_b.xml</a>
        <a href="readme.txt">readme.txt</a>
        </pre>
        <p>ERDDAP, Version 1.80</p>
        </body></html>
    "#;

    const TABLE_LISTING: &str = r#"
        <html><body>
        <div class="standard_width">
        <table>
        <tr><td><a href="buoy_1.xml">buoy_1.xml</a></td></tr>
        <tr><td><a href="buoy_2.xml">buoy_2.xml</a></td></tr>
        <tr><td><a href="index.html">index.html</a></td></tr>
        </table>
        </div>
        <pre><a href="old_style.xml">old_style.xml</a></pre>
        <p>ERDDAP, Version 2.14</p>
        </body></html>
    "#;

    #[test]
    fn test_extract_links_all_anchors() {
        let links = extract_links(PRE_LISTING).unwrap();
        assert_eq!(links.len(), 4);
        assert_eq!(links[0], ("../".to_string(), "Parent Directory".to_string()));
        assert_eq!(links[1].0, "station_a.xml");
    }

    #[test]
    fn test_extract_xml_links_filters_by_label_in_order() {
        let links = extract_xml_links(PRE_LISTING).unwrap();
        let labels: Vec<&str> = links.iter().map(|(_, l)| l.as_str()).collect();
        assert_eq!(labels, vec!["station_a.xml", "station_b.xml"]);
    }

    #[test]
    fn test_erddap_pre_container_below_threshold() {
        let extractor = ErddapLinkExtractor::new("1.82");
        let links = extractor.extract(PRE_LISTING).unwrap();
        let hrefs: Vec<&str> = links.iter().map(|(h, _)| h.as_str()).collect();
        assert_eq!(hrefs, vec!["station_a.xml", "station_b.xml"]);
    }

    #[test]
    fn test_erddap_table_container_at_or_above_threshold() {
        let extractor = ErddapLinkExtractor::new("1.82");
        let links = extractor.extract(TABLE_LISTING).unwrap();
        let hrefs: Vec<&str> = links.iter().map(|(h, _)| h.as_str()).collect();
        assert_eq!(hrefs, vec!["buoy_1.xml", "buoy_2.xml"]);
    }

    #[test]
    fn test_erddap_missing_version_falls_back_to_pre() {
        let html = r#"<html><body><pre><a href="a.xml">a.xml</a></pre></body></html>"#;
        let extractor = ErddapLinkExtractor::new("1.82");
        let links = extractor.extract(html).unwrap();
        assert_eq!(links.len(), 1);
    }

    #[test]
    fn test_erddap_garbled_version_falls_back_to_pre() {
        let html = r#"
            <html><body>
            <pre><a href="a.xml">a.xml</a></pre>
            <p>ERDDAP, Version unknown</p>
            </body></html>
        "#;
        let extractor = ErddapLinkExtractor::new("1.82");
        let links = extractor.extract(html).unwrap();
        assert_eq!(links.len(), 1);
    }

    #[test]
    fn test_erddap_missing_container_is_an_error() {
        let html = r#"<html><body><p>nothing here</p></body></html>"#;
        let extractor = ErddapLinkExtractor::new("1.82");
        assert!(extractor.extract(html).is_err());
    }

    #[test]
    fn test_parse_version() {
        assert_eq!(parse_version("1.82"), Some(vec![1, 82]));
        assert_eq!(parse_version("2.14"), Some(vec![2, 14]));
        assert_eq!(parse_version("garbage"), None);
        assert!(parse_version("1.80").unwrap() < parse_version("1.82").unwrap());
        assert!(parse_version("2.02").unwrap() > parse_version("1.82").unwrap());
    }
}
