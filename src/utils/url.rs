// src/utils/url.rs

//! URL and file-name manipulation utilities.

use url::Url;

/// Longest file name the harvester will write, before the `.xml`
/// suffix is enforced. Stays under common filesystem limits.
const MAX_NAME_LEN: usize = 240;

/// Resolve a potentially relative URL against a base URL.
///
/// Already-absolute hrefs pass through; anything the `url` crate
/// cannot resolve is returned as-is.
pub fn resolve(base: &str, href: &str) -> String {
    if href.starts_with("http://") || href.starts_with("https://") {
        return href.to_string();
    }
    match Url::parse(base).and_then(|b| b.join(href)) {
        Ok(joined) => joined.to_string(),
        Err(_) => href.to_string(),
    }
}

/// Derive a safe local file name for a harvested document.
///
/// Slashes are replaced so identifiers like `urn:x/y` cannot escape the
/// destination directory, over-long names are truncated, and a `.xml`
/// suffix is enforced (downstream catalog importers only pick up `.xml`
/// files).
pub fn sanitize_document_name(name: &str) -> String {
    let mut sanitized = name.replace(['/', '\\'], "_");
    if sanitized.len() > MAX_NAME_LEN {
        let mut cut = MAX_NAME_LEN;
        while !sanitized.is_char_boundary(cut) {
            cut -= 1;
        }
        sanitized.truncate(cut);
    }
    if !sanitized.ends_with(".xml") {
        sanitized.push_str(".xml");
    }
    sanitized
}

/// Public URL for a document mirrored under the registry WAF.
pub fn public_record_url(waf_url_root: &str, organization: &str, file_name: &str) -> String {
    format!(
        "{}/{}/{}",
        waf_url_root.trim_end_matches('/'),
        organization,
        file_name
    )
}
