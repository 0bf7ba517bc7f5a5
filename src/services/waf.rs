// src/services/waf.rs

//! Web Accessible Folder crawler.
//!
//! Walks an HTTP directory listing depth-first, collecting links to
//! XML documents and following subdirectory links down to a bounded
//! depth. The depth bound is what terminates crawls over cyclic or
//! pathological directory structures.

use crate::error::Result;
use crate::services::links::{self, ErddapLinkExtractor};
use crate::utils::Interrupt;
use crate::utils::http::Fetcher;
use crate::utils::url::resolve;

/// How anchors are pulled out of a directory page.
pub enum LinkMode {
    /// Every anchor on the page
    Standard,
    /// ERDDAP's version-dependent link container
    Erddap(ErddapLinkExtractor),
}

/// Depth-bounded directory walker.
pub struct WafCrawler<'a> {
    fetcher: &'a dyn Fetcher,
    max_depth: usize,
    mode: LinkMode,
}

impl<'a> WafCrawler<'a> {
    pub fn new(fetcher: &'a dyn Fetcher, max_depth: usize, mode: LinkMode) -> Self {
        Self {
            fetcher,
            max_depth,
            mode,
        }
    }

    /// Walk the directory tree rooted at `root_url` and return the
    /// document URLs found, depth-first in server listing order.
    ///
    /// A directory page that returns non-200 (or fails to fetch at
    /// all) is treated as an empty branch: the crawl logs it and moves
    /// on rather than aborting the whole walk.
    pub async fn crawl(&self, root_url: &str, interrupt: &Interrupt) -> Result<Vec<String>> {
        let mut documents = Vec::new();
        let mut pending = vec![(root_url.to_string(), 0usize)];

        while let Some((url, depth)) = pending.pop() {
            interrupt.check()?;
            if depth > self.max_depth {
                continue;
            }

            let response = match self.fetcher.get(&url).await {
                Ok(response) => response,
                Err(e) if e.is_interrupt() => return Err(e),
                Err(e) => {
                    log::warn!("Skipping directory {}: {}", url, e);
                    continue;
                }
            };
            if response.status != 200 {
                continue;
            }

            let links = self.page_links(&response.text())?;
            let mut subdirectories = Vec::new();
            for (href, label) in links {
                // ".." and "Parent Directory" style links would walk
                // back out of the WAF root
                if href.starts_with("..") {
                    continue;
                }
                if label.to_lowercase().contains("parent") {
                    continue;
                }

                let link = if let Some(rest) = href.strip_prefix("//") {
                    format!("http://{rest}")
                } else if href.starts_with("http") {
                    href
                } else {
                    resolve(&url, &href)
                };

                if link.ends_with(".xml") {
                    documents.push(link.clone());
                }
                // THREDDS exposes ISO records under thredds/iso
                // without an .xml suffix
                if link.contains("thredds/iso") {
                    documents.push(link.clone());
                }

                if link.ends_with('/') {
                    subdirectories.push(link);
                }
            }

            // Reversed so the first subdirectory listed is walked next
            for link in subdirectories.into_iter().rev() {
                pending.push((link, depth + 1));
            }
        }

        Ok(documents)
    }

    fn page_links(&self, html: &str) -> Result<Vec<(String, String)>> {
        match &self.mode {
            LinkMode::Standard => links::extract_links(html),
            LinkMode::Erddap(extractor) => extractor.extract(html),
        }
    }
}
