// src/utils/http.rs

//! HTTP transport seam.
//!
//! All network access goes through the [`Fetcher`] trait so crawlers
//! and the pipeline can be exercised against canned responses.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::HttpConfig;
use crate::error::Result;

/// A fetched HTTP response, body fully buffered.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl FetchResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body decoded as UTF-8, lossily.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Abstract GET transport.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn get(&self, url: &str) -> Result<FetchResponse>;
}

/// reqwest-backed [`Fetcher`] used outside of tests.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Create a configured fetcher with user-agent and timeout applied.
    pub fn new(config: &HttpConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn get(&self, url: &str) -> Result<FetchResponse> {
        let response = self.client.get(url).send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?.to_vec();
        Ok(FetchResponse { status, body })
    }
}

/// Download a document and write it to `location`, creating parent
/// directories as needed. The body is written regardless of status;
/// a non-XML error page will surface later as a validation failure
/// rather than silently dropping the document from the count.
pub async fn download_file(fetcher: &dyn Fetcher, url: &str, location: &Path) -> Result<()> {
    let response = fetcher.get(url).await?;
    if let Some(parent) = location.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(location, &response.body).await?;
    Ok(())
}

/// Canned-response fetcher for tests. Unknown URLs return 404; every
/// request is recorded for call-count assertions.
#[cfg(test)]
pub mod testing {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::{FetchResponse, Fetcher};
    use crate::error::Result;

    #[derive(Default)]
    pub struct StaticFetcher {
        pages: HashMap<String, FetchResponse>,
        pub requests: Mutex<Vec<String>>,
    }

    impl StaticFetcher {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn page(mut self, url: &str, body: impl Into<Vec<u8>>) -> Self {
            self.pages.insert(
                url.to_string(),
                FetchResponse {
                    status: 200,
                    body: body.into(),
                },
            );
            self
        }

        pub fn status(mut self, url: &str, status: u16) -> Self {
            self.pages.insert(
                url.to_string(),
                FetchResponse {
                    status,
                    body: Vec::new(),
                },
            );
            self
        }

        pub fn request_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl Fetcher for StaticFetcher {
        async fn get(&self, url: &str) -> Result<FetchResponse> {
            self.requests.lock().unwrap().push(url.to_string());
            Ok(self.pages.get(url).cloned().unwrap_or(FetchResponse {
                status: 404,
                body: Vec::new(),
            }))
        }
    }
}
