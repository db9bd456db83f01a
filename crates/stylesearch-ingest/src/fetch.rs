//! Image acquisition: http(s) URLs via a timeout-bounded client, or
//! local file paths.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use image::DynamicImage;

pub struct ImageFetcher {
    client: reqwest::Client,
}

impl ImageFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client })
    }

    /// Fetch and decode an image reference. The timeout bounds the whole
    /// HTTP exchange; local reads are not bounded.
    pub async fn fetch(&self, reference: &str) -> Result<DynamicImage> {
        let bytes = if reference.starts_with("http://") || reference.starts_with("https://") {
            let response = self
                .client
                .get(reference)
                .send()
                .await
                .with_context(|| format!("Failed to fetch {reference}"))?
                .error_for_status()
                .with_context(|| format!("Bad status for {reference}"))?;
            response.bytes().await?.to_vec()
        } else {
            tokio::fs::read(Path::new(reference))
                .await
                .with_context(|| format!("Failed to read {reference}"))?
        };
        image::load_from_memory(&bytes)
            .with_context(|| format!("Failed to decode image {reference}"))
    }
}
