//! HTTP client for the upstream conscript list.
//!
//! The list endpoint pages with HTTP range headers applied to item offsets:
//! `Range-Unit: items` plus `Range: <start>-<end>`, both ends inclusive. It
//! also refuses requests that do not look like they come from a browser, so
//! every call carries a fixed User-Agent and Referer.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::{header, Client, RequestBuilder};
use tracing::debug;

use crate::config::Config;
use crate::models::{Person, Region};

use super::{ApiError, WindowSource};

// ============================================================================
// Constants
// ============================================================================

/// Path of the listing endpoint, relative to the base URL
const LIST_PATH: &str = "list.php";

/// Browser identification the upstream expects.
const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:143.0) Gecko/20100101 Firefox/143.0";

/// The upstream checks the Referer against its own site, not against
/// whatever base URL this client talks to.
const REFERER: &str = "https://sauktiniai.karys.lt/";

const RANGE_UNIT_HEADER: &str = "Range-Unit";
const RANGE_UNIT_ITEMS: &str = "items";

/// Client for the upstream list endpoint.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct UpstreamClient {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl UpstreamClient {
    pub fn new(config: &Config) -> Result<Self> {
        let timeout = config.request_timeout();
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    pub fn list_url(&self, region: Region) -> String {
        format!("{}/{}?region={}", self.base_url, LIST_PATH, region.id())
    }

    fn request(&self, region: Region, start: u32, end: u32) -> RequestBuilder {
        self.client
            .get(self.list_url(region))
            .header(header::ACCEPT, "application/json")
            .header(header::REFERER, REFERER)
            .header(RANGE_UNIT_HEADER, RANGE_UNIT_ITEMS)
            .header(header::RANGE, format!("{}-{}", start, end))
    }

    /// Fetch one window of records.
    ///
    /// Fails when the transport fails (timeout, connection, a body cut off
    /// mid-read). A non-success status or a body that is not a JSON array of
    /// persons yields an empty window. There is no retry here.
    pub async fn fetch(&self, region: Region, start: u32, end: u32) -> Result<Vec<Person>, ApiError> {
        let response = self
            .request(region, start, end)
            .send()
            .await
            .map_err(|e| ApiError::from_reqwest(e, self.timeout))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::from_reqwest(e, self.timeout))?;

        if !status.is_success() {
            debug!(
                region = region.id(),
                start,
                end,
                status = %status,
                body = %ApiError::truncate_body(&body),
                "Upstream returned non-success status, treating window as empty"
            );
            return Ok(Vec::new());
        }

        let persons = parse_persons(&body);
        debug!(region = region.id(), start, end, count = persons.len(), "Window fetched");
        Ok(persons)
    }
}

#[async_trait]
impl WindowSource for UpstreamClient {
    async fn fetch_window(
        &self,
        region: Region,
        start: u32,
        end: u32,
    ) -> Result<Vec<Person>, ApiError> {
        self.fetch(region, start, end).await
    }
}

/// Parse a window body. Anything that is not a JSON array of persons is an empty window.
fn parse_persons(body: &str) -> Vec<Person> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }
    match serde_json::from_str::<Vec<Person>>(trimmed) {
        Ok(persons) => persons,
        Err(e) => {
            debug!(error = %e, body = %ApiError::truncate_body(trimmed), "Unparsable window body");
            Vec::new()
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
