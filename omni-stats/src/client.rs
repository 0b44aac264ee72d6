//! HTTP client for the Omni stats endpoint.
//!
//! One blocking-style round trip per render cycle: GET with a cache-buster
//! query param, bounded by a fixed timeout. No retry, no backoff; every
//! failure is surfaced to the caller.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::error::StatsError;
use crate::snapshot::MarketSnapshot;

/// Default bound on one stats round trip.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// A successfully fetched snapshot plus its wall-clock fetch time.
#[derive(Debug, Clone)]
pub struct StatsUpdate {
    pub snapshot: MarketSnapshot,
    pub fetched_at: DateTime<Utc>,
}

/// Client for the venue's stats endpoint.
#[derive(Debug, Clone)]
pub struct StatsClient {
    http: reqwest::Client,
    url: String,
}

impl StatsClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, StatsError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|error| StatsError::Request(error.to_string()))?;
        Ok(Self {
            http,
            url: url.into(),
        })
    }

    /// Fetch a fresh snapshot.
    ///
    /// The `_` query param carries the current unix time so intermediaries
    /// never serve a cached body.
    pub async fn fetch(&self) -> Result<StatsUpdate, StatsError> {
        debug!(url = %self.url, "fetching stats snapshot");
        let response = self
            .http
            .get(&self.url)
            .query(&[("_", Utc::now().timestamp())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(StatsError::Status(status.as_u16()));
        }

        let snapshot = response.json::<MarketSnapshot>().await?;
        let fetched_at = Utc::now();
        info!(listings = snapshot.listings.len(), "stats snapshot fetched");
        Ok(StatsUpdate {
            snapshot,
            fetched_at,
        })
    }
}
