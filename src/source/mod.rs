//! Data access for device rosters and position history.
//!
//! Every public fetch degrades instead of failing: the primary API, then the
//! API's mock endpoint, then the in-process [`MockProvider`].

mod http;
mod mock;

pub use http::*;
pub use mock::*;

use chrono::{DateTime, Utc};
use std::time::Duration;
use thiserror::Error;

use crate::config::ApiConfig;
use crate::model::{format_timestamp, Device, HistoricalPosition, TimeRange};

/// Fetch error types. All of them count as a network failure and trigger
/// the next fallback tier.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("network error: {0}")]
    Network(String),
    #[error("unexpected status {0}")]
    Status(u16),
    #[error("invalid response body: {0}")]
    Decode(String),
}

/// Where a piece of data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// The positioning API proper.
    Primary,
    /// The API's `/mock-devices` endpoint.
    MockApi,
    /// Generated in-process.
    Fallback,
}

impl Origin {
    pub fn is_network(&self) -> bool {
        !matches!(self, Origin::Fallback)
    }
}

/// Data together with the tier that produced it.
#[derive(Debug, Clone)]
pub struct Loaded<T> {
    pub data: T,
    pub origin: Origin,
}

/// Client for the positioning API.
pub struct DeviceService {
    client: reqwest::Client,
    config: ApiConfig,
    mock: MockProvider,
}

impl DeviceService {
    /// Create a service backed by the given mock provider for offline use.
    pub fn new(config: ApiConfig, mock: MockProvider) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| FetchError::Network(e.to_string()))?;

        Ok(Self { client, config, mock })
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url, path)
    }

    /// Current device roster.
    pub async fn get_devices(&self) -> Vec<Device> {
        self.load_devices().await.data
    }

    /// Current device roster and the tier that answered.
    pub async fn load_devices(&self) -> Loaded<Vec<Device>> {
        let url = self.url("devices");
        tracing::debug!("Fetching devices from {}", url);

        let err = match fetch_json(&self.client, &url, &[], self.config.primary_timeout).await {
            Ok(data) => return Loaded { data, origin: Origin::Primary },
            Err(e) => e,
        };
        tracing::warn!("Device API failed ({}), trying mock endpoint", err);

        let url = self.url("mock-devices");
        let err = match fetch_json(&self.client, &url, &[], self.config.mock_timeout).await {
            Ok(data) => return Loaded { data, origin: Origin::MockApi },
            Err(e) => e,
        };
        tracing::error!("Mock device API failed ({}), using offline roster", err);

        self.simulate_latency().await;
        Loaded {
            data: self.mock.roster(Utc::now()),
            origin: Origin::Fallback,
        }
    }

    /// Samples recorded in the closed interval `[start, end]`.
    pub async fn get_historical_positions(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Vec<HistoricalPosition> {
        self.load_historical_positions(TimeRange::new(start, end)).await.data
    }

    /// Samples for `range` and the tier that answered. An inverted range is
    /// swapped before the request is made.
    pub async fn load_historical_positions(&self, range: TimeRange) -> Loaded<Vec<HistoricalPosition>> {
        let range = range.ordered();
        let query = [
            ("startTime", format_timestamp(&range.start_time)),
            ("endTime", format_timestamp(&range.end_time)),
        ];
        let url = self.url("historical-positions");
        tracing::debug!("Fetching historical positions from {} to {}", query[0].1, query[1].1);

        match fetch_json(&self.client, &url, &query, self.config.history_timeout).await {
            Ok(data) => Loaded { data, origin: Origin::Primary },
            Err(e) => {
                tracing::error!("Historical position API failed ({}), generating history", e);
                self.simulate_latency().await;
                let data = self.mock.historical(range, &mut rand::thread_rng());
                Loaded { data, origin: Origin::Fallback }
            }
        }
    }

    /// Look up one device in the current roster.
    pub async fn get_device_by_id(&self, id: &str) -> Option<Device> {
        self.get_devices().await.into_iter().find(|d| d.id == id)
    }

    async fn simulate_latency(&self) {
        if !self.config.mock_latency.is_zero() {
            tokio::time::sleep(self.config.mock_latency).await;
        }
    }
}
