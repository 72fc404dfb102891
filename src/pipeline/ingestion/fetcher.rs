use crate::common::error::FetchError;
use crate::domain::{RawEventRecord, RawLocationRecord};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, info};

/// Retrieves raw JSON payloads with a per-request timeout and a classified
/// failure surface.
///
/// Cancellation is dropping the returned future: the in-flight request is
/// torn down with no side effects on already-built indexes. No retries
/// happen here; retry policy belongs to the caller.
pub struct Fetcher {
    client: reqwest::Client,
    timeout: Duration,
}

fn classify_transport(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout
    } else {
        FetchError::Network(err.to_string())
    }
}

fn classify_status(status: StatusCode) -> Option<FetchError> {
    if status.is_client_error() {
        Some(FetchError::HttpClient(status.as_u16()))
    } else if status.is_server_error() {
        Some(FetchError::HttpServer(status.as_u16()))
    } else {
        None
    }
}

impl Fetcher {
    pub fn new(timeout_ms: u64) -> Self {
        Self {
            client: reqwest::Client::new(),
            timeout: Duration::from_millis(timeout_ms),
        }
    }

    /// Fetches a JSON array of records from `url`.
    pub async fn fetch_records<T: DeserializeOwned>(
        &self,
        url: &str,
    ) -> Result<Vec<T>, FetchError> {
        debug!(%url, "fetching payload");
        let response = self
            .client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(classify_transport)?;

        if let Some(err) = classify_status(response.status()) {
            return Err(err);
        }

        let body = response.text().await.map_err(classify_transport)?;
        let records: Vec<T> =
            serde_json::from_str(&body).map_err(|e| FetchError::MalformedBody(e.to_string()))?;
        info!(%url, count = records.len(), "fetched records");
        Ok(records)
    }
}

/// Transport seam for ingestion; lets tests feed canned payloads without a
/// network.
#[async_trait::async_trait]
pub trait RecordSource: Send + Sync {
    async fn fetch_locations(&self) -> Result<Vec<RawLocationRecord>, FetchError>;
    async fn fetch_events(&self) -> Result<Vec<RawEventRecord>, FetchError>;
}

/// HTTP-backed record source reading the configured payload endpoints.
pub struct HttpRecordSource {
    fetcher: Fetcher,
    locations_url: String,
    events_url: String,
}

impl HttpRecordSource {
    pub fn new(timeout_ms: u64, locations_url: String, events_url: String) -> Self {
        Self {
            fetcher: Fetcher::new(timeout_ms),
            locations_url,
            events_url,
        }
    }
}

#[async_trait::async_trait]
impl RecordSource for HttpRecordSource {
    async fn fetch_locations(&self) -> Result<Vec<RawLocationRecord>, FetchError> {
        self.fetcher.fetch_records(&self.locations_url).await
    }

    async fn fetch_events(&self) -> Result<Vec<RawEventRecord>, FetchError> {
        self.fetcher.fetch_records(&self.events_url).await
    }
}
