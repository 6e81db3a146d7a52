use std::{future::Future, time::Duration};

use chrono::{DateTime, Utc};
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use url::Url;

use crate::{
    config::SessionConfig,
    error::{LivevodError, LivevodResult},
    time::MediaTime,
    util::http::HttpClient,
};

/// Latest recording published for the channel.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamMetadata {
    pub is_channel_live: bool,
    pub live_playback_url: String,
    /// Seconds recorded so far.
    pub playlist_duration: i64,
    /// Path of the recorded master playlist, relative to the distribution domain.
    pub master_key: String,
    pub recording_started_at: String,
}

impl StreamMetadata {
    pub fn live_url(&self) -> LivevodResult<Url> {
        Ok(Url::parse(&self.live_playback_url)?)
    }

    pub fn vod_url(&self, distribution_domain: &str) -> LivevodResult<Url> {
        Ok(Url::parse(&format!(
            "{}/{}",
            distribution_domain.trim_end_matches('/'),
            self.master_key
        ))?)
    }

    pub fn playlist_duration(&self) -> MediaTime {
        MediaTime::new(self.playlist_duration, 1)
    }

    pub fn recording_started_at(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.recording_started_at)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
    }
}

pub trait MetadataProvider: Send + Sync + 'static {
    fn fetch(&self) -> impl Future<Output = LivevodResult<StreamMetadata>> + Send;
}

/// Fetches the metadata JSON from the distribution domain.
///
/// Network failures are retried with exponential backoff; a payload that
/// does not decode is returned right away.
pub struct HttpMetadataProvider {
    client: HttpClient,
    endpoint: Url,
    retry: u32,
    backoff: Duration,
}

impl HttpMetadataProvider {
    pub fn new(client: HttpClient, endpoint: Url) -> Self {
        Self {
            client,
            endpoint,
            retry: 3,
            backoff: Duration::from_millis(500),
        }
    }

    pub fn from_config(client: HttpClient, config: &SessionConfig) -> LivevodResult<Self> {
        Ok(Self::new(client, config.metadata_url()?)
            .with_retry(config.retry)
            .with_backoff(config.retry_backoff()))
    }

    pub fn with_retry(mut self, retry: u32) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    async fn fetch_once(&self) -> LivevodResult<StreamMetadata> {
        let response = self
            .client
            .get(self.endpoint.clone())
            .header(CONTENT_TYPE, "application/json")
            .send()
            .await?;
        if !response.status().is_success() {
            let status = response.status();
            if let Ok(body) = response.text().await {
                log::warn!("Error body: {body}");
            }
            return Err(LivevodError::HttpError(status));
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|source| LivevodError::DecodeError { source, body })
    }
}

impl MetadataProvider for HttpMetadataProvider {
    async fn fetch(&self) -> LivevodResult<StreamMetadata> {
        let mut attempt = 0;
        loop {
            match self.fetch_once().await {
                Ok(metadata) => {
                    log::debug!("Stream metadata fetched from {}", self.endpoint);
                    return Ok(metadata);
                }
                Err(e) if e.is_network_failure() && attempt < self.retry => {
                    let wait = self.backoff * 2u32.saturating_pow(attempt);
                    attempt += 1;
                    log::warn!(
                        "Failed to fetch stream metadata, retry {attempt}/{} in {wait:?}. {e}",
                        self.retry
                    );
                    tokio::time::sleep(wait).await;
                }
                Err(e) => {
                    log::error!("Failed to fetch stream metadata: {e}");
                    return Err(e);
                }
            }
        }
    }
}
