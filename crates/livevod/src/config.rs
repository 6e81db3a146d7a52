use std::{path::Path, time::Duration};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::{error::LivevodResult, time::MediaTime};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Origin serving both the metadata file and the recorded playlists.
    pub distribution_domain: String,
    pub metadata_file: String,

    /// Extra attempts for a failed metadata fetch.
    pub retry: u32,
    /// First backoff between metadata attempts, doubled each time.
    pub retry_backoff_ms: u64,

    /// Display ticks per second.
    pub tick_rate: u32,
    pub controls_timeout_secs: f64,
    /// Step of the back/forward buttons.
    pub skip_secs: f64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            distribution_domain: "https://d328da4i6b8le0.cloudfront.net".to_string(),
            metadata_file: "recording-started-latest.json".to_string(),
            retry: 3,
            retry_backoff_ms: 500,
            tick_rate: 5,
            controls_timeout_secs: 3.0,
            skip_secs: 60.0,
        }
    }
}

impl SessionConfig {
    pub fn load(path: impl AsRef<Path>) -> LivevodResult<Self> {
        let data = std::fs::read_to_string(path)?;
        Self::from_toml(&data)
    }

    pub fn from_toml(data: &str) -> LivevodResult<Self> {
        Ok(toml::from_str(data)?)
    }

    pub fn metadata_url(&self) -> LivevodResult<Url> {
        Ok(Url::parse(&format!(
            "{}/{}",
            self.distribution_domain.trim_end_matches('/'),
            self.metadata_file
        ))?)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(1) / self.tick_rate.max(1)
    }

    pub fn controls_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.controls_timeout_secs.max(0.0))
    }

    pub fn skip_step(&self) -> MediaTime {
        MediaTime::from_seconds(self.skip_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.tick_interval(), Duration::from_millis(200));
        assert_eq!(config.controls_timeout(), Duration::from_secs(3));
        assert_eq!(
            config.metadata_url().unwrap().as_str(),
            "https://d328da4i6b8le0.cloudfront.net/recording-started-latest.json"
        );
    }

    #[test]
    fn test_partial_toml() {
        let config = SessionConfig::from_toml(
            r#"
distribution_domain = "https://example.com/"
retry = 0
tick_rate = 10
"#,
        )
        .unwrap();
        assert_eq!(config.retry, 0);
        assert_eq!(config.tick_interval(), Duration::from_millis(100));
        assert_eq!(config.skip_secs, 60.0);
        assert_eq!(
            config.metadata_url().unwrap().as_str(),
            "https://example.com/recording-started-latest.json"
        );
    }

    #[test]
    fn test_invalid_toml() {
        assert!(SessionConfig::from_toml("retry = \"many\"").is_err());
    }
}
