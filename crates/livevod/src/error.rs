use thiserror::Error;

use crate::engine::PlayerSlot;

#[derive(Error, Debug)]
pub enum LivevodError {
    #[error("HTTP error: {0}")]
    HttpError(reqwest::StatusCode),

    #[error(transparent)]
    RequestError(#[from] reqwest::Error),

    #[error("Could not decode metadata: {source}, raw reason: {body}")]
    DecodeError {
        source: serde_json::Error,
        body: String,
    },

    #[error(transparent)]
    UrlParseError(#[from] url::ParseError),

    #[error(transparent)]
    ConfigError(#[from] toml::de::Error),

    #[error(transparent)]
    IOError(#[from] std::io::Error),

    #[error("{slot} player failed: {message}")]
    PlaybackError { slot: PlayerSlot, message: String },
}

impl LivevodError {
    /// Network failures cover both transport errors and non-success statuses.
    pub fn is_network_failure(&self) -> bool {
        matches!(self, Self::HttpError(_) | Self::RequestError(_))
    }

    pub fn is_decode_failure(&self) -> bool {
        matches!(self, Self::DecodeError { .. })
    }
}

pub type LivevodResult<T> = Result<T, LivevodError>;
