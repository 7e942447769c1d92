// src/errors.rs

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FinchatError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("credential error: {0}")]
    Token(String),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("logger setup failed: {0}")]
    Logging(#[from] flexi_logger::FlexiLoggerError),
}

pub type FinchatResult<T> = Result<T, FinchatError>;

impl FinchatError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        FinchatError::Config(msg.into())
    }

    pub fn token_error(msg: impl Into<String>) -> Self {
        FinchatError::Token(msg.into())
    }

    pub fn connection_error(msg: impl Into<String>) -> Self {
        FinchatError::Connection(msg.into())
    }
}
