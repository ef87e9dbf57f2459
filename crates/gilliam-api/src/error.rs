//! リモート API のエラー型

use thiserror::Error;

/// Gilliam のサービスとの通信で起きるエラー
#[derive(Error, Debug)]
pub enum ApiError {
    /// 同時更新により書き込みが拒否された（HTTP 409）
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("websocket error: {0}")]
    WebSocket(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("{registry}: {reason}")]
    InvalidRegistry { registry: String, reason: String },

    #[error("unexpected response: {0}")]
    Protocol(String),

    #[error("remote error: {0}")]
    Remote(String),

    #[error("no executor instances registered")]
    NoExecutor,

    #[error("cannot find executor instance {0}")]
    ExecutorNotFound(String),

    #[error("service registry unavailable: {0}")]
    RegistryUnavailable(String),
}

impl ApiError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, ApiError::Conflict(_))
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for ApiError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        ApiError::WebSocket(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;
