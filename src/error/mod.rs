//! Error handling module

use reqwest::StatusCode;
use thiserror::Error;

use crate::client::ResponseMeta;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Authentication failed: {reason}")]
    Auth {
        reason: String,
        /// Seconds the device blocks further login attempts, if it reported any
        block_time: Option<u32>,
    },

    #[error("Wrong status code: {0}")]
    Status(StatusCode),

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Failed to decode {} response: {source}", .meta.status)]
    Decode {
        meta: Box<ResponseMeta>,
        source: DecodeError,
    },

    #[error("Session closed")]
    SessionClosed,

    #[error("Configuration error: {0}")]
    Config(String),
}

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("invalid XML: {0}")]
    Xml(#[from] quick_xml::DeError),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn auth(reason: impl Into<String>) -> Self {
        Error::Auth {
            reason: reason.into(),
            block_time: None,
        }
    }

    /// Whether repeating the call (with backoff) can reasonably succeed.
    ///
    /// Protocol errors count as retryable once; a repeated one usually means
    /// the firmware speaks a different login dialect.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Transport(_) | Error::Protocol(_) => true,
            Error::Status(status) => status.is_server_error(),
            Error::Validation(_)
            | Error::Auth { .. }
            | Error::Decode { .. }
            | Error::SessionClosed
            | Error::Config(_) => false,
        }
    }

    /// HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::Status(status) => Some(*status),
            Error::Decode { meta, .. } => Some(meta.status),
            Error::Transport(e) => e.status(),
            _ => None,
        }
    }
}
