//! Response metadata, status check and body decoding

use reqwest::header::{HeaderMap, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use url::Url;

use crate::error::{DecodeError, Error, Result};

/// Status line and headers of a dispatched request
#[derive(Debug, Clone)]
pub struct ResponseMeta {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub url: Url,
}

impl ResponseMeta {
    pub(crate) fn from_response(resp: &reqwest::Response) -> Self {
        Self {
            status: resp.status(),
            headers: resp.headers().clone(),
            url: resp.url().clone(),
        }
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok())
    }
}

/// Decoded reply. `body` is `None` when the content type has no decoder.
#[derive(Debug)]
pub struct Reply<T> {
    pub meta: ResponseMeta,
    pub body: Option<T>,
}

/// Accept exactly the closed range 200..=299.
pub(crate) fn check_status(status: StatusCode) -> Result<()> {
    if (200..=299).contains(&status.as_u16()) {
        Ok(())
    } else {
        Err(Error::Status(status))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyFormat {
    Xml,
    Json,
    Other,
}

impl BodyFormat {
    pub fn from_content_type(content_type: Option<&str>) -> Self {
        match content_type {
            Some(ct) if ct.contains("text/xml") => BodyFormat::Xml,
            Some(ct) if ct.contains("application/json") => BodyFormat::Json,
            _ => BodyFormat::Other,
        }
    }

    pub(crate) fn decode<T: DeserializeOwned>(
        self,
        body: &[u8],
    ) -> std::result::Result<Option<T>, DecodeError> {
        match self {
            BodyFormat::Xml => Ok(Some(quick_xml::de::from_reader(body)?)),
            BodyFormat::Json => Ok(Some(serde_json::from_slice(body)?)),
            BodyFormat::Other => Ok(None),
        }
    }
}
