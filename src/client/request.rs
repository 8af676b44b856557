//! Request envelope and URL resolution

use reqwest::Method;
use url::Url;

use crate::error::{Error, Result};
use crate::session::{SessionId, SENTINEL_SID};

pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

const SID_PARAM: &str = "sid";

/// A fully resolved request. Built once per call and never mutated.
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    url: Url,
    body: Option<String>,
}

impl Request {
    pub(crate) fn build(
        base: &Url,
        method: Method,
        path: &str,
        form: &[(&str, &str)],
        sid: Option<&SessionId>,
    ) -> Result<Self> {
        let mut url = resolve(base, path)?;
        stamp_sid(&mut url, sid);

        let body = if form.is_empty() {
            None
        } else {
            Some(
                url::form_urlencoded::Serializer::new(String::new())
                    .extend_pairs(form)
                    .finish(),
            )
        };

        Ok(Self { method, url, body })
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Form-encoded body, if any
    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }
}

/// Parse and normalize the device base address.
pub fn parse_base_url(raw: &str) -> Result<Url> {
    let mut url = Url::parse(raw)
        .map_err(|e| Error::Validation(format!("invalid base URL {:?}: {}", raw, e)))?;

    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        return Err(Error::Validation(format!("base URL must be http(s): {:?}", raw)));
    }
    if url.query().is_some() {
        return Err(Error::Validation(format!("base URL must not carry a query: {:?}", raw)));
    }

    url.set_fragment(None);
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Resolve `path` against `base`, refusing anything that leaves its origin.
pub fn resolve(base: &Url, path: &str) -> Result<Url> {
    let url = base
        .join(path)
        .map_err(|e| Error::Validation(format!("invalid request path {:?}: {}", path, e)))?;

    if url.origin() != base.origin() {
        return Err(Error::Validation(format!(
            "request path {:?} leaves {}",
            path,
            base.origin().ascii_serialization()
        )));
    }
    Ok(url)
}

fn stamp_sid(url: &mut Url, sid: Option<&SessionId>) {
    let had_sid = url.query_pairs().any(|(k, _)| k == SID_PARAM);
    if sid.is_none() && !had_sid {
        return;
    }

    // Keep a caller-supplied sid only when no session provides one and it is not the sentinel
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, v)| *k != SID_PARAM || (sid.is_none() && *v != SENTINEL_SID))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    if pairs.is_empty() && sid.is_none() {
        url.set_query(None);
        return;
    }

    let mut query = url.query_pairs_mut();
    query.clear().extend_pairs(pairs);
    if let Some(sid) = sid {
        query.append_pair(SID_PARAM, sid.as_str());
    }
}
