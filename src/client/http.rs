//! FRITZ!Box HTTP client

use std::fmt;

use reqwest::header::CONTENT_TYPE;
use reqwest::Method;
use serde::de::DeserializeOwned;
use url::Url;

use super::request::{parse_base_url, Request, FORM_CONTENT_TYPE};
use super::response::{check_status, BodyFormat, Reply, ResponseMeta};
use crate::config::{Config, Credentials, SessionOptions, DEFAULT_HOST};
use crate::error::{Error, Result};
use crate::session::{FritzSession, SessionHandle, SessionId, SENTINEL_SID};

pub struct FritzClient {
    http_client: reqwest::Client,
    base_url: Url,
    options: SessionOptions,
    session: Option<Box<dyn SessionHandle>>,
}

impl FritzClient {
    /// Client for `http://fritz.box/` with default settings.
    pub fn new() -> Result<Self> {
        Self::with_http_client(reqwest::Client::new(), DEFAULT_HOST, SessionOptions::default())
    }

    pub fn with_http_client(
        http_client: reqwest::Client,
        base_url: &str,
        options: SessionOptions,
    ) -> Result<Self> {
        Ok(Self {
            http_client,
            base_url: parse_base_url(base_url)?,
            options,
            session: None,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .timeout(config.timeout())
            .build()
            .map_err(|e| Error::Config(format!("failed to create HTTP client: {}", e)))?;

        Self::with_http_client(http_client, &config.host, config.session_options())
    }

    /// Use `session` instead of creating a `FritzSession` on login.
    pub fn with_session(mut self, session: Box<dyn SessionHandle>) -> Self {
        self.session = Some(session);
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn session(&self) -> Option<&dyn SessionHandle> {
        self.session.as_deref()
    }

    pub fn session_id(&self) -> Option<&SessionId> {
        self.session.as_ref().and_then(|s| s.current_id())
    }

    /// Build a request for `path` relative to the base URL.
    ///
    /// The current session id is added as `sid` query parameter. Non-empty
    /// `form` values are sent as a form-encoded body.
    pub fn new_request(
        &self,
        method: Method,
        path: &str,
        form: &[(&str, &str)],
    ) -> Result<Request> {
        Request::build(&self.base_url, method, path, form, self.session_id())
    }

    /// Send `req`, discarding the body.
    pub async fn send(&mut self, req: &Request) -> Result<ResponseMeta> {
        let resp = self.dispatch(req).await?;
        let meta = ResponseMeta::from_response(&resp);
        resp.bytes().await?;
        Ok(meta)
    }

    /// Send `req` and decode the body according to its content type.
    ///
    /// On a decode failure the returned `Error::Decode` still carries the
    /// response status and headers.
    pub async fn send_decoded<T: DeserializeOwned>(&mut self, req: &Request) -> Result<Reply<T>> {
        let resp = self.dispatch(req).await?;
        let meta = ResponseMeta::from_response(&resp);
        let format = BodyFormat::from_content_type(meta.content_type());
        let body = resp.bytes().await?;

        match format.decode(&body) {
            Ok(body) => Ok(Reply { meta, body }),
            Err(source) => Err(Error::Decode {
                meta: Box::new(meta),
                source,
            }),
        }
    }

    async fn dispatch(&mut self, req: &Request) -> Result<reqwest::Response> {
        if let Some(session) = self.session.as_mut() {
            session.refresh_if_needed().await?;
        }

        let mut builder = self.http_client.request(req.method().clone(), req.url().clone());
        if let Some(body) = req.body() {
            builder = builder
                .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
                .body(body.to_string());
        }

        tracing::debug!("[Fritz] {} {}", req.method(), req.url().path());
        let resp = builder.send().await?;
        check_status(resp.status())?;
        Ok(resp)
    }

    /// Log in with `username` and `password`.
    pub async fn auth(&mut self, username: &str, password: &str) -> Result<()> {
        let credentials = Credentials::new(username, password)?;
        self.login(&credentials).await
    }

    pub async fn login(&mut self, credentials: &Credentials) -> Result<()> {
        let session: Box<dyn SessionHandle> = match self.session.take() {
            Some(session) if !session.is_closed() => session,
            _ => Box::new(FritzSession::new(
                self.http_client.clone(),
                &self.base_url,
                self.options,
            )?),
        };

        let session = self.session.insert(session);
        session.open().await?;
        session.authenticate(credentials).await
    }

    /// Log out and drop the session.
    pub async fn close_session(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.close().await;
        }
    }
}

impl fmt::Display for FritzClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.session_id() {
            Some(sid) => fmt::Display::fmt(sid, f),
            None => f.write_str(SENTINEL_SID),
        }
    }
}

impl fmt::Debug for FritzClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FritzClient")
            .field("base_url", &self.base_url.as_str())
            .field("session", &self.session_id())
            .finish()
    }
}
