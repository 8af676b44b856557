//! Challenge-response session against `login_sid.lua`

use std::fmt;
use std::time::Instant;

use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

use super::challenge::Challenge;
use super::sid::SessionId;
use super::SessionHandle;
use crate::client::check_status;
use crate::config::{Credentials, SessionOptions};
use crate::error::{Error, Result};

pub const LOGIN_PATH: &str = "login_sid.lua";

/// `<SessionInfo>` document returned by every login call
#[derive(Debug, Deserialize)]
#[serde(rename = "SessionInfo")]
struct SessionInfo {
    #[serde(rename = "SID")]
    sid: String,
    #[serde(rename = "Challenge", default)]
    challenge: String,
    #[serde(rename = "BlockTime", default)]
    block_time: u32,
}

impl SessionInfo {
    fn from_xml(body: &str) -> Result<Self> {
        quick_xml::de::from_str(body)
            .map_err(|e| Error::Protocol(format!("unexpected SessionInfo document: {}", e)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Empty,
    /// Challenge received, not yet answered
    Opened,
    Authenticated,
    Closed,
}

pub struct FritzSession {
    http: reqwest::Client,
    login_url: Url,
    options: SessionOptions,
    state: SessionState,
    sid: SessionId,
    challenge: Option<Challenge>,
    last_refresh: Option<Instant>,
}

impl FritzSession {
    pub fn new(http: reqwest::Client, base_url: &Url, options: SessionOptions) -> Result<Self> {
        let login_url = base_url
            .join(LOGIN_PATH)
            .map_err(|e| Error::Validation(format!("cannot build login URL: {}", e)))?;

        Ok(Self {
            http,
            login_url,
            options,
            state: SessionState::Empty,
            sid: SessionId::sentinel(),
            challenge: None,
            last_refresh: None,
        })
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn sid(&self) -> &SessionId {
        &self.sid
    }

    fn ensure_not_closed(&self) -> Result<()> {
        if self.state == SessionState::Closed {
            return Err(Error::SessionClosed);
        }
        Ok(())
    }

    async fn fetch(&self, params: &[(&str, &str)]) -> Result<SessionInfo> {
        let mut url = self.login_url.clone();
        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(params);
        }

        let resp = self.http.get(url).send().await?;
        check_status(resp.status())?;
        let body = resp.text().await?;
        SessionInfo::from_xml(&body)
    }

    fn mark_authenticated(&mut self, sid: SessionId) {
        self.sid = sid;
        self.state = SessionState::Authenticated;
        self.last_refresh = Some(Instant::now());
    }

    fn needs_refresh(&self) -> bool {
        match self.last_refresh {
            Some(at) => at.elapsed() >= self.options.refresh_after(),
            None => true,
        }
    }

    /// Request a login challenge. A live SID reported by the device is adopted.
    pub async fn open(&mut self) -> Result<()> {
        self.ensure_not_closed()?;

        let params: &[(&str, &str)] = if self.options.pbkdf2_login {
            &[("version", "2")]
        } else {
            &[]
        };
        let info = self.fetch(params).await?;

        self.challenge = Some(Challenge::parse(&info.challenge)?);
        let sid = SessionId::parse(&info.sid)?;
        if sid.is_valid() {
            self.mark_authenticated(sid);
        } else if self.state == SessionState::Empty {
            self.state = SessionState::Opened;
        }

        tracing::debug!("[Fritz] Login challenge received from {}", self.login_url);
        Ok(())
    }

    /// Answer the pending challenge with `credentials`.
    pub async fn authenticate(&mut self, credentials: &Credentials) -> Result<()> {
        self.ensure_not_closed()?;

        let challenge = self.challenge.as_ref().ok_or_else(|| {
            Error::Protocol("no pending login challenge, open the session first".to_string())
        })?;
        let response = challenge.response(credentials.password());

        let result = self
            .fetch(&[("username", credentials.username()), ("response", &response)])
            .await;

        // The challenge is spent once the device has answered
        if !matches!(result, Err(Error::Transport(_))) {
            self.challenge = None;
        }

        let info = result.map_err(|e| match e {
            Error::Protocol(reason) => Error::auth(reason),
            other => other,
        })?;

        let sid = SessionId::parse(&info.sid).map_err(|e| Error::auth(e.to_string()))?;
        if !sid.is_valid() {
            // A rejected login comes with a fresh challenge for the next attempt
            self.challenge = Challenge::parse(&info.challenge).ok();
            return Err(Error::Auth {
                reason: format!("credentials rejected for user {}", credentials.username()),
                block_time: (info.block_time > 0).then_some(info.block_time),
            });
        }

        self.mark_authenticated(sid);
        tracing::debug!("[Fritz] Logged in as {}", credentials.username());
        Ok(())
    }

    /// Re-assert the current SID to reset the device's idle clock.
    pub async fn refresh(&mut self) -> Result<()> {
        self.ensure_not_closed()?;
        if !self.sid.is_valid() {
            return Err(Error::auth("no authenticated session to refresh"));
        }

        let info = self.fetch(&[("sid", self.sid.as_str())]).await?;
        let sid = SessionId::parse(&info.sid)?;
        if !sid.is_valid() {
            self.sid = SessionId::sentinel();
            self.state = SessionState::Opened;
            self.last_refresh = None;
            self.challenge = Challenge::parse(&info.challenge).ok();
            return Err(Error::auth("session expired on the device"));
        }

        if sid != self.sid {
            tracing::debug!("[Fritz] Device reissued session id");
        }
        self.mark_authenticated(sid);
        Ok(())
    }

    /// Log out and reset to the sentinel id. Failures are only logged.
    pub async fn close(&mut self) {
        if self.sid.is_valid() {
            let sid = self.sid.to_string();
            match self.fetch(&[("logout", "1"), ("sid", &sid)]).await {
                Ok(_) => tracing::debug!("[Fritz] Logged out"),
                Err(e) => tracing::warn!("[Fritz] Logout failed: {}", e),
            }
        }

        self.sid = SessionId::sentinel();
        self.challenge = None;
        self.last_refresh = None;
        self.state = SessionState::Closed;
    }
}

impl fmt::Display for FritzSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.sid, f)
    }
}

impl fmt::Debug for FritzSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FritzSession")
            .field("login_url", &self.login_url.as_str())
            .field("state", &self.state)
            .field("sid", &self.sid)
            .finish()
    }
}

#[async_trait]
impl SessionHandle for FritzSession {
    async fn open(&mut self) -> Result<()> {
        FritzSession::open(self).await
    }

    async fn authenticate(&mut self, credentials: &Credentials) -> Result<()> {
        FritzSession::authenticate(self, credentials).await
    }

    async fn refresh_if_needed(&mut self) -> Result<()> {
        self.ensure_not_closed()?;
        if self.state == SessionState::Authenticated && self.needs_refresh() {
            self.refresh().await?;
        }
        Ok(())
    }

    async fn close(&mut self) {
        FritzSession::close(self).await
    }

    fn current_id(&self) -> Option<&SessionId> {
        Some(&self.sid).filter(|sid| sid.is_valid())
    }

    fn is_closed(&self) -> bool {
        self.state == SessionState::Closed
    }
}
