//! Configuration module

use std::fmt;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{Error, Result};

pub const DEFAULT_HOST: &str = "http://fritz.box/";

/// Idle window after which the device drops a session.
pub const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 20 * 60;

/// Refresh this long before the idle window runs out.
pub const DEFAULT_REFRESH_MARGIN_SECS: u64 = 5 * 60;

#[derive(Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,
    pub username: String,
    pub password: String,
    /// Devices ship self-signed certificates on their https interface
    #[serde(default)]
    pub accept_invalid_certs: bool,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,
    #[serde(default = "default_refresh_margin_secs")]
    pub refresh_margin_secs: u64,
    /// Ask for PBKDF2 challenges (FRITZ!OS 7.24+)
    #[serde(default)]
    pub pbkdf2_login: bool,
}

// Password stays out of debug output
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("host", &self.host)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("accept_invalid_certs", &self.accept_invalid_certs)
            .field("timeout_secs", &self.timeout_secs)
            .field("idle_timeout_secs", &self.idle_timeout_secs)
            .field("refresh_margin_secs", &self.refresh_margin_secs)
            .field("pbkdf2_login", &self.pbkdf2_login)
            .finish()
    }
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_idle_timeout_secs() -> u64 {
    DEFAULT_IDLE_TIMEOUT_SECS
}

fn default_refresh_margin_secs() -> u64 {
    DEFAULT_REFRESH_MARGIN_SECS
}

impl Config {
    pub fn new(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            username: username.into(),
            password: password.into(),
            accept_invalid_certs: false,
            timeout_secs: default_timeout_secs(),
            idle_timeout_secs: default_idle_timeout_secs(),
            refresh_margin_secs: default_refresh_margin_secs(),
            pbkdf2_login: false,
        }
    }

    /// Build the config from `FRITZ__*` environment variables.
    pub fn load() -> anyhow::Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::Environment::with_prefix("FRITZ").separator("__"))
            .build()?;

        let config: Config = settings.try_deserialize()?;
        Ok(config)
    }

    pub fn credentials(&self) -> Result<Credentials> {
        Credentials::new(&self.username, &self.password)
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            idle_timeout: Duration::from_secs(self.idle_timeout_secs),
            refresh_margin: Duration::from_secs(self.refresh_margin_secs),
            pbkdf2_login: self.pbkdf2_login,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Session expiry policy and login dialect.
#[derive(Debug, Clone, Copy)]
pub struct SessionOptions {
    pub idle_timeout: Duration,
    pub refresh_margin: Duration,
    pub pbkdf2_login: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            idle_timeout: Duration::from_secs(DEFAULT_IDLE_TIMEOUT_SECS),
            refresh_margin: Duration::from_secs(DEFAULT_REFRESH_MARGIN_SECS),
            pbkdf2_login: false,
        }
    }
}

impl SessionOptions {
    /// Age at which a session should be refreshed before use.
    pub fn refresh_after(&self) -> Duration {
        self.idle_timeout.saturating_sub(self.refresh_margin)
    }
}

/// Username and password for one login handshake.
#[derive(Clone)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    pub fn new(username: &str, password: &str) -> Result<Self> {
        if username.is_empty() {
            return Err(Error::Validation("username must not be empty".to_string()));
        }
        if password.is_empty() {
            return Err(Error::Validation("password must not be empty".to_string()));
        }
        Ok(Self {
            username: username.to_string(),
            password: password.to_string(),
        })
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub(crate) fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}
