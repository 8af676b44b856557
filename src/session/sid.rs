//! Session id issued by `login_sid.lua`

use std::fmt;

use crate::error::{Error, Result};

/// Sixteen zeros: no valid session.
pub const SENTINEL_SID: &str = "0000000000000000";

const SID_LEN: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionId(String);

impl SessionId {
    pub fn sentinel() -> Self {
        Self(SENTINEL_SID.to_string())
    }

    /// Parse the 16 hex character id from a device reply.
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if raw.len() != SID_LEN || !raw.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(Error::Protocol(format!("malformed SID {:?}", raw)));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn is_valid(&self) -> bool {
        self.0 != SENTINEL_SID
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::sentinel()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
