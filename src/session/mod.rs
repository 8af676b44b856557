//! Device login session
//!
//! - `challenge`: challenge parsing and response hashing (MD5 and PBKDF2)
//! - `login`: the `login_sid.lua` handshake, refresh and logout
//! - `sid`: session id newtype and the all-zero sentinel

mod challenge;
mod login;
mod sid;

pub use self::challenge::Challenge;
pub use self::login::{FritzSession, SessionState, LOGIN_PATH};
pub use self::sid::{SessionId, SENTINEL_SID};

use async_trait::async_trait;

use crate::config::Credentials;
use crate::error::Result;

/// What the client needs from a session
#[async_trait]
pub trait SessionHandle: Send + Sync {
    /// Fetch a login challenge
    async fn open(&mut self) -> Result<()>;

    /// Answer the pending challenge
    async fn authenticate(&mut self, credentials: &Credentials) -> Result<()>;

    /// Keep the session alive before the device's idle timeout hits
    async fn refresh_if_needed(&mut self) -> Result<()>;

    /// Best-effort logout; always leaves the session unauthenticated
    async fn close(&mut self);

    /// Current id, `None` while unauthenticated
    fn current_id(&self) -> Option<&SessionId>;

    fn is_closed(&self) -> bool;
}
