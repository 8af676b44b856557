//! fritzbox-client - FRITZ!Box web interface client
//!
//! Logs in through the `login_sid.lua` challenge-response handshake, keeps
//! the session id alive, stamps it onto every request and decodes XML/JSON
//! replies. `ops` adds the info, reconnect and reboot commands on top.

pub mod client;
pub mod config;
pub mod error;
pub mod ops;
pub mod session;

#[cfg(test)]
mod test_support;

pub use crate::client::{FritzClient, Reply, Request, ResponseMeta};
pub use crate::config::{Config, Credentials, SessionOptions};
pub use crate::error::{Error, Result};
pub use crate::ops::Fritz;
pub use crate::session::{FritzSession, SessionHandle, SessionId};
