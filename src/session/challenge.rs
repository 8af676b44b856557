//! Login challenge parsing and response computation
//!
//! Two dialects exist: a plain nonce answered with a double MD5, and the
//! `2$<iter1>$<salt1>$<iter2>$<salt2>` form answered with two PBKDF2-HMAC-SHA256
//! rounds.

use md5::{Digest, Md5};
use sha2::Sha256;

use crate::error::{Error, Result};

const PBKDF2_PREFIX: &str = "2$";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Challenge {
    Md5(String),
    Pbkdf2 {
        iter1: u32,
        salt1: Vec<u8>,
        iter2: u32,
        salt2: Vec<u8>,
        /// `salt2` as sent, echoed back in the response
        salt2_raw: String,
    },
}

impl Challenge {
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(Error::Protocol("empty challenge".to_string()));
        }

        let Some(rest) = raw.strip_prefix(PBKDF2_PREFIX) else {
            return Ok(Challenge::Md5(raw.to_string()));
        };

        let parts: Vec<&str> = rest.split('$').collect();
        let [iter1, salt1, iter2, salt2] = parts.as_slice() else {
            return Err(Error::Protocol(format!("malformed PBKDF2 challenge {:?}", raw)));
        };

        Ok(Challenge::Pbkdf2 {
            iter1: parse_iterations(iter1)?,
            salt1: parse_salt(salt1)?,
            iter2: parse_iterations(iter2)?,
            salt2: parse_salt(salt2)?,
            salt2_raw: salt2.to_string(),
        })
    }

    /// Compute the `response` query value for `password`.
    pub fn response(&self, password: &str) -> String {
        match self {
            Challenge::Md5(challenge) => {
                let inner = md5_hex(&utf16le(password));
                let outer = md5_hex(format!("{}-{}", challenge, inner).as_bytes());
                format!("{}-{}", challenge, outer)
            }
            Challenge::Pbkdf2 {
                iter1,
                salt1,
                iter2,
                salt2,
                salt2_raw,
            } => {
                let mut hash1 = [0u8; 32];
                pbkdf2::pbkdf2_hmac::<Sha256>(password.as_bytes(), salt1, *iter1, &mut hash1);
                let mut hash2 = [0u8; 32];
                pbkdf2::pbkdf2_hmac::<Sha256>(&hash1, salt2, *iter2, &mut hash2);
                format!("{}${}", salt2_raw, hex::encode(hash2))
            }
        }
    }
}

fn parse_iterations(raw: &str) -> Result<u32> {
    match raw.parse::<u32>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(Error::Protocol(format!("invalid PBKDF2 iteration count {:?}", raw))),
    }
}

fn parse_salt(raw: &str) -> Result<Vec<u8>> {
    hex::decode(raw).map_err(|e| Error::Protocol(format!("invalid PBKDF2 salt {:?}: {}", raw, e)))
}

fn utf16le(s: &str) -> Vec<u8> {
    s.encode_utf16().flat_map(|unit| unit.to_le_bytes()).collect()
}

fn md5_hex(data: &[u8]) -> String {
    hex::encode(Md5::digest(data))
}
