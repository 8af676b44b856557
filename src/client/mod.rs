//! Request pipeline against the device web interface
//!
//! - `http`: client owning the session, dispatch and decoding
//! - `request`: request envelope, base URL normalization, sid stamping
//! - `response`: status acceptance and content-type driven decoding

mod http;
mod request;
mod response;

pub use self::http::FritzClient;
pub use self::request::{parse_base_url, resolve, Request, FORM_CONTENT_TYPE};
pub use self::response::{BodyFormat, Reply, ResponseMeta};

pub(crate) use self::response::check_status;

pub use reqwest::Method;
