//! Mock FRITZ!Box served by axum on a loopback port

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use url::Url;

use crate::session::SENTINEL_SID;

pub const MOCK_SID: &str = "0123456789abcdef";

/// Accepted login responses, computed independently of the crate's hashing
const KNOWN_RESPONSES: &[(&str, &str, &str)] = &[
    ("1234567z", "pw", "1234567z-59bb5dca640926247cd415d6ad343b21"),
    (
        "2$10000$5A1711$2000$5A1722",
        "1example!",
        "5A1722$1798a1672bca7c6463d6b245f82b53703b0f50813401b03e4045a5861e689adb",
    ),
];

fn known_response(challenge: &str, password: &str) -> Option<&'static str> {
    KNOWN_RESPONSES
        .iter()
        .find(|(c, p, _)| *c == challenge && *p == password)
        .map(|(_, _, response)| *response)
}

#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub query: HashMap<String, String>,
    pub form: HashMap<String, String>,
    pub content_type: Option<String>,
}

#[derive(Debug)]
pub struct DeviceState {
    pub username: String,
    pub challenge: String,
    pub password: String,
    pub block_time: u32,
    /// SID handed out on the next refresh
    pub reissue_sid: Option<String>,
    /// Treat every refresh as hitting a timed-out session
    pub expired: bool,
    /// Raw body for every login_sid.lua reply
    pub login_body_override: Option<String>,
    pub issued: Option<String>,
    pub requests: Vec<Recorded>,
}

impl DeviceState {
    pub fn new(challenge: &str, password: &str) -> Self {
        Self {
            username: "user".to_string(),
            challenge: challenge.to_string(),
            password: password.to_string(),
            block_time: 0,
            reissue_sid: None,
            expired: false,
            login_body_override: None,
            issued: None,
            requests: Vec::new(),
        }
    }
}

impl Default for DeviceState {
    fn default() -> Self {
        Self::new("1234567z", "pw")
    }
}

type Shared = Arc<Mutex<DeviceState>>;

pub struct MockDevice {
    pub addr: SocketAddr,
    pub state: Shared,
}

impl MockDevice {
    pub fn base_url(&self) -> Url {
        Url::parse(&format!("http://{}/", self.addr)).unwrap()
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn last_request(&self, path: &str) -> Option<Recorded> {
        self.requests().into_iter().rev().find(|r| r.path == path)
    }

    pub fn hits(&self, path: &str) -> usize {
        self.requests().iter().filter(|r| r.path == path).count()
    }
}

pub async fn spawn(state: DeviceState) -> MockDevice {
    let state: Shared = Arc::new(Mutex::new(state));
    let app = Router::new().fallback(handle).with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    MockDevice { addr, state }
}

/// Base URL of a loopback port nobody listens on.
pub async fn unreachable_base_url() -> Url {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    Url::parse(&format!("http://{}/", addr)).unwrap()
}

fn parse_pairs(raw: &str) -> HashMap<String, String> {
    url::form_urlencoded::parse(raw.as_bytes()).into_owned().collect()
}

fn reply(content_type: &'static str, body: String) -> Response {
    ([(CONTENT_TYPE, content_type)], body).into_response()
}

fn json(value: serde_json::Value) -> Response {
    reply("application/json", value.to_string())
}

fn session_info(sid: &str, challenge: &str, block_time: u32) -> Response {
    reply(
        "text/xml",
        format!(
            concat!(
                r#"<?xml version="1.0" encoding="utf-8"?>"#,
                "<SessionInfo><SID>{}</SID><Challenge>{}</Challenge><BlockTime>{}</BlockTime>",
                "<Rights><Name>Dial</Name><Access>2</Access></Rights></SessionInfo>",
            ),
            sid, challenge, block_time
        ),
    )
}

async fn handle(
    State(state): State<Shared>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> Response {
    let query = parse_pairs(uri.query().unwrap_or(""));
    let form = parse_pairs(&body);
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let mut st = state.lock().unwrap();
    st.requests.push(Recorded {
        method: method.to_string(),
        path: uri.path().to_string(),
        query: query.clone(),
        form: form.clone(),
        content_type,
    });

    match uri.path() {
        "/login_sid.lua" => login(&mut st, &query),
        "/data.lua" => json(serde_json::json!({
            "data": { "page": form.get("page"), "ok": true }
        })),
        "/reboot.lua" => reply("text/html", "<html>rebooting</html>".to_string()),
        "/internet/inetstat_monitor.lua" => {
            json(serde_json::json!({ "action": query.get("action") }))
        }
        "/json" => json(serde_json::json!({ "data": { "ok": true } })),
        "/xml" => reply("text/xml", "<Info><Model>FRITZ!Box 7590</Model></Info>".to_string()),
        "/plain" => reply("text/plain", "hello".to_string()),
        "/broken" => reply("application/json", r#"{"data":"#.to_string()),
        "/echo" => json(serde_json::to_value(&form).unwrap()),
        path => match path.strip_prefix("/status/").and_then(|c| c.parse::<u16>().ok()) {
            Some(code) => (StatusCode::from_u16(code).unwrap(), "status").into_response(),
            None => StatusCode::NOT_FOUND.into_response(),
        },
    }
}

fn login(st: &mut DeviceState, query: &HashMap<String, String>) -> Response {
    if let Some(body) = &st.login_body_override {
        return reply("text/xml", body.clone());
    }

    if query.contains_key("logout") {
        st.issued = None;
        return session_info(SENTINEL_SID, &st.challenge, 0);
    }

    if let (Some(user), Some(response)) = (query.get("username"), query.get("response")) {
        let expected = known_response(&st.challenge, &st.password);
        if *user == st.username && expected == Some(response.as_str()) {
            st.issued = Some(MOCK_SID.to_string());
            return session_info(MOCK_SID, &st.challenge, 0);
        }
        return session_info(SENTINEL_SID, &st.challenge, st.block_time);
    }

    if let Some(sid) = query.get("sid") {
        if !st.expired && st.issued.as_ref() == Some(sid) {
            let next = st.reissue_sid.take().unwrap_or_else(|| sid.clone());
            st.issued = Some(next.clone());
            return session_info(&next, "", 0);
        }
    }

    session_info(SENTINEL_SID, &st.challenge, 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_response_lookup() {
        assert_eq!(
            known_response("1234567z", "pw"),
            Some("1234567z-59bb5dca640926247cd415d6ad343b21")
        );
        assert_eq!(known_response("1234567z", "other"), None);
        assert_eq!(known_response("7654321a", "pw"), None);
    }
}
