//! Administrative operations built on the client
//!
//! Each operation logs in, runs its requests and logs out again, also when
//! one of the requests fails.

use serde::Deserialize;

use crate::client::{FritzClient, Method};
use crate::config::{Config, Credentials};
use crate::error::{Error, Result};

const DATA_PATH: &str = "data.lua";
const REBOOT_PATH: &str = "reboot.lua";
const MONITOR_PATH: &str = "internet/inetstat_monitor.lua";

#[derive(Debug, Deserialize)]
struct DataEnvelope {
    data: serde_json::Value,
}

pub struct Fritz {
    client: FritzClient,
    credentials: Credentials,
}

impl Fritz {
    pub fn new(client: FritzClient, credentials: Credentials) -> Self {
        Self { client, credentials }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(FritzClient::from_config(config)?, config.credentials()?))
    }

    pub fn client(&self) -> &FritzClient {
        &self.client
    }

    pub async fn connect(&mut self) -> Result<()> {
        self.client.login(&self.credentials).await
    }

    fn sid(&self) -> String {
        self.client
            .session_id()
            .map(|sid| sid.to_string())
            .unwrap_or_default()
    }

    /// Overview page data (model, connections, ...) as raw JSON.
    pub async fn info(&mut self) -> Result<serde_json::Value> {
        let result = self.run_info().await;
        self.client.close_session().await;
        result
    }

    async fn run_info(&mut self) -> Result<serde_json::Value> {
        self.connect().await?;

        let sid = self.sid();
        let req = self.client.new_request(
            Method::POST,
            DATA_PATH,
            &[
                ("xhr", "1"),
                ("sid", &sid),
                ("lang", "de"),
                ("page", "overview"),
                ("xhrId", "all"),
                ("useajax", "1"),
                ("no_sidrenew", ""),
            ],
        )?;

        let reply = self.client.send_decoded::<DataEnvelope>(&req).await?;
        reply
            .body
            .map(|envelope| envelope.data)
            .ok_or_else(|| Error::Protocol("overview page did not answer with JSON".to_string()))
    }

    /// Drop the internet connection and dial again.
    pub async fn reconnect(&mut self) -> Result<()> {
        let result = self.run_reconnect().await;
        self.client.close_session().await;
        result
    }

    async fn run_reconnect(&mut self) -> Result<()> {
        self.connect().await?;

        let disconnect = self
            .client
            .new_request(Method::GET, &monitor_path("disconnect"), &[])?;
        let connect = self
            .client
            .new_request(Method::GET, &monitor_path("connect"), &[])?;

        tracing::debug!("[Fritz] Disconnecting internet connection");
        self.client.send(&disconnect).await?;
        tracing::debug!("[Fritz] Reconnecting internet connection");
        self.client.send(&connect).await?;
        Ok(())
    }

    /// Reboot the device.
    pub async fn reboot(&mut self) -> Result<()> {
        let result = self.run_reboot().await;
        self.client.close_session().await;
        result
    }

    async fn run_reboot(&mut self) -> Result<()> {
        self.connect().await?;

        let sid = self.sid();
        let prepare = self.client.new_request(
            Method::POST,
            DATA_PATH,
            &[("sid", &sid), ("xhr", "1"), ("page", "reboot"), ("reboot", "0")],
        )?;
        self.client.send(&prepare).await?;

        let reboot = self.client.new_request(
            Method::POST,
            REBOOT_PATH,
            &[
                ("ajax", "1"),
                ("sid", &sid),
                ("no_sidrenew", "1"),
                ("xhr", "1"),
                ("useajax", "1"),
            ],
        )?;
        self.client.send(&reboot).await?;

        tracing::debug!("[Fritz] Reboot triggered");
        Ok(())
    }
}

/// Monitor page path with a cache-busting timestamp parameter.
fn monitor_path(action: &str) -> String {
    format!(
        "{}?myXhr=1&action={}&useajax=1&xhr=1&t{}=nocache",
        MONITOR_PATH,
        action,
        chrono::Utc::now().timestamp_millis()
    )
}
