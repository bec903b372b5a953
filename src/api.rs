use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use log::debug;
use reqwest::Url;
use serde::Deserialize;

use crate::config::Config;
use crate::error::*;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DeviceBasic {
    pub name: String,
    pub identifier: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DeviceDetail {
    pub name: String,
    pub identifier: String,
    pub firmwares: Vec<FirmwareInfo>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FirmwareInfo {
    pub identifier: Option<String>,
    pub version: String,
    pub buildid: Option<String>,
    pub url: String,
    pub size: Option<i64>,
    pub releasedate: Option<String>,
    pub uploaddate: Option<String>,
    pub signed: bool,
}

impl FirmwareInfo {
    pub fn released(&self) -> Option<DateTime<FixedOffset>> {
        self.releasedate
            .as_deref()
            .and_then(|d| DateTime::parse_from_rfc3339(d).ok())
    }

    /// Size in megabytes, if the API reported one.
    pub fn size_mb(&self) -> Option<f64> {
        self.size.map(|s| s as f64 / 1_000_000.0)
    }
}

pub fn parse_devices(body: &str) -> Result<Vec<DeviceBasic>> {
    Ok(serde_json::from_str(body)?)
}

pub fn parse_device(body: &str) -> Result<DeviceDetail> {
    Ok(serde_json::from_str(body)?)
}

pub fn parse_firmwares(body: &str) -> Result<Vec<FirmwareInfo>> {
    Ok(serde_json::from_str(body)?)
}

/// Where device and firmware metadata comes from.
#[async_trait]
pub trait Source: Send + Sync {
    /// `GET /v4/devices`
    async fn devices(&self) -> Result<Vec<DeviceBasic>>;

    /// `GET /v4/device/{identifier}`
    async fn device(&self, identifier: &str) -> Result<DeviceDetail>;

    /// `GET /v4/ipsw/{version}`. `None` if the API does not know the version.
    async fn firmwares_for_version(&self, version: &str) -> Result<Option<Vec<FirmwareInfo>>>;
}

/// HTTP client for the ipsw.me v4 API.
pub struct Client {
    http: reqwest::Client,
    base_url: Url,
}

impl Client {
    pub fn new(config: &Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()?;

        let base_url = Url::parse(&config.base_url)
            .map_err(|e| Error::Config(format!("API URL {}: {}", config.base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(Error::Config(format!("API URL cannot hold a path: {}", config.base_url)));
        }

        Ok(Client { http, base_url })
    }

    /// `<base>/v4/<segments...>`. Every segment is escaped on its own, so
    /// user input like `17.2#x` or `../devices` stays inside its segment.
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().push("v4").extend(segments);
        }
        url
    }

    /// GET a URL and return status and body. Non-404 errors are turned into
    /// `Error::Status`, 404 is left to the caller.
    async fn get(&self, url: Url) -> Result<(reqwest::StatusCode, String)> {
        debug!("GET {}", url);

        let resp = self.http.get(url.clone()).send().await?;
        let status = resp.status();
        debug!("{} -> {}", url, status);

        if !status.is_success() && status != reqwest::StatusCode::NOT_FOUND {
            return Err(Error::Status { status: status.as_u16(), url: url.to_string() });
        }

        Ok((status, resp.text().await?))
    }

    async fn get_ok(&self, url: Url) -> Result<String> {
        let (status, body) = self.get(url.clone()).await?;
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(Error::Status { status: status.as_u16(), url: url.to_string() });
        }
        Ok(body)
    }
}

#[async_trait]
impl Source for Client {
    async fn devices(&self) -> Result<Vec<DeviceBasic>> {
        parse_devices(&self.get_ok(self.url(&["devices"])).await?)
    }

    async fn device(&self, identifier: &str) -> Result<DeviceDetail> {
        parse_device(&self.get_ok(self.url(&["device", identifier])).await?)
    }

    async fn firmwares_for_version(&self, version: &str) -> Result<Option<Vec<FirmwareInfo>>> {
        let (status, body) = self.get(self.url(&["ipsw", version])).await?;
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        parse_firmwares(&body).map(Some)
    }
}
