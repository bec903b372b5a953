use log::{info, warn};

use crate::api::*;
use crate::resolver::*;
use crate::search::*;

/// State of one interactive lookup session.
///
/// Searching takes `&mut self`, so a session runs at most one search at a
/// time. A finished search replaces the previous outcome; a failed one only
/// sets `error` and keeps the previous outcome around.
#[derive(Debug, Clone)]
pub struct Session {
    pub latest: LatestVersions,
    pub device_type: DeviceType,
    pub version_input: String,
    pub results: Option<SearchOutcome>,
    pub error: Option<String>,
    pub catalog: Vec<DeviceBasic>,
}

impl Default for Session {
    fn default() -> Self {
        Session {
            latest: Platform::ALL.iter().map(|p| (*p, LatestVersion::Pending)).collect(),
            device_type: DeviceType::default(),
            version_input: String::new(),
            results: None,
            error: None,
            catalog: Vec::new(),
        }
    }
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch the device catalog and resolve the latest version of every
    /// platform. A catalog failure is recorded in `error`.
    pub async fn refresh<S: Source + ?Sized>(&mut self, source: &S) {
        let devices = match source.devices().await {
            Ok(devices) => devices,
            Err(e) => {
                warn!("Failed to fetch device catalog: {}", e);
                self.error = Some(format!("initialisation failed: {}", e));
                return;
            }
        };

        info!("{} devices in catalog", devices.len());
        self.error = None;

        let latest = resolve_latest(source, &devices).await;
        self.catalog = devices;
        self.latest.extend(latest);
        self.autofill();
    }

    pub fn select_device_type(&mut self, device_type: DeviceType) {
        self.device_type = device_type;
        self.autofill();
    }

    /// Copy the latest known version of the selected platform into the
    /// search field. Placeholders leave the field alone.
    pub fn autofill(&mut self) {
        if let Some(version) = self.latest.get(&self.device_type.platform()).and_then(|v| v.version()) {
            self.version_input = version.to_string();
        }
    }

    pub async fn search<S: Source + ?Sized>(&mut self, source: &S) {
        let version = self.version_input.trim().to_string();
        if version.is_empty() {
            return;
        }

        self.error = None;

        match search(source, self.device_type, &version).await {
            Ok(outcome) => self.results = Some(outcome),
            Err(e) => self.error = Some(format!("query failed: {}", e)),
        }
    }

    /// Text shown in the results area.
    pub fn results_text(&self) -> String {
        self.results.as_ref().map(|r| r.to_string()).unwrap_or_default()
    }
}
