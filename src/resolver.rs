use std::collections::BTreeMap;
use std::fmt;

use log::{debug, warn};

use crate::api::*;
use crate::version::*;

/// OS families shown on the overview, each tied to the catalog keyword its
/// devices carry in their name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Platform {
    IOS,
    IPadOS,
    MacOS,
}

impl Platform {
    pub const ALL: [Platform; 3] = [Platform::IOS, Platform::IPadOS, Platform::MacOS];

    pub fn keyword(self) -> &'static str {
        match self {
            Self::IOS => "iPhone",
            Self::IPadOS => "iPad",
            Self::MacOS => "Mac",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", match self {
            Self::IOS => "iOS",
            Self::IPadOS => "iPadOS",
            Self::MacOS => "macOS",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LatestVersion {
    /// Lookup not finished yet.
    Pending,
    Version(String),
    /// No catalog device matched the platform keyword.
    Unknown,
    /// Fetching or decoding the device detail failed.
    QueryFailed,
    /// The device has no firmwares listed.
    NoData,
}

impl LatestVersion {
    pub fn version(&self) -> Option<&str> {
        match self {
            Self::Version(v) => Some(v.as_str()),
            _ => None,
        }
    }
}

impl fmt::Display for LatestVersion {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "querying..."),
            Self::Version(v) => write!(f, "{}", v),
            Self::Unknown => write!(f, "unknown"),
            Self::QueryFailed => write!(f, "query failed"),
            Self::NoData => write!(f, "no data"),
        }
    }
}

pub type LatestVersions = BTreeMap<Platform, LatestVersion>;

/// Newest device of a platform by generation number. Among devices of the
/// same generation the one listed last in the catalog is picked.
pub fn latest_device(devices: &[DeviceBasic], platform: Platform) -> Option<&DeviceBasic> {
    devices
        .iter()
        .filter(|d| d.name.contains(platform.keyword()))
        .max_by_key(|d| generation(&d.identifier))
}

/// Latest firmware version offered for the newest device of `platform`.
/// Never fails; problems are reported through the returned placeholder.
pub async fn resolve_platform<S>(source: &S, devices: &[DeviceBasic], platform: Platform) -> LatestVersion
where
    S: Source + ?Sized,
{
    let device = match latest_device(devices, platform) {
        Some(device) => device,
        None => {
            debug!("No {} devices in catalog", platform.keyword());
            return LatestVersion::Unknown;
        }
    };

    debug!("Newest {} device: {} ({})", platform, device.name, device.identifier);

    let detail = match source.device(&device.identifier).await {
        Ok(detail) => detail,
        Err(e) => {
            warn!("Error fetching details for {}: {}", device.identifier, e);
            return LatestVersion::QueryFailed;
        }
    };

    match max_version(detail.firmwares.iter().map(|f| f.version.as_str())) {
        Some(version) => LatestVersion::Version(version.to_string()),
        None => LatestVersion::NoData,
    }
}

/// Resolve all three platforms concurrently and collect the results once
/// every lookup has finished.
pub async fn resolve_latest<S>(source: &S, devices: &[DeviceBasic]) -> LatestVersions
where
    S: Source + ?Sized,
{
    let lookup = move |platform| async move { (platform, resolve_platform(source, devices, platform).await) };

    let (ios, ipados, macos) = tokio::join!(
        lookup(Platform::IOS),
        lookup(Platform::IPadOS),
        lookup(Platform::MacOS),
    );

    vec![ios, ipados, macos].into_iter().collect()
}
