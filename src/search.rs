use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use log::debug;

use crate::api::*;
use crate::error::*;
use crate::resolver::Platform;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DeviceType {
    #[default]
    IPhone,
    IPad,
    Mac,
}

impl DeviceType {
    /// Lowercase keyword matched against firmware identifiers.
    pub fn keyword(self) -> &'static str {
        match self {
            Self::IPhone => "iphone",
            Self::IPad => "ipad",
            Self::Mac => "mac",
        }
    }

    pub fn platform(self) -> Platform {
        match self {
            Self::IPhone => Platform::IOS,
            Self::IPad => Platform::IPadOS,
            Self::Mac => Platform::MacOS,
        }
    }

    /// Whether a firmware was built for this kind of device. The check is a
    /// plain case-insensitive substring match, so `mac` also hits e.g.
    /// `iMac` or `Macmini` identifiers.
    pub fn matches(self, firmware: &FirmwareInfo) -> bool {
        firmware
            .identifier
            .as_deref()
            .map(|ident| ident.to_lowercase().contains(self.keyword()))
            .unwrap_or(false)
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", match self {
            Self::IPhone => "iPhone",
            Self::IPad => "iPad",
            Self::Mac => "Mac",
        })
    }
}

impl FromStr for DeviceType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "iphone" => Ok(Self::IPhone),
            "ipad" => Ok(Self::IPad),
            "mac" => Ok(Self::Mac),
            _ => Err(Error::UnknownDeviceType(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    /// The API has no firmware at all for this version.
    NotFound { version: String },
    /// Firmwares exist, but none for the requested device type.
    Empty { device_type: DeviceType, version: String },
    /// Unique download links in ascending order.
    Links(Vec<String>),
}

impl SearchOutcome {
    pub fn links(&self) -> &[String] {
        match self {
            Self::Links(links) => links.as_slice(),
            _ => &[],
        }
    }
}

impl fmt::Display for SearchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::NotFound { version } => write!(f, "No firmware found for version {}.", version),
            Self::Empty { device_type, version } => {
                write!(f, "No firmware found for {} {}.", device_type, version)
            }
            Self::Links(links) => write!(f, "{}", links.join("\n")),
        }
    }
}

/// Download links of all firmwares for `device_type`, deduplicated and sorted.
pub fn filter_links(firmwares: &[FirmwareInfo], device_type: DeviceType) -> Vec<String> {
    firmwares
        .iter()
        .filter(|fw| device_type.matches(fw))
        .map(|fw| fw.url.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Look up the firmware links of `version` for one kind of device.
pub async fn search<S>(source: &S, device_type: DeviceType, version: &str) -> Result<SearchOutcome>
where
    S: Source + ?Sized,
{
    let firmwares = match source.firmwares_for_version(version).await? {
        Some(firmwares) => firmwares,
        None => {
            debug!("API knows no version {}", version);
            return Ok(SearchOutcome::NotFound { version: version.to_string() });
        }
    };

    debug!("{} firmwares for version {}", firmwares.len(), version);

    let links = filter_links(&firmwares, device_type);
    if links.is_empty() {
        return Ok(SearchOutcome::Empty { device_type, version: version.to_string() });
    }

    Ok(SearchOutcome::Links(links))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::tests::*;

    #[test]
    fn dedupe_and_sort() {
        let firmwares = vec![
            firmware("iPhone14,5", "17.2", "https://b"),
            firmware("iPhone14,5", "17.2", "https://a"),
            firmware("iPhone15,2", "17.2", "https://a"),
        ];
        assert_eq!(filter_links(&firmwares, DeviceType::IPhone), vec!["https://a", "https://b"]);
    }

    #[test]
    fn device_type_filter() {
        let ipad = firmware("iPad7,1", "17.2", "https://ipad");
        assert!(!DeviceType::IPhone.matches(&ipad));
        assert!(DeviceType::IPad.matches(&ipad));

        let upper = firmware("IPAD7,1", "17.2", "https://ipad");
        assert!(DeviceType::IPad.matches(&upper));

        let mut anonymous = firmware("", "17.2", "https://x");
        anonymous.identifier = None;
        assert!(!DeviceType::IPhone.matches(&anonymous));
    }

    #[test]
    fn mac_matches_loosely() {
        assert!(DeviceType::Mac.matches(&firmware("Mac14,2", "14.2", "https://m")));
        assert!(DeviceType::Mac.matches(&firmware("iMac21,1", "14.2", "https://m")));
        assert!(DeviceType::Mac.matches(&firmware("VirtualMac2,1", "14.2", "https://m")));
    }

    #[test]
    fn parse_device_type() {
        assert_eq!("iphone".parse::<DeviceType>().unwrap(), DeviceType::IPhone);
        assert_eq!("iPad".parse::<DeviceType>().unwrap(), DeviceType::IPad);
        assert_eq!("MAC".parse::<DeviceType>().unwrap(), DeviceType::Mac);
    }

    #[test]
    fn unknown_device_type() {
        let err = "watch".parse::<DeviceType>().unwrap_err();
        assert!(matches!(&err, Error::UnknownDeviceType(t) if t == "watch"));
        assert_eq!(err.to_string(), "unknown device type 'watch', expected iPhone, iPad or Mac");
        assert_eq!(DeviceType::default(), DeviceType::IPhone);
    }

    #[tokio::test]
    async fn missing_version_is_not_an_error() {
        let source = FakeSource::default();
        let outcome = search(&source, DeviceType::IPhone, "99.0").await.unwrap();

        assert_eq!(outcome, SearchOutcome::NotFound { version: "99.0".into() });
        assert!(outcome.links().is_empty());
    }

    #[tokio::test]
    async fn no_match_for_device_type() {
        let mut source = FakeSource::default();
        source.versions.insert("17.2".into(), vec![firmware("iPad7,1", "17.2", "https://ipad")]);

        let outcome = search(&source, DeviceType::IPhone, "17.2").await.unwrap();

        assert_eq!(outcome.to_string(), "No firmware found for iPhone 17.2.");
    }

    #[tokio::test]
    async fn links_joined_by_newline() {
        let mut source = FakeSource::default();
        source.versions.insert("17.2".into(), vec![
            firmware("iPhone16,1", "17.2", "https://b"),
            firmware("iPad7,1", "17.2", "https://ipad"),
            firmware("iPhone15,2", "17.2", "https://a"),
        ]);

        let outcome = search(&source, DeviceType::IPhone, "17.2").await.unwrap();

        assert_eq!(outcome.links(), ["https://a", "https://b"]);
        assert_eq!(outcome.to_string(), "https://a\nhttps://b");
    }

    #[tokio::test]
    async fn decode_failure_aborts() {
        let mut source = FakeSource::default();
        source.broken.push("17.2".into());

        let err = search(&source, DeviceType::IPhone, "17.2").await.unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }
}
