use std::io::Read;

use log::debug;
use serde::Deserialize;

use crate::error::*;

pub const DEFAULT_BASE_URL: &str = "https://api.ipsw.me";
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

pub const ENV_API_URL: &str = "IPSWFINDER_API_URL";
pub const ENV_TIMEOUT: &str = "IPSWFINDER_TIMEOUT";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub base_url: String,
    /// Per request, covers connecting and reading the body.
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: format!("ipswfinder/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl Config {
    /// Read a JSON config file. Missing keys keep their defaults.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let config: Config = serde_json::from_reader(reader)
            .map_err(|e| Error::Config(e.to_string()))?;
        config.validate()
    }

    /// Apply overrides from an environment lookup, usually `std::env::var`.
    pub fn with_env<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_API_URL) {
            debug!("{} overrides API URL", ENV_API_URL);
            self.base_url = url;
        }

        if let Some(timeout) = lookup(ENV_TIMEOUT) {
            self.timeout_secs = parse_timeout(&timeout)?;
        }

        self.validate()
    }

    pub fn validate(self) -> Result<Self> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(Error::Config(format!("API URL must be http(s): {}", self.base_url)));
        }
        if self.timeout_secs == 0 {
            return Err(Error::Config("timeout must be at least one second".to_string()));
        }
        Ok(self)
    }

    /// Load `$XDG_CONFIG_HOME/ipswfinder/config.json` if it exists, then
    /// apply environment overrides.
    #[cfg(feature = "cli")]
    pub fn load() -> Result<Self> {
        let dirs = xdg::BaseDirectories::with_prefix("ipswfinder")
            .map_err(|e| Error::Config(e.to_string()))?;

        let config = match dirs.find_config_file("config.json") {
            Some(path) => {
                debug!("Reading config from {}", path.display());
                Config::from_reader(std::fs::File::open(path)?)?
            }
            None => Config::default(),
        };

        config.with_env(|key| std::env::var(key).ok())
    }
}

pub fn parse_timeout(value: &str) -> Result<u64> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::Config(format!("timeout is not a number of seconds: {}", value)))
}
