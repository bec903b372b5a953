use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Connection, TLS or timeout failure while talking to the API.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    /// Response body did not have the expected JSON shape.
    #[error("unexpected response: {0}")]
    Decode(#[from] serde_json::Error),
    /// Any non-success status other than the 404 handled by the search endpoint.
    #[error("API returned HTTP {status} for {url}")]
    Status { status: u16, url: String },
    #[error("unknown device type '{0}', expected iPhone, iPad or Mac")]
    UnknownDeviceType(String),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

