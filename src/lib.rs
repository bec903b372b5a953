//#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod api;
pub mod config;
pub mod error;
pub mod resolver;
pub mod search;
pub mod session;
pub mod version;

pub use api::{Client, DeviceBasic, DeviceDetail, FirmwareInfo, Source};
pub use config::Config;
pub use error::Error;
pub use resolver::*;
pub use search::*;
pub use session::Session;
pub use version::*;
