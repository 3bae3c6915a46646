//! Settings read from the environment

use std::net::IpAddr;
use std::net::Ipv4Addr;
use std::net::SocketAddr;

use serde::Deserialize;

/// Prefix of all environment variables read into [`Settings`]
pub const ENV_PREFIX: &str = "SWAGROUTE_";

/// Settings for running a swagroute server
///
/// Every field is read from the environment variable named like the field
/// in upper case with the [`ENV_PREFIX`] (for example `SWAGROUTE_LISTEN_ADDRESS`).
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// The address to listen on
    #[serde(default = "default_listen_address")]
    pub listen_address: SocketAddr,

    /// Format of the log output
    #[serde(default)]
    pub log_format: LogFormat,

    /// The name reported in json log lines
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

/// Format of the log output
#[derive(Debug, Copy, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Pretty,

    /// One flat json object per line
    Json,
}

impl Settings {
    /// Reads the settings from the process' environment
    pub fn from_env() -> Result<Self, envy::Error> {
        envy::prefixed(ENV_PREFIX).from_env()
    }

    /// Reads the settings from an iterator of environment variables
    pub fn from_vars(
        vars: impl IntoIterator<Item = (String, String)>,
    ) -> Result<Self, envy::Error> {
        envy::prefixed(ENV_PREFIX).from_iter(vars)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            listen_address: default_listen_address(),
            log_format: LogFormat::default(),
            service_name: default_service_name(),
        }
    }
}

fn default_listen_address() -> SocketAddr {
    SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 8080)
}

fn default_service_name() -> String {
    "swagroute".to_string()
}
