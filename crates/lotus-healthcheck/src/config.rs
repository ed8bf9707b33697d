//! Resolution of the node's API port from its config.toml.
//!
//! The config file lives under the directory named by `LOTUS_PATH` and
//! carries the API listen address as a multiaddress-style string,
//! `/ip4/0.0.0.0/tcp/1234/http`. The port is the fifth slash-delimited
//! segment.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ConfigError;

/// Environment variable naming the node's repo directory.
pub const LOTUS_PATH_ENV: &str = "LOTUS_PATH";

/// Index of the port segment in the listen address.
const PORT_SEGMENT: usize = 4;

#[derive(Debug, Default, Deserialize)]
struct NodeConfig {
    #[serde(rename = "API", default)]
    api: ApiSection,
}

#[derive(Debug, Default, Deserialize)]
struct ApiSection {
    #[serde(rename = "ListenAddress", default)]
    listen_address: String,
}

/// Resolve the node's repo directory: an explicit override wins,
/// otherwise `LOTUS_PATH` must be set.
pub fn lotus_path(override_path: Option<PathBuf>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = override_path {
        return Ok(path);
    }
    std::env::var_os(LOTUS_PATH_ENV)
        .map(PathBuf::from)
        .ok_or(ConfigError::MissingLotusPath)
}

/// Read `<base>/config.toml` and extract the API port.
pub fn api_port(base: &Path) -> Result<u16, ConfigError> {
    let path = base.join("config.toml");
    let raw = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
        path: path.clone(),
        source,
    })?;
    let config: NodeConfig = toml::from_str(&raw)?;
    listen_port(&config.api.listen_address)
}

/// Extract the TCP port from a listen address.
///
/// The address must have at least five `/`-delimited segments and the
/// fifth must parse as a port number.
pub fn listen_port(address: &str) -> Result<u16, ConfigError> {
    let segments: Vec<&str> = address.split('/').collect();
    let segment = segments
        .get(PORT_SEGMENT)
        .ok_or_else(|| ConfigError::TooFewSegments {
            address: address.to_string(),
        })?;
    segment.parse::<u16>().map_err(|_| ConfigError::InvalidPort {
        address: address.to_string(),
        segment: segment.to_string(),
    })
}
