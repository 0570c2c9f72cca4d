//! Configuration file shape and credential resolution.
//!
//! The file carries the device/light topology and the presence mapping;
//! stream credentials come from the environment first so the password never
//! has to live on disk.

use std::collections::HashMap;
use std::net::IpAddr;
use std::path::Path;

use anyhow::Context;
use serde::Deserialize;
use url::Url;

/// Environment variable naming the alert stream URL.
pub const ENV_EVENT_URL: &str = "ISAPI_EVENT_URL";
/// Environment variable naming the stream username.
pub const ENV_USERNAME: &str = "ISAPI_USERNAME";
/// Environment variable naming the stream password (environment-only).
pub const ENV_PASSWORD: &str = "ISAPI_PASSWORD";

/// Top-level configuration file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Event stream endpoint settings
    pub stream: StreamConfig,
    /// Switch devices by name
    #[serde(default)]
    pub devices: HashMap<String, DeviceConfig>,
    /// Lights by name
    #[serde(default)]
    pub lights: HashMap<String, LightConfig>,
    /// Presence mapping groups
    #[serde(default)]
    pub presence: Vec<PresenceGroup>,
}

/// `[stream]` section.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StreamConfig {
    /// Alert stream URL; the environment overrides this
    pub url: Option<String>,
    /// Digest username; the environment overrides this
    pub username: Option<String>,
    /// Consecutive-failure budget before the stream gives up
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

/// One `[devices.<name>]` entry.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeviceConfig {
    /// LAN address of the device
    pub ip: IpAddr,
    /// UDP port the device listens on
    #[serde(default = "default_device_port")]
    pub port: u16,
}

/// One `[lights.<name>]` entry.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LightConfig {
    /// Device (by name) carrying this light
    pub device: String,
    /// Switch index on that device
    pub switch: u8,
}

/// One `[[presence]]` group: these channels trigger these lights.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PresenceGroup {
    /// Camera channel ids
    pub channels: Vec<u32>,
    /// Light bindings for each channel
    pub lights: Vec<PresenceLight>,
}

/// One light binding within a presence group.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PresenceLight {
    /// Light name from `[lights]`
    pub light: String,
    /// Seconds to stay on after motion; 0 disables auto-off
    pub duration: u64,
    /// Active windows as (start, end) HHMM pairs; empty means always active
    #[serde(default)]
    pub active_time: Vec<(u16, u16)>,
}

/// Resolved stream credentials.
#[derive(Debug)]
pub struct Credentials {
    /// Alert stream endpoint
    pub url: Url,
    /// Digest username
    pub username: String,
    /// Digest password
    pub password: String,
}

fn default_max_retries() -> u32 {
    3
}

fn default_device_port() -> u16 {
    38900
}

impl Config {
    /// Load and parse the configuration file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("could not read config file {}", path.display()))?;
        toml::from_str(&text)
            .with_context(|| format!("could not parse config file {}", path.display()))
    }

    /// Resolve stream credentials, preferring the environment over the file.
    ///
    /// The password is environment-only by design.
    pub fn resolve_credentials(&self) -> anyhow::Result<Credentials> {
        let url = std::env::var(ENV_EVENT_URL)
            .ok()
            .or_else(|| self.stream.url.clone())
            .with_context(|| {
                format!("stream url not configured: set [stream].url or {ENV_EVENT_URL}")
            })?;
        let username = std::env::var(ENV_USERNAME)
            .ok()
            .or_else(|| self.stream.username.clone())
            .with_context(|| {
                format!("stream username not configured: set [stream].username or {ENV_USERNAME}")
            })?;
        let password = std::env::var(ENV_PASSWORD)
            .with_context(|| format!("{ENV_PASSWORD} is not set"))?;

        Ok(Credentials {
            url: Url::parse(&url).with_context(|| format!("invalid stream url {url:?}"))?,
            username,
            password,
        })
    }
}
