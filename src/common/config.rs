//! Configuration schema, defaults, and layered loading.
//!
//! Precedence: defaults < config file < environment < CLI
use anyhow::{ensure, Context, Result};
use directories::ProjectDirs;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use crate::config::{DEFAULT_PORT, READ_TIMEOUT, SHUTDOWN_GRACE, WRITE_TIMEOUT};
use crate::server::ServerOptions;

const MAX_TIMEOUT_SECS: u64 = 3600;
const MIN_DISPLAY_WIDTH: u16 = 10;
const MAX_PADDING: usize = 16;

pub const ENV_PREFIX: &str = "PORTAL_";

pub fn config_path() -> PathBuf {
    ProjectDirs::from("", "", "portal")
        .map(|p| p.config_dir().join("config.toml"))
        .unwrap_or_else(|| PathBuf::from("portal.toml"))
}

/// Rendezvous server listener and shutdown settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerSettings {
    pub bind: IpAddr,
    pub port: u16,
    pub read_timeout_secs: u64,
    pub write_timeout_secs: u64,
    /// Window given to in-flight requests once shutdown starts
    pub shutdown_grace_secs: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            read_timeout_secs: READ_TIMEOUT.as_secs(),
            write_timeout_secs: WRITE_TIMEOUT.as_secs(),
            shutdown_grace_secs: SHUTDOWN_GRACE.as_secs(),
        }
    }
}

impl ServerSettings {
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }

    /// Runtime options consumed by the server lifecycle.
    pub fn options(&self) -> ServerOptions {
        ServerOptions {
            addr: self.addr(),
            read_timeout: Duration::from_secs(self.read_timeout_secs),
            write_timeout: Duration::from_secs(self.write_timeout_secs),
            shutdown_grace: Duration::from_secs(self.shutdown_grace_secs),
        }
    }
}

/// Receiver progress display settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ReceiverSettings {
    /// Left padding, in columns, applied to every rendered line
    pub padding: usize,
    /// Upper bound for the progress bar and wrapped file list
    pub max_width: u16,
    pub quit_keys: Vec<String>,
    /// Animation tick interval
    pub tick_ms: u64,
}

impl Default for ReceiverSettings {
    fn default() -> Self {
        Self {
            padding: 2,
            max_width: 80,
            quit_keys: vec!["ctrl+c".into(), "q".into(), "esc".into()],
            tick_ms: 100,
        }
    }
}

impl ReceiverSettings {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }
}

/// Fully resolved application configuration after all layers merge.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerSettings,
    pub receiver: ReceiverSettings,
}

impl AppConfig {
    /// Rejects values that would make the server or display unusable.
    pub fn validate(&self) -> Result<()> {
        Self::validate_timeout("server.read_timeout_secs", self.server.read_timeout_secs)?;
        Self::validate_timeout("server.write_timeout_secs", self.server.write_timeout_secs)?;
        Self::validate_timeout(
            "server.shutdown_grace_secs",
            self.server.shutdown_grace_secs,
        )?;

        let receiver = &self.receiver;
        ensure!(
            receiver.max_width >= MIN_DISPLAY_WIDTH,
            "Invalid config: receiver.max_width must be >= {MIN_DISPLAY_WIDTH}"
        );
        ensure!(
            receiver.padding <= MAX_PADDING,
            "Invalid config: receiver.padding must be <= {MAX_PADDING}"
        );
        ensure!(
            receiver.tick_ms > 0,
            "Invalid config: receiver.tick_ms must be > 0"
        );
        ensure!(
            !receiver.quit_keys.is_empty(),
            "Invalid config: receiver.quit_keys must name at least one key"
        );
        Ok(())
    }

    fn validate_timeout(name: &str, secs: u64) -> Result<()> {
        ensure!(secs > 0, "Invalid config: {name} must be > 0");
        ensure!(
            secs <= MAX_TIMEOUT_SECS,
            "Invalid config: {name} must be <= {MAX_TIMEOUT_SECS}"
        );
        Ok(())
    }
}

/// Values supplied on the command line.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConfigOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bind: Option<IpAddr>,
}

/// Loads config from defaults/file/env.
pub fn load_config() -> Result<AppConfig> {
    load_config_from(&config_path())
}

/// Loads config using an explicit file path for the TOML layer.
pub fn load_config_from(path: &std::path::Path) -> Result<AppConfig> {
    let config: AppConfig = Figment::new()
        .merge(Serialized::defaults(AppConfig::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()
        .context("Failed to load configuration")?;

    config.validate()?;

    Ok(config)
}

/// Applies runtime overrides to a loaded config.
pub fn apply_overrides(mut config: AppConfig, overrides: &ConfigOverrides) -> AppConfig {
    if let Some(port) = overrides.port {
        config.server.port = port;
    }
    if let Some(bind) = overrides.bind {
        config.server.bind = bind;
    }

    config
}
