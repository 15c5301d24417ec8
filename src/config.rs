//! Job configuration.
//!
//! A job file describes the target device, the CSV input and the per-device
//! settings. Sections are optional in the file and required by the command
//! that uses them. Secrets are never stored in the file: it names the
//! environment variables holding them.
//!
//! ```yaml
//! device:
//!   host: 192.168.100.100
//!   username: admin
//!   password_env: NETPUSH_PASSWORD
//! csv:
//!   path: layer3.csv
//!   delimiter: ";"
//! output:
//!   path: switch_config.txt
//! switch:
//!   kind: layer3
//!   vtp:
//!     mode: transparent
//!     domain: campus
//!     password_env: NETPUSH_VTP_PASSWORD
//! ```

use crate::commands::switch::DEFAULT_INTERFACE_PREFIX;
use crate::commands::{SwitchKind, SwitchOptions, VtpSettings};
use crate::plug::{PlugSettings, DEFAULT_BASE_URL, DEFAULT_MAX_POWER};
use crate::sink::DeviceTarget;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable read for the login password when none is named
pub const DEFAULT_PASSWORD_ENV: &str = "NETPUSH_PASSWORD";

/// Configuration validation errors
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid device configuration: {0}")]
    InvalidDevice(String),
    #[error("Invalid CSV configuration: {0}")]
    InvalidCsv(String),
    #[error("Invalid switch configuration: {0}")]
    InvalidSwitch(String),
    #[error("Invalid plug configuration: {0}")]
    InvalidPlug(String),
    #[error("Configuration has no '{0}' section")]
    MissingSection(&'static str),
    #[error("Environment variable {var} is not set")]
    MissingSecret { var: String },
}

/// Top-level job file
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<DeviceConfig>,
    #[serde(default)]
    pub csv: CsvConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<OutputConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub switch: Option<SwitchConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub router: Option<RouterConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plug: Option<PlugConfig>,
}

/// SSH login for switches and routers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    pub host: String,
    #[serde(default = "default_ssh_port")]
    pub port: u16,
    pub username: String,
    #[serde(default = "default_password_env")]
    pub password_env: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_secret_env: Option<String>,
    #[serde(default = "default_ssh_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

/// CSV input settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CsvConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    #[serde(default = "default_delimiter")]
    pub delimiter: String,
}

/// Local text artifact
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwitchConfig {
    #[serde(default = "default_switch_kind")]
    pub kind: SwitchKind,
    #[serde(default = "default_interface_prefix")]
    pub interface_prefix: String,
    #[serde(default = "default_true")]
    pub save: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vtp: Option<VtpConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VtpConfig {
    pub mode: String,
    pub domain: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_env: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterConfig {
    #[serde(default = "default_true")]
    pub save: bool,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self { save: true }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlugConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    pub name: String,
    #[serde(default = "default_relay_state")]
    pub relay_default_state: String,
    #[serde(default = "default_true")]
    pub disable_leds: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mqtt_server: Option<String>,
    #[serde(default = "default_max_power")]
    pub max_power: u32,
    #[serde(default = "default_http_timeout", with = "humantime_serde")]
    pub timeout: Duration,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wifi: Option<WifiConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WifiConfig {
    pub ssid: String,
    /// Variable holding the WiFi key; an open network when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_env: Option<String>,
}

impl Config {
    /// Validate every section that is present
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(device) = &self.device {
            if device.host.trim().is_empty() {
                return Err(ValidationError::InvalidDevice("host cannot be empty".to_string()));
            }
            if device.username.trim().is_empty() {
                return Err(ValidationError::InvalidDevice("username cannot be empty".to_string()));
            }
            if device.port == 0 {
                return Err(ValidationError::InvalidDevice("port cannot be 0".to_string()));
            }
            if device.timeout.is_zero() {
                return Err(ValidationError::InvalidDevice("timeout cannot be zero".to_string()));
            }
        }

        self.csv.delimiter_byte()?;

        if let Some(switch) = &self.switch {
            if let Some(vtp) = &switch.vtp {
                if vtp.mode.trim().is_empty() || vtp.domain.trim().is_empty() {
                    return Err(ValidationError::InvalidSwitch(
                        "vtp mode and domain cannot be empty".to_string(),
                    ));
                }
                if !matches!(vtp.mode.as_str(), "server" | "client" | "transparent" | "off") {
                    return Err(ValidationError::InvalidSwitch(format!(
                        "unknown vtp mode '{}'",
                        vtp.mode
                    )));
                }
            }
        }

        if let Some(plug) = &self.plug {
            if plug.name.trim().is_empty() {
                return Err(ValidationError::InvalidPlug("name cannot be empty".to_string()));
            }
            if !plug.base_url.starts_with("http://") && !plug.base_url.starts_with("https://") {
                return Err(ValidationError::InvalidPlug(format!(
                    "base_url '{}' must start with http:// or https://",
                    plug.base_url
                )));
            }
            if !matches!(plug.relay_default_state.as_str(), "on" | "off" | "last" | "switch") {
                return Err(ValidationError::InvalidPlug(format!(
                    "unknown relay default state '{}'",
                    plug.relay_default_state
                )));
            }
            if plug.max_power == 0 {
                return Err(ValidationError::InvalidPlug("max_power cannot be 0".to_string()));
            }
        }

        Ok(())
    }

    pub fn device(&self) -> Result<&DeviceConfig, ValidationError> {
        self.device.as_ref().ok_or(ValidationError::MissingSection("device"))
    }

    pub fn switch(&self) -> Result<&SwitchConfig, ValidationError> {
        self.switch.as_ref().ok_or(ValidationError::MissingSection("switch"))
    }

    pub fn plug(&self) -> Result<&PlugConfig, ValidationError> {
        self.plug.as_ref().ok_or(ValidationError::MissingSection("plug"))
    }

    pub fn router(&self) -> RouterConfig {
        self.router.clone().unwrap_or_default()
    }

    pub fn csv_path(&self) -> Result<&PathBuf, ValidationError> {
        self.csv
            .path
            .as_ref()
            .ok_or_else(|| ValidationError::InvalidCsv("csv.path is required".to_string()))
    }
}

impl CsvConfig {
    /// The delimiter as a single byte
    pub fn delimiter_byte(&self) -> Result<u8, ValidationError> {
        match self.delimiter.as_bytes() {
            [byte] if byte.is_ascii() => Ok(*byte),
            _ => Err(ValidationError::InvalidCsv(format!(
                "delimiter must be a single ASCII character, got '{}'",
                self.delimiter
            ))),
        }
    }
}

impl Default for CsvConfig {
    fn default() -> Self {
        Self {
            path: None,
            delimiter: default_delimiter(),
        }
    }
}

impl DeviceConfig {
    /// Resolve secrets and build the SSH login
    pub fn target(&self) -> Result<DeviceTarget, ValidationError> {
        let enable_secret = self
            .enable_secret_env
            .as_deref()
            .map(resolve_secret)
            .transpose()?;

        Ok(DeviceTarget {
            host: self.host.clone(),
            port: self.port,
            username: self.username.clone(),
            password: resolve_secret(&self.password_env)?,
            enable_secret,
            timeout: self.timeout,
        })
    }
}

impl SwitchConfig {
    pub fn options(&self) -> SwitchOptions {
        SwitchOptions {
            kind: self.kind,
            interface_prefix: self.interface_prefix.clone(),
            save: self.save,
        }
    }

    /// Resolve the VTP password, if the section names one
    pub fn vtp_settings(&self) -> Result<Option<VtpSettings>, ValidationError> {
        let Some(vtp) = &self.vtp else {
            return Ok(None);
        };
        let password = vtp.password_env.as_deref().map(resolve_secret).transpose()?;
        Ok(Some(VtpSettings {
            mode: vtp.mode.clone(),
            domain: vtp.domain.clone(),
            password,
        }))
    }
}

impl PlugConfig {
    /// Resolve secrets and apply CLI overrides
    pub fn settings(&self, name_override: Option<&str>, cloud: bool) -> Result<PlugSettings, ValidationError> {
        let (wifi_ssid, wifi_key) = match &self.wifi {
            Some(wifi) => {
                let key = match &wifi.key_env {
                    Some(var) => resolve_secret(var)?,
                    None => String::new(),
                };
                (Some(wifi.ssid.clone()), key)
            }
            None => (None, String::new()),
        };

        Ok(PlugSettings {
            name: name_override.unwrap_or(&self.name).to_string(),
            relay_default_state: self.relay_default_state.clone(),
            disable_leds: self.disable_leds,
            mqtt_server: self.mqtt_server.clone(),
            cloud,
            max_power: self.max_power,
            wifi_ssid,
            wifi_key,
        })
    }
}

/// Read a secret from the named environment variable
pub fn resolve_secret(var: &str) -> Result<String, ValidationError> {
    std::env::var(var).map_err(|_| ValidationError::MissingSecret {
        var: var.to_string(),
    })
}

fn default_ssh_port() -> u16 {
    22
}

fn default_password_env() -> String {
    DEFAULT_PASSWORD_ENV.to_string()
}

fn default_ssh_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_http_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_delimiter() -> String {
    ";".to_string()
}

fn default_switch_kind() -> SwitchKind {
    SwitchKind::Layer3
}

fn default_interface_prefix() -> String {
    DEFAULT_INTERFACE_PREFIX.to_string()
}

fn default_true() -> bool {
    true
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_relay_state() -> String {
    "off".to_string()
}

fn default_max_power() -> u32 {
    DEFAULT_MAX_POWER
}
