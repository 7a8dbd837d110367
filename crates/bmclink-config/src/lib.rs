//! Connection profiles for bmclink callers.
//!
//! TOML profiles merged with `BMCLINK_`-prefixed environment variables,
//! credential resolution (env + plaintext), and translation to a
//! `bmclink_api::ConnectionDescriptor`. The core crates never read files;
//! callers that want profiles depend on this crate.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use bmclink_api::{ConnectionDescriptor, RetryPolicy, TlsMode, TransportConfig, VendorKey};

/// Environment variable consulted for a username when the profile has none.
pub const USERNAME_ENV: &str = "BMCLINK_USERNAME";
/// Environment variable consulted for a password after `password_env`.
pub const PASSWORD_ENV: &str = "BMCLINK_PASSWORD";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no credentials configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("unknown profile '{profile}'")]
    UnknownProfile { profile: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Profile used when none is named.
    pub default_profile: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    /// Named BMC profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

/// Values a profile falls back to.
#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_port")]
    pub port: u16,

    /// BMCs ship self-signed certificates, so verification is off unless
    /// a profile asks for it.
    #[serde(default = "default_insecure")]
    pub insecure: bool,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Connect timeout in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64,

    #[serde(default = "default_retries")]
    pub retries: u32,

    /// Base retry delay in milliseconds.
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            port: default_port(),
            insecure: default_insecure(),
            timeout: default_timeout(),
            connect_timeout: default_connect_timeout(),
            retries: default_retries(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

fn default_port() -> u16 {
    443
}
fn default_insecure() -> bool {
    true
}
fn default_timeout() -> u64 {
    30
}
fn default_connect_timeout() -> u64 {
    10
}
fn default_retries() -> u32 {
    3
}
fn default_retry_delay_ms() -> u64 {
    1000
}

/// A named BMC profile.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Profile {
    /// BMC host name or address (no scheme).
    pub host: String,

    pub port: Option<u16>,

    /// Plain HTTP when `false`.
    pub use_tls: Option<bool>,

    /// Vendor key; detected on connect when absent.
    pub vendor: Option<String>,

    pub username: Option<String>,

    /// Password (plaintext, prefer `password_env`).
    pub password: Option<String>,

    /// Environment variable holding the password.
    pub password_env: Option<String>,

    /// Path to a PEM CA bundle used to verify the BMC certificate.
    pub ca_cert: Option<PathBuf>,

    /// Override the default TLS verification setting.
    pub insecure: Option<bool>,

    /// `Host` header override for BMCs behind a port-forward.
    pub host_header: Option<String>,

    pub timeout: Option<u64>,

    pub retries: Option<u32>,
}

/// A profile turned into everything needed to build a client.
#[derive(Debug, Clone)]
pub struct ResolvedProfile {
    pub name: String,
    pub descriptor: ConnectionDescriptor,
    pub vendor: Option<VendorKey>,
    pub transport: TransportConfig,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "bmclink", "bmclink").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("bmclink");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full config from the default path + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from `path` + environment. A missing file yields the defaults.
///
/// Nested keys use a double underscore:
/// `BMCLINK_PROFILES__LAB__HOST=10.0.0.5`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("BMCLINK_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if loading fails.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

/// Serialize config to TOML and write it to `path`.
pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Credential resolution ───────────────────────────────────────────

pub fn resolve_username(profile: &Profile, profile_name: &str) -> Result<String, ConfigError> {
    profile
        .username
        .clone()
        .or_else(|| std::env::var(USERNAME_ENV).ok())
        .ok_or_else(|| ConfigError::NoCredentials {
            profile: profile_name.into(),
        })
}

/// Password from the profile's `password_env`, then `BMCLINK_PASSWORD`,
/// then the plaintext `password` field.
pub fn resolve_password(profile: &Profile, profile_name: &str) -> Result<SecretString, ConfigError> {
    // 1. Profile's password_env → env var lookup
    if let Some(ref env_name) = profile.password_env {
        if let Ok(val) = std::env::var(env_name) {
            return Ok(SecretString::from(val));
        }
    }

    // 2. Global env var
    if let Ok(val) = std::env::var(PASSWORD_ENV) {
        return Ok(SecretString::from(val));
    }

    // 3. Plaintext in config
    if let Some(ref pw) = profile.password {
        return Ok(SecretString::from(pw.clone()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

// ── Translation ─────────────────────────────────────────────────────

/// Build a `ConnectionDescriptor` from a profile and the global defaults.
pub fn profile_to_descriptor(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<ConnectionDescriptor, ConfigError> {
    let host = profile.host.trim();
    if host.is_empty() {
        return Err(ConfigError::Validation {
            field: "host".into(),
            reason: format!("profile '{profile_name}' has no host"),
        });
    }
    if host.contains("://") {
        return Err(ConfigError::Validation {
            field: "host".into(),
            reason: format!("expected a host name without scheme, got '{host}'"),
        });
    }

    let port = profile.port.unwrap_or(defaults.port);
    if port == 0 {
        return Err(ConfigError::Validation {
            field: "port".into(),
            reason: "port must be non-zero".into(),
        });
    }

    let username = resolve_username(profile, profile_name)?;
    let password = resolve_password(profile, profile_name)?;

    // A profile CA bundle outranks the global `insecure` default.
    let insecure = profile
        .insecure
        .unwrap_or(profile.ca_cert.is_none() && defaults.insecure);
    let tls = if insecure {
        TlsMode::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsMode::CustomCa(ca_path.clone())
    } else {
        TlsMode::System
    };

    let retry = RetryPolicy::new(
        profile.retries.unwrap_or(defaults.retries),
        Duration::from_millis(defaults.retry_delay_ms),
    );

    let mut descriptor = ConnectionDescriptor::new(host, username, password)
        .with_port(port)
        .with_tls(profile.use_tls.unwrap_or(true))
        .with_tls_mode(tls)
        .with_retry(retry);
    if let Some(ref host_header) = profile.host_header {
        descriptor = descriptor.with_host_header(host_header.clone());
    }
    Ok(descriptor)
}

/// Resolve a named profile, or the default one when `name` is `None`.
pub fn resolve_profile(config: &Config, name: Option<&str>) -> Result<ResolvedProfile, ConfigError> {
    let name = name
        .map(str::to_owned)
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into());

    let profile = config
        .profiles
        .get(&name)
        .ok_or_else(|| ConfigError::UnknownProfile {
            profile: name.clone(),
        })?;

    let descriptor = profile_to_descriptor(profile, &name, &config.defaults)?;
    let transport = TransportConfig {
        timeout: Duration::from_secs(profile.timeout.unwrap_or(config.defaults.timeout)),
        connect_timeout: Duration::from_secs(config.defaults.connect_timeout),
        ..TransportConfig::default()
    };

    Ok(ResolvedProfile {
        name,
        descriptor,
        vendor: profile.vendor.as_deref().map(VendorKey::new),
        transport,
    })
}
