use crate::allowlist::AllowList;
use serde::Deserialize;
use std::fs::File;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_ROUTE_PATH: &str = "/bugs";
pub const HEALTH_CHECK_PATH: &str = "/health-check";
pub const DEFAULT_PORT: u16 = 3333;
pub const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 10;

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Port cannot be 0")]
    InvalidPort,

    #[error("SENTRY_HOST is required")]
    MissingHost,

    #[error("SENTRY_PROJECT_IDS is required")]
    MissingProjectIds,

    #[error("SENTRY_PROJECT_IDS cannot contain blank entries")]
    BlankProjectId,

    #[error("Route path must start with '/': {0}")]
    InvalidRoutePath(String),

    #[error("Route path conflicts with the health check: {0}")]
    RouteConflict(String),

    #[error("Upstream timeout cannot be 0")]
    ZeroTimeout,
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("could not load config from file: {0}")]
    LoadError(#[from] std::io::Error),
    #[error("could not parse config: {0}")]
    ParseError(#[from] serde_yaml::Error),
}

/// Scheme used to reach the upstream ingestion endpoint.
///
/// Anything other than exactly `http` or `https` falls back to `https`.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(from = "String")]
pub enum UpstreamScheme {
    Http,
    #[default]
    Https,
}

impl UpstreamScheme {
    pub fn from_config_str(value: &str) -> Self {
        match value {
            "http" => UpstreamScheme::Http,
            _ => UpstreamScheme::Https,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            UpstreamScheme::Http => "http",
            UpstreamScheme::Https => "https",
        }
    }
}

impl From<String> for UpstreamScheme {
    fn from(value: String) -> Self {
        UpstreamScheme::from_config_str(&value)
    }
}

/// Network listener configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Listener {
    /// Host address to bind to. Empty binds all interfaces.
    #[serde(default)]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for Listener {
    fn default() -> Self {
        Listener {
            host: String::new(),
            port: DEFAULT_PORT,
        }
    }
}

impl Listener {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.port == 0 {
            return Err(ValidationError::InvalidPort);
        }
        Ok(())
    }
}

/// Tunnel configuration. Read once at startup and never mutated.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub listener: Listener,
    /// Path the tunnel endpoint is mounted on
    #[serde(default = "default_route_path")]
    pub route_path: String,
    #[serde(flatten)]
    pub allow_list: AllowList,
    #[serde(default, rename = "sentry_schema")]
    pub upstream_scheme: UpstreamScheme,
    #[serde(default = "default_upstream_timeout_secs")]
    pub upstream_timeout_secs: u64,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_route_path() -> String {
    DEFAULT_ROUTE_PATH.to_string()
}

fn default_upstream_timeout_secs() -> u64 {
    DEFAULT_UPSTREAM_TIMEOUT_SECS
}

impl Config {
    pub fn new(allow_list: AllowList) -> Self {
        Config {
            listener: Listener::default(),
            route_path: default_route_path(),
            allow_list,
            upstream_scheme: UpstreamScheme::default(),
            upstream_timeout_secs: DEFAULT_UPSTREAM_TIMEOUT_SECS,
        }
    }

    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let file = File::open(path)?;
        let data = serde_yaml::from_reader(file)?;

        Ok(data)
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_secs)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        self.listener.validate()?;

        if self.allow_list.host.is_empty() {
            return Err(ValidationError::MissingHost);
        }
        if self.allow_list.project_ids.is_empty() {
            return Err(ValidationError::MissingProjectIds);
        }
        if self.allow_list.project_ids.iter().any(|id| id.trim().is_empty()) {
            return Err(ValidationError::BlankProjectId);
        }

        if !self.route_path.starts_with('/') {
            return Err(ValidationError::InvalidRoutePath(self.route_path.clone()));
        }
        if self.route_path == HEALTH_CHECK_PATH {
            return Err(ValidationError::RouteConflict(self.route_path.clone()));
        }

        if self.upstream_timeout_secs == 0 {
            return Err(ValidationError::ZeroTimeout);
        }

        Ok(())
    }
}
