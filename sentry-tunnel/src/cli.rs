use clap::{Args, Parser};
use std::path::PathBuf;
use tunnel::allowlist::{AllowList, parse_project_ids};
use tunnel::config::{
    Config, ConfigError, DEFAULT_PORT, DEFAULT_ROUTE_PATH, DEFAULT_UPSTREAM_TIMEOUT_SECS,
    Listener, UpstreamScheme,
};

/// Validating tunnel that relays browser Sentry envelopes to an allowed project.
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// YAML config file. When set, the tunnel options below are ignored.
    #[arg(long, env = "TUNNEL_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub tunnel: TunnelArgs,

    #[command(flatten)]
    pub telemetry: TelemetryArgs,
}

#[derive(Args, Debug)]
pub struct TunnelArgs {
    /// Only DSNs with exactly this host are forwarded
    #[arg(long, env = "SENTRY_HOST")]
    pub sentry_host: Option<String>,

    /// Comma separated project ids a DSN may name
    #[arg(long, env = "SENTRY_PROJECT_IDS")]
    pub sentry_project_ids: Option<String>,

    /// Upstream scheme, `http` or `https`. Anything else means `https`.
    #[arg(long, env = "SENTRY_SCHEMA")]
    pub sentry_schema: Option<String>,

    #[arg(long, env = "APP_ROUTE_PATH")]
    pub route_path: Option<String>,

    #[arg(long, env = "APP_HOST")]
    pub app_host: Option<String>,

    #[arg(long, env = "APP_PORT", default_value_t = DEFAULT_PORT)]
    pub app_port: u16,

    #[arg(long, env = "UPSTREAM_TIMEOUT_SECS", default_value_t = DEFAULT_UPSTREAM_TIMEOUT_SECS)]
    pub upstream_timeout_secs: u64,
}

#[derive(Args, Debug)]
pub struct TelemetryArgs {
    #[arg(long, env = "STATSD_HOST")]
    pub statsd_host: Option<String>,

    #[arg(long, env = "STATSD_PORT", default_value_t = 8125)]
    pub statsd_port: u16,

    /// DSN for reporting the tunnel's own errors to Sentry
    #[arg(long, env = "TUNNEL_SENTRY_DSN")]
    pub sentry_dsn: Option<String>,
}

impl Cli {
    pub fn load_config(&self) -> Result<Config, ConfigError> {
        match &self.config {
            Some(path) => Config::from_file(path),
            None => Ok(self.tunnel.to_config()),
        }
    }
}

/// Empty values count as unset, so `APP_ROUTE_PATH=` still means `/bugs`.
fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

impl TunnelArgs {
    pub fn to_config(&self) -> Config {
        let allow_list = AllowList {
            host: non_empty(&self.sentry_host).unwrap_or_default().to_string(),
            project_ids: parse_project_ids(non_empty(&self.sentry_project_ids).unwrap_or_default()),
        };

        Config {
            listener: Listener {
                host: non_empty(&self.app_host).unwrap_or_default().to_string(),
                port: self.app_port,
            },
            route_path: non_empty(&self.route_path)
                .unwrap_or(DEFAULT_ROUTE_PATH)
                .to_string(),
            allow_list,
            upstream_scheme: UpstreamScheme::from_config_str(
                self.sentry_schema.as_deref().unwrap_or_default(),
            ),
            upstream_timeout_secs: self.upstream_timeout_secs,
        }
    }
}
