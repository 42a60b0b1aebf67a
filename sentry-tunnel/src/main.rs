use clap::Parser;
use metrics_exporter_statsd::StatsdBuilder;
use std::process::ExitCode;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};
use tunnel::config::Config;

mod cli;

use cli::{Cli, TelemetryArgs};

#[derive(thiserror::Error, Debug)]
enum CliError {
    #[error("{0}")]
    Config(#[from] tunnel::config::ConfigError),
    #[error("invalid configuration: {0}")]
    Validation(#[from] tunnel::config::ValidationError),
    #[error("invalid sentry DSN: {0}")]
    SentryDsn(String),
    #[error("could not create statsd exporter: {0}")]
    Statsd(#[from] metrics_exporter_statsd::StatsdError),
    #[error("a metrics recorder is already installed")]
    MetricsRecorder,
    #[error(transparent)]
    Tunnel(#[from] tunnel::errors::TunnelError),
}

fn init_sentry(telemetry: &TelemetryArgs) -> Result<Option<sentry::ClientInitGuard>, CliError> {
    let Some(raw) = telemetry.sentry_dsn.as_deref().filter(|d| !d.is_empty()) else {
        return Ok(None);
    };
    let dsn = raw
        .parse::<sentry::types::Dsn>()
        .map_err(|e| CliError::SentryDsn(e.to_string()))?;

    Ok(Some(sentry::init(sentry::ClientOptions {
        dsn: Some(dsn),
        release: sentry::release_name!(),
        ..Default::default()
    })))
}

fn init_logging(with_sentry: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let sentry_layer = with_sentry.then(|| sentry::integrations::tracing::layer());

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .with(sentry_layer)
        .init();
}

fn init_metrics(telemetry: &TelemetryArgs) -> Result<(), CliError> {
    let Some(host) = telemetry.statsd_host.as_deref().filter(|h| !h.is_empty()) else {
        return Ok(());
    };

    let recorder = StatsdBuilder::from(host, telemetry.statsd_port).build(Some("sentry_tunnel"))?;
    metrics::set_global_recorder(recorder).map_err(|_| CliError::MetricsRecorder)?;
    shared::metrics_defs::describe_metrics(tunnel::metrics_defs::ALL_METRICS);

    tracing::info!(host, port = telemetry.statsd_port, "Sending metrics to statsd");
    Ok(())
}

fn log_config(config: &Config) {
    let mut project_ids: Vec<&str> = config
        .allow_list
        .project_ids
        .iter()
        .map(String::as_str)
        .collect();
    project_ids.sort_unstable();

    tracing::info!(
        sentry_host = %config.allow_list.host,
        sentry_schema = config.upstream_scheme.as_str(),
        sentry_project_ids = ?project_ids,
        route_path = %config.route_path,
        address = %shared::http::bind_address(&config.listener.host, config.listener.port),
        "Tunnel configuration"
    );
}

async fn run(cli: Cli) -> Result<(), CliError> {
    init_metrics(&cli.telemetry)?;

    let config = cli.load_config()?;
    config.validate()?;
    log_config(&config);

    tunnel::run(config).await?;
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let sentry_guard = match init_sentry(&cli.telemetry) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };
    init_logging(sentry_guard.is_some());

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            tracing::error!(error = %e, "Could not start the runtime");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
