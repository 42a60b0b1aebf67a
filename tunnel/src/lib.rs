//! Validating tunnel for Sentry envelopes.
//!
//! Browser SDKs post envelopes to a first-party endpoint. The tunnel reads the
//! DSN from the envelope's header record, checks its host and project id
//! against a fixed allow-list, and forwards the untouched envelope to
//! `{scheme}://{host}/api/{project_id}/envelope/`.

pub mod allowlist;
pub mod config;
pub mod dsn;
pub mod errors;
pub mod handler;
pub mod metrics_defs;
pub mod service;
pub mod upstream;

#[cfg(test)]
mod testutils;

use errors::TunnelError;
use service::TunnelService;
use shared::http::run_http_service;
use std::sync::Arc;

pub async fn run(config: config::Config) -> Result<(), TunnelError> {
    config.validate()?;

    let config = Arc::new(config);
    let service = TunnelService::new(config.clone())?;

    tracing::info!(
        route_path = %config.route_path,
        upstream_timeout_secs = config.upstream_timeout_secs,
        "Starting tunnel"
    );
    run_http_service(&config.listener.host, config.listener.port, service).await
}
