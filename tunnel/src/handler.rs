use crate::config::Config;
use crate::dsn::{Dsn, HeaderRecord};
use crate::errors::{Result, TunnelError};
use crate::metrics_defs::{REQUESTS_FORWARDED, REQUESTS_REJECTED};
use crate::upstream::{UpstreamClient, envelope_url};
use http::{Method, StatusCode};
use http_body_util::{BodyExt, Full};
use hyper::body::{Body, Bytes};
use hyper::{Request, Response};
use shared::counter;
use shared::http::empty_response;
use std::sync::Arc;

/// Validates an envelope's DSN against the allow-list and relays it upstream.
///
/// Holds no per-request state, so one instance serves all connections.
pub struct TunnelHandler {
    config: Arc<Config>,
    upstream: UpstreamClient,
}

impl TunnelHandler {
    pub fn new(config: Arc<Config>) -> Result<Self> {
        let upstream = UpstreamClient::new(config.upstream_timeout())?;
        Ok(Self::with_upstream(config, upstream))
    }

    pub fn with_upstream(config: Arc<Config>, upstream: UpstreamClient) -> Self {
        Self { config, upstream }
    }

    pub async fn handle<B>(&self, request: Request<B>) -> Response<Full<Bytes>>
    where
        B: Body,
        B::Error: std::fmt::Display,
    {
        match self.try_handle(request).await {
            Ok(response) => response,
            Err(e) => {
                counter!(REQUESTS_REJECTED, "reason" => e.reason()).increment(1);
                e.into_response()
            }
        }
    }

    async fn try_handle<B>(&self, request: Request<B>) -> Result<Response<Full<Bytes>>>
    where
        B: Body,
        B::Error: std::fmt::Display,
    {
        if request.method() != Method::POST {
            return Err(TunnelError::MethodNotAllowed(request.method().clone()));
        }

        let envelope = read_body(request.into_body()).await?;
        let header = HeaderRecord::from_envelope(&envelope)?;
        let dsn = Dsn::parse(&header.dsn)?;
        let project_id = self.config.allow_list.authorize(&dsn)?;

        let url = envelope_url(
            self.config.upstream_scheme,
            &self.config.allow_list.host,
            project_id,
        );
        // The whole envelope goes upstream, not just the header record
        let upstream_response = self.upstream.forward(&url, envelope).await?;
        counter!(REQUESTS_FORWARDED).increment(1);

        Ok(upstream_response.into_response())
    }
}

async fn read_body<B>(body: B) -> Result<Bytes>
where
    B: Body,
    B::Error: std::fmt::Display,
{
    let bytes = body
        .collect()
        .await
        .map_err(|e| TunnelError::BodyRead(e.to_string()))?
        .to_bytes();

    if bytes.is_empty() {
        return Err(TunnelError::EmptyBody);
    }
    Ok(bytes)
}

/// Liveness probe. Answers any method with an empty 200.
pub fn health_check() -> Response<Full<Bytes>> {
    empty_response(StatusCode::OK)
}
