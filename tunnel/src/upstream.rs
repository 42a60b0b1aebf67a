use crate::config::UpstreamScheme;
use crate::errors::{Result, TunnelError};
use crate::metrics_defs::UPSTREAM_DURATION;
use http::StatusCode;
use http_body_util::Full;
use hyper::Response;
use hyper::body::Bytes;
use reqwest::header::CONTENT_TYPE;
use shared::histogram;
use std::time::{Duration, Instant};

pub const ENVELOPE_CONTENT_TYPE: &str = "application/x-sentry-envelope";

/// Builds `{scheme}://{host}/api/{project_id}/envelope/`.
pub fn envelope_url(scheme: UpstreamScheme, host: &str, project_id: &str) -> String {
    format!("{}://{host}/api/{project_id}/envelope/", scheme.as_str())
}

/// Status and body of an upstream reply, relayed to the caller untouched.
#[derive(Debug)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub body: Bytes,
}

impl UpstreamResponse {
    pub fn into_response(self) -> Response<Full<Bytes>> {
        let mut response = Response::new(Full::new(self.body));
        *response.status_mut() = self.status;
        response
    }
}

/// Client for the upstream ingestion endpoint.
#[derive(Clone)]
pub struct UpstreamClient {
    client: reqwest::Client,
}

impl UpstreamClient {
    /// The timeout covers the whole exchange, including reading the response body.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::from_client(client))
    }

    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// POSTs the envelope once. Transport errors and timeouts become `TunnelError::Upstream`.
    pub async fn forward(&self, url: &str, envelope: Bytes) -> Result<UpstreamResponse> {
        let start = Instant::now();

        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, ENVELOPE_CONTENT_TYPE)
            .body(envelope)
            .send()
            .await
            .map_err(|e| TunnelError::Upstream(e.to_string()))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| TunnelError::Upstream(e.to_string()))?;

        histogram!(UPSTREAM_DURATION, "status" => status.as_str().to_owned())
            .record(start.elapsed().as_secs_f64());
        tracing::debug!(url, status = status.as_u16(), "Forwarded envelope");

        Ok(UpstreamResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutils::{TestUpstream, closed_port};
    use http_body_util::BodyExt;

    #[test]
    fn test_envelope_url() {
        assert_eq!(
            envelope_url(UpstreamScheme::Http, "abc", "1"),
            "http://abc/api/1/envelope/"
        );
        assert_eq!(
            envelope_url(UpstreamScheme::Https, "o1.ingest.sentry.io", "42"),
            "https://o1.ingest.sentry.io/api/42/envelope/"
        );
    }

    #[tokio::test]
    async fn test_forward_success() {
        let upstream = TestUpstream::start(StatusCode::OK, r#"{"id":"abc"}"#).await;
        let client = upstream.client(Duration::from_secs(5));

        let response = client
            .forward("http://abc/api/1/envelope/", Bytes::from_static(b"line1\nline2"))
            .await
            .unwrap();
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body.as_ref(), br#"{"id":"abc"}"#);

        let requests = upstream.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, http::Method::POST);
        assert_eq!(requests[0].uri.host(), Some("abc"));
        assert_eq!(requests[0].uri.path(), "/api/1/envelope/");
        assert_eq!(
            requests[0].content_type.as_deref(),
            Some(ENVELOPE_CONTENT_TYPE)
        );
        assert_eq!(requests[0].body.as_ref(), b"line1\nline2");
    }

    #[tokio::test]
    async fn test_forward_relays_error_status() {
        let upstream = TestUpstream::start(StatusCode::TOO_MANY_REQUESTS, "slow down").await;
        let client = upstream.client(Duration::from_secs(5));

        let response = client
            .forward("http://abc/api/1/envelope/", Bytes::from_static(b"{}"))
            .await
            .unwrap()
            .into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(body.as_ref(), b"slow down");
    }

    #[tokio::test]
    async fn test_forward_connection_refused() {
        let port = closed_port().await;
        let client = UpstreamClient::new(Duration::from_secs(5)).unwrap();

        let result = client
            .forward(
                &format!("http://127.0.0.1:{port}/api/1/envelope/"),
                Bytes::from_static(b"{}"),
            )
            .await;
        assert!(matches!(result, Err(TunnelError::Upstream(_))));
    }

    #[tokio::test]
    async fn test_forward_timeout() {
        let upstream = TestUpstream::start_with_delay(
            StatusCode::OK,
            "late",
            Duration::from_secs(2),
        )
        .await;
        let client = upstream.client(Duration::from_millis(200));

        let result = client
            .forward("http://abc/api/1/envelope/", Bytes::from_static(b"{}"))
            .await;
        assert!(matches!(result, Err(TunnelError::Upstream(_))));
    }
}
