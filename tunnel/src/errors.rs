use crate::config::ValidationError;
use http::header::{CONTENT_TYPE, HeaderValue};
use http::{Method, StatusCode};
use http_body_util::Full;
use hyper::Response;
use hyper::body::Bytes;
use thiserror::Error;

/// Result type alias for tunnel operations
pub type Result<T, E = TunnelError> = std::result::Result<T, E>;

/// Errors that can occur while tunnelling an envelope.
///
/// The display text of each request-level variant is the message returned to
/// the caller in the JSON error body.
#[derive(Error, Debug)]
pub enum TunnelError {
    #[error("Method {0} is not supported")]
    MethodNotAllowed(Method),

    #[error("Cannot read request body")]
    EmptyBody,

    #[error("Cannot read request body")]
    BodyRead(String),

    #[error("Cannot deserialize body")]
    Deserialize(#[source] serde_json::Error),

    #[error("DSN contains wrong URL format")]
    InvalidDsn(#[source] url::ParseError),

    #[error("Hostname is not allowed: {0}")]
    HostNotAllowed(String),

    #[error("Project is not allowed: {0}")]
    ProjectNotAllowed(String),

    #[error("Error occurred: {0}")]
    Upstream(String),

    #[error("Route not found: {0}")]
    RouteNotFound(String),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(#[from] ValidationError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl TunnelError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            TunnelError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            TunnelError::EmptyBody
            | TunnelError::BodyRead(_)
            | TunnelError::Deserialize(_)
            | TunnelError::InvalidDsn(_)
            | TunnelError::HostNotAllowed(_)
            | TunnelError::ProjectNotAllowed(_) => StatusCode::BAD_REQUEST,
            TunnelError::RouteNotFound(_) => StatusCode::NOT_FOUND,
            TunnelError::Upstream(_)
            | TunnelError::HttpClient(_)
            | TunnelError::InvalidConfig(_)
            | TunnelError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short tag used as the `reason` label on rejection metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            TunnelError::MethodNotAllowed(_) => "method_not_allowed",
            TunnelError::EmptyBody | TunnelError::BodyRead(_) => "unreadable_body",
            TunnelError::Deserialize(_) => "invalid_header",
            TunnelError::InvalidDsn(_) => "invalid_dsn",
            TunnelError::HostNotAllowed(_) => "host_not_allowed",
            TunnelError::ProjectNotAllowed(_) => "project_not_allowed",
            TunnelError::Upstream(_) => "upstream_error",
            TunnelError::RouteNotFound(_) => "route_not_found",
            TunnelError::HttpClient(_) | TunnelError::InvalidConfig(_) | TunnelError::Io(_) => {
                "internal_error"
            }
        }
    }

    /// Logs the error and converts it into `{"error": true, "message": "..."}`.
    pub fn into_response(self) -> Response<Full<Bytes>> {
        let status = self.status_code();
        let message = self.to_string();

        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = ?self, "{message}");
        } else {
            tracing::warn!(status = status.as_u16(), "{message}");
        }

        let body = serde_json::json!({ "error": true, "message": message }).to_string();
        let mut response = Response::new(Full::new(Bytes::from(body)));
        *response.status_mut() = status;
        response
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        response
    }
}
