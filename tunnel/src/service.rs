use crate::config::{Config, HEALTH_CHECK_PATH};
use crate::errors::TunnelError;
use crate::handler::{TunnelHandler, health_check};
use http_body_util::Full;
use http_body_util::combinators::BoxBody;
use hyper::body::{Body, Bytes, Incoming};
use hyper::service::Service;
use hyper::{Request, Response};
use shared::http::box_response;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

#[derive(Debug, PartialEq, Eq)]
enum Route {
    Tunnel,
    HealthCheck,
    NotFound,
}

/// Explicit route table: the configured tunnel path and the health check.
#[derive(Clone)]
pub struct TunnelService {
    route_path: Arc<str>,
    tunnel: Arc<TunnelHandler>,
}

impl TunnelService {
    pub fn new(config: Arc<Config>) -> crate::errors::Result<Self> {
        let tunnel = TunnelHandler::new(config.clone())?;
        Ok(Self::with_handler(&config, tunnel))
    }

    pub fn with_handler(config: &Config, tunnel: TunnelHandler) -> Self {
        Self {
            route_path: Arc::from(config.route_path.as_str()),
            tunnel: Arc::new(tunnel),
        }
    }

    fn route(&self, path: &str) -> Route {
        if path == &*self.route_path {
            Route::Tunnel
        } else if path == HEALTH_CHECK_PATH {
            Route::HealthCheck
        } else {
            Route::NotFound
        }
    }

    pub async fn dispatch<B>(&self, request: Request<B>) -> Response<Full<Bytes>>
    where
        B: Body,
        B::Error: std::fmt::Display,
    {
        match self.route(request.uri().path()) {
            Route::Tunnel => self.tunnel.handle(request).await,
            Route::HealthCheck => health_check(),
            Route::NotFound => {
                TunnelError::RouteNotFound(request.uri().path().to_string()).into_response()
            }
        }
    }
}

impl Service<Request<Incoming>> for TunnelService {
    type Response = Response<BoxBody<Bytes, TunnelError>>;
    type Error = TunnelError;
    type Future =
        Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send + 'static>>;

    fn call(&self, req: Request<Incoming>) -> Self::Future {
        let service = self.clone();

        Box::pin(async move { Ok(box_response(service.dispatch(req).await)) })
    }
}
