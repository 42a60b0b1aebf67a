use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, Full};
use hyper::body::{Bytes, Incoming};
use hyper::service::Service;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioExecutor;
use hyper_util::rt::TokioIo;
use hyper_util::server::conn::auto::Builder;
use std::convert::Infallible;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Formats a bind address. An empty host binds all interfaces.
pub fn bind_address(host: &str, port: u16) -> String {
    let host = if host.is_empty() { "0.0.0.0" } else { host };
    format!("{host}:{port}")
}

pub async fn run_http_service<S, E>(host: &str, port: u16, service: S) -> Result<(), E>
where
    S: Service<Request<Incoming>, Response = Response<BoxBody<Bytes, E>>, Error = E>
        + Send
        + Sync
        + 'static,
    S::Future: Send + 'static,
    E: From<std::io::Error> + std::error::Error + Send + Sync + 'static,
{
    let listener = TcpListener::bind(bind_address(host, port)).await?;
    serve(listener, service).await
}

/// Accepts connections on an already bound listener until accepting fails.
pub async fn serve<S, E>(listener: TcpListener, service: S) -> Result<(), E>
where
    S: Service<Request<Incoming>, Response = Response<BoxBody<Bytes, E>>, Error = E>
        + Send
        + Sync
        + 'static,
    S::Future: Send + 'static,
    E: From<std::io::Error> + std::error::Error + Send + Sync + 'static,
{
    let local_addr = listener.local_addr()?;
    tracing::info!(address = %local_addr, "Listening");
    let service_arc = Arc::new(service);

    loop {
        let (stream, peer_addr) = listener.accept().await?;
        let _ = stream.set_nodelay(true);
        let io = TokioIo::new(stream);
        let svc = service_arc.clone();

        // Hand the connection to hyper; auto-detect h1/h2 on this socket
        tokio::spawn(async move {
            if let Err(e) = Builder::new(TokioExecutor::new())
                .serve_connection(io, svc)
                .await
            {
                tracing::debug!(peer = %peer_addr, error = %e, "Connection closed with error");
            }
        });
    }
}

/// Lifts an infallible `Full` body response into the boxed body hyper services return.
pub fn box_response<E: 'static>(response: Response<Full<Bytes>>) -> Response<BoxBody<Bytes, E>> {
    response.map(|body| body.map_err(|e: Infallible| match e {}).boxed())
}

pub fn empty_response(status_code: StatusCode) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::new()));
    *response.status_mut() = status_code;
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_address() {
        assert_eq!(bind_address("", 3333), "0.0.0.0:3333");
        assert_eq!(bind_address("127.0.0.1", 8080), "127.0.0.1:8080");
    }

    #[tokio::test]
    async fn test_box_response_keeps_status_and_body() {
        let boxed: Response<BoxBody<Bytes, std::io::Error>> =
            box_response(empty_response(StatusCode::ACCEPTED));
        assert_eq!(boxed.status(), StatusCode::ACCEPTED);

        let body = boxed.into_body().collect().await.unwrap().to_bytes();
        assert!(body.is_empty());
    }
}
