//! The relay service: one route that proxies one upstream call.

use crate::config::relay::RelayConfig;
use crate::core::upstream::HttpPriceSource;
use crate::domain::ports::PriceSource;
use crate::utils::error::{RelayError, Result};
use axum::{
    body::Body,
    extract::State,
    http::{header, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub const PRICE_ROUTE: &str = "/btc/price";

#[derive(Clone)]
pub struct PriceRelayService {
    source: Arc<dyn PriceSource>,
}

impl std::fmt::Debug for PriceRelayService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PriceRelayService")
            .field("upstream", &self.source.endpoint())
            .finish()
    }
}

impl PriceRelayService {
    pub fn new<S: PriceSource + 'static>(source: S) -> Self {
        Self {
            source: Arc::new(source),
        }
    }

    pub fn from_config(config: &RelayConfig) -> Result<Self> {
        let source = HttpPriceSource::new(config.upstream_url.clone(), config.upstream_timeout)?;
        Ok(Self::new(source))
    }

    pub fn upstream(&self) -> &str {
        self.source.endpoint()
    }

    /// Builds the router. Every response, including 404s and preflights,
    /// passes through the permissive CORS layer.
    pub fn router(&self) -> Router {
        Router::new()
            .route(PRICE_ROUTE, get(relay_price).fallback(route_not_found))
            .fallback(route_not_found)
            .with_state(self.source.clone())
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive())
    }

    pub async fn serve(self, listener: TcpListener) -> Result<()> {
        let app = self.router();
        axum::serve(listener, app).await?;
        Ok(())
    }

    /// Binds the configured address and serves until Ctrl-C or SIGTERM.
    pub async fn run(config: RelayConfig) -> Result<()> {
        let service = Self::from_config(&config)?;
        let listener = TcpListener::bind(config.bind_addr).await?;

        tracing::info!(
            "Price relay listening on {} (upstream: {}, timeout: {:?})",
            listener.local_addr()?,
            service.upstream(),
            config.upstream_timeout
        );

        axum::serve(listener, service.router())
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Price relay stopped");
        Ok(())
    }
}

async fn relay_price(State(source): State<Arc<dyn PriceSource>>) -> Response {
    match source.fetch_quote().await {
        Ok(quote) => {
            let status = StatusCode::from_u16(quote.status).unwrap_or(StatusCode::OK);
            (
                status,
                [(header::CONTENT_TYPE, "application/json")],
                Body::from(quote.body),
            )
                .into_response()
        }
        Err(e) => {
            tracing::warn!("Relay to {} failed: {}", source.endpoint(), e);
            RelayError::from(e).into_response()
        }
    }
}

async fn route_not_found(method: Method, uri: Uri) -> RelayError {
    tracing::debug!("No route for {} {}", method, uri.path());
    RelayError::RouteNotFound {
        method: method.to_string(),
        path: uri.path().to_string(),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, draining connections");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::PriceQuote;
    use crate::utils::error::{UpstreamError, UpstreamResult};
    use async_trait::async_trait;
    use axum::body::to_bytes;
    use axum::http::Request;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tower::ServiceExt;

    struct StubSource {
        reply: UpstreamResult,
        calls: Arc<AtomicUsize>,
    }

    impl StubSource {
        fn new(reply: UpstreamResult) -> (Self, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            (
                Self {
                    reply,
                    calls: calls.clone(),
                },
                calls,
            )
        }
    }

    #[async_trait]
    impl PriceSource for StubSource {
        async fn fetch_quote(&self) -> UpstreamResult {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.reply.clone()
        }

        fn endpoint(&self) -> &str {
            "stub://price"
        }
    }

    fn get_request(path: &str) -> Request<Body> {
        Request::builder()
            .uri(path)
            .header(header::ORIGIN, "http://dashboard.example")
            .body(Body::empty())
            .unwrap()
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_price_route_relays_quote() {
        let raw = br#"{"bitcoin":{"usd":64000.5}}"#.to_vec();
        let (stub, calls) = StubSource::new(Ok(PriceQuote::new(200, raw.clone())));
        let app = PriceRelayService::new(stub).router();

        let response = app.oneshot(get_request(PRICE_ROUTE)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "*"
        );
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(bytes.as_ref(), raw.as_slice());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_price_route_keeps_non_200_success_status() {
        let (stub, _) = StubSource::new(Ok(PriceQuote::new(203, b"{}".to_vec())));
        let app = PriceRelayService::new(stub).router();

        let response = app.oneshot(get_request(PRICE_ROUTE)).await.unwrap();

        assert_eq!(response.status(), StatusCode::NON_AUTHORITATIVE_INFORMATION);
    }

    #[tokio::test]
    async fn test_timeout_maps_to_gateway_timeout() {
        let (stub, _) = StubSource::new(Err(UpstreamError::Timeout {
            after: Duration::from_secs(5),
        }));
        let app = PriceRelayService::new(stub).router();

        let response = app.oneshot(get_request(PRICE_ROUTE)).await.unwrap();

        assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(
            response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "*"
        );
        assert_eq!(body_json(response).await["error"], "upstream_timeout");
    }

    #[tokio::test]
    async fn test_unknown_path_is_404_without_upstream_call() {
        let (stub, calls) = StubSource::new(Ok(PriceQuote::new(200, b"{}".to_vec())));
        let app = PriceRelayService::new(stub).router();

        let response = app.oneshot(get_request("/eth/price")).await.unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "*"
        );
        let json = body_json(response).await;
        assert_eq!(json["error"], "route_not_found");
        assert_eq!(json["message"], "No route for GET /eth/price");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_other_methods_on_price_route_are_404() {
        let (stub, calls) = StubSource::new(Ok(PriceQuote::new(200, b"{}".to_vec())));
        let app = PriceRelayService::new(stub).router();

        let request = Request::builder()
            .method(Method::POST)
            .uri(PRICE_ROUTE)
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_cors_header_present_without_origin() {
        let (stub, _) = StubSource::new(Ok(PriceQuote::new(200, b"{}".to_vec())));
        let app = PriceRelayService::new(stub).router();

        for (path, status) in [(PRICE_ROUTE, StatusCode::OK), ("/eth/price", StatusCode::NOT_FOUND)] {
            let request = Request::builder().uri(path).body(Body::empty()).unwrap();
            let response = app.clone().oneshot(request).await.unwrap();

            assert_eq!(response.status(), status);
            assert_eq!(
                response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
                "*"
            );
        }
    }

    #[tokio::test]
    async fn test_preflight_is_answered_by_cors_layer() {
        let (stub, calls) = StubSource::new(Ok(PriceQuote::new(200, b"{}".to_vec())));
        let app = PriceRelayService::new(stub).router();

        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri(PRICE_ROUTE)
            .header(header::ORIGIN, "http://dashboard.example")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert!(response.status().is_success());
        assert_eq!(
            response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "*"
        );
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
