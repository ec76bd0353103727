//! HTTP surface for GitHub webhooks and chat interactions.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use tokio::net::TcpListener;

use crate::interaction::InteractionEndpoint;
use crate::webhook::WebhookDispatcher;

/// Shared handlers behind the router.
#[derive(Debug, Clone)]
pub struct ServerState {
    webhooks: Arc<WebhookDispatcher>,
    interactions: Option<Arc<InteractionEndpoint>>,
}

/// Builds the router serving `/webhooks`, `/interactions`, and `/health`.
///
/// `/interactions` answers 404 when no public key was configured.
#[must_use]
pub fn router(
    webhooks: Arc<WebhookDispatcher>,
    interactions: Option<Arc<InteractionEndpoint>>,
) -> Router {
    Router::new()
        .route("/webhooks", post(receive_webhook))
        .route("/interactions", post(receive_interaction))
        .route("/health", get(health))
        .with_state(ServerState {
            webhooks,
            interactions,
        })
}

/// Serves `app` on `addr` until `shutdown` resolves.
///
/// # Errors
///
/// Returns the I/O error when the address cannot be bound or the server
/// fails.
pub async fn serve(
    addr: SocketAddr,
    app: Router,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "listening for webhooks and interactions");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
}

async fn receive_webhook(
    State(state): State<ServerState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let outcome = state.webhooks.dispatch(&headers, &body).await;
    (outcome.status, outcome.body).into_response()
}

async fn receive_interaction(
    State(state): State<ServerState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let Some(endpoint) = state.interactions else {
        return (StatusCode::NOT_FOUND, "Interactions are not configured.").into_response();
    };
    let (status, json) = endpoint.handle(&headers, &body).await;
    (status, [(header::CONTENT_TYPE, "application/json")], json).into_response()
}

async fn health() -> &'static str {
    "ok"
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::{Body, to_bytes};
    use axum::http::{Method, Request, StatusCode};
    use tower::ServiceExt;

    use super::router;
    use crate::telemetry::NoopTelemetrySink;
    use crate::webhook::{DELIVERY_HEADER, EVENT_HEADER, PingHandler, WebhookDispatcher};

    fn dispatcher() -> Arc<WebhookDispatcher> {
        Arc::new(
            WebhookDispatcher::new(None, Arc::new(NoopTelemetrySink))
                .with_handler(Arc::new(PingHandler)),
        )
    }

    async fn body_text(response: axum::response::Response) -> String {
        let bytes = to_bytes(response.into_body(), 64 * 1024)
            .await
            .expect("body should be readable");
        String::from_utf8(bytes.to_vec()).expect("body should be UTF-8")
    }

    #[tokio::test]
    async fn ping_webhook_reaches_the_dispatcher() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/webhooks")
            .header(EVENT_HEADER, "ping")
            .header(DELIVERY_HEADER, "72d3162e-cc78-11e3-81ab-4c9367dc0958")
            .body(Body::from(r#"{"zen":"Keep it logically awesome."}"#))
            .expect("request should build");

        let response = router(dispatcher(), None)
            .oneshot(request)
            .await
            .expect("router should answer");

        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert_eq!(body_text(response).await, "Pong!");
    }

    #[tokio::test]
    async fn missing_headers_are_a_bad_request() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/webhooks")
            .body(Body::empty())
            .expect("request should build");

        let response = router(dispatcher(), None)
            .oneshot(request)
            .await
            .expect("router should answer");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn webhooks_only_accept_post() {
        let request = Request::builder()
            .method(Method::GET)
            .uri("/webhooks")
            .body(Body::empty())
            .expect("request should build");

        let response = router(dispatcher(), None)
            .oneshot(request)
            .await
            .expect("router should answer");

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn interactions_are_not_found_without_a_public_key() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/interactions")
            .body(Body::from(r#"{"type":1}"#))
            .expect("request should build");

        let response = router(dispatcher(), None)
            .oneshot(request)
            .await
            .expect("router should answer");

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn health_answers_ok() {
        let request = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .expect("request should build");

        let response = router(dispatcher(), None)
            .oneshot(request)
            .await
            .expect("router should answer");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "ok");
    }
}
