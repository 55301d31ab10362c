use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use super::handlers;
use super::AppState;
use crate::middleware::{make_span_with_request_id, request_id_middleware};

/// Creates the router: health check, plus the Telegram webhook when a secret is set
pub fn create_router(state: AppState) -> Router {
    let mut router = Router::new().route("/health", get(handlers::health_check));
    if state.webhook_secret.is_some() {
        router = router.route("/webhook", post(handlers::webhook));
    }

    router.with_state(state).layer(
        ServiceBuilder::new()
            .layer(middleware::from_fn(request_id_middleware))
            .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id)),
    )
}
