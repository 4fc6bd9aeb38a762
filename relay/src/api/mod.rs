pub mod handlers;
pub mod types;

use crate::constants;
use crate::relay::Relay;
use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};

#[derive(Clone)]
pub struct ControlState {
    pub relay: Arc<Relay>,
    pub metrics: Option<PrometheusHandle>,
}

/// Data plane: no routes, everything falls through to the relay.
pub fn relay_router(relay: Arc<Relay>) -> Router {
    Router::new()
        .fallback(handlers::proxy::relay_request)
        .layer(DefaultBodyLimit::max(constants::network::MAX_BODY_BYTES))
        // 예상치 못한 패닉은 500으로
        .layer(CatchPanicLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(relay)
}

/// Control plane, served on its own port so relayed paths never collide with it.
pub fn control_router(relay: Arc<Relay>, metrics: Option<PrometheusHandle>) -> Router {
    let state = ControlState { relay, metrics };

    Router::new()
        .route("/status", get(handlers::session::get_status))
        .route("/session", delete(handlers::session::invalidate_session))
        .route("/session/refresh", post(handlers::session::refresh_session))
        .route("/metrics", get(handlers::metrics::render_metrics))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
