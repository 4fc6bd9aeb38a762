use crate::relay::{ForwardRequest, Relay};
use axum::{
    extract::State,
    http::{HeaderMap, Method, Uri},
    response::Response,
};
use bytes::Bytes;
use std::sync::Arc;

/// Catch-all: every method and path on the relay port ends up here.
pub async fn relay_request(
    State(relay): State<Arc<Relay>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let req = ForwardRequest {
        method,
        path: uri.path().to_string(),
        query: uri.query().map(str::to_string),
        headers,
        body,
    };

    relay.relay(req).await
}
