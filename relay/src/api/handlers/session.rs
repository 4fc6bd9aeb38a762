use crate::api::types::{SessionRes, StatusRes};
use crate::api::ControlState;
use crate::error::RelayError;
use axum::{extract::State, http::StatusCode, Json};

fn status_of(state: &ControlState) -> StatusRes {
    let snapshot = state.relay.cache().snapshot();
    StatusRes {
        upstream: state.relay.base_url().to_string(),
        session: SessionRes::from_snapshot(snapshot.as_deref()),
    }
}

pub async fn get_status(State(state): State<ControlState>) -> Json<StatusRes> {
    Json(status_of(&state))
}

/// 캐시를 무시하고 다시 로그인
pub async fn refresh_session(
    State(state): State<ControlState>,
) -> Result<Json<StatusRes>, RelayError> {
    state.relay.force_login().await?;
    tracing::info!("♻️ Session refreshed via control API");
    Ok(Json(status_of(&state)))
}

pub async fn invalidate_session(State(state): State<ControlState>) -> StatusCode {
    state.relay.cache().invalidate();
    tracing::info!("Session cache invalidated via control API");
    StatusCode::NO_CONTENT
}
