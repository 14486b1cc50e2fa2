use crate::params::subscription::{SubscribeParams, VapidPublicKeyResponse};
use crate::{AppState, Error};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use log::*;

/// POST store a browser push subscription for a registered nickname
#[utoipa::path(
    post,
    path = "/subscribe",
    request_body = SubscribeParams,
    responses(
        (status = 201, description = "Subscription stored (duplicates are absorbed)"),
        (status = 403, description = "Nickname has not been registered"),
        (status = 422, description = "Unprocessable Entity")
    )
)]
pub async fn subscribe(
    State(app_state): State<AppState>,
    Json(params): Json<SubscribeParams>,
) -> Result<Response, Error> {
    if !app_state.nicknames.contains(&params.nickname).await {
        warn!("Rejecting push subscription from unregistered nickname");
        return Ok((StatusCode::FORBIDDEN, Json(json!({}))).into_response());
    }

    let added = app_state.subscriptions.add(params.into());
    debug!(
        "POST subscribe: newly added={added}, {} subscription(s) stored",
        app_state.subscriptions.len()
    );

    Ok((StatusCode::CREATED, Json(json!({}))).into_response())
}

/// GET the VAPID application server key browsers need to subscribe
#[utoipa::path(
    get,
    path = "/vapid_public_key",
    responses(
        (status = 200, description = "The configured VAPID public key", body = VapidPublicKeyResponse),
        (status = 404, description = "Push delivery is not configured")
    )
)]
pub async fn vapid_public_key(State(app_state): State<AppState>) -> Response {
    match app_state.config.vapid_public_key() {
        Some(public_key) => Json(VapidPublicKeyResponse { public_key }).into_response(),
        None => (StatusCode::NOT_FOUND, "NOT FOUND").into_response(),
    }
}
