use crate::params::registration::{RegisterParams, RegisterResponse};
use crate::{AppState, Error};
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use domain::nickname_registry::RegistrationOutcome;

use log::*;

/// POST register a nickname, required once before subscribing to push alerts
#[utoipa::path(
    post,
    path = "/register",
    request_body = RegisterParams,
    responses(
        (status = 200, description = "Registration result; `success` is false for invalid or taken nicknames", body = RegisterResponse),
        (status = 500, description = "Nickname list could not be persisted")
    )
)]
pub async fn register(
    State(app_state): State<AppState>,
    Json(params): Json<RegisterParams>,
) -> Result<impl IntoResponse, Error> {
    let outcome = match params.nickname.as_deref() {
        Some(nickname) => app_state.nicknames.register(nickname).await?,
        None => RegistrationOutcome::Invalid,
    };
    debug!("POST register nickname: {outcome:?}");

    Ok(Json(RegisterResponse {
        success: outcome == RegistrationOutcome::Registered,
        message: outcome.message().map(str::to_string),
    }))
}
