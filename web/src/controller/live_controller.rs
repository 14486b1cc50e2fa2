use crate::params::live::{LiveParams, LiveResponse};
use crate::{AppState, Error};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use domain::coordinator::SignalOutcome;

use log::*;

/// POST a "live" signal on behalf of a connected client
#[utoipa::path(
    post,
    path = "/live",
    request_body = LiveParams,
    responses(
        (status = 202, description = "Signal recorded (or ignored for an unknown client)", body = LiveResponse),
        (status = 422, description = "client_id is not a valid client handle")
    )
)]
pub async fn signal(
    State(app_state): State<AppState>,
    Json(params): Json<LiveParams>,
) -> Result<impl IntoResponse, Error> {
    let client = params.client()?;
    debug!("POST live signal from client {client}");

    let response = match app_state.coordinator.signal(client) {
        SignalOutcome::UnknownClient => LiveResponse {
            accepted: false,
            fired: false,
            corroborators: app_state.coordinator.pending_corroborators(),
        },
        SignalOutcome::Held { corroborators, .. } => LiveResponse {
            accepted: true,
            fired: false,
            corroborators,
        },
        // Fan-out keeps running on its own task; the caller does not wait for it.
        SignalOutcome::Fired(_fanout) => LiveResponse {
            accepted: true,
            fired: true,
            corroborators: 0,
        },
    };

    Ok((StatusCode::ACCEPTED, Json(response)))
}
