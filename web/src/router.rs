use crate::controller::{
    health_check_controller, live_controller, registration_controller, subscription_controller,
};
use crate::{params, sse::handler::sse_handler, AppState};
use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use log::*;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::services::ServeDir;

use utoipa::OpenApi;
use utoipa_rapidoc::RapiDoc;

// This is the global definition of our OpenAPI spec. To be a part
// of the rendered spec, a path and schema must be listed here.
#[derive(OpenApi)]
#[openapi(
        info(
            title = "Live Alert API"
        ),
        paths(
            health_check_controller::health_check,
            live_controller::signal,
            registration_controller::register,
            subscription_controller::subscribe,
            subscription_controller::vapid_public_key,
        ),
        components(
            schemas(
                params::live::LiveParams,
                params::live::LiveResponse,
                params::registration::RegisterParams,
                params::registration::RegisterResponse,
                params::subscription::SubscribeParams,
                params::subscription::SubscriptionKeysParams,
                params::subscription::VapidPublicKeyResponse,
            )
        ),
        tags(
            (name = "live_alert", description = "Crowd-corroborated live alerts")
        )
    )]
struct ApiDoc;

pub fn define_routes(app_state: AppState) -> Router {
    let static_dir = app_state.config.static_dir().to_string();
    let cors = cors_layer(&app_state.config.allowed_origins);

    Router::new()
        .merge(health_routes())
        .merge(live_routes(app_state.clone()))
        .merge(registration_routes(app_state.clone()))
        .merge(sse_routes(app_state.clone()))
        .merge(subscription_routes(app_state))
        .merge(RapiDoc::with_openapi("/api-docs/openapi.json", ApiDoc::openapi()).path("/rapidoc"))
        .fallback_service(ServeDir::new(static_dir))
        .layer(cors)
}

fn health_routes() -> Router {
    Router::new().route("/health", get(health_check_controller::health_check))
}

fn live_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/live", post(live_controller::signal))
        .with_state(app_state)
}

fn registration_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/register", post(registration_controller::register))
        .with_state(app_state)
}

fn sse_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/sse", get(sse_handler))
        .with_state(app_state)
}

fn subscription_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/subscribe", post(subscription_controller::subscribe))
        .route(
            "/vapid_public_key",
            get(subscription_controller::vapid_public_key),
        )
        .with_state(app_state)
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    if allowed_origins.iter().any(|origin| origin == "*") {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Ignoring invalid CORS origin {origin}: {e}");
                None
            }
        })
        .collect();

    layer.allow_origin(AllowOrigin::list(origins))
}
