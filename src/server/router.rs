use axum::{Json, Router, middleware, response::Response, routing::get};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use super::{
    handlers::{RelayOutcome, handle_relay},
    state::AppState,
};
use crate::{Config, proxy::apply_cors};

/// Create the application router.
///
/// Every path other than `/health` is handled by the relay, so both
/// `/?url=...` and `/proxy/<encoded>` forms reach the same handler.
pub fn create_router(config: &Config) -> anyhow::Result<Router> {
    let state = AppState::new(config)?;

    match &config.external_base_url {
        Some(base) => tracing::info!("Relay URLs will use base {}", base),
        None => tracing::info!("Relay URLs will use each request's Host header"),
    }

    let app = Router::new()
        .route("/health", get(health_check).options(preflight))
        .fallback(handle_relay)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(middleware::map_response(with_cors)),
        )
        .with_state(state);

    Ok(app)
}

/// CORS is permissive on every response, errors and 404s included.
async fn with_cors(mut response: Response) -> Response {
    apply_cors(response.headers_mut());
    response
}

async fn preflight() -> RelayOutcome {
    RelayOutcome::Preflight
}

async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}
