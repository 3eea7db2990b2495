pub mod cors;
pub mod error;
pub mod routes;
pub mod state;
pub mod telemetry;

use axum::Router;
use tower_http::trace::TraceLayer;

pub use cors::OriginPolicy;
pub use error::ApiError;
pub use state::AppState;

/// Full application: routes, request tracing and CORS, bound to `state`.
pub fn app(state: AppState, origins: OriginPolicy) -> Router {
    routes::api_router()
        .layer(TraceLayer::new_for_http())
        .layer(cors::cors_layer(origins))
        .with_state(state)
}
