//! Configuration API Routes

use super::handlers::*;
use axum::{routing::get, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Configuration API router
pub struct ConfigApi;

impl ConfigApi {
    /// Create the configuration API router
    pub fn create_router(state: AppState, expose_metrics: bool) -> Router {
        let mut router = Router::new()
            .route("/config/:project/:environment", get(get_environment))
            .route(
                "/config/:project/:environment/:key",
                get(get_value).put(put_value),
            )
            .route("/health", get(health_check));

        if expose_metrics {
            router = router.route("/metrics", get(export_metrics));
        }

        router
            .with_state(state)
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive())
    }
}
