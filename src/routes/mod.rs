// HTTP routes

mod http;

use axum::{Router, routing::get};
use tower_http::cors::{Any, CorsLayer};

use crate::cache::{StatsCache, StatsSource};

pub(crate) struct AppState<S> {
    pub(crate) cache: StatsCache<S>,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            cache: self.cache.clone(),
        }
    }
}

pub fn app<S>(cache: StatsCache<S>) -> Router
where
    S: StatsSource + Send + Sync + 'static,
{
    let state = AppState { cache };
    Router::new()
        .route("/", get(|| async { "RackNerd VPS status proxy" })) // GET /
        .route("/version", get(http::version_handler)) // GET /version
        .route("/status", get(http::status_handler::<S>)) // GET /status
        .route("/metrics", get(http::metrics_handler::<S>)) // GET /metrics
        .layer(CorsLayer::new().allow_origin(Any))
        .with_state(state)
}
