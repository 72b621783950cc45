// GET handlers: version, status, metrics

use std::fmt::Write;

use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};

use super::AppState;
use crate::cache::StatsSource;
use crate::models::{VpsStats, VpsStatsDisplay};
use crate::version::{NAME, VERSION};

/// GET /version — returns service name and version (from Cargo.toml at build time).
pub(super) async fn version_handler() -> impl IntoResponse {
    axum::Json(serde_json::json!({
        "name": NAME,
        "version": VERSION,
    }))
}

/// GET /status — cached VPS stats as JSON, or 500 with an error description.
/// No retry and no caching here; both belong to the cache.
pub(super) async fn status_handler<S>(State(state): State<AppState<S>>) -> Response
where
    S: StatsSource + Send + Sync + 'static,
{
    match state.cache.get_stats().await {
        Ok(stats) => axum::Json(VpsStatsDisplay::from(&stats)).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            axum::Json(serde_json::json!({ "error": e.to_string() })),
        )
            .into_response(),
    }
}

/// GET /metrics — Prometheus text exposition of the raw byte gauges.
pub(super) async fn metrics_handler<S>(State(state): State<AppState<S>>) -> Response
where
    S: StatsSource + Send + Sync + 'static,
{
    match state.cache.get_stats().await {
        Ok(stats) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            render_metrics(&stats),
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            [(header::CONTENT_TYPE, "text/plain")],
            format!("# ERROR: {e}\n"),
        )
            .into_response(),
    }
}

/// Render the gauge set for one snapshot. Exposed for unit tests.
pub(crate) fn render_metrics(stats: &VpsStats) -> String {
    let mut out = String::new();
    for (name, usage) in [
        ("storage", &stats.disk),
        ("bandwidth", &stats.bandwidth),
        ("memory", &stats.memory),
    ] {
        let _ = writeln!(out, "# HELP vps_{name}_total_bytes Total {name} in bytes");
        let _ = writeln!(out, "# TYPE vps_{name}_total_bytes gauge");
        let _ = writeln!(out, "vps_{name}_total_bytes {}", usage.total_bytes);
        let _ = writeln!(out, "# HELP vps_{name}_used_bytes Used {name} in bytes");
        let _ = writeln!(out, "# TYPE vps_{name}_used_bytes gauge");
        let _ = writeln!(out, "vps_{name}_used_bytes {}", usage.used_bytes);
        let _ = writeln!(out, "# HELP vps_{name}_usage_percent Percentage of {name} used");
        let _ = writeln!(out, "# TYPE vps_{name}_usage_percent gauge");
        let _ = writeln!(out, "vps_{name}_usage_percent {}", usage.usage_percent());
    }
    out
}
