use anyhow::Result;
use racknerd_status::*;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .init();

    let app_config = config::AppConfig::load()?;
    tracing::info!(
        poll_enabled = app_config.poll.enabled,
        poll_interval_minutes = app_config.poll.interval_minutes,
        "Configuration loaded"
    );

    let solus_repo = solus_repo::SolusRepo::new(app_config.credentials.clone())?;
    let stats_cache = cache::StatsCache::new(solus_repo);

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    let poller_handle = if app_config.poll.enabled {
        Some(poller::spawn(
            poller::PollerDeps {
                cache: stats_cache.clone(),
                shutdown_rx,
            },
            poller::PollerConfig {
                interval: Duration::from_secs(app_config.poll.interval_minutes * 60),
            },
        ))
    } else {
        None
    };

    let app = routes::app(stats_cache);
    let addr = format!("{}:{}", config::DEFAULT_HOST, config::DEFAULT_PORT);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on http://{}", addr);

    let in_container = std::path::Path::new("/.dockerenv").exists()
        || std::env::var("CONTAINER").as_deref() == Ok("1");

    if in_container {
        // In Docker: run server until error or SIGTERM (no signal handler; avoids immediate exit)
        axum::serve(listener, app).await?;
    } else {
        tokio::select! {
            result = axum::serve(listener, app) => {
                result?;
            }
            _ = async {
                #[cfg(unix)]
                {
                    let mut sigterm = match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                        Ok(s) => s,
                        Err(_) => {
                            let _ = tokio::signal::ctrl_c().await;
                            return;
                        }
                    };
                    tokio::select! {
                        _ = tokio::signal::ctrl_c() => {}
                        _ = sigterm.recv() => {}
                    }
                }
                #[cfg(not(unix))]
                {
                    tokio::signal::ctrl_c().await
                }
            } => {
                tracing::info!("Received shutdown signal");
                let _ = shutdown_tx.send(());
                if let Some(handle) = poller_handle {
                    let _ = handle.await;
                }
            }
        }
    }

    Ok(())
}
