// Background cache-warming poller, started only when enabled in settings.

use std::time::Duration;

use tokio::time::interval;

use crate::cache::{StatsCache, StatsSource};

/// Cache handle and shutdown signal for the poller.
pub struct PollerDeps<S> {
    pub cache: StatsCache<S>,
    pub shutdown_rx: tokio::sync::oneshot::Receiver<()>,
}

/// Poller timing config.
pub struct PollerConfig {
    pub interval: Duration,
}

/// Spawns the polling loop: an immediate refresh, then one per interval.
/// Fetch errors are logged and swallowed; a failed cycle never stops the loop.
pub fn spawn<S>(deps: PollerDeps<S>, config: PollerConfig) -> tokio::task::JoinHandle<()>
where
    S: StatsSource + Send + Sync + 'static,
{
    let PollerDeps {
        cache,
        mut shutdown_rx,
    } = deps;

    tokio::spawn(async move {
        let mut tick = interval(config.interval);
        tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = tick.tick() => {
                    match cache.get_stats().await {
                        Ok(stats) => tracing::debug!(
                            hostname = %stats.hostname,
                            fetched_at = stats.fetched_at,
                            operation = "poll_refresh",
                            "cache refreshed"
                        ),
                        Err(e) => tracing::warn!(
                            error = %e,
                            operation = "poll_refresh",
                            "poll refresh failed"
                        ),
                    }
                }
                _ = &mut shutdown_rx => {
                    tracing::debug!("Poller shutting down");
                    break;
                }
            }
        }
    })
}
