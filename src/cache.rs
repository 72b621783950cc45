// Single-flight stats cache shared by the HTTP handlers and the poller.
// At most one upstream fetch is in flight at any instant; every caller that
// arrives during a refresh receives that refresh's outcome.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, watch};
use tokio::time::Instant;

use crate::models::VpsStats;
use crate::solus_repo::FetchError;

/// How long a successful fetch stays fresh.
pub const CACHE_TTL: Duration = Duration::from_secs(60);

/// Upstream source the cache refreshes from: `SolusRepo` in production, fakes
/// in tests. One call is one authenticated fetch; the cache decides when to
/// call and never issues two calls for one refresh cycle.
pub trait StatsSource {
    fn fetch(&self) -> impl Future<Output = Result<VpsStats, FetchError>> + Send;
}

type RefreshOutcome = Result<VpsStats, FetchError>;

struct CacheEntry {
    stats: VpsStats,
    expires_at: Instant,
}

struct CacheState {
    entry: Option<CacheEntry>,
    /// Completion signal of the refresh currently in flight, if any. Callers
    /// that find this set wait on it instead of fetching themselves.
    in_flight: Option<watch::Receiver<Option<RefreshOutcome>>>,
}

struct CacheInner<S> {
    source: S,
    ttl: Duration,
    state: Mutex<CacheState>,
}

/// Shared stats cache. Cheap to clone; all clones see the same entry.
pub struct StatsCache<S> {
    inner: Arc<CacheInner<S>>,
}

impl<S> Clone for StatsCache<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S> StatsCache<S>
where
    S: StatsSource + Send + Sync + 'static,
{
    pub fn new(source: S) -> Self {
        Self::with_ttl(source, CACHE_TTL)
    }

    pub fn with_ttl(source: S, ttl: Duration) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                source,
                ttl,
                state: Mutex::new(CacheState {
                    entry: None,
                    in_flight: None,
                }),
            }),
        }
    }

    /// Returns the cached stats while fresh, otherwise refreshes from the
    /// source. Callers that arrive while a refresh is in flight wait for it
    /// and receive its outcome - the same stats or the same error.
    pub async fn get_stats(&self) -> Result<VpsStats, FetchError> {
        let mut rx = {
            let mut state = self.inner.state.lock().await;
            if let Some(entry) = &state.entry {
                if Instant::now() < entry.expires_at {
                    return Ok(entry.stats.clone());
                }
            }
            if let Some(rx) = state.in_flight.clone() {
                rx
            } else {
                let (tx, rx) = watch::channel(None);
                state.in_flight = Some(rx.clone());
                self.spawn_refresh(tx);
                rx
            }
        };

        match rx.wait_for(|outcome| outcome.is_some()).await {
            Ok(outcome) => (*outcome).clone().unwrap_or_else(|| {
                Err(FetchError::Transport("refresh produced no outcome".into()))
            }),
            Err(_) => Err(FetchError::Transport(
                "refresh task stopped before completing".into(),
            )),
        }
    }

    /// Runs the fetch on its own task so a caller disconnecting mid-refresh
    /// cannot abort a refresh other callers are waiting on.
    fn spawn_refresh(&self, tx: watch::Sender<Option<RefreshOutcome>>) {
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            let outcome = inner.source.fetch().await;
            {
                let mut state = inner.state.lock().await;
                if let Ok(stats) = &outcome {
                    state.entry = Some(CacheEntry {
                        stats: stats.clone(),
                        expires_at: Instant::now() + inner.ttl,
                    });
                }
                // On failure the previous entry keeps its past expiry, so the
                // next caller retries instead of reusing it.
                state.in_flight = None;
            }
            let _ = tx.send(Some(outcome));
        });
    }
}
