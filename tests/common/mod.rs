// Shared test helpers: canned stats and a scriptable fake upstream source
#![allow(dead_code)] // not every test binary uses every helper

use std::collections::VecDeque;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use racknerd_status::cache::StatsSource;
use racknerd_status::models::{ResourceUsage, VpsStats};
use racknerd_status::solus_repo::FetchError;

pub fn stats_fixture(fetched_at: i64) -> VpsStats {
    VpsStats {
        hostname: "vps.example.net".into(),
        ip: "192.0.2.10".into(),
        disk: ResourceUsage {
            total_bytes: 21_474_836_480,
            used_bytes: 10_737_418_240,
        },
        bandwidth: ResourceUsage {
            total_bytes: 4_000_000_000_000,
            used_bytes: 1_000_000_000_000,
        },
        memory: ResourceUsage {
            total_bytes: 1_073_741_824,
            used_bytes: 536_870_912,
        },
        fetched_at,
    }
}

/// Fake upstream: counts calls, optionally delays, and replays scripted
/// outcomes before falling back to fixtures with a distinct `fetched_at`
/// per call (call n yields `stats_fixture(n)`, 1-based).
pub struct FakeSource {
    pub calls: Arc<AtomicUsize>,
    delay: Duration,
    script: Mutex<VecDeque<Result<VpsStats, FetchError>>>,
}

impl FakeSource {
    pub fn new() -> Self {
        Self {
            calls: Arc::new(AtomicUsize::new(0)),
            delay: Duration::ZERO,
            script: Mutex::new(VecDeque::new()),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_script(
        self,
        outcomes: impl IntoIterator<Item = Result<VpsStats, FetchError>>,
    ) -> Self {
        self.script.lock().unwrap().extend(outcomes);
        self
    }
}

impl StatsSource for FakeSource {
    fn fetch(&self) -> impl Future<Output = Result<VpsStats, FetchError>> + Send {
        async move {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            let scripted = self.script.lock().unwrap().pop_front();
            scripted.unwrap_or_else(|| Ok(stats_fixture(n as i64)))
        }
    }
}
