//! Virtual clock.
//!
//! Time stands still until a test advances it or something sleeps; sleeping
//! advances the clock by exactly the requested duration and returns at once.

use std::{
    future::Future,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::{Duration, Instant},
};

use cuelight_core::Environment;

/// Simulated environment. Clones share one clock.
#[derive(Debug, Clone)]
pub struct SimEnv {
    origin: Instant,
    offset_nanos: Arc<AtomicU64>,
}

impl SimEnv {
    /// Clock at offset zero.
    pub fn new() -> Self {
        Self { origin: Instant::now(), offset_nanos: Arc::new(AtomicU64::new(0)) }
    }

    /// Instant the clock started at.
    pub fn origin(&self) -> Instant {
        self.origin
    }

    /// Time elapsed on this clock.
    pub fn elapsed(&self) -> Duration {
        Duration::from_nanos(self.offset_nanos.load(Ordering::SeqCst))
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        let nanos = u64::try_from(by.as_nanos()).unwrap_or(u64::MAX);
        self.offset_nanos.fetch_add(nanos, Ordering::SeqCst);
    }

    /// Move the clock to `offset` from the origin. Never moves backwards.
    pub fn advance_to(&self, offset: Duration) {
        let nanos = u64::try_from(offset.as_nanos()).unwrap_or(u64::MAX);
        self.offset_nanos.fetch_max(nanos, Ordering::SeqCst);
    }
}

impl Default for SimEnv {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment for SimEnv {
    fn now(&self) -> Instant {
        self.origin + self.elapsed()
    }

    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send {
        let clock = self.clone();
        async move { clock.advance(duration) }
    }
}
