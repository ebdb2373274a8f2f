//! Environment abstraction.
//!
//! Production reads the system clock and sleeps on tokio timers; the
//! simulation harness substitutes a virtual clock that advances only when
//! something sleeps.

use std::{
    future::Future,
    time::{Duration, Instant},
};

/// Source of time for drivers that must wait.
///
/// State machines never hold an `Environment`; their drivers read `now()`
/// and pass it in.
pub trait Environment: Clone + Send + Sync + 'static {
    /// Current monotonic time.
    fn now(&self) -> Instant;

    /// Wait for `duration`.
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send;
}
