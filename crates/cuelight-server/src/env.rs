//! Wall-clock environment.

use std::{
    future::Future,
    time::{Duration, Instant},
};

use cuelight_core::Environment;

/// Real time backed by tokio.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemEnv;

impl Environment for SystemEnv {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send {
        tokio::time::sleep(duration)
    }
}
