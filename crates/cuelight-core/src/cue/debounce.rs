//! Button debouncing.
//!
//! A raw level change restarts the stability window. The new level is
//! committed only after it has been read unchanged for the whole window, so
//! contact bounce shorter than the window produces a single committed edge.

use std::time::{Duration, Instant};

/// Committed change of a button's level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    /// Level fell (active-low wiring: button pressed)
    Pressed,
    /// Level rose (button released)
    Released,
}

/// Per-channel button state. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonObservation {
    /// Last level read from the pin (`true` = high = released)
    raw_level: bool,
    /// When `raw_level` last changed
    last_transition_at: Instant,
    /// Last committed level
    stable_level: bool,
}

impl ButtonObservation {
    /// Seed from the level read at startup.
    ///
    /// A button already held at boot is taken as the committed state, so it
    /// never produces an edge on its own.
    pub fn new(level: bool, now: Instant) -> Self {
        Self { raw_level: level, last_transition_at: now, stable_level: level }
    }

    /// Last committed level.
    pub fn level(&self) -> bool {
        self.stable_level
    }

    /// Feed one reading. Returns the committed edge, if any.
    pub fn observe(&mut self, level: bool, now: Instant, window: Duration) -> Option<Edge> {
        if level != self.raw_level {
            self.raw_level = level;
            self.last_transition_at = now;
        }

        if self.raw_level == self.stable_level {
            return None;
        }
        if now.saturating_duration_since(self.last_transition_at) < window {
            return None;
        }

        self.stable_level = self.raw_level;
        Some(if self.stable_level { Edge::Released } else { Edge::Pressed })
    }
}
