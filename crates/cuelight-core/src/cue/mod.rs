//! Cue State Engine.
//!
//! Owns every channel's label, on/off state and button observation. All
//! operations are total over `usize`: an index outside the channel range is
//! silently ignored (or answered with [`CueSnapshot::invalid`]). Turning an
//! out-of-range index into an error for a remote caller is the
//! [`crate::Controller`]'s job.
//!
//! # State Machine
//!
//! ```text
//!              trigger / debounced press
//!  ┌──────────┐ ───────────────────────> ┌────────┐
//!  │ Inactive │                          │ Active │
//!  └──────────┘ <─────────────────────── └────────┘
//!      release / debounced release / auto-release
//! ```
//!
//! Every transition emits [`CueAction::Publish`]. Redundant calls (trigger
//! while active, release while inactive) change nothing and publish nothing;
//! in particular a redundant trigger does not restart the auto-release
//! window.

mod channel;
mod debounce;

use std::time::Instant;

pub use channel::{CueChannel, CueSnapshot};
use cuelight_proto::{CueEvent, CueSummary};
pub use debounce::{ButtonObservation, Edge};
use tracing::debug;

use crate::config::CueConfig;

/// Effects requested by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CueAction {
    /// Energize or de-energize a light
    SetLight {
        /// Channel index
        index: usize,
        /// Whether the light should be on
        on: bool,
    },

    /// Draw a label on a channel's display
    Render {
        /// Channel index
        index: usize,
        /// Label to draw
        text: String,
    },

    /// Write a label through to the store
    PersistText {
        /// Channel index
        index: usize,
        /// Label to persist
        text: String,
    },

    /// Tell observers about an on/off transition
    Publish(CueEvent),
}

/// The cue state engine.
#[derive(Debug, Clone)]
pub struct CueEngine {
    config: CueConfig,
    channels: Vec<CueChannel>,
    buttons: Vec<ButtonObservation>,
    /// Reference point for `updatedAt` timestamps
    epoch: Instant,
}

impl CueEngine {
    /// Build the engine from startup readings.
    ///
    /// `levels` are the button levels read right now (missing entries read
    /// as released); `saved_texts` are labels loaded from the store (missing
    /// or empty entries fall back to defaults). Returns the actions that put
    /// the hardware in its initial state: every light off, every label drawn.
    pub fn initialize(
        config: CueConfig,
        now: Instant,
        levels: &[bool],
        saved_texts: &[Option<String>],
    ) -> (Self, Vec<CueAction>) {
        let count = config.channel_count;
        let mut channels = Vec::with_capacity(count);
        let mut buttons = Vec::with_capacity(count);
        let mut actions = Vec::with_capacity(count * 2);

        for index in 0..count {
            let text = saved_texts
                .get(index)
                .cloned()
                .flatten()
                .filter(|text| !text.is_empty())
                .unwrap_or_else(|| config.default_text(index));
            let level = levels.get(index).copied().unwrap_or(true);

            actions.push(CueAction::SetLight { index, on: false });
            actions.push(CueAction::Render { index, text: text.clone() });

            channels.push(CueChannel { index, text, active: false, last_change_at: now });
            buttons.push(ButtonObservation::new(level, now));
        }

        (Self { config, channels, buttons, epoch: now }, actions)
    }

    /// Number of channels.
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    /// True if the engine has no channels.
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Engine configuration.
    pub fn config(&self) -> &CueConfig {
        &self.config
    }

    /// Channel by index.
    pub fn channel(&self, index: usize) -> Option<&CueChannel> {
        self.channels.get(index)
    }

    /// One polling pass.
    ///
    /// Feeds each channel's button level through its debouncer, then
    /// releases any active channel whose auto-release window has run out.
    /// Call at a fixed short interval; auto-release then fires within one
    /// interval of its deadline.
    pub fn poll(&mut self, now: Instant, levels: &[bool]) -> Vec<CueAction> {
        let mut actions = Vec::new();
        let window = self.config.debounce_window;

        for index in 0..self.channels.len() {
            let edge = match (levels.get(index), self.buttons.get_mut(index)) {
                (Some(&level), Some(button)) => button.observe(level, now, window),
                _ => None,
            };
            match edge {
                Some(Edge::Pressed) => {
                    debug!(index, "button pressed");
                    actions.extend(self.trigger(index, now));
                },
                Some(Edge::Released) => {
                    debug!(index, "button released");
                    actions.extend(self.release(index, now));
                },
                None => {},
            }

            if self.release_due(index, now) {
                debug!(index, "auto-release");
                actions.extend(self.release(index, now));
            }
        }

        actions
    }

    fn release_due(&self, index: usize, now: Instant) -> bool {
        let window = self.config.auto_release_window;
        self.channels.get(index).is_some_and(|channel| {
            channel.active
                && !window.is_zero()
                && now.saturating_duration_since(channel.last_change_at) >= window
        })
    }

    /// Light a cue.
    ///
    /// Always redraws the label. Only an actual Inactive → Active transition
    /// energizes the light, stamps `last_change_at` and publishes.
    pub fn trigger(&mut self, index: usize, now: Instant) -> Vec<CueAction> {
        let epoch = self.epoch;
        let Some(channel) = self.channels.get_mut(index) else {
            return Vec::new();
        };

        let mut actions = vec![CueAction::Render { index, text: channel.text.clone() }];
        if channel.active {
            return actions;
        }

        channel.active = true;
        channel.last_change_at = now;
        actions.push(CueAction::SetLight { index, on: true });
        actions.push(CueAction::Publish(channel.event(epoch)));
        actions
    }

    /// Turn a cue off. No-op unless the cue is active.
    pub fn release(&mut self, index: usize, now: Instant) -> Vec<CueAction> {
        let epoch = self.epoch;
        let Some(channel) = self.channels.get_mut(index) else {
            return Vec::new();
        };
        if !channel.active {
            return Vec::new();
        }

        channel.active = false;
        channel.last_change_at = now;
        vec![CueAction::SetLight { index, on: false }, CueAction::Publish(channel.event(epoch))]
    }

    /// Relabel a cue. An empty `text` restores the default label.
    ///
    /// Redraws the display. With `persist`, the label is written through,
    /// but only when it actually changed. Publishes nothing; callers that
    /// want observers to see the new label publish [`Self::event`] themselves.
    pub fn set_text(&mut self, index: usize, text: &str, persist: bool) -> Vec<CueAction> {
        let default = self.config.default_text(index);
        let Some(channel) = self.channels.get_mut(index) else {
            return Vec::new();
        };

        let text = if text.is_empty() { default } else { text.to_string() };
        let changed = channel.text != text;
        channel.text = text;

        let mut actions = vec![CueAction::Render { index, text: channel.text.clone() }];
        if persist && changed {
            actions.push(CueAction::PersistText { index, text: channel.text.clone() });
        }
        actions
    }

    /// Copy of one channel's state, or [`CueSnapshot::invalid`].
    pub fn get_state(&self, index: usize) -> CueSnapshot {
        self.channels.get(index).map_or_else(|| CueSnapshot::invalid(index), CueSnapshot::from)
    }

    /// Wire event for one channel.
    pub fn event(&self, index: usize) -> Option<CueEvent> {
        self.channels.get(index).map(|channel| channel.event(self.epoch))
    }

    /// Wire events for every channel in index order.
    pub fn events(&self) -> Vec<CueEvent> {
        self.channels.iter().map(|channel| channel.event(self.epoch)).collect()
    }

    /// Summaries for every channel in index order.
    pub fn summaries(&self) -> Vec<CueSummary> {
        self.channels.iter().map(CueChannel::summary).collect()
    }
}
