//! Per-channel cue state.

use std::time::{Duration, Instant};

use cuelight_proto::{CueEvent, CueSummary};

/// One physical cue: a light, a button and a label display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CueChannel {
    pub(crate) index: usize,
    pub(crate) text: String,
    pub(crate) active: bool,
    pub(crate) last_change_at: Instant,
}

impl CueChannel {
    /// Stable channel index.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Current label. Never empty.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Whether the light is on.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Time of the last on/off transition.
    pub fn last_change_at(&self) -> Instant {
        self.last_change_at
    }

    pub(crate) fn event(&self, epoch: Instant) -> CueEvent {
        CueEvent {
            index: self.index,
            text: self.text.clone(),
            active: self.active,
            updated_at: millis_since(epoch, self.last_change_at),
        }
    }

    pub(crate) fn summary(&self) -> CueSummary {
        CueSummary { index: self.index, text: self.text.clone(), active: self.active }
    }
}

/// Copy of a channel's state handed out by [`crate::CueEngine::get_state`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CueSnapshot {
    /// Requested index
    pub index: usize,
    /// Label (empty only for the invalid sentinel)
    pub text: String,
    /// Whether the light is on
    pub active: bool,
    /// Last on/off transition; `None` only for the invalid sentinel
    pub last_change_at: Option<Instant>,
}

impl CueSnapshot {
    /// Sentinel returned for an index outside the channel range.
    pub fn invalid(index: usize) -> Self {
        Self { index, text: String::new(), active: false, last_change_at: None }
    }

    /// False for the out-of-range sentinel.
    pub fn is_valid(&self) -> bool {
        self.last_change_at.is_some()
    }
}

impl From<&CueChannel> for CueSnapshot {
    fn from(channel: &CueChannel) -> Self {
        Self {
            index: channel.index,
            text: channel.text.clone(),
            active: channel.active,
            last_change_at: Some(channel.last_change_at),
        }
    }
}

pub(crate) fn millis_since(epoch: Instant, at: Instant) -> u64 {
    let elapsed: Duration = at.saturating_duration_since(epoch);
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}
