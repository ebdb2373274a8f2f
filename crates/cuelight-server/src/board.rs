//! Host stand-ins for the cue panel.
//!
//! A host has no buttons or lamps. [`VirtualBoard`] reads every button as
//! released and keeps light state in memory, logging changes.
//! [`LogDisplay`] logs labels instead of drawing them.

use cuelight_core::{Board, Display, error::DisplayError};
use tracing::info;

/// In-memory board.
#[derive(Debug)]
pub struct VirtualBoard {
    buttons: Vec<bool>,
    lights: Vec<bool>,
}

impl VirtualBoard {
    /// `count` channels, all released and dark.
    pub fn new(count: usize) -> Self {
        Self { buttons: vec![true; count], lights: vec![false; count] }
    }

    /// Whether a light is on.
    pub fn light(&self, index: usize) -> bool {
        self.lights.get(index).copied().unwrap_or(false)
    }

    #[cfg(test)]
    fn set_button(&mut self, index: usize, level: bool) {
        if let Some(slot) = self.buttons.get_mut(index) {
            *slot = level;
        }
    }
}

impl Board for VirtualBoard {
    fn read_button(&mut self, index: usize) -> bool {
        self.buttons.get(index).copied().unwrap_or(true)
    }

    fn set_light(&mut self, index: usize, on: bool) {
        if let Some(slot) = self.lights.get_mut(index)
            && *slot != on
        {
            *slot = on;
            info!(index, on, "light");
        }
    }
}

/// Display sink that logs labels.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogDisplay;

impl Display for LogDisplay {
    fn draw(&mut self, channel: usize, text: &str) -> Result<(), DisplayError> {
        info!(channel, text, "label");
        Ok(())
    }
}
