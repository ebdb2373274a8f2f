//! Simulated board and displays.

use std::{collections::BTreeSet, time::Duration};

use cuelight_core::{Board, Display, error::DisplayError};
use rand::Rng;
use rand_chacha::ChaCha8Rng;

/// Board with scriptable button levels and observable lights.
#[derive(Debug, Clone)]
pub struct SimBoard {
    levels: Vec<bool>,
    lights: Vec<bool>,
    light_writes: Vec<(usize, bool)>,
}

impl SimBoard {
    /// `count` channels, every button released, every light off.
    pub fn new(count: usize) -> Self {
        Self { levels: vec![true; count], lights: vec![false; count], light_writes: Vec::new() }
    }

    /// Hold a button down (drive the pin low).
    pub fn press(&mut self, index: usize) {
        self.set_level(index, false);
    }

    /// Let a button go (pin high).
    pub fn release(&mut self, index: usize) {
        self.set_level(index, true);
    }

    /// Set a pin level directly. Out-of-range indices are ignored.
    pub fn set_level(&mut self, index: usize, level: bool) {
        if let Some(slot) = self.levels.get_mut(index) {
            *slot = level;
        }
    }

    /// Whether a light is on.
    pub fn light(&self, index: usize) -> bool {
        self.lights.get(index).copied().unwrap_or(false)
    }

    /// Every light write in order.
    pub fn light_writes(&self) -> &[(usize, bool)] {
        &self.light_writes
    }
}

impl Board for SimBoard {
    fn read_button(&mut self, index: usize) -> bool {
        self.levels.get(index).copied().unwrap_or(true)
    }

    fn set_light(&mut self, index: usize, on: bool) {
        if let Some(slot) = self.lights.get_mut(index) {
            *slot = on;
        }
        self.light_writes.push((index, on));
    }
}

/// Displays that remember what they show. Individual channels can be
/// marked broken.
#[derive(Debug, Clone, Default)]
pub struct SimDisplay {
    shown: Vec<Option<String>>,
    broken: BTreeSet<usize>,
    draws: usize,
}

impl SimDisplay {
    /// `count` blank displays.
    pub fn new(count: usize) -> Self {
        Self { shown: vec![None; count], broken: BTreeSet::new(), draws: 0 }
    }

    /// Make one channel's display fail every draw.
    pub fn break_channel(&mut self, index: usize) {
        self.broken.insert(index);
    }

    /// Text currently shown on a channel.
    pub fn shown(&self, index: usize) -> Option<&str> {
        self.shown.get(index).and_then(Option::as_deref)
    }

    /// Successful draws so far.
    pub fn draws(&self) -> usize {
        self.draws
    }
}

impl Display for SimDisplay {
    fn draw(&mut self, channel: usize, text: &str) -> Result<(), DisplayError> {
        if self.broken.contains(&channel) {
            return Err(DisplayError::NotReady(channel));
        }
        let slot = self.shown.get_mut(channel).ok_or(DisplayError::NotReady(channel))?;
        *slot = Some(text.to_string());
        self.draws += 1;
        Ok(())
    }
}

/// Random contact bounce: a sequence of `(offset, level)` flips that starts
/// with `target`, toggles at random gaps strictly shorter than `max_gap`,
/// and always ends on `target`.
pub fn bounce_burst(
    rng: &mut ChaCha8Rng,
    target: bool,
    flips: usize,
    max_gap: Duration,
) -> Vec<(Duration, bool)> {
    let max_ms = u64::try_from(max_gap.as_millis()).unwrap_or(u64::MAX).max(2);
    let mut offset = Duration::ZERO;
    let mut level = target;
    let mut script = vec![(offset, level)];
    // Even number of further flips so the burst settles on `target`.
    for _ in 0..(flips / 2) * 2 {
        offset += Duration::from_millis(rng.gen_range(1..max_ms));
        level = !level;
        script.push((offset, level));
    }
    script
}
