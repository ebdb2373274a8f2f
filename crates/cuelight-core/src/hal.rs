//! Hardware seams.
//!
//! The engine never touches pins, displays or the radio directly. Runtimes
//! supply implementations of these traits and hand engine output to
//! [`Peripherals::apply`].

use std::{net::Ipv4Addr, sync::Arc, time::Instant};

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::{
    config::CueConfig,
    credentials::WifiCredentials,
    cue::{CueAction, CueEngine},
    error::{DisplayError, RadioError},
    store::{self, CUE_NAMESPACE, Store, cue_text_key},
};

/// Light outputs and button inputs.
///
/// Buttons are wired active-low: `true` means released.
pub trait Board: Send {
    /// Read a button's current level. Never blocks.
    fn read_button(&mut self, index: usize) -> bool;

    /// Drive a light.
    fn set_light(&mut self, index: usize, on: bool);
}

/// Per-channel label display.
pub trait Display: Send {
    /// Draw `text` on `channel`'s display, replacing what was there.
    fn draw(&mut self, channel: usize, text: &str) -> Result<(), DisplayError>;
}

/// Station link state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStatus {
    /// Joined, with the address we were given
    Connected(Ipv4Addr),
    /// Still associating
    Connecting,
    /// Not associated
    Disconnected,
}

/// Station settings applied before joining.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StationOptions {
    /// Hostname announced on the network
    pub hostname: String,
    /// Radio power saving (disabled for latency)
    pub power_save: bool,
    /// Rejoin automatically after a drop
    pub auto_reconnect: bool,
}

/// Wireless radio, limited to connect-or-host.
#[async_trait]
pub trait Radio: Send {
    /// Switch to station mode and start joining. Returns without waiting
    /// for the link to come up.
    async fn join(
        &mut self,
        credentials: &WifiCredentials,
        options: &StationOptions,
    ) -> Result<(), RadioError>;

    /// Current station link state.
    async fn link_status(&mut self) -> LinkStatus;

    /// Drop any station link and host an access point.
    async fn host_access_point(
        &mut self,
        ssid: &str,
        passphrase: &str,
        hostname: &str,
    ) -> Result<Ipv4Addr, RadioError>;
}

/// Executes engine output against real (or simulated) peripherals.
///
/// Display and store failures are logged and swallowed: a dead display or
/// store degrades that subsystem but never stops the engine.
pub struct Peripherals<B, D> {
    board: B,
    display: D,
    store: Arc<dyn Store>,
}

impl<B: Board, D: Display> Peripherals<B, D> {
    /// Bundle peripherals.
    pub fn new(board: B, display: D, store: Arc<dyn Store>) -> Self {
        Self { board, display, store }
    }

    /// Board.
    pub fn board(&self) -> &B {
        &self.board
    }

    /// Board, mutably.
    pub fn board_mut(&mut self) -> &mut B {
        &mut self.board
    }

    /// Display.
    pub fn display(&self) -> &D {
        &self.display
    }

    /// Store shared with the bootstrap.
    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    /// Read every button once.
    pub fn read_levels(&mut self, count: usize) -> Vec<bool> {
        (0..count).map(|index| self.board.read_button(index)).collect()
    }

    /// Seed button observations and labels, build the engine, and put the
    /// hardware in its initial state.
    pub fn boot_engine(&mut self, config: CueConfig, now: Instant) -> CueEngine {
        let levels = self.read_levels(config.channel_count);
        let saved = store::load_cue_texts(self.store.as_ref(), config.channel_count);
        let (engine, actions) = CueEngine::initialize(config, now, &levels, &saved);
        for action in &actions {
            self.apply(action);
        }
        engine
    }

    /// Carry out one engine action.
    ///
    /// [`CueAction::Publish`] is routed by the controller and ignored here.
    pub fn apply(&mut self, action: &CueAction) {
        match action {
            CueAction::SetLight { index, on } => {
                debug!(index, on, "set light");
                self.board.set_light(*index, *on);
            },
            CueAction::Render { index, text } => {
                if let Err(error) = self.display.draw(*index, text) {
                    warn!(index, %error, "display update failed");
                }
            },
            CueAction::PersistText { index, text } => {
                if let Err(error) = self.store.put(CUE_NAMESPACE, &cue_text_key(*index), text) {
                    warn!(index, %error, "failed to persist cue text");
                }
            },
            CueAction::Publish(_) => {},
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, NullStore};

    #[derive(Default)]
    struct FakeBoard {
        levels: Vec<bool>,
        lights: Vec<(usize, bool)>,
    }

    impl Board for FakeBoard {
        fn read_button(&mut self, index: usize) -> bool {
            self.levels.get(index).copied().unwrap_or(true)
        }

        fn set_light(&mut self, index: usize, on: bool) {
            self.lights.push((index, on));
        }
    }

    struct BrokenDisplay;

    impl Display for BrokenDisplay {
        fn draw(&mut self, channel: usize, _text: &str) -> Result<(), DisplayError> {
            Err(DisplayError::NotReady(channel))
        }
    }

    #[test]
    fn boot_loads_saved_labels_and_clears_lights() {
        let store = Arc::new(MemoryStore::new());
        store.put(CUE_NAMESPACE, &cue_text_key(0), "Preset").unwrap();
        let mut peripherals = Peripherals::new(FakeBoard::default(), BrokenDisplay, store);

        let engine = peripherals.boot_engine(CueConfig::default(), Instant::now());

        assert_eq!(engine.get_state(0).text, "Preset");
        assert_eq!(peripherals.board().lights, vec![(0, false), (1, false), (2, false)]);
    }

    #[test]
    fn persist_failure_is_not_fatal() {
        let mut peripherals =
            Peripherals::new(FakeBoard::default(), BrokenDisplay, Arc::new(NullStore));
        peripherals.apply(&CueAction::PersistText { index: 0, text: "x".into() });
        peripherals.apply(&CueAction::Render { index: 0, text: "x".into() });
        peripherals.apply(&CueAction::SetLight { index: 0, on: true });
        assert_eq!(peripherals.board().lights, vec![(0, true)]);
    }

    #[test]
    fn held_button_at_boot_does_not_trigger() {
        let board = FakeBoard { levels: vec![false, true, true], lights: Vec::new() };
        let mut peripherals = Peripherals::new(board, BrokenDisplay, Arc::new(MemoryStore::new()));
        let t0 = Instant::now();
        let mut engine = peripherals.boot_engine(CueConfig::default(), t0);

        let levels = peripherals.read_levels(3);
        let actions = engine.poll(t0 + std::time::Duration::from_secs(1), &levels);
        assert!(actions.is_empty());
    }
}
