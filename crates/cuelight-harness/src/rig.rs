//! Full controller wired to simulated peripherals.
//!
//! ```text
//!   observers ──frames──► Controller ──Hardware──► Peripherals(SimBoard, SimDisplay, Store)
//!       ▲                     │
//!       └──── JSON outbox ◄───┴── Send / Broadcast
//! ```
//!
//! Messages are serialized on the way out and parsed again by
//! [`Rig::take_messages`], so scenarios see exactly what an observer on the
//! wire would.

use std::{collections::BTreeMap, sync::Arc, time::Duration};

use cuelight_core::{
    CommandError, Controller, ControllerAction, CueConfig, Environment, NetworkInfo, ObserverId,
    Peripherals, Store, config::POLL_INTERVAL,
};
use cuelight_proto::{InboundFrame, ServerMessage, decode_server_message};
use tracing::warn;

use crate::{SimBoard, SimDisplay, SimEnv};

/// A booted controller plus everything around it.
pub struct Rig {
    env: SimEnv,
    config: CueConfig,
    network: NetworkInfo,
    controller: Controller,
    peripherals: Peripherals<SimBoard, SimDisplay>,
    outboxes: BTreeMap<ObserverId, Vec<String>>,
    next_observer: ObserverId,
}

impl Rig {
    /// Boot with default settings on a fresh clock.
    pub fn boot(store: Arc<dyn Store>) -> Self {
        Self::with_config(SimEnv::new(), CueConfig::default(), NetworkInfo::OFFLINE, store)
    }

    /// Boot with explicit settings.
    pub fn with_config(
        env: SimEnv,
        config: CueConfig,
        network: NetworkInfo,
        store: Arc<dyn Store>,
    ) -> Self {
        let count = config.channel_count;
        let peripherals = Peripherals::new(SimBoard::new(count), SimDisplay::new(count), store);
        Self::assemble(env, config, network, peripherals)
    }

    fn assemble(
        env: SimEnv,
        config: CueConfig,
        network: NetworkInfo,
        mut peripherals: Peripherals<SimBoard, SimDisplay>,
    ) -> Self {
        let engine = peripherals.boot_engine(config.clone(), env.now());
        Self {
            env,
            config,
            network,
            controller: Controller::new(engine, network),
            peripherals,
            outboxes: BTreeMap::new(),
            next_observer: 1,
        }
    }

    /// Power-cycle: same store and clock, fresh board, displays and
    /// observers.
    pub fn reboot(self) -> Self {
        let store = Arc::clone(self.peripherals.store());
        Self::with_config(self.env, self.config, self.network, store)
    }

    /// Clock.
    pub fn env(&self) -> &SimEnv {
        &self.env
    }

    /// Controller under test.
    pub fn controller(&self) -> &Controller {
        &self.controller
    }

    /// Board.
    pub fn board(&self) -> &SimBoard {
        self.peripherals.board()
    }

    /// Board, for pressing buttons.
    pub fn board_mut(&mut self) -> &mut SimBoard {
        self.peripherals.board_mut()
    }

    /// Displays.
    pub fn display(&self) -> &SimDisplay {
        self.peripherals.display()
    }

    /// Store.
    pub fn store(&self) -> &Arc<dyn Store> {
        self.peripherals.store()
    }

    /// Open a new observer connection.
    pub fn connect(&mut self) -> ObserverId {
        let observer = self.next_observer;
        self.next_observer += 1;
        self.outboxes.insert(observer, Vec::new());
        let actions = self.controller.connect(observer);
        self.execute(actions);
        observer
    }

    /// Close an observer connection.
    pub fn disconnect(&mut self, observer: ObserverId) {
        self.controller.disconnect(observer);
        self.outboxes.remove(&observer);
    }

    /// Text frame from an observer.
    pub fn send(&mut self, observer: ObserverId, payload: &str) {
        self.send_frame(observer, &InboundFrame::text(payload));
    }

    /// Arbitrary frame from an observer.
    pub fn send_frame(&mut self, observer: ObserverId, frame: &InboundFrame) {
        let actions = self.controller.handle_frame(observer, frame, self.env.now());
        self.execute(actions);
    }

    /// Trigger through the request/response surface.
    pub fn trigger(&mut self, cue: Option<i64>, text: Option<&str>) -> Result<(), CommandError> {
        let actions = self.controller.trigger(cue, text, self.env.now())?;
        self.execute(actions);
        Ok(())
    }

    /// Release through the request/response surface.
    pub fn release(&mut self, cue: Option<i64>) -> Result<(), CommandError> {
        let actions = self.controller.release(cue, self.env.now())?;
        self.execute(actions);
        Ok(())
    }

    /// One polling pass at the current time.
    pub fn tick(&mut self) {
        let levels = self.peripherals.read_levels(self.config.channel_count);
        let actions = self.controller.tick(self.env.now(), &levels);
        self.execute(actions);
    }

    /// Jump the clock to `offset` from boot and poll once.
    pub fn tick_at(&mut self, offset: Duration) {
        self.env.advance_to(offset);
        self.tick();
    }

    /// Poll every [`POLL_INTERVAL`] for `duration`.
    pub fn run_for(&mut self, duration: Duration) {
        let mut remaining = duration;
        while !remaining.is_zero() {
            let step = remaining.min(POLL_INTERVAL);
            self.env.advance(step);
            self.tick();
            remaining -= step;
        }
    }

    /// Drain and parse everything sent to `observer` so far.
    pub fn take_messages(&mut self, observer: ObserverId) -> Vec<ServerMessage> {
        self.outboxes
            .get_mut(&observer)
            .map(std::mem::take)
            .unwrap_or_default()
            .iter()
            .filter_map(|raw| match decode_server_message(raw) {
                Ok(message) => Some(message),
                Err(error) => {
                    warn!(%error, raw, "undecodable outbound message");
                    None
                },
            })
            .collect()
    }

    /// Raw JSON waiting for `observer`.
    pub fn raw_outbox(&self, observer: ObserverId) -> &[String] {
        self.outboxes.get(&observer).map(Vec::as_slice).unwrap_or_default()
    }

    fn execute(&mut self, actions: Vec<ControllerAction>) {
        for action in actions {
            match action {
                ControllerAction::Hardware(effect) => self.peripherals.apply(&effect),
                ControllerAction::Send { observer, message } => self.deliver(observer, &message),
                ControllerAction::Broadcast(message) => {
                    let observers: Vec<_> = self.controller.observers().collect();
                    for observer in observers {
                        self.deliver(observer, &message);
                    }
                },
            }
        }
    }

    fn deliver(&mut self, observer: ObserverId, message: &ServerMessage) {
        let Some(outbox) = self.outboxes.get_mut(&observer) else {
            return;
        };
        match message.to_json() {
            Ok(json) => outbox.push(json),
            Err(error) => warn!(observer, %error, "failed to encode message"),
        }
    }
}
