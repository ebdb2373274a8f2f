//! Synchronization protocol mediation.
//!
//! The [`Controller`] owns the [`CueEngine`] and the set of connected
//! observers. Every inbound command, HTTP request and poll tick goes through
//! it, on one task, so a single channel's state is never interleaved and
//! broadcasts leave in the order changes were applied.
//!
//! # Delivery rules
//!
//! - A new observer gets an `init` message with every cue and the network
//!   status.
//! - Every on/off transition, whoever caused it, is broadcast as a `cue`
//!   event to all observers, including the one that asked for it.
//! - Acks and errors go only to the requesting observer.
//! - With no observers connected, broadcasts are dropped.

use std::{collections::BTreeSet, time::Instant};

use cuelight_proto::{Ack, Command, CueList, InboundFrame, ServerMessage, decode_frame};
use thiserror::Error;
use tracing::{debug, info};

use crate::{
    bootstrap::NetworkInfo,
    cue::{CueAction, CueEngine},
};

/// Identifier the runtime assigns to each duplex connection.
pub type ObserverId = u64;

/// Command rejected after decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CommandError {
    /// `cue` missing, negative, or past the last channel
    #[error("invalid cue index")]
    InvalidCueIndex,
}

/// Effects requested by the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerAction {
    /// Engine hardware effect (never [`CueAction::Publish`])
    Hardware(CueAction),

    /// Deliver to one observer
    Send {
        /// Recipient
        observer: ObserverId,
        /// Message
        message: ServerMessage,
    },

    /// Deliver to every connected observer
    Broadcast(ServerMessage),
}

/// Owner of all cue state and the observer registry.
#[derive(Debug, Clone)]
pub struct Controller {
    engine: CueEngine,
    observers: BTreeSet<ObserverId>,
    network: NetworkInfo,
}

impl Controller {
    /// Wrap an initialized engine.
    pub fn new(engine: CueEngine, network: NetworkInfo) -> Self {
        Self { engine, observers: BTreeSet::new(), network }
    }

    /// Read-only view of the engine.
    pub fn engine(&self) -> &CueEngine {
        &self.engine
    }

    /// Network status reported in `init`.
    pub fn network(&self) -> NetworkInfo {
        self.network
    }

    /// Connected observers.
    pub fn observers(&self) -> impl Iterator<Item = ObserverId> + '_ {
        self.observers.iter().copied()
    }

    /// Number of connected observers.
    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    /// Register an observer and send it the `init` snapshot.
    pub fn connect(&mut self, observer: ObserverId) -> Vec<ControllerAction> {
        if self.observers.insert(observer) {
            info!(observer, "observer connected");
        }
        let message = ServerMessage::Init {
            cues: self.engine.summaries(),
            wifi: self.network.status(),
        };
        vec![ControllerAction::Send { observer, message }]
    }

    /// Forget an observer. It receives nothing further.
    pub fn disconnect(&mut self, observer: ObserverId) {
        if self.observers.remove(&observer) {
            info!(observer, "observer disconnected");
        }
    }

    /// Handle a frame from an observer.
    ///
    /// Decoding failures are answered with a `parse` ack to that observer
    /// only and change nothing.
    pub fn handle_frame(
        &mut self,
        observer: ObserverId,
        frame: &InboundFrame,
        now: Instant,
    ) -> Vec<ControllerAction> {
        match decode_frame(frame) {
            Ok(command) => self.handle_command(observer, &command, now),
            Err(error) => {
                debug!(observer, %error, "rejected frame");
                vec![send_ack(observer, Ack::error("parse", error.detail()))]
            },
        }
    }

    /// Apply a decoded command from an observer.
    pub fn handle_command(
        &mut self,
        observer: ObserverId,
        command: &Command,
        now: Instant,
    ) -> Vec<ControllerAction> {
        let action = command.action();
        let result = match command {
            Command::Trigger { cue, text } => self.trigger(*cue, text.as_deref(), now),
            Command::Release { cue } => self.release(*cue, now),
            Command::Rename { cue, text } => self.rename(*cue, text.as_deref().unwrap_or("")),
            Command::Ping => Ok(Vec::new()),
        };

        match result {
            Ok(mut actions) => {
                let ack = send_ack(observer, Ack::ok(action));
                // Rename acks before its broadcast; state changes broadcast first.
                if matches!(command, Command::Rename { .. }) {
                    actions.insert(0, ack);
                } else {
                    actions.push(ack);
                }
                actions
            },
            Err(error) => {
                debug!(observer, action, %error, "command rejected");
                vec![send_ack(observer, Ack::error(action, error.to_string()))]
            },
        }
    }

    /// Trigger a cue, optionally relabelling it first. The label is
    /// persisted.
    ///
    /// If the cue was already active, the trigger itself publishes nothing,
    /// so a changed label is broadcast explicitly.
    pub fn trigger(
        &mut self,
        cue: Option<i64>,
        text: Option<&str>,
        now: Instant,
    ) -> Result<Vec<ControllerAction>, CommandError> {
        let index = self.resolve(cue)?;
        let mut effects = Vec::new();
        if let Some(text) = text {
            effects.extend(self.engine.set_text(index, text, true));
        }
        let relabelled = effects.iter().any(|a| matches!(a, CueAction::PersistText { .. }));
        effects.extend(self.engine.trigger(index, now));

        let published = effects.iter().any(|a| matches!(a, CueAction::Publish(_)));
        let mut actions = self.route(effects);
        if relabelled && !published {
            actions.extend(self.publish_cue(index));
        }
        Ok(actions)
    }

    /// Release a cue.
    pub fn release(
        &mut self,
        cue: Option<i64>,
        now: Instant,
    ) -> Result<Vec<ControllerAction>, CommandError> {
        let index = self.resolve(cue)?;
        let effects = self.engine.release(index, now);
        Ok(self.route(effects))
    }

    /// Relabel a cue (empty restores the default), persist it, and broadcast
    /// the cue's state.
    pub fn rename(
        &mut self,
        cue: Option<i64>,
        text: &str,
    ) -> Result<Vec<ControllerAction>, CommandError> {
        let index = self.resolve(cue)?;
        let effects = self.engine.set_text(index, text, true);
        let mut actions = self.route(effects);
        actions.extend(self.publish_cue(index));
        Ok(actions)
    }

    /// One polling pass with fresh button readings.
    pub fn tick(&mut self, now: Instant, levels: &[bool]) -> Vec<ControllerAction> {
        let effects = self.engine.poll(now, levels);
        self.route(effects)
    }

    /// Broadcast every cue at once, for resynchronization.
    pub fn broadcast_snapshot(&self) -> Vec<ControllerAction> {
        self.broadcast(ServerMessage::Snapshot { cues: self.engine.events() })
    }

    /// Cue listing for the request/response surface.
    pub fn list(&self) -> CueList {
        let cues = self.engine.summaries();
        CueList { count: cues.len(), cues }
    }

    fn resolve(&self, cue: Option<i64>) -> Result<usize, CommandError> {
        cue.and_then(|raw| usize::try_from(raw).ok())
            .filter(|&index| index < self.engine.len())
            .ok_or(CommandError::InvalidCueIndex)
    }

    fn publish_cue(&self, index: usize) -> Vec<ControllerAction> {
        self.engine
            .event(index)
            .map(|event| self.broadcast(ServerMessage::Cue(event)))
            .unwrap_or_default()
    }

    fn broadcast(&self, message: ServerMessage) -> Vec<ControllerAction> {
        if self.observers.is_empty() {
            return Vec::new();
        }
        vec![ControllerAction::Broadcast(message)]
    }

    fn route(&self, effects: Vec<CueAction>) -> Vec<ControllerAction> {
        let mut actions = Vec::with_capacity(effects.len());
        for effect in effects {
            match effect {
                CueAction::Publish(event) => {
                    actions.extend(self.broadcast(ServerMessage::Cue(event)));
                },
                other => actions.push(ControllerAction::Hardware(other)),
            }
        }
        actions
    }
}

fn send_ack(observer: ObserverId, ack: Ack) -> ControllerAction {
    ControllerAction::Send { observer, message: ServerMessage::Ack(ack) }
}
