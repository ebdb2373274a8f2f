//! Single-owner controller task.
//!
//! The [`Runtime`] owns the [`Controller`] and the peripherals and is the
//! only code that mutates cue state. HTTP handlers and WebSocket sessions
//! send it [`Request`]s through a cloneable [`Handle`]; the task applies
//! them one at a time, in arrival order, interleaved with button polls.
//!
//! ```text
//!   Handle ──Request──► mpsc ──► Runtime::run ◄── interval(poll)
//!                                   │
//!                    ┌──────────────┼──────────────┐
//!                    ▼              ▼              ▼
//!               Peripherals    outbox(obs 1)   outbox(obs 2) ...
//! ```
//!
//! Outboxes are bounded. An observer whose outbox is full is disconnected
//! on the spot rather than stalling the task.

use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use cuelight_core::{
    Board, CommandError, Controller, ControllerAction, CueConfig, Display, Environment,
    NetworkInfo, ObserverId, Peripherals,
};
use cuelight_proto::{CueList, InboundFrame, ServerMessage};
use tokio::{
    sync::{mpsc, oneshot},
    time::MissedTickBehavior,
};
use tracing::{debug, info, warn};

/// Messages queued per observer before it counts as stalled.
pub const OUTBOX_CAPACITY: usize = 32;

/// Requests queued for the runtime task.
const REQUEST_CAPACITY: usize = 256;

/// Work for the runtime task.
#[derive(Debug)]
pub enum Request {
    /// New duplex observer
    Connect {
        /// Identifier chosen by the handle
        observer: ObserverId,
        /// Where its messages go
        outbox: mpsc::Sender<String>,
    },
    /// Observer went away
    Disconnect {
        /// Who
        observer: ObserverId,
    },
    /// Inbound frame from an observer
    Frame {
        /// Sender
        observer: ObserverId,
        /// Frame as received
        frame: InboundFrame,
    },
    /// Cue listing
    List {
        /// Reply channel
        reply: oneshot::Sender<CueList>,
    },
    /// Trigger from the request/response surface
    Trigger {
        /// Requested cue
        cue: Option<i64>,
        /// Optional new label
        text: Option<String>,
        /// Outcome
        reply: oneshot::Sender<Result<(), CommandError>>,
    },
    /// Release from the request/response surface
    Release {
        /// Requested cue
        cue: Option<i64>,
        /// Outcome
        reply: oneshot::Sender<Result<(), CommandError>>,
    },
    /// Push a full snapshot to every observer
    Snapshot,
}

/// Cloneable front door to the runtime task.
#[derive(Debug, Clone)]
pub struct Handle {
    requests: mpsc::Sender<Request>,
    next_observer: Arc<AtomicU64>,
}

impl Handle {
    /// Register a duplex observer. Returns its id and the receiving end of
    /// its outbox, or `None` if the runtime has stopped.
    pub async fn connect(&self) -> Option<(ObserverId, mpsc::Receiver<String>)> {
        let observer = self.next_observer.fetch_add(1, Ordering::Relaxed);
        let (outbox, inbox) = mpsc::channel(OUTBOX_CAPACITY);
        self.requests.send(Request::Connect { observer, outbox }).await.ok()?;
        Some((observer, inbox))
    }

    /// Unregister a duplex observer.
    pub async fn disconnect(&self, observer: ObserverId) {
        let _ = self.requests.send(Request::Disconnect { observer }).await;
    }

    /// Forward a frame. Returns `false` if the runtime has stopped.
    pub async fn frame(&self, observer: ObserverId, frame: InboundFrame) -> bool {
        self.requests.send(Request::Frame { observer, frame }).await.is_ok()
    }

    /// Current cue listing.
    pub async fn list(&self) -> Option<CueList> {
        let (reply, response) = oneshot::channel();
        self.requests.send(Request::List { reply }).await.ok()?;
        response.await.ok()
    }

    /// Trigger a cue.
    pub async fn trigger(
        &self,
        cue: Option<i64>,
        text: Option<String>,
    ) -> Option<Result<(), CommandError>> {
        let (reply, response) = oneshot::channel();
        self.requests.send(Request::Trigger { cue, text, reply }).await.ok()?;
        response.await.ok()
    }

    /// Release a cue.
    pub async fn release(&self, cue: Option<i64>) -> Option<Result<(), CommandError>> {
        let (reply, response) = oneshot::channel();
        self.requests.send(Request::Release { cue, reply }).await.ok()?;
        response.await.ok()
    }

    /// Broadcast a full snapshot. Returns `false` if the runtime has stopped.
    pub async fn snapshot(&self) -> bool {
        self.requests.send(Request::Snapshot).await.is_ok()
    }
}

/// Controller task state.
pub struct Runtime<E, B, D> {
    env: E,
    controller: Controller,
    peripherals: Peripherals<B, D>,
    outboxes: HashMap<ObserverId, mpsc::Sender<String>>,
    channel_count: usize,
    poll_interval: Duration,
}

impl<E, B, D> Runtime<E, B, D>
where
    E: Environment,
    B: Board,
    D: Display,
{
    /// Boot the engine on `peripherals` and build the task plus its handle.
    pub fn new(
        env: E,
        config: CueConfig,
        network: NetworkInfo,
        mut peripherals: Peripherals<B, D>,
        poll_interval: Duration,
    ) -> (Self, Handle, mpsc::Receiver<Request>) {
        let channel_count = config.channel_count;
        let engine = peripherals.boot_engine(config, env.now());
        let (requests, inbox) = mpsc::channel(REQUEST_CAPACITY);
        let handle = Handle { requests, next_observer: Arc::new(AtomicU64::new(1)) };
        let runtime = Self {
            env,
            controller: Controller::new(engine, network),
            peripherals,
            outboxes: HashMap::new(),
            channel_count,
            poll_interval,
        };
        (runtime, handle, inbox)
    }

    /// Controller, for inspection.
    pub fn controller(&self) -> &Controller {
        &self.controller
    }

    /// Peripherals, for inspection.
    pub fn peripherals(&self) -> &Peripherals<B, D> {
        &self.peripherals
    }

    /// Serve requests and poll buttons until every [`Handle`] is dropped.
    pub async fn run(mut self, mut requests: mpsc::Receiver<Request>) {
        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(channels = self.channel_count, "runtime started");

        loop {
            tokio::select! {
                _ = ticker.tick() => self.tick(),
                request = requests.recv() => match request {
                    Some(request) => self.handle(request),
                    None => break,
                },
            }
        }

        info!("runtime stopped");
    }

    /// One button poll.
    pub fn tick(&mut self) {
        let levels = self.peripherals.read_levels(self.channel_count);
        let actions = self.controller.tick(self.env.now(), &levels);
        self.execute(actions);
    }

    /// Apply one request.
    pub fn handle(&mut self, request: Request) {
        let now = self.env.now();
        match request {
            Request::Connect { observer, outbox } => {
                self.outboxes.insert(observer, outbox);
                let actions = self.controller.connect(observer);
                self.execute(actions);
            },
            Request::Disconnect { observer } => self.drop_observer(observer),
            Request::Frame { observer, frame } => {
                if !self.outboxes.contains_key(&observer) {
                    debug!(observer, "frame from unknown observer");
                    return;
                }
                let actions = self.controller.handle_frame(observer, &frame, now);
                self.execute(actions);
            },
            Request::List { reply } => {
                let _ = reply.send(self.controller.list());
            },
            Request::Trigger { cue, text, reply } => {
                let result = self.controller.trigger(cue, text.as_deref(), now);
                let _ = reply.send(result.map(|actions| self.execute(actions)));
            },
            Request::Release { cue, reply } => {
                let result = self.controller.release(cue, now);
                let _ = reply.send(result.map(|actions| self.execute(actions)));
            },
            Request::Snapshot => {
                let actions = self.controller.broadcast_snapshot();
                self.execute(actions);
            },
        }
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
        let Some(outbox) = self.outboxes.get(&observer) else {
            return;
        };
        let json = match message.to_json() {
            Ok(json) => json,
            Err(error) => {
                warn!(observer, %error, "failed to encode message");
                return;
            },
        };
        match outbox.try_send(json) {
            Ok(()) => {},
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!(observer, "observer outbox full, disconnecting");
                self.drop_observer(observer);
            },
            Err(mpsc::error::TrySendError::Closed(_)) => self.drop_observer(observer),
        }
    }

    fn drop_observer(&mut self, observer: ObserverId) {
        self.controller.disconnect(observer);
        self.outboxes.remove(&observer);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use cuelight_core::MemoryStore;
    use cuelight_proto::decode_server_message;

    use super::*;
    use crate::{
        SystemEnv,
        board::{LogDisplay, VirtualBoard},
    };

    type TestRuntime = Runtime<SystemEnv, VirtualBoard, LogDisplay>;

    fn runtime() -> TestRuntime {
        let peripherals =
            Peripherals::new(VirtualBoard::new(3), LogDisplay, Arc::new(MemoryStore::new()));
        let (runtime, _handle, _inbox) = Runtime::new(
            SystemEnv,
            CueConfig::default(),
            NetworkInfo::OFFLINE,
            peripherals,
            Duration::from_millis(10),
        );
        runtime
    }

    fn connect(
        runtime: &mut TestRuntime,
        observer: ObserverId,
        capacity: usize,
    ) -> mpsc::Receiver<String> {
        let (outbox, inbox) = mpsc::channel(capacity);
        runtime.handle(Request::Connect { observer, outbox });
        inbox
    }

    fn drain(inbox: &mut mpsc::Receiver<String>) -> Vec<ServerMessage> {
        let mut messages = Vec::new();
        while let Ok(raw) = inbox.try_recv() {
            messages.push(decode_server_message(&raw).unwrap());
        }
        messages
    }

    #[test]
    fn frames_are_applied_and_broadcast() {
        let mut runtime = runtime();
        let mut a = connect(&mut runtime, 1, 8);
        let mut b = connect(&mut runtime, 2, 8);
        drain(&mut a);
        drain(&mut b);

        runtime.handle(Request::Frame {
            observer: 1,
            frame: InboundFrame::text(r#"{"type":"trigger","cue":0}"#),
        });

        assert!(runtime.peripherals().board().light(0));
        assert_eq!(drain(&mut a).len(), 2);
        assert!(matches!(drain(&mut b).as_slice(), [ServerMessage::Cue(event)] if event.active));
    }

    #[test]
    fn full_outbox_disconnects_only_that_observer() {
        let mut runtime = runtime();
        let _slow = connect(&mut runtime, 1, 1);
        let mut fast = connect(&mut runtime, 2, 8);
        drain(&mut fast);

        let (reply, _) = oneshot::channel();
        runtime.handle(Request::Trigger { cue: Some(1), text: None, reply });

        assert_eq!(runtime.controller().observers().collect::<Vec<_>>(), vec![2]);
        assert_eq!(drain(&mut fast).len(), 1);
    }

    #[test]
    fn frames_from_unknown_observers_are_ignored() {
        let mut runtime = runtime();
        runtime.handle(Request::Frame {
            observer: 9,
            frame: InboundFrame::text(r#"{"type":"trigger","cue":0}"#),
        });
        assert!(!runtime.controller().engine().get_state(0).active);
    }

    #[test]
    fn snapshot_reaches_every_observer() {
        let mut runtime = runtime();
        let mut a = connect(&mut runtime, 1, 8);
        drain(&mut a);

        runtime.handle(Request::Snapshot);

        let messages = drain(&mut a);
        assert!(matches!(messages.as_slice(), [ServerMessage::Snapshot { cues }] if cues.len() == 3));
    }

    #[tokio::test]
    async fn handle_round_trip() {
        let peripherals =
            Peripherals::new(VirtualBoard::new(3), LogDisplay, Arc::new(MemoryStore::new()));
        let (runtime, handle, inbox) = Runtime::new(
            SystemEnv,
            CueConfig::default(),
            NetworkInfo::OFFLINE,
            peripherals,
            Duration::from_millis(10),
        );
        let task = tokio::spawn(runtime.run(inbox));

        assert_eq!(handle.trigger(Some(1), Some("Go".into())).await, Some(Ok(())));
        assert_eq!(handle.release(Some(5)).await, Some(Err(CommandError::InvalidCueIndex)));
        let list = handle.list().await.unwrap();
        assert_eq!(list.count, 3);
        assert_eq!(list.cues[1].text, "Go");
        assert!(list.cues[1].active);
        assert!(handle.snapshot().await);

        drop(handle);
        task.await.unwrap();
    }
}
