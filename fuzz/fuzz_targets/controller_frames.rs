//! Arbitrary frames against a live controller.
//!
//! Whatever arrives, the requester gets exactly one ack and the cue table
//! keeps its shape.

#![no_main]

use std::time::Instant;

use cuelight_core::{Controller, ControllerAction, CueConfig, CueEngine, NetworkInfo};
use cuelight_proto::{InboundFrame, ServerMessage};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let now = Instant::now();
    let (engine, _) = CueEngine::initialize(CueConfig::default(), now, &[true; 3], &[]);
    let mut controller = Controller::new(engine, NetworkInfo::OFFLINE);
    controller.connect(1);

    let frame = match data.split_first() {
        Some((0, rest)) => InboundFrame::binary(rest.to_vec()),
        Some((_, rest)) => InboundFrame { payload: rest.to_vec(), ..InboundFrame::text("") },
        None => InboundFrame::text(""),
    };
    let actions = controller.handle_frame(1, &frame, now);

    let acks = actions
        .iter()
        .filter(|a| {
            matches!(a, ControllerAction::Send { observer: 1, message: ServerMessage::Ack(_) })
        })
        .count();
    assert_eq!(acks, 1);
    assert_eq!(controller.engine().len(), 3);
});
