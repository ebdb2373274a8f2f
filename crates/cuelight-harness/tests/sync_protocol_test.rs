//! Synchronization protocol flows between observers and the controller.

use std::{sync::Arc, time::Duration};

use cuelight_core::MemoryStore;
use cuelight_harness::Rig;
use cuelight_proto::{Ack, CueEvent, InboundFrame, ServerMessage, WifiMode};

fn rig() -> Rig {
    Rig::boot(Arc::new(MemoryStore::new()))
}

fn cue_events(messages: &[ServerMessage]) -> Vec<CueEvent> {
    messages
        .iter()
        .filter_map(|m| match m {
            ServerMessage::Cue(event) => Some(event.clone()),
            _ => None,
        })
        .collect()
}

fn acks(messages: &[ServerMessage]) -> Vec<Ack> {
    messages
        .iter()
        .filter_map(|m| match m {
            ServerMessage::Ack(ack) => Some(ack.clone()),
            _ => None,
        })
        .collect()
}

#[test]
fn new_observer_receives_init() {
    let mut rig = rig();
    let observer = rig.connect();

    let messages = rig.take_messages(observer);
    let [ServerMessage::Init { cues, wifi }] = messages.as_slice() else {
        panic!("expected a single init, got {messages:?}");
    };
    assert_eq!(cues.len(), 3);
    assert_eq!(cues[2].text, "Cue 3");
    assert_eq!(wifi.mode, WifiMode::Off);
    assert_eq!(wifi.ip, "0.0.0.0");
}

#[test]
fn trigger_is_broadcast_to_every_observer_including_sender() {
    let mut rig = rig();
    let a = rig.connect();
    let b = rig.connect();
    rig.take_messages(a);
    rig.take_messages(b);

    rig.send(a, r#"{"type":"trigger","cue":1}"#);

    let to_a = rig.take_messages(a);
    let to_b = rig.take_messages(b);
    assert_eq!(cue_events(&to_a), cue_events(&to_b));
    assert_eq!(cue_events(&to_b).len(), 1);
    assert!(cue_events(&to_b)[0].active);
    assert_eq!(acks(&to_a), vec![Ack::ok("trigger")]);
    assert!(acks(&to_b).is_empty());

    // Broadcast comes before the ack.
    assert!(matches!(to_a[0], ServerMessage::Cue(_)));
}

#[test]
fn button_press_is_broadcast() {
    let mut rig = rig();
    let a = rig.connect();
    rig.take_messages(a);

    rig.board_mut().press(0);
    rig.tick();
    rig.run_for(Duration::from_millis(60));

    let events = cue_events(&rig.take_messages(a));
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].index, 0);
    assert!(events[0].active);
}

#[test]
fn errors_go_only_to_requester() {
    let mut rig = rig();
    let a = rig.connect();
    let b = rig.connect();
    rig.take_messages(a);
    rig.take_messages(b);

    rig.send(a, r#"{"type":"trigger","cue":7}"#);
    rig.send(a, "not json");
    rig.send(a, r#"{"type":"dance"}"#);
    rig.send(a, r#"{"cue":1}"#);
    rig.send_frame(a, &InboundFrame::binary(vec![1, 2, 3]));
    rig.send(a, &format!(r#"{{"type":"ping","pad":"{}"}}"#, "x".repeat(600)));

    let acks = acks(&rig.take_messages(a));
    let details: Vec<_> = acks.iter().map(|a| (a.action.as_str(), a.detail.as_deref())).collect();
    assert_eq!(details[0], ("trigger", Some("invalid cue index")));
    assert_eq!(details[1].0, "parse");
    assert_eq!(details[2], ("parse", Some("unknown type")));
    assert_eq!(details[3], ("parse", Some("missing type")));
    assert_eq!(details[4], ("parse", Some("unsupported frame")));
    assert_eq!(details[5], ("parse", Some("payload too large")));
    assert!(acks.iter().all(|a| !a.ok));

    assert!(rig.take_messages(b).is_empty());
    assert!((0..3).all(|i| !rig.controller().engine().get_state(i).active));
}

#[test]
fn rename_acks_then_broadcasts() {
    let mut rig = rig();
    let a = rig.connect();
    let b = rig.connect();
    rig.take_messages(a);
    rig.take_messages(b);

    rig.send(b, r#"{"type":"rename","cue":2,"text":"Spot"}"#);

    let to_b = rig.take_messages(b);
    assert!(matches!(&to_b[0], ServerMessage::Ack(ack) if ack.action == "rename" && ack.ok));
    let events = cue_events(&to_b);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].text, "Spot");
    assert!(!events[0].active);
    assert_eq!(cue_events(&rig.take_messages(a)), events);
}

#[test]
fn trigger_with_text_relabels_active_cue() {
    let mut rig = rig();
    let a = rig.connect();
    rig.send(a, r#"{"type":"trigger","cue":0}"#);
    rig.take_messages(a);

    rig.send(a, r#"{"type":"trigger","cue":0,"text":"Go"}"#);

    let events = cue_events(&rig.take_messages(a));
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].text, "Go");
    assert!(events[0].active);
}

#[test]
fn broadcast_state_matches_engine() {
    let mut rig = rig();
    let a = rig.connect();
    rig.take_messages(a);
    rig.env().advance(Duration::from_millis(250));

    rig.send(a, r#"{"type":"trigger","cue":2,"text":"Lights"}"#);

    let event = cue_events(&rig.take_messages(a)).pop().unwrap();
    let state = rig.controller().engine().get_state(2);
    assert_eq!(event.index, state.index);
    assert_eq!(event.text, state.text);
    assert_eq!(event.active, state.active);
    assert_eq!(event.updated_at, 250);
}

#[test]
fn ping_is_acknowledged_without_broadcast() {
    let mut rig = rig();
    let a = rig.connect();
    let b = rig.connect();
    rig.take_messages(a);
    rig.take_messages(b);

    rig.send(a, r#"{"type":"ping"}"#);

    assert_eq!(rig.take_messages(a), vec![ServerMessage::Ack(Ack::ok("ping"))]);
    assert!(rig.take_messages(b).is_empty());
}

#[test]
fn disconnected_observer_receives_nothing() {
    let mut rig = rig();
    let a = rig.connect();
    let b = rig.connect();
    rig.disconnect(b);

    rig.send(a, r#"{"type":"trigger","cue":0}"#);

    assert!(rig.raw_outbox(b).is_empty());
    assert_eq!(rig.controller().observer_count(), 1);
}

#[test]
fn changes_without_observers_still_apply() {
    let mut rig = rig();
    rig.trigger(Some(0), None).unwrap();
    assert!(rig.controller().engine().get_state(0).active);

    let a = rig.connect();
    let messages = rig.take_messages(a);
    let [ServerMessage::Init { cues, .. }] = messages.as_slice() else {
        panic!("expected init");
    };
    assert!(cues[0].active);
}
