//! Cue engine scenarios on simulated hardware.

use std::{sync::Arc, time::Duration};

use cuelight_core::{MemoryStore, Store, store::CUE_NAMESPACE};
use cuelight_harness::Rig;

fn ms(millis: u64) -> Duration {
    Duration::from_millis(millis)
}

fn rig() -> Rig {
    Rig::boot(Arc::new(MemoryStore::new()))
}

#[test]
fn boot_shows_defaults_with_lights_off() {
    let rig = rig();

    for index in 0..3 {
        let state = rig.controller().engine().get_state(index);
        assert!(state.is_valid());
        assert!(!state.active);
        assert_eq!(state.text, format!("Cue {}", index + 1));
        assert_eq!(rig.display().shown(index), Some(state.text.as_str()));
        assert!(!rig.board().light(index));
    }
}

#[test]
fn bouncy_press_commits_once_after_settling() {
    let mut rig = rig();

    rig.board_mut().press(0);
    rig.tick_at(ms(0));
    rig.board_mut().release(0);
    rig.tick_at(ms(10));
    rig.board_mut().press(0);
    rig.tick_at(ms(20));

    for t in (30..70).step_by(10) {
        rig.tick_at(ms(t));
        assert!(!rig.board().light(0), "lit early at {t} ms");
    }

    rig.tick_at(ms(70));
    assert!(rig.board().light(0));
    assert_eq!(rig.board().light_writes().iter().filter(|w| **w == (0, true)).count(), 1);
}

#[test]
fn cue_auto_releases_after_window() {
    let mut rig = rig();
    rig.trigger(Some(1), None).unwrap();
    let triggered_at = rig.env().elapsed();

    rig.run_for(ms(1490));
    assert!(rig.controller().engine().get_state(1).active);

    rig.run_for(ms(10));
    assert!(!rig.controller().engine().get_state(1).active);
    assert!(!rig.board().light(1));
    assert!(rig.env().elapsed() - triggered_at <= ms(1500) + ms(10));
}

#[test]
fn held_button_does_not_retrigger_after_auto_release() {
    let mut rig = rig();
    rig.board_mut().press(2);
    rig.tick();
    rig.run_for(ms(60));
    assert!(rig.controller().engine().get_state(2).active);

    rig.run_for(ms(3000));
    assert!(!rig.controller().engine().get_state(2).active);

    rig.board_mut().release(2);
    rig.run_for(ms(100));
    assert!(!rig.controller().engine().get_state(2).active);
}

#[test]
fn repeated_trigger_and_release_are_idempotent() {
    let mut rig = rig();
    let observer = rig.connect();
    rig.take_messages(observer);

    rig.trigger(Some(0), None).unwrap();
    rig.trigger(Some(0), None).unwrap();
    rig.release(Some(0)).unwrap();
    rig.release(Some(0)).unwrap();

    assert_eq!(rig.take_messages(observer).len(), 2);
    assert_eq!(rig.board().light_writes().iter().filter(|w| w.0 == 0).count(), 3);
}

#[test]
fn labels_survive_reboot() {
    let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
    let mut rig = Rig::boot(Arc::clone(&store));
    let observer = rig.connect();
    rig.send(observer, r#"{"type":"rename","cue":1,"text":"Fly In"}"#);
    rig.trigger(Some(1), None).unwrap();

    let rig = rig.reboot();
    let state = rig.controller().engine().get_state(1);
    assert_eq!(state.text, "Fly In");
    assert!(!state.active);
    assert_eq!(rig.display().shown(1), Some("Fly In"));
    assert_eq!(store.get(CUE_NAMESPACE, "cue1").unwrap().as_deref(), Some("Fly In"));
}

#[test]
fn empty_label_restores_default() {
    let mut rig = rig();
    let observer = rig.connect();
    rig.send(observer, r#"{"type":"rename","cue":0,"text":"Blackout"}"#);
    rig.send(observer, r#"{"type":"rename","cue":0,"text":""}"#);

    assert_eq!(rig.controller().engine().get_state(0).text, "Cue 1");
    assert_eq!(rig.display().shown(0), Some("Cue 1"));
}

#[test]
fn read_only_store_keeps_labels_in_memory() {
    let seed = [(("cue_texts".to_string(), "cue0".to_string()), "House".to_string())];
    let mut rig = Rig::boot(Arc::new(MemoryStore::read_only(seed)));
    assert_eq!(rig.controller().engine().get_state(0).text, "House");

    rig.trigger(Some(0), Some("Stage")).unwrap();
    assert_eq!(rig.controller().engine().get_state(0).text, "Stage");
    assert!(rig.controller().engine().get_state(0).active);
}

#[test]
fn out_of_range_cue_reports_invalid_snapshot() {
    let rig = rig();
    let state = rig.controller().engine().get_state(3);
    assert!(!state.is_valid());
    assert!(!state.active);
    assert!(state.text.is_empty());
}
