//! Model-based property tests.
//!
//! Random operation sequences are applied both to a [`Rig`] and to a plain
//! reference model of the cue table; after every step the two must agree.
//!
//! ```text
//! proptest generates: Vec<Operation>
//!                          │
//!             ┌────────────┼────────────┐
//!             ▼            ▼            ▼
//!           Model         Rig        Compare
//! ```

use std::{sync::Arc, time::Duration};

use cuelight_core::MemoryStore;
use cuelight_harness::{Rig, bounce_burst};
use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

#[derive(Debug, Clone)]
enum Operation {
    Trigger { cue: i64, text: Option<String> },
    Release { cue: i64 },
    Rename { cue: i64, text: String },
    Wait { millis: u64 },
}

fn label() -> impl Strategy<Value = String> {
    prop_oneof![Just(String::new()), "[A-Za-z ]{1,12}"]
}

fn operation() -> impl Strategy<Value = Operation> {
    let cue = -2i64..6;
    prop_oneof![
        (cue.clone(), proptest::option::of(label()))
            .prop_map(|(cue, text)| Operation::Trigger { cue, text }),
        cue.clone().prop_map(|cue| Operation::Release { cue }),
        (cue, label()).prop_map(|(cue, text)| Operation::Rename { cue, text }),
        // Whole poll intervals keep every poll on a 10 ms boundary.
        (0u64..40).prop_map(|n| Operation::Wait { millis: n * 10 }),
    ]
}

#[derive(Debug, Clone)]
struct ModelCue {
    text: String,
    active: bool,
    since: Duration,
}

struct Model {
    cues: Vec<ModelCue>,
    now: Duration,
}

impl Model {
    const AUTO_RELEASE: Duration = Duration::from_millis(1500);

    fn new() -> Self {
        let cues = (0..3)
            .map(|i| ModelCue { text: format!("Cue {}", i + 1), active: false, since: Duration::ZERO })
            .collect();
        Self { cues, now: Duration::ZERO }
    }

    fn slot(&mut self, cue: i64) -> Option<(usize, &mut ModelCue)> {
        let index = usize::try_from(cue).ok()?;
        self.cues.get_mut(index).map(|slot| (index, slot))
    }

    fn relabel(cue: &mut ModelCue, index: usize, text: &str) {
        cue.text = if text.is_empty() { format!("Cue {}", index + 1) } else { text.to_string() };
    }

    fn apply(&mut self, op: &Operation) -> bool {
        let now = self.now;
        match op {
            Operation::Trigger { cue, text } => {
                let Some((index, slot)) = self.slot(*cue) else { return false };
                if let Some(text) = text {
                    Self::relabel(slot, index, text);
                }
                if !slot.active {
                    slot.active = true;
                    slot.since = now;
                }
                true
            },
            Operation::Release { cue } => {
                let Some((_, slot)) = self.slot(*cue) else { return false };
                if slot.active {
                    slot.active = false;
                    slot.since = now;
                }
                true
            },
            Operation::Rename { cue, text } => {
                let Some((index, slot)) = self.slot(*cue) else { return false };
                Self::relabel(slot, index, text);
                true
            },
            Operation::Wait { millis } => {
                // Every change lands on a poll boundary, so auto-release
                // fires exactly at its deadline.
                let end = now + Duration::from_millis(*millis);
                for cue in &mut self.cues {
                    let deadline = cue.since + Self::AUTO_RELEASE;
                    if cue.active && deadline <= end {
                        cue.active = false;
                        cue.since = deadline;
                    }
                }
                self.now = end;
                true
            },
        }
    }
}

fn apply_rig(rig: &mut Rig, op: &Operation) -> bool {
    match op {
        Operation::Trigger { cue, text } => rig.trigger(Some(*cue), text.as_deref()).is_ok(),
        Operation::Release { cue } => rig.release(Some(*cue)).is_ok(),
        Operation::Rename { cue, text } => {
            let observer = rig.connect();
            let payload = serde_json::json!({ "type": "rename", "cue": cue, "text": text });
            rig.send(observer, &payload.to_string());
            let ok = rig.take_messages(observer).iter().any(|m| {
                matches!(m, cuelight_proto::ServerMessage::Ack(ack) if ack.ok)
            });
            rig.disconnect(observer);
            ok
        },
        Operation::Wait { millis } => {
            rig.run_for(Duration::from_millis(*millis));
            true
        },
    }
}

proptest! {
    #[test]
    fn rig_matches_model(ops in proptest::collection::vec(operation(), 1..40)) {
        let mut rig = Rig::boot(Arc::new(MemoryStore::new()));
        let mut model = Model::new();

        for op in &ops {
            prop_assert_eq!(apply_rig(&mut rig, op), model.apply(op), "op {:?}", op);
            for (index, cue) in model.cues.iter().enumerate() {
                let state = rig.controller().engine().get_state(index);
                prop_assert_eq!(&state.text, &cue.text);
                prop_assert_eq!(state.active, cue.active);
                prop_assert_eq!(rig.board().light(index), cue.active);
            }
        }
    }

    #[test]
    fn bounce_yields_single_edge(seed in any::<u64>(), flips in 0usize..12) {
        let mut rig = Rig::boot(Arc::new(MemoryStore::new()));
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let script = bounce_burst(&mut rng, false, flips, Duration::from_millis(20));

        for (offset, level) in &script {
            rig.board_mut().set_level(1, *level);
            rig.tick_at(*offset);
        }
        let settled = script.last().map(|s| s.0).unwrap_or_default();
        rig.tick_at(settled + Duration::from_millis(60));

        let ons = rig.board().light_writes().iter().filter(|w| **w == (1, true)).count();
        prop_assert_eq!(ons, 1);
        prop_assert!(rig.controller().engine().get_state(1).active);
    }
}
