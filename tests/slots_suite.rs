use std::cell::Cell;
use std::rc::Rc;

use beatvis::audio::AudioState;
use beatvis::canvas::Canvas;
use beatvis::effects::{Effect, EffectCtx, EffectError, EffectRegistry};
use beatvis::rng::Random;
use beatvis::slot::{EffectSlot, SlotEvent, SlotKind, SlotMode, SlotPolicy, Stage};

#[derive(Default)]
struct Counters {
    inits: Cell<u32>,
    cleanups: Cell<u32>,
    draws: Cell<u32>,
    saw_done: Cell<bool>,
}

/// Starts instantly and takes `exit_frames` frames to leave.
struct Counting {
    counters: Rc<Counters>,
    exit_frames: u32,
    exit_left: u32,
}

impl Effect for Counting {
    fn draw(&mut self, ctx: &mut EffectCtx<'_>) {
        let c = &self.counters;
        c.draws.set(c.draws.get() + 1);
        match *ctx.mode {
            SlotMode::Starting => *ctx.mode = SlotMode::Running,
            SlotMode::Running => {}
            SlotMode::Finish => {
                self.exit_left = self.exit_frames;
                *ctx.mode = SlotMode::Finishing;
            }
            SlotMode::Finishing => {
                self.exit_left = self.exit_left.saturating_sub(1);
                if self.exit_left == 0 {
                    *ctx.mode = SlotMode::Done;
                }
            }
            SlotMode::Done => c.saw_done.set(true),
        }
    }

    fn cleanup(&mut self) {
        let c = &self.counters;
        c.cleanups.set(c.cleanups.get() + 1);
    }
}

fn counting_registry(kind: SlotKind, names: &[&'static str], exit_frames: u32) -> (EffectRegistry, Rc<Counters>) {
    let counters = Rc::new(Counters::default());
    let mut reg = EffectRegistry::new();
    for &name in names {
        let c = Rc::clone(&counters);
        reg.register(kind, name, move |ctx| {
            c.inits.set(c.inits.get() + 1);
            *ctx.mode = SlotMode::Starting;
            Ok(Box::new(Counting {
                counters: Rc::clone(&c),
                exit_frames,
                exit_left: 0,
            }))
        });
    }
    (reg, counters)
}

struct Bench {
    audio: AudioState,
    rng: Random,
    canvas: Canvas,
}

impl Bench {
    fn new(seed: u64) -> Self {
        Self {
            audio: AudioState::default(),
            rng: Random::with_seed(seed),
            canvas: Canvas::new(16, 8),
        }
    }

    fn stage(&mut self) -> Stage<'_> {
        Stage {
            audio: &self.audio,
            rng: &mut self.rng,
            canvas: &mut self.canvas,
        }
    }
}

fn never_finish() -> SlotPolicy {
    SlotPolicy {
        min_frames: 0,
        finish_probability: 0.0,
    }
}

fn assert_not_done_while_loaded(slot: &EffectSlot) {
    if slot.is_loaded() {
        assert_ne!(slot.mode(), SlotMode::Done, "Done visible on a loaded slot");
    }
}

// ── Lifecycle ───────────────────────────────────────────────────────────────

#[test]
fn empty_slot_loads_on_first_step() {
    let (reg, counters) = counting_registry(SlotKind::Foreground, &["a", "b"], 2);
    let mut bench = Bench::new(1);
    let mut slot = EffectSlot::new(SlotKind::Foreground);
    assert_eq!(slot.mode(), SlotMode::Done);
    assert!(!slot.is_loaded());

    let ev = slot.step(&never_finish(), false, &reg, &mut bench.stage());
    match ev {
        Some(SlotEvent::Loaded { kind, index, name }) => {
            assert_eq!(kind, SlotKind::Foreground);
            assert!(index < 2);
            assert_eq!(name, reg.entries(SlotKind::Foreground)[index].name);
        }
        other => panic!("expected load, got {other:?}"),
    }
    assert!(slot.is_loaded());
    assert_eq!(slot.mode(), SlotMode::Starting);
    assert_eq!(counters.inits.get(), 1);
    assert_eq!(counters.cleanups.get(), 0);

    slot.draw(&reg, &mut bench.stage());
    assert_eq!(slot.mode(), SlotMode::Running);
    assert_eq!(counters.draws.get(), 1);
}

#[test]
fn finish_sequence_cleans_up_once_and_loads_queued_effect() {
    let (reg, counters) = counting_registry(SlotKind::Background, &["a", "b", "c"], 3);
    let mut bench = Bench::new(2);
    let mut slot = EffectSlot::new(SlotKind::Background);
    let policy = never_finish();

    slot.step(&policy, false, &reg, &mut bench.stage());
    slot.draw(&reg, &mut bench.stage());
    let first = slot.current().unwrap();

    let next = match slot.request_finish(&reg, &mut bench.rng) {
        Some(SlotEvent::FinishRequested { next, next_name, .. }) => {
            assert_eq!(next_name, reg.entries(SlotKind::Background)[next].name);
            next
        }
        other => panic!("expected finish request, got {other:?}"),
    };
    assert_ne!(next, first);
    assert_eq!(slot.mode(), SlotMode::Finish);
    assert_eq!(slot.next(), Some(next));

    let mut loaded = None;
    for _ in 0..10 {
        slot.step(&policy, false, &reg, &mut bench.stage());
        assert_not_done_while_loaded(&slot);
        if let Some(SlotEvent::Loaded { index, .. }) = slot.draw(&reg, &mut bench.stage()) {
            loaded = Some(index);
            break;
        }
        assert_not_done_while_loaded(&slot);
    }

    assert_eq!(loaded, Some(next));
    assert_eq!(slot.current(), Some(next));
    assert_eq!(slot.next(), None);
    assert_eq!(counters.cleanups.get(), 1);
    assert_eq!(counters.inits.get(), 2);
    assert_eq!(slot.frames(), 0);
    assert!(!counters.saw_done.get());
}

#[test]
fn many_cycles_pair_every_cleanup_with_an_init() {
    let (reg, counters) = counting_registry(SlotKind::Texture, &["a", "b"], 1);
    let mut bench = Bench::new(3);
    let mut slot = EffectSlot::new(SlotKind::Texture);
    let policy = SlotPolicy {
        min_frames: 5,
        finish_probability: 0.5,
    };

    let mut loads = 0;
    for _ in 0..2_000 {
        if let Some(SlotEvent::Loaded { .. }) = slot.step(&policy, true, &reg, &mut bench.stage()) {
            loads += 1;
        }
        assert_not_done_while_loaded(&slot);
        if let Some(SlotEvent::Loaded { .. }) = slot.draw(&reg, &mut bench.stage()) {
            loads += 1;
        }
        assert_not_done_while_loaded(&slot);
        assert_eq!(counters.inits.get(), counters.cleanups.get() + 1);
    }
    assert!(loads > 50, "only {loads} loads");
    assert_eq!(counters.inits.get(), loads);
    assert!(!counters.saw_done.get());

    slot.shutdown();
    assert_eq!(counters.inits.get(), counters.cleanups.get());
}

#[test]
fn next_effect_differs_from_current() {
    let (reg, _counters) = counting_registry(SlotKind::Foreground, &["a", "b", "c", "d"], 1);
    let mut bench = Bench::new(4);
    let mut slot = EffectSlot::new(SlotKind::Foreground);
    let policy = SlotPolicy {
        min_frames: 0,
        finish_probability: 1.0,
    };

    let mut previous = None;
    let mut seen = [false; 4];
    for _ in 0..500 {
        let stepped = slot.step(&policy, true, &reg, &mut bench.stage());
        let drawn = slot.draw(&reg, &mut bench.stage());
        for ev in [stepped, drawn].into_iter().flatten() {
            if let SlotEvent::Loaded { index, .. } = ev {
                if let Some(p) = previous {
                    assert_ne!(index, p, "reloaded the same effect");
                }
                previous = Some(index);
                seen[index] = true;
            }
        }
    }
    assert!(seen.iter().all(|s| *s), "not every effect was picked: {seen:?}");
}

#[test]
fn single_effect_reloads_itself() {
    let (reg, counters) = counting_registry(SlotKind::Texture, &["only"], 1);
    let mut bench = Bench::new(5);
    let mut slot = EffectSlot::new(SlotKind::Texture);
    slot.step(&never_finish(), false, &reg, &mut bench.stage());
    slot.draw(&reg, &mut bench.stage());

    assert!(matches!(
        slot.request_finish(&reg, &mut bench.rng),
        Some(SlotEvent::FinishRequested { next: 0, .. })
    ));
    slot.draw(&reg, &mut bench.stage()); // Finish -> Finishing
    let ev = slot.draw(&reg, &mut bench.stage()); // Finishing -> Done -> reload
    assert!(matches!(ev, Some(SlotEvent::Loaded { index: 0, .. })));
    assert_eq!(counters.inits.get(), 2);
    assert_eq!(counters.cleanups.get(), 1);
}

#[test]
fn request_finish_is_ignored_while_leaving() {
    let (reg, _counters) = counting_registry(SlotKind::Background, &["a", "b"], 5);
    let mut bench = Bench::new(6);
    let mut slot = EffectSlot::new(SlotKind::Background);
    slot.step(&never_finish(), false, &reg, &mut bench.stage());

    assert!(slot.request_finish(&reg, &mut bench.rng).is_some());
    let queued = slot.next();
    assert!(slot.request_finish(&reg, &mut bench.rng).is_none());
    slot.draw(&reg, &mut bench.stage());
    assert_eq!(slot.mode(), SlotMode::Finishing);
    assert!(slot.request_finish(&reg, &mut bench.rng).is_none());
    assert_eq!(slot.next(), queued);

    let mut empty = EffectSlot::new(SlotKind::Background);
    assert!(empty.request_finish(&reg, &mut bench.rng).is_none());
}

// ── Manager policy ──────────────────────────────────────────────────────────

fn measured_finish_rate(probability: f32, iterations: usize, seed: u64) -> (usize, f64) {
    let (reg, _counters) = counting_registry(SlotKind::Background, &["a", "b"], 1);
    let mut bench = Bench::new(seed);
    let mut slot = EffectSlot::new(SlotKind::Background);
    let policy = SlotPolicy {
        min_frames: 0,
        finish_probability: probability,
    };

    let mut eligible = 0usize;
    let mut finishes = 0usize;
    for _ in 0..iterations {
        let running = slot.is_loaded() && slot.mode() == SlotMode::Running;
        let ev = slot.step(&policy, true, &reg, &mut bench.stage());
        if running {
            eligible += 1;
            if matches!(ev, Some(SlotEvent::FinishRequested { .. })) {
                finishes += 1;
            }
        }
        slot.draw(&reg, &mut bench.stage());
    }
    (eligible, finishes as f64 / eligible.max(1) as f64)
}

#[test]
fn high_finish_probability_converges() {
    let (eligible, rate) = measured_finish_rate(0.40, 12_000, 77);
    assert!(eligible > 5_000, "eligible {eligible}");
    assert!((rate - 0.40).abs() < 0.03, "rate {rate}");
}

#[test]
fn low_finish_probability_converges() {
    let (eligible, rate) = measured_finish_rate(0.02, 25_000, 78);
    assert!(eligible > 20_000, "eligible {eligible}");
    assert!((rate - 0.02).abs() < 0.006, "rate {rate}");
}

#[test]
fn no_finish_without_a_beat() {
    let (reg, _counters) = counting_registry(SlotKind::Foreground, &["a", "b"], 1);
    let mut bench = Bench::new(8);
    let mut slot = EffectSlot::new(SlotKind::Foreground);
    let policy = SlotPolicy {
        min_frames: 0,
        finish_probability: 1.0,
    };
    slot.step(&policy, false, &reg, &mut bench.stage());
    for _ in 0..500 {
        assert!(slot.step(&policy, false, &reg, &mut bench.stage()).is_none());
        slot.draw(&reg, &mut bench.stage());
    }
    assert_eq!(slot.mode(), SlotMode::Running);
}

#[test]
fn min_frames_is_respected() {
    let (reg, _counters) = counting_registry(SlotKind::Foreground, &["a", "b"], 1);
    let mut bench = Bench::new(9);
    let mut slot = EffectSlot::new(SlotKind::Foreground);
    let policy = SlotPolicy {
        min_frames: 50,
        finish_probability: 1.0,
    };
    slot.step(&policy, true, &reg, &mut bench.stage());
    slot.draw(&reg, &mut bench.stage());

    let mut finished_at = None;
    for _ in 0..100 {
        if let Some(SlotEvent::FinishRequested { .. }) = slot.step(&policy, true, &reg, &mut bench.stage()) {
            finished_at = Some(slot.frames());
            break;
        }
        slot.draw(&reg, &mut bench.stage());
    }
    assert_eq!(finished_at, Some(50));
}

#[test]
fn default_policies() {
    let bg = SlotPolicy::default_for(SlotKind::Background);
    let fg = SlotPolicy::default_for(SlotKind::Foreground);
    let tx = SlotPolicy::default_for(SlotKind::Texture);
    assert_eq!((bg.min_frames, bg.finish_probability), (500, 0.02));
    assert_eq!((fg.min_frames, fg.finish_probability), (300, 0.02));
    assert_eq!((tx.min_frames, tx.finish_probability), (100, 0.40));
}

// ── Failure paths ───────────────────────────────────────────────────────────

#[test]
fn failing_factory_leaves_slot_empty() {
    let mut reg = EffectRegistry::new();
    reg.register(SlotKind::Foreground, "broken", |_ctx| {
        Err(EffectError::Init {
            name: "broken",
            message: "no resources".to_string(),
        })
    });
    let mut bench = Bench::new(10);
    let mut slot = EffectSlot::new(SlotKind::Foreground);

    for _ in 0..3 {
        match slot.step(&never_finish(), false, &reg, &mut bench.stage()) {
            Some(SlotEvent::LoadFailed { kind, error }) => {
                assert_eq!(kind, SlotKind::Foreground);
                assert!(error.to_string().contains("no resources"));
            }
            other => panic!("expected failure, got {other:?}"),
        }
        assert!(!slot.is_loaded());
        assert_eq!(slot.mode(), SlotMode::Done);
        assert_eq!(slot.name(), None);
        assert!(slot.draw(&reg, &mut bench.stage()).is_none());
    }
}

#[test]
fn empty_registry_reports_empty_kind() {
    let reg = EffectRegistry::new();
    let mut bench = Bench::new(11);
    let mut slot = EffectSlot::new(SlotKind::Texture);
    let ev = slot.step(&never_finish(), false, &reg, &mut bench.stage());
    assert_eq!(
        ev,
        Some(SlotEvent::LoadFailed {
            kind: SlotKind::Texture,
            error: EffectError::Empty {
                kind: SlotKind::Texture
            },
        })
    );
    assert!(!slot.is_loaded());
}

#[test]
fn shutdown_and_drop_clean_up_exactly_once() {
    let (reg, counters) = counting_registry(SlotKind::Background, &["a"], 1);
    let mut bench = Bench::new(12);
    {
        let mut slot = EffectSlot::new(SlotKind::Background);
        slot.step(&never_finish(), false, &reg, &mut bench.stage());
        slot.shutdown();
        assert_eq!(counters.cleanups.get(), 1);
        assert!(!slot.is_loaded());
    }
    assert_eq!(counters.cleanups.get(), 1);

    {
        let mut slot = EffectSlot::new(SlotKind::Background);
        slot.step(&never_finish(), false, &reg, &mut bench.stage());
    }
    assert_eq!(counters.inits.get(), 2);
    assert_eq!(counters.cleanups.get(), 2);
}

// ── Registry ────────────────────────────────────────────────────────────────

#[test]
fn builtin_registry_has_two_effects_per_slot() {
    let reg = EffectRegistry::builtin();
    for kind in SlotKind::all() {
        assert_eq!(reg.len(kind), 2, "{kind:?}");
    }
    assert_eq!(reg.names(SlotKind::Background), vec!["Starfield", "Aurora"]);
    assert_eq!(reg.find(SlotKind::Texture, "swirl"), Some(1));
    assert_eq!(reg.find(SlotKind::Texture, "Cube"), None);
}
