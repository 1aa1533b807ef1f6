use beatvis::audio::{AudioFrame, AudioMailbox, FRAME_SAMPLES};
use beatvis::{Engine, EngineConfig};
use std::sync::atomic::{AtomicBool, Ordering};

fn uniform(value: i16) -> AudioFrame {
    AudioFrame::from_mono(&[value; FRAME_SAMPLES])
}

fn is_uniform(frame: &AudioFrame) -> bool {
    let first = frame.channels[0][0];
    frame.channels.iter().flat_map(|c| c.iter()).all(|s| *s == first)
}

#[test]
fn mailbox_hands_over_only_the_newest_frame() {
    let mailbox = AudioMailbox::new();
    let mut seen = 0;
    assert!(mailbox.take_newer(&mut seen).is_none());

    mailbox.store(&uniform(1));
    mailbox.store(&uniform(2));
    assert_eq!(mailbox.version(), 2);
    assert_eq!(mailbox.take_newer(&mut seen), Some(uniform(2)));
    assert_eq!(seen, 2);
    assert!(mailbox.take_newer(&mut seen).is_none());
}

#[test]
fn concurrent_writers_never_mix_frames() {
    const WRITERS: i16 = 4;
    const PUSHES: usize = 2_000;

    let mailbox = AudioMailbox::new();
    let writing = AtomicBool::new(true);

    std::thread::scope(|s| {
        let handles: Vec<_> = (1..=WRITERS)
            .map(|id| {
                let mailbox = &mailbox;
                s.spawn(move || {
                    let frame = uniform(id * 1_000);
                    for _ in 0..PUSHES {
                        mailbox.store(&frame);
                    }
                })
            })
            .collect();

        let reader = s.spawn(|| {
            let mut seen = 0;
            let mut taken = 0usize;
            while writing.load(Ordering::Acquire) {
                if let Some(frame) = mailbox.take_newer(&mut seen) {
                    assert!(is_uniform(&frame), "mixed frame {frame:?}");
                    taken += 1;
                }
            }
            taken
        });

        for h in handles {
            h.join().unwrap();
        }
        writing.store(false, Ordering::Release);
        reader.join().unwrap();
    });

    assert_eq!(mailbox.version(), WRITERS as u64 * PUSHES as u64);
    let mut seen = 0;
    let last = mailbox.take_newer(&mut seen).unwrap();
    assert!(is_uniform(&last));
}

#[test]
fn cloned_inputs_feed_the_same_engine() {
    let mut engine = Engine::new(EngineConfig::default().with_seed(1));
    engine.set_size(8, 8);
    let a = engine.audio_input();
    let b = a.clone();

    a.push(&uniform(100));
    b.push(&uniform(200));
    assert!(engine.draw_frame().fresh_audio);
    assert_eq!(engine.audio().time, uniform(200));

    engine.update_audio(&uniform(300));
    engine.draw_frame();
    assert_eq!(engine.audio().time, uniform(300));
}

#[test]
fn interleaved_input_splits_channels() {
    let f = AudioFrame::from_interleaved(&[1, -1, 2, -2]);
    assert_eq!(&f.left()[..3], &[1, 2, 0]);
    assert_eq!(&f.right()[..3], &[-1, -2, 0]);
}
