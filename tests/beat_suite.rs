use beatvis::beat::{compute_loudness, BeatDetector, BEAT_HISTORY, DEFAULT_SENSITIVITY};

/// Sine with a 64-sample period; loudness comes out near `2 * amp`.
fn sine(amp: f32) -> Vec<i16> {
    (0..512)
        .map(|i| (amp * (2.0 * std::f32::consts::PI * i as f32 / 64.0).sin()) as i16)
        .collect()
}

fn beat_frames(loudness: impl IntoIterator<Item = i32>) -> Vec<usize> {
    let mut d = BeatDetector::new(DEFAULT_SENSITIVITY);
    loudness
        .into_iter()
        .enumerate()
        .filter_map(|(i, l)| d.detect(l).beat.then_some(i))
        .collect()
}

// ── Loudness ────────────────────────────────────────────────────────────────

#[test]
fn silence_is_zero() {
    assert_eq!(compute_loudness(&[0; 512]), 0);
    assert_eq!(compute_loudness(&[1234; 512]), 0);
    assert_eq!(compute_loudness(&[]), 0);
    assert_eq!(compute_loudness(&[5]), 0);
}

#[test]
fn loudness_scales_with_amplitude() {
    let quiet = compute_loudness(&sine(2_000.0));
    let loud = compute_loudness(&sine(10_000.0));
    assert!((3_800..4_300).contains(&quiet), "quiet {quiet}");
    assert!((19_000..21_500).contains(&loud), "loud {loud}");
    assert!(loud > quiet * 4);
}

#[test]
fn loudness_of_full_scale_square_does_not_overflow() {
    let square: Vec<i16> = (0..512)
        .map(|i| if i % 2 == 0 { i16::MAX } else { i16::MIN })
        .collect();
    let l = compute_loudness(&square);
    assert!(l > 0);
}

#[test]
fn trough_must_follow_peak() {
    // A falling ramp has its peak first, so the swing counts.
    let falling: Vec<i16> = (0..512).map(|i| 10_000 - i as i16 * 10).collect();
    // A rising ramp resets the trough at every new peak: no swing.
    let rising: Vec<i16> = (0..512).map(|i| i as i16 * 10).collect();
    assert!(compute_loudness(&falling) > compute_loudness(&rising));
}

// ── Beat detection ──────────────────────────────────────────────────────────

#[test]
fn constant_level_never_beats() {
    let l = compute_loudness(&sine(3_000.0));
    assert!(beat_frames(std::iter::repeat(l).take(BEAT_HISTORY + 50)).is_empty());
}

#[test]
fn single_jump_after_steady_level_beats_once() {
    let levels = (0..90).map(|i| if i < 30 { 4_000 } else { 20_000 });
    assert_eq!(beat_frames(levels), vec![30]);
}

#[test]
fn jump_from_silence_does_not_beat() {
    let levels = (0..60).map(|i| if i < 30 { 0 } else { 20_000 });
    assert!(beat_frames(levels).is_empty());
}

#[test]
fn regular_transients_over_a_hum_beat_every_time() {
    let hum = compute_loudness(&sine(2_000.0));
    let hit = compute_loudness(&sine(10_000.0));
    let levels = (0..300).map(|i| if matches!(i, 60 | 140 | 220) { hit } else { hum });
    assert_eq!(beat_frames(levels), vec![60, 140, 220]);
}

#[test]
fn beats_are_at_least_sixteen_frames_apart() {
    // Hits every 4 frames: too fast, so beats are spaced out by the gap rule.
    let levels: Vec<i32> = (0..400).map(|i| if i % 4 == 0 { 20_000 } else { 4_000 }).collect();
    let beats = beat_frames(levels);
    for w in beats.windows(2) {
        assert!(w[1] - w[0] > 15, "beats {} and {} too close", w[0], w[1]);
    }
}

#[test]
fn beat_records_period_and_resets_elapsed() {
    let mut d = BeatDetector::new(DEFAULT_SENSITIVITY);
    for _ in 0..30 {
        d.detect(4_000);
    }
    let r = d.detect(20_000);
    assert!(r.beat);
    assert_eq!(d.elapsed(), 0);
    assert!(d.prev_period() > 15);
}

#[test]
fn history_resets_while_silent() {
    let mut d = BeatDetector::new(DEFAULT_SENSITIVITY);
    for _ in 0..20 {
        d.detect(0);
        assert_eq!(d.elapsed(), 0);
    }
    assert_eq!(d.aged(), 0);
    assert_eq!(d.lowest(), 0);
}

// ── Thickness ───────────────────────────────────────────────────────────────

#[test]
fn thickness_is_zero_below_floor() {
    let mut d = BeatDetector::new(DEFAULT_SENSITIVITY);
    let r = d.detect(5_000);
    // aged = 625 after one frame
    assert_eq!(r.thickness, 0);
}

#[test]
fn thickness_tracks_loudness_relative_to_average() {
    let mut d = BeatDetector::new(DEFAULT_SENSITIVITY);
    let mut last = 0;
    for _ in 0..100 {
        last = d.detect(4_000).thickness;
    }
    assert_eq!(last, 2);

    let spike = d.detect(40_000).thickness;
    assert_eq!(spike, 3, "capped at 3");

    let mut d = BeatDetector::new(DEFAULT_SENSITIVITY);
    for _ in 0..100 {
        d.detect(4_000);
    }
    assert_eq!(d.detect(1_000).thickness, 0);
}

// ── Quiet ───────────────────────────────────────────────────────────────────

#[test]
fn quiet_onset_fires_once_on_entry() {
    let mut d = BeatDetector::new(DEFAULT_SENSITIVITY);
    let mut onsets = Vec::new();
    for i in 0..120 {
        let l = if i < 40 { 4_000 } else if i < 80 { 0 } else { 4_000 };
        if d.detect(l).quiet_onset {
            onsets.push(i);
        }
    }
    assert_eq!(onsets.len(), 1, "onsets {onsets:?}");
    assert!((41..80).contains(&onsets[0]));
}

#[test]
fn quiet_has_hysteresis() {
    let mut d = BeatDetector::new(DEFAULT_SENSITIVITY);
    assert!(d.detect(0).quiet_onset);
    assert!(d.is_quiet());

    // Climb to an average between the enter and leave thresholds.
    while d.aged() < 1_000 {
        assert!(!d.detect(1_100).quiet_onset);
    }
    assert!(d.is_quiet(), "still quiet below the leave threshold");

    while d.aged() < 1_500 {
        d.detect(3_000);
    }
    d.detect(3_000);
    assert!(!d.is_quiet());
}
