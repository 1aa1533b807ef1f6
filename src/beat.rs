//! Loudness estimate and beat / thickness / quiet detection.
//!
//! Everything here is integer arithmetic on the raw 16-bit sample scale, one
//! call per video frame.

pub const BEAT_HISTORY: usize = 200;
pub const DEFAULT_SENSITIVITY: i64 = 4;

const SILENCE_FLOOR: i64 = 2000;
const THICKNESS_FLOOR: i64 = 1500;
const QUIET_ENTER: i64 = 500;
const QUIET_STAY: i64 = 1500;
const MIN_BEAT_GAP: u32 = 15;
const MAX_THICKNESS: i64 = 3;

/// Loudness of one frame, on the order of the 16-bit input samples.
///
/// Uses channel 0 only. The peak-to-trough swing is taken over the first half
/// of the window with the trough restricted to follow the peak; the sum of
/// absolute first differences covers the whole window.
pub fn compute_loudness(samples: &[i16]) -> i32 {
    if samples.len() < 2 {
        return 0;
    }

    let half = (samples.len() / 2).max(1);
    let mut imax = 0usize;
    let mut imin = 0usize;
    for i in 1..half {
        if samples[i] < samples[imin] {
            imin = i;
        }
        if samples[i] > samples[imax] {
            imax = i;
            imin = i;
        }
    }

    let delta_sum: i64 = samples
        .windows(2)
        .map(|w| (w[1] as i64 - w[0] as i64).abs())
        .sum();
    let swing = samples[imax] as i64 - samples[imin] as i64;

    ((delta_sum + swing * 60) / 75).clamp(0, i32::MAX as i64) as i32
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BeatReport {
    pub beat: bool,
    /// 0..=3
    pub thickness: u8,
    /// True only on the first quiet frame.
    pub quiet_onset: bool,
}

#[derive(Debug, Clone)]
pub struct BeatDetector {
    history: [i64; BEAT_HISTORY],
    base: usize,
    aged: i64,
    lowest: i64,
    elapsed: u32,
    quiet: bool,
    prev_period: u32,
    sensitivity: i64,
}

impl Default for BeatDetector {
    fn default() -> Self {
        Self::new(DEFAULT_SENSITIVITY)
    }
}

impl BeatDetector {
    pub fn new(sensitivity: i64) -> Self {
        Self {
            history: [0; BEAT_HISTORY],
            base: 0,
            aged: 0,
            lowest: 0,
            elapsed: 0,
            quiet: false,
            prev_period: 0,
            sensitivity: sensitivity.max(1),
        }
    }

    pub fn aged(&self) -> i64 {
        self.aged
    }

    pub fn lowest(&self) -> i64 {
        self.lowest
    }

    pub fn elapsed(&self) -> u32 {
        self.elapsed
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet
    }

    pub fn prev_period(&self) -> u32 {
        self.prev_period
    }

    pub fn detect(&mut self, loudness: i32) -> BeatReport {
        let loudness = loudness.max(0) as i64;

        self.aged = (self.aged * 7 + loudness) >> 3;
        self.elapsed = self.elapsed.saturating_add(1);

        if self.aged < SILENCE_FLOOR || self.elapsed as usize > BEAT_HISTORY {
            self.elapsed = 0;
            self.lowest = self.aged;
            self.history = [0; BEAT_HISTORY];
        } else if self.aged < self.lowest {
            self.lowest = self.aged;
        }

        let slot = (self.base + self.elapsed as usize) % BEAT_HISTORY;
        self.history[slot] = loudness - self.aged;

        let beat = self.elapsed > MIN_BEAT_GAP
            && self.aged > SILENCE_FLOOR
            && loudness * 4 > self.aged * 5
            && self.rhythm_total(slot) * self.rhythm_sensitivity() > self.aged;

        if beat {
            self.prev_period = self.elapsed;
            self.base = (self.base + self.elapsed as usize) % BEAT_HISTORY;
            self.lowest = self.aged;
            self.elapsed = 0;
        }

        let thickness = if self.aged < THICKNESS_FLOOR {
            0
        } else {
            (loudness * 2 / self.aged).min(MAX_THICKNESS) as u8
        };

        let threshold = if self.quiet { QUIET_STAY } else { QUIET_ENTER };
        let quiet_onset = if self.aged < threshold {
            let onset = !self.quiet;
            self.quiet = true;
            onset
        } else {
            self.quiet = false;
            false
        };

        BeatReport {
            beat,
            thickness,
            quiet_onset,
        }
    }

    /// Mean loudness rise at earlier candidate beats spaced `elapsed` apart,
    /// scaled to the candidate period.
    fn rhythm_total(&self, mut slot: usize) -> i64 {
        debug_assert!(self.elapsed > 0, "rhythm sum with elapsed == 0");
        if self.elapsed == 0 {
            return 0;
        }
        let step = self.elapsed as usize % BEAT_HISTORY;
        let count = BEAT_HISTORY / self.elapsed as usize;

        let mut total = 0i64;
        for _ in 1..count {
            total += self.history[slot];
            slot = (slot + BEAT_HISTORY - step) % BEAT_HISTORY;
        }
        total * self.elapsed as i64 / BEAT_HISTORY as i64
    }

    /// Base sensitivity, raised by up to 3 when this period matches the last one.
    fn rhythm_sensitivity(&self) -> i64 {
        let drift = (self.elapsed as i64 - self.prev_period as i64).abs();
        let bonus = 3 - drift / 2;
        self.sensitivity + bonus.max(0)
    }
}
