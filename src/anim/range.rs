use crate::rng::Random;
use std::f32::consts::PI;

/// Frame-counted interpolator between two vectors of `num_values` floats.
///
/// The counter never exceeds the duration, and the duration is never zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Range {
    num_values: usize,
    frame: u32,
    duration: u32,
}

impl Default for Range {
    /// A finished one-frame range, so `get` yields `end` until `init` runs.
    fn default() -> Self {
        Self {
            num_values: 1,
            frame: 1,
            duration: 1,
        }
    }
}

impl Range {
    /// Starts a transition with a random duration in `[min_frames, max_frames]`.
    pub fn new(rng: &mut Random, num_values: usize, min_frames: u32, max_frames: u32) -> Self {
        let mut r = Self::default();
        r.init(rng, num_values, min_frames, max_frames);
        r
    }

    pub fn with_duration(num_values: usize, frames: u32) -> Self {
        Self {
            num_values,
            frame: 0,
            duration: frames.max(1),
        }
    }

    pub fn init(&mut self, rng: &mut Random, num_values: usize, min_frames: u32, max_frames: u32) {
        self.num_values = num_values;
        self.frame = 0;
        self.duration = rng.frames(min_frames, max_frames).max(1);
    }

    pub fn update(&mut self) {
        if self.frame < self.duration {
            self.frame += 1;
        }
    }

    pub fn done(&self) -> bool {
        self.frame == self.duration
    }

    pub fn frame(&self) -> u32 {
        self.frame
    }

    pub fn duration(&self) -> u32 {
        self.duration
    }

    pub fn num_values(&self) -> usize {
        self.num_values
    }

    /// Linear progress in `[0, 1]`.
    pub fn fraction(&self) -> f32 {
        self.frame as f32 / self.duration as f32
    }

    /// Progress eased through `(1 - cos(t * pi)) / 2`.
    pub fn fraction_cos(&self) -> f32 {
        (1.0 - (self.fraction() * PI).cos()) * 0.5
    }

    pub fn get(&self, start: &[f32], end: &[f32], out: &mut [f32]) {
        self.blend(self.fraction(), start, end, out);
    }

    pub fn get_cos(&self, start: &[f32], end: &[f32], out: &mut [f32]) {
        self.blend(self.fraction_cos(), start, end, out);
    }

    pub fn get1(&self, start: f32, end: f32) -> f32 {
        self.blend1(self.fraction(), start, end)
    }

    pub fn get_cos1(&self, start: f32, end: f32) -> f32 {
        self.blend1(self.fraction_cos(), start, end)
    }

    fn blend(&self, t: f32, start: &[f32], end: &[f32], out: &mut [f32]) {
        debug_assert!(
            start.len() >= self.num_values
                && end.len() >= self.num_values
                && out.len() >= self.num_values,
            "range over {} values given short slices",
            self.num_values
        );
        for ((o, s), e) in out
            .iter_mut()
            .zip(start)
            .zip(end)
            .take(self.num_values)
        {
            *o = self.blend1(t, *s, *e);
        }
    }

    fn blend1(&self, t: f32, start: f32, end: f32) -> f32 {
        if self.done() {
            end
        } else if self.frame == 0 {
            start
        } else {
            start + (end - start) * t
        }
    }
}
