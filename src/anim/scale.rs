use super::Range;
use crate::rng::Random;

/// Scalar zoom factor that wanders between `min` and `max`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scale {
    range: Range,
    min: f32,
    max: f32,
    min_frames: u32,
    max_frames: u32,
    start: f32,
    end: f32,
}

impl Scale {
    pub fn new(rng: &mut Random, min: f32, max: f32, min_frames: u32, max_frames: u32) -> Self {
        let value = rng.random(min, max);
        Self {
            range: Range::default(),
            min: min.min(max),
            max: max.max(min),
            min_frames,
            max_frames,
            start: value,
            end: value,
        }
    }

    /// A scale resting on `value` until the first change.
    pub fn fixed(value: f32, min: f32, max: f32, min_frames: u32, max_frames: u32) -> Self {
        Self {
            range: Range::default(),
            min: min.min(max),
            max: max.max(min),
            min_frames,
            max_frames,
            start: value,
            end: value,
        }
    }

    pub fn get(&self) -> f32 {
        self.range.get1(self.start, self.end)
    }

    pub fn target(&self) -> f32 {
        self.end
    }

    pub fn bounds(&self) -> (f32, f32) {
        (self.min, self.max)
    }

    pub fn update(&mut self) {
        self.range.update();
    }

    pub fn done(&self) -> bool {
        self.range.done()
    }

    /// New random target with a fresh random duration, starting where we are now.
    pub fn change(&mut self, rng: &mut Random) {
        self.start = self.get();
        self.end = rng.random(self.min, self.max);
        self.range.init(rng, 1, self.min_frames, self.max_frames);
    }

    /// Deterministic variant of [`Scale::change`]. The target is clamped to the bounds.
    pub fn change_to(&mut self, target: f32, frames: u32) {
        self.start = self.get();
        self.end = target.clamp(self.min, self.max);
        self.range = Range::with_duration(1, frames);
    }
}
