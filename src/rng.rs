/// Uniform random source owned by the engine and lent to every effect.
///
/// Seeded exactly once when the engine is created. Nothing downstream may
/// assume the same sequence across runs unless a seed was configured.
#[derive(Debug, Clone)]
pub struct Random {
    rng: fastrand::Rng,
}

impl Random {
    pub fn new() -> Self {
        Self {
            rng: fastrand::Rng::new(),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: fastrand::Rng::with_seed(seed),
        }
    }

    /// Uniform float in `[min, max)`. Swapped bounds are tolerated.
    pub fn random(&mut self, min: f32, max: f32) -> f32 {
        let (lo, hi) = if min <= max { (min, max) } else { (max, min) };
        lo + (hi - lo) * self.rng.f32()
    }

    /// Uniform integer in `[min, max]` (inclusive on both ends).
    pub fn random_int(&mut self, min: i32, max: i32) -> i32 {
        let (lo, hi) = if min <= max { (min, max) } else { (max, min) };
        self.rng.i32(lo..=hi)
    }

    /// Uniform frame count in `[min, max]`.
    pub fn frames(&mut self, min: u32, max: u32) -> u32 {
        let (lo, hi) = if min <= max { (min, max) } else { (max, min) };
        self.rng.u32(lo..=hi)
    }

    /// True with the given probability (clamped to `[0, 1]`).
    pub fn decide(&mut self, probability: f32) -> bool {
        let p = probability.clamp(0.0, 1.0);
        if p <= 0.0 {
            return false;
        }
        if p >= 1.0 {
            return true;
        }
        self.rng.f32() < p
    }

    /// Uniform index in `0..len`. `len` must be non-zero.
    pub fn index(&mut self, len: usize) -> usize {
        debug_assert!(len > 0, "index() over an empty set");
        self.rng.usize(..len.max(1))
    }

    pub fn sign(&mut self) -> f32 {
        if self.rng.bool() { 1.0 } else { -1.0 }
    }
}

impl Default for Random {
    fn default() -> Self {
        Self::new()
    }
}
