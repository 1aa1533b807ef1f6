use super::{Range, Rotator};
use crate::rng::Random;
use std::f32::consts::TAU;

const KICK: f32 = 2.0;
const KICK_MAX: f32 = 8.0;
const KICK_DECAY: f32 = 0.99;

/// Positional wander: an ellipse whose axes drift over time, traced at a
/// phase speed that can be kicked, then tilted by its own rotator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Offset {
    range: Range,
    axes_start: [f32; 2],
    axes_end: [f32; 2],
    max_axis: f32,
    min_frames: u32,
    max_frames: u32,
    phi: f32,
    delta_phi: f32,
    delta_phi_fac: f32,
    rotator: Rotator,
    offset: [f32; 3],
}

impl Offset {
    /// `max_axis` bounds the wander radius; `delta_phi` is the base phase
    /// step in radians per frame.
    pub fn new(
        rng: &mut Random,
        max_axis: f32,
        delta_phi: f32,
        min_frames: u32,
        max_frames: u32,
    ) -> Self {
        let mut o = Self {
            range: Range::default(),
            axes_start: [0.0; 2],
            axes_end: [0.0; 2],
            max_axis: max_axis.abs(),
            min_frames,
            max_frames,
            phi: rng.random(0.0, TAU),
            delta_phi,
            delta_phi_fac: 0.0,
            rotator: Rotator::new(rng),
            offset: [0.0; 3],
        };
        o.retarget(rng);
        o
    }

    pub fn get(&self) -> [f32; 3] {
        self.offset
    }

    pub fn phase(&self) -> f32 {
        self.phi
    }

    pub fn speed_factor(&self) -> f32 {
        1.0 + self.delta_phi_fac
    }

    pub fn rotator(&self) -> &Rotator {
        &self.rotator
    }

    pub fn axes(&self) -> [f32; 2] {
        let mut out = [0.0; 2];
        self.range.get_cos(&self.axes_start, &self.axes_end, &mut out);
        out
    }

    pub fn update(&mut self, rng: &mut Random) {
        self.phi = (self.phi + self.delta_phi * (1.0 + self.delta_phi_fac)).rem_euclid(TAU);
        self.delta_phi_fac *= KICK_DECAY;

        self.range.update();
        self.rotator.update();
        if self.range.done() {
            self.retarget(rng);
        }

        let [a, b] = self.axes();
        let point = [a * self.phi.cos(), b * self.phi.sin(), 0.0];
        self.offset = self.rotator.rotate(point);
    }

    /// Transient speed-up that decays back to the base phase speed.
    pub fn kick(&mut self) {
        self.delta_phi_fac = (self.delta_phi_fac + KICK).min(KICK_MAX);
    }

    /// New wander axes and a new tilt spin.
    pub fn change(&mut self, rng: &mut Random) {
        self.retarget(rng);
        self.rotator.change(rng);
    }

    fn retarget(&mut self, rng: &mut Random) {
        self.axes_start = self.axes();
        self.axes_end = [
            rng.random(0.0, self.max_axis),
            rng.random(0.0, self.max_axis),
        ];
        self.range.init(rng, 2, self.min_frames, self.max_frames);
    }
}
