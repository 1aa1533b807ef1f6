use super::{Effect, EffectCtx, Envelope};
use crate::anim::{apply, Offset, Rotator, Scale};
use crate::audio::FRAME_SAMPLES;
use crate::canvas::hsv;

const SCOPE_POINTS: usize = 128;

/// Left-channel waveform that wanders around the screen and jolts on beats.
pub struct Scope {
    envelope: Envelope,
    offset: Offset,
    gain: Scale,
    hue: f32,
}

impl Scope {
    pub fn new(ctx: &mut EffectCtx<'_>) -> Self {
        let envelope = Envelope::start(ctx, 20, 50);
        Self {
            envelope,
            offset: Offset::new(ctx.rng, 0.35, 0.02, 120, 300),
            gain: Scale::new(ctx.rng, 0.5, 1.5, 40, 120),
            hue: ctx.rng.random(0.0, 1.0),
        }
    }
}

impl Effect for Scope {
    fn draw(&mut self, ctx: &mut EffectCtx<'_>) {
        let level = self.envelope.step(ctx.mode, ctx.rng);
        if ctx.audio.beat {
            self.offset.kick();
            self.hue = (self.hue + 0.07).fract();
        }
        if ctx.audio.quiet {
            self.offset.change(ctx.rng);
        }
        self.offset.update(ctx.rng);
        self.gain.update();
        if self.gain.done() {
            self.gain.change(ctx.rng);
        }

        let [ox, oy, _] = self.offset.get();
        let gain = self.gain.get() * level;
        let samples = ctx.audio.time.left();
        let color = hsv(self.hue, 0.8, 1.0);

        let mut prev: Option<(f32, f32)> = None;
        for i in 0..SCOPE_POINTS {
            let s = samples[i * FRAME_SAMPLES / SCOPE_POINTS] as f32 / 32768.0;
            let x = -1.2 + 2.4 * i as f32 / (SCOPE_POINTS - 1) as f32 + ox;
            let y = s * gain + oy;
            if let Some(p) = prev {
                ctx.canvas.line(p, (x, y), color, ctx.audio.thickness, level);
            }
            prev = Some((x, y));
        }
    }
}

const CUBE_EDGES: [(usize, usize); 12] = [
    (0, 1),
    (1, 3),
    (3, 2),
    (2, 0),
    (4, 5),
    (5, 7),
    (7, 6),
    (6, 4),
    (0, 4),
    (1, 5),
    (2, 6),
    (3, 7),
];

/// Wireframe cube. Beats either respin it or snap it to a new orientation.
pub struct Cube {
    envelope: Envelope,
    rotator: Rotator,
    size: Scale,
    hue: f32,
}

impl Cube {
    pub fn new(ctx: &mut EffectCtx<'_>) -> Self {
        let envelope = Envelope::start(ctx, 30, 60);
        Self {
            envelope,
            rotator: Rotator::new(ctx.rng),
            size: Scale::new(ctx.rng, 0.35, 0.7, 30, 90),
            hue: ctx.rng.random(0.0, 1.0),
        }
    }
}

impl Effect for Cube {
    fn draw(&mut self, ctx: &mut EffectCtx<'_>) {
        let level = self.envelope.step(ctx.mode, ctx.rng);
        if ctx.audio.beat {
            if ctx.rng.decide(0.5) {
                let target = [
                    ctx.rng.random(0.0, 360.0),
                    ctx.rng.random(0.0, 360.0),
                    ctx.rng.random(0.0, 360.0),
                ];
                let frames = ctx.rng.frames(12, 30);
                self.rotator.turn_to(target, frames);
            } else {
                self.rotator.change(ctx.rng);
            }
            self.size.change(ctx.rng);
            self.hue = (self.hue + 0.11).fract();
        } else if self.rotator.turn_done() {
            self.rotator.change(ctx.rng);
        }
        self.rotator.update();
        self.size.update();

        let s = self.size.get() * level;
        let m = self.rotator.matrix();
        let mut corners = [(0.0f32, 0.0f32); 8];
        for (i, c) in corners.iter_mut().enumerate() {
            let v = [
                if i & 1 == 0 { -s } else { s },
                if i & 2 == 0 { -s } else { s },
                if i & 4 == 0 { -s } else { s },
            ];
            let [x, y, z] = apply(&m, v);
            let depth = 3.0 + z;
            *c = (x * 3.0 / depth, y * 3.0 / depth);
        }

        let color = hsv(self.hue, 0.6, 1.0);
        for (a, b) in CUBE_EDGES {
            ctx.canvas.line(corners[a], corners[b], color, ctx.audio.thickness, level);
        }
    }
}
