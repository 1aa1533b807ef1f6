use super::{Effect, EffectCtx, Envelope};
use crate::anim::{apply, Range, Rotator, Scale};
use crate::canvas::hsv;

const STARS: usize = 160;

/// Slowly spinning point cloud; respins and rescales on beats.
pub struct Starfield {
    envelope: Envelope,
    stars: Vec<[f32; 3]>,
    rotator: Rotator,
    scale: Scale,
    hue: f32,
}

impl Starfield {
    pub fn new(ctx: &mut EffectCtx<'_>) -> Self {
        let envelope = Envelope::start(ctx, 40, 90);
        let rng = &mut *ctx.rng;
        let stars = (0..STARS)
            .map(|_| {
                [
                    rng.random(-1.0, 1.0),
                    rng.random(-1.0, 1.0),
                    rng.random(-1.0, 1.0),
                ]
            })
            .collect();
        Self {
            envelope,
            stars,
            rotator: Rotator::new(rng),
            scale: Scale::new(rng, 0.6, 1.3, 60, 180),
            hue: rng.random(0.0, 1.0),
        }
    }
}

impl Effect for Starfield {
    fn draw(&mut self, ctx: &mut EffectCtx<'_>) {
        let level = self.envelope.step(ctx.mode, ctx.rng);
        if ctx.audio.beat {
            self.rotator.change(ctx.rng);
            self.scale.change(ctx.rng);
            self.hue = (self.hue + 0.13).fract();
        }
        self.rotator.update();
        self.scale.update();

        let m = self.rotator.matrix();
        let s = self.scale.get();
        for star in &self.stars {
            let [x, y, z] = apply(&m, *star).map(|c| c * s);
            let depth = 2.5 + z;
            if depth <= 0.1 {
                continue;
            }
            let bright = (1.6 / depth).clamp(0.2, 1.0);
            ctx.canvas.plot(
                x * 2.0 / depth,
                y * 2.0 / depth,
                hsv(self.hue, 0.35, bright),
                level,
            );
        }
    }
}

/// Drifting color wash with spectrum curtains along the bottom edge.
pub struct Aurora {
    envelope: Envelope,
    range: Range,
    from: [f32; 3],
    to: [f32; 3],
}

impl Aurora {
    pub fn new(ctx: &mut EffectCtx<'_>) -> Self {
        let envelope = Envelope::start(ctx, 60, 120);
        let to = [ctx.rng.random(0.0, 1.0), 0.7, 0.5];
        Self {
            envelope,
            range: Range::new(ctx.rng, 3, 60, 240),
            from: [to[0], 0.0, 0.0],
            to,
        }
    }

    fn retarget(&mut self, ctx: &mut EffectCtx<'_>) {
        let mut now = [0.0; 3];
        self.range.get_cos(&self.from, &self.to, &mut now);
        self.from = now;
        self.to = [
            ctx.rng.random(0.0, 1.0),
            ctx.rng.random(0.4, 0.9),
            ctx.rng.random(0.3, 0.7),
        ];
        self.range.init(ctx.rng, 3, 60, 240);
    }
}

impl Effect for Aurora {
    fn draw(&mut self, ctx: &mut EffectCtx<'_>) {
        let level = self.envelope.step(ctx.mode, ctx.rng);
        self.range.update();
        if self.range.done() || (ctx.audio.beat && ctx.rng.decide(0.3)) {
            self.retarget(ctx);
        }

        let mut hsv_now = [0.0; 3];
        self.range.get_cos(&self.from, &self.to, &mut hsv_now);
        let color = hsv(hsv_now[0], hsv_now[1], hsv_now[2]);
        ctx.canvas.wash(color, 0.06 * level);

        let bins = 48usize;
        for i in 0..bins {
            let mag = ctx.audio.spectrum[0][i + 1].sqrt().min(1.0);
            let x = -1.0 + 2.0 * (i as f32 + 0.5) / bins as f32;
            let top = -1.0 + mag * 1.2;
            let tint = hsv(hsv_now[0] + i as f32 / bins as f32 * 0.25, 0.6, 0.9);
            ctx.canvas.line((x, -1.0), (x, top), tint, 0, 0.5 * level);
        }
    }
}
