use super::{Effect, EffectCtx, Envelope};
use crate::anim::{Range, Scale};

/// Feedback zoom towards a slowly panning focus point.
pub struct Zoom {
    envelope: Envelope,
    zoom: Scale,
    pan: Range,
    pan_from: [f32; 2],
    pan_to: [f32; 2],
}

impl Zoom {
    pub fn new(ctx: &mut EffectCtx<'_>) -> Self {
        let envelope = Envelope::start(ctx, 10, 30);
        let pan_to = [ctx.rng.random(-0.3, 0.3), ctx.rng.random(-0.3, 0.3)];
        Self {
            envelope,
            zoom: Scale::new(ctx.rng, 1.01, 1.06, 20, 60),
            pan: Range::new(ctx.rng, 2, 60, 150),
            pan_from: [0.0; 2],
            pan_to,
        }
    }
}

impl Effect for Zoom {
    fn draw(&mut self, ctx: &mut EffectCtx<'_>) {
        let level = self.envelope.step(ctx.mode, ctx.rng);
        self.zoom.update();
        self.pan.update();
        if ctx.audio.beat {
            self.zoom.change(ctx.rng);
        }
        if self.pan.done() {
            self.pan_from = self.pan_to;
            self.pan_to = [ctx.rng.random(-0.3, 0.3), ctx.rng.random(-0.3, 0.3)];
            self.pan.init(ctx.rng, 2, 60, 150);
        }

        let mut focus = [0.0; 2];
        self.pan.get_cos(&self.pan_from, &self.pan_to, &mut focus);
        let z = 1.0 + (self.zoom.get() - 1.0) * level;
        let [fx, fy] = focus;
        ctx.canvas
            .warp(|x, y| (fx + (x - fx) / z, fy + (y - fy) / z));
    }
}

/// Radius-dependent twist of the previous frame.
pub struct Swirl {
    envelope: Envelope,
    twist: Range,
    from: f32,
    to: f32,
}

impl Swirl {
    pub fn new(ctx: &mut EffectCtx<'_>) -> Self {
        let envelope = Envelope::start(ctx, 10, 30);
        Self {
            envelope,
            twist: Range::new(ctx.rng, 1, 30, 90),
            from: 0.0,
            to: ctx.rng.random(0.02, 0.08) * ctx.rng.sign(),
        }
    }
}

impl Effect for Swirl {
    fn draw(&mut self, ctx: &mut EffectCtx<'_>) {
        let level = self.envelope.step(ctx.mode, ctx.rng);
        self.twist.update();
        if self.twist.done() || ctx.audio.beat {
            self.from = self.twist.get_cos1(self.from, self.to);
            self.to = ctx.rng.random(0.02, 0.08) * ctx.rng.sign();
            self.twist.init(ctx.rng, 1, 30, 90);
        }

        let angle = self.twist.get_cos1(self.from, self.to) * level;
        ctx.canvas.warp(|x, y| {
            let r = (x * x + y * y).sqrt();
            let a = angle * (1.0 - r.min(1.0));
            let (s, c) = a.sin_cos();
            (x * c - y * s, x * s + y * c)
        });
    }
}
