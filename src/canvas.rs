//! Software RGBA target the effects draw into.
//!
//! Coordinates passed to the drawing helpers are normalized: x and y span
//! `[-1, 1]` across the shorter side, centered, y pointing up.

pub type Rgb = [u8; 3];

#[derive(Debug, Clone, Default)]
pub struct Canvas {
    w: usize,
    h: usize,
    pixels: Vec<u8>,
    scratch: Vec<u8>,
}

impl Canvas {
    pub fn new(w: usize, h: usize) -> Self {
        let mut c = Self::default();
        c.resize(w, h);
        c
    }

    pub fn resize(&mut self, w: usize, h: usize) {
        self.w = w;
        self.h = h;
        let n = w.saturating_mul(h).saturating_mul(4);
        self.pixels.clear();
        self.pixels.resize(n, 0);
        self.scratch.clear();
        self.scratch.resize(n, 0);
        for px in self.pixels.chunks_exact_mut(4) {
            px[3] = 255;
        }
    }

    pub fn width(&self) -> usize {
        self.w
    }

    pub fn height(&self) -> usize {
        self.h
    }

    pub fn is_empty(&self) -> bool {
        self.w == 0 || self.h == 0
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<Rgb> {
        if x >= self.w || y >= self.h {
            return None;
        }
        let i = (y * self.w + x) * 4;
        Some([self.pixels[i], self.pixels[i + 1], self.pixels[i + 2]])
    }

    pub fn clear(&mut self) {
        for px in self.pixels.chunks_exact_mut(4) {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
        }
    }

    /// Multiplies every channel by `keep` in `[0, 1]`.
    pub fn fade(&mut self, keep: f32) {
        let k = (keep.clamp(0.0, 1.0) * 256.0) as u32;
        for px in self.pixels.chunks_exact_mut(4) {
            for c in &mut px[..3] {
                *c = ((*c as u32 * k) >> 8) as u8;
            }
        }
    }

    /// Blends `color` over the whole canvas with the given opacity.
    pub fn wash(&mut self, color: Rgb, alpha: f32) {
        let a = alpha.clamp(0.0, 1.0);
        if a <= 0.0 {
            return;
        }
        for px in self.pixels.chunks_exact_mut(4) {
            for (c, t) in px[..3].iter_mut().zip(color) {
                *c = lerp_u8(*c, t, a);
            }
        }
    }

    /// Normalized coordinates to pixel coordinates.
    pub fn to_screen(&self, x: f32, y: f32) -> (f32, f32) {
        let half = self.w.min(self.h) as f32 * 0.5;
        (
            self.w as f32 * 0.5 + x * half,
            self.h as f32 * 0.5 - y * half,
        )
    }

    pub fn plot(&mut self, x: f32, y: f32, color: Rgb, alpha: f32) {
        let (sx, sy) = self.to_screen(x, y);
        self.plot_px(sx, sy, color, alpha);
    }

    /// Line between normalized points, `thickness` extra pixels each side.
    pub fn line(&mut self, from: (f32, f32), to: (f32, f32), color: Rgb, thickness: u8, alpha: f32) {
        let (x0, y0) = self.to_screen(from.0, from.1);
        let (x1, y1) = self.to_screen(to.0, to.1);
        let steps = (x1 - x0).abs().max((y1 - y0).abs()).ceil().max(1.0).min(4096.0) as usize;
        let r = thickness as i32;
        for s in 0..=steps {
            let t = s as f32 / steps as f32;
            let x = x0 + (x1 - x0) * t;
            let y = y0 + (y1 - y0) * t;
            for dy in -r..=r {
                for dx in -r..=r {
                    self.plot_px(x + dx as f32, y + dy as f32, color, alpha);
                }
            }
        }
    }

    /// Resamples the current picture: each destination pixel (normalized
    /// coordinates) reads from the source point `map` returns.
    pub fn warp(&mut self, map: impl Fn(f32, f32) -> (f32, f32)) {
        if self.is_empty() {
            return;
        }
        self.scratch.copy_from_slice(&self.pixels);
        let half = self.w.min(self.h) as f32 * 0.5;
        let (cx, cy) = (self.w as f32 * 0.5, self.h as f32 * 0.5);
        for y in 0..self.h {
            for x in 0..self.w {
                let nx = (x as f32 + 0.5 - cx) / half;
                let ny = (cy - y as f32 - 0.5) / half;
                let (sx, sy) = map(nx, ny);
                let px = (cx + sx * half).floor();
                let py = (cy - sy * half).floor();
                let dst = (y * self.w + x) * 4;
                if px < 0.0 || py < 0.0 || px >= self.w as f32 || py >= self.h as f32 {
                    self.pixels[dst..dst + 3].fill(0);
                    continue;
                }
                let src = (py as usize * self.w + px as usize) * 4;
                self.pixels[dst..dst + 3].copy_from_slice(&self.scratch[src..src + 3]);
            }
        }
    }

    fn plot_px(&mut self, x: f32, y: f32, color: Rgb, alpha: f32) {
        if x < 0.0 || y < 0.0 {
            return;
        }
        let (xi, yi) = (x as usize, y as usize);
        if xi >= self.w || yi >= self.h {
            return;
        }
        let i = (yi * self.w + xi) * 4;
        let a = alpha.clamp(0.0, 1.0);
        for (c, t) in self.pixels[i..i + 3].iter_mut().zip(color) {
            *c = lerp_u8(*c, t, a);
        }
    }
}

fn lerp_u8(from: u8, to: u8, t: f32) -> u8 {
    (from as f32 + (to as f32 - from as f32) * t).round().clamp(0.0, 255.0) as u8
}

/// HSV (all in `[0, 1]`) to RGB.
pub fn hsv(h: f32, s: f32, v: f32) -> Rgb {
    let h = h.rem_euclid(1.0) * 6.0;
    let i = h.floor();
    let f = h - i;
    let p = v * (1.0 - s);
    let q = v * (1.0 - s * f);
    let t = v * (1.0 - s * (1.0 - f));
    let (r, g, b) = match i as u32 {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        _ => (v, p, q),
    };
    [
        (r.clamp(0.0, 1.0) * 255.0) as u8,
        (g.clamp(0.0, 1.0) * 255.0) as u8,
        (b.clamp(0.0, 1.0) * 255.0) as u8,
    ]
}
