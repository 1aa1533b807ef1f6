use crate::audio::{FRAME_SAMPLES, SPECTRUM_BINS};
use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use std::f32::consts::PI;
use std::fmt;
use std::sync::Arc;

/// Hann-windowed magnitude spectrum of one 512-sample channel.
pub struct SpectrumAnalyzer {
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    buf: Vec<Complex<f32>>,
}

impl SpectrumAnalyzer {
    pub fn new() -> Self {
        let n = FRAME_SAMPLES;
        let mut planner = FftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(n);
        let window = (0..n)
            .map(|i| 0.5 - 0.5 * ((2.0 * PI * i as f32) / n as f32).cos())
            .collect();
        Self {
            fft,
            window,
            buf: vec![Complex { re: 0.0, im: 0.0 }; n],
        }
    }

    /// Magnitudes normalized so a full-scale sine peaks near 1.0.
    pub fn analyze(&mut self, samples: &[i16; FRAME_SAMPLES], out: &mut [f32; SPECTRUM_BINS]) {
        for ((c, s), w) in self.buf.iter_mut().zip(samples).zip(&self.window) {
            c.re = (*s as f32 / 32768.0) * w;
            c.im = 0.0;
        }
        self.fft.process(&mut self.buf);

        // Hann window halves the coherent gain; one-sided spectrum doubles it back.
        let norm = 4.0 / FRAME_SAMPLES as f32;
        for (o, c) in out.iter_mut().zip(&self.buf) {
            *o = c.norm() * norm;
        }
    }
}

impl Default for SpectrumAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SpectrumAnalyzer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpectrumAnalyzer")
            .field("size", &self.buf.len())
            .finish()
    }
}
