use std::f32::consts::PI;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use beatvis::audio::to_i16;
use beatvis::wav::write_wav_i16_stereo;
use clap::Parser;

/// Writes a stereo PCM16 fixture: a low hum with evenly spaced transients.
#[derive(Parser, Debug)]
#[command(name = "gen_test_audio")]
struct Args {
    #[arg(long, default_value = "assets/test/hum_transients.wav")]
    out: PathBuf,

    #[arg(long, default_value_t = 48_000, value_parser = clap::value_parser!(u32).range(8_000..=192_000))]
    sample_rate: u32,

    #[arg(long, default_value_t = 20.0)]
    seconds: f32,

    /// Transients per minute.
    #[arg(long, default_value_t = 90.0)]
    bpm: f32,

    /// Hum level, 0..1 of full scale.
    #[arg(long, default_value_t = 0.06)]
    hum: f32,

    /// Transient peak level, 0..1 of full scale.
    #[arg(long, default_value_t = 0.5)]
    hit: f32,

    /// Seconds of silence before the hum starts.
    #[arg(long, default_value_t = 1.0)]
    lead_in: f32,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();
    if let Some(parent) = args.out.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create dir {}", parent.display()))?;
    }

    let samples = make_fixture(&args);
    write_wav_i16_stereo(&args.out, args.sample_rate, &samples)
        .with_context(|| format!("write {}", args.out.display()))?;

    println!("generated: {}", args.out.display());
    println!(
        "sample_rate={}Hz duration={:.2}s frames={} hits={}",
        args.sample_rate,
        samples.len() as f32 / args.sample_rate as f32,
        samples.len(),
        hit_times(&args).len()
    );
    Ok(())
}

fn hit_times(args: &Args) -> Vec<f32> {
    let period = 60.0 / args.bpm.max(1.0);
    let mut t = args.lead_in.max(0.0) + period;
    let mut out = Vec::new();
    while t + 0.1 < args.seconds {
        out.push(t);
        t += period;
    }
    out
}

fn make_fixture(args: &Args) -> Vec<[i16; 2]> {
    let sr = args.sample_rate as f32;
    let n = (args.seconds.max(0.0) * sr).round() as usize;
    let hits = hit_times(args);
    let hit_len = 0.030f32;

    (0..n)
        .map(|i| {
            let t = i as f32 / sr;
            if t < args.lead_in {
                return [0, 0];
            }
            let hum = (2.0 * PI * 110.0 * t).sin() * args.hum;

            let mut hit = 0.0;
            if let Some(h) = hits.iter().find(|h| t >= **h && t < **h + hit_len) {
                let local = t - h;
                let env = (1.0 - local / hit_len).powf(2.0);
                let thump = (2.0 * PI * 70.0 * local).sin();
                let click = pseudo_noise(i as u32) * 0.4;
                hit = (thump + click) * env * args.hit;
            }

            // Slight stereo offset so the channels are not identical.
            let left = to_i16(hum + hit);
            let right = to_i16(hum * 0.9 + hit);
            [left, right]
        })
        .collect()
}

fn pseudo_noise(x: u32) -> f32 {
    let mut n = x.wrapping_mul(374_761_393);
    n ^= n >> 13;
    n = n.wrapping_mul(1_274_126_177);
    n ^= n >> 16;
    let v = (n & 0x00FF_FFFF) as f32 / 16_777_215.0;
    v * 2.0 - 1.0
}
