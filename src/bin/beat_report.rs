use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use beatvis::audio::Framer;
use beatvis::beat::{compute_loudness, BeatDetector, DEFAULT_SENSITIVITY};
use beatvis::wav::read_wav;
use clap::Parser;

/// Runs the beat detector over a WAV file the way the live loop would.
#[derive(Parser, Debug, Clone)]
#[command(name = "beat_report")]
struct Args {
    #[arg(long, default_value = "assets/test/hum_transients.wav")]
    wav: PathBuf,

    #[arg(long, default_value_t = 30, value_parser = clap::value_parser!(u32).range(1..=240))]
    fps: u32,

    #[arg(long, default_value_t = DEFAULT_SENSITIVITY)]
    sensitivity: i64,

    /// Fail unless exactly this many beats are found.
    #[arg(long)]
    expect: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
struct Beat {
    frame: usize,
    time_s: f32,
    loudness: i32,
    period: u32,
}

#[derive(Debug, Clone, Default)]
struct Report {
    frames: usize,
    beats: Vec<Beat>,
    thickness: [usize; 4],
    quiet_onsets: usize,
}

impl Report {
    /// Mean beat spacing as beats per minute, if there are at least two.
    fn bpm(&self) -> Option<f32> {
        let first = self.beats.first()?;
        let last = self.beats.last()?;
        if self.beats.len() < 2 || last.time_s <= first.time_s {
            return None;
        }
        let mean = (last.time_s - first.time_s) / (self.beats.len() - 1) as f32;
        Some(60.0 / mean)
    }
}

fn analyze(samples: &[[i16; 2]], sample_rate_hz: u32, fps: u32, sensitivity: i64) -> Report {
    let hop = Framer::hop_for(sample_rate_hz, fps);
    let mut framer = Framer::new(hop);
    let mut detector = BeatDetector::new(sensitivity);
    let mut report = Report::default();

    for (i, s) in samples.iter().enumerate() {
        if !framer.push(*s) {
            continue;
        }
        let frame = framer.frame();
        let loudness = compute_loudness(frame.left());
        let r = detector.detect(loudness);

        if r.beat {
            report.beats.push(Beat {
                frame: report.frames,
                time_s: (i + 1) as f32 / sample_rate_hz.max(1) as f32,
                loudness,
                period: detector.prev_period(),
            });
        }
        report.thickness[r.thickness.min(3) as usize] += 1;
        report.quiet_onsets += r.quiet_onset as usize;
        report.frames += 1;
    }
    report
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();
    let wav = read_wav(&args.wav).with_context(|| format!("read wav {}", args.wav.display()))?;
    if wav.samples.is_empty() {
        return Err(anyhow!("wav had no samples"));
    }

    let report = analyze(&wav.samples, wav.sample_rate_hz, args.fps, args.sensitivity);

    println!(
        "{}: {:.2}s at {} Hz, {} frames at {} fps",
        args.wav.display(),
        wav.duration_secs(),
        wav.sample_rate_hz,
        report.frames,
        args.fps
    );
    for b in &report.beats {
        println!(
            "beat frame={:>6} t={:>7.3}s loudness={:>6} period={}",
            b.frame, b.time_s, b.loudness, b.period
        );
    }
    println!("beats: {}", report.beats.len());
    match report.bpm() {
        Some(bpm) => println!("mean tempo: {bpm:.1} bpm"),
        None => println!("mean tempo: n/a"),
    }
    println!("quiet onsets: {}", report.quiet_onsets);
    println!("thickness histogram:");
    for (level, count) in report.thickness.iter().enumerate() {
        let pct = *count as f32 * 100.0 / report.frames.max(1) as f32;
        println!("  {level}: {count:>6} ({pct:>5.1}%)");
    }

    if let Some(want) = args.expect {
        if report.beats.len() != want {
            return Err(anyhow!("expected {want} beats, found {}", report.beats.len()));
        }
    }
    Ok(())
}
