use crate::beat::DEFAULT_SENSITIVITY;
use crate::feedback::DEFAULT_KEEP;
use crate::slot::{SlotKind, SlotPolicy};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Library-side engine settings.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Fixed RNG seed; `None` seeds from entropy.
    pub seed: Option<u64>,
    pub beat_sensitivity: i64,
    /// Indexed by [`SlotKind::index`].
    pub policies: [SlotPolicy; 3],
    pub feedback_keep: f32,
    pub show_titles: bool,
    pub title_frames: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            seed: None,
            beat_sensitivity: DEFAULT_SENSITIVITY,
            policies: SlotKind::all().map(SlotPolicy::default_for),
            feedback_keep: DEFAULT_KEEP,
            show_titles: true,
            title_frames: 90,
        }
    }
}

impl EngineConfig {
    pub fn policy(&self, kind: SlotKind) -> &SlotPolicy {
        &self.policies[kind.index()]
    }

    pub fn policy_mut(&mut self, kind: SlotKind) -> &mut SlotPolicy {
        &mut self.policies[kind.index()]
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

#[derive(Parser, Debug, Clone)]
#[command(name = "beatvis", version, about = "Beat-driven terminal visualizer")]
pub struct Config {
    #[arg(long, value_enum, default_value_t = AudioSource::Mic)]
    pub source: AudioSource,

    /// WAV file for `--source wav` (PCM16 or Float32).
    #[arg(long, value_name = "WAV")]
    pub wav: Option<PathBuf>,

    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub loop_wav: bool,

    /// Substring of the capture device name.
    #[arg(long)]
    pub device: Option<String>,

    #[arg(long, default_value_t = 30, value_parser = clap::value_parser!(u32).range(1..=240))]
    pub fps: u32,

    #[arg(long)]
    pub seed: Option<u64>,

    #[arg(long, default_value_t = DEFAULT_SENSITIVITY)]
    pub sensitivity: i64,

    #[arg(long, default_value_t = false)]
    pub no_titles: bool,

    #[arg(long, default_value_t = false)]
    pub list_devices: bool,

    /// Wrap frames in synchronized-output escapes.
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub sync_updates: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AudioSource {
    Mic,
    Wav,
}

impl Config {
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            seed: self.seed,
            beat_sensitivity: self.sensitivity.max(1),
            show_titles: !self.no_titles,
            ..EngineConfig::default()
        }
    }
}
