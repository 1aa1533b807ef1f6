//! Beat-reactive visualization engine with a terminal front-end.

pub mod anim;
pub mod app;
pub mod audio;
pub mod beat;
pub mod canvas;
pub mod config;
pub mod effects;
pub mod engine;
pub mod feedback;
pub mod overlay;
pub mod render;
pub mod rng;
pub mod slot;
pub mod spectrum;
pub mod terminal;
pub mod wav;

pub use audio::{AudioFrame, AudioInput, AudioState};
pub use config::EngineConfig;
pub use engine::{Engine, FrameReport};
pub use slot::{SlotKind, SlotMode, SlotPolicy};
