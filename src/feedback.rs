use crate::effects::EffectRegistry;
use crate::slot::{EffectSlot, SlotEvent, Stage};

pub const DEFAULT_KEEP: f32 = 0.86;

/// Full-screen texture feedback: the previous frame is kept, dimmed, and
/// handed to the texture slot to warp before the other slots draw on top.
#[derive(Debug, Clone)]
pub struct Feedback {
    keep: f32,
    frames: u64,
}

impl Feedback {
    pub fn new(keep: f32) -> Self {
        Self {
            keep: keep.clamp(0.0, 1.0),
            frames: 0,
        }
    }

    pub fn keep(&self) -> f32 {
        self.keep
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn update(
        &mut self,
        texture: &mut EffectSlot,
        registry: &EffectRegistry,
        stage: &mut Stage<'_>,
    ) -> Option<SlotEvent> {
        self.frames += 1;
        stage.canvas.fade(self.keep);
        texture.draw(registry, stage)
    }
}

impl Default for Feedback {
    fn default() -> Self {
        Self::new(DEFAULT_KEEP)
    }
}
