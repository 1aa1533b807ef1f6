use crate::audio::AudioState;
use crate::canvas::Canvas;
use crate::effects::{Effect, EffectCtx, EffectError, EffectRegistry};
use crate::rng::Random;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SlotKind {
    Background,
    Foreground,
    Texture,
}

impl SlotKind {
    pub const fn all() -> [Self; 3] {
        [Self::Background, Self::Foreground, Self::Texture]
    }

    pub const fn index(self) -> usize {
        match self {
            Self::Background => 0,
            Self::Foreground => 1,
            Self::Texture => 2,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Background => "background",
            Self::Foreground => "foreground",
            Self::Texture => "texture",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SlotMode {
    Starting,
    Running,
    Finish,
    Finishing,
    Done,
}

impl SlotMode {
    pub fn label(self) -> &'static str {
        match self {
            Self::Starting => "starting",
            Self::Running => "running",
            Self::Finish => "finish",
            Self::Finishing => "finishing",
            Self::Done => "done",
        }
    }
}

/// When the manager may ask a running effect to leave.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SlotPolicy {
    /// Frames since load before a finish may be rolled.
    pub min_frames: u32,
    /// Chance per beat frame, once `min_frames` has passed.
    pub finish_probability: f32,
}

impl SlotPolicy {
    pub fn default_for(kind: SlotKind) -> Self {
        match kind {
            SlotKind::Background => Self {
                min_frames: 500,
                finish_probability: 0.02,
            },
            SlotKind::Foreground => Self {
                min_frames: 300,
                finish_probability: 0.02,
            },
            SlotKind::Texture => Self {
                min_frames: 100,
                finish_probability: 0.40,
            },
        }
    }
}

/// Shared per-frame state lent to a slot while it steps or draws.
pub struct Stage<'a> {
    pub audio: &'a AudioState,
    pub rng: &'a mut Random,
    pub canvas: &'a mut Canvas,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotEvent {
    Loaded {
        kind: SlotKind,
        index: usize,
        name: &'static str,
    },
    FinishRequested {
        kind: SlotKind,
        next: usize,
        next_name: &'static str,
    },
    LoadFailed {
        kind: SlotKind,
        error: EffectError,
    },
}

/// One of the three independent effect lifecycles.
pub struct EffectSlot {
    kind: SlotKind,
    effect: Option<Box<dyn Effect>>,
    current: Option<usize>,
    name: Option<&'static str>,
    mode: SlotMode,
    frames: u32,
    next: Option<usize>,
}

impl EffectSlot {
    /// Empty slots count as `Done` and load on their first step.
    pub fn new(kind: SlotKind) -> Self {
        Self {
            kind,
            effect: None,
            current: None,
            name: None,
            mode: SlotMode::Done,
            frames: 0,
            next: None,
        }
    }

    pub fn kind(&self) -> SlotKind {
        self.kind
    }

    pub fn mode(&self) -> SlotMode {
        self.mode
    }

    pub fn frames(&self) -> u32 {
        self.frames
    }

    pub fn current(&self) -> Option<usize> {
        self.current
    }

    pub fn name(&self) -> Option<&'static str> {
        self.name
    }

    pub fn next(&self) -> Option<usize> {
        self.next
    }

    pub fn is_loaded(&self) -> bool {
        self.effect.is_some()
    }

    /// Manager side of the state machine, once per frame before drawing.
    pub fn step(
        &mut self,
        policy: &SlotPolicy,
        beat: bool,
        registry: &EffectRegistry,
        stage: &mut Stage<'_>,
    ) -> Option<SlotEvent> {
        if self.effect.is_none() || self.mode == SlotMode::Done {
            return self.replace(registry, stage);
        }

        self.frames = self.frames.saturating_add(1);
        if self.mode == SlotMode::Running
            && self.frames >= policy.min_frames
            && beat
            && stage.rng.decide(policy.finish_probability)
        {
            return self.begin_finish(registry, stage.rng);
        }
        None
    }

    /// Asks a loaded effect to leave without rolling the policy.
    pub fn request_finish(&mut self, registry: &EffectRegistry, rng: &mut Random) -> Option<SlotEvent> {
        match self.mode {
            SlotMode::Starting | SlotMode::Running if self.effect.is_some() => {
                self.begin_finish(registry, rng)
            }
            _ => None,
        }
    }

    /// Draws the effect; a `Done` reported by the effect is consumed right here.
    pub fn draw(&mut self, registry: &EffectRegistry, stage: &mut Stage<'_>) -> Option<SlotEvent> {
        let fx = self.effect.as_mut()?;
        let mut ctx = EffectCtx {
            audio: stage.audio,
            rng: &mut *stage.rng,
            canvas: &mut *stage.canvas,
            mode: &mut self.mode,
        };
        fx.draw(&mut ctx);

        if self.mode == SlotMode::Done {
            return self.replace(registry, stage);
        }
        None
    }

    /// Cleans up the loaded effect, leaving the slot empty.
    pub fn shutdown(&mut self) {
        if let Some(mut fx) = self.effect.take() {
            fx.cleanup();
        }
        self.current = None;
        self.name = None;
        self.next = None;
        self.mode = SlotMode::Done;
        self.frames = 0;
    }

    fn begin_finish(&mut self, registry: &EffectRegistry, rng: &mut Random) -> Option<SlotEvent> {
        let len = registry.len(self.kind);
        if len == 0 {
            return None;
        }
        let next = pick_other(rng, len, self.current);
        self.mode = SlotMode::Finish;
        self.next = Some(next);
        Some(SlotEvent::FinishRequested {
            kind: self.kind,
            next,
            next_name: registry.entries(self.kind)[next].name,
        })
    }

    fn replace(&mut self, registry: &EffectRegistry, stage: &mut Stage<'_>) -> Option<SlotEvent> {
        let previous = self.current;
        let queued = self.next.take();
        self.shutdown();

        let entries = registry.entries(self.kind);
        if entries.is_empty() {
            return Some(SlotEvent::LoadFailed {
                kind: self.kind,
                error: EffectError::Empty { kind: self.kind },
            });
        }

        let index = match queued {
            Some(i) if i < entries.len() => i,
            _ => pick_other(stage.rng, entries.len(), previous),
        };
        let entry = &entries[index];

        self.mode = SlotMode::Running;
        let mut ctx = EffectCtx {
            audio: stage.audio,
            rng: &mut *stage.rng,
            canvas: &mut *stage.canvas,
            mode: &mut self.mode,
        };
        match entry.create(&mut ctx) {
            Ok(fx) => {
                self.effect = Some(fx);
                self.current = Some(index);
                self.name = Some(entry.name);
                Some(SlotEvent::Loaded {
                    kind: self.kind,
                    index,
                    name: entry.name,
                })
            }
            Err(error) => {
                self.mode = SlotMode::Done;
                Some(SlotEvent::LoadFailed {
                    kind: self.kind,
                    error,
                })
            }
        }
    }
}

impl Drop for EffectSlot {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for EffectSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectSlot")
            .field("kind", &self.kind)
            .field("name", &self.name)
            .field("mode", &self.mode)
            .field("frames", &self.frames)
            .field("next", &self.next)
            .finish()
    }
}

/// Uniform pick among `0..len`, excluding `current` when there is a choice.
fn pick_other(rng: &mut Random, len: usize, current: Option<usize>) -> usize {
    match current {
        Some(cur) if len > 1 && cur < len => {
            let i = rng.index(len - 1);
            if i >= cur { i + 1 } else { i }
        }
        _ => rng.index(len),
    }
}
