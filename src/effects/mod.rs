//! Effect contract, registry and the built-in effects.

mod background;
mod foreground;
mod texture;

pub use background::{Aurora, Starfield};
pub use foreground::{Cube, Scope};
pub use texture::{Swirl, Zoom};

use crate::anim::Range;
use crate::audio::AudioState;
use crate::canvas::Canvas;
use crate::rng::Random;
use crate::slot::{SlotKind, SlotMode};
use std::fmt;

/// Everything an effect may touch while it is created or drawn.
pub struct EffectCtx<'a> {
    pub audio: &'a AudioState,
    pub rng: &'a mut Random,
    pub canvas: &'a mut Canvas,
    /// The owning slot's state. Effects advance `Starting -> Running`,
    /// `Finish -> Finishing` and `Finishing -> Done` themselves.
    pub mode: &'a mut SlotMode,
}

pub trait Effect {
    /// One frame. Called every frame while the effect is loaded.
    fn draw(&mut self, ctx: &mut EffectCtx<'_>);

    /// Called exactly once before the instance is dropped.
    fn cleanup(&mut self) {}
}

pub type EffectFactory = Box<dyn Fn(&mut EffectCtx<'_>) -> Result<Box<dyn Effect>, EffectError>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EffectError {
    Empty { kind: SlotKind },
    Init { name: &'static str, message: String },
}

impl fmt::Display for EffectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty { kind } => write!(f, "no {} effects registered", kind.label()),
            Self::Init { name, message } => write!(f, "effect '{name}' failed to start: {message}"),
        }
    }
}

impl std::error::Error for EffectError {}

pub struct EffectEntry {
    pub name: &'static str,
    factory: EffectFactory,
}

impl EffectEntry {
    pub fn create(&self, ctx: &mut EffectCtx<'_>) -> Result<Box<dyn Effect>, EffectError> {
        (self.factory)(ctx)
    }
}

impl fmt::Debug for EffectEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EffectEntry").field("name", &self.name).finish()
    }
}

/// Fixed set of effects per slot kind; effects are identified by index.
#[derive(Debug, Default)]
pub struct EffectRegistry {
    entries: [Vec<EffectEntry>; 3],
}

impl EffectRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builtin() -> Self {
        let mut r = Self::new();
        r.register(SlotKind::Background, "Starfield", |ctx| {
            Ok(Box::new(Starfield::new(ctx)))
        });
        r.register(SlotKind::Background, "Aurora", |ctx| Ok(Box::new(Aurora::new(ctx))));
        r.register(SlotKind::Foreground, "Scope", |ctx| Ok(Box::new(Scope::new(ctx))));
        r.register(SlotKind::Foreground, "Cube", |ctx| Ok(Box::new(Cube::new(ctx))));
        r.register(SlotKind::Texture, "Zoom", |ctx| Ok(Box::new(Zoom::new(ctx))));
        r.register(SlotKind::Texture, "Swirl", |ctx| Ok(Box::new(Swirl::new(ctx))));
        r
    }

    pub fn register<F>(&mut self, kind: SlotKind, name: &'static str, factory: F)
    where
        F: Fn(&mut EffectCtx<'_>) -> Result<Box<dyn Effect>, EffectError> + 'static,
    {
        self.entries[kind.index()].push(EffectEntry {
            name,
            factory: Box::new(factory),
        });
    }

    pub fn entries(&self, kind: SlotKind) -> &[EffectEntry] {
        &self.entries[kind.index()]
    }

    pub fn len(&self, kind: SlotKind) -> usize {
        self.entries[kind.index()].len()
    }

    pub fn names(&self, kind: SlotKind) -> Vec<&'static str> {
        self.entries(kind).iter().map(|e| e.name).collect()
    }

    /// Case-insensitive lookup by name.
    pub fn find(&self, kind: SlotKind, name: &str) -> Option<usize> {
        self.entries(kind)
            .iter()
            .position(|e| e.name.eq_ignore_ascii_case(name))
    }
}

/// Entry / exit ramp driven by the slot mode.
///
/// `Starting` ramps 0 -> 1 and hands over to `Running`; `Finish` starts the
/// exit ramp, and `Finishing` runs it down to 0 before reporting `Done`.
#[derive(Debug, Clone, Copy)]
pub struct Envelope {
    range: Range,
    min_frames: u32,
    max_frames: u32,
}

impl Envelope {
    /// Puts the slot into `Starting` and arms the entry ramp.
    pub fn start(ctx: &mut EffectCtx<'_>, min_frames: u32, max_frames: u32) -> Self {
        *ctx.mode = SlotMode::Starting;
        Self {
            range: Range::new(ctx.rng, 1, min_frames, max_frames),
            min_frames,
            max_frames,
        }
    }

    /// Current level in `[0, 1]`, advancing the slot mode as ramps complete.
    pub fn step(&mut self, mode: &mut SlotMode, rng: &mut Random) -> f32 {
        match *mode {
            SlotMode::Starting => {
                self.range.update();
                if self.range.done() {
                    *mode = SlotMode::Running;
                }
                self.range.get_cos1(0.0, 1.0)
            }
            SlotMode::Running => 1.0,
            SlotMode::Finish => {
                self.range.init(rng, 1, self.min_frames, self.max_frames);
                *mode = SlotMode::Finishing;
                1.0
            }
            SlotMode::Finishing => {
                self.range.update();
                if self.range.done() {
                    *mode = SlotMode::Done;
                }
                self.range.get_cos1(1.0, 0.0)
            }
            SlotMode::Done => 0.0,
        }
    }
}
