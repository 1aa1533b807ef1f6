use crate::audio::{AudioFrame, AudioInput, AudioMailbox, AudioState, CHANNELS};
use crate::beat::{compute_loudness, BeatDetector};
use crate::canvas::Canvas;
use crate::config::EngineConfig;
use crate::effects::EffectRegistry;
use crate::feedback::Feedback;
use crate::overlay::Overlay;
use crate::rng::Random;
use crate::slot::{EffectSlot, SlotEvent, SlotKind, Stage};
use crate::spectrum::SpectrumAnalyzer;
use std::sync::Arc;

/// What one call to [`Engine::draw_frame`] saw, before one-shot flags reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameReport {
    pub frame: u64,
    pub fresh_audio: bool,
    pub beat: bool,
    pub loudness: i32,
    pub thickness: u8,
    pub quiet_onset: bool,
}

/// The whole visualization: audio in, three effect slots, pixels out.
pub struct Engine {
    config: EngineConfig,
    rng: Random,
    mailbox: Arc<AudioMailbox>,
    seen: u64,
    audio: AudioState,
    analyzer: SpectrumAnalyzer,
    detector: BeatDetector,
    registry: EffectRegistry,
    slots: [EffectSlot; 3],
    feedback: Feedback,
    canvas: Canvas,
    overlay: Overlay,
    frame: u64,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self::with_registry(config, EffectRegistry::builtin())
    }

    pub fn with_registry(config: EngineConfig, registry: EffectRegistry) -> Self {
        let rng = match config.seed {
            Some(seed) => Random::with_seed(seed),
            None => Random::new(),
        };
        for kind in SlotKind::all() {
            if registry.len(kind) == 0 {
                log::warn!("no {} effects registered; slot stays empty", kind.label());
            }
        }
        Self {
            detector: BeatDetector::new(config.beat_sensitivity),
            feedback: Feedback::new(config.feedback_keep),
            config,
            rng,
            mailbox: Arc::new(AudioMailbox::new()),
            seen: 0,
            audio: AudioState::default(),
            analyzer: SpectrumAnalyzer::new(),
            registry,
            slots: SlotKind::all().map(EffectSlot::new),
            canvas: Canvas::default(),
            overlay: Overlay::default(),
            frame: 0,
        }
    }

    pub fn set_size(&mut self, w: usize, h: usize) {
        if w == self.canvas.width() && h == self.canvas.height() {
            return;
        }
        self.canvas.resize(w, h);
        log::debug!("canvas resized to {w}x{h}");
    }

    /// Producer handle for another thread; last writer wins.
    pub fn audio_input(&self) -> AudioInput {
        AudioInput::new(Arc::clone(&self.mailbox))
    }

    pub fn update_audio(&self, frame: &AudioFrame) {
        self.mailbox.store(frame);
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn audio(&self) -> &AudioState {
        &self.audio
    }

    pub fn detector(&self) -> &BeatDetector {
        &self.detector
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub fn registry(&self) -> &EffectRegistry {
        &self.registry
    }

    pub fn slot(&self, kind: SlotKind) -> &EffectSlot {
        &self.slots[kind.index()]
    }

    pub fn overlay_text(&self) -> Option<&str> {
        self.overlay.text()
    }

    pub fn show_text(&mut self, text: impl Into<String>, frames: u32) {
        self.overlay.show(text, frames);
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Asks the slot's current effect to exit at its own pace.
    pub fn request_next(&mut self, kind: SlotKind) {
        let event = self.slots[kind.index()].request_finish(&self.registry, &mut self.rng);
        if let Some(e) = event {
            self.note(e);
        }
    }

    pub fn draw_frame(&mut self) -> FrameReport {
        self.frame += 1;
        self.ingest_audio();

        if self.audio.fresh {
            self.audio.loudness = compute_loudness(self.audio.time.left());
            let report = self.detector.detect(self.audio.loudness);
            self.audio.beat = report.beat;
            self.audio.thickness = report.thickness;
            self.audio.quiet = report.quiet_onset;
            if report.beat {
                log::debug!(
                    "beat at frame {} (loudness {}, period {})",
                    self.frame,
                    self.audio.loudness,
                    self.detector.prev_period()
                );
            }
            if report.quiet_onset {
                log::debug!("quiet from frame {}", self.frame);
            }
        }

        let mut events = Vec::new();
        {
            let [background, foreground, texture] = &mut self.slots;
            let mut stage = Stage {
                audio: &self.audio,
                rng: &mut self.rng,
                canvas: &mut self.canvas,
            };
            let beat = self.audio.beat;
            let policies = &self.config.policies;
            let registry = &self.registry;

            for slot in [&mut *background, &mut *foreground, &mut *texture] {
                let policy = &policies[slot.kind().index()];
                events.extend(slot.step(policy, beat, registry, &mut stage));
            }

            events.extend(self.feedback.update(texture, registry, &mut stage));
            events.extend(background.draw(registry, &mut stage));
            events.extend(foreground.draw(registry, &mut stage));
        }
        for e in events {
            self.note(e);
        }

        self.overlay.age();

        let report = FrameReport {
            frame: self.frame,
            fresh_audio: self.audio.fresh,
            beat: self.audio.beat,
            loudness: self.audio.loudness,
            thickness: self.audio.thickness,
            quiet_onset: self.audio.quiet,
        };
        self.audio.beat = false;
        self.audio.quiet = false;
        self.audio.fresh = false;
        report
    }

    /// Cleans up every loaded effect. Dropping the engine does the same.
    pub fn destroy(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        for slot in &mut self.slots {
            if let Some(name) = slot.name() {
                log::info!("unloading {} effect '{}'", slot.kind().label(), name);
            }
            slot.shutdown();
        }
    }

    fn ingest_audio(&mut self) {
        let Some(frame) = self.mailbox.take_newer(&mut self.seen) else {
            return;
        };
        self.audio.time = frame;
        for ch in 0..CHANNELS {
            self.analyzer
                .analyze(&self.audio.time.channels[ch], &mut self.audio.spectrum[ch]);
        }
        self.audio.fresh = true;
    }

    fn note(&mut self, event: SlotEvent) {
        match event {
            SlotEvent::Loaded { kind, name, .. } => {
                log::info!("{} effect '{}' loaded", kind.label(), name);
                if self.config.show_titles {
                    self.overlay.show(name, self.config.title_frames);
                }
            }
            SlotEvent::FinishRequested {
                kind, next_name, ..
            } => {
                log::debug!("{} effect finishing, '{}' queued", kind.label(), next_name);
            }
            SlotEvent::LoadFailed { kind, error } => {
                log::warn!("{} slot left empty: {error}", kind.label());
            }
        }
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("frame", &self.frame)
            .field("size", &(self.canvas.width(), self.canvas.height()))
            .field("slots", &self.slots)
            .finish()
    }
}
