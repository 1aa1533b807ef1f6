use crate::audio::AudioSystem;
use crate::config::{AudioSource, Config};
use crate::engine::Engine;
use crate::render::{wrap_text, Frame, HalfBlockRenderer, Renderer};
use crate::slot::SlotKind;
use crate::terminal::TerminalGuard;
use crate::wav::read_wav;
use anyhow::{anyhow, Context};
use crossterm::event::{KeyCode, KeyModifiers};
use std::io::BufWriter;
use std::time::{Duration, Instant};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Action {
    Quit,
    Next(SlotKind),
    ToggleHud,
    ToggleHelp,
    None,
}

pub fn run(cfg: Config) -> anyhow::Result<()> {
    let mut engine = Engine::new(cfg.engine_config());
    let _audio = start_audio(&cfg, &engine)?;

    let _term = TerminalGuard::new()?;
    let mut out = BufWriter::new(TerminalGuard::stdout());
    let mut renderer = HalfBlockRenderer::new();

    let mut show_hud = true;
    let mut show_help = false;
    let mut fps = FpsCounter::new();
    let mut beat_flash = 0u32;
    let source_label = match cfg.source {
        AudioSource::Mic => "mic",
        AudioSource::Wav => "wav",
    };
    let target = Duration::from_secs_f32(1.0 / cfg.fps.max(1) as f32);

    loop {
        let now = Instant::now();

        for k in TerminalGuard::pending_keys()? {
            match action_for(k.code, k.modifiers) {
                Action::Quit => {
                    engine.destroy();
                    return Ok(());
                }
                Action::Next(kind) => engine.request_next(kind),
                Action::ToggleHud => show_hud = !show_hud,
                Action::ToggleHelp => show_help = !show_help,
                Action::None => {}
            }
        }

        let (term_cols, term_rows) = TerminalGuard::size()?;
        let hud = if show_hud {
            build_hud(term_cols as usize, &engine, fps.fps(), beat_flash > 0, source_label)
        } else {
            String::new()
        };
        let hud_rows = hud_rows_for_text(term_rows, show_hud, &hud);
        let visual_rows = term_rows.saturating_sub(hud_rows).max(1);
        let (w, h) = HalfBlockRenderer::pixel_size(term_cols, visual_rows);
        engine.set_size(w, h);

        let report = engine.draw_frame();
        beat_flash = if report.beat { 3 } else { beat_flash.saturating_sub(1) };

        let frame = Frame {
            term_cols,
            term_rows,
            visual_rows,
            pixel_width: engine.canvas().width(),
            pixel_height: engine.canvas().height(),
            pixels_rgba: engine.canvas().pixels(),
            hud: &hud,
            hud_rows,
            title: engine.overlay_text(),
            popup: show_help.then_some(HELP_TEXT),
            sync_updates: cfg.sync_updates,
        };
        renderer.render(&frame, &mut out)?;
        fps.tick();

        let elapsed = now.elapsed();
        if elapsed < target {
            std::thread::sleep(target - elapsed);
        }
    }
}

fn start_audio(cfg: &Config, engine: &Engine) -> anyhow::Result<AudioSystem> {
    let input = engine.audio_input();
    match cfg.source {
        AudioSource::Mic => AudioSystem::capture(cfg.device.as_deref(), cfg.fps, input)
            .context("start audio capture"),
        AudioSource::Wav => {
            let path = cfg
                .wav
                .as_ref()
                .ok_or_else(|| anyhow!("--source wav needs --wav <path>"))?;
            let wav = read_wav(path).with_context(|| format!("read {}", path.display()))?;
            log::info!(
                "replaying {} ({:.1}s at {} Hz)",
                path.display(),
                wav.duration_secs(),
                wav.sample_rate_hz
            );
            AudioSystem::replay(wav.samples, wav.sample_rate_hz, cfg.fps, cfg.loop_wav, input)
                .context("start wav replay")
        }
    }
}

fn action_for(code: KeyCode, mods: KeyModifiers) -> Action {
    if mods.contains(KeyModifiers::CONTROL) && matches!(code, KeyCode::Char('c')) {
        return Action::Quit;
    }
    match code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('Q') => Action::Quit,
        KeyCode::Char('b') | KeyCode::Char('B') => Action::Next(SlotKind::Background),
        KeyCode::Char('f') | KeyCode::Char('F') => Action::Next(SlotKind::Foreground),
        KeyCode::Char('t') | KeyCode::Char('T') => Action::Next(SlotKind::Texture),
        KeyCode::Char('h') | KeyCode::Char('H') => Action::ToggleHud,
        KeyCode::Char('?') | KeyCode::F(1) => Action::ToggleHelp,
        _ => Action::None,
    }
}

fn hud_rows_for_text(term_rows: u16, show_hud: bool, hud: &str) -> u16 {
    if !show_hud {
        return 0;
    }
    let wanted = hud.lines().count() as u16;
    wanted.min(term_rows.saturating_sub(1))
}

fn build_hud(cols: usize, engine: &Engine, fps: f32, beat: bool, source: &str) -> String {
    let audio = engine.audio();
    let slot_label = |kind: SlotKind| {
        let slot = engine.slot(kind);
        match slot.name() {
            Some(name) => format!("{name} ({})", slot.mode().label()),
            None => "-".to_string(),
        }
    };
    let lines = [
        format!(
            "{} | Loud: {:>6} | Thick: {} | Quiet: {} | FPS: {:>4.1} | Src: {}",
            if beat { "BEAT" } else { "    " },
            audio.loudness,
            audio.thickness,
            if engine.detector().is_quiet() { "yes" } else { "no" },
            fps,
            source,
        ),
        format!(
            "BG: {} | FG: {} | TX: {}",
            slot_label(SlotKind::Background),
            slot_label(SlotKind::Foreground),
            slot_label(SlotKind::Texture),
        ),
        "Keys: b/f/t next effect | h HUD | ? help | q quit".to_string(),
    ];
    lines
        .iter()
        .flat_map(|l| wrap_text(l, cols))
        .collect::<Vec<_>>()
        .join("\n")
}

const HELP_TEXT: &str = "Beatvis Hotkeys\n\
b  next background effect\n\
f  next foreground effect\n\
t  next texture effect\n\
h  show/hide HUD\n\
? or F1  toggle this help\n\
q or esc  quit";

struct FpsCounter {
    last: Instant,
    frames: u32,
    fps: f32,
}

impl FpsCounter {
    fn new() -> Self {
        Self {
            last: Instant::now(),
            frames: 0,
            fps: 0.0,
        }
    }

    fn tick(&mut self) {
        self.frames += 1;
        let now = Instant::now();
        let dt = now.duration_since(self.last).as_secs_f32();
        if dt >= 0.5 {
            self.fps = self.frames as f32 / dt;
            self.frames = 0;
            self.last = now;
        }
    }

    fn fps(&self) -> f32 {
        self.fps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_keys_map_to_next_requests() {
        let none = KeyModifiers::NONE;
        assert_eq!(action_for(KeyCode::Char('b'), none), Action::Next(SlotKind::Background));
        assert_eq!(action_for(KeyCode::Char('f'), none), Action::Next(SlotKind::Foreground));
        assert_eq!(action_for(KeyCode::Char('t'), none), Action::Next(SlotKind::Texture));
    }

    #[test]
    fn quit_keys() {
        assert_eq!(action_for(KeyCode::Esc, KeyModifiers::NONE), Action::Quit);
        assert_eq!(action_for(KeyCode::Char('q'), KeyModifiers::NONE), Action::Quit);
        assert_eq!(action_for(KeyCode::Char('c'), KeyModifiers::CONTROL), Action::Quit);
        assert_eq!(action_for(KeyCode::Char('c'), KeyModifiers::NONE), Action::None);
    }

    #[test]
    fn hud_rows_leave_one_visual_row() {
        assert_eq!(hud_rows_for_text(3, true, "a\nb\nc\nd"), 2);
        assert_eq!(hud_rows_for_text(40, true, "a\nb"), 2);
        assert_eq!(hud_rows_for_text(40, false, "a\nb"), 0);
    }
}
