/// Transient on-screen text that disappears after a number of frames.
#[derive(Debug, Clone, Default)]
pub struct Overlay {
    text: Option<String>,
    frames_left: u32,
}

impl Overlay {
    pub fn show(&mut self, text: impl Into<String>, frames: u32) {
        if frames == 0 {
            return;
        }
        self.text = Some(text.into());
        self.frames_left = frames;
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn frames_left(&self) -> u32 {
        self.frames_left
    }

    /// One frame older; the text is dropped once its time runs out.
    pub fn age(&mut self) {
        self.frames_left = self.frames_left.saturating_sub(1);
        if self.frames_left == 0 {
            self.text = None;
        }
    }
}
