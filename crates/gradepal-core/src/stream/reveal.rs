//! Paced reveal of streamed text.

/// Accumulated text plus a display cursor that trails it.
///
/// The buffer only grows between resets; `tick` moves the cursor forward by
/// at most `chars_per_tick` characters, always on a char boundary.
#[derive(Debug, Clone)]
pub struct RevealCursor {
    buffer: String,
    shown: usize,
    chars_per_tick: usize,
}

impl RevealCursor {
    pub fn new(chars_per_tick: usize) -> Self {
        Self {
            buffer: String::new(),
            shown: 0,
            chars_per_tick: chars_per_tick.max(1),
        }
    }

    pub fn push(&mut self, text: &str) {
        self.buffer.push_str(text);
    }

    /// Advance the cursor and return the newly revealed slice (empty when
    /// already caught up).
    pub fn tick(&mut self) -> &str {
        let start = self.shown;
        let end = self.buffer[start..]
            .char_indices()
            .nth(self.chars_per_tick)
            .map(|(offset, _)| start + offset)
            .unwrap_or(self.buffer.len());
        self.shown = end;
        &self.buffer[start..end]
    }

    pub fn displayed(&self) -> &str {
        &self.buffer[..self.shown]
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    pub fn is_caught_up(&self) -> bool {
        self.shown == self.buffer.len()
    }

    pub fn reset(&mut self) {
        self.buffer.clear();
        self.shown = 0;
    }
}
