//! Test and helper fakes for ocrnav_core.
//!
//! `TextCapture` "renders" scripted HUD lines as one-row gray frames and
//! `EchoRecognizer` reads them back, so the real sampler pipeline runs
//! end to end without a screen.
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use ocrnav_traits::{BoxError, Frame, KeyInput, Region, ScreenCapture, TextRecognizer};

/// Capture that yields scripted text lines, repeating the last one forever.
#[derive(Debug, Clone, Default)]
pub struct TextCapture {
    lines: VecDeque<String>,
    last: Option<String>,
}

impl TextCapture {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
            last: None,
        }
    }

    pub fn push(&mut self, line: impl Into<String>) {
        self.lines.push_back(line.into());
    }
}

impl ScreenCapture for TextCapture {
    fn capture(&mut self, _region: Region) -> Result<Frame, BoxError> {
        if let Some(next) = self.lines.pop_front() {
            self.last = Some(next);
        }
        let text = self.last.clone().ok_or("nothing scripted")?;
        let bytes = text.into_bytes();
        let width = u32::try_from(bytes.len())?;
        Ok(Frame::gray(width, 1, bytes))
    }
}

/// Recognizer that decodes frame bytes as UTF-8 text.
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoRecognizer;

impl TextRecognizer for EchoRecognizer {
    fn recognize(&mut self, frame: &Frame) -> Result<String, BoxError> {
        Ok(String::from_utf8_lossy(&frame.pixels).into_owned())
    }
}

/// A capture that always errors.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingCapture;

impl ScreenCapture for FailingCapture {
    fn capture(&mut self, _region: Region) -> Result<Frame, BoxError> {
        Err(Box::new(std::io::Error::other("capture unavailable")))
    }
}

/// One recorded key transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyEvent {
    Down(String),
    Up(String),
    Press(String),
}

impl KeyEvent {
    pub fn key(&self) -> &str {
        match self {
            Self::Down(k) | Self::Up(k) | Self::Press(k) => k,
        }
    }
}

/// Input that records every call. Clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct RecordingInput {
    log: Arc<Mutex<Vec<KeyEvent>>>,
}

impl RecordingInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<KeyEvent> {
        self.log.lock().map(|g| g.clone()).unwrap_or_default()
    }

    /// Keys that went down (held or tapped), in order.
    pub fn actuated(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter(|e| !matches!(e, KeyEvent::Up(_)))
            .map(|e| e.key().to_string())
            .collect()
    }

    pub fn clear(&self) {
        if let Ok(mut g) = self.log.lock() {
            g.clear();
        }
    }

    fn record(&self, ev: KeyEvent) {
        if let Ok(mut g) = self.log.lock() {
            g.push(ev);
        }
    }
}

impl KeyInput for RecordingInput {
    fn key_down(&mut self, key: &str) -> Result<(), BoxError> {
        self.record(KeyEvent::Down(key.to_string()));
        Ok(())
    }
    fn key_up(&mut self, key: &str) -> Result<(), BoxError> {
        self.record(KeyEvent::Up(key.to_string()));
        Ok(())
    }
    fn press(&mut self, key: &str) -> Result<(), BoxError> {
        self.record(KeyEvent::Press(key.to_string()));
        Ok(())
    }
}
