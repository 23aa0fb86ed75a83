//! Position sampling: capture -> grayscale -> OCR -> parse -> smooth.
//!
//! The sampler owns the only `PositionHistory` in the system: the last
//! `HISTORY_LEN` raw triplets. Every successful sample appends to it and
//! returns the per-axis mean of the window, so the first output equals the
//! first sample and the window grows to its full length from there.
use std::collections::VecDeque;

use ocrnav_traits::{Region, ScreenCapture, TextRecognizer};

use crate::error::{Result, Unreadable};
use crate::input_error::{map_capture_error, map_recognition_error};
use crate::position::{CoordinateParser, Position};
use crate::util::mean;

pub const HISTORY_LEN: usize = 3;

pub struct PositionSampler<C, R> {
    capture: C,
    recognizer: R,
    region: Option<Region>,
    parser: CoordinateParser,
    history: VecDeque<Position>,
}

impl<C, R> core::fmt::Debug for PositionSampler<C, R> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PositionSampler")
            .field("region", &self.region)
            .field("history", &self.history)
            .finish()
    }
}

impl<C: ScreenCapture, R: TextRecognizer> PositionSampler<C, R> {
    pub fn new(capture: C, recognizer: R, region: Option<Region>) -> Result<Self> {
        Ok(Self {
            capture,
            recognizer,
            region,
            parser: CoordinateParser::new()?,
            history: VecDeque::with_capacity(HISTORY_LEN),
        })
    }

    pub fn region(&self) -> Option<Region> {
        self.region
    }

    pub fn set_region(&mut self, region: Option<Region>) {
        self.region = region;
        self.history.clear();
    }

    /// Capture, recognize and parse one triplet without touching the history.
    pub fn read_raw(&mut self) -> std::result::Result<Position, Unreadable> {
        let region = self.region.ok_or(Unreadable::NoRegion)?;
        let frame = self
            .capture
            .capture(region)
            .map_err(|e| map_capture_error(&*e))?;
        let gray = frame.to_luma();
        let text = self
            .recognizer
            .recognize(&gray)
            .map_err(|e| map_recognition_error(&*e))?;
        self.parser
            .parse(&text)
            .ok_or_else(|| Unreadable::NoCoordinates(text.trim().to_string()))
    }

    /// One smoothed sample. `Unreadable` means "no update this tick".
    pub fn sample(&mut self) -> std::result::Result<Position, Unreadable> {
        let raw = self.read_raw()?;
        if self.history.len() == HISTORY_LEN {
            self.history.pop_front();
        }
        self.history.push_back(raw);
        tracing::trace!(x = raw.x, y = raw.y, z = raw.z, "ocr sample");
        Ok(self.smoothed().unwrap_or(raw))
    }

    /// Per-axis mean of the current window.
    pub fn smoothed(&self) -> Option<Position> {
        Some(Position::new(
            mean(self.history.iter().map(|p| p.x))?,
            mean(self.history.iter().map(|p| p.y))?,
            mean(self.history.iter().map(|p| p.z))?,
        ))
    }

    /// True when the newest raw sample is more than `threshold` away from the
    /// smoothed window on x or z. An outlier keeps this set for as long as it
    /// stays inside the window, so callers never steer on a polluted mean.
    pub fn is_transitioning(&self, threshold: f32) -> bool {
        let (Some(last), Some(avg)) = (self.history.back(), self.smoothed()) else {
            return false;
        };
        (last.x - avg.x).abs() > threshold || (last.z - avg.z).abs() > threshold
    }

    pub fn history(&self) -> impl Iterator<Item = &Position> {
        self.history.iter()
    }

    pub fn reset(&mut self) {
        self.history.clear();
    }
}
