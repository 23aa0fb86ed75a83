//! HUD rendering and recognition.
//!
//! The "pixels" of a rendered frame are the HUD text's bytes, drawn as RGB
//! with equal channels so a luma conversion recovers them exactly.
use ocrnav_traits::{BoxError, Frame, Region, ScreenCapture, TextRecognizer};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::{SimError, SimWorld};

#[derive(Debug, Clone)]
pub struct SimScreen {
    world: SimWorld,
}

impl SimScreen {
    pub fn new(world: SimWorld) -> Self {
        Self { world }
    }
}

impl ScreenCapture for SimScreen {
    fn capture(&mut self, region: Region) -> Result<Frame, BoxError> {
        if region.is_empty() {
            return Err(Box::new(SimError::EmptyRegion));
        }
        let text = self.world.hud_text().unwrap_or_default();
        let pixels: Vec<u8> = text.bytes().flat_map(|b| [b, b, b]).collect();
        Ok(Frame {
            width: u32::try_from(text.len())?,
            height: 1,
            channels: 3,
            pixels,
        })
    }
}

/// Reads frames drawn by `SimScreen`. With `glitch_rate > 0`, that fraction
/// of reads comes back with every digit smeared, like a bad OCR pass.
/// `misread_rate` is the fraction that still parses but with a stray `9`
/// in front of the Z value.
#[derive(Debug)]
pub struct SimOcr {
    rng: StdRng,
    glitch_rate: f64,
    misread_rate: f64,
}

impl Default for SimOcr {
    fn default() -> Self {
        Self::new(0.0, 0)
    }
}

impl SimOcr {
    pub fn new(glitch_rate: f64, seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            glitch_rate: glitch_rate.clamp(0.0, 1.0),
            misread_rate: 0.0,
        }
    }

    pub fn with_misread_rate(mut self, rate: f64) -> Self {
        self.misread_rate = rate.clamp(0.0, 1.0);
        self
    }
}

fn misread(text: &str) -> String {
    let from = text.find("Z:").unwrap_or(0);
    match text[from..].find(|c: char| c.is_ascii_digit()) {
        Some(i) => {
            let at = from + i;
            format!("{}9{}", &text[..at], &text[at..])
        }
        None => text.to_string(),
    }
}

impl TextRecognizer for SimOcr {
    fn recognize(&mut self, frame: &Frame) -> Result<String, BoxError> {
        let luma = frame.to_luma();
        if luma.pixels.is_empty() {
            return Err(Box::new(SimError::NoText));
        }
        let text = String::from_utf8_lossy(&luma.pixels).into_owned();
        if self.glitch_rate > 0.0 && self.rng.gen_bool(self.glitch_rate) {
            tracing::trace!(%text, "sim OCR glitch");
            return Ok(text
                .chars()
                .map(|c| if c.is_ascii_digit() { '#' } else { c })
                .collect());
        }
        if self.misread_rate > 0.0 && self.rng.gen_bool(self.misread_rate) {
            tracing::trace!(%text, "sim OCR misread");
            return Ok(misread(&text));
        }
        Ok(text)
    }
}
