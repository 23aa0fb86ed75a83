//! Screen rectangles and captured pixel buffers.

/// Screen rectangle in pixels: left, top, width, height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Region {
    pub left: i32,
    pub top: i32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    pub const fn new(left: i32, top: i32, width: u32, height: u32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// A region with no area cannot be captured.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Row-major pixel buffer with 1 (gray), 3 (RGB) or 4 (RGBA) channels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub channels: u8,
    pub pixels: Vec<u8>,
}

impl Frame {
    pub fn gray(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        Self {
            width,
            height,
            channels: 1,
            pixels,
        }
    }

    pub fn is_gray(&self) -> bool {
        self.channels == 1
    }

    /// Convert to single-channel luma (ITU-R BT.601 weights, integer math).
    /// Gray frames are returned as a clone; alpha is ignored.
    pub fn to_luma(&self) -> Frame {
        if self.is_gray() || self.channels < 3 {
            return Frame::gray(self.width, self.height, self.pixels.clone());
        }
        let stride = usize::from(self.channels);
        let pixels = self
            .pixels
            .chunks_exact(stride)
            .map(|px| {
                let r = u32::from(px[0]);
                let g = u32::from(px[1]);
                let b = u32::from(px[2]);
                ((299 * r + 587 * g + 114 * b + 500) / 1000) as u8
            })
            .collect();
        Frame::gray(self.width, self.height, pixels)
    }
}
