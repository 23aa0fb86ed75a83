//! Capability boundary between the navigation core and the outside world.
//!
//! The core never talks to a screen, an OCR engine or a keyboard directly.
//! It goes through the three traits below, which keeps it testable with
//! scripted fakes and a simulated game.
pub mod clock;
pub mod frame;

pub use clock::{Clock, MonotonicClock};
pub use frame::{Frame, Region};

/// Error type used at every capability boundary.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Grabs a rectangle of the screen.
pub trait ScreenCapture {
    fn capture(&mut self, region: Region) -> Result<Frame, BoxError>;
}

/// Turns a (preferably grayscale) frame into text.
pub trait TextRecognizer {
    fn recognize(&mut self, frame: &Frame) -> Result<String, BoxError>;
}

/// Synthetic keyboard. Keys are identified by their bound name ("w", "space").
pub trait KeyInput {
    fn key_down(&mut self, key: &str) -> Result<(), BoxError>;
    fn key_up(&mut self, key: &str) -> Result<(), BoxError>;

    /// Single tap. Defaults to an immediate down/up pair.
    fn press(&mut self, key: &str) -> Result<(), BoxError> {
        self.key_down(key)?;
        self.key_up(key)
    }
}

impl<T: ScreenCapture + ?Sized> ScreenCapture for Box<T> {
    fn capture(&mut self, region: Region) -> Result<Frame, BoxError> {
        (**self).capture(region)
    }
}

impl<T: TextRecognizer + ?Sized> TextRecognizer for Box<T> {
    fn recognize(&mut self, frame: &Frame) -> Result<String, BoxError> {
        (**self).recognize(frame)
    }
}

impl<T: KeyInput + ?Sized> KeyInput for Box<T> {
    fn key_down(&mut self, key: &str) -> Result<(), BoxError> {
        (**self).key_down(key)
    }
    fn key_up(&mut self, key: &str) -> Result<(), BoxError> {
        (**self).key_up(key)
    }
    fn press(&mut self, key: &str) -> Result<(), BoxError> {
        (**self).press(key)
    }
}
