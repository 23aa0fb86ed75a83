//! Maps `Box<dyn Error>` from capability boundaries to typed errors.
//!
//! The traits in `ocrnav_traits` use `Box<dyn Error + Send + Sync>`; this is
//! the one place those get converted, with an optional feature-gated path for
//! `ocrnav_sim::SimError` downcasting.

use crate::error::{NavError, Unreadable};

/// Map a key-input failure to `NavError`.
pub fn map_input_error(e: &(dyn std::error::Error + 'static)) -> NavError {
    #[cfg(feature = "sim-errors")]
    {
        if let Some(sim) = e.downcast_ref::<ocrnav_sim::SimError>() {
            return match sim {
                ocrnav_sim::SimError::UnknownKey(k) => {
                    NavError::Config(format!("key {k:?} does nothing in the game"))
                }
                other => NavError::Fault(other.to_string()),
            };
        }
    }
    NavError::Input(e.to_string())
}

/// Map a capture failure to the transient `Unreadable` reason.
pub fn map_capture_error(e: &(dyn std::error::Error + 'static)) -> Unreadable {
    Unreadable::Capture(e.to_string())
}

/// Map a recognition failure to the transient `Unreadable` reason.
pub fn map_recognition_error(e: &(dyn std::error::Error + 'static)) -> Unreadable {
    Unreadable::Recognition(e.to_string())
}
