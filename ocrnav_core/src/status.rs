//! Outcome of a single navigation control tick.

use crate::error::Unreadable;
use crate::position::Position;

#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    /// OCR gave nothing usable this tick.
    Unreadable(Unreadable),
    /// Consecutive samples still disagree; the HUD is mid-update.
    Transitioning,
}

/// Public status of one step of the navigation loop.
#[derive(Debug, Clone, PartialEq)]
pub enum NavStatus {
    /// Controller is deactivated; nothing was done.
    Inactive,
    /// No actuation this tick.
    Skipped(SkipReason),
    /// Below the hazard plane: these keys were held together as a burst.
    Recovering { keys: Vec<String> },
    /// One tap of the ascend key.
    Ascending,
    /// One horizontal correction pulse.
    Moving { key: String },
    /// Oscillation detected; a random movement key was pulsed instead.
    Nudged { key: String },
    /// Within tolerance on x and z with no ascent pending. Controller is now inactive.
    Arrived(Position),
}

impl NavStatus {
    pub fn is_arrived(&self) -> bool {
        matches!(self, NavStatus::Arrived(_))
    }
}
