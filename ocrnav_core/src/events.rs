//! Notifications for a UI or any other observer of a navigation session.
//!
//! Emission must never stall the control loop: sinks either do trivial work
//! or hand the event off without blocking (`ChannelSink` drops on a full queue).
use crossbeam_channel as xch;

use crate::mapping::{AxisDirection, KeyMapping, MappingConflict};
use crate::position::Position;

/// Coarse session state shown to the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavState {
    Inactive,
    Calibrating,
    Active,
}

impl std::fmt::Display for NavState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            NavState::Inactive => "inactive",
            NavState::Calibrating => "calibrating",
            NavState::Active => "active",
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NavEvent {
    CalibrationStarted,
    TrialObserved {
        key: String,
        round: u8,
        direction: Option<AxisDirection>,
    },
    CalibrationRetry {
        key: String,
        attempt: u32,
    },
    KeyVerified {
        key: String,
        direction: AxisDirection,
    },
    MappingConflict(MappingConflict),
    CalibrationSucceeded {
        mapping: KeyMapping,
        description: String,
    },
    CalibrationFailed {
        reason: String,
    },
    Status(NavState),
    Stuck {
        nudge_key: String,
        position: Position,
    },
    Arrived {
        position: Position,
    },
}

impl NavEvent {
    /// Human-readable one-liner.
    pub fn message(&self) -> String {
        match self {
            NavEvent::CalibrationStarted => "Calibration started".to_string(),
            NavEvent::TrialObserved {
                key,
                round,
                direction,
            } => match direction {
                Some(d) => format!("Testing {key:?} round {round} -> {d}"),
                None => format!("Testing {key:?} round {round} -> no movement"),
            },
            NavEvent::CalibrationRetry { key, attempt } => {
                format!("Key {key:?} inconsistent or did not move (attempt {attempt}); retrying")
            }
            NavEvent::KeyVerified { key, direction } => {
                format!("Verified {key:?} mapping: {direction}")
            }
            NavEvent::MappingConflict(c) => format!(
                "Mapping conflict: strafe measured {} on forward's axis ({}); using {}",
                c.measured, c.forward, c.resolved
            ),
            NavEvent::CalibrationSucceeded { description, .. } => {
                format!("Calibration succeeded: {description}")
            }
            NavEvent::CalibrationFailed { reason } => format!("Calibration failed: {reason}"),
            NavEvent::Status(s) => format!("Navigation {s}"),
            NavEvent::Stuck {
                nudge_key,
                position,
            } => format!("Stuck (oscillation) at {position}; nudging with {nudge_key:?}"),
            NavEvent::Arrived { position } => format!("Destination reached: {position}"),
        }
    }

    /// Position measured when the event fired, where relevant.
    pub fn position(&self) -> Option<Position> {
        match self {
            NavEvent::Stuck { position, .. } | NavEvent::Arrived { position } => Some(*position),
            _ => None,
        }
    }

    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            NavEvent::CalibrationRetry { .. }
                | NavEvent::MappingConflict(_)
                | NavEvent::CalibrationFailed { .. }
                | NavEvent::Stuck { .. }
        )
    }
}

pub trait EventSink {
    fn emit(&self, event: NavEvent);
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: NavEvent) {}
}

/// Forwards events over a bounded channel without ever blocking.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: xch::Sender<NavEvent>,
}

impl ChannelSink {
    pub fn bounded(cap: usize) -> (Self, xch::Receiver<NavEvent>) {
        let (tx, rx) = xch::bounded(cap.max(1));
        (Self { tx }, rx)
    }
}

impl EventSink for ChannelSink {
    fn emit(&self, event: NavEvent) {
        if let Err(e) = self.tx.try_send(event) {
            tracing::trace!(error = %e, "event dropped");
        }
    }
}

impl<F: Fn(NavEvent)> EventSink for F {
    fn emit(&self, event: NavEvent) {
        self(event);
    }
}
