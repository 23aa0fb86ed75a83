//! Key -> axis discovery by experiment.
//!
//! Each horizontal key is pulsed twice in isolation. The displacement between
//! median-stabilized readings is classified as `x±`, `z±` or "no movement",
//! and a direction is accepted only when both trials agree exactly. A
//! disagreement restarts the pair; there is no retry cap unless the caller
//! configures one. Forward is calibrated before strafe so that a same-axis
//! result on strafe can be resolved against forward's claim.
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use ocrnav_traits::{KeyInput, ScreenCapture, TextRecognizer};

use crate::config::CalibrationCfg;
use crate::error::{NavError, Result};
use crate::events::NavEvent;
use crate::mapping::{Axis, AxisDirection, KeyBindings, KeyMapping};
use crate::position::Position;
use crate::rig::Rig;
use crate::util::{median, round2};

/// Per-key trial state machine. `Verified` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Trial1Fire,
    Trial1Measure,
    Trial2Fire,
    Trial2Measure,
    Verified(AxisDirection),
    Retry,
}

/// Classify a horizontal displacement. The dominant axis wins if it also
/// moved more than `min_motion`; ties and small moves are `None`.
pub fn infer_direction(before: Position, after: Position, min_motion: f32) -> Option<AxisDirection> {
    let dx = after.x - before.x;
    let dz = after.z - before.z;
    if dx.abs() > dz.abs() && dx.abs() > min_motion {
        Some(AxisDirection::from_delta(Axis::X, dx))
    } else if dz.abs() > dx.abs() && dz.abs() > min_motion {
        Some(AxisDirection::from_delta(Axis::Z, dz))
    } else {
        None
    }
}

/// Both trials must have seen movement and agree exactly.
fn verified(first: Option<AxisDirection>, second: Option<AxisDirection>) -> Option<AxisDirection> {
    match (first, second) {
        (Some(a), Some(b)) if a == b => Some(a),
        _ => None,
    }
}

#[derive(Debug, Clone)]
pub struct AxisCalibrator {
    cfg: CalibrationCfg,
    bindings: KeyBindings,
    ascend: AxisDirection,
    cancel: Option<Arc<AtomicBool>>,
}

impl AxisCalibrator {
    pub fn new(cfg: CalibrationCfg, bindings: KeyBindings, ascend: AxisDirection) -> Self {
        Self {
            cfg,
            bindings,
            ascend,
            cancel: None,
        }
    }

    /// Observe `flag` between phases; when set, calibration stops with `Cancelled`.
    pub fn with_cancel(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    fn check_cancel(&self) -> Result<()> {
        match &self.cancel {
            Some(flag) if flag.load(Ordering::Relaxed) => Err(eyre::Report::new(NavError::Cancelled)),
            _ => Ok(()),
        }
    }

    /// Run the full experiment and return a mapping whose forward and strafe
    /// keys sit on different axes.
    pub fn run<C, R, K>(&self, rig: &mut Rig<C, R, K>) -> Result<KeyMapping>
    where
        C: ScreenCapture,
        R: TextRecognizer,
        K: KeyInput,
    {
        if rig.sampler.region().is_none() {
            rig.emit(NavEvent::CalibrationFailed {
                reason: "select an OCR region first".to_string(),
            });
            return Err(eyre::Report::new(NavError::MissingRegion));
        }
        rig.emit(NavEvent::CalibrationStarted);
        rig.sleep_ms(self.cfg.start_delay_ms);

        let outcome = self
            .calibrate_key(rig, &self.bindings.forward)
            .and_then(|fwd| Ok((fwd, self.calibrate_key(rig, &self.bindings.strafe)?)));
        let (forward, strafe) = match outcome {
            Ok(dirs) => dirs,
            Err(e) => {
                if !matches!(e.downcast_ref::<NavError>(), Some(NavError::Cancelled)) {
                    rig.emit(NavEvent::CalibrationFailed {
                        reason: e.to_string(),
                    });
                }
                return Err(e);
            }
        };

        let (mapping, conflict) = KeyMapping::resolve(forward, strafe, self.ascend);
        if let Some(c) = conflict {
            rig.emit(NavEvent::MappingConflict(c));
        }
        rig.emit(NavEvent::CalibrationSucceeded {
            mapping,
            description: mapping.describe(&self.bindings),
        });
        Ok(mapping)
    }

    /// Drive one key through the trial state machine until verified.
    pub fn calibrate_key<C, R, K>(&self, rig: &mut Rig<C, R, K>, key: &str) -> Result<AxisDirection>
    where
        C: ScreenCapture,
        R: TextRecognizer,
        K: KeyInput,
    {
        let mut phase = Phase::Idle;
        let mut attempt: u32 = 0;
        let mut start = None;
        let mut mid = None;
        let mut first = None;

        loop {
            self.check_cancel()?;
            phase = match phase {
                Phase::Idle => {
                    attempt += 1;
                    if self.cfg.max_attempts > 0 && attempt > self.cfg.max_attempts {
                        return Err(eyre::Report::new(NavError::CalibrationExhausted {
                            key: key.to_string(),
                            attempts: self.cfg.max_attempts,
                        }));
                    }
                    tracing::debug!(key, attempt, "calibration trial pair");
                    start = self.stable_reading(rig);
                    Phase::Trial1Fire
                }
                Phase::Trial1Fire => {
                    rig.hold(&[key], self.cfg.pulse_ms)?;
                    Phase::Trial1Measure
                }
                Phase::Trial1Measure => {
                    rig.sleep_ms(self.cfg.settle_ms);
                    mid = self.stable_reading(rig);
                    first = self.observe(start, mid);
                    rig.emit(NavEvent::TrialObserved {
                        key: key.to_string(),
                        round: 1,
                        direction: first,
                    });
                    Phase::Trial2Fire
                }
                Phase::Trial2Fire => {
                    rig.hold(&[key], self.cfg.pulse_ms)?;
                    Phase::Trial2Measure
                }
                Phase::Trial2Measure => {
                    rig.sleep_ms(self.cfg.settle_ms);
                    let end = self.stable_reading(rig);
                    let second = self.observe(mid, end);
                    rig.emit(NavEvent::TrialObserved {
                        key: key.to_string(),
                        round: 2,
                        direction: second,
                    });
                    verified(first, second).map_or(Phase::Retry, Phase::Verified)
                }
                Phase::Retry => {
                    rig.emit(NavEvent::CalibrationRetry {
                        key: key.to_string(),
                        attempt,
                    });
                    rig.sleep_ms(self.cfg.retry_backoff_ms);
                    Phase::Idle
                }
                Phase::Verified(direction) => {
                    rig.emit(NavEvent::KeyVerified {
                        key: key.to_string(),
                        direction,
                    });
                    return Ok(direction);
                }
            };
        }
    }

    fn observe(&self, before: Option<Position>, after: Option<Position>) -> Option<AxisDirection> {
        infer_direction(before?, after?, self.cfg.min_motion)
    }

    /// Median of up to `stable_samples` readings, rounded to two decimals.
    /// `None` when every read in the burst was unreadable.
    pub fn stable_reading<C, R, K>(&self, rig: &mut Rig<C, R, K>) -> Option<Position>
    where
        C: ScreenCapture,
        R: TextRecognizer,
        K: KeyInput,
    {
        let n = self.cfg.stable_samples.max(1);
        let mut xs = Vec::with_capacity(n);
        let mut ys = Vec::with_capacity(n);
        let mut zs = Vec::with_capacity(n);
        for _ in 0..n {
            match rig.sampler.sample() {
                Ok(p) => {
                    xs.push(p.x);
                    ys.push(p.y);
                    zs.push(p.z);
                }
                Err(e) => tracing::debug!(reason = %e, "stable reading: sample skipped"),
            }
            rig.sleep_ms(self.cfg.sample_spacing_ms);
        }
        Some(Position::new(
            round2(median(&mut xs)?),
            round2(median(&mut ys)?),
            round2(median(&mut zs)?),
        ))
    }
}
