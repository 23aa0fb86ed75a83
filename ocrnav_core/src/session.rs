//! Calibrate-then-navigate runner.
//!
//! A session owns the rig for its whole life. Every exit path out of
//! `calibrate` or `run` goes through `finish`, which lifts all bound keys,
//! drops the position history and reports `Inactive`.
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use ocrnav_traits::{KeyInput, Region, ScreenCapture, TextRecognizer};
use rand::RngCore;

use crate::calibrator::AxisCalibrator;
use crate::config::{CalibrationCfg, NavCfg};
use crate::error::{NavError, Result, Unreadable};
use crate::events::{NavEvent, NavState};
use crate::mapping::{AxisDirection, KeyBindings, KeyMapping};
use crate::navigator::NavigationController;
use crate::position::Position;
use crate::rig::Rig;
use crate::status::NavStatus;

/// Boxed session as produced by `NavSessionBuilder`.
pub type DynSession =
    NavSession<Box<dyn ScreenCapture>, Box<dyn TextRecognizer>, Box<dyn KeyInput>>;

pub struct NavSession<C, R, K> {
    rig: Rig<C, R, K>,
    bindings: KeyBindings,
    nav: NavCfg,
    calibration: CalibrationCfg,
    ascend: AxisDirection,
    mapping: Option<KeyMapping>,
    state: NavState,
    max_ticks: Option<u64>,
    nudge_rng: Option<Box<dyn RngCore + Send>>,
}

impl<C, R, K> core::fmt::Debug for NavSession<C, R, K> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("NavSession")
            .field("state", &self.state)
            .field("mapping", &self.mapping)
            .field("bindings", &self.bindings)
            .field("max_ticks", &self.max_ticks)
            .finish_non_exhaustive()
    }
}

impl<C: ScreenCapture, R: TextRecognizer, K: KeyInput> NavSession<C, R, K> {
    /// Assemble a session from a ready rig. `mapping`, when given, skips calibration.
    pub fn new(
        rig: Rig<C, R, K>,
        bindings: KeyBindings,
        nav: NavCfg,
        calibration: CalibrationCfg,
        ascend: AxisDirection,
        mapping: Option<KeyMapping>,
    ) -> Self {
        Self {
            rig,
            bindings,
            nav,
            calibration,
            ascend,
            mapping,
            state: NavState::Inactive,
            max_ticks: None,
            nudge_rng: None,
        }
    }

    /// Give up with `TickBudgetExhausted` after `n` control ticks.
    pub fn with_max_ticks(mut self, n: Option<u64>) -> Self {
        self.max_ticks = n;
        self
    }

    pub fn with_nudge_rng(mut self, rng: impl RngCore + Send + 'static) -> Self {
        self.nudge_rng = Some(Box::new(rng));
        self
    }

    pub fn state(&self) -> NavState {
        self.state
    }

    pub fn mapping(&self) -> Option<KeyMapping> {
        self.mapping
    }

    /// Replace (or forget, with `None`) the mapping used by the next `run`.
    pub fn set_mapping(&mut self, mapping: Option<KeyMapping>) {
        self.mapping = mapping;
    }

    pub fn bindings(&self) -> &KeyBindings {
        &self.bindings
    }

    pub fn region(&self) -> Option<Region> {
        self.rig.sampler.region()
    }

    pub fn set_region(&mut self, region: Option<Region>) {
        self.rig.sampler.set_region(region);
    }

    /// One OCR read through the sampler, for probing the region.
    pub fn read_position(&mut self) -> std::result::Result<Position, Unreadable> {
        self.rig.sampler.sample()
    }

    fn set_state(&mut self, state: NavState) {
        self.state = state;
        self.rig.emit(NavEvent::Status(state));
    }

    fn finish(&mut self) {
        let bindings = self.bindings.clone();
        self.rig.release_all(&bindings.all_keys());
        self.rig.sampler.reset();
        self.set_state(NavState::Inactive);
    }

    fn calibrate_inner(&mut self, cancel: &Arc<AtomicBool>) -> Result<KeyMapping> {
        self.set_state(NavState::Calibrating);
        let calibrator =
            AxisCalibrator::new(self.calibration.clone(), self.bindings.clone(), self.ascend)
                .with_cancel(Arc::clone(cancel));
        let mapping = calibrator.run(&mut self.rig)?;
        self.mapping = Some(mapping);
        Ok(mapping)
    }

    /// Run calibration alone and keep the learned mapping for later runs.
    pub fn calibrate(&mut self, cancel: Arc<AtomicBool>) -> Result<KeyMapping> {
        let out = self.calibrate_inner(&cancel);
        self.finish();
        out
    }

    /// Calibrate if needed, then steer toward `target` until arrival.
    ///
    /// Returns the arrival position. Errors: `MissingRegion`, `Cancelled`,
    /// `CalibrationExhausted`, `TickBudgetExhausted`, or a `Config` error
    /// raised by the key backend. Other per-tick failures are logged and
    /// the loop continues.
    pub fn run(&mut self, target: Position, cancel: Arc<AtomicBool>) -> Result<Position> {
        let out = self.run_inner(target, &cancel);
        self.finish();
        out
    }

    fn run_inner(&mut self, target: Position, cancel: &Arc<AtomicBool>) -> Result<Position> {
        if self.rig.sampler.region().is_none() {
            return Err(eyre::Report::new(NavError::MissingRegion));
        }
        let mapping = match self.mapping {
            Some(m) => {
                tracing::info!(mapping = %m.describe(&self.bindings), "using stored mapping");
                m
            }
            None => self.calibrate_inner(cancel)?,
        };

        let mut ctl =
            NavigationController::new(self.nav.clone(), self.bindings.clone(), mapping, target);
        if let Some(rng) = self.nudge_rng.take() {
            ctl = ctl.with_rng(rng);
        }
        self.rig.sampler.reset();
        ctl.start();
        self.set_state(NavState::Active);
        tracing::info!(%target, "navigation started");

        let mut ticks: u64 = 0;
        loop {
            if cancel.load(Ordering::Relaxed) {
                return Err(eyre::Report::new(NavError::Cancelled));
            }
            if let Some(max) = self.max_ticks
                && ticks >= max
            {
                return Err(eyre::Report::new(NavError::TickBudgetExhausted(max)));
            }
            ticks += 1;

            match ctl.tick(&mut self.rig) {
                Ok(NavStatus::Arrived(pos)) => {
                    tracing::info!(%pos, ticks, "arrived");
                    return Ok(pos);
                }
                Ok(status) => tracing::trace!(?status, tick = ticks),
                Err(e) => {
                    if let Some(NavError::Config(_)) = e.downcast_ref::<NavError>() {
                        return Err(e);
                    }
                    tracing::warn!(error = %e, tick = ticks, "tick failed; continuing");
                }
            }
            self.rig.sleep_ms(self.nav.tick_ms);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{ChannelSink, NullSink};
    use crate::mocks::{EchoRecognizer, KeyEvent, RecordingInput, TextCapture};
    use crate::sampler::PositionSampler;
    use ocrnav_traits::clock::test_clock::TestClock;

    fn session(
        lines: &[&str],
        input: RecordingInput,
        region: Option<Region>,
    ) -> NavSession<TextCapture, EchoRecognizer, RecordingInput> {
        let sampler =
            PositionSampler::new(TextCapture::new(lines.iter().copied()), EchoRecognizer, region)
                .unwrap();
        let rig = Rig::new(sampler, input, Arc::new(TestClock::new()), Box::new(NullSink));
        NavSession::new(
            rig,
            KeyBindings::default(),
            NavCfg::default(),
            CalibrationCfg::default(),
            AxisDirection::Y_PLUS,
            Some(KeyMapping::preset()),
        )
    }

    #[test]
    fn missing_region_fails_without_pressing_keys() {
        let input = RecordingInput::new();
        let mut s = session(&["X: 0 Y: 5 Z: 0"], input.clone(), None);
        let err = s
            .run(Position::new(0.0, 5.0, 0.0), Arc::new(AtomicBool::new(false)))
            .unwrap_err();
        assert_eq!(err.downcast_ref::<NavError>(), Some(&NavError::MissingRegion));
        assert!(input.actuated().is_empty());
        assert_eq!(s.state(), NavState::Inactive);
    }

    #[test]
    fn already_at_target_arrives_first_tick() {
        let input = RecordingInput::new();
        let mut s = session(
            &["X: 1.0 Y: 5.0 Z: 2.0"],
            input.clone(),
            Some(Region::new(0, 0, 100, 20)),
        );
        let pos = s
            .run(Position::new(1.5, 5.0, 2.5), Arc::new(AtomicBool::new(false)))
            .unwrap();
        assert_eq!(pos, Position::new(1.0, 5.0, 2.0));
        assert!(input.actuated().is_empty());
        // cleanup lifts every bound key
        let ups: Vec<_> = input
            .events()
            .into_iter()
            .filter(|e| matches!(e, KeyEvent::Up(_)))
            .collect();
        assert_eq!(ups.len(), 5);
    }

    #[test]
    fn pre_set_cancel_stops_before_first_tick() {
        let input = RecordingInput::new();
        let mut s = session(
            &["X: 0 Y: 5 Z: 0"],
            input.clone(),
            Some(Region::new(0, 0, 100, 20)),
        );
        let err = s
            .run(Position::new(50.0, 5.0, 0.0), Arc::new(AtomicBool::new(true)))
            .unwrap_err();
        assert_eq!(err.downcast_ref::<NavError>(), Some(&NavError::Cancelled));
        assert!(input.actuated().is_empty());
    }

    #[test]
    fn tick_budget_bounds_an_unreachable_target() {
        let input = RecordingInput::new();
        let mut s = session(
            &["X: 0 Y: 5 Z: 0"],
            input.clone(),
            Some(Region::new(0, 0, 100, 20)),
        )
        .with_max_ticks(Some(3));
        let err = s
            .run(Position::new(50.0, 5.0, 0.0), Arc::new(AtomicBool::new(false)))
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<NavError>(),
            Some(&NavError::TickBudgetExhausted(3))
        );
        assert_eq!(input.actuated(), vec!["d", "d", "d"]);
    }

    #[test]
    fn status_events_bracket_the_run() {
        let sampler = PositionSampler::new(
            TextCapture::new(["X: 0 Y: 5 Z: 0"]),
            EchoRecognizer,
            Some(Region::new(0, 0, 100, 20)),
        )
        .unwrap();
        let (sink, rx) = ChannelSink::bounded(16);
        let rig = Rig::new(
            sampler,
            RecordingInput::new(),
            Arc::new(TestClock::new()),
            Box::new(sink),
        );
        let mut s = NavSession::new(
            rig,
            KeyBindings::default(),
            NavCfg::default(),
            CalibrationCfg::default(),
            AxisDirection::Y_PLUS,
            Some(KeyMapping::preset()),
        );
        s.run(Position::new(0.0, 5.0, 0.0), Arc::new(AtomicBool::new(false)))
            .unwrap();
        let events: Vec<_> = rx.try_iter().collect();
        assert_eq!(events.first(), Some(&NavEvent::Status(NavState::Active)));
        assert!(matches!(events[1], NavEvent::Arrived { .. }));
        assert_eq!(events.last(), Some(&NavEvent::Status(NavState::Inactive)));
    }
}
