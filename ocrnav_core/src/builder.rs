//! Type-state builder for `NavSession`.
//!
//! `build()` only exists once capture, recognizer and input are provided.
//! `try_build()` is always available for dynamic checks.

use std::marker::PhantomData;
use std::sync::Arc;

use ocrnav_traits::clock::{Clock, MonotonicClock};
use ocrnav_traits::{KeyInput, Region, ScreenCapture, TextRecognizer};

use crate::config::{CalibrationCfg, NavCfg};
use crate::conversions::{ascend_from, region_from_array};
use crate::error::{BuildError, Result};
use crate::events::{EventSink, NullSink};
use crate::mapping::{Axis, AxisDirection, KeyBindings, KeyMapping};
use crate::rig::Rig;
use crate::sampler::PositionSampler;
use crate::session::{DynSession, NavSession};

// ── Type-state markers ───────────────────────────────────────────────────────

pub struct Missing;
pub struct Set;

pub struct NavSessionBuilder<Cap, Ocr, Keys> {
    capture: Option<Box<dyn ScreenCapture>>,
    recognizer: Option<Box<dyn TextRecognizer>>,
    input: Option<Box<dyn KeyInput>>,
    region: Option<Region>,
    nav: Option<NavCfg>,
    calibration: Option<CalibrationCfg>,
    bindings: Option<KeyBindings>,
    mapping: Option<KeyMapping>,
    ascend: Option<AxisDirection>,
    clock: Option<Arc<dyn Clock + Send + Sync>>,
    events: Option<Box<dyn EventSink>>,
    max_ticks: Option<u64>,
    _cap: PhantomData<Cap>,
    _ocr: PhantomData<Ocr>,
    _keys: PhantomData<Keys>,
}

impl Default for NavSessionBuilder<Missing, Missing, Missing> {
    fn default() -> Self {
        Self {
            capture: None,
            recognizer: None,
            input: None,
            region: None,
            nav: None,
            calibration: None,
            bindings: None,
            mapping: None,
            ascend: None,
            clock: None,
            events: None,
            max_ticks: None,
            _cap: PhantomData,
            _ocr: PhantomData,
            _keys: PhantomData,
        }
    }
}

impl NavSession<Box<dyn ScreenCapture>, Box<dyn TextRecognizer>, Box<dyn KeyInput>> {
    pub fn builder() -> NavSessionBuilder<Missing, Missing, Missing> {
        NavSessionBuilder::default()
    }
}

fn positive(v: f32) -> bool {
    v.is_finite() && v > 0.0
}

fn invalid(msg: &'static str) -> eyre::Report {
    eyre::Report::new(BuildError::InvalidConfig(msg))
}

/// Checks shared by every build path. The TOML layer validates too; this
/// guards sessions assembled in code.
fn validate(nav: &NavCfg, cal: &CalibrationCfg, ascend: AxisDirection) -> Result<()> {
    if !positive(nav.arrival_threshold) {
        return Err(invalid("arrival_threshold must be > 0"));
    }
    if !positive(nav.settle_threshold) {
        return Err(invalid("settle_threshold must be > 0"));
    }
    if nav.pulse_ms == 0 {
        return Err(invalid("pulse_ms must be >= 1"));
    }
    if !positive(cal.min_motion) {
        return Err(invalid("min_motion must be > 0"));
    }
    if cal.stable_samples == 0 {
        return Err(invalid("stable_samples must be >= 1"));
    }
    if ascend.axis != Axis::Y {
        return Err(invalid("ascend must be on the y axis"));
    }
    Ok(())
}

impl<Cap, Ocr, Keys> NavSessionBuilder<Cap, Ocr, Keys> {
    /// Fallible build available in any type-state.
    pub fn try_build(self) -> Result<DynSession> {
        let capture = self
            .capture
            .ok_or_else(|| eyre::Report::new(BuildError::MissingCapture))?;
        let recognizer = self
            .recognizer
            .ok_or_else(|| eyre::Report::new(BuildError::MissingRecognizer))?;
        let input = self
            .input
            .ok_or_else(|| eyre::Report::new(BuildError::MissingInput))?;

        let nav = self.nav.unwrap_or_default();
        let calibration = self.calibration.unwrap_or_default();
        let ascend = self
            .mapping
            .map(|m| m.ascend)
            .or(self.ascend)
            .unwrap_or(AxisDirection::Y_PLUS);
        validate(&nav, &calibration, ascend)?;
        if let Some(m) = self.mapping
            && !m.is_valid()
        {
            return Err(invalid("mapping needs forward and strafe on different horizontal axes"));
        }

        let clock: Arc<dyn Clock + Send + Sync> = match self.clock {
            Some(c) => c,
            None => Arc::new(MonotonicClock::new()),
        };
        let events = self.events.unwrap_or_else(|| Box::new(NullSink));
        let sampler = PositionSampler::new(capture, recognizer, self.region)?;
        let rig = Rig::new(sampler, input, clock, events);

        Ok(NavSession::new(
            rig,
            self.bindings.unwrap_or_default(),
            nav,
            calibration,
            ascend,
            self.mapping,
        )
        .with_max_ticks(self.max_ticks))
    }
}

/// Chainable setters that do not affect type-state.
impl<Cap, Ocr, Keys> NavSessionBuilder<Cap, Ocr, Keys> {
    pub fn with_region(mut self, region: Option<Region>) -> Self {
        self.region = region;
        self
    }
    pub fn with_nav(mut self, nav: NavCfg) -> Self {
        self.nav = Some(nav);
        self
    }
    pub fn with_calibration(mut self, calibration: CalibrationCfg) -> Self {
        self.calibration = Some(calibration);
        self
    }
    pub fn with_bindings(mut self, bindings: KeyBindings) -> Self {
        self.bindings = Some(bindings);
        self
    }
    /// A known mapping skips calibration; `None` forces it.
    pub fn with_mapping(mut self, mapping: Option<KeyMapping>) -> Self {
        self.mapping = mapping;
        self
    }
    pub fn with_ascend(mut self, ascend: AxisDirection) -> Self {
        self.ascend = Some(ascend);
        self
    }
    /// Defaults to `MonotonicClock` when not provided.
    pub fn with_clock(mut self, clock: Arc<dyn Clock + Send + Sync>) -> Self {
        self.clock = Some(clock);
        self
    }
    pub fn with_events(mut self, events: impl EventSink + 'static) -> Self {
        self.events = Some(Box::new(events));
        self
    }
    pub fn with_max_ticks(mut self, n: Option<u64>) -> Self {
        self.max_ticks = n;
        self
    }

    /// Pull region, knobs, bindings and (when `skip_calibration` is set) the
    /// stored mapping from a loaded config.
    pub fn apply_config(mut self, cfg: &ocrnav_config::Config) -> Result<Self> {
        self.region = cfg.ocr.region.and_then(region_from_array);
        self.nav = Some(NavCfg::from(&cfg.navigation));
        self.calibration = Some(CalibrationCfg::from(&cfg.calibration));
        self.bindings = Some(KeyBindings::from(&cfg.keys));
        self.ascend = Some(ascend_from(cfg.mapping.as_ref()).map_err(eyre::Report::new)?);
        self.mapping = match (&cfg.mapping, cfg.navigation.skip_calibration) {
            (Some(m), true) => Some(KeyMapping::try_from(m).map_err(eyre::Report::new)?),
            _ => None,
        };
        Ok(self)
    }
}

// Setters that advance type-state
impl<Ocr, Keys> NavSessionBuilder<Missing, Ocr, Keys> {
    pub fn with_capture(
        self,
        capture: impl ScreenCapture + 'static,
    ) -> NavSessionBuilder<Set, Ocr, Keys> {
        NavSessionBuilder {
            capture: Some(Box::new(capture)),
            recognizer: self.recognizer,
            input: self.input,
            region: self.region,
            nav: self.nav,
            calibration: self.calibration,
            bindings: self.bindings,
            mapping: self.mapping,
            ascend: self.ascend,
            clock: self.clock,
            events: self.events,
            max_ticks: self.max_ticks,
            _cap: PhantomData,
            _ocr: PhantomData,
            _keys: PhantomData,
        }
    }
}

impl<Cap, Keys> NavSessionBuilder<Cap, Missing, Keys> {
    pub fn with_recognizer(
        self,
        recognizer: impl TextRecognizer + 'static,
    ) -> NavSessionBuilder<Cap, Set, Keys> {
        NavSessionBuilder {
            capture: self.capture,
            recognizer: Some(Box::new(recognizer)),
            input: self.input,
            region: self.region,
            nav: self.nav,
            calibration: self.calibration,
            bindings: self.bindings,
            mapping: self.mapping,
            ascend: self.ascend,
            clock: self.clock,
            events: self.events,
            max_ticks: self.max_ticks,
            _cap: PhantomData,
            _ocr: PhantomData,
            _keys: PhantomData,
        }
    }
}

impl<Cap, Ocr> NavSessionBuilder<Cap, Ocr, Missing> {
    pub fn with_input(self, input: impl KeyInput + 'static) -> NavSessionBuilder<Cap, Ocr, Set> {
        NavSessionBuilder {
            capture: self.capture,
            recognizer: self.recognizer,
            input: Some(Box::new(input)),
            region: self.region,
            nav: self.nav,
            calibration: self.calibration,
            bindings: self.bindings,
            mapping: self.mapping,
            ascend: self.ascend,
            clock: self.clock,
            events: self.events,
            max_ticks: self.max_ticks,
            _cap: PhantomData,
            _ocr: PhantomData,
            _keys: PhantomData,
        }
    }
}

impl NavSessionBuilder<Set, Set, Set> {
    /// Validate and build. Only available when capture, recognizer and input are set.
    pub fn build(self) -> Result<DynSession> {
        self.try_build()
    }
}
