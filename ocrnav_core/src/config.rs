//! Runtime configuration used by the calibrator and the controller.
//!
//! Separate from the TOML-facing structs in `ocrnav_config`; see `conversions`.

/// Navigation control knobs.
#[derive(Debug, Clone)]
pub struct NavCfg {
    /// Per-axis arrival tolerance. `|err| <= arrival_threshold` is satisfied.
    pub arrival_threshold: f32,
    /// Max x/z difference between the last two raw samples before the tick is skipped.
    pub settle_threshold: f32,
    /// Hazard plane: `y < hazard_y` forces an ascend burst.
    pub hazard_y: f32,
    /// Horizontal correction pulse length.
    pub pulse_ms: u64,
    pub hazard_burst_ms: u64,
    pub nudge_ms: u64,
    pub transition_wait_ms: u64,
    pub tick_ms: u64,
    pub arrival_hotkey: Option<String>,
    pub nudge_seed: Option<u64>,
}

impl Default for NavCfg {
    fn default() -> Self {
        Self {
            arrival_threshold: 0.7,
            settle_threshold: 0.2,
            hazard_y: 0.0,
            pulse_ms: 15,
            hazard_burst_ms: 300,
            nudge_ms: 400,
            transition_wait_ms: 200,
            tick_ms: 100,
            arrival_hotkey: None,
            nudge_seed: None,
        }
    }
}

/// Calibration experiment knobs.
#[derive(Debug, Clone)]
pub struct CalibrationCfg {
    pub min_motion: f32,
    pub pulse_ms: u64,
    pub settle_ms: u64,
    pub stable_samples: usize,
    pub sample_spacing_ms: u64,
    pub retry_backoff_ms: u64,
    pub start_delay_ms: u64,
    /// 0 = unbounded.
    pub max_attempts: u32,
}

impl Default for CalibrationCfg {
    fn default() -> Self {
        Self {
            min_motion: 0.1,
            pulse_ms: 100,
            settle_ms: 1000,
            stable_samples: 5,
            sample_spacing_ms: 300,
            retry_backoff_ms: 2000,
            start_delay_ms: 3000,
            max_attempts: 0,
        }
    }
}
