#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema for OCR-driven navigation.
//!
//! - `Config` and its sections are (de)serialized from TOML; every section
//!   has defaults so a missing file still yields a usable, if unconfigured, setup.
//! - `validate()` is the single gate before a config reaches the core.
//! - `save_file` is how learned mappings and captured targets get persisted.
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct OcrCfg {
    /// Capture rectangle `[left, top, width, height]`; absent until the operator picks one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<[i32; 4]>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct TargetCfg {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// Which physical key plays which movement role.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct KeysCfg {
    pub forward: String,
    pub back: String,
    pub strafe: String,
    pub strafe_opposite: String,
    pub ascend: String,
}

impl Default for KeysCfg {
    fn default() -> Self {
        Self {
            forward: "w".into(),
            back: "s".into(),
            strafe: "d".into(),
            strafe_opposite: "a".into(),
            ascend: "space".into(),
        }
    }
}

/// Persisted direction codes (`x+`, `z-`, ...) per role.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct MappingCfg {
    pub forward: String,
    pub strafe: String,
    #[serde(default = "default_ascend_code")]
    pub ascend: String,
}

fn default_ascend_code() -> String {
    "y+".into()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NavigationCfg {
    /// Per-axis arrival tolerance in world units (inclusive).
    pub arrival_threshold: f32,
    /// Max x/z jump between consecutive samples before a reading counts as mid-transition.
    pub settle_threshold: f32,
    /// Below this y the controller ascends before anything else.
    pub hazard_y: f32,
    pub pulse_ms: u64,
    pub hazard_burst_ms: u64,
    pub nudge_ms: u64,
    /// Extra wait after a tick skipped for an unstable reading.
    pub transition_wait_ms: u64,
    /// Pause between control ticks.
    pub tick_ms: u64,
    /// Start navigating with `[mapping]` instead of calibrating.
    pub skip_calibration: bool,
    /// Key tapped once the destination is reached (e.g. to resume an external macro).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arrival_hotkey: Option<String>,
    /// Seed for the oscillation nudge; random when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nudge_seed: Option<u64>,
}

impl Default for NavigationCfg {
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
            skip_calibration: false,
            arrival_hotkey: None,
            nudge_seed: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CalibrationCfg {
    /// Displacement below this is "no movement".
    pub min_motion: f32,
    pub pulse_ms: u64,
    /// Wait after a pulse before measuring.
    pub settle_ms: u64,
    /// Samples reduced by median into one stable reading.
    pub stable_samples: usize,
    pub sample_spacing_ms: u64,
    pub retry_backoff_ms: u64,
    /// Grace period before the first trial so the operator can focus the game.
    pub start_delay_ms: u64,
    /// Trial pairs per key before giving up; 0 retries until verified.
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

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Logging {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>, // path to .log (JSON lines)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<String>, // "info","debug"
    /// "never" | "daily" | "hourly" (default: never)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub ocr: OcrCfg,
    pub target: TargetCfg,
    pub keys: KeysCfg,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mapping: Option<MappingCfg>,
    pub navigation: NavigationCfg,
    pub calibration: CalibrationCfg,
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

/// Read and parse a config file. A missing file yields `Config::default()`.
pub fn load_file(path: &Path) -> eyre::Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let text = std::fs::read_to_string(path)
        .map_err(|e| eyre::eyre!("read config {:?}: {}", path, e))?;
    load_toml(&text).map_err(|e| eyre::eyre!("parse config {:?}: {}", path, e))
}

/// True for the six codes `x+ x- y+ y- z+ z-`.
pub fn is_direction_code(s: &str) -> bool {
    matches!(
        s.as_bytes(),
        [b'x' | b'y' | b'z', b'+' | b'-']
    )
}

impl Config {
    pub fn to_toml_string(&self) -> eyre::Result<String> {
        toml::to_string_pretty(self).map_err(|e| eyre::eyre!("serialize config: {}", e))
    }

    pub fn save_file(&self, path: &Path) -> eyre::Result<()> {
        let text = self.to_toml_string()?;
        if let Some(dir) = path.parent()
            && !dir.as_os_str().is_empty()
        {
            std::fs::create_dir_all(dir)
                .map_err(|e| eyre::eyre!("create config dir {:?}: {}", dir, e))?;
        }
        std::fs::write(path, text).map_err(|e| eyre::eyre!("write config {:?}: {}", path, e))
    }

    pub fn validate(&self) -> eyre::Result<()> {
        // OCR
        if let Some([_, _, w, h]) = self.ocr.region
            && (w <= 0 || h <= 0)
        {
            eyre::bail!("ocr.region width and height must be > 0");
        }

        // Target
        if !(self.target.x.is_finite() && self.target.y.is_finite() && self.target.z.is_finite()) {
            eyre::bail!("target coordinates must be finite");
        }

        // Keys
        let keys = [
            ("keys.forward", &self.keys.forward),
            ("keys.back", &self.keys.back),
            ("keys.strafe", &self.keys.strafe),
            ("keys.strafe_opposite", &self.keys.strafe_opposite),
            ("keys.ascend", &self.keys.ascend),
        ];
        for (name, key) in &keys {
            if key.trim().is_empty() {
                eyre::bail!("{name} must not be empty");
            }
        }
        for (i, (a_name, a)) in keys.iter().enumerate() {
            for (b_name, b) in &keys[i + 1..] {
                if a == b {
                    eyre::bail!("{a_name} and {b_name} are bound to the same key {a:?}");
                }
            }
        }

        // Mapping
        if let Some(m) = &self.mapping {
            for (name, code) in [
                ("mapping.forward", &m.forward),
                ("mapping.strafe", &m.strafe),
                ("mapping.ascend", &m.ascend),
            ] {
                if !is_direction_code(code) {
                    eyre::bail!("{name} must be one of x+, x-, y+, y-, z+, z- (got {code:?})");
                }
            }
            if !m.ascend.starts_with('y') {
                eyre::bail!("mapping.ascend must be y+ or y-");
            }
            if m.forward.starts_with('y') || m.strafe.starts_with('y') {
                eyre::bail!("mapping.forward and mapping.strafe must be horizontal (x or z)");
            }
        }
        if self.navigation.skip_calibration && self.mapping.is_none() {
            eyre::bail!("navigation.skip_calibration requires a [mapping] section");
        }

        // Navigation
        let nav = &self.navigation;
        if !(nav.arrival_threshold.is_finite() && nav.arrival_threshold > 0.0) {
            eyre::bail!("navigation.arrival_threshold must be > 0");
        }
        if !(nav.settle_threshold.is_finite() && nav.settle_threshold > 0.0) {
            eyre::bail!("navigation.settle_threshold must be > 0");
        }
        if !nav.hazard_y.is_finite() {
            eyre::bail!("navigation.hazard_y must be finite");
        }
        if nav.pulse_ms == 0 {
            eyre::bail!("navigation.pulse_ms must be >= 1");
        }
        if nav.hazard_burst_ms == 0 {
            eyre::bail!("navigation.hazard_burst_ms must be >= 1");
        }
        if nav.nudge_ms == 0 {
            eyre::bail!("navigation.nudge_ms must be >= 1");
        }
        if nav.tick_ms > 60 * 1000 {
            eyre::bail!("navigation.tick_ms is unreasonably large (>1min)");
        }
        if let Some(k) = &nav.arrival_hotkey
            && k.trim().is_empty()
        {
            eyre::bail!("navigation.arrival_hotkey must not be empty when set");
        }

        // Calibration
        let cal = &self.calibration;
        if !(cal.min_motion.is_finite() && cal.min_motion > 0.0) {
            eyre::bail!("calibration.min_motion must be > 0");
        }
        if cal.pulse_ms == 0 {
            eyre::bail!("calibration.pulse_ms must be >= 1");
        }
        if cal.stable_samples == 0 {
            eyre::bail!("calibration.stable_samples must be >= 1");
        }

        // Logging
        if let Some(r) = &self.logging.rotation
            && !matches!(r.as_str(), "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be never, daily or hourly");
        }

        Ok(())
    }
}
