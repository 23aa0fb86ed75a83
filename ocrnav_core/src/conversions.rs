//! `From` implementations bridging `ocrnav_config` types to `ocrnav_core` types.

use ocrnav_traits::Region;

use crate::config::{CalibrationCfg, NavCfg};
use crate::error::NavError;
use crate::mapping::{Axis, AxisDirection, KeyBindings, KeyMapping};
use crate::position::Position;

// ── NavCfg ───────────────────────────────────────────────────────────────────

impl From<&ocrnav_config::NavigationCfg> for NavCfg {
    fn from(c: &ocrnav_config::NavigationCfg) -> Self {
        Self {
            arrival_threshold: c.arrival_threshold,
            settle_threshold: c.settle_threshold,
            hazard_y: c.hazard_y,
            pulse_ms: c.pulse_ms,
            hazard_burst_ms: c.hazard_burst_ms,
            nudge_ms: c.nudge_ms,
            transition_wait_ms: c.transition_wait_ms,
            tick_ms: c.tick_ms,
            arrival_hotkey: c.arrival_hotkey.clone(),
            nudge_seed: c.nudge_seed,
        }
    }
}

// ── CalibrationCfg ───────────────────────────────────────────────────────────

impl From<&ocrnav_config::CalibrationCfg> for CalibrationCfg {
    fn from(c: &ocrnav_config::CalibrationCfg) -> Self {
        Self {
            min_motion: c.min_motion,
            pulse_ms: c.pulse_ms,
            settle_ms: c.settle_ms,
            stable_samples: c.stable_samples,
            sample_spacing_ms: c.sample_spacing_ms,
            retry_backoff_ms: c.retry_backoff_ms,
            start_delay_ms: c.start_delay_ms,
            max_attempts: c.max_attempts,
        }
    }
}

// ── KeyBindings ──────────────────────────────────────────────────────────────

impl From<&ocrnav_config::KeysCfg> for KeyBindings {
    fn from(c: &ocrnav_config::KeysCfg) -> Self {
        Self {
            forward: c.forward.clone(),
            back: c.back.clone(),
            strafe: c.strafe.clone(),
            strafe_opposite: c.strafe_opposite.clone(),
            ascend: c.ascend.clone(),
        }
    }
}

// ── KeyMapping ───────────────────────────────────────────────────────────────

impl TryFrom<&ocrnav_config::MappingCfg> for KeyMapping {
    type Error = NavError;

    fn try_from(c: &ocrnav_config::MappingCfg) -> Result<Self, Self::Error> {
        let mapping = Self {
            forward: c.forward.parse()?,
            strafe: c.strafe.parse()?,
            ascend: c.ascend.parse()?,
        };
        if !mapping.is_valid() {
            return Err(NavError::Config(format!(
                "stored mapping {mapping} needs forward and strafe on different horizontal axes"
            )));
        }
        Ok(mapping)
    }
}

impl From<&KeyMapping> for ocrnav_config::MappingCfg {
    fn from(m: &KeyMapping) -> Self {
        Self {
            forward: m.forward.to_string(),
            strafe: m.strafe.to_string(),
            ascend: m.ascend.to_string(),
        }
    }
}

/// Ascend direction for a session: the stored mapping's if any, else `y+`.
pub fn ascend_from(mapping: Option<&ocrnav_config::MappingCfg>) -> Result<AxisDirection, NavError> {
    let dir: AxisDirection = match mapping {
        Some(m) => m.ascend.parse()?,
        None => AxisDirection::Y_PLUS,
    };
    if dir.axis != Axis::Y {
        return Err(NavError::Config(format!("ascend must be y+ or y-, got {dir}")));
    }
    Ok(dir)
}

// ── Region / Position ────────────────────────────────────────────────────────

/// `[left, top, width, height]` to a capture region. Non-positive sizes yield `None`.
pub fn region_from_array(r: [i32; 4]) -> Option<Region> {
    let [left, top, width, height] = r;
    let width = u32::try_from(width).ok().filter(|w| *w > 0)?;
    let height = u32::try_from(height).ok().filter(|h| *h > 0)?;
    Some(Region::new(left, top, width, height))
}

pub fn region_to_array(r: Region) -> [i32; 4] {
    [
        r.left,
        r.top,
        i32::try_from(r.width).unwrap_or(i32::MAX),
        i32::try_from(r.height).unwrap_or(i32::MAX),
    ]
}

impl From<&ocrnav_config::TargetCfg> for Position {
    fn from(t: &ocrnav_config::TargetCfg) -> Self {
        Position::new(t.x, t.y, t.z)
    }
}

impl From<Position> for ocrnav_config::TargetCfg {
    fn from(p: Position) -> Self {
        Self {
            x: p.x,
            y: p.y,
            z: p.z,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_mapping_round_trips() {
        let cfg = ocrnav_config::MappingCfg {
            forward: "z-".into(),
            strafe: "x+".into(),
            ascend: "y+".into(),
        };
        let m = KeyMapping::try_from(&cfg).unwrap();
        assert_eq!(m, KeyMapping::preset());
        assert_eq!(ocrnav_config::MappingCfg::from(&m), cfg);
    }

    #[test]
    fn same_axis_mapping_is_rejected() {
        let cfg = ocrnav_config::MappingCfg {
            forward: "x+".into(),
            strafe: "x-".into(),
            ascend: "y+".into(),
        };
        assert!(matches!(
            KeyMapping::try_from(&cfg),
            Err(NavError::Config(_))
        ));
    }

    #[test]
    fn degenerate_region_is_none() {
        assert_eq!(region_from_array([0, 0, 0, 10]), None);
        assert_eq!(region_from_array([0, 0, 10, -1]), None);
        assert_eq!(
            region_from_array([5, 6, 200, 30]),
            Some(Region::new(5, 6, 200, 30))
        );
        assert_eq!(region_to_array(Region::new(5, 6, 200, 30)), [5, 6, 200, 30]);
    }

    #[test]
    fn nav_cfg_copies_every_knob() {
        let mut c = ocrnav_config::NavigationCfg::default();
        c.arrival_threshold = 1.5;
        c.nudge_seed = Some(9);
        c.arrival_hotkey = Some("f1".into());
        let n = NavCfg::from(&c);
        assert_eq!(n.arrival_threshold, 1.5);
        assert_eq!(n.nudge_seed, Some(9));
        assert_eq!(n.arrival_hotkey.as_deref(), Some("f1"));
    }
}
