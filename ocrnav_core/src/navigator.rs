//! Closed-loop steering toward a target, one decision per tick.
//!
//! Per tick, in priority order:
//! 1. no reading or a mid-transition reading: do nothing;
//! 2. below the hazard plane: hold ascend plus any indicated horizontal keys;
//! 3. target is above and the ascend key can get there: tap ascend;
//! 4. x/z error outstanding: pulse one key (z before x), unless the recent
//!    moves show a strict back-and-forth, in which case pulse a random key;
//! 5. otherwise: arrived, deactivate.
use std::collections::VecDeque;

use ocrnav_traits::{KeyInput, ScreenCapture, TextRecognizer};
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};

use crate::config::NavCfg;
use crate::error::Result;
use crate::events::NavEvent;
use crate::mapping::{Axis, KeyBindings, KeyMapping, Sign};
use crate::position::Position;
use crate::rig::Rig;
use crate::status::{NavStatus, SkipReason};

pub const MOVE_HISTORY_LEN: usize = 6;
pub const OSCILLATION_WINDOW: usize = 4;

/// True when the last `OSCILLATION_WINDOW` moves all belong to one physical
/// pair and no two neighbours repeat, i.e. `w s w s` or `a d a d`.
pub fn is_oscillating<S: AsRef<str>>(history: &VecDeque<S>, bindings: &KeyBindings) -> bool {
    if history.len() < OSCILLATION_WINDOW {
        return false;
    }
    let recent: Vec<&str> = history
        .iter()
        .skip(history.len() - OSCILLATION_WINDOW)
        .map(AsRef::as_ref)
        .collect();
    let Some((a, b)) = bindings.pair_of(recent[0]) else {
        return false;
    };
    recent.iter().all(|k| *k == a || *k == b) && recent.windows(2).all(|w| w[0] != w[1])
}

/// What the controller would do for a given position, before side effects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    pub z_key: Option<String>,
    pub x_key: Option<String>,
    pub ascend: bool,
}

pub struct NavigationController {
    cfg: NavCfg,
    bindings: KeyBindings,
    mapping: KeyMapping,
    target: Position,
    moves: VecDeque<String>,
    rng: Box<dyn RngCore + Send>,
    active: bool,
}

impl core::fmt::Debug for NavigationController {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("NavigationController")
            .field("target", &self.target)
            .field("mapping", &self.mapping)
            .field("moves", &self.moves)
            .field("active", &self.active)
            .finish_non_exhaustive()
    }
}

impl NavigationController {
    pub fn new(cfg: NavCfg, bindings: KeyBindings, mapping: KeyMapping, target: Position) -> Self {
        let rng: Box<dyn RngCore + Send> = match cfg.nudge_seed {
            Some(seed) => Box::new(StdRng::seed_from_u64(seed)),
            None => Box::new(StdRng::from_entropy()),
        };
        Self {
            cfg,
            bindings,
            mapping,
            target,
            moves: VecDeque::with_capacity(MOVE_HISTORY_LEN),
            rng,
            active: false,
        }
    }

    /// Replace the nudge randomness source.
    pub fn with_rng(mut self, rng: impl RngCore + Send + 'static) -> Self {
        self.rng = Box::new(rng);
        self
    }

    pub fn start(&mut self) {
        self.moves.clear();
        self.active = true;
    }

    pub fn stop(&mut self) {
        self.active = false;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn target(&self) -> Position {
        self.target
    }

    /// Targets may change mid-run; the next tick steers toward the new one.
    pub fn set_target(&mut self, target: Position) {
        self.target = target;
    }

    pub fn mapping(&self) -> KeyMapping {
        self.mapping
    }

    pub fn move_history(&self) -> &VecDeque<String> {
        &self.moves
    }

    /// Key that moves `axis` toward the target, or `None` when within tolerance.
    fn corrective_key(&self, axis: Axis, current: Position) -> Option<String> {
        let err = self.target.get(axis) - current.get(axis);
        if err.abs() <= self.cfg.arrival_threshold {
            return None;
        }
        let (key, dir) = self.mapping.binding_for(&self.bindings, axis)?;
        let need_increase = err > 0.0;
        if dir.increases() == need_increase {
            Some(key.to_string())
        } else {
            self.bindings.opposite(key).map(str::to_string)
        }
    }

    pub fn plan(&self, current: Position) -> Plan {
        let dy = self.target.y - current.y;
        let ascend = dy.abs() > self.cfg.arrival_threshold
            && match self.mapping.ascend.sign {
                Sign::Plus => dy > 0.0,
                Sign::Minus => dy < 0.0,
            };
        Plan {
            z_key: self.corrective_key(Axis::Z, current),
            x_key: self.corrective_key(Axis::X, current),
            ascend,
        }
    }

    /// Record an issued horizontal key. Switching to the other physical pair
    /// means the previous axis settled, so the history starts over.
    fn record_move(&mut self, key: &str) {
        let switched_pair = self
            .moves
            .back()
            .is_some_and(|last| self.bindings.pair_of(last) != self.bindings.pair_of(key));
        if switched_pair {
            self.moves.clear();
        }
        if self.moves.len() == MOVE_HISTORY_LEN {
            self.moves.pop_front();
        }
        self.moves.push_back(key.to_string());
    }

    fn pick_nudge_key(&mut self) -> String {
        let keys = self.bindings.movement_keys();
        let idx = self.rng.gen_range(0..keys.len());
        keys[idx].to_string()
    }

    /// One control decision. Errors come only from key actuation; callers
    /// treat them as transient.
    pub fn tick<C, R, K>(&mut self, rig: &mut Rig<C, R, K>) -> Result<NavStatus>
    where
        C: ScreenCapture,
        R: TextRecognizer,
        K: KeyInput,
    {
        if !self.active {
            return Ok(NavStatus::Inactive);
        }

        let pos = match rig.sampler.sample() {
            Ok(p) => p,
            Err(reason) => {
                tracing::debug!(%reason, "tick skipped: unreadable");
                return Ok(NavStatus::Skipped(SkipReason::Unreadable(reason)));
            }
        };
        if rig.sampler.is_transitioning(self.cfg.settle_threshold) {
            tracing::debug!(%pos, "tick skipped: reading still settling");
            rig.sleep_ms(self.cfg.transition_wait_ms);
            return Ok(NavStatus::Skipped(SkipReason::Transitioning));
        }

        let plan = self.plan(pos);

        if pos.y < self.cfg.hazard_y {
            let mut keys = vec![self.bindings.ascend.clone()];
            keys.extend(plan.z_key.iter().cloned());
            keys.extend(plan.x_key.iter().cloned());
            tracing::info!(%pos, ?keys, "below hazard plane; recovering");
            let held: Vec<&str> = keys.iter().map(String::as_str).collect();
            rig.hold(&held, self.cfg.hazard_burst_ms)?;
            return Ok(NavStatus::Recovering { keys });
        }

        if plan.ascend {
            tracing::debug!(%pos, "ascending");
            rig.tap(&self.bindings.ascend)?;
            return Ok(NavStatus::Ascending);
        }

        if let Some(key) = plan.z_key.or(plan.x_key) {
            self.record_move(&key);
            if is_oscillating(&self.moves, &self.bindings) {
                let nudge = self.pick_nudge_key();
                rig.emit(NavEvent::Stuck {
                    nudge_key: nudge.clone(),
                    position: pos,
                });
                self.moves.clear();
                rig.hold(&[nudge.as_str()], self.cfg.nudge_ms)?;
                return Ok(NavStatus::Nudged { key: nudge });
            }
            tracing::trace!(%pos, key = %key, "correction pulse");
            rig.hold(&[key.as_str()], self.cfg.pulse_ms)?;
            return Ok(NavStatus::Moving { key });
        }

        self.active = false;
        rig.emit(NavEvent::Arrived { position: pos });
        if let Some(hotkey) = &self.cfg.arrival_hotkey
            && let Err(e) = rig.tap(hotkey)
        {
            tracing::warn!(hotkey = %hotkey, error = %e, "arrival hotkey failed");
        }
        Ok(NavStatus::Arrived(pos))
    }
}
