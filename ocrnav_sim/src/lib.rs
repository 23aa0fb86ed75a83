#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Simulated game for exercising the navigation core without a screen.
//!
//! One `SimWorld` is shared by the three capability implementations:
//! `SimScreen` renders its HUD line, `SimOcr` reads it back (with optional
//! seeded corruption), and `SimKeys` moves the player while keys are held.
//! `SimClock` provides simulated time so multi-second experiments finish
//! instantly.

pub mod clock;
pub mod error;
pub mod hud;
pub mod keys;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

pub use clock::SimClock;
pub use error::SimError;
pub use hud::{SimOcr, SimScreen};
pub use keys::SimKeys;

/// What a key does: velocity while held (units per second) and the
/// displacement of a single tap.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct KeyEffect {
    pub hold: [f32; 3],
    pub tap: [f32; 3],
}

impl KeyEffect {
    pub const NONE: Self = Self {
        hold: [0.0; 3],
        tap: [0.0; 3],
    };

    pub const fn hold(v: [f32; 3]) -> Self {
        Self { hold: v, tap: [0.0; 3] }
    }
}

#[derive(Debug)]
struct WorldState {
    pos: [f32; 3],
    keys: HashMap<String, KeyEffect>,
    held: HashMap<String, Instant>,
    hud_visible: bool,
}

/// Shared handle to the simulated world. Clones observe the same state.
#[derive(Debug, Clone)]
pub struct SimWorld {
    inner: Arc<Mutex<WorldState>>,
}

impl SimWorld {
    /// A world with no bound keys.
    pub fn new(start: [f32; 3]) -> Self {
        Self {
            inner: Arc::new(Mutex::new(WorldState {
                pos: start,
                keys: HashMap::new(),
                held: HashMap::new(),
                hud_visible: true,
            })),
        }
    }

    /// The usual layout: `w` walks -z, `s` +z, `d` +x, `a` -x, `space`
    /// climbs (one tap = 1 unit), and `f1` is bound but does nothing.
    pub fn standard(start: [f32; 3], speed: f32) -> Self {
        Self::new(start)
            .with_key("w", KeyEffect::hold([0.0, 0.0, -speed]))
            .with_key("s", KeyEffect::hold([0.0, 0.0, speed]))
            .with_key("d", KeyEffect::hold([speed, 0.0, 0.0]))
            .with_key("a", KeyEffect::hold([-speed, 0.0, 0.0]))
            .with_key(
                "space",
                KeyEffect {
                    hold: [0.0, speed, 0.0],
                    tap: [0.0, 1.0, 0.0],
                },
            )
            .with_key("f1", KeyEffect::NONE)
    }

    pub fn with_key(self, key: &str, effect: KeyEffect) -> Self {
        self.bind(key, effect);
        self
    }

    pub fn bind(&self, key: &str, effect: KeyEffect) {
        self.state().keys.insert(key.to_string(), effect);
    }

    fn state(&self) -> MutexGuard<'_, WorldState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn position(&self) -> [f32; 3] {
        self.state().pos
    }

    pub fn set_position(&self, pos: [f32; 3]) {
        self.state().pos = pos;
    }

    /// Hide the HUD to simulate a loading screen or an occluded overlay.
    pub fn set_hud_visible(&self, visible: bool) {
        self.state().hud_visible = visible;
    }

    /// The coordinate line as the game would draw it, or `None` when hidden.
    pub fn hud_text(&self) -> Option<String> {
        let s = self.state();
        s.hud_visible
            .then(|| format!("X: {:.2} Y: {:.2} Z: {:.2}", s.pos[0], s.pos[1], s.pos[2]))
    }

    pub fn is_held(&self, key: &str) -> bool {
        self.state().held.contains_key(key)
    }

    pub fn screen(&self) -> SimScreen {
        SimScreen::new(self.clone())
    }

    pub fn keys(&self, clock: Arc<dyn ocrnav_traits::Clock + Send + Sync>) -> SimKeys {
        SimKeys::new(self.clone(), clock)
    }

    fn effect(&self, key: &str) -> error::Result<KeyEffect> {
        self.state()
            .keys
            .get(key)
            .copied()
            .ok_or_else(|| SimError::UnknownKey(key.to_string()))
    }

    fn press_down(&self, key: &str, at: Instant) -> error::Result<()> {
        self.effect(key)?;
        self.state().held.entry(key.to_string()).or_insert(at);
        Ok(())
    }

    /// Integrate the held velocity over `[down, at]`. Releasing a key that
    /// is not held is a no-op.
    fn release(&self, key: &str, at: Instant) -> error::Result<()> {
        let effect = self.effect(key)?;
        let mut s = self.state();
        if let Some(since) = s.held.remove(key) {
            let secs = at.saturating_duration_since(since).as_secs_f32();
            for (p, v) in s.pos.iter_mut().zip(effect.hold) {
                *p += v * secs;
            }
            tracing::trace!(key, secs, pos = ?s.pos, "sim key released");
        }
        Ok(())
    }

    fn tap(&self, key: &str) -> error::Result<()> {
        let effect = self.effect(key)?;
        let mut s = self.state();
        for (p, d) in s.pos.iter_mut().zip(effect.tap) {
            *p += d;
        }
        Ok(())
    }
}
