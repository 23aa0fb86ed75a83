use std::sync::Arc;

use ocrnav_traits::{BoxError, Clock, KeyInput};

use crate::SimWorld;

/// Keyboard for the simulated world. Hold time is measured on `clock`.
pub struct SimKeys {
    world: SimWorld,
    clock: Arc<dyn Clock + Send + Sync>,
}

impl core::fmt::Debug for SimKeys {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SimKeys").field("world", &self.world).finish()
    }
}

impl SimKeys {
    pub fn new(world: SimWorld, clock: Arc<dyn Clock + Send + Sync>) -> Self {
        Self { world, clock }
    }
}

impl KeyInput for SimKeys {
    fn key_down(&mut self, key: &str) -> Result<(), BoxError> {
        Ok(self.world.press_down(key, self.clock.now())?)
    }

    fn key_up(&mut self, key: &str) -> Result<(), BoxError> {
        Ok(self.world.release(key, self.clock.now())?)
    }

    fn press(&mut self, key: &str) -> Result<(), BoxError> {
        Ok(self.world.tap(key)?)
    }
}
