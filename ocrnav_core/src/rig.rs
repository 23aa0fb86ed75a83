//! The session's hands and eyes: sampler, keyboard, clock and event sink.
//!
//! Both the calibrator and the controller borrow a `Rig` mutably for the
//! duration of one operation; nothing else touches it, which keeps the
//! position history single-writer.
use std::sync::Arc;

use ocrnav_traits::{Clock, KeyInput, ScreenCapture, TextRecognizer};

use crate::error::Result;
use crate::events::{EventSink, NavEvent};
use crate::input_error::map_input_error;
use crate::sampler::PositionSampler;

pub struct Rig<C, R, K> {
    pub sampler: PositionSampler<C, R>,
    pub input: K,
    pub clock: Arc<dyn Clock + Send + Sync>,
    pub events: Box<dyn EventSink>,
}

impl<C, R, K> core::fmt::Debug for Rig<C, R, K> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Rig")
            .field("sampler", &self.sampler)
            .finish_non_exhaustive()
    }
}

impl<C: ScreenCapture, R: TextRecognizer, K: KeyInput> Rig<C, R, K> {
    pub fn new(
        sampler: PositionSampler<C, R>,
        input: K,
        clock: Arc<dyn Clock + Send + Sync>,
        events: Box<dyn EventSink>,
    ) -> Self {
        Self {
            sampler,
            input,
            clock,
            events,
        }
    }

    /// Log the event and hand it to the sink.
    pub fn emit(&self, event: NavEvent) {
        if event.is_warning() {
            tracing::warn!(position = ?event.position(), "{}", event.message());
        } else {
            tracing::info!(position = ?event.position(), "{}", event.message());
        }
        self.events.emit(event);
    }

    pub fn sleep_ms(&self, ms: u64) {
        self.clock.sleep_ms(ms);
    }

    /// Hold `keys` together for `ms`, then release them in order.
    ///
    /// Keys already pressed are released even if a later press fails.
    pub fn hold(&mut self, keys: &[&str], ms: u64) -> Result<()> {
        let mut down = Vec::with_capacity(keys.len());
        let mut failure = None;
        for key in keys {
            match self.input.key_down(key) {
                Ok(()) => down.push(*key),
                Err(e) => {
                    failure = Some(map_input_error(&*e));
                    break;
                }
            }
        }
        if failure.is_none() {
            self.clock.sleep_ms(ms);
        }
        for key in &down {
            if let Err(e) = self.input.key_up(key) {
                tracing::warn!(key, error = %e, "key release failed");
                if failure.is_none() {
                    failure = Some(map_input_error(&*e));
                }
            }
        }
        match failure {
            Some(e) => Err(eyre::Report::new(e)),
            None => Ok(()),
        }
    }

    pub fn tap(&mut self, key: &str) -> Result<()> {
        self.input
            .press(key)
            .map_err(|e| eyre::Report::new(map_input_error(&*e)))
    }

    /// Best-effort `key_up` on every key; failures are logged, never raised.
    pub fn release_all(&mut self, keys: &[&str]) {
        for key in keys {
            if let Err(e) = self.input.key_up(key) {
                tracing::warn!(key, error = %e, "cleanup key release failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::NullSink;
    use crate::mocks::{EchoRecognizer, KeyEvent, RecordingInput, TextCapture};
    use ocrnav_traits::BoxError;
    use ocrnav_traits::clock::test_clock::TestClock;

    fn rig<K: KeyInput>(input: K, clock: TestClock) -> Rig<TextCapture, EchoRecognizer, K> {
        let sampler = PositionSampler::new(TextCapture::new(["0 0 0"]), EchoRecognizer, None)
            .unwrap();
        Rig::new(sampler, input, Arc::new(clock), Box::new(NullSink))
    }

    #[test]
    fn hold_presses_together_then_releases() {
        let input = RecordingInput::new();
        let clock = TestClock::new();
        let mut r = rig(input.clone(), clock.clone());
        r.hold(&["space", "w"], 300).unwrap();
        assert_eq!(
            input.events(),
            vec![
                KeyEvent::Down("space".into()),
                KeyEvent::Down("w".into()),
                KeyEvent::Up("space".into()),
                KeyEvent::Up("w".into()),
            ]
        );
        assert_eq!(clock.elapsed().as_millis(), 300);
    }

    struct Jammed {
        inner: RecordingInput,
    }
    impl KeyInput for Jammed {
        fn key_down(&mut self, key: &str) -> std::result::Result<(), BoxError> {
            if key == "d" {
                return Err("jammed".into());
            }
            self.inner.key_down(key)
        }
        fn key_up(&mut self, key: &str) -> std::result::Result<(), BoxError> {
            self.inner.key_up(key)
        }
    }

    #[test]
    fn failed_press_still_releases_earlier_keys() {
        let log = RecordingInput::new();
        let clock = TestClock::new();
        let mut r = rig(Jammed { inner: log.clone() }, clock.clone());
        let err = r.hold(&["space", "d"], 300).unwrap_err();
        assert!(format!("{err}").contains("jammed"));
        assert_eq!(
            log.events(),
            vec![KeyEvent::Down("space".into()), KeyEvent::Up("space".into())]
        );
        assert_eq!(clock.elapsed().as_millis(), 0);
    }
}
