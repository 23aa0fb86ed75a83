#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! OCR-driven navigation core (backend-agnostic).
//!
//! All interaction with the game goes through `ocrnav_traits::ScreenCapture`,
//! `ocrnav_traits::TextRecognizer` and `ocrnav_traits::KeyInput`.
//!
//! ## Architecture
//!
//! - **Sampling**: OCR text -> coordinate triplet -> 3-sample moving average (`sampler`)
//! - **Calibration**: double-verified key->axis discovery (`calibrator`)
//! - **Control**: per-tick steering with hazard recovery, ascent and
//!   anti-oscillation nudges (`navigator`)
//! - **Session**: calibrate-then-navigate loop with cooperative cancellation (`session`)
//! - **Events**: non-blocking notifications for a UI (`events`)

pub mod builder;
pub mod calibrator;
pub mod config;
pub mod conversions;
pub mod error;
pub mod events;
pub mod input_error;
pub mod mapping;
pub mod mocks;
pub mod navigator;
pub mod position;
pub mod rig;
pub mod sampler;
pub mod session;
pub mod status;
pub mod util;

pub use builder::{Missing, NavSessionBuilder, Set};
pub use calibrator::{AxisCalibrator, infer_direction};
pub use config::{CalibrationCfg, NavCfg};
pub use error::{BuildError, NavError, Result, Unreadable};
pub use events::{ChannelSink, EventSink, NavEvent, NavState, NullSink};
pub use mapping::{Axis, AxisDirection, KeyBindings, KeyMapping, Sign};
pub use navigator::{NavigationController, is_oscillating};
pub use position::{CoordinateParser, Position};
pub use rig::Rig;
pub use sampler::PositionSampler;
pub use session::{DynSession, NavSession};
pub use status::{NavStatus, SkipReason};
