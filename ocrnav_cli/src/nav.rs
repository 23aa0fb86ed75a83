//! Backend assembly, session runs and config persistence for each subcommand.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Instant;

use eyre::WrapErr;
use ocrnav_config::Config;
use ocrnav_core::error::Result as CoreResult;
use ocrnav_core::{DynSession, KeyMapping, NavEvent, NavSession, Position};
use ocrnav_sim::{KeyEffect, SimClock, SimOcr, SimWorld};
use ocrnav_traits::{Clock, MonotonicClock, Region};

use crate::cli::{SimArgs, SimLayout};

/// Region used by `self-check` when none is configured yet.
const SELF_CHECK_REGION: Region = Region::new(0, 0, 1, 1);

/// The simulated game plus the clock everything waits on.
pub struct Backend {
    pub world: SimWorld,
    pub clock: Arc<dyn Clock + Send + Sync>,
    glitch: f64,
    misread: f64,
    seed: u64,
}

pub fn sim_backend(args: &SimArgs) -> Backend {
    let mut world = SimWorld::standard(args.start, args.speed);
    if args.layout == SimLayout::Rotated {
        let v = args.speed;
        world = world
            .with_key("w", KeyEffect::hold([v, 0.0, 0.0]))
            .with_key("s", KeyEffect::hold([-v, 0.0, 0.0]))
            .with_key("d", KeyEffect::hold([0.0, 0.0, v]))
            .with_key("a", KeyEffect::hold([0.0, 0.0, -v]));
    }
    let clock: Arc<dyn Clock + Send + Sync> = if args.realtime {
        Arc::new(MonotonicClock::new())
    } else {
        Arc::new(SimClock::new())
    };
    Backend {
        world,
        clock,
        glitch: args.glitch,
        misread: args.misread,
        seed: args.seed,
    }
}

/// Session over the simulated backend, configured from `cfg`.
pub fn build_session(
    cfg: &Config,
    backend: &Backend,
    mapping_override: Option<Option<KeyMapping>>,
    max_ticks: Option<u64>,
    quiet: bool,
) -> CoreResult<DynSession> {
    let events = move |ev: NavEvent| {
        if !quiet {
            println!("{}", ev.message());
        }
    };
    let mut builder = NavSession::builder()
        .with_capture(backend.world.screen())
        .with_recognizer(
            SimOcr::new(backend.glitch, backend.seed).with_misread_rate(backend.misread),
        )
        .with_input(backend.world.keys(Arc::clone(&backend.clock)))
        .with_clock(Arc::clone(&backend.clock))
        .with_events(events)
        .apply_config(cfg)?
        .with_max_ticks(max_ticks);
    if let Some(m) = mapping_override {
        builder = builder.with_mapping(m);
    }
    builder.build()
}

/// Outcome of a navigate run, for the JSON result line.
#[derive(Debug, Clone)]
pub struct NavOutcome {
    pub target: Position,
    pub arrived: Option<Position>,
    pub mapping: Option<KeyMapping>,
    pub duration_ms: u64,
}

#[allow(clippy::too_many_arguments)]
pub fn run_navigate(
    cfg: &mut Config,
    path: &Path,
    backend: &Backend,
    target: Position,
    recalibrate: bool,
    max_ticks: Option<u64>,
    save: bool,
    quiet: bool,
    shutdown: Arc<AtomicBool>,
) -> (NavOutcome, CoreResult<()>) {
    let started = backend.clock.now();
    let mut outcome = NavOutcome {
        target,
        arrived: None,
        mapping: None,
        duration_ms: 0,
    };
    let result = (|| -> CoreResult<()> {
        let had_mapping = !recalibrate && cfg.navigation.skip_calibration && cfg.mapping.is_some();
        let mut session = build_session(
            cfg,
            backend,
            recalibrate.then_some(None),
            max_ticks,
            quiet,
        )?;
        let run = session.run(target, shutdown);
        outcome.mapping = session.mapping();
        let saved = match session.mapping() {
            Some(m) if !had_mapping && save => persist_mapping(cfg, path, &m),
            _ => Ok(()),
        };
        outcome.arrived = Some(run_before_save(run, saved)?);
        Ok(())
    })();
    outcome.duration_ms = backend.clock.ms_since(started);
    (outcome, result)
}

pub fn run_calibrate(
    cfg: &mut Config,
    path: &Path,
    backend: &Backend,
    save: bool,
    quiet: bool,
    shutdown: Arc<AtomicBool>,
) -> CoreResult<KeyMapping> {
    let mut session = build_session(cfg, backend, Some(None), None, quiet)?;
    let mapping = session.calibrate(shutdown)?;
    if save {
        persist_mapping(cfg, path, &mapping)?;
    }
    Ok(mapping)
}

/// A failed run wins over a failed save; the save error is only logged then.
fn run_before_save<T>(run: CoreResult<T>, saved: CoreResult<()>) -> CoreResult<T> {
    match (run, saved) {
        (Err(run_err), Err(save_err)) => {
            tracing::warn!(error = %save_err, "mapping not saved");
            Err(run_err)
        }
        (run, saved) => {
            saved?;
            run
        }
    }
}

/// Store a learned mapping and reuse it on the next run.
fn persist_mapping(cfg: &mut Config, path: &Path, mapping: &KeyMapping) -> CoreResult<()> {
    cfg.mapping = Some(mapping.into());
    cfg.navigation.skip_calibration = true;
    cfg.save_file(path)?;
    tracing::info!(path = %path.display(), %mapping, "mapping saved");
    Ok(())
}

/// One OCR read through the configured region.
pub fn read_once(cfg: &Config, backend: &Backend) -> CoreResult<Position> {
    let mut session = build_session(cfg, backend, None, None, true)?;
    if session.region().is_none() {
        return Err(eyre::Report::new(ocrnav_core::NavError::MissingRegion));
    }
    session
        .read_position()
        .map_err(|reason| eyre::eyre!("OCR read failed: {reason}"))
}

pub fn set_target(cfg: &mut Config, path: &Path, backend: &Backend) -> CoreResult<Position> {
    let pos = read_once(cfg, backend)?.rounded();
    cfg.target = pos.into();
    cfg.save_file(path)?;
    Ok(pos)
}

pub fn apply_preset(cfg: &mut Config, path: &Path) -> CoreResult<KeyMapping> {
    let preset = KeyMapping::preset();
    persist_mapping(cfg, path, &preset)?;
    Ok(preset)
}

pub fn set_region(cfg: &mut Config, path: &Path, region: Region) -> CoreResult<()> {
    if region.is_empty() {
        eyre::bail!("invalid configuration: region width and height must be > 0");
    }
    cfg.ocr.region = Some(ocrnav_core::conversions::region_to_array(region));
    cfg.save_file(path)
}

/// Validate the config and prove the read path works end to end.
pub fn self_check(cfg: &Config, backend: &Backend) -> CoreResult<Position> {
    cfg.validate().wrap_err("invalid configuration")?;
    let started = Instant::now();
    let mut session = build_session(cfg, backend, None, None, true)?;
    if session.region().is_none() {
        session.set_region(Some(SELF_CHECK_REGION));
    }
    let pos = session
        .read_position()
        .map_err(|reason| eyre::eyre!("OCR read failed: {reason}"))?;
    tracing::debug!(elapsed_us = started.elapsed().as_micros(), "self-check read");
    Ok(pos)
}
