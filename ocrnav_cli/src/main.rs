mod cli;
mod error_fmt;
mod nav;

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use clap::Parser;
use eyre::WrapErr;
use ocrnav_core::{KeyMapping, NavError, Position};
use ocrnav_traits::Region;
use serde_json::json;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

use crate::cli::{Cli, Commands, FILE_GUARD, JSON_MODE};
use crate::error_fmt::{exit_code_for_error, format_error_json, humanize, reason_name};

fn main() {
    let _ = color_eyre::install();
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);

    let loaded = ocrnav_config::load_file(&cli.config);
    init_tracing(&cli, loaded.as_ref().ok().map(|c| &c.logging));

    if let Err(err) = loaded.and_then(|cfg| run(cli, cfg)) {
        if JSON_MODE.get().copied().unwrap_or(false) {
            eprintln!("{}", format_error_json(&err));
        } else {
            eprintln!("{}", humanize(&err));
        }
        tracing::debug!(error = ?err, "exiting with error");
        std::process::exit(exit_code_for_error(&err));
    }
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Console logs go to stderr so stdout stays free for results.
fn init_tracing(cli: &Cli, logging: Option<&ocrnav_config::Logging>) {
    let console_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    let console: BoxedLayer = if cli.json {
        fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_filter(console_filter)
            .boxed()
    } else {
        fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr)
            .with_filter(console_filter)
            .boxed()
    };
    let mut layers = vec![console];

    if let Some(log) = logging
        && let Some(file) = log.file.as_deref()
    {
        let path = Path::new(file);
        let dir = path
            .parent()
            .filter(|d| !d.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let name = path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "ocrnav.log".into());
        let appender = match log.rotation.as_deref() {
            Some("daily") => tracing_appender::rolling::daily(dir, name),
            Some("hourly") => tracing_appender::rolling::hourly(dir, name),
            _ => tracing_appender::rolling::never(dir, name),
        };
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let _ = FILE_GUARD.set(guard);
        let level = log.level.as_deref().unwrap_or("info");
        layers.push(
            fmt::layer()
                .json()
                .with_ansi(false)
                .with_writer(writer)
                .with_filter(EnvFilter::new(level))
                .boxed(),
        );
    }

    let _ = tracing_subscriber::registry().with(layers).try_init();
}

fn run(cli: Cli, mut cfg: ocrnav_config::Config) -> eyre::Result<()> {
    cfg.validate().wrap_err("invalid configuration")?;

    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let flag = Arc::clone(&shutdown);
        if let Err(e) = ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst)) {
            tracing::warn!(error = %e, "ctrl-c handler not installed");
        }
    }

    let path = cli.config.as_path();
    let backend = nav::sim_backend(&cli.sim);
    let json = cli.json;

    match cli.cmd {
        Commands::Navigate {
            x,
            y,
            z,
            recalibrate,
            max_ticks,
            no_save,
        } => {
            let base = Position::from(&cfg.target);
            let target = Position::new(
                x.unwrap_or(base.x),
                y.unwrap_or(base.y),
                z.unwrap_or(base.z),
            );
            tracing::info!(%target, recalibrate, "navigate");
            let (outcome, result) = nav::run_navigate(
                &mut cfg,
                path,
                &backend,
                target,
                recalibrate,
                max_ticks,
                !no_save,
                json,
                shutdown,
            );
            if json {
                let abort = result
                    .as_ref()
                    .err()
                    .and_then(|e| e.downcast_ref::<NavError>())
                    .map(reason_name);
                println!(
                    "{}",
                    json!({
                        "timestamp": unix_ms(),
                        "target": pos_json(outcome.target),
                        "final": outcome.arrived.map(pos_json),
                        "mapping": outcome.mapping.map(mapping_json),
                        "duration_ms": outcome.duration_ms,
                        "abort_reason": abort,
                    })
                );
            }
            result?;
            if !json && let Some(pos) = outcome.arrived {
                println!("Arrived at {pos} in {} ms", outcome.duration_ms);
            }
        }
        Commands::Calibrate { no_save } => {
            let mapping = nav::run_calibrate(&mut cfg, path, &backend, !no_save, json, shutdown)?;
            if json {
                println!("{}", mapping_json(mapping));
            } else {
                println!("Mapping: {mapping}");
            }
        }
        Commands::Read => {
            let pos = nav::read_once(&cfg, &backend)?;
            if json {
                println!("{}", pos_json(pos));
            } else {
                println!("{pos}");
            }
        }
        Commands::SetTarget => {
            let pos = nav::set_target(&mut cfg, path, &backend)?;
            if json {
                println!("{}", pos_json(pos));
            } else {
                println!("Target set to {pos}");
            }
        }
        Commands::Preset => {
            let mapping = nav::apply_preset(&mut cfg, path)?;
            if json {
                println!("{}", mapping_json(mapping));
            } else {
                println!("Preset stored: {mapping}");
            }
        }
        Commands::Region {
            left,
            top,
            width,
            height,
        } => {
            let region = Region::new(left, top, width, height);
            nav::set_region(&mut cfg, path, region)?;
            if json {
                println!(
                    "{}",
                    json!({ "left": left, "top": top, "width": width, "height": height })
                );
            } else {
                println!("Region stored: left={left} top={top} width={width} height={height}");
            }
        }
        Commands::SelfCheck => {
            let pos = nav::self_check(&cfg, &backend)?;
            if json {
                println!("{}", json!({ "ok": true, "read": pos_json(pos) }));
            } else {
                println!("OK (read {pos})");
            }
        }
    }
    Ok(())
}

fn pos_json(p: Position) -> serde_json::Value {
    json!({ "x": p.x, "y": p.y, "z": p.z })
}

fn mapping_json(m: KeyMapping) -> serde_json::Value {
    json!({
        "forward": m.forward.to_string(),
        "strafe": m.strafe.to_string(),
        "ascend": m.ascend.to_string(),
    })
}

fn unix_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}
