//! Human-readable error descriptions and structured JSON error formatting.

use ocrnav_core::error::{BuildError, NavError};

/// Stable machine name for a navigation failure.
pub fn reason_name(err: &NavError) -> &'static str {
    match err {
        NavError::Input(_) => "Input",
        NavError::Fault(_) => "Fault",
        NavError::MissingRegion => "MissingRegion",
        NavError::Config(_) => "Config",
        NavError::Cancelled => "Cancelled",
        NavError::CalibrationExhausted { .. } => "CalibrationExhausted",
        NavError::TickBudgetExhausted(_) => "TickBudgetExhausted",
    }
}

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    // Typed matches first
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::MissingCapture => {
                "What happened: No screen capture backend was provided.\nLikely causes: The capture backend failed to initialize or was not wired into the builder.\nHow to fix: Pass a capture backend via with_capture(...).".to_string()
            }
            BuildError::MissingRecognizer => {
                "What happened: No text recognizer was provided.\nLikely causes: The OCR backend failed to initialize or was not wired into the builder.\nHow to fix: Pass a recognizer via with_recognizer(...).".to_string()
            }
            BuildError::MissingInput => {
                "What happened: No keyboard backend was provided.\nLikely causes: The key input backend failed to initialize or was not wired into the builder.\nHow to fix: Pass a key input via with_input(...).".to_string()
            }
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Zero, negative or non-finite values in [navigation] or [calibration].\nHow to fix: Edit the config file, then rerun."
            ),
        };
    }

    if let Some(ne) = err.downcast_ref::<NavError>() {
        return match ne {
            NavError::MissingRegion => {
                "What happened: No OCR region is configured, so the coordinate HUD cannot be read.\nLikely causes: First run, or [ocr] region was removed from the config.\nHow to fix: Store the HUD rectangle, e.g. `ocrnav region 0 0 200 30`, then rerun.".to_string()
            }
            NavError::Cancelled => {
                "What happened: The run was cancelled.\nLikely causes: Ctrl-C or a stop request.\nHow to fix: Start a new run when ready.".to_string()
            }
            NavError::CalibrationExhausted { key, attempts } => format!(
                "What happened: Calibration of key {key:?} failed after {attempts} attempts.\nLikely causes: The key is not bound in game, the player is blocked, or the HUD is misread.\nHow to fix: Check [keys], clear obstacles, verify `ocrnav read`, or use `ocrnav preset`."
            ),
            NavError::TickBudgetExhausted(n) => format!(
                "What happened: The destination was not reached within {n} ticks.\nLikely causes: An obstacle, a wrong mapping, or a budget that is too small.\nHow to fix: Raise --max-ticks, or rerun with --recalibrate."
            ),
            NavError::Config(msg) => format!(
                "What happened: Configuration problem ({msg}).\nLikely causes: A key name in [keys] that the input backend does not know.\nHow to fix: Fix the key names in the config and rerun."
            ),
            NavError::Input(_) | NavError::Fault(_) => format!(
                "What happened: {ne}.\nLikely causes: See logs.\nHow to fix: Re-run with --log-level=debug or set RUST_LOG for more detail."
            ),
        };
    }

    // String-based heuristics for errors coming from init or config
    let msg = err.to_string();
    let lower = msg.to_ascii_lowercase();

    if lower.contains("parse config") {
        return format!(
            "What happened: The config file is not valid TOML for ocrnav.\nLikely causes: A typo, a wrong value type, or a misplaced section.\nHow to fix: Fix the file or delete it to start from defaults. Original: {msg}"
        );
    }

    if lower.contains("invalid configuration") {
        let detail = err
            .source()
            .map(|s| format!(" ({s})"))
            .unwrap_or_default();
        return format!(
            "What happened: Configuration is invalid{detail}.\nLikely causes: Out-of-range values or malformed direction codes in [mapping].\nHow to fix: Edit the TOML config and try again."
        );
    }

    if lower.contains("ocr read failed") {
        return format!(
            "What happened: {msg}.\nLikely causes: The region does not cover the coordinate HUD, or the HUD is hidden.\nHow to fix: Adjust the rectangle with `ocrnav region` and check with `ocrnav read`."
        );
    }

    // Generic fallback
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Map navigation failures to stable exit codes; everything else returns 1.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    match err.downcast_ref::<NavError>() {
        Some(NavError::MissingRegion) => 3,
        Some(NavError::Cancelled) => 4,
        Some(NavError::CalibrationExhausted { .. }) => 5,
        Some(NavError::TickBudgetExhausted(_)) => 6,
        Some(NavError::Config(_)) => 7,
        _ => 1,
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use serde_json::json;

    if let Some(ne) = err.downcast_ref::<NavError>() {
        let msg = humanize(err);
        let obj = match ne {
            NavError::CalibrationExhausted { key, attempts } => json!({
                "reason": reason_name(ne),
                "details": { "key": key, "attempts": attempts },
                "message": msg,
            }),
            NavError::TickBudgetExhausted(n) => json!({
                "reason": reason_name(ne),
                "details": { "max_ticks": n },
                "message": msg,
            }),
            _ => json!({ "reason": reason_name(ne), "message": msg }),
        };
        return obj.to_string();
    }

    // Generic error JSON
    json!({ "reason": "Error", "message": humanize(err) }).to_string()
}
