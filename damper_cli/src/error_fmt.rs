//! Human-readable error descriptions and structured JSON error formatting.

use damper_core::error::{BuildError, DamperError};
use damper_hardware::error::HwError;

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    let msg = err.to_string();
    let lower = msg.to_ascii_lowercase();

    // Profile CSV header special-case; it arrives wrapped as a config error
    if lower.contains("profile csv must have headers") {
        return "Invalid headers in profile CSV. Expected 'mean,scale'.".to_string();
    }

    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::MissingSensor => {
                "What happened: No sensor was provided to the pipeline.\nLikely causes: The IMU port failed to open or was not wired into the builder.\nHow to fix: Check devices.sensor_port and pass the sensor via with_sensor(...).".to_string()
            }
            BuildError::MissingActuator => {
                "What happened: No actuator was provided to the pipeline.\nLikely causes: The motor controller port failed to open or was not wired into the builder.\nHow to fix: Check devices.actuator_port and pass the actuator via with_actuator(...).".to_string()
            }
            BuildError::MissingLog => {
                "What happened: No sample log was provided to the pipeline.\nLikely causes: The log file could not be created or was not wired into the builder.\nHow to fix: Check sample_log.path and pass the logger via with_sample_log(...).".to_string()
            }
            BuildError::MissingOracle | BuildError::MissingProfile => format!(
                "What happened: {be}.\nLikely causes: The model section was not loaded before building.\nHow to fix: Check model.profile and model.artifact in the config."
            ),
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Missing or out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun. See etc/damper.toml for a sample."
            ),
        };
    }

    if let Some(de) = err.downcast_ref::<DamperError>() {
        return match de {
            DamperError::Config(detail) => format!(
                "What happened: Invalid configuration ({detail}).\nLikely causes: Missing or out-of-range values in the TOML, or a profile/model that does not match the window.\nHow to fix: Edit the config or regenerate the artifacts, then run `damper self-check`."
            ),
            DamperError::DeviceLost { device, reason } => format!(
                "What happened: The {device} connection was lost ({reason}).\nLikely causes: Cable unplugged, board reset, or the port was taken by another process.\nHow to fix: Reconnect the board, check the port in [devices], then start a new run."
            ),
            DamperError::Timeout { device } => format!(
                "What happened: The {device} did not accept a command in time.\nLikely causes: The board stopped reading its serial input or the baud rate is wrong.\nHow to fix: Power-cycle the board and verify devices.baud_rate."
            ),
            DamperError::Log(detail) => format!(
                "What happened: Writing the sample log failed ({detail}).\nLikely causes: Disk full, missing directory, or no write permission.\nHow to fix: Free space or point sample_log.path somewhere writable."
            ),
            other => format!(
                "What happened: {other}.\nLikely causes: See logs.\nHow to fix: Re-run with --log-level=debug or set RUST_LOG for more detail."
            ),
        };
    }

    if let Some(hw) = err.downcast_ref::<HwError>() {
        return format!(
            "What happened: Failed to open a serial device ({hw}).\nLikely causes: Wrong port name, board not connected, or insufficient permissions on the device node.\nHow to fix: Fix [devices] in the config (use \"sim\" for the simulator); ensure the user is in the dialout group.\nContext: {msg}"
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

/// Stable exit codes: 2 config, 3 device, 4 sample log, 1 anything else.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    if err.downcast_ref::<BuildError>().is_some() {
        return 2;
    }
    if let Some(de) = err.downcast_ref::<DamperError>() {
        return match de {
            DamperError::Config(_) => 2,
            DamperError::DeviceLost { .. } | DamperError::Timeout { .. } => 3,
            DamperError::Log(_) => 4,
            DamperError::TaskPanicked(_) | DamperError::Spawn { .. } => 1,
        };
    }
    if err.downcast_ref::<HwError>().is_some() {
        return 3;
    }
    1
}

/// Short machine-readable name for the error class.
pub fn reason_name(err: &eyre::Report) -> &'static str {
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::InvalidConfig(_) => "InvalidConfig",
            _ => "Build",
        };
    }
    if let Some(de) = err.downcast_ref::<DamperError>() {
        return match de {
            DamperError::Config(_) => "Config",
            DamperError::DeviceLost { .. } => "DeviceLost",
            DamperError::Timeout { .. } => "Timeout",
            DamperError::Log(_) => "Log",
            DamperError::TaskPanicked(_) => "TaskPanicked",
            DamperError::Spawn { .. } => "Spawn",
        };
    }
    if err.downcast_ref::<HwError>().is_some() {
        return "DeviceOpen";
    }
    "Error"
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use serde_json::json;

    let details = match err.downcast_ref::<DamperError>() {
        Some(DamperError::DeviceLost { device, reason }) => {
            Some(json!({ "device": device, "cause": reason }))
        }
        Some(DamperError::Timeout { device }) => Some(json!({ "device": device })),
        _ => None,
    };

    let obj = match details {
        Some(d) => json!({
            "reason": reason_name(err),
            "exit_code": exit_code_for_error(err),
            "details": d,
            "message": humanize(err),
        }),
        None => json!({
            "reason": reason_name(err),
            "exit_code": exit_code_for_error(err),
            "message": humanize(err),
        }),
    };
    obj.to_string()
}
