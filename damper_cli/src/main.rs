mod cli;
mod error_fmt;
mod run;

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;
use damper_config::{Config, Logging};
use damper_core::error::DamperError;
use damper_core::{TimingCfg, WindowCfg};
use eyre::WrapErr;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Layer, fmt};

use crate::cli::{Cli, Commands, FILE_GUARD, JSON_MODE};
use crate::error_fmt::{exit_code_for_error, format_error_json, humanize};

fn main() {
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);
    if let Err(e) = color_eyre::install() {
        eprintln!("warning: could not install error report hooks: {e}");
    }

    let code = match real_main(&cli) {
        Ok(()) => 0,
        Err(e) => {
            tracing::error!(command = cli.cmd.name(), error = %e, "command failed");
            if JSON_MODE.get().copied().unwrap_or(false) {
                eprintln!("{}", format_error_json(&e));
            } else {
                eprintln!("{}", humanize(&e));
            }
            exit_code_for_error(&e)
        }
    };
    std::process::exit(code);
}

fn real_main(cli: &Cli) -> eyre::Result<()> {
    let cfg = run::load_config(&cli.config)?;
    init_tracing(cli, &cfg.logging)?;
    tracing::debug!(config = %cli.config.display(), "config loaded");

    match &cli.cmd {
        Commands::Run { duration_s, stats } => cmd_run(cli, &cfg, *duration_s, *stats),
        Commands::SelfCheck => cmd_self_check(cli, &cfg),
        Commands::Health => {
            if cli.json {
                println!("{}", serde_json::json!({ "status": "ok" }));
            } else {
                println!("ok");
            }
            Ok(())
        }
    }
}

fn parse_rotation(s: Option<&str>) -> Result<Rotation, DamperError> {
    match s.unwrap_or("never").to_ascii_lowercase().as_str() {
        "never" => Ok(Rotation::NEVER),
        "daily" => Ok(Rotation::DAILY),
        "hourly" => Ok(Rotation::HOURLY),
        other => Err(DamperError::Config(format!(
            "logging.rotation must be never, daily or hourly, got {other:?}"
        ))),
    }
}

/// Console logs go to stderr so stdout stays machine-readable. `RUST_LOG`
/// overrides `--log-level`, which overrides `logging.level`.
fn init_tracing(cli: &Cli, logging: &Logging) -> eyre::Result<()> {
    let level = cli
        .log_level
        .as_deref()
        .or(logging.level.as_deref())
        .unwrap_or("info");
    let filter = match EnvFilter::try_from_default_env() {
        Ok(f) => f,
        Err(_) => EnvFilter::try_new(level)
            .map_err(|e| DamperError::Config(format!("log level {level:?}: {e}")))?,
    };

    let console = if cli.json {
        fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .boxed()
    } else {
        fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr)
            .boxed()
    };

    let file_layer = match logging.file.as_deref() {
        Some(file) => {
            let rotation = parse_rotation(logging.rotation.as_deref())?;
            let path = Path::new(file);
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or(Path::new("."));
            let name = path
                .file_name()
                .ok_or_else(|| DamperError::Config(format!("logging.file {file:?} has no file name")))?;
            let appender = RollingFileAppender::new(rotation, dir, name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let _ = FILE_GUARD.set(guard);
            Some(fmt::layer().json().with_ansi(false).with_writer(writer).boxed())
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file_layer)
        .try_init()
        .wrap_err("install tracing subscriber")?;
    Ok(())
}

fn cmd_run(cli: &Cli, cfg: &Config, duration_s: Option<f64>, stats: bool) -> eyre::Result<()> {
    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = stop.clone();
        ctrlc::set_handler(move || {
            stop.store(true, Ordering::Relaxed);
        })
        .wrap_err("install Ctrl-C handler")?;
    }

    let (summary, model) = run::run_loop(cfg, duration_s, stop)?;

    if stats {
        let timing: TimingCfg = (&cfg.timing).into();
        run::print_stats(&summary, &timing);
    }
    if cli.json {
        println!("{}", run::summary_json(&summary, model));
    } else {
        println!(
            "Run complete: {} frames in {:.2} s ({:.1} Hz), {} inferences, {} commands sent",
            summary.acquisition.frames,
            summary.elapsed.as_secs_f64(),
            summary.sample_rate_hz(),
            summary.acquisition.inferences,
            summary.actuation.transmissions
        );
    }
    Ok(())
}

fn cmd_self_check(cli: &Cli, cfg: &Config) -> eyre::Result<()> {
    let window: WindowCfg = (&cfg.window).into();
    let assets = run::load_assets(cfg)?;
    run::check_dimensions(&assets, &window)?;

    if cli.json {
        println!(
            "{}",
            serde_json::json!({
                "status": "ok",
                "window": window.capacity,
                "stride": window.stride,
                "profile_rows": assets.profile.len(),
                "model": assets.model_kind,
                "model_features": assets.model_width,
                "sensor_port": cfg.devices.sensor_port,
                "actuator_port": cfg.devices.actuator_port,
            })
        );
    } else {
        println!("Self-check OK");
        println!(
            "  window: {} samples, stride {}",
            window.capacity, window.stride
        );
        println!("  profile: {} rows", assets.profile.len());
        println!(
            "  model: {} ({} features)",
            assets.model_kind, assets.model_width
        );
        println!(
            "  devices: sensor={} actuator={}",
            cfg.devices.sensor_port, cfg.devices.actuator_port
        );
    }
    Ok(())
}
