#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod cli;
mod error_fmt;
mod monitor;
mod tools;

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;
use eyre::WrapErr;

use crate::cli::{Cli, Commands, DEFAULT_CONFIG, FILE_GUARD, JSON_MODE};

fn main() {
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);

    if let Err(e) = real_main(cli) {
        if JSON_MODE.get().copied().unwrap_or(false) {
            eprintln!("{}", error_fmt::format_error_json(&e));
        } else {
            eprintln!("{}", error_fmt::humanize(&e));
        }
        std::process::exit(error_fmt::exit_code_for_error(&e));
    }
}

fn real_main(cli: Cli) -> eyre::Result<()> {
    let _ = color_eyre::install();

    let (cfg, from_defaults) = load_config(&cli.config)?;
    init_tracing(cli.json, cli.log_level.as_deref(), &cfg.logging);
    if from_defaults {
        tracing::info!(path = %cli.config.display(), "config file not found; using built-in defaults");
    } else {
        tracing::info!(path = %cli.config.display(), "config loaded");
    }

    match cli.cmd {
        Commands::Monitor(args) => {
            let shutdown = Arc::new(AtomicBool::new(false));
            let flag = shutdown.clone();
            ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst))
                .wrap_err("install Ctrl-C handler")?;
            let stats = monitor::run_monitor(cfg, &args, &shutdown)?;
            monitor::print_summary(&stats, cli.json);
            Ok(())
        }
        Commands::Extract {
            input,
            output,
            window_secs,
        } => tools::run_extract(&cfg, &input, &output, window_secs, cli.json),
        Commands::Evaluate {
            model,
            scaler,
            normal,
            anomaly,
        } => tools::run_evaluate(&cfg, model, scaler, &normal, &anomaly, cli.json),
        Commands::SelfCheck { simulate } => tools::run_self_check(&cfg, simulate, cli.json),
    }
}

/// Load and validate the config. Returns `true` alongside the defaults when
/// the default path does not exist.
fn load_config(path: &Path) -> eyre::Result<(turbine_config::Config, bool)> {
    if !path.exists() && path == Path::new(DEFAULT_CONFIG) {
        return Ok((turbine_config::Config::default(), true));
    }
    let cfg = turbine_config::load_file(path)?;
    cfg.validate().wrap_err("invalid configuration")?;
    Ok((cfg, false))
}

fn init_tracing(json: bool, cli_level: Option<&str>, logging: &turbine_config::Logging) {
    use tracing_subscriber::{EnvFilter, Layer, fmt, prelude::*};

    // RUST_LOG wins, then --log-level, then [logging].level.
    let level = cli_level
        .or(logging.level.as_deref())
        .unwrap_or("info");
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let console = if json {
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

    let file_layer = logging.file.as_deref().map(|file| {
        let path = Path::new(file);
        let dir = path
            .parent()
            .filter(|d| !d.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let name = path
            .file_name()
            .map_or_else(|| "turbine.log".into(), std::ffi::OsStr::to_os_string);
        let appender = match logging.rotation.as_deref() {
            Some("daily") => tracing_appender::rolling::daily(dir, name),
            Some("hourly") => tracing_appender::rolling::hourly(dir, name),
            _ => tracing_appender::rolling::never(dir, name),
        };
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let _ = FILE_GUARD.set(guard);
        fmt::layer()
            .json()
            .with_ansi(false)
            .with_writer(writer)
            .boxed()
    });

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file_layer)
        .try_init();
}
