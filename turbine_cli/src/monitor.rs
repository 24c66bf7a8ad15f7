//! Monitor command: config mapping, device assembly, and the run loop.

use std::sync::atomic::AtomicBool;

use eyre::WrapErr;
use turbine_core::runner::{RunParams, SamplingMode};
use turbine_core::{Monitor, MonitorStats, PollCfg};
use turbine_hardware::{LogDisplay, LogTransport, SimulatedImu};
use turbine_traits::{MotionSensor, MonotonicClock};

use crate::cli::MonitorArgs;

/// Simulated fault amplitude (m/s²) injected into the simulated IMU.
pub const SIM_FAULT_ENV: &str = "TURBINE_SIM_FAULT";
/// Make every n-th simulated read fail.
pub const SIM_FAIL_EVERY_ENV: &str = "TURBINE_SIM_FAIL_EVERY";

/// Clamp an operator-supplied sensitivity into [0, 1], warning when it moves.
pub fn clamp_sensitivity(requested: f64) -> f64 {
    let default = turbine_config::AlertsCfg::default().sensitivity;
    let clamped = if requested.is_nan() {
        default
    } else {
        requested.clamp(0.0, 1.0)
    };
    if clamped != requested {
        tracing::warn!(requested, using = clamped, "sensitivity out of range; clamped");
    }
    clamped
}

/// Fold command-line overrides into the loaded config and revalidate.
pub fn apply_overrides(cfg: &mut turbine_config::Config, args: &MonitorArgs) -> eyre::Result<()> {
    if let Some(enabled) = args.alerts {
        cfg.alerts.enabled = enabled;
    }
    if let Some(t) = args.threshold {
        cfg.alerts.threshold = t;
    }
    if let Some(s) = args.sensitivity {
        cfg.alerts.sensitivity = clamp_sensitivity(s);
    }
    if let Some(c) = args.cooldown_secs {
        cfg.alerts.cooldown_secs = c;
    }
    if args.sampler {
        cfg.runner.mode = turbine_config::RunMode::Sampler;
    }
    cfg.validate().wrap_err("invalid configuration after command-line overrides")
}

pub fn make_sensor(
    cfg: &turbine_config::Config,
    simulate: bool,
) -> eyre::Result<Box<dyn MotionSensor + Send>> {
    #[cfg(all(feature = "hardware", target_os = "linux"))]
    {
        if !simulate {
            let imu = turbine_hardware::HardwareImu::try_new(
                cfg.sensor.i2c_bus,
                cfg.sensor.i2c_address,
            )
            .wrap_err("open mpu6050")?;
            return Ok(Box::new(imu));
        }
    }
    #[cfg(not(all(feature = "hardware", target_os = "linux")))]
    let _ = simulate;

    let mut sim = SimulatedImu::new(cfg.sensor.poll_ms as f64 / 1000.0);
    if let Some(amp) = env_parse::<f64>(SIM_FAULT_ENV) {
        sim = sim.with_fault(amp);
    }
    if let Some(n) = env_parse::<u64>(SIM_FAIL_EVERY_ENV) {
        sim = sim.with_fail_every(n);
    }
    tracing::info!("using simulated IMU");
    Ok(Box::new(sim))
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

pub fn run_monitor(
    mut cfg: turbine_config::Config,
    args: &MonitorArgs,
    shutdown: &AtomicBool,
) -> eyre::Result<MonitorStats> {
    apply_overrides(&mut cfg, args)?;

    let poll: PollCfg = (&cfg.sensor).into();
    let mode: SamplingMode = (&cfg.runner).into();
    let mut monitor = Monitor::from_config(&cfg)?
        .with_transport(LogTransport::new())
        .with_display(LogDisplay::new());

    let sensor = make_sensor(&cfg, args.simulate)?;
    let params = RunParams {
        poll_period: poll.period,
        mode,
        max_polls: args.max_polls,
    };
    Ok(turbine_core::runner::run(
        sensor,
        &mut monitor,
        MonotonicClock::new(),
        shutdown,
        params,
    ))
}

pub fn print_summary(stats: &MonitorStats, json: bool) {
    if json {
        println!(
            "{}",
            serde_json::json!({
                "readings": stats.readings,
                "sensor_errors": stats.sensor_errors,
                "windows": stats.windows,
                "empty_windows": stats.empty_windows,
                "alerts": stats.alerts,
                "suppressed": stats.suppressed,
                "transport_failures": stats.transport_failures,
                "log_failures": stats.log_failures,
            })
        );
    } else {
        println!(
            "monitor stopped: {} readings, {} windows, {} alerts ({} suppressed), {} sensor errors",
            stats.readings, stats.windows, stats.alerts, stats.suppressed, stats.sensor_errors
        );
    }
}
