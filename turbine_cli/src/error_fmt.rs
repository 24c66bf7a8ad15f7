//! Human-readable error descriptions and structured JSON error formatting.

use turbine_core::error::{ConfigError, DataLogError, MonitorError, SensorError};

/// First error of type `E` anywhere in the report chain.
fn find<E: std::error::Error + 'static>(err: &eyre::Report) -> Option<&E> {
    err.chain().find_map(|e| e.downcast_ref::<E>())
}

fn config_error(err: &eyre::Report) -> Option<&ConfigError> {
    find::<ConfigError>(err).or_else(|| match find::<MonitorError>(err) {
        Some(MonitorError::Config(c)) => Some(c),
        _ => None,
    })
}

fn data_error(err: &eyre::Report) -> Option<&DataLogError> {
    find::<DataLogError>(err).or_else(|| match find::<MonitorError>(err) {
        Some(MonitorError::DataLog(d)) => Some(d),
        _ => None,
    })
}

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    // Typed matches first
    if let Some(ce) = config_error(err) {
        return match ce {
            ConfigError::NonPositiveWindow => "What happened: The window size is zero or negative.\nLikely causes: [window].size_secs or --window-secs set to 0.\nHow to fix: Use the rotation period of the turbine (6.6 s by default).".to_string(),
            ConfigError::SensitivityOutOfRange(s) => format!(
                "What happened: Sensitivity {s} is outside [0.0, 1.0].\nLikely causes: Typo in [alerts].sensitivity.\nHow to fix: Pick a value between 0.0 and 1.0."
            ),
            ConfigError::Invalid(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Missing or out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun."
            ),
        };
    }

    if let Some(de) = data_error(err) {
        return match de {
            DataLogError::MissingColumn(c) => format!(
                "What happened: Column {c:?} is missing from the feature table.\nLikely causes: The file was not produced by `extract`, or the header was edited.\nHow to fix: Regenerate it with `turbine extract`."
            ),
            DataLogError::Io(e) => format!(
                "What happened: A data file could not be read or written ({e}).\nLikely causes: Wrong path or missing permissions.\nHow to fix: Check the path and that the directory is writable."
            ),
            DataLogError::Csv(e) if e.is_io_error() => format!(
                "What happened: A data file could not be read ({e}).\nLikely causes: Wrong path or missing permissions.\nHow to fix: Check the path passed on the command line."
            ),
            DataLogError::Csv(e) => format!(
                "What happened: Malformed CSV ({e}).\nLikely causes: Truncated or hand-edited file.\nHow to fix: Regenerate the file or fix the offending row."
            ),
        };
    }

    if let Some(se) = find::<SensorError>(err) {
        return format!(
            "What happened: The IMU could not be read ({se}).\nLikely causes: MPU-6050 not wired to the configured I2C bus, wrong address, or no power.\nHow to fix: Check [sensor].i2c_bus and i2c_address, verify wiring, or run with --simulate."
        );
    }

    // String-based heuristics for errors coming from init or config
    let msg = err.to_string();
    let lower = format!("{err:#}").to_ascii_lowercase();

    if lower.contains("read config") || lower.contains("parse config") {
        return format!(
            "What happened: The config file could not be loaded.\nLikely causes: Wrong --config path or TOML syntax error.\nHow to fix: Check the file exists and is valid TOML. Details: {msg}"
        );
    }

    if lower.contains("invalid configuration") || lower.contains("must be") {
        return format!(
            "What happened: Configuration is invalid ({}).\nLikely causes: Out-of-range values in the TOML or on the command line.\nHow to fix: Edit the config or the flag, then rerun.",
            root_message(err)
        );
    }

    if lower.contains("mpu6050") || lower.contains("i2c") {
        return "What happened: Failed to initialize the IMU.\nLikely causes: I2C disabled, wrong bus/address, or insufficient permissions.\nHow to fix: Enable I2C, fix [sensor] in the config, and ensure access to /dev/i2c-*.".to_string();
    }

    if lower.contains("model artifact") {
        return format!(
            "What happened: {msg}.\nLikely causes: Missing file or unsupported JSON layout.\nHow to fix: Pass --model with a bare or bundled model JSON."
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

fn root_message(err: &eyre::Report) -> String {
    err.chain()
        .last()
        .map_or_else(|| err.to_string(), ToString::to_string)
}

/// Stable exit codes: 2 configuration, 3 data files, 4 sensor, 1 anything else.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    match reason_name(err) {
        "Config" => 2,
        "DataFile" => 3,
        "Sensor" => 4,
        _ => 1,
    }
}

fn reason_name(err: &eyre::Report) -> &'static str {
    if config_error(err).is_some() {
        return "Config";
    }
    if data_error(err).is_some() {
        return "DataFile";
    }
    if find::<SensorError>(err).is_some() {
        return "Sensor";
    }
    let lower = format!("{err:#}").to_ascii_lowercase();
    if lower.contains("config") || lower.contains("must be") {
        return "Config";
    }
    "Error"
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    serde_json::json!({ "reason": reason_name(err), "message": humanize(err) }).to_string()
}
