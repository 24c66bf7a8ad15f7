//! Append-only CSV log of raw readings.
//!
//! The header is written once, when the file is created (or found empty).
//! Rows are only ever appended and flushed individually so external readers
//! can tail the file while the monitor runs.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DataLogError;
use crate::types::Reading;

/// Column order of the raw log.
pub const RAW_HEADER: [&str; 8] = [
    "timestamp",
    "accel_x",
    "accel_y",
    "accel_z",
    "gyro_x",
    "gyro_y",
    "gyro_z",
    "temperature",
];

/// Destination for every accepted reading.
pub trait ReadingSink {
    fn record(&mut self, reading: &Reading) -> Result<(), DataLogError>;
}

/// In-memory sink.
impl ReadingSink for Vec<Reading> {
    fn record(&mut self, reading: &Reading) -> Result<(), DataLogError> {
        self.push(*reading);
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct RawRow {
    #[serde(deserialize_with = "csv::invalid_option")]
    timestamp: Option<String>,
    #[serde(deserialize_with = "csv::invalid_option")]
    accel_x: Option<f64>,
    #[serde(deserialize_with = "csv::invalid_option")]
    accel_y: Option<f64>,
    #[serde(deserialize_with = "csv::invalid_option")]
    accel_z: Option<f64>,
    #[serde(deserialize_with = "csv::invalid_option")]
    gyro_x: Option<f64>,
    #[serde(deserialize_with = "csv::invalid_option")]
    gyro_y: Option<f64>,
    #[serde(deserialize_with = "csv::invalid_option")]
    gyro_z: Option<f64>,
    #[serde(deserialize_with = "csv::invalid_option")]
    temperature: Option<f64>,
}

impl From<&Reading> for RawRow {
    fn from(r: &Reading) -> Self {
        Self {
            timestamp: Some(r.timestamp.to_rfc3339()),
            accel_x: Some(r.accel_x),
            accel_y: Some(r.accel_y),
            accel_z: Some(r.accel_z),
            gyro_x: Some(r.gyro_x),
            gyro_y: Some(r.gyro_y),
            gyro_z: Some(r.gyro_z),
            temperature: Some(r.temperature),
        }
    }
}

impl RawRow {
    fn into_reading(self) -> Option<Reading> {
        let reading = Reading {
            timestamp: parse_timestamp(self.timestamp.as_deref()?)?,
            accel_x: self.accel_x?,
            accel_y: self.accel_y?,
            accel_z: self.accel_z?,
            gyro_x: self.gyro_x?,
            gyro_y: self.gyro_y?,
            gyro_z: self.gyro_z?,
            temperature: self.temperature?,
        };
        reading.validate().ok().map(|()| reading)
    }
}

/// RFC 3339, or a naive ISO 8601 timestamp taken as UTC.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .map(|n| n.and_utc())
}

pub struct CsvDataLog {
    writer: csv::Writer<std::fs::File>,
    path: PathBuf,
    rows: u64,
}

impl std::fmt::Debug for CsvDataLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CsvDataLog")
            .field("path", &self.path)
            .field("rows", &self.rows)
            .finish()
    }
}

impl CsvDataLog {
    pub fn open(path: &Path) -> Result<Self, DataLogError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let is_new = file.metadata()?.len() == 0;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        if is_new {
            writer.write_record(RAW_HEADER)?;
            writer.flush()?;
            tracing::info!(path = %path.display(), "raw data log created");
        } else {
            tracing::info!(path = %path.display(), "appending to existing raw data log");
        }
        Ok(Self {
            writer,
            path: path.to_path_buf(),
            rows: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rows appended by this handle.
    pub fn rows(&self) -> u64 {
        self.rows
    }
}

impl ReadingSink for CsvDataLog {
    fn record(&mut self, reading: &Reading) -> Result<(), DataLogError> {
        self.writer.serialize(RawRow::from(reading))?;
        self.writer.flush()?;
        self.rows += 1;
        Ok(())
    }
}

/// Readings parsed from a raw log, plus the number of unusable rows skipped.
#[derive(Debug, Default)]
pub struct RawLoad {
    pub readings: Vec<Reading>,
    pub dropped: usize,
}

/// Read a raw log written by `CsvDataLog`. Rows with missing or unparseable
/// values are dropped and counted.
pub fn read_raw_csv(path: &Path) -> Result<RawLoad, DataLogError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;
    let mut out = RawLoad::default();
    for rec in rdr.deserialize::<RawRow>() {
        match rec.ok().and_then(RawRow::into_reading) {
            Some(r) => out.readings.push(r),
            None => out.dropped += 1,
        }
    }
    if out.dropped > 0 {
        tracing::warn!(dropped = out.dropped, path = %path.display(), "dropped rows with missing values");
    }
    Ok(out)
}
