use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::Deserialize;

use crate::heating::LogRecord;
use crate::port::DataLogger;

const HEADER: [&str; 5] = ["timestamp", "spot_price", "outdoor_temp", "heat_source", "heating_capacity_kW"];

#[derive(Debug, Clone, Deserialize)]
pub struct CsvDataLoggerConfig {
    #[serde(default = "default_path")]
    pub path: PathBuf,
}

fn default_path() -> PathBuf {
    PathBuf::from("heating_data_log.csv")
}

impl Default for CsvDataLoggerConfig {
    fn default() -> Self {
        Self { path: default_path() }
    }
}

impl CsvDataLoggerConfig {
    pub fn new_logger(&self) -> CsvDataLogger {
        CsvDataLogger {
            path: self.path.clone(),
        }
    }
}

/// Append-only CSV record of every completed cycle. The header is written when the file is
/// created, rows are appended in cycle order.
#[derive(Debug, Clone)]
pub struct CsvDataLogger {
    path: PathBuf,
}

impl DataLogger for CsvDataLogger {
    async fn append(&self, record: &LogRecord) -> anyhow::Result<()> {
        let path = self.path.clone();
        let row = to_row(record);

        tokio::task::spawn_blocking(move || append_row(&path, &row))
            .await
            .context("CSV writer task failed")?
    }
}

fn to_row(record: &LogRecord) -> [String; 5] {
    [
        record.timestamp.to_iso_string(),
        record.spot_price.0.to_string(),
        record.outdoor_temperature.0.to_string(),
        record.source.to_string(),
        record.capacity.0.to_string(),
    ]
}

fn append_row(path: &Path, row: &[String; 5]) -> anyhow::Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Error opening data log {}", path.display()))?;

    let is_new = file.metadata()?.len() == 0;

    let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);

    if is_new {
        writer.write_record(HEADER)?;
    }

    writer.write_record(row)?;
    writer
        .flush()
        .with_context(|| format!("Error writing data log {}", path.display()))
}
