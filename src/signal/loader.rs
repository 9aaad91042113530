//! CSV loading for recorded current traces.
//!
//! A trace file has a header row and at least one numeric column holding
//! current samples. The sampling interval either comes from a configured
//! constant or is derived from a timestamp column, which must then be
//! uniformly spaced within a relative tolerance.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use tracing::{debug, info, warn};

use super::stats::median;
use super::Signal;
use crate::error::LoadError;

/// Default relative tolerance for timestamp step deviation
pub const DEFAULT_TIMESTAMP_TOLERANCE: f64 = 0.01;

/// How the current column is chosen from the header
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ColumnSelector {
    /// Column with this header name (or a zero-based index given as text)
    Name(String),
    /// Second column when the file has two or more, otherwise the first
    #[default]
    Auto,
}

/// Options for [`load_csv`]
#[derive(Debug, Clone)]
pub struct LoadOptions {
    pub column: ColumnSelector,
    /// Timestamp column used to derive the sampling interval
    pub time_column: Option<String>,
    /// Fixed sampling interval in seconds, used when no time column is set
    pub sampling_interval: Option<f64>,
    /// Maximum relative deviation of a timestamp step from the median step
    pub timestamp_tolerance: f64,
    /// Appliance label; defaults to the title-cased file stem
    pub label: Option<String>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            column: ColumnSelector::Auto,
            time_column: None,
            sampling_interval: None,
            timestamp_tolerance: DEFAULT_TIMESTAMP_TOLERANCE,
            label: None,
        }
    }
}

impl LoadOptions {
    pub fn with_column(mut self, name: impl Into<String>) -> Self {
        self.column = ColumnSelector::Name(name.into());
        self
    }

    pub fn with_time_column(mut self, name: impl Into<String>) -> Self {
        self.time_column = Some(name.into());
        self
    }

    pub fn with_sampling_interval(mut self, interval: f64) -> Self {
        self.sampling_interval = Some(interval);
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// Load a current trace from a CSV file
///
/// Rows whose current value (or timestamp, when a time column is used) does
/// not parse as a finite number are dropped.
///
/// # Errors
/// - `Io` if the file cannot be opened
/// - `MissingColumn` if a named column is absent
/// - `NonNumericColumn` if no row of the current column is numeric
/// - `EmptyData` if zero usable rows remain
/// - `NonUniformTimestamps` / `Format` for irregular or missing timing
pub fn load_csv(path: &Path, options: &LoadOptions) -> Result<Signal, LoadError> {
    let file = File::open(path).map_err(|err| LoadError::Io {
        path: path.display().to_string(),
        reason: err.to_string(),
    })?;
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(BufReader::new(file));

    let headers = reader.headers()?.clone();
    if headers.is_empty() {
        return Err(LoadError::Format {
            reason: format!("{} has no header row", path.display()),
        });
    }

    let value_idx = resolve_column(&headers, &options.column)?;
    let time_idx = match &options.time_column {
        Some(name) => Some(resolve_column(&headers, &ColumnSelector::Name(name.clone()))?),
        None => None,
    };
    let column_name = headers.get(value_idx).unwrap_or_default().to_string();

    let mut values = Vec::new();
    let mut times = Vec::new();
    let mut total_rows = 0usize;
    let mut numeric_rows = 0usize;

    for record in reader.records() {
        let record = record?;
        total_rows += 1;

        let value = match record.get(value_idx).map(str::parse::<f64>) {
            Some(Ok(v)) => {
                numeric_rows += 1;
                v
            }
            _ => continue,
        };
        if !value.is_finite() {
            continue;
        }

        if let Some(idx) = time_idx {
            match record.get(idx).map(str::parse::<f64>) {
                Some(Ok(t)) if t.is_finite() => times.push(t),
                _ => continue,
            }
        }
        values.push(value);
    }

    if total_rows > 0 && numeric_rows == 0 {
        return Err(LoadError::NonNumericColumn {
            column: column_name,
        });
    }
    if values.is_empty() {
        return Err(LoadError::EmptyData {
            reason: format!(
                "{} has no usable rows in column '{}' ({} rows read)",
                path.display(),
                column_name,
                total_rows
            ),
        });
    }

    let dropped = total_rows - values.len();
    if dropped > 0 {
        warn!(
            "[Loader] Dropped {} invalid rows from {}",
            dropped,
            path.display()
        );
    }

    let (sampling_interval, start_time) = if time_idx.is_some() {
        let interval = derive_interval(&times, options.timestamp_tolerance)?;
        if let Some(configured) = options.sampling_interval {
            if (configured - interval).abs() > options.timestamp_tolerance * interval {
                warn!(
                    "[Loader] Configured interval {} differs from timestamp step {}; using timestamps",
                    configured, interval
                );
            }
        }
        (interval, times[0])
    } else {
        let interval = options.sampling_interval.ok_or_else(|| LoadError::Format {
            reason: "no time column and no sampling interval configured".to_string(),
        })?;
        (interval, 0.0)
    };

    let label = options
        .label
        .clone()
        .unwrap_or_else(|| label_from_path(path));

    info!(
        "[Loader] Loaded '{}' from {}: {} samples, dt={}s",
        label,
        path.display(),
        values.len(),
        sampling_interval
    );

    Ok(Signal::new(values, sampling_interval, label)?.with_start_time(start_time))
}

fn resolve_column(headers: &csv::StringRecord, selector: &ColumnSelector) -> Result<usize, LoadError> {
    match selector {
        ColumnSelector::Auto => Ok(if headers.len() >= 2 { 1 } else { 0 }),
        ColumnSelector::Name(name) => headers
            .iter()
            .position(|h| h == name)
            .or_else(|| name.parse::<usize>().ok().filter(|&i| i < headers.len()))
            .ok_or_else(|| LoadError::MissingColumn {
                column: name.clone(),
                available: headers.iter().collect::<Vec<_>>().join(", "),
            }),
    }
}

/// Median timestamp step, after checking the steps are uniform
fn derive_interval(times: &[f64], tolerance: f64) -> Result<f64, LoadError> {
    if times.len() < 2 {
        return Err(LoadError::Format {
            reason: "at least two timestamps are required to derive the sampling interval"
                .to_string(),
        });
    }

    let steps: Vec<f64> = times.windows(2).map(|w| w[1] - w[0]).collect();
    if steps.iter().any(|&step| step <= 0.0) {
        return Err(LoadError::Format {
            reason: "timestamps must be strictly increasing".to_string(),
        });
    }

    let step = median(&steps);
    let deviation = steps
        .iter()
        .map(|s| (s - step).abs())
        .fold(0.0_f64, f64::max);
    let allowed = tolerance * step;
    if deviation > allowed {
        return Err(LoadError::NonUniformTimestamps {
            deviation,
            tolerance: allowed,
        });
    }

    debug!(
        "[Loader] Derived sampling interval {} from {} timestamps",
        step,
        times.len()
    );
    Ok(step)
}

/// Appliance label from a file name: `washing_machine.csv` -> `Washing Machine`
pub fn label_from_path(path: &Path) -> String {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();

    stem.split(|c: char| c == '_' || c.is_whitespace())
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Write a signal as a `time,current` CSV
pub fn save_csv(signal: &Signal, path: &Path) -> Result<(), LoadError> {
    let mut writer = csv::Writer::from_path(path).map_err(|err| LoadError::Io {
        path: path.display().to_string(),
        reason: err.to_string(),
    })?;

    writer.write_record(["time", "current"])?;
    for (t, v) in signal.time_axis().iter().zip(signal.samples()) {
        writer.write_record([t.to_string(), v.to_string()])?;
    }
    writer.flush().map_err(|err| LoadError::Io {
        path: path.display().to_string(),
        reason: err.to_string(),
    })?;
    Ok(())
}
