//! Configuration for appliance signature analysis
//!
//! Every pipeline call takes an explicit [`AnalysisConfig`]. The config can
//! be loaded from a JSON file so that scale ranges, normalization, and
//! preprocessing can be tuned without recompilation. Missing sections fall
//! back to their defaults.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{ConfigError, TransformError};
use crate::signal::{ColumnSelector, LoadOptions, NormalizationMethod};
use crate::wavelet::{ScaleSet, ScaleSpacing, WaveletKind, DEFAULT_OMEGA0};

/// Complete analysis configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub sampling: SamplingConfig,
    pub wavelet: WaveletConfig,
    pub scales: ScaleConfig,
    pub preprocessing: PreprocessingConfig,
    pub segmentation: SegmentationConfig,
    pub windowing: WindowingConfig,
    pub cross: CrossConfig,
    pub limits: LimitsConfig,
    pub files: FilePatterns,
}

/// How samples and timing are read from input files
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    /// Fixed sampling interval in seconds (ignored when `time_column` is set)
    pub sampling_interval: Option<f64>,
    /// Timestamp column to derive the interval from
    pub time_column: Option<String>,
    /// Current column; `None` picks the second column
    pub current_column: Option<String>,
    /// Relative tolerance on timestamp step deviation
    pub timestamp_tolerance: f64,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            sampling_interval: Some(0.1),
            time_column: None,
            current_column: None,
            timestamp_tolerance: 0.01,
        }
    }
}

/// Mother wavelet choice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveletConfig {
    pub kind: WaveletKind,
    /// Morlet nondimensional frequency
    pub omega0: f64,
}

impl Default for WaveletConfig {
    fn default() -> Self {
        Self {
            kind: WaveletKind::Morlet,
            omega0: DEFAULT_OMEGA0,
        }
    }
}

/// Scale range the transform is evaluated over
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum ScaleConfig {
    /// Pseudo-frequency band in Hz
    Frequency {
        min_hz: f64,
        max_hz: f64,
        count: usize,
        #[serde(default)]
        spacing: ScaleSpacing,
    },
    /// Scale band in samples
    Scale {
        min: f64,
        max: f64,
        count: usize,
        #[serde(default)]
        spacing: ScaleSpacing,
    },
    /// s_j = s0 · 2^(j·dj), j = 0..=octaves/dj
    Octaves { s0: f64, dj: f64, octaves: f64 },
}

impl Default for ScaleConfig {
    fn default() -> Self {
        ScaleConfig::Octaves {
            s0: 2.0,
            dj: 0.125,
            octaves: 7.0,
        }
    }
}

impl ScaleConfig {
    /// Build the scale set for signals sampled at `sampling_interval`
    pub fn build(
        &self,
        sampling_interval: f64,
        wavelet: WaveletKind,
        omega0: f64,
    ) -> Result<ScaleSet, TransformError> {
        match *self {
            ScaleConfig::Frequency {
                min_hz,
                max_hz,
                count,
                spacing,
            } => {
                let wavelet = wavelet.instantiate(omega0)?;
                ScaleSet::from_frequency_range(
                    min_hz,
                    max_hz,
                    count,
                    spacing,
                    sampling_interval,
                    wavelet.as_ref(),
                )
            }
            ScaleConfig::Scale {
                min,
                max,
                count,
                spacing,
            } => ScaleSet::with_spacing(min, max, count, spacing),
            ScaleConfig::Octaves { s0, dj, octaves } => ScaleSet::octaves(s0, dj, octaves),
        }
    }
}

/// Cleaning and normalization applied after loading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessingConfig {
    /// Scale amplitudes with `normalization`; when off, only DC removal applies
    pub normalize_signal: bool,
    pub normalization: NormalizationMethod,
    /// Subtract the mean when `normalize_signal` is off
    pub remove_dc_component: bool,
    /// Replace samples whose |z-score| reaches `outlier_threshold`
    pub remove_outliers: bool,
    pub outlier_threshold: f64,
}

impl Default for PreprocessingConfig {
    fn default() -> Self {
        Self {
            normalize_signal: true,
            normalization: NormalizationMethod::ZScore,
            remove_dc_component: true,
            remove_outliers: false,
            outlier_threshold: 3.0,
        }
    }
}

impl PreprocessingConfig {
    pub fn outlier_threshold(&self) -> Option<f64> {
        self.remove_outliers.then_some(self.outlier_threshold)
    }

    /// Normalization applied by the pipeline, if any
    pub fn normalization_method(&self) -> Option<NormalizationMethod> {
        self.normalize_signal.then_some(self.normalization)
    }
}

/// Optional time bounds (seconds) cut from each signal before analysis
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentationConfig {
    pub start: Option<f64>,
    pub end: Option<f64>,
}

/// Fixed-length windows for per-window analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowingConfig {
    /// Window length in samples
    pub segment_length: usize,
    /// Fractional overlap in [0, 1)
    pub overlap: f64,
}

impl Default for WindowingConfig {
    fn default() -> Self {
        Self {
            segment_length: 1000,
            overlap: 0.5,
        }
    }
}

/// Cross-transform options
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrossConfig {
    /// Also compute smoothed wavelet coherence
    pub coherence: bool,
    /// Minimum normalized similarity for a comparison to pass
    pub similarity_threshold: Option<f64>,
}

/// Input sanity limits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Minimum samples after preprocessing
    pub min_signal_length: usize,
    pub max_file_size_mb: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            min_signal_length: 100,
            max_file_size_mb: 100,
        }
    }
}

/// Filename patterns for batch discovery (`*` matches any run of characters)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilePatterns {
    pub include: Vec<String>,
    pub exclude: Vec<String>,
}

impl Default for FilePatterns {
    fn default() -> Self {
        Self {
            include: vec!["*.csv".to_string()],
            exclude: vec!["*_processed.csv".to_string()],
        }
    }
}

impl FilePatterns {
    /// Whether a file name is included and not excluded
    pub fn matches(&self, file_name: &str) -> bool {
        self.include.iter().any(|p| wildcard_match(p, file_name))
            && !self.exclude.iter().any(|p| wildcard_match(p, file_name))
    }
}

fn wildcard_match(pattern: &str, name: &str) -> bool {
    let parts: Vec<&str> = pattern.split('*').collect();
    if parts.len() == 1 {
        return pattern == name;
    }

    let (first, rest) = (parts[0], &parts[1..]);
    let Some(mut remaining) = name.strip_prefix(first) else {
        return false;
    };
    let (last, middle) = match rest.split_last() {
        Some(split) => split,
        None => return true,
    };
    for part in middle {
        match remaining.find(part) {
            Some(pos) => remaining = &remaining[pos + part.len()..],
            None => return false,
        }
    }
    remaining.len() >= last.len() && remaining.ends_with(last)
}

impl AnalysisConfig {
    /// Check every field for values the pipeline cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(dt) = self.sampling.sampling_interval {
            if !dt.is_finite() || dt <= 0.0 {
                return Err(ConfigError::invalid(
                    "sampling.sampling_interval",
                    format!("must be finite and > 0 (got {})", dt),
                ));
            }
        }
        if self.sampling.sampling_interval.is_none() && self.sampling.time_column.is_none() {
            return Err(ConfigError::invalid(
                "sampling",
                "either sampling_interval or time_column must be set",
            ));
        }
        let tol = self.sampling.timestamp_tolerance;
        if !tol.is_finite() || tol < 0.0 {
            return Err(ConfigError::invalid(
                "sampling.timestamp_tolerance",
                format!("must be finite and >= 0 (got {})", tol),
            ));
        }

        let omega0 = self.wavelet.omega0;
        if !omega0.is_finite() || omega0 <= 0.0 {
            return Err(ConfigError::invalid(
                "wavelet.omega0",
                format!("must be finite and > 0 (got {})", omega0),
            ));
        }

        // Interval only matters for the frequency mode; any positive value
        // exercises the scale checks
        let check_dt = self.sampling.sampling_interval.unwrap_or(1.0);
        self.scales
            .build(check_dt, self.wavelet.kind, omega0)
            .map_err(|err| ConfigError::invalid("scales", err.to_string()))?;

        let threshold = self.preprocessing.outlier_threshold;
        if !threshold.is_finite() || threshold <= 0.0 {
            return Err(ConfigError::invalid(
                "preprocessing.outlier_threshold",
                format!("must be finite and > 0 (got {})", threshold),
            ));
        }

        if let (Some(start), Some(end)) = (self.segmentation.start, self.segmentation.end) {
            if start >= end {
                return Err(ConfigError::invalid(
                    "segmentation",
                    format!("start {} must be before end {}", start, end),
                ));
            }
        }

        if self.windowing.segment_length == 0 {
            return Err(ConfigError::invalid(
                "windowing.segment_length",
                "must be at least 1",
            ));
        }
        if !(0.0..1.0).contains(&self.windowing.overlap) {
            return Err(ConfigError::invalid(
                "windowing.overlap",
                format!("must lie in [0, 1) (got {})", self.windowing.overlap),
            ));
        }

        if let Some(threshold) = self.cross.similarity_threshold {
            if !(0.0..=1.0).contains(&threshold) {
                return Err(ConfigError::invalid(
                    "cross.similarity_threshold",
                    format!("must lie in [0, 1] (got {})", threshold),
                ));
            }
        }

        if self.limits.max_file_size_mb == 0 {
            return Err(ConfigError::invalid("limits.max_file_size_mb", "must be > 0"));
        }
        if self.files.include.is_empty() {
            return Err(ConfigError::invalid("files.include", "needs at least one pattern"));
        }
        Ok(())
    }

    /// Load and validate configuration from a JSON file
    ///
    /// # Errors
    /// - `Io` if the file cannot be read
    /// - `Parse` if the JSON does not match the schema
    /// - `InvalidField` if validation fails
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|err| ConfigError::Io {
            path: path.display().to_string(),
            reason: err.to_string(),
        })?;
        let config: Self = serde_json::from_str(&contents).map_err(|err| ConfigError::Parse {
            reason: err.to_string(),
        })?;
        config.validate()?;
        log::info!("[Config] Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Load configuration, falling back to defaults on any failure
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match Self::load_from_file(&path) {
            Ok(config) => config,
            Err(err) => {
                log::warn!(
                    "[Config] Failed to load {:?}: {}. Using defaults.",
                    path.as_ref(),
                    err
                );
                Self::default()
            }
        }
    }

    /// Loader options for a single input file
    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            column: match &self.sampling.current_column {
                Some(name) => ColumnSelector::Name(name.clone()),
                None => ColumnSelector::Auto,
            },
            time_column: self.sampling.time_column.clone(),
            sampling_interval: self.sampling.sampling_interval,
            timestamp_tolerance: self.sampling.timestamp_tolerance,
            label: None,
        }
    }

    /// Scale set for a signal with the given sampling interval
    pub fn scale_set(&self, sampling_interval: f64) -> Result<ScaleSet, TransformError> {
        self.scales
            .build(sampling_interval, self.wavelet.kind, self.wavelet.omega0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = AnalysisConfig::default();
        assert_eq!(config.sampling.sampling_interval, Some(0.1));
        assert_eq!(config.wavelet.omega0, 6.0);
        assert_eq!(config.preprocessing.normalization, NormalizationMethod::ZScore);
        assert_eq!(config.preprocessing.outlier_threshold, 3.0);
        assert!(config.preprocessing.normalize_signal);
        assert!(config.preprocessing.remove_dc_component);
        assert_eq!(
            config.preprocessing.normalization_method(),
            Some(NormalizationMethod::ZScore)
        );
        assert_eq!(config.windowing.segment_length, 1000);
        assert_eq!(config.windowing.overlap, 0.5);
        assert_eq!(config.limits.min_signal_length, 100);
        assert_eq!(config.limits.max_file_size_mb, 100);
        assert!(config.validate().is_ok());

        let scales = config.scale_set(0.1).unwrap();
        assert_eq!(scales.len(), 57);
    }

    #[test]
    fn test_json_roundtrip() {
        let mut config = AnalysisConfig::default();
        config.scales = ScaleConfig::Frequency {
            min_hz: 10.0,
            max_hz: 200.0,
            count: 32,
            spacing: ScaleSpacing::Linear,
        };
        config.cross.similarity_threshold = Some(0.8);
        let json = serde_json::to_string_pretty(&config).unwrap();
        let parsed: AnalysisConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let json = r#"{
            "sampling": { "sampling_interval": 0.001 },
            "scales": { "mode": "frequency", "min_hz": 10, "max_hz": 200, "count": 16 }
        }"#;
        let config: AnalysisConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.sampling.sampling_interval, Some(0.001));
        assert_eq!(config.sampling.timestamp_tolerance, 0.01);
        assert_eq!(config.windowing, WindowingConfig::default());
        let scales = config.scale_set(0.001).unwrap();
        assert_eq!(scales.len(), 16);
    }

    #[test]
    fn test_validation_failures() {
        let mut config = AnalysisConfig::default();
        config.windowing.overlap = 1.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidField { ref field, .. }) if field == "windowing.overlap"
        ));

        let mut config = AnalysisConfig::default();
        config.wavelet.omega0 = -1.0;
        assert!(config.validate().is_err());

        let mut config = AnalysisConfig::default();
        config.sampling.sampling_interval = None;
        assert!(config.validate().is_err());
        config.sampling.time_column = Some("time".to_string());
        assert!(config.validate().is_ok());

        let mut config = AnalysisConfig::default();
        config.scales = ScaleConfig::Scale {
            min: 10.0,
            max: 5.0,
            count: 4,
            spacing: ScaleSpacing::Linear,
        };
        assert!(config.validate().is_err());

        let mut config = AnalysisConfig::default();
        config.segmentation = SegmentationConfig {
            start: Some(2.0),
            end: Some(1.0),
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file_errors() {
        let missing = AnalysisConfig::load_from_file("/nonexistent/config.json").unwrap_err();
        assert_eq!(missing.code(), crate::error::ConfigErrorCodes::IO);

        let file = NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "{ not json").unwrap();
        let parse = AnalysisConfig::load_from_file(file.path()).unwrap_err();
        assert!(matches!(parse, ConfigError::Parse { .. }));

        let fallback = AnalysisConfig::load_or_default(file.path());
        assert_eq!(fallback, AnalysisConfig::default());
    }

    #[test]
    fn test_file_patterns() {
        let patterns = FilePatterns::default();
        assert!(patterns.matches("washing_machine.csv"));
        assert!(!patterns.matches("washing_machine_processed.csv"));
        assert!(!patterns.matches("notes.txt"));
        assert!(wildcard_match("a*b*c", "axxbyyc"));
        assert!(!wildcard_match("a*bc", "abc_"));
        assert!(wildcard_match("exact.csv", "exact.csv"));
    }
}
