//! Serializable analysis reports
//!
//! Reports flatten the numeric fields of an analysis into plain vectors
//! (row per scale) together with the axes a renderer needs: time axis,
//! pseudo-frequencies, and the cone of influence. They round-trip through
//! pretty-printed JSON.

use std::fs;
use std::path::Path;

use ndarray::Array2;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::info;

use crate::config::AnalysisConfig;
use crate::cross::SimilarityReport;
use crate::error::LoadError;
use crate::pipeline::{ApplianceAnalysis, ComparisonAnalysis};
use crate::signal::NormalizationMethod;

/// Single-appliance scalogram report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplianceReport {
    pub label: String,
    /// `None` when the samples were left unscaled
    pub normalization: Option<NormalizationMethod>,
    pub sampling_interval: f64,
    /// Normalized samples the transform was computed on
    pub samples: Vec<f64>,
    pub time: Vec<f64>,
    pub scales: Vec<f64>,
    pub frequencies: Vec<f64>,
    /// Edge boundary time (seconds) per scale
    pub coi: Vec<f64>,
    /// Largest unaffected Fourier period per time index
    pub coi_curve: Vec<f64>,
    /// Scalogram power, one row per scale
    pub power: Vec<Vec<f64>>,
    pub power_variance: Option<f64>,
    pub global_spectrum: Vec<Option<f64>>,
    pub dominant_frequencies: Vec<Option<f64>>,
}

impl ApplianceReport {
    pub fn from_analysis(analysis: &ApplianceAnalysis) -> Self {
        let transform = &analysis.transform;
        let scalogram = &analysis.scalogram;
        Self {
            label: analysis.signal.label().to_string(),
            normalization: analysis.normalization,
            sampling_interval: analysis.signal.sampling_interval(),
            samples: analysis.signal.samples().to_vec(),
            time: transform.time_axis(),
            scales: transform.scales().values().to_vec(),
            frequencies: transform.frequencies().to_vec(),
            coi: transform.coi().to_vec(),
            coi_curve: transform.coi_curve(),
            power: rows(scalogram.power()),
            power_variance: scalogram.variance(),
            global_spectrum: scalogram.global_spectrum(),
            dominant_frequencies: scalogram.dominant_frequencies(true),
        }
    }
}

/// Two-appliance cross wavelet report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonReport {
    pub label_a: String,
    pub label_b: String,
    pub sampling_interval: f64,
    pub time: Vec<f64>,
    pub scales: Vec<f64>,
    pub frequencies: Vec<f64>,
    pub coi: Vec<f64>,
    /// |W_ab|, one row per scale
    pub cross_power: Vec<Vec<f64>>,
    /// arg(W_ab), positive when A leads B
    pub phase: Vec<Vec<f64>>,
    pub mean_phase_by_scale: Vec<Option<f64>>,
    pub similarity: SimilarityReport,
    pub coherence: Option<Vec<Vec<f64>>>,
    pub mean_coherence: Option<f64>,
    pub similarity_threshold: Option<f64>,
    pub passed: Option<bool>,
}

impl ComparisonReport {
    pub fn from_analysis(comparison: &ComparisonAnalysis, config: &AnalysisConfig) -> Self {
        let cross = &comparison.cross;
        let (label_a, label_b) = cross.labels();
        Self {
            label_a: label_a.to_string(),
            label_b: label_b.to_string(),
            sampling_interval: cross.sampling_interval(),
            time: cross.time_axis(),
            scales: cross.scales().values().to_vec(),
            frequencies: cross.frequencies().to_vec(),
            coi: cross.coi().to_vec(),
            cross_power: rows(&cross.power()),
            phase: rows(&cross.phase()),
            mean_phase_by_scale: cross.mean_phase_by_scale(),
            similarity: comparison.similarity,
            coherence: comparison.coherence.as_ref().map(|c| rows(c.coherence())),
            mean_coherence: comparison
                .coherence
                .as_ref()
                .and_then(|c| c.mean_coherence()),
            similarity_threshold: config.cross.similarity_threshold,
            passed: comparison.passes(config),
        }
    }
}

fn rows(field: &Array2<f64>) -> Vec<Vec<f64>> {
    field.outer_iter().map(|row| row.to_vec()).collect()
}

/// Write a report as pretty JSON
pub fn save_report<T: Serialize>(path: &Path, report: &T) -> Result<(), LoadError> {
    let json = serde_json::to_string_pretty(report).map_err(|err| LoadError::Format {
        reason: err.to_string(),
    })?;
    fs::write(path, json).map_err(|err| LoadError::Io {
        path: path.display().to_string(),
        reason: err.to_string(),
    })?;
    info!("[Report] Saved {}", path.display());
    Ok(())
}

/// Read a report previously written by [`save_report`]
pub fn load_report<T: DeserializeOwned>(path: &Path) -> Result<T, LoadError> {
    let contents = fs::read_to_string(path).map_err(|err| LoadError::Io {
        path: path.display().to_string(),
        reason: err.to_string(),
    })?;
    serde_json::from_str(&contents).map_err(|err| LoadError::Format {
        reason: format!("{}: {}", path.display(), err),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScaleConfig;
    use crate::pipeline::{analyze_signal, compare_signals};
    use crate::signal::synthetic::{generate, SyntheticSpec};
    use crate::wavelet::ScaleSpacing;
    use tempfile::tempdir;

    fn config() -> AnalysisConfig {
        let mut config = AnalysisConfig::default();
        config.scales = ScaleConfig::Frequency {
            min_hz: 20.0,
            max_hz: 200.0,
            count: 12,
            spacing: ScaleSpacing::Logarithmic,
        };
        config
    }

    #[test]
    fn test_appliance_report_shapes_and_roundtrip() {
        let signal = generate(&SyntheticSpec::sine(50.0, 1.0), 0.001, 500, "Fan").unwrap();
        let analysis = analyze_signal(signal, &config()).unwrap();
        let report = ApplianceReport::from_analysis(&analysis);

        assert_eq!(report.power.len(), 12);
        assert!(report.power.iter().all(|row| row.len() == 500));
        assert_eq!(report.time.len(), 500);
        assert_eq!(report.coi.len(), 12);

        let dir = tempdir().unwrap();
        let path = dir.path().join("fan.json");
        save_report(&path, &report).unwrap();
        let loaded: ApplianceReport = load_report(&path).unwrap();
        assert_eq!(loaded.label, "Fan");
        assert_eq!(loaded.normalization, Some(NormalizationMethod::ZScore));
        assert_eq!(loaded.power.len(), report.power.len());
        for (a, b) in loaded.frequencies.iter().zip(&report.frequencies) {
            assert!((a - b).abs() <= 1e-12 * b.abs());
        }
    }

    #[test]
    fn test_comparison_report_carries_similarity() {
        let a = generate(&SyntheticSpec::sine(50.0, 1.0), 0.001, 500, "a").unwrap();
        let b = generate(&SyntheticSpec::sine(50.0, 1.0).with_phase(0.5), 0.001, 500, "b").unwrap();
        let mut config = config();
        config.sampling.sampling_interval = Some(0.001);
        config.cross.similarity_threshold = Some(0.5);

        let comparison = compare_signals(&a, &b, &config).unwrap();
        let report = ComparisonReport::from_analysis(&comparison, &config);
        assert_eq!(report.label_a, "a");
        assert_eq!(report.label_b, "b");
        assert_eq!(report.phase.len(), 12);
        assert_eq!(report.similarity, comparison.similarity);
        assert!(report.coherence.is_none());
        assert_eq!(report.passed, Some(true));

        let json = serde_json::to_value(&report).unwrap();
        assert!(json["similarity"]["normalized_similarity"].as_f64().unwrap() > 0.5);
    }

    #[test]
    fn test_load_report_rejects_malformed_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "[1, 2").unwrap();
        assert!(matches!(
            load_report::<ApplianceReport>(&path),
            Err(LoadError::Format { .. })
        ));
    }
}
