// Pipeline - end-to-end analysis of appliance current traces
//
// Stages per input: load -> segment -> clean -> normalize (or DC removal)
// -> length check -> CWT -> scalogram. Cleaning keeps every sample at its
// original time, so segment bounds and written time columns stay true. Comparisons run both inputs through the same stages,
// align them to a common length, and add the cross transform, similarity,
// and optionally coherence.
//
// Every function here is a pure function of its inputs and the config.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::config::{AnalysisConfig, FilePatterns};
use crate::cross::{self, CoherenceResult, CrossWaveletResult, SimilarityReport};
use crate::error::{log_pipeline_error, LoadError, PipelineError, TransformError};
use crate::signal::{self, NormalizationMethod, Signal};
use crate::wavelet::{CwtEngine, Scalogram, WaveletTransformResult};

/// Relative difference below which two sampling intervals count as equal
const INTERVAL_MATCH_TOLERANCE: f64 = 1e-9;

const BYTES_PER_MB: u64 = 1024 * 1024;

/// Result of analyzing a single appliance trace
#[derive(Debug, Clone)]
pub struct ApplianceAnalysis {
    /// Preprocessed, normalized signal the transform was computed on
    pub signal: Signal,
    /// `None` when amplitude normalization was switched off
    pub normalization: Option<NormalizationMethod>,
    pub transform: WaveletTransformResult,
    pub scalogram: Scalogram,
}

/// Result of comparing two appliance traces
#[derive(Debug, Clone)]
pub struct ComparisonAnalysis {
    pub a: ApplianceAnalysis,
    pub b: ApplianceAnalysis,
    pub cross: CrossWaveletResult,
    pub similarity: SimilarityReport,
    pub coherence: Option<CoherenceResult>,
}

impl ComparisonAnalysis {
    /// Whether the similarity meets the configured threshold (`None` if unset)
    pub fn passes(&self, config: &AnalysisConfig) -> Option<bool> {
        config
            .cross
            .similarity_threshold
            .map(|threshold| self.similarity.meets(threshold))
    }
}

/// Load a trace from CSV or WAV (by extension), enforcing the file size limit
pub fn load_signal(path: &Path, config: &AnalysisConfig) -> Result<Signal, PipelineError> {
    let metadata = fs::metadata(path).map_err(|err| LoadError::Io {
        path: path.display().to_string(),
        reason: err.to_string(),
    })?;
    let limit = config.limits.max_file_size_mb * BYTES_PER_MB;
    if metadata.len() > limit {
        return Err(LoadError::Format {
            reason: format!(
                "{} is {} bytes, above the {} MB limit",
                path.display(),
                metadata.len(),
                config.limits.max_file_size_mb
            ),
        }
        .into());
    }

    let is_wav = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("wav"));
    let signal = if is_wav {
        signal::load_wav(path, None)?
    } else {
        signal::load_csv(path, &config.load_options())?
    };
    Ok(signal)
}

/// Segment, clean, and normalize a loaded signal
///
/// With `normalize_signal` off the signal is only mean-centred (when
/// `remove_dc_component` is set) or passed through unscaled.
///
/// # Errors
/// Any loader-stage error, or `InsufficientData` when fewer than
/// `limits.min_signal_length` samples remain.
pub fn prepare_signal(signal: &Signal, config: &AnalysisConfig) -> Result<Signal, PipelineError> {
    let segmented = match (config.segmentation.start, config.segmentation.end) {
        (None, None) => signal.clone(),
        (start, end) => {
            let (span_start, span_end) = signal.time_span();
            signal::segment(
                signal,
                start.unwrap_or(span_start),
                end.unwrap_or(span_end),
            )?
        }
    };

    let cleaned = signal::clean(&segmented, config.preprocessing.outlier_threshold())?;

    let preprocessing = &config.preprocessing;
    let prepared = match preprocessing.normalization_method() {
        Some(method) => signal::normalize(&cleaned, method)?.into_signal(),
        None if preprocessing.remove_dc_component => signal::remove_dc(&cleaned)?,
        None => cleaned,
    };
    debug!(
        "[Pipeline] '{}': prepared {} samples (normalization={:?}, remove_dc={})",
        prepared.label(),
        prepared.len(),
        preprocessing.normalization_method(),
        preprocessing.remove_dc_component
    );

    let required = config.limits.min_signal_length;
    if prepared.len() < required {
        return Err(TransformError::InsufficientData {
            required,
            available: prepared.len(),
        }
        .into());
    }
    Ok(prepared)
}

/// Transform an already prepared signal and build its scalogram
pub fn analyze_signal(
    signal: Signal,
    config: &AnalysisConfig,
) -> Result<ApplianceAnalysis, PipelineError> {
    let scales = config.scale_set(signal.sampling_interval())?;
    let engine = CwtEngine::new(config.wavelet.kind, config.wavelet.omega0)?;
    let transform = engine.compute(&signal, &scales)?;

    let variance = signal::stats::std_dev(signal.samples()).powi(2);
    let scalogram = Scalogram::from_transform(&transform);
    let scalogram = if variance > 0.0 {
        scalogram.normalized(variance)?
    } else {
        scalogram
    };

    Ok(ApplianceAnalysis {
        signal,
        normalization: config.preprocessing.normalization_method(),
        transform,
        scalogram,
    })
}

/// Load, preprocess, and transform one appliance trace
pub fn analyze_appliance(
    path: &Path,
    config: &AnalysisConfig,
) -> Result<ApplianceAnalysis, PipelineError> {
    info!("[Pipeline] Analyzing {}", path.display());
    let raw = load_signal(path, config)?;
    let prepared = prepare_signal(&raw, config)?;
    let analysis = analyze_signal(prepared, config)?;
    info!(
        "[Pipeline] '{}': {} scales x {} samples",
        analysis.signal.label(),
        analysis.transform.n_scales(),
        analysis.transform.n_times()
    );
    Ok(analysis)
}

/// Analyze fixed-length windows of a prepared signal
///
/// Windows follow `windowing.segment_length` / `windowing.overlap`; each keeps
/// its own start time. A signal shorter than one window yields no analyses.
pub fn analyze_windows(
    signal: &Signal,
    config: &AnalysisConfig,
) -> Result<Vec<ApplianceAnalysis>, PipelineError> {
    let windows = signal::windows(
        signal,
        config.windowing.segment_length,
        config.windowing.overlap,
    )?;
    debug!(
        "[Pipeline] '{}': {} windows of {} samples",
        signal.label(),
        windows.len(),
        config.windowing.segment_length
    );
    windows
        .into_iter()
        .map(|window| analyze_signal(window, config))
        .collect()
}

/// Compare two loaded signals
///
/// Both are prepared with the same config, truncated to the shorter length,
/// and transformed over the same scales.
///
/// # Errors
/// `ShapeMismatch` if their sampling intervals differ.
pub fn compare_signals(
    a: &Signal,
    b: &Signal,
    config: &AnalysisConfig,
) -> Result<ComparisonAnalysis, PipelineError> {
    let prepared_a = prepare_signal(a, config)?;
    let prepared_b = prepare_signal(b, config)?;

    let dt_a = prepared_a.sampling_interval();
    let dt_b = prepared_b.sampling_interval();
    if (dt_a - dt_b).abs() > INTERVAL_MATCH_TOLERANCE * dt_a {
        return Err(TransformError::ShapeMismatch {
            reason: format!(
                "'{}' is sampled every {} s but '{}' every {} s",
                prepared_a.label(),
                dt_a,
                prepared_b.label(),
                dt_b
            ),
        }
        .into());
    }
    let prepared_b = if dt_a == dt_b {
        prepared_b
    } else {
        Signal::new(prepared_b.samples().to_vec(), dt_a, prepared_b.label())?
            .with_start_time(prepared_b.start_time())
    };

    let len = prepared_a.len().min(prepared_b.len());
    if prepared_a.len() != prepared_b.len() {
        warn!(
            "[Pipeline] Length mismatch ({} vs {}); truncating both to {}",
            prepared_a.len(),
            prepared_b.len(),
            len
        );
    }

    let analysis_a = analyze_signal(prepared_a.truncated(len), config)?;
    let analysis_b = analyze_signal(prepared_b.truncated(len), config)?;

    let cross = cross::compute(&analysis_a.transform, &analysis_b.transform)?;
    let similarity = cross::similarity(&analysis_a.transform, &analysis_b.transform)?;
    let coherence = if config.cross.coherence {
        Some(cross::coherence(
            &analysis_a.transform,
            &analysis_b.transform,
        )?)
    } else {
        None
    };

    info!(
        "[Pipeline] '{}' vs '{}': similarity={:.4}, mean cross power={:.4} ({} valid cells)",
        analysis_a.signal.label(),
        analysis_b.signal.label(),
        similarity.normalized_similarity,
        similarity.mean_cross_power,
        similarity.valid_cells
    );

    Ok(ComparisonAnalysis {
        a: analysis_a,
        b: analysis_b,
        cross,
        similarity,
        coherence,
    })
}

/// Load and compare two appliance traces
pub fn compare_appliances(
    path_a: &Path,
    path_b: &Path,
    config: &AnalysisConfig,
) -> Result<ComparisonAnalysis, PipelineError> {
    info!(
        "[Pipeline] Comparing {} with {}",
        path_a.display(),
        path_b.display()
    );
    let a = load_signal(path_a, config)?;
    let b = load_signal(path_b, config)?;
    compare_signals(&a, &b, config)
}

/// Input files in `dir` matching the patterns, sorted by name
pub fn discover_inputs(dir: &Path, patterns: &FilePatterns) -> Result<Vec<PathBuf>, LoadError> {
    let entries = fs::read_dir(dir).map_err(|err| LoadError::Io {
        path: dir.display().to_string(),
        reason: err.to_string(),
    })?;

    let mut inputs: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file())
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| patterns.matches(name))
        })
        .collect();
    inputs.sort();

    debug!(
        "[Pipeline] Found {} input files in {}",
        inputs.len(),
        dir.display()
    );
    Ok(inputs)
}

/// Analyze every matching file in a directory
///
/// Failures are reported per file and do not stop the batch.
pub fn analyze_directory(
    dir: &Path,
    config: &AnalysisConfig,
) -> Result<Vec<(PathBuf, Result<ApplianceAnalysis, PipelineError>)>, PipelineError> {
    let inputs = discover_inputs(dir, &config.files)?;
    Ok(inputs
        .into_iter()
        .map(|path| {
            let result = analyze_appliance(&path, config);
            if let Err(err) = &result {
                log_pipeline_error(err, &path.display().to_string());
                warn!("[Pipeline] Skipping {}", path.display());
            }
            (path, result)
        })
        .collect())
}

/// Compare every pair of matching files in a directory
///
/// Pairs are `(inputs[i], inputs[j])` with `i < j` in discovery order.
/// Failures are reported per pair and do not stop the batch.
pub fn compare_directory(
    dir: &Path,
    config: &AnalysisConfig,
) -> Result<Vec<PairComparison>, PipelineError> {
    let inputs = discover_inputs(dir, &config.files)?;
    let mut pairs = Vec::new();
    for (i, a) in inputs.iter().enumerate() {
        for b in &inputs[i + 1..] {
            let result = compare_appliances(a, b, config);
            if let Err(err) = &result {
                log_pipeline_error(err, &format!("{} vs {}", a.display(), b.display()));
                warn!(
                    "[Pipeline] Skipping comparison {} vs {}",
                    a.display(),
                    b.display()
                );
            }
            pairs.push(PairComparison {
                a: a.clone(),
                b: b.clone(),
                result,
            });
        }
    }
    info!(
        "[Pipeline] Compared {} pairs from {} inputs",
        pairs.len(),
        inputs.len()
    );
    Ok(pairs)
}

/// Outcome of one pairwise comparison in a directory batch
#[derive(Debug)]
pub struct PairComparison {
    pub a: PathBuf,
    pub b: PathBuf,
    pub result: Result<ComparisonAnalysis, PipelineError>,
}

/// Clean and normalize a trace and write it as `<stem>_processed.csv`
pub fn preprocess_file(
    path: &Path,
    out_dir: &Path,
    config: &AnalysisConfig,
) -> Result<PathBuf, PipelineError> {
    let raw = load_signal(path, config)?;
    let prepared = prepare_signal(&raw, config)?;

    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("signal");
    fs::create_dir_all(out_dir).map_err(|err| LoadError::Io {
        path: out_dir.display().to_string(),
        reason: err.to_string(),
    })?;
    let out_path = out_dir.join(format!("{}_processed.csv", stem));
    signal::save_csv(&prepared, &out_path)?;

    info!(
        "[Pipeline] Wrote {} ({} samples)",
        out_path.display(),
        prepared.len()
    );
    Ok(out_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScaleConfig;
    use crate::error::{ErrorCode, ErrorKind};
    use crate::signal::synthetic::{generate, mains_current, SyntheticSpec};
    use crate::wavelet::ScaleSpacing;
    use tempfile::tempdir;

    fn config() -> AnalysisConfig {
        let mut config = AnalysisConfig::default();
        config.sampling.sampling_interval = Some(0.001);
        config.scales = ScaleConfig::Frequency {
            min_hz: 20.0,
            max_hz: 200.0,
            count: 24,
            spacing: ScaleSpacing::Logarithmic,
        };
        config
    }

    fn write_trace(dir: &Path, name: &str, signal: &Signal) -> PathBuf {
        let path = dir.join(name);
        signal::save_csv(signal, &path).unwrap();
        path
    }

    #[test]
    fn test_prepare_signal_enforces_min_length() {
        let signal = generate(&SyntheticSpec::sine(50.0, 1.0), 0.001, 50, "short").unwrap();
        let err = prepare_signal(&signal, &config()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientDataError);
    }

    #[test]
    fn test_prepare_signal_applies_segmentation() {
        let mut config = config();
        config.segmentation.start = Some(0.2);
        let signal = generate(&SyntheticSpec::sine(50.0, 1.0), 0.001, 1000, "tone").unwrap();
        let prepared = prepare_signal(&signal, &config).unwrap();
        assert_eq!(prepared.len(), 800);
        assert!((prepared.start_time() - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_outlier_cleaning_keeps_segment_alignment() {
        let mut config = config();
        config.preprocessing.remove_outliers = true;
        config.preprocessing.normalize_signal = false;
        config.preprocessing.remove_dc_component = false;
        config.segmentation.start = Some(0.5);
        config.segmentation.end = Some(0.6);
        config.limits.min_signal_length = 10;

        let mut samples: Vec<f64> = (0..1000).map(|i| i as f64 * 0.001 + 3.0).collect();
        samples[100] = 1.0e6;
        let signal = Signal::new(samples.clone(), 0.001, "spiky").unwrap();

        let prepared = prepare_signal(&signal, &config).unwrap();
        assert_eq!(prepared.len(), 100);
        assert!((prepared.start_time() - 0.5).abs() < 1e-12);
        assert_eq!(prepared.samples(), &samples[500..600]);
    }

    #[test]
    fn test_dc_removal_without_normalization() {
        let mut config = config();
        config.preprocessing.normalize_signal = false;
        let spec = SyntheticSpec {
            dc_offset: 5.0,
            ..SyntheticSpec::sine(50.0, 2.0)
        };
        let signal = generate(&spec, 0.001, 1000, "offset").unwrap();

        let prepared = prepare_signal(&signal, &config).unwrap();
        let mean = prepared.samples().iter().sum::<f64>() / 1000.0;
        assert!(mean.abs() < 1e-9);
        let peak = prepared.samples().iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));
        assert!((peak - 2.0).abs() < 1e-6, "amplitude changed: {}", peak);

        config.preprocessing.remove_dc_component = false;
        let untouched = prepare_signal(&signal, &config).unwrap();
        assert_eq!(untouched.samples(), signal.samples());

        let analysis = analyze_signal(prepared, &config).unwrap();
        assert_eq!(analysis.normalization, None);
    }

    #[test]
    fn test_analyze_appliance_from_csv() {
        let dir = tempdir().unwrap();
        let signal = mains_current(50.0, &[(3, 0.3)], 0.0, 0.001, 1000, "x").unwrap();
        let path = write_trace(dir.path(), "washing_machine.csv", &signal);

        let mut config = config();
        config.sampling.time_column = Some("time".to_string());
        let analysis = analyze_appliance(&path, &config).unwrap();
        assert_eq!(analysis.signal.label(), "Washing Machine");
        assert_eq!(analysis.transform.n_times(), 1000);
        let variance = analysis.scalogram.variance().unwrap();
        assert!((variance - 1.0).abs() < 1e-9);
        assert!((analysis.signal.sampling_interval() - 0.001).abs() < 1e-12);
    }

    #[test]
    fn test_compare_truncates_to_shorter_signal() {
        let a = generate(&SyntheticSpec::sine(50.0, 1.0), 0.001, 1000, "a").unwrap();
        let b = generate(&SyntheticSpec::sine(50.0, 1.0), 0.001, 900, "b").unwrap();
        let mut config = config();
        config.cross.coherence = true;
        config.cross.similarity_threshold = Some(0.9);

        let comparison = compare_signals(&a, &b, &config).unwrap();
        assert_eq!(comparison.cross.n_times(), 900);
        assert!(comparison.similarity.normalized_similarity > 0.99);
        assert!(comparison.coherence.is_some());
        assert_eq!(comparison.passes(&config), Some(true));
    }

    #[test]
    fn test_compare_rejects_interval_mismatch() {
        let a = generate(&SyntheticSpec::sine(50.0, 1.0), 0.001, 1000, "a").unwrap();
        let b = generate(&SyntheticSpec::sine(50.0, 1.0), 0.002, 1000, "b").unwrap();
        let err = compare_signals(&a, &b, &config()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ShapeMismatchError);
        assert_eq!(err.code(), crate::error::TransformErrorCodes::SHAPE_MISMATCH);
    }

    #[test]
    fn test_analyze_windows_splits_signal() {
        let mut config = config();
        config.windowing.segment_length = 400;
        config.windowing.overlap = 0.5;
        let signal = generate(&SyntheticSpec::sine(50.0, 1.0), 0.001, 1000, "tone").unwrap();
        let analyses = analyze_windows(&signal, &config).unwrap();
        // starts at 0, 200, 400, 600
        assert_eq!(analyses.len(), 4);
        assert!((analyses[1].signal.start_time() - 0.2).abs() < 1e-9);
        assert!(analyses.iter().all(|a| a.transform.n_times() == 400));
    }

    #[test]
    fn test_discover_and_preprocess() {
        let dir = tempdir().unwrap();
        let signal = generate(&SyntheticSpec::sine(50.0, 2.0), 0.001, 300, "x").unwrap();
        write_trace(dir.path(), "kettle.csv", &signal);
        write_trace(dir.path(), "fan.csv", &signal);
        write_trace(dir.path(), "fan_processed.csv", &signal);
        std::fs::write(dir.path().join("notes.txt"), "ignore me").unwrap();

        let inputs = discover_inputs(dir.path(), &FilePatterns::default()).unwrap();
        let names: Vec<_> = inputs
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["fan.csv", "kettle.csv"]);

        let out_dir = dir.path().join("out");
        let written = preprocess_file(&inputs[1], &out_dir, &config()).unwrap();
        assert_eq!(written, out_dir.join("kettle_processed.csv"));
        let reloaded = signal::load_csv(
            &written,
            &signal::LoadOptions::default()
                .with_column("current")
                .with_time_column("time"),
        )
        .unwrap();
        assert_eq!(reloaded.len(), 300);
        let mean = reloaded.samples().iter().sum::<f64>() / 300.0;
        assert!(mean.abs() < 1e-6);
    }

    #[test]
    fn test_analyze_directory_reports_failures_per_file() {
        let dir = tempdir().unwrap();
        let good = generate(&SyntheticSpec::sine(50.0, 1.0), 0.001, 1000, "x").unwrap();
        let flat = Signal::new(vec![1.0; 1000], 0.001, "flat").unwrap();
        write_trace(dir.path(), "good.csv", &good);
        write_trace(dir.path(), "flat.csv", &flat);

        let results = analyze_directory(dir.path(), &config()).unwrap();
        assert_eq!(results.len(), 2);
        let flat_result = &results[0].1;
        assert_eq!(
            flat_result.as_ref().unwrap_err().kind(),
            ErrorKind::DegenerateSignalError
        );
        assert!(results[1].1.is_ok());
    }

    #[test]
    fn test_compare_directory_runs_every_pair() {
        let dir = tempdir().unwrap();
        let fan = generate(&SyntheticSpec::sine(50.0, 1.0), 0.001, 1000, "x").unwrap();
        let drill = generate(&SyntheticSpec::sine(150.0, 1.0), 0.001, 1000, "x").unwrap();
        let flat = Signal::new(vec![1.0; 1000], 0.001, "flat").unwrap();
        write_trace(dir.path(), "fan.csv", &fan);
        write_trace(dir.path(), "drill.csv", &drill);
        write_trace(dir.path(), "flat.csv", &flat);

        let pairs = compare_directory(dir.path(), &config()).unwrap();
        let names: Vec<(String, String)> = pairs
            .iter()
            .map(|p| {
                let name = |path: &Path| path.file_name().unwrap().to_str().unwrap().to_string();
                (name(p.a.as_path()), name(p.b.as_path()))
            })
            .collect();
        assert_eq!(
            names,
            vec![
                ("drill.csv".to_string(), "fan.csv".to_string()),
                ("drill.csv".to_string(), "flat.csv".to_string()),
                ("fan.csv".to_string(), "flat.csv".to_string()),
            ]
        );

        let drill_fan = pairs[0].result.as_ref().unwrap();
        assert!(drill_fan.similarity.normalized_similarity < 0.5);
        assert_eq!(
            pairs[1].result.as_ref().unwrap_err().kind(),
            ErrorKind::DegenerateSignalError
        );
        assert!(pairs[2].result.is_err());
    }

    #[test]
    fn test_file_size_limit() {
        let dir = tempdir().unwrap();
        let signal = generate(&SyntheticSpec::sine(50.0, 1.0), 0.001, 200, "x").unwrap();
        let path = write_trace(dir.path(), "big.csv", &signal);
        let mut config = config();
        config.limits.max_file_size_mb = 0;
        let err = load_signal(&path, &config).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FormatError);
    }
}
