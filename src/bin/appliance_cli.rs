use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{anyhow, bail, Context, Result};
use appliance_signature::config::AnalysisConfig;
use appliance_signature::error::{ErrorCode, PipelineError};
use appliance_signature::pipeline;
use appliance_signature::report::{save_report, ApplianceReport, ComparisonReport};
use appliance_signature::signal::synthetic::{self, SyntheticPattern, SyntheticSpec};
use appliance_signature::signal::{self, NormalizationMethod, Signal};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;

#[derive(Parser, Debug)]
#[command(
    name = "appliance_cli",
    about = "Wavelet signature analysis for appliance current traces"
)]
struct Cli {
    /// JSON analysis config (defaults are used when omitted)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Override the configured normalization method
    #[arg(long, global = true, value_enum)]
    normalization: Option<NormalizationArg>,
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compute the scalogram report for one trace
    Analyze {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        output: Option<PathBuf>,
        /// Analyze fixed-length windows instead of the whole trace
        #[arg(long)]
        windows: bool,
    },
    /// Cross wavelet comparison of two traces
    Compare {
        #[arg(long)]
        a: PathBuf,
        #[arg(long)]
        b: PathBuf,
        #[arg(long)]
        output: Option<PathBuf>,
        /// Minimum normalized similarity; exit code 2 when not met
        #[arg(long)]
        threshold: Option<f64>,
        /// Also compute smoothed wavelet coherence
        #[arg(long)]
        coherence: bool,
    },
    /// Analyze every matching trace in a directory
    Batch {
        #[arg(long)]
        dir: PathBuf,
        /// Write one `<stem>_report.json` per trace here
        #[arg(long)]
        output_dir: Option<PathBuf>,
        /// Also compare every pair of traces (`<a>_vs_<b>_comparison.json`)
        #[arg(long)]
        pairwise: bool,
    },
    /// Clean and normalize a trace into `<stem>_processed.csv`
    Preprocess {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        out_dir: PathBuf,
    },
    /// Write a deterministic synthetic trace as CSV
    Synth {
        #[arg(long, value_enum, default_value_t = PatternArg::Sine)]
        pattern: PatternArg,
        #[arg(long, default_value_t = 50.0)]
        frequency: f64,
        #[arg(long, default_value_t = 1.0)]
        amplitude: f64,
        /// Phase offset in radians
        #[arg(long, default_value_t = 0.0)]
        phase: f64,
        /// Sampling interval in seconds
        #[arg(long, default_value_t = 0.001)]
        interval: f64,
        #[arg(long, default_value_t = 1000)]
        samples: usize,
        /// Harmonic as ORDER:AMPLITUDE (mains pattern only, repeatable)
        #[arg(long = "harmonic")]
        harmonics: Vec<String>,
        /// Uniform noise amplitude (mains pattern only)
        #[arg(long, default_value_t = 0.0)]
        noise: f64,
        #[arg(long)]
        output: PathBuf,
    },
    /// Print the effective configuration as JSON
    DumpConfig,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum NormalizationArg {
    Zscore,
    Minmax,
    Robust,
}

impl From<NormalizationArg> for NormalizationMethod {
    fn from(arg: NormalizationArg) -> Self {
        match arg {
            NormalizationArg::Zscore => NormalizationMethod::ZScore,
            NormalizationArg::Minmax => NormalizationMethod::MinMax,
            NormalizationArg::Robust => NormalizationMethod::Robust,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum PatternArg {
    Sine,
    Square,
    WhiteNoise,
    ImpulseTrain,
    Mains,
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    appliance_signature::init_logging(cli.verbose);

    let mut config = match &cli.config {
        Some(path) => AnalysisConfig::load_from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => AnalysisConfig::default(),
    };
    if let Some(method) = cli.normalization {
        config.preprocessing.normalization = method.into();
    }

    match cli.command {
        Commands::Analyze {
            input,
            output,
            windows,
        } => run_analyze(&config, &input, output, windows),
        Commands::Compare {
            a,
            b,
            output,
            threshold,
            coherence,
        } => {
            if threshold.is_some() {
                config.cross.similarity_threshold = threshold;
            }
            config.cross.coherence |= coherence;
            config.validate()?;
            run_compare(&config, &a, &b, output)
        }
        Commands::Batch {
            dir,
            output_dir,
            pairwise,
        } => run_batch(&config, &dir, output_dir, pairwise),
        Commands::Preprocess { input, out_dir } => run_preprocess(&config, &input, &out_dir),
        Commands::Synth {
            pattern,
            frequency,
            amplitude,
            phase,
            interval,
            samples,
            harmonics,
            noise,
            output,
        } => {
            let signal = synthesize(
                pattern, frequency, amplitude, phase, interval, samples, &harmonics, noise,
                &output,
            )?;
            signal::save_csv(&signal, &output)
                .with_context(|| format!("writing {}", output.display()))?;
            println!("{}", output.display());
            Ok(ExitCode::from(0))
        }
        Commands::DumpConfig => {
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(ExitCode::from(0))
        }
    }
}

fn run_analyze(
    config: &AnalysisConfig,
    input: &Path,
    output: Option<PathBuf>,
    windows: bool,
) -> Result<ExitCode> {
    if windows {
        let raw = pipeline::load_signal(input, config).map_err(describe)?;
        let prepared = pipeline::prepare_signal(&raw, config).map_err(describe)?;
        let reports: Vec<ApplianceReport> = pipeline::analyze_windows(&prepared, config)
            .map_err(describe)?
            .iter()
            .map(ApplianceReport::from_analysis)
            .collect();
        emit(&reports, output)?;
    } else {
        let analysis = pipeline::analyze_appliance(input, config).map_err(describe)?;
        emit(&ApplianceReport::from_analysis(&analysis), output)?;
    }
    Ok(ExitCode::from(0))
}

fn run_compare(
    config: &AnalysisConfig,
    a: &Path,
    b: &Path,
    output: Option<PathBuf>,
) -> Result<ExitCode> {
    let comparison = pipeline::compare_appliances(a, b, config).map_err(describe)?;
    let report = ComparisonReport::from_analysis(&comparison, config);
    emit(&report, output)?;

    match report.passed {
        Some(false) => {
            eprintln!(
                "Similarity {:.4} below threshold {:.4}",
                report.similarity.normalized_similarity,
                report.similarity_threshold.unwrap_or_default()
            );
            Ok(ExitCode::from(2))
        }
        _ => Ok(ExitCode::from(0)),
    }
}

fn run_batch(
    config: &AnalysisConfig,
    dir: &Path,
    output_dir: Option<PathBuf>,
    pairwise: bool,
) -> Result<ExitCode> {
    if let Some(out) = &output_dir {
        fs::create_dir_all(out).with_context(|| format!("creating {}", out.display()))?;
    }

    let results = pipeline::analyze_directory(dir, config).map_err(describe)?;
    let mut failures = 0usize;
    for (path, result) in results {
        let entry = match result {
            Ok(analysis) => {
                let report = ApplianceReport::from_analysis(&analysis);
                let report_path = match &output_dir {
                    Some(out) => {
                        let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("trace");
                        let report_path = out.join(format!("{stem}_report.json"));
                        save_report(&report_path, &report)
                            .with_context(|| format!("writing {}", report_path.display()))?;
                        Some(report_path)
                    }
                    None => None,
                };
                BatchEntry {
                    file: path,
                    label: Some(report.label),
                    report: report_path,
                    error_code: None,
                    error: None,
                }
            }
            Err(err) => {
                failures += 1;
                BatchEntry {
                    file: path,
                    label: None,
                    report: None,
                    error_code: Some(err.code()),
                    error: Some(err.message()),
                }
            }
        };
        println!("{}", serde_json::to_string(&entry)?);
    }

    if pairwise {
        failures += run_pairwise(config, dir, output_dir.as_deref())?;
    }

    Ok(ExitCode::from(if failures == 0 { 0 } else { 1 }))
}

/// Emit one JSON line per pair; returns the number of failed comparisons
fn run_pairwise(config: &AnalysisConfig, dir: &Path, output_dir: Option<&Path>) -> Result<usize> {
    let pairs = pipeline::compare_directory(dir, config).map_err(describe)?;
    let mut failures = 0usize;
    for pair in pairs {
        let entry = match &pair.result {
            Ok(comparison) => {
                let report = ComparisonReport::from_analysis(comparison, config);
                let report_path = match output_dir {
                    Some(out) => {
                        let stem = |path: &Path| {
                            path.file_stem()
                                .and_then(|s| s.to_str())
                                .unwrap_or("trace")
                                .to_string()
                        };
                        let report_path = out.join(format!(
                            "{}_vs_{}_comparison.json",
                            stem(pair.a.as_path()),
                            stem(pair.b.as_path())
                        ));
                        save_report(&report_path, &report)
                            .with_context(|| format!("writing {}", report_path.display()))?;
                        Some(report_path)
                    }
                    None => None,
                };
                PairEntry {
                    file_a: pair.a,
                    file_b: pair.b,
                    similarity: Some(report.similarity.normalized_similarity),
                    passed: report.passed,
                    report: report_path,
                    error_code: None,
                    error: None,
                }
            }
            Err(err) => {
                failures += 1;
                PairEntry {
                    file_a: pair.a,
                    file_b: pair.b,
                    similarity: None,
                    passed: None,
                    report: None,
                    error_code: Some(err.code()),
                    error: Some(err.message()),
                }
            }
        };
        println!("{}", serde_json::to_string(&entry)?);
    }
    Ok(failures)
}

fn run_preprocess(config: &AnalysisConfig, input: &Path, out_dir: &Path) -> Result<ExitCode> {
    let written = pipeline::preprocess_file(input, out_dir, config).map_err(describe)?;
    println!("{}", written.display());
    Ok(ExitCode::from(0))
}

#[allow(clippy::too_many_arguments)]
fn synthesize(
    pattern: PatternArg,
    frequency: f64,
    amplitude: f64,
    phase: f64,
    interval: f64,
    samples: usize,
    harmonics: &[String],
    noise: f64,
    output: &Path,
) -> Result<Signal> {
    let label = signal::label_from_path(output);
    let pattern = match pattern {
        PatternArg::Sine => SyntheticPattern::Sine,
        PatternArg::Square => SyntheticPattern::Square,
        PatternArg::WhiteNoise => SyntheticPattern::WhiteNoise,
        PatternArg::ImpulseTrain => SyntheticPattern::ImpulseTrain,
        PatternArg::Mains => {
            let harmonics = harmonics
                .iter()
                .map(|h| parse_harmonic(h))
                .collect::<Result<Vec<_>>>()?;
            return Ok(synthetic::mains_current(
                frequency, &harmonics, noise, interval, samples, label,
            )?);
        }
    };

    let spec = SyntheticSpec {
        pattern,
        frequency_hz: frequency,
        amplitude,
        phase_rad: phase,
        dc_offset: 0.0,
    };
    Ok(synthetic::generate(&spec, interval, samples, label)?)
}

fn parse_harmonic(text: &str) -> Result<(u32, f64)> {
    let Some((order, amplitude)) = text.split_once(':') else {
        bail!("harmonic '{text}' must look like ORDER:AMPLITUDE");
    };
    let order = order
        .trim()
        .parse::<u32>()
        .with_context(|| format!("harmonic order in '{text}'"))?;
    let amplitude = amplitude
        .trim()
        .parse::<f64>()
        .with_context(|| format!("harmonic amplitude in '{text}'"))?;
    Ok((order, amplitude))
}

fn describe(err: PipelineError) -> anyhow::Error {
    anyhow!("{} (code {}, {})", err.message(), err.code(), err.kind())
}

fn emit<T: Serialize>(report: &T, output_path: Option<PathBuf>) -> Result<()> {
    let json = serde_json::to_string_pretty(report)?;

    if let Some(path) = output_path {
        fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
    } else {
        println!("{json}");
    }

    Ok(())
}

#[derive(Serialize)]
struct BatchEntry {
    file: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    report: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_code: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Serialize)]
struct PairEntry {
    file_a: PathBuf,
    file_b: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    similarity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    passed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    report: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_code: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}
