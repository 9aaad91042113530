// WAV input for traces captured through an audio-grade ADC
//
// Multi-channel recordings are averaged down to mono. Integer samples are
// scaled to [-1, 1]; the sampling interval is 1 / sample_rate.

use std::path::Path;

use tracing::info;

use super::loader::label_from_path;
use super::Signal;
use crate::error::LoadError;

pub fn load_wav(path: &Path, label: Option<&str>) -> Result<Signal, LoadError> {
    let io_err = |err: hound::Error| LoadError::Io {
        path: path.display().to_string(),
        reason: err.to_string(),
    };

    let mut reader = hound::WavReader::open(path).map_err(io_err)?;
    let spec = reader.spec();
    if spec.channels == 0 {
        return Err(LoadError::Format {
            reason: format!("{} has zero channels", path.display()),
        });
    }
    if spec.sample_rate == 0 {
        return Err(LoadError::Format {
            reason: format!("{} declares a zero sample rate", path.display()),
        });
    }

    let samples: Vec<f64> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .map(|sample| sample.map(f64::from).map_err(io_err))
            .collect::<Result<_, _>>()?,
        hound::SampleFormat::Int => match spec.bits_per_sample {
            bits @ (8 | 16 | 24 | 32) => {
                let max = ((1i64 << (bits - 1)) - 1) as f64;
                reader
                    .samples::<i32>()
                    .map(|sample| sample.map(|v| v as f64 / max).map_err(io_err))
                    .collect::<Result<_, _>>()?
            }
            bits => {
                return Err(LoadError::Format {
                    reason: format!("unsupported bits_per_sample={} in {}", bits, path.display()),
                })
            }
        },
    };

    let channels = spec.channels as usize;
    let mono: Vec<f64> = if channels == 1 {
        samples
    } else {
        samples
            .chunks(channels)
            .map(|chunk| chunk.iter().sum::<f64>() / channels as f64)
            .collect()
    };

    if mono.is_empty() {
        return Err(LoadError::EmptyData {
            reason: format!("{} contains no samples", path.display()),
        });
    }

    let label = label
        .map(str::to_string)
        .unwrap_or_else(|| label_from_path(path));

    info!(
        "[Loader] Loaded '{}' from {}: {} samples @ {} Hz",
        label,
        path.display(),
        mono.len(),
        spec.sample_rate
    );

    Signal::new(mono, 1.0 / spec.sample_rate as f64, label)
}
