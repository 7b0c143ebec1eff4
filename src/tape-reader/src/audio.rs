// SPDX-FileCopyrightText: 2026 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! WAV input and output.

use std::path::Path;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use tracing::{info, warn};

use tape_core::audio::mix_to_mono;
use tape_core::{DynResult, SampleBuffer};

/// Read a WAV file into a mono buffer at the file's own sample rate.
///
/// Frames are counted against the header; a short data chunk fails with
/// `TapeError::InputRead`.
pub fn read_wav(path: &Path) -> DynResult<SampleBuffer> {
    let mut reader = WavReader::open(path)
        .map_err(|e| format!("Unable to open {}: {}", path.display(), e))?;
    let spec = reader.spec();
    let declared_frames = reader.duration() as usize;
    let channels = usize::from(spec.channels.max(1));
    info!(
        "{}: {} Hz, {} channel(s), {} bit {:?}, {} frames",
        path.display(),
        spec.sample_rate,
        spec.channels,
        spec.bits_per_sample,
        spec.sample_format,
        declared_frames
    );

    let interleaved = match spec.sample_format {
        SampleFormat::Float => read_until_error(reader.samples::<f32>(), |s| s),
        SampleFormat::Int => {
            let scale = 1.0 / (1u64 << (spec.bits_per_sample.clamp(1, 32) - 1)) as f32;
            read_until_error(reader.samples::<i32>(), |s| s as f32 * scale)
        }
    };
    let samples = mix_to_mono(&interleaved, channels);
    Ok(SampleBuffer::acquire(samples, declared_frames, spec.sample_rate)?)
}

fn read_until_error<T, I, F>(samples: I, convert: F) -> Vec<f32>
where
    I: Iterator<Item = hound::Result<T>>,
    F: Fn(T) -> f32,
{
    let mut out = Vec::with_capacity(samples.size_hint().0);
    for sample in samples {
        match sample {
            Ok(value) => out.push(convert(value)),
            Err(e) => {
                warn!("stopped reading input: {}", e);
                break;
            }
        }
    }
    out
}

/// Write `buffer` as mono 32-bit float WAV. The header rate is twice the
/// buffer's rate.
pub fn write_waveform(path: &Path, buffer: &SampleBuffer) -> DynResult<()> {
    let sample_rate = buffer
        .sample_rate()
        .checked_mul(2)
        .ok_or_else(|| format!("sample rate {} too high for output", buffer.sample_rate()))?;
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };
    let mut writer = WavWriter::create(path, spec)
        .map_err(|e| format!("create {}: {}", path.display(), e))?;
    for &sample in buffer.samples() {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;
    info!("wrote {} samples to {}", buffer.len(), path.display());
    Ok(())
}
