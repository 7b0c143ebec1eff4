// SPDX-FileCopyrightText: 2026 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Phase-encoded (1600 bpi) tape decoder.
//!
//! [`PeDecoder::decode`] runs the whole pipeline over one in-memory buffer:
//! carrier geometry is resolved from the buffer's sample rate, the buffer is
//! demodulated against the reference carrier, integrated and drift-corrected
//! in place, and finally split into baud intervals that are classified into
//! [`Bit`]s.

pub mod carrier;
pub mod demod;
pub mod discriminator;
pub mod drift;
pub mod geometry;
pub mod progress;
pub mod synth;

use serde::{Deserialize, Serialize};
use tape_core::{AmbiguousInterval, Bit, Confidence, SampleBuffer, TapeError};
use tracing::{info, warn};

pub use carrier::{CarrierPhase, CarrierReference};
pub use discriminator::{Discrimination, Discriminator, DEFAULT_DROPOUT_RATIO, DEFAULT_THRESHOLD};
pub use drift::{
    DriftRemover, DriftReport, IntegratorState, NormalizePeak, WarmUp, DEFAULT_WINDOW_SIZE,
};
pub use geometry::CarrierGeometry;
pub use progress::{Checkpoint, ProgressSink, Stage, TracingProgress};

use progress::Reporter;

pub const DEFAULT_DENSITY_BPI: f64 = 1600.0;
pub const DEFAULT_SPEED_IPS: f64 = 15.0;
pub const DEFAULT_PROGRESS_INTERVAL: usize = 1_000_000;

/// Recording parameters of the tape.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TapeConfig {
    /// Recording density in bits per inch
    pub density_bpi: f64,
    /// Transport speed in inches per second
    pub speed_ips: f64,
}

impl Default for TapeConfig {
    fn default() -> Self {
        Self {
            density_bpi: DEFAULT_DENSITY_BPI,
            speed_ips: DEFAULT_SPEED_IPS,
        }
    }
}

/// Drift removal and discrimination settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecoderConfig {
    /// Sliding window length in samples
    pub window_size: usize,
    /// Minimum amplitude ratio for a KNOWN bit
    pub threshold: f64,
    /// Minimum amplitude ratio for an UNKNOWN bit, below it the interval is
    /// NOTHING
    pub dropout_ratio: f64,
    pub warm_up: WarmUp,
    pub normalize_peak: NormalizePeak,
    pub carrier_phase: CarrierPhase,
    /// Samples between progress checkpoints, 0 disables them
    pub progress_interval: usize,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
            threshold: DEFAULT_THRESHOLD,
            dropout_ratio: DEFAULT_DROPOUT_RATIO,
            warm_up: WarmUp::default(),
            normalize_peak: NormalizePeak::default(),
            carrier_phase: CarrierPhase::default(),
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }
}

/// Everything a decode run produces.
#[derive(Debug, Clone)]
pub struct Decoded {
    pub geometry: CarrierGeometry,
    /// Demodulated, integrated and drift-corrected signal.
    pub waveform: SampleBuffer,
    /// Peak input amplitude used to scale the demodulator.
    pub peak_amplitude: f32,
    pub drift: DriftReport,
    pub bits: Vec<Bit>,
    pub ambiguities: Vec<AmbiguousInterval>,
}

impl Decoded {
    pub fn count(&self, confidence: Confidence) -> usize {
        self.bits
            .iter()
            .filter(|bit| bit.confidence == confidence)
            .count()
    }
}

#[derive(Debug, Clone)]
pub struct PeDecoder {
    tape: TapeConfig,
    config: DecoderConfig,
    drift: DriftRemover,
}

impl PeDecoder {
    /// Validates every setting that does not depend on the input.
    pub fn new(tape: TapeConfig, config: DecoderConfig) -> Result<Self, TapeError> {
        for (name, value) in [("density_bpi", tape.density_bpi), ("speed_ips", tape.speed_ips)] {
            if !(value.is_finite() && value > 0.0) {
                return Err(TapeError::InvalidParameter { name, value });
            }
        }
        let drift = DriftRemover::new(config.window_size, config.warm_up)?
            .with_normalize_peak(config.normalize_peak);
        Discriminator::check_thresholds(config.threshold, config.dropout_ratio)?;
        Ok(Self {
            tape,
            config,
            drift,
        })
    }

    pub fn decode(&self, buffer: SampleBuffer) -> Result<Decoded, TapeError> {
        self.run(buffer, Reporter::silent())
    }

    /// Like [`decode`](Self::decode), calling `sink` every
    /// `progress_interval` positions of each stage.
    pub fn decode_with_progress(
        &self,
        buffer: SampleBuffer,
        sink: &mut dyn ProgressSink,
    ) -> Result<Decoded, TapeError> {
        self.run(buffer, Reporter::new(Some(sink), self.config.progress_interval))
    }

    fn run(&self, mut buffer: SampleBuffer, mut reporter: Reporter<'_>) -> Result<Decoded, TapeError> {
        let geometry = CarrierGeometry::resolve(
            self.tape.density_bpi,
            self.tape.speed_ips,
            buffer.sample_rate(),
        )?
        .with_carrier_phase(self.config.carrier_phase);
        let discriminator = Discriminator::new(
            geometry,
            self.config.threshold,
            self.config.dropout_ratio,
            self.config.window_size,
        )?;
        info!(
            "{} samples at {} Hz, {:.4} samples per baud",
            buffer.len(),
            geometry.sample_rate(),
            geometry.samples_per_baud()
        );
        info!(
            "frequency = {:.6} cyc/samp, {:.4} samp/cyc, {:.1} Hz",
            geometry.cycles_per_sample(),
            geometry.samples_per_baud(),
            geometry.carrier_hz()
        );
        if geometry.is_undersampled() {
            warn!(
                "{:.4} samples per baud is below 2, the {:.1} Hz carrier is above Nyquist at {} Hz",
                geometry.samples_per_baud(),
                geometry.carrier_hz(),
                geometry.sample_rate()
            );
        }

        let carrier = geometry.carrier();
        let peak_amplitude =
            demod::demodulate_with_progress(buffer.samples_mut(), &carrier, &mut reporter)?;
        info!("altered {} samples, max = {:.6}", buffer.len(), peak_amplitude);
        let drift = self
            .drift
            .remove_with_progress(buffer.samples_mut(), &mut reporter)?;
        info!(
            "divided by {:.6}, running rms {:.6}",
            drift.integrator.peak(self.config.normalize_peak),
            (drift.integrator.running_squared_sum / buffer.len().max(1) as f64).sqrt()
        );

        let Discrimination { bits, ambiguities } = discriminator.discriminate_with_progress(
            buffer.samples(),
            drift.correction_onset,
            &mut reporter,
        );

        let decoded = Decoded {
            geometry,
            waveform: buffer,
            peak_amplitude,
            drift,
            bits,
            ambiguities,
        };
        info!(
            "decoded {} bits: {} known, {} unknown, {} nothing",
            decoded.bits.len(),
            decoded.count(Confidence::Known),
            decoded.count(Confidence::Unknown),
            decoded.count(Confidence::Nothing)
        );
        Ok(decoded)
    }
}
