// SPDX-FileCopyrightText: 2026 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Bit discriminator.
//!
//! Every baud interval carries one mid-cell flux transition. After
//! demodulation and integration that transition shows up as a ripple whose
//! shape follows the squared carrier and whose sign follows the recorded
//! bit. The discriminator correlates each interval's sample-to-sample steps
//! against the zero-mean squared carrier, which yields a signed transition
//! amplitude and ignores any slope left over from drift removal. The
//! amplitude is then compared with the mean amplitude of the neighbouring
//! intervals to decide the confidence.

use tape_core::{AmbiguityReason, AmbiguousInterval, Bit, BitValue, Confidence, TapeError};
use tracing::debug;

use crate::geometry::CarrierGeometry;
use crate::progress::{Checkpoint, Reporter, Stage};

pub const DEFAULT_THRESHOLD: f64 = 0.5;
pub const DEFAULT_DROPOUT_RATIO: f64 = 0.15;

/// Minimum template energy per sample for an interval to be measurable.
const MIN_TEMPLATE_ENERGY: f64 = 1e-9;

#[derive(Debug, Clone, Default)]
pub struct Discrimination {
    pub bits: Vec<Bit>,
    /// One entry per `Confidence::Nothing` bit.
    pub ambiguities: Vec<AmbiguousInterval>,
}

impl Discrimination {
    pub fn count(&self, confidence: Confidence) -> usize {
        self.bits
            .iter()
            .filter(|bit| bit.confidence == confidence)
            .count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Estimate {
    Amplitude(f64),
    Unmeasurable,
    NonFinite,
}

#[derive(Debug, Clone, Copy)]
pub struct Discriminator {
    geometry: CarrierGeometry,
    threshold: f64,
    dropout_ratio: f64,
    /// Intervals on each side contributing to the local scale.
    scale_span: usize,
}

impl Discriminator {
    /// `window_size` sets how far the local scale reaches, in samples on
    /// each side of an interval.
    pub fn new(
        geometry: CarrierGeometry,
        threshold: f64,
        dropout_ratio: f64,
        window_size: usize,
    ) -> Result<Self, TapeError> {
        Self::check_thresholds(threshold, dropout_ratio)?;
        let scale_span = ((window_size as f64 / geometry.samples_per_baud()).round() as usize).max(1);
        Ok(Self {
            geometry,
            threshold,
            dropout_ratio,
            scale_span,
        })
    }

    /// `threshold` must be positive, `dropout_ratio` within `0..=threshold`.
    pub fn check_thresholds(threshold: f64, dropout_ratio: f64) -> Result<(), TapeError> {
        if !(threshold.is_finite() && threshold > 0.0) {
            return Err(TapeError::Config(format!(
                "threshold must be > 0 (got {threshold})"
            )));
        }
        if !(dropout_ratio.is_finite() && dropout_ratio >= 0.0 && dropout_ratio <= threshold) {
            return Err(TapeError::Config(format!(
                "dropout_ratio must be in 0..=threshold (got {dropout_ratio}, threshold {threshold})"
            )));
        }
        Ok(())
    }

    pub fn discriminate(&self, corrected: &[f32], correction_onset: Option<usize>) -> Discrimination {
        self.discriminate_with_progress(corrected, correction_onset, &mut Reporter::silent())
    }

    pub(crate) fn discriminate_with_progress(
        &self,
        corrected: &[f32],
        correction_onset: Option<usize>,
        reporter: &mut Reporter<'_>,
    ) -> Discrimination {
        let count = self.geometry.baud_count(corrected.len());
        let spans: Vec<(usize, usize)> = (0..count)
            .map(|position| {
                let start = self.geometry.baud_start(position);
                let end = self.geometry.baud_start(position + 1).min(corrected.len());
                (start, end)
            })
            .collect();
        let estimates: Vec<Estimate> = spans
            .iter()
            .map(|&(start, end)| self.estimate(corrected, start, end, correction_onset))
            .collect();

        // prefix sums of |amplitude| over measurable intervals
        let mut magnitude_sums = Vec::with_capacity(count + 1);
        let mut measured_counts = Vec::with_capacity(count + 1);
        magnitude_sums.push(0.0f64);
        measured_counts.push(0usize);
        for estimate in &estimates {
            let (magnitude, measured) = match estimate {
                Estimate::Amplitude(amplitude) => (amplitude.abs(), 1),
                _ => (0.0, 0),
            };
            magnitude_sums.push(magnitude_sums[magnitude_sums.len() - 1] + magnitude);
            measured_counts.push(measured_counts[measured_counts.len() - 1] + measured);
        }

        let mut result = Discrimination {
            bits: Vec::with_capacity(count),
            ambiguities: Vec::new(),
        };
        for (position, (&(start, end), estimate)) in spans.iter().zip(estimates).enumerate() {
            let lo = position.saturating_sub(self.scale_span);
            let hi = (position + self.scale_span + 1).min(count);
            let measured = measured_counts[hi] - measured_counts[lo];
            let scale = if measured == 0 {
                0.0
            } else {
                (magnitude_sums[hi] - magnitude_sums[lo]) / measured as f64
            };

            let (bit, ambiguity) = self.classify(position, estimate, scale);
            if let Some(reason) = ambiguity {
                let diag = AmbiguousInterval {
                    position,
                    start,
                    end,
                    amplitude: match estimate {
                        Estimate::Amplitude(amplitude) => amplitude,
                        _ => f64::NAN,
                    },
                    scale,
                    reason,
                };
                debug!("{}", diag);
                result.ambiguities.push(diag);
            }
            result.bits.push(bit);

            if reporter.due(position) {
                reporter.report(Checkpoint {
                    stage: Stage::Discriminate,
                    position,
                    total: count,
                    running_sum: None,
                    rms: None,
                });
            }
        }
        result
    }

    /// Least-squares fit of the interval's steps to the squared carrier plus
    /// a constant. The constant absorbs residual slope, the template
    /// coefficient is the transition amplitude.
    fn estimate(&self, corrected: &[f32], start: usize, end: usize, onset: Option<usize>) -> Estimate {
        let carrier = self.geometry.carrier();
        let mut n = 0usize;
        let (mut sum_w, mut sum_d, mut sum_ww, mut sum_wd) = (0.0f64, 0.0f64, 0.0f64, 0.0f64);
        for idx in start..end {
            // position 0 has no predecessor, and the step where full-window
            // correction switches on is not signal
            if idx == 0 || Some(idx) == onset {
                continue;
            }
            let step = f64::from(corrected[idx]) - f64::from(corrected[idx - 1]);
            if !step.is_finite() {
                return Estimate::NonFinite;
            }
            let reference = carrier.value_at(idx);
            let w = reference * reference;
            n += 1;
            sum_w += w;
            sum_d += step;
            sum_ww += w * w;
            sum_wd += w * step;
        }
        if n < 2 {
            return Estimate::Unmeasurable;
        }
        let n_f = n as f64;
        let energy = sum_ww - sum_w * sum_w / n_f;
        if energy <= MIN_TEMPLATE_ENERGY * n_f {
            return Estimate::Unmeasurable;
        }
        Estimate::Amplitude((sum_wd - sum_w * sum_d / n_f) / energy)
    }

    fn classify(
        &self,
        position: usize,
        estimate: Estimate,
        scale: f64,
    ) -> (Bit, Option<AmbiguityReason>) {
        let nothing = |value, reason| {
            (
                Bit {
                    position,
                    value,
                    confidence: Confidence::Nothing,
                },
                Some(reason),
            )
        };
        let amplitude = match estimate {
            Estimate::Amplitude(amplitude) => amplitude,
            Estimate::Unmeasurable => return nothing(BitValue::Zero, AmbiguityReason::NoSignal),
            Estimate::NonFinite => return nothing(BitValue::Zero, AmbiguityReason::NonFinite),
        };
        let value = if amplitude > 0.0 {
            BitValue::One
        } else {
            BitValue::Zero
        };
        if !(scale > 0.0 && scale.is_finite()) {
            return nothing(value, AmbiguityReason::NoSignal);
        }

        let ratio = amplitude.abs() / scale;
        let confidence = if ratio >= self.threshold {
            Confidence::Known
        } else if ratio >= self.dropout_ratio {
            Confidence::Unknown
        } else {
            return nothing(value, AmbiguityReason::NoTransition);
        };
        (
            Bit {
                position,
                value,
                confidence,
            },
            None,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drift::{DriftRemover, WarmUp, DEFAULT_WINDOW_SIZE};

    fn geometry() -> CarrierGeometry {
        CarrierGeometry::resolve(1600.0, 15.0, 192_000).unwrap()
    }

    /// Integrated ideal baseband: each interval adds `±sin²` steps.
    fn integrated(bits: &[u8], amplitude: f64) -> Vec<f32> {
        let geometry = geometry();
        let carrier = geometry.carrier();
        let len = geometry.baud_start(bits.len());
        let mut sum = 0.0f64;
        (0..len)
            .map(|idx| {
                let bit = bits[idx / 8];
                let sign = if bit == 1 { 1.0 } else { -1.0 };
                sum += sign * amplitude * carrier.value_at(idx).powi(2);
                sum as f32
            })
            .collect()
    }

    fn discriminator() -> Discriminator {
        Discriminator::new(geometry(), DEFAULT_THRESHOLD, DEFAULT_DROPOUT_RATIO, DEFAULT_WINDOW_SIZE)
            .unwrap()
    }

    #[test]
    fn test_recovers_clean_integrated_bits() {
        let bits = [1u8, 0, 0, 1, 1, 1, 0, 1, 0, 0, 0, 1];
        let result = discriminator().discriminate(&integrated(&bits, 0.01), None);
        assert_eq!(result.bits.len(), bits.len());
        assert!(result.ambiguities.is_empty());
        for (bit, &expected) in result.bits.iter().zip(bits.iter()) {
            let value = if expected == 1 { BitValue::One } else { BitValue::Zero };
            assert_eq!(bit.value, value, "bit {}", bit.position);
            assert_eq!(bit.confidence, Confidence::Known);
        }
    }

    #[test]
    fn test_ignores_residual_slope() {
        let bits = [1u8, 1, 1, 0, 0, 0, 1, 0];
        let mut signal = integrated(&bits, 0.01);
        // a ramp much steeper than the data itself
        for (idx, value) in signal.iter_mut().enumerate() {
            *value -= 0.05 * idx as f32;
        }
        let result = discriminator().discriminate(&signal, None);
        let decoded: Vec<u8> = result
            .bits
            .iter()
            .map(|bit| (bit.value == BitValue::One) as u8)
            .collect();
        assert_eq!(decoded, bits);
        assert_eq!(result.count(Confidence::Known), bits.len());
    }

    #[test]
    fn test_weak_and_missing_transitions() {
        let bits = [1u8; 40];
        let geometry = geometry();
        let carrier = geometry.carrier();
        let mut sum = 0.0f64;
        let signal: Vec<f32> = (0..geometry.baud_start(40))
            .map(|idx| {
                let gain = match idx / 8 {
                    10 => 0.3,
                    20 => 0.0,
                    _ => 1.0,
                };
                sum += gain * carrier.value_at(idx).powi(2);
                sum as f32
            })
            .collect();
        let result = discriminator().discriminate(&signal, None);
        assert_eq!(result.bits[10].confidence, Confidence::Unknown);
        assert_eq!(result.bits[10].value, BitValue::One);
        assert_eq!(result.bits[20].confidence, Confidence::Nothing);
        assert_eq!(result.count(Confidence::Known), 38);
        assert_eq!(result.ambiguities.len(), 1);
        assert_eq!(result.ambiguities[0].position, 20);
        assert_eq!(result.ambiguities[0].reason, AmbiguityReason::NoTransition);
        assert_eq!((result.ambiguities[0].start, result.ambiguities[0].end), (160, 168));
    }

    #[test]
    fn test_non_finite_interval_degrades_only_itself() {
        let bits = [0u8, 1, 0, 1, 0, 1];
        let mut signal = integrated(&bits, 0.01);
        signal[19] = f32::NAN;
        let result = discriminator().discriminate(&signal, None);
        // sample 19 spoils the steps at 19 and 20, both in interval 2
        assert_eq!(result.bits[2].confidence, Confidence::Nothing);
        assert_eq!(result.ambiguities[0].reason, AmbiguityReason::NonFinite);
        assert_eq!(result.count(Confidence::Known), 5);
    }

    #[test]
    fn test_onset_step_is_skipped() {
        let bits: Vec<u8> = (0..80).map(|i| ((i * 5 + 1) % 3 != 0) as u8).collect();
        let geometry = geometry();
        let carrier = geometry.carrier();
        let mut baseband: Vec<f32> = (0..geometry.baud_start(bits.len()))
            .map(|idx| {
                let sign = if bits[idx / 8] == 1 { 0.5 } else { -0.5 };
                (sign * carrier.value_at(idx).powi(2)) as f32
            })
            .collect();
        let report = DriftRemover::new(DEFAULT_WINDOW_SIZE, WarmUp::Uncorrected)
            .unwrap()
            .remove(&mut baseband)
            .unwrap();
        assert_eq!(report.correction_onset, Some(DEFAULT_WINDOW_SIZE + 1));

        let result = discriminator().discriminate(&baseband, report.correction_onset);
        for (bit, &expected) in result.bits.iter().zip(bits.iter()) {
            let value = if expected == 1 { BitValue::One } else { BitValue::Zero };
            assert_eq!(bit.value, value, "bit {}", bit.position);
            assert_eq!(bit.confidence, Confidence::Known, "bit {}", bit.position);
        }
    }

    #[test]
    fn test_rejects_bad_thresholds() {
        assert!(Discriminator::new(geometry(), 0.0, 0.0, 400).is_err());
        assert!(Discriminator::new(geometry(), 0.5, 0.6, 400).is_err());
        assert!(Discriminator::new(geometry(), 0.5, f64::NAN, 400).is_err());
    }
}
