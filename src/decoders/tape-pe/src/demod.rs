// SPDX-FileCopyrightText: 2026 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Carrier demodulation.
//!
//! Each sample is scaled by the global peak amplitude and multiplied by the
//! reference carrier at its index, turning the phase-encoded carrier into a
//! baseband signal whose mean over a baud interval carries the bit polarity.

use tape_core::TapeError;

use crate::carrier::CarrierReference;
use crate::progress::{Checkpoint, Reporter, Stage};

/// Largest finite absolute sample value, or 0 when there is none.
pub fn peak_amplitude(samples: &[f32]) -> f32 {
    samples
        .iter()
        .filter(|s| s.is_finite())
        .fold(0.0f32, |max, s| max.max(s.abs()))
}

/// Demodulate `samples` in place. Returns the peak amplitude used for
/// normalization.
///
/// Fails with [`TapeError::SilentInput`] before touching the buffer when the
/// input has no non-zero sample.
pub fn demodulate(samples: &mut [f32], carrier: &CarrierReference) -> Result<f32, TapeError> {
    demodulate_with_progress(samples, carrier, &mut Reporter::silent())
}

pub(crate) fn demodulate_with_progress(
    samples: &mut [f32],
    carrier: &CarrierReference,
    reporter: &mut Reporter<'_>,
) -> Result<f32, TapeError> {
    let max = peak_amplitude(samples);
    if max <= 0.0 {
        return Err(TapeError::SilentInput { len: samples.len() });
    }

    let total = samples.len();
    let inv_max = 1.0 / f64::from(max);
    for (idx, sample) in samples.iter_mut().enumerate() {
        *sample = (f64::from(*sample) * carrier.value_at(idx) * inv_max) as f32;
        if reporter.due(idx) {
            reporter.report(Checkpoint {
                stage: Stage::Demodulate,
                position: idx,
                total,
                running_sum: None,
                rms: None,
            });
        }
    }
    Ok(max)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_approx_eq(a: f32, b: f32, tol: f32, label: &str) {
        assert!(
            (a - b).abs() <= tol,
            "{}: expected {} ≈ {} (tol {})",
            label,
            a,
            b,
            tol
        );
    }

    #[test]
    fn test_silent_input_is_rejected_untouched() {
        let mut samples = vec![0.0f32; 64];
        let err = demodulate(&mut samples, &CarrierReference::new(0.125)).unwrap_err();
        assert_eq!(err, TapeError::SilentInput { len: 64 });
        assert!(samples.iter().all(|s| *s == 0.0));
    }

    #[test]
    fn test_zero_frequency_carrier_zeroes_output() {
        let mut samples: Vec<f32> = (0..256).map(|i| ((i as f32) * 0.37).sin() + 0.2).collect();
        demodulate(&mut samples, &CarrierReference::new(0.0)).unwrap();
        for (idx, &value) in samples.iter().enumerate() {
            assert_approx_eq(value, 0.0, 0.0, &format!("sample {idx}"));
        }
    }

    #[test]
    fn test_in_phase_carrier_becomes_sin_squared() {
        let carrier = CarrierReference::new(0.25);
        let mut samples: Vec<f32> = (0..16).map(|i| 2.0 * carrier.value_at(i) as f32).collect();
        let max = demodulate(&mut samples, &carrier).unwrap();
        assert_approx_eq(max, 2.0, 1e-6, "peak");
        let expected = [0.0f32, 1.0, 0.0, 1.0];
        for (idx, &value) in samples.iter().enumerate() {
            assert_approx_eq(value, expected[idx % 4], 1e-6, &format!("sample {idx}"));
        }
    }

    #[test]
    fn test_peak_ignores_non_finite() {
        assert_eq!(peak_amplitude(&[0.5, f32::NAN, -0.75, f32::INFINITY]), 0.75);
        assert_eq!(peak_amplitude(&[]), 0.0);
    }
}
