// SPDX-FileCopyrightText: 2026 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Drift removal: running integration followed by peak normalization and
//! sliding-window mean subtraction.

use serde::{Deserialize, Serialize};
use tape_core::TapeError;

use crate::progress::{Checkpoint, Reporter, Stage};

pub const DEFAULT_WINDOW_SIZE: usize = 400;

/// How the first `window_size` positions are corrected, before the sliding
/// window holds a full history.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarmUp {
    /// No subtraction until the window is full. Full correction switches on
    /// at `window_size + 1`, which leaves a step in the signal there.
    #[default]
    Uncorrected,
    /// Subtract the mean of the corrected values seen so far.
    PartialWindow,
}

/// Which integrated value the signal is divided by before drift removal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalizePeak {
    /// Largest running sum, starting from 0. A signal whose integral never
    /// rises above 0 is rejected.
    #[default]
    Signed,
    /// Largest running sum magnitude.
    Absolute,
}

/// Accumulators of the integration pass.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct IntegratorState {
    pub running_sum: f64,
    pub running_squared_sum: f64,
    /// Largest running sum seen, never below 0.
    pub max_running_sum: f64,
    pub max_abs_running_sum: f64,
}

impl IntegratorState {
    fn accumulate(&mut self, sample: f64) {
        self.running_sum += sample;
        self.running_squared_sum += sample * sample;
        self.max_running_sum = self.max_running_sum.max(self.running_sum);
        self.max_abs_running_sum = self.max_abs_running_sum.max(self.running_sum.abs());
    }

    pub fn peak(&self, mode: NormalizePeak) -> f64 {
        match mode {
            NormalizePeak::Signed => self.max_running_sum,
            NormalizePeak::Absolute => self.max_abs_running_sum,
        }
    }

    fn rms(&self, count: usize) -> f64 {
        if count == 0 {
            return 0.0;
        }
        (self.running_squared_sum / count as f64).sqrt()
    }
}

/// Fixed-capacity ring of the most recent corrected values with a running
/// mean.
#[derive(Debug, Clone)]
pub struct SlidingWindow {
    values: Vec<f64>,
    head: usize,
    len: usize,
    sum: f64,
}

impl SlidingWindow {
    pub fn new(capacity: usize) -> Self {
        Self {
            values: vec![0.0; capacity.max(1)],
            head: 0,
            len: 0,
            sum: 0.0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.values.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len == self.values.len()
    }

    pub fn push(&mut self, value: f64) {
        if self.is_full() {
            self.sum -= self.values[self.head];
        } else {
            self.len += 1;
        }
        self.values[self.head] = value;
        self.sum += value;
        self.head = (self.head + 1) % self.values.len();
        if self.head == 0 && self.is_full() {
            // resum once per lap so rounding error cannot build up
            self.sum = self.values.iter().sum();
        }
    }

    pub fn mean(&self) -> f64 {
        if self.len == 0 {
            return 0.0;
        }
        self.sum / self.len as f64
    }
}

/// Result of a full drift removal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DriftReport {
    pub integrator: IntegratorState,
    /// First index that received full-window correction after an
    /// uncorrected warm-up.
    pub correction_onset: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DriftRemover {
    window_size: usize,
    warm_up: WarmUp,
    peak: NormalizePeak,
}

impl DriftRemover {
    pub fn new(window_size: usize, warm_up: WarmUp) -> Result<Self, TapeError> {
        if window_size == 0 {
            return Err(TapeError::Config("window_size must be > 0".to_string()));
        }
        Ok(Self {
            window_size,
            warm_up,
            peak: NormalizePeak::default(),
        })
    }

    pub fn with_normalize_peak(mut self, peak: NormalizePeak) -> Self {
        self.peak = peak;
        self
    }

    /// Pass 1: replace each sample with the running sum up to and including
    /// it.
    pub fn integrate(&self, samples: &mut [f32]) -> IntegratorState {
        self.integrate_with_progress(samples, &mut Reporter::silent())
    }

    /// Pass 2: divide by the integrated peak and subtract the sliding-window
    /// mean. Returns the correction onset index.
    pub fn normalize(
        &self,
        samples: &mut [f32],
        state: &IntegratorState,
    ) -> Result<Option<usize>, TapeError> {
        self.normalize_with_progress(samples, state, &mut Reporter::silent())
    }

    /// Both passes in order.
    pub fn remove(&self, samples: &mut [f32]) -> Result<DriftReport, TapeError> {
        self.remove_with_progress(samples, &mut Reporter::silent())
    }

    pub(crate) fn remove_with_progress(
        &self,
        samples: &mut [f32],
        reporter: &mut Reporter<'_>,
    ) -> Result<DriftReport, TapeError> {
        let integrator = self.integrate_with_progress(samples, reporter);
        let correction_onset = self.normalize_with_progress(samples, &integrator, reporter)?;
        Ok(DriftReport {
            integrator,
            correction_onset,
        })
    }

    fn integrate_with_progress(
        &self,
        samples: &mut [f32],
        reporter: &mut Reporter<'_>,
    ) -> IntegratorState {
        let mut state = IntegratorState::default();
        let total = samples.len();
        for (idx, sample) in samples.iter_mut().enumerate() {
            state.accumulate(f64::from(*sample));
            *sample = state.running_sum as f32;
            if reporter.due(idx) {
                reporter.report(Checkpoint {
                    stage: Stage::Integrate,
                    position: idx,
                    total,
                    running_sum: Some(state.running_sum),
                    rms: Some(state.rms(idx + 1)),
                });
            }
        }
        state
    }

    fn normalize_with_progress(
        &self,
        samples: &mut [f32],
        state: &IntegratorState,
        reporter: &mut Reporter<'_>,
    ) -> Result<Option<usize>, TapeError> {
        let peak = state.peak(self.peak);
        if !(peak > 0.0 && peak.is_finite()) {
            return Err(TapeError::DegenerateSignal {
                len: samples.len(),
                peak,
            });
        }

        let total = samples.len();
        let mut window = SlidingWindow::new(self.window_size);
        for (idx, sample) in samples.iter_mut().enumerate() {
            let mut value = f64::from(*sample) / peak;
            if idx > self.window_size {
                value -= window.mean();
            } else if self.warm_up == WarmUp::PartialWindow && !window.is_empty() {
                value -= window.mean();
            }
            window.push(value);
            *sample = value as f32;
            if reporter.due(idx) {
                reporter.report(Checkpoint {
                    stage: Stage::Normalize,
                    position: idx,
                    total,
                    running_sum: None,
                    rms: None,
                });
            }
        }

        let onset = self.window_size + 1;
        Ok((self.warm_up == WarmUp::Uncorrected && onset < total).then_some(onset))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drifting_sine(len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| 0.25 + 0.5 * (std::f32::consts::TAU * i as f32 / 37.0).sin())
            .collect()
    }

    #[test]
    fn test_integration_stores_prefix_sums() {
        let input: Vec<f32> = (0..500).map(|i| ((i * 7919) % 13) as f32 / 6.0 - 1.0).collect();
        let mut samples = input.clone();
        let remover = DriftRemover::new(DEFAULT_WINDOW_SIZE, WarmUp::Uncorrected).unwrap();
        let state = remover.integrate(&mut samples);

        let mut prefix = 0.0f64;
        for (idx, (&value, &raw)) in samples.iter().zip(input.iter()).enumerate() {
            prefix += f64::from(raw);
            assert!(
                (f64::from(value) - prefix).abs() < 1e-4,
                "prefix sum at {idx}: {value} vs {prefix}"
            );
        }
        assert!((state.running_sum - prefix).abs() < 1e-9);
        let peak = input
            .iter()
            .scan(0.0f64, |sum, &s| {
                *sum += f64::from(s);
                Some(*sum)
            })
            .fold(0.0, f64::max);
        assert_eq!(state.max_running_sum, peak);
        assert!(state.max_abs_running_sum >= state.max_running_sum);
    }

    #[test]
    fn test_degenerate_signal_is_rejected() {
        let mut samples = vec![0.0f32; 32];
        let remover = DriftRemover::new(8, WarmUp::Uncorrected).unwrap();
        let err = remover.remove(&mut samples).unwrap_err();
        assert_eq!(err, TapeError::DegenerateSignal { len: 32, peak: 0.0 });
    }

    #[test]
    fn test_falling_integral_has_no_signed_peak() {
        let mut samples = vec![-0.5f32; 32];
        let remover = DriftRemover::new(8, WarmUp::Uncorrected).unwrap();
        let err = remover.remove(&mut samples).unwrap_err();
        assert_eq!(err, TapeError::DegenerateSignal { len: 32, peak: 0.0 });

        let mut samples = vec![-0.5f32; 32];
        let remover = remover.with_normalize_peak(NormalizePeak::Absolute);
        let report = remover.remove(&mut samples).unwrap();
        assert_eq!(report.integrator.max_running_sum, 0.0);
        assert_eq!(report.integrator.max_abs_running_sum, 16.0);
        // -0.5 integrated once, divided by 16
        assert_eq!(samples[0], -0.03125);
    }

    #[test]
    fn test_zero_window_is_rejected() {
        assert!(matches!(
            DriftRemover::new(0, WarmUp::Uncorrected),
            Err(TapeError::Config(_))
        ));
    }

    #[test]
    fn test_warm_up_region_is_only_normalized() {
        let mut samples = drifting_sine(1_000);
        let remover = DriftRemover::new(100, WarmUp::Uncorrected).unwrap();
        let state = remover.integrate(&mut samples);
        let integrated = samples.clone();
        let onset = remover.normalize(&mut samples, &state).unwrap();
        assert_eq!(onset, Some(101));
        for idx in 0..=100 {
            let expected = f64::from(integrated[idx]) / state.max_running_sum;
            assert!((f64::from(samples[idx]) - expected).abs() < 1e-6);
        }
    }

    #[test]
    fn test_partial_window_has_no_onset() {
        let mut samples = drifting_sine(1_000);
        let remover = DriftRemover::new(100, WarmUp::PartialWindow).unwrap();
        let report = remover.remove(&mut samples).unwrap();
        assert_eq!(report.correction_onset, None);
        // nothing precedes position 0
        let state = report.integrator;
        let first = 0.25 / state.max_running_sum;
        assert!((f64::from(samples[0]) - first).abs() < 1e-6);
    }

    #[test]
    fn test_window_subtraction_reduces_ramp() {
        let window_size = DEFAULT_WINDOW_SIZE;
        let mut samples = drifting_sine(5_000);
        let remover = DriftRemover::new(window_size, WarmUp::Uncorrected).unwrap();
        let state = remover.integrate(&mut samples);
        let normalized: Vec<f64> = samples
            .iter()
            .map(|&v| f64::from(v) / state.max_running_sum)
            .collect();
        remover.normalize(&mut samples, &state).unwrap();

        let tail = window_size + 1..samples.len();
        let before: f64 = normalized[tail.clone()].iter().map(|v| v.abs()).sum();
        let after: f64 = samples[tail].iter().map(|v| f64::from(*v).abs()).sum();
        assert!(after < 0.75 * before, "before {before}, after {after}");
    }

    #[test]
    fn test_sliding_window_mean() {
        let mut window = SlidingWindow::new(3);
        assert!(window.is_empty());
        assert_eq!(window.mean(), 0.0);
        window.push(1.0);
        window.push(2.0);
        assert_eq!(window.mean(), 1.5);
        window.push(3.0);
        assert!(window.is_full());
        window.push(10.0);
        assert_eq!(window.len(), 3);
        assert_eq!(window.mean(), 5.0);
        assert_eq!(window.capacity(), 3);
    }
}
