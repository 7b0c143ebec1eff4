// SPDX-FileCopyrightText: 2026 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Sample buffer handed from the input adapter to the decoding pipeline.
//!
//! The buffer length is fixed at acquisition. Pipeline stages rewrite values
//! positionally through [`SampleBuffer::samples_mut`] but can never resize it.

use crate::error::TapeError;

#[derive(Debug, Clone, PartialEq)]
pub struct SampleBuffer {
    samples: Vec<f32>,
    sample_rate: u32,
}

impl SampleBuffer {
    /// Wrap samples read from an input whose header declared
    /// `declared_frames` frames at `sample_rate`.
    ///
    /// Fails with [`TapeError::InputRead`] when fewer (or more) frames were
    /// read than declared, and with [`TapeError::InvalidParameter`] for a
    /// zero sample rate.
    pub fn acquire(
        samples: Vec<f32>,
        declared_frames: usize,
        sample_rate: u32,
    ) -> Result<Self, TapeError> {
        if samples.len() != declared_frames {
            return Err(TapeError::InputRead {
                read: samples.len(),
                expected: declared_frames,
            });
        }
        Self::new(samples, sample_rate)
    }

    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Result<Self, TapeError> {
        if sample_rate == 0 {
            return Err(TapeError::InvalidParameter {
                name: "sample_rate",
                value: 0.0,
            });
        }
        Ok(Self {
            samples,
            sample_rate,
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn samples_mut(&mut self) -> &mut [f32] {
        &mut self.samples
    }
}

/// Average interleaved frames down to one channel.
pub fn mix_to_mono(interleaved: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return interleaved.to_vec();
    }
    interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acquire_rejects_short_read() {
        let err = SampleBuffer::acquire(vec![0.5; 90], 100, 48_000).unwrap_err();
        assert_eq!(
            err,
            TapeError::InputRead {
                read: 90,
                expected: 100
            }
        );
    }

    #[test]
    fn test_acquire_rejects_zero_rate() {
        let err = SampleBuffer::acquire(vec![0.5; 4], 4, 0).unwrap_err();
        assert!(matches!(
            err,
            TapeError::InvalidParameter {
                name: "sample_rate",
                ..
            }
        ));
    }

    #[test]
    fn test_samples_mut_keeps_length() {
        let mut buffer = SampleBuffer::acquire(vec![1.0, 2.0, 3.0], 3, 44_100).unwrap();
        for sample in buffer.samples_mut() {
            *sample *= 2.0;
        }
        assert_eq!(buffer.len(), 3);
        assert_eq!(buffer.samples(), &[2.0, 4.0, 6.0]);
        assert_eq!(buffer.sample_rate(), 44_100);
    }

    #[test]
    fn test_mix_to_mono() {
        let stereo = [1.0, 3.0, -1.0, 1.0, 0.5, 0.5];
        assert_eq!(mix_to_mono(&stereo, 2), vec![2.0, 0.0, 0.5]);
        assert_eq!(mix_to_mono(&[0.1, 0.2], 1), vec![0.1, 0.2]);
    }
}
