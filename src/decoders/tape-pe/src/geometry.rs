// SPDX-FileCopyrightText: 2026 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

use tape_core::TapeError;

use crate::carrier::{CarrierPhase, CarrierReference};

/// Carrier geometry derived from tape density, transport speed and the
/// measured sample rate of the input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CarrierGeometry {
    samples_per_baud: f64,
    cycles_per_sample: f64,
    sample_rate: u32,
    carrier_phase: CarrierPhase,
}

impl CarrierGeometry {
    pub fn resolve(density_bpi: f64, speed_ips: f64, sample_rate: u32) -> Result<Self, TapeError> {
        check_positive("density_bpi", density_bpi)?;
        check_positive("speed_ips", speed_ips)?;
        if sample_rate == 0 {
            return Err(TapeError::InvalidParameter {
                name: "sample_rate",
                value: 0.0,
            });
        }
        let samples_per_baud = f64::from(sample_rate) / (density_bpi * speed_ips);
        check_positive("samples_per_baud", samples_per_baud)?;
        Ok(Self {
            samples_per_baud,
            cycles_per_sample: 1.0 / samples_per_baud,
            sample_rate,
            carrier_phase: CarrierPhase::default(),
        })
    }

    pub fn with_carrier_phase(mut self, phase: CarrierPhase) -> Self {
        self.carrier_phase = phase;
        self
    }

    pub fn samples_per_baud(&self) -> f64 {
        self.samples_per_baud
    }

    pub fn cycles_per_sample(&self) -> f64 {
        self.cycles_per_sample
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Carrier frequency in Hz.
    pub fn carrier_hz(&self) -> f64 {
        self.cycles_per_sample * f64::from(self.sample_rate)
    }

    pub fn carrier_phase(&self) -> CarrierPhase {
        self.carrier_phase
    }

    pub fn carrier(&self) -> CarrierReference {
        CarrierReference::new(self.cycles_per_sample).with_phase(self.carrier_phase)
    }

    /// Fewer than two samples per carrier cycle: the carrier lies above the
    /// Nyquist frequency and cannot be resolved.
    pub fn is_undersampled(&self) -> bool {
        self.cycles_per_sample > 0.5
    }

    /// Number of complete baud intervals in `len` samples.
    pub fn baud_count(&self, len: usize) -> usize {
        let mut count = (len as f64 / self.samples_per_baud).floor() as usize;
        // guard against the float quotient landing one past the last full interval
        while count > 0 && self.baud_start(count) > len {
            count -= 1;
        }
        count
    }

    /// First sample index of baud interval `position`.
    pub fn baud_start(&self, position: usize) -> usize {
        (position as f64 * self.samples_per_baud).ceil() as usize
    }
}

fn check_positive(name: &'static str, value: f64) -> Result<(), TapeError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(TapeError::InvalidParameter { name, value })
    }
}
