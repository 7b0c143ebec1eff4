// SPDX-FileCopyrightText: 2026 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

use std::f64::consts::TAU;

use serde::{Deserialize, Serialize};

/// Phase argument of the reference sinusoid at sample `i`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CarrierPhase {
    /// `sin(2π · cycles_per_sample · i)`: one carrier cycle per baud.
    #[default]
    Cycles,
    /// `sin(cycles_per_sample · i / 2π)`. Advances 4π² times slower than
    /// the carrier it models.
    Literal,
}

/// Expected phase carrier, zero phase at sample 0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CarrierReference {
    cycles_per_sample: f64,
    phase: CarrierPhase,
}

impl CarrierReference {
    pub fn new(cycles_per_sample: f64) -> Self {
        Self {
            cycles_per_sample,
            phase: CarrierPhase::default(),
        }
    }

    pub fn with_phase(mut self, phase: CarrierPhase) -> Self {
        self.phase = phase;
        self
    }

    pub fn cycles_per_sample(&self) -> f64 {
        self.cycles_per_sample
    }

    pub fn phase(&self) -> CarrierPhase {
        self.phase
    }

    #[inline]
    pub fn value_at(&self, index: usize) -> f64 {
        match self.phase {
            CarrierPhase::Cycles => {
                // wrap to one cycle first so phase precision does not decay with index
                let cycles = (self.cycles_per_sample * index as f64).fract();
                (TAU * cycles).sin()
            }
            CarrierPhase::Literal => (self.cycles_per_sample * index as f64 / TAU).sin(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        (0..).map(move |index| self.value_at(index))
    }
}
