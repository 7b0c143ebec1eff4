// SPDX-FileCopyrightText: 2026 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Error taxonomy shared by the tape decoding pipeline and its adapters.

use std::fmt;

use thiserror::Error;

/// Fatal errors. Any of these aborts the run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TapeError {
    #[error("invalid parameter {name} = {value} (must be positive and finite)")]
    InvalidParameter { name: &'static str, value: f64 },

    #[error("read {read} frames (expecting {expected})")]
    InputRead { read: usize, expected: usize },

    #[error("input of {len} samples is silent, cannot demodulate")]
    SilentInput { len: usize },

    #[error("integrated signal of {len} samples peaks at {peak}, cannot normalize")]
    DegenerateSignal { len: usize, peak: f64 },

    #[error("invalid decoder configuration: {0}")]
    Config(String),
}

/// Why a baud interval could not be classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmbiguityReason {
    /// The transition amplitude is below the dropout ratio of the local
    /// scale.
    NoTransition,
    /// The neighbourhood carries no signal at all.
    NoSignal,
    /// The interval contains NaN or infinite samples.
    NonFinite,
}

impl fmt::Display for AmbiguityReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::NoTransition => "no transition",
            Self::NoSignal => "no signal",
            Self::NonFinite => "non-finite samples",
        };
        f.write_str(text)
    }
}

/// Per-interval diagnostic. Recoverable: the interval yields a NOTHING bit
/// and decoding continues.
#[derive(Debug, Clone, PartialEq, Error)]
#[error(
    "ambiguous interval {position} (samples {start}..{end}): {reason}, amplitude {amplitude:.6}, scale {scale:.6}"
)]
pub struct AmbiguousInterval {
    pub position: usize,
    pub start: usize,
    pub end: usize,
    /// Signed transition amplitude estimated for the interval.
    pub amplitude: f64,
    /// Local reference scale the amplitude was compared against.
    pub scale: f64,
    pub reason: AmbiguityReason,
}
