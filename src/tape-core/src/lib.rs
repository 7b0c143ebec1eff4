// SPDX-FileCopyrightText: 2026 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

pub mod audio;
pub mod decode;
pub mod error;

pub type DynResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

pub use audio::SampleBuffer;
pub use decode::{Bit, BitValue, Confidence};
pub use error::{AmbiguityReason, AmbiguousInterval, TapeError};
