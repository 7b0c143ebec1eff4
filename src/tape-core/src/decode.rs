// SPDX-FileCopyrightText: 2026 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Shared types for discriminated bits.

use serde::{Deserialize, Serialize};

pub const BIT_ZERO: u8 = 0;
pub const BIT_ONE: u8 = 1;
pub const BIT_UNKNOWN: u8 = 0;
pub const BIT_KNOWN: u8 = 2;
pub const BIT_NOTHING: u8 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BitValue {
    Zero,
    One,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    /// Unambiguous, above-threshold transition.
    Known,
    /// Transition present but weak.
    Unknown,
    /// No transition detected (gap or dropout).
    Nothing,
}

/// One classified baud interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bit {
    /// Baud index
    pub position: usize,
    /// Polarity guess. Meaningless when `confidence` is `Nothing`.
    pub value: BitValue,
    pub confidence: Confidence,
}

impl Bit {
    /// Or-able flag byte: `BIT_ONE | BIT_KNOWN | BIT_NOTHING`.
    pub fn flags(&self) -> u8 {
        let value = match self.value {
            BitValue::Zero => BIT_ZERO,
            BitValue::One => BIT_ONE,
        };
        let confidence = match self.confidence {
            Confidence::Known => BIT_KNOWN,
            Confidence::Unknown => BIT_UNKNOWN,
            Confidence::Nothing => BIT_NOTHING,
        };
        value | confidence
    }

    /// Single character rendering used by the text dump.
    pub fn symbol(&self) -> char {
        match (self.confidence, self.value) {
            (Confidence::Known, BitValue::One) => '1',
            (Confidence::Known, BitValue::Zero) => '0',
            (Confidence::Unknown, BitValue::One) => 'i',
            (Confidence::Unknown, BitValue::Zero) => 'o',
            (Confidence::Nothing, _) => '.',
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bit(value: BitValue, confidence: Confidence) -> Bit {
        Bit {
            position: 0,
            value,
            confidence,
        }
    }

    #[test]
    fn test_flags_match_legacy_encoding() {
        assert_eq!(bit(BitValue::One, Confidence::Known).flags(), 3);
        assert_eq!(bit(BitValue::Zero, Confidence::Known).flags(), 2);
        assert_eq!(bit(BitValue::One, Confidence::Unknown).flags(), 1);
        assert_eq!(bit(BitValue::Zero, Confidence::Nothing).flags(), 4);
    }

    #[test]
    fn test_symbols() {
        assert_eq!(bit(BitValue::One, Confidence::Known).symbol(), '1');
        assert_eq!(bit(BitValue::Zero, Confidence::Unknown).symbol(), 'o');
        assert_eq!(bit(BitValue::One, Confidence::Nothing).symbol(), '.');
    }

    #[test]
    fn test_serde_lowercase() {
        let json = serde_json::to_string(&Bit {
            position: 3,
            value: BitValue::One,
            confidence: Confidence::Unknown,
        })
        .unwrap();
        assert_eq!(json, r#"{"position":3,"value":"one","confidence":"unknown"}"#);
    }
}
