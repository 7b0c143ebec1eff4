// SPDX-FileCopyrightText: 2026 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Synthetic phase-encoded waveforms with known content.

use tape_core::BitValue;

use crate::geometry::CarrierGeometry;

/// Render `bits` as a phase-encoded carrier. ONE is recorded in phase with
/// the reference carrier, ZERO in antiphase. The result spans every baud
/// interval completely.
pub fn phase_encode(bits: &[BitValue], geometry: &CarrierGeometry, amplitude: f32) -> Vec<f32> {
    let carrier = geometry.carrier();
    let mut out = Vec::with_capacity(geometry.baud_start(bits.len()));
    for (position, bit) in bits.iter().enumerate() {
        let sign = match bit {
            BitValue::One => 1.0,
            BitValue::Zero => -1.0,
        };
        for idx in geometry.baud_start(position)..geometry.baud_start(position + 1) {
            out.push((sign * f64::from(amplitude) * carrier.value_at(idx)) as f32);
        }
    }
    out
}

/// Deterministic pseudo-random bit pattern.
pub fn pattern(len: usize, seed: u32) -> Vec<BitValue> {
    let mut state = seed.max(1);
    (0..len)
        .map(|_| {
            // xorshift32
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            if state & 1 == 1 {
                BitValue::One
            } else {
                BitValue::Zero
            }
        })
        .collect()
}
