//! ITU-T G.711 μ-law companding.
//!
//! Encoding goes through a table covering every 16-bit input value, so the
//! per-sample cost inside the capture callback is one indexed load. The
//! table is built on first use and immutable afterwards; concurrent readers
//! never need a lock.

use std::sync::OnceLock;

const BIAS: i32 = 0x84;
const CLIP: i32 = 32_635;

static ENCODE_TABLE: OnceLock<Box<[u8; 65_536]>> = OnceLock::new();

/// Map one 16-bit linear sample to its 8-bit μ-law code.
pub fn encode_mulaw(sample: i16) -> u8 {
    let table = ENCODE_TABLE.get_or_init(build_table);
    table[sample as u16 as usize]
}

fn build_table() -> Box<[u8; 65_536]> {
    let mut table = Box::new([0u8; 65_536]);
    for value in 0..=u16::MAX {
        table[usize::from(value)] = encode_one(value as i16);
    }
    table
}

fn encode_one(sample: i16) -> u8 {
    let sign: u8 = if sample < 0 { 0x80 } else { 0x00 };
    let mut magnitude = i32::from(sample).abs();
    if magnitude > CLIP {
        magnitude = CLIP;
    }
    magnitude += BIAS;

    // Exponent is the position of the highest set bit within the segmented
    // range; the mantissa is the four bits directly below it.
    let mut exponent: u8 = 7;
    let mut mask = 0x4000;
    while exponent > 0 && magnitude & mask == 0 {
        exponent -= 1;
        mask >>= 1;
    }
    let mantissa = ((magnitude >> (exponent + 3)) & 0x0F) as u8;
    !(sign | (exponent << 4) | mantissa)
}

/// Standard μ-law expansion, used to bound quantization error in tests.
#[cfg(test)]
pub(super) fn decode_mulaw(code: u8) -> i16 {
    let code = !code;
    let sign = code & 0x80;
    let exponent = (code >> 4) & 0x07;
    let mantissa = code & 0x0F;
    let magnitude = ((i32::from(mantissa) << 3) + BIAS) << exponent;
    let value = magnitude - BIAS;
    if sign != 0 {
        -value as i16
    } else {
        value as i16
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_encodes_to_0xff() {
        assert_eq!(encode_mulaw(0), 0xFF);
        assert_eq!(decode_mulaw(0xFF), 0);
    }

    #[test]
    fn positive_full_scale_encodes_to_0x80() {
        assert_eq!(encode_mulaw(32_767), 0x80);
    }

    #[test]
    fn negative_full_scale_encodes_to_0x00() {
        assert_eq!(encode_mulaw(i16::MIN), 0x00);
    }

    #[test]
    fn values_beyond_clip_share_a_code() {
        assert_eq!(encode_mulaw(32_767), encode_mulaw(CLIP as i16));
        assert_eq!(encode_mulaw(-32_700), encode_mulaw(-(CLIP as i16)));
    }

    #[test]
    fn round_trip_error_stays_within_segment_step() {
        // Quantization error is bounded by the step of the segment the
        // sample lands in: 8 at the bottom, 1024 at the top.
        for raw in (-32_768..=32_767_i32).step_by(37) {
            let sample = raw as i16;
            let decoded = i32::from(decode_mulaw(encode_mulaw(sample)));
            let err = (decoded - i32::from(sample)).abs();
            let bound = i32::from(sample.unsigned_abs()) / 8 + 16;
            assert!(
                err <= bound,
                "sample {sample}: decoded {decoded}, err {err} > bound {bound}"
            );
        }
    }

    #[test]
    fn encoding_is_sign_symmetric() {
        for &sample in &[100_i16, 1_000, 5_000, 20_000] {
            let pos = i32::from(decode_mulaw(encode_mulaw(sample)));
            let neg = i32::from(decode_mulaw(encode_mulaw(-sample)));
            assert_eq!(pos, -neg);
        }
    }

    #[test]
    fn low_amplitude_relative_error_is_small() {
        for &sample in &[500_i16, 1_000, 2_000, 4_000] {
            let decoded = f64::from(decode_mulaw(encode_mulaw(sample)));
            let relative = (decoded - f64::from(sample)).abs() / f64::from(sample);
            assert!(relative < 0.04, "sample {sample}: relative error {relative}");
        }
    }
}
