//! `float_group`: quantized float codec.
//!
//! Maps bounded `f32` values onto a fixed-step grid of `nbins` bins between
//! `low` and `high`, then bit-packs the bin indices. Decoding reconstructs
//! the bin's midpoint, guaranteeing `|decoded - original| <= dx`.

use crate::error::{MinnowError, Result};

/// Per-block tail record: `(length, payload_bytes)`. `low`/`high`/`dx` and
/// the derived bit width live once on the owning group, not per block.
#[derive(Debug, Clone, Copy)]
pub struct FloatBlockTail {
    pub length: i64,
    pub payload_bytes: i64,
}

/// Number of quantization bins for a `(low, high, dx)` triple.
pub fn nbins(low: f32, high: f32, dx: f32) -> i64 {
    (((high - low) / dx).ceil() as i64).max(1)
}

/// Bit width needed to represent any bin index `0..nbins`.
pub fn width(low: f32, high: f32, dx: f32) -> u32 {
    let n = nbins(low, high, dx);
    bitpack::precision_needed((n - 1).max(0) as u64)
}

/// One ULP below `x`, used to clamp values `>= high` strictly inside the
/// quantization domain (the `nextafter(high, -inf)` step from spec.md).
fn ulp_below(x: f32) -> f32 {
    if !x.is_finite() {
        return x;
    }
    let bits = x.to_bits();
    let next_bits = if x > 0.0 {
        bits - 1
    } else if x < 0.0 {
        bits + 1
    } else {
        // Just below positive zero is the largest negative subnormal.
        0x8000_0001
    };
    f32::from_bits(next_bits)
}

/// Clamp and quantize one value to a bin index in `0..nbins`.
fn quantize_one(v: f32, low: f32, high: f32, dx: f32, nbins: i64) -> Result<u64> {
    if !v.is_finite() {
        return Err(MinnowError::Domain(format!(
            "float_group value {v} is not finite"
        )));
    }
    let clamped = if v >= high {
        ulp_below(high)
    } else if v < low {
        low
    } else {
        v
    };
    let bin = ((clamped - low) / dx).floor() as i64;
    let bin = bin.clamp(0, nbins - 1);
    Ok(bin as u64)
}

/// Encode one block of already-log-transformed (if applicable) `f32` values.
/// Returns the bit width used and the packed bytes; `nbins`/`w` are derived
/// from `(low, high, dx)` by both writer and reader, so they are not
/// persisted per block.
pub fn encode_block(xs: &[f32], low: f32, high: f32, dx: f32) -> Result<Vec<u8>> {
    let n = nbins(low, high, dx);
    let w = bitpack::precision_needed((n - 1).max(0) as u64);
    let mut bins = Vec::with_capacity(xs.len());
    for &v in xs {
        bins.push(quantize_one(v, low, high, dx, n)?);
    }
    Ok(bitpack::pack(w, &bins))
}

/// Decode one block given the group's `(low, high, dx)` parameters and block
/// length. Reconstructs the bin midpoint.
pub fn decode_block(bytes: &[u8], low: f32, high: f32, dx: f32, length: usize) -> Vec<f32> {
    let w = width(low, high, dx);
    let bins = bitpack::unpack(bytes, w, length);
    bins.iter()
        .map(|&b| (low as f64 + (b as f64 + 0.5) * dx as f64) as f32)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantize_within_tolerance() {
        let low = -50.0f32;
        let high = 100.0f32;
        for dx in [1.0f32, 10.0] {
            let xs: Vec<f32> = vec![-50.0, 0.0, 50.0, 49.0, 25.0, 99.9];
            let bytes = encode_block(&xs, low, high, dx).unwrap();
            let decoded = decode_block(&bytes, low, high, dx, xs.len());
            for (o, d) in xs.iter().zip(decoded.iter()) {
                assert!(
                    (o - d).abs() <= dx,
                    "orig={o} decoded={d} dx={dx} diff={}",
                    (o - d).abs()
                );
            }
        }
    }

    #[test]
    fn values_at_or_above_high_are_clamped() {
        let low = -50.0f32;
        let high = 100.0f32;
        let dx = 1.0f32;
        let bytes = encode_block(&[100.0, 150.0], low, high, dx).unwrap();
        let decoded = decode_block(&bytes, low, high, dx, 2);
        for d in decoded {
            assert!(d < high);
        }
    }

    #[test]
    fn non_finite_is_domain_error() {
        let err = encode_block(&[f32::NAN], 0.0, 1.0, 0.1);
        assert!(matches!(err, Err(MinnowError::Domain(_))));
        let err = encode_block(&[f32::INFINITY], 0.0, 1.0, 0.1);
        assert!(matches!(err, Err(MinnowError::Domain(_))));
    }

    #[test]
    fn nbins_and_width_match_spec_formula() {
        assert_eq!(nbins(-50.0, 100.0, 1.0), 150);
        assert_eq!(width(-50.0, 100.0, 1.0), bitpack::precision_needed(149));
        assert_eq!(nbins(-50.0, 100.0, 10.0), 15);
    }
}
