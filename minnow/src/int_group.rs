//! `int_group`: lossless bit-packed integer codec.
//!
//! Each block auto-sizes its bit width against the observed min/max of that
//! block alone (or, with `periodic` enabled, against the wrap-aware minimum
//! of a ring of circumference `pixels`). Reconstruction is exact.

use crate::error::{MinnowError, Result};

/// Per-block tail record: `(length, min, w, payload_bytes)`
#[derive(Debug, Clone, Copy)]
pub struct IntBlockTail {
    pub length: i64,
    pub min: i64,
    pub w: u8,
    pub payload_bytes: i64,
}

/// Encode one block. `pixels` is `Some` when the group opted into
/// periodic-minimum semantics for wrap-around coordinates.
pub fn encode_block(xs: &[i64], pixels: Option<i64>) -> Result<(IntBlockTail, Vec<u8>)> {
    if xs.is_empty() {
        return Ok((
            IntBlockTail {
                length: 0,
                min: 0,
                w: 0,
                payload_bytes: 0,
            },
            Vec::new(),
        ));
    }

    let deltas: Vec<u64>;
    let min: i64;
    match pixels {
        Some(p) => {
            min = bitpack::periodic_min(xs, p);
            deltas = xs.iter().map(|&x| (x - min).rem_euclid(p) as u64).collect();
        }
        None => {
            min = *xs.iter().min().unwrap();
            let max = *xs.iter().max().unwrap();
            max.checked_sub(min).ok_or_else(|| {
                MinnowError::Domain(
                    "int_group block exceeds 64-bit range after min subtraction".into(),
                )
            })?;
            deltas = xs.iter().map(|&x| (x - min) as u64).collect();
        }
    }

    let max_delta = deltas.iter().copied().max().unwrap_or(0);
    let w = bitpack::precision_needed(max_delta);
    let packed = bitpack::pack(w, &deltas);

    Ok((
        IntBlockTail {
            length: xs.len() as i64,
            min,
            w: w as u8,
            payload_bytes: packed.len() as i64,
        },
        packed,
    ))
}

/// Decode one block given its tail record and raw payload bytes.
pub fn decode_block(bytes: &[u8], tail: &IntBlockTail) -> Vec<i64> {
    let unpacked = bitpack::unpack(bytes, tail.w as u32, tail.length as usize);
    unpacked.into_iter().map(|v| tail.min + v as i64).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lossless_roundtrip() {
        let xs = vec![100i64, 101, 102, 104];
        let (tail, bytes) = encode_block(&xs, None).unwrap();
        assert_eq!(tail.length, 4);
        assert_eq!(tail.min, 100);
        let decoded = decode_block(&bytes, &tail);
        assert_eq!(decoded, xs);
    }

    #[test]
    fn lossless_roundtrip_negative() {
        let xs = vec![-1_000_000i64, -500_000];
        let (tail, bytes) = encode_block(&xs, None).unwrap();
        let decoded = decode_block(&bytes, &tail);
        assert_eq!(decoded, xs);
    }

    #[test]
    fn periodic_roundtrip() {
        let xs = vec![18i64, 19, 0, 1];
        let (tail, bytes) = encode_block(&xs, Some(20)).unwrap();
        assert_eq!(tail.min, 18);
        let decoded = decode_block(&bytes, &tail);
        // Decoding must recover (x - min) mod pixels + min, which for these
        // inputs is the identity since every value is already within one
        // wrap of `min`.
        let rewrapped: Vec<i64> = xs
            .iter()
            .map(|&x| tail.min + (x - tail.min).rem_euclid(20))
            .collect();
        assert_eq!(decoded, rewrapped);
    }

    #[test]
    fn empty_block() {
        let (tail, bytes) = encode_block(&[], None).unwrap();
        assert_eq!(tail.length, 0);
        assert!(bytes.is_empty());
        assert!(decode_block(&bytes, &tail).is_empty());
    }

    #[test]
    fn wide_block_needs_11_bits() {
        let xs = vec![1024i64, 1024, 1024];
        let (tail, bytes) = encode_block(&xs, None).unwrap();
        assert_eq!(tail.w, 0); // all equal -> range 0 -> w=0
        assert_eq!(decode_block(&bytes, &tail), xs);

        let xs2 = vec![0i64, 1023, 500];
        let (tail2, bytes2) = encode_block(&xs2, None).unwrap();
        assert_eq!(tail2.w, 10); // precision_needed(1023) = 10
        assert_eq!(decode_block(&bytes2, &tail2), xs2);
    }
}
