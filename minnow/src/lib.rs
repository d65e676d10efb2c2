//! minnow — a self-describing, block-structured binary container for
//! typed numeric arrays.
//!
//! A minnow file is a fixed 48-byte header, a payload region of
//! codec-grouped blocks interleaved with opaque header blobs, and a footer
//! carrying the index tables and per-group tail records needed for random
//! access without streaming the whole file.
//!
//! Three block codecs are supported: fixed-size primitives (`I64`..`F32`),
//! a lossless bit-packed integer codec (`int_group`), and a quantized float
//! codec (`float_group`). See [`group::Group`] for the dispatch and the
//! sibling `bitpack` crate for the underlying bit-packing.
//!
//! # Example
//!
//! ```no_run
//! use minnow::{MinnowWriter, MinnowReader, Payload, TypeCode};
//!
//! fn main() -> minnow::Result<()> {
//!     let mut w = MinnowWriter::create("out.minnow")?;
//!     w.header(b"demo")?;
//!     w.fixed_size_group(TypeCode::I64, 4)?;
//!     w.data(Payload::I64(vec![1, 2, 3, 4]))?;
//!     w.close()?;
//!
//!     let mut r = MinnowReader::open("out.minnow")?;
//!     assert_eq!(r.data(0)?, Payload::I64(vec![1, 2, 3, 4]));
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod float_group;
pub mod format;
pub mod group;
pub mod int_group;
pub mod reader;
pub mod writer;

pub use error::{MinnowError, Result};
pub use format::{
    FixedHeader, Payload, TypeCode, FIXED_HEADER_SIZE, FLOAT_GROUP_CODE, INT_GROUP_CODE, MAGIC,
    VERSION,
};
pub use group::Group;
pub use reader::{open, MinnowReader};
pub use writer::{create, MinnowWriter};

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn build(
        f: impl FnOnce(&mut MinnowWriter<Cursor<Vec<u8>>>) -> Result<()>,
    ) -> MinnowReader<Cursor<Vec<u8>>> {
        let mut w = MinnowWriter::new(Cursor::new(Vec::new())).unwrap();
        f(&mut w).unwrap();
        let cursor = w.close().unwrap();
        MinnowReader::new(Cursor::new(cursor.into_inner())).unwrap()
    }

    // spec.md §8 scenario 1: int_record.
    #[test]
    fn scenario_int_record() {
        let blocks: [&[i64]; 4] = [&[1, 2, 3, 4], &[5], &[6, 7, 8, 9], &[10, 11, 12]];
        let mut ids = Vec::new();
        let mut text_header = 0;
        let mut r = build(|w| {
            w.header(b"magic-count")?;
            for chunk in &blocks {
                w.fixed_size_group(TypeCode::I64, chunk.len())?;
                ids.push(w.data(Payload::I64(chunk.to_vec()))?);
            }
            text_header = w.header(b"hello minnow")?;
            Ok(())
        });

        assert_eq!(r.groups(), 4);
        assert_eq!(r.headers(), 2);
        assert_eq!(r.blocks(), 4);
        for (i, chunk) in blocks.iter().enumerate() {
            assert_eq!(r.data(ids[i]).unwrap(), Payload::I64(chunk.to_vec()));
        }
        assert_eq!(r.header_string(text_header).unwrap(), "hello minnow");
    }

    // spec.md §8 scenario 2: group_record.
    #[test]
    fn scenario_group_record() {
        let i32s: Vec<i32> = (0..20).collect();
        let f64s: Vec<f64> = (0..10).map(|x| x as f64 / 10.0).collect();
        let mut text_header = 0;
        let mut r = build(|w| {
            w.fixed_size_group(TypeCode::I32, 5)?;
            for chunk in i32s.chunks(5) {
                w.data(Payload::I32(chunk.to_vec()))?;
            }
            text_header = w.header(b"between groups")?;
            w.fixed_size_group(TypeCode::F64, 5)?;
            for chunk in f64s.chunks(5) {
                w.data(Payload::F64(chunk.to_vec()))?;
            }
            Ok(())
        });

        assert_eq!(r.groups(), 2);
        assert_eq!(r.blocks(), 6);
        for (b, chunk) in i32s.chunks(5).enumerate() {
            assert_eq!(r.data(b).unwrap(), Payload::I32(chunk.to_vec()));
        }
        for (k, chunk) in f64s.chunks(5).enumerate() {
            let Payload::F64(got) = r.data(4 + k).unwrap() else {
                panic!("expected F64")
            };
            for (g, e) in got.iter().zip(chunk) {
                assert!((g - e).abs() < 1e-6);
            }
        }
        assert_eq!(r.header_string(text_header).unwrap(), "between groups");
    }

    // spec.md §8 scenario 3: bit_int_record.
    #[test]
    fn scenario_bit_int_record() {
        let b0 = vec![1i64, 2, 3];
        let b1 = vec![0i64, 2047, 1024]; // needs 11 bits
        let b2 = vec![5i64, 2000, 10];
        let b3 = vec![-1_000_000_000i64, -999_999_999, -500_000_000];
        let mut r = build(|w| {
            w.int_group(3)?;
            w.data(Payload::I64(b0.clone()))?;
            w.header(b"between int groups")?;
            w.int_group(3)?;
            w.data(Payload::I64(b1.clone()))?;
            w.data(Payload::I64(b2.clone()))?;
            w.int_group(3)?;
            w.data(Payload::I64(b3.clone()))?;
            Ok(())
        });

        assert_eq!(r.data(0).unwrap(), Payload::I64(b0));
        assert_eq!(r.data(1).unwrap(), Payload::I64(b1));
        assert_eq!(r.data(2).unwrap(), Payload::I64(b2));
        assert_eq!(r.data(3).unwrap(), Payload::I64(b3));
    }

    // spec.md §8 scenario 4: q_float_record.
    #[test]
    fn scenario_q_float_record() {
        let low = -50.0f32;
        let high = 100.0f32;
        let block_a = vec![-50.0f32, 0.0, 49.5];
        let block_b = vec![10.0f32, 99.9];
        let block_c = vec![-20.0f32, 80.0];
        let block_d = vec![0.0f32, 70.0];
        let mut r = build(|w| {
            w.float_group(3, low, high, 1.0)?;
            w.data(Payload::F32(block_a.clone()))?;
            w.data(Payload::F32(block_b.clone()))?;
            w.float_group(2, low, high, 10.0)?;
            w.data(Payload::F32(block_c.clone()))?;
            w.data(Payload::F32(block_d.clone()))?;
            Ok(())
        });

        let check = |b: usize, orig: &[f32], dx: f32| {
            let Payload::F32(got) = r.data(b).unwrap() else {
                panic!("expected F32")
            };
            for (g, o) in got.iter().zip(orig) {
                assert!((g - o).abs() <= dx, "block {b}: {g} vs {o} (dx={dx})");
            }
        };
        check(0, &block_a, 1.0);
        check(1, &block_b, 1.0);
        check(2, &block_c, 10.0);
        check(3, &block_d, 10.0);
    }

    #[test]
    fn bad_magic_is_open_error() {
        let bytes = vec![0u8; 48];
        let err = MinnowReader::new(Cursor::new(bytes)).unwrap_err();
        assert!(matches!(err, MinnowError::Open));
    }

    #[test]
    fn data_without_open_group_errors() {
        let mut w = MinnowWriter::new(Cursor::new(Vec::new())).unwrap();
        let err = w.data(Payload::I64(vec![1])).unwrap_err();
        assert!(matches!(err, MinnowError::NoOpenGroup));
    }

    #[test]
    fn out_of_range_indices_error() {
        let mut r = build(|w| {
            w.header(b"only header")?;
            Ok(())
        });
        assert!(matches!(
            r.header(5).unwrap_err(),
            MinnowError::HeaderIndex(5, 1)
        ));
        assert!(matches!(
            r.data(0).unwrap_err(),
            MinnowError::BlockIndex(0, 0)
        ));
    }
}
