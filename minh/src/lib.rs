//! minh — a columnar schema of named, typed columns split into row-range
//! blocks, layered on top of the [`minnow`] container.
//!
//! A minh file declares a schema once (text blob, `$`-joined column names,
//! fixed 256-byte column descriptor records), then accumulates zero or
//! more row-range blocks, one minnow block per declared column per block.
//! Float columns may be stored through a lossy, bounded quantization grid
//! (`minnow::float_group`), optionally in log space. A periodic 3-D box
//! geometry (`L`, `boundary`, `cells`) rides along as trailing metadata for
//! callers that carve the box into spatial cells.
//!
//! # Example
//!
//! ```no_run
//! use minh::{MinhWriter, MinhReader, ColumnDescriptor};
//! use minnow::{Payload, TypeCode};
//!
//! fn main() -> minh::Result<()> {
//!     let mut w = MinhWriter::create("catalog.minh")?;
//!     w.header(
//!         &["id".to_string(), "mass".to_string()],
//!         b"demo catalog",
//!         vec![
//!             ColumnDescriptor::fixed(TypeCode::I64),
//!             ColumnDescriptor::float_group(10.0, 14.0, 0.01, true),
//!         ],
//!     )?;
//!     w.block(vec![
//!         Payload::I64(vec![1, 2, 3]),
//!         Payload::F32(vec![1e11, 5e12, 9e13]),
//!     ])?;
//!     w.close()?;
//!
//!     let mut r = MinhReader::open("catalog.minh")?;
//!     let cols = r.read(&["id", "mass"])?;
//!     assert_eq!(cols[0], Payload::I64(vec![1, 2, 3]));
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod geometry;
pub mod reader;
pub mod schema;
pub mod writer;

pub use error::{MinhError, Result};
pub use geometry::Geometry;
pub use reader::{open, MinhReader};
pub use schema::{ColumnCodec, ColumnDescriptor, COLUMN_RECORD_SIZE};
pub use writer::{create, MinhWriter};

/// Fixed header magic, `0xbaff1ed`.
pub const MAGIC: i64 = 0xbaff1ed;

/// Fixed header version.
pub const VERSION: i64 = 0;

/// Identifies the block-index mapping a minh file uses.
///
/// `Basic` (code 0) is the only file type this crate's writer produces:
/// `minnow_block_index = b * ncols + c`. `Boundary` (code 1) is recognized
/// by the reader (`b + c * blocks`) but reserved — no writer in this crate
/// emits it, per spec.md's Design Notes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    Basic = 0,
    Boundary = 1,
}

impl FileType {
    pub fn code(self) -> i64 {
        self as i64
    }

    pub fn from_code(code: i64) -> Result<Self> {
        match code {
            0 => Ok(FileType::Basic),
            1 => Ok(FileType::Boundary),
            other => Err(MinhError::UnsupportedFileType(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use minnow::{Payload, TypeCode};
    use std::io::Cursor;

    fn build(
        f: impl FnOnce(&mut MinhWriter<Cursor<Vec<u8>>>) -> Result<()>,
    ) -> MinhReader<Cursor<Vec<u8>>> {
        let mut w = MinhWriter::new(Cursor::new(Vec::new())).unwrap();
        f(&mut w).unwrap();
        let cursor = w.close().unwrap();
        MinhReader::new(Cursor::new(cursor.into_inner())).unwrap()
    }

    // spec.md §8 scenario 5: minh reader/writer.
    #[test]
    fn scenario_minh_reader_writer() {
        let names: Vec<String> = ["id", "mass", "tag", "temp", "luminosity"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let cols = vec![
            ColumnDescriptor::fixed(TypeCode::I64),
            ColumnDescriptor::fixed(TypeCode::F32),
            ColumnDescriptor::int_group(),
            ColumnDescriptor::float_group(100.0, 200.0, 1.0, false),
            ColumnDescriptor::float_group(10.0, 14.0, 0.01, true),
        ];

        let block0_id = vec![1i64, 2, 3, 4, 5];
        let block0_mass = vec![1.5f32, 2.5, 3.5, 4.5, 5.5];
        let block0_tag = vec![10i64, 20, 30, 40, 50];
        let block0_temp = vec![100.0f32, 150.0, 199.0, 120.5, 175.25];
        let block0_lum = vec![1e11f32, 2e12, 3e13, 4e10, 5e13];

        let block1_id = vec![6i64, 7, 8];
        let block1_mass = vec![6.5f32, 7.5, 8.5];
        let block1_tag = vec![60i64, 70, 80];
        let block1_temp = vec![110.0f32, 140.0, 190.0];
        let block1_lum = vec![6e11f32, 7e12, 8e13];

        let mut r = build(|w| {
            w.header(&names, b"test catalog", cols.clone())?;
            w.geometry(125.0, 5.0, 5);
            w.block(vec![
                Payload::I64(block0_id.clone()),
                Payload::F32(block0_mass.clone()),
                Payload::I64(block0_tag.clone()),
                Payload::F32(block0_temp.clone()),
                Payload::F32(block0_lum.clone()),
            ])?;
            w.block(vec![
                Payload::I64(block1_id.clone()),
                Payload::F32(block1_mass.clone()),
                Payload::I64(block1_tag.clone()),
                Payload::F32(block1_temp.clone()),
                Payload::F32(block1_lum.clone()),
            ])?;
            Ok(())
        });

        assert_eq!(r.names(), names.as_slice());
        assert_eq!(r.blocks(), 2);
        assert_eq!(r.len(), 8);
        assert!(r.is_boundary());
        assert_eq!(r.text(), b"test catalog");

        let b0 = r.block(0, &["id", "mass", "tag", "temp", "luminosity"]).unwrap();
        assert_eq!(b0[0], Payload::I64(block0_id.clone()));
        let Payload::F32(mass0) = &b0[1] else {
            panic!("expected F32")
        };
        for (g, e) in mass0.iter().zip(&block0_mass) {
            assert!((g - e).abs() < 1e-6);
        }
        assert_eq!(b0[2], Payload::I64(block0_tag.clone()));
        let Payload::F32(temp0) = &b0[3] else {
            panic!("expected F32")
        };
        for (g, e) in temp0.iter().zip(&block0_temp) {
            assert!((g - e).abs() <= 1.0);
        }
        let Payload::F32(lum0) = &b0[4] else {
            panic!("expected F32")
        };
        for (g, e) in lum0.iter().zip(&block0_lum) {
            assert!(((g / e).log10()).abs() <= 0.01, "g={g} e={e}");
        }

        let full = r.read(&["id", "temp"]).unwrap();
        let Payload::I64(ids) = &full[0] else {
            panic!("expected I64")
        };
        let mut expected_ids = block0_id.clone();
        expected_ids.extend(block1_id.clone());
        assert_eq!(ids, &expected_ids);

        let geom = r.geometry();
        assert_eq!(geom.l, 125.0);
        assert_eq!(geom.boundary, 5.0);
        assert_eq!(geom.cells, 5);
        assert_eq!(geom.cell_width(), 25.0);
    }

    #[test]
    fn schema_mismatch_on_wrong_column_count() {
        let mut w = MinhWriter::new(Cursor::new(Vec::new())).unwrap();
        w.header(
            &["a".to_string()],
            b"",
            vec![ColumnDescriptor::fixed(TypeCode::I64)],
        )
        .unwrap();
        let err = w
            .block(vec![
                Payload::I64(vec![1]),
                Payload::I64(vec![2]),
            ])
            .unwrap_err();
        assert!(matches!(err, MinhError::SchemaMismatch(_)));
    }

    #[test]
    fn unknown_column_name_errors() {
        let mut r = build(|w| {
            w.header(
                &["a".to_string()],
                b"",
                vec![ColumnDescriptor::fixed(TypeCode::I64)],
            )?;
            w.block(vec![Payload::I64(vec![1, 2])])?;
            Ok(())
        });
        let err = r.block(0, &["nonexistent"]).unwrap_err();
        assert!(matches!(err, MinhError::ColumnNotFound(_)));
    }

    #[test]
    fn log_column_rejects_non_positive_values() {
        let mut w = MinhWriter::new(Cursor::new(Vec::new())).unwrap();
        w.header(
            &["lum".to_string()],
            b"",
            vec![ColumnDescriptor::float_group(10.0, 14.0, 0.01, true)],
        )
        .unwrap();
        let err = w.block(vec![Payload::F32(vec![0.0, 1e11])]).unwrap_err();
        assert!(matches!(err, MinhError::Minnow(minnow::MinnowError::Domain(_))));
    }
}
