//! Column descriptors and the fixed 256-byte on-disk record.
//!
//! A column's storage codec is one of minnow's group kinds: a fixed-size
//! primitive, the lossless `int_group`, or the quantized `float_group`. The
//! codec is recorded using the same codes as minnow's `group_types` table
//! (0..9 for primitives, 10 for `int_group`, 11 for `float_group`), so the
//! column descriptor and the minnow group it opens always agree.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::Cursor;

use minnow::{TypeCode, FLOAT_GROUP_CODE, INT_GROUP_CODE};

use crate::error::{MinhError, Result};

/// Size in bytes of one column descriptor record on disk.
pub const COLUMN_RECORD_SIZE: usize = 256;

/// Storage codec for one column: which minnow group kind backs it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnCodec {
    Fixed(TypeCode),
    IntGroup,
    FloatGroup,
}

impl ColumnCodec {
    pub fn code(self) -> i64 {
        match self {
            ColumnCodec::Fixed(t) => t.code(),
            ColumnCodec::IntGroup => INT_GROUP_CODE,
            ColumnCodec::FloatGroup => FLOAT_GROUP_CODE,
        }
    }

    pub fn from_code(code: i64) -> Result<Self> {
        Ok(match code {
            INT_GROUP_CODE => ColumnCodec::IntGroup,
            FLOAT_GROUP_CODE => ColumnCodec::FloatGroup,
            other => ColumnCodec::Fixed(
                TypeCode::from_code(other).map_err(|_| MinhError::UnsupportedFileType(other))?,
            ),
        })
    }
}

/// A column's type and, for `float_group` columns, its quantization grid.
///
/// `low`/`high`/`dx` are ignored for `Fixed` and `IntGroup` columns. For
/// `FloatGroup` columns, `low < high` and `dx > 0`; when `log` is set the
/// stored domain is `log10(value)` and `block()` reads apply `10^x` on the
/// way out.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnDescriptor {
    pub codec: ColumnCodec,
    pub log: bool,
    pub low: f32,
    pub high: f32,
    pub dx: f32,
}

impl ColumnDescriptor {
    pub fn fixed(type_code: TypeCode) -> Self {
        ColumnDescriptor {
            codec: ColumnCodec::Fixed(type_code),
            log: false,
            low: 0.0,
            high: 0.0,
            dx: 0.0,
        }
    }

    pub fn int_group() -> Self {
        ColumnDescriptor {
            codec: ColumnCodec::IntGroup,
            log: false,
            low: 0.0,
            high: 0.0,
            dx: 0.0,
        }
    }

    pub fn float_group(low: f32, high: f32, dx: f32, log: bool) -> Self {
        ColumnDescriptor {
            codec: ColumnCodec::FloatGroup,
            log,
            low,
            high,
            dx,
        }
    }

    /// Serialize to the fixed 256-byte on-disk record: first 24 bytes
    /// `(type i64, log i32, low f32, high f32, dx f32)`, the rest zero
    /// padding reserved for future use.
    pub fn to_bytes(&self) -> [u8; COLUMN_RECORD_SIZE] {
        let mut buf = [0u8; COLUMN_RECORD_SIZE];
        let mut cursor = Cursor::new(&mut buf[..24]);
        cursor.write_i64::<LittleEndian>(self.codec.code()).unwrap();
        cursor
            .write_i32::<LittleEndian>(self.log as i32)
            .unwrap();
        cursor.write_f32::<LittleEndian>(self.low).unwrap();
        cursor.write_f32::<LittleEndian>(self.high).unwrap();
        cursor.write_f32::<LittleEndian>(self.dx).unwrap();
        buf
    }

    /// Parse from a 256-byte record; trailing padding is ignored.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < 24 {
            return Err(MinhError::SchemaMismatch(format!(
                "column descriptor record too short: {} bytes",
                bytes.len()
            )));
        }
        let mut cursor = Cursor::new(bytes);
        let code = cursor.read_i64::<LittleEndian>()?;
        let log = cursor.read_i32::<LittleEndian>()? != 0;
        let low = cursor.read_f32::<LittleEndian>()?;
        let high = cursor.read_f32::<LittleEndian>()?;
        let dx = cursor.read_f32::<LittleEndian>()?;
        Ok(ColumnDescriptor {
            codec: ColumnCodec::from_code(code)?,
            log,
            low,
            high,
            dx,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_is_exactly_256_bytes() {
        let d = ColumnDescriptor::float_group(-50.0, 100.0, 1.0, false);
        assert_eq!(d.to_bytes().len(), COLUMN_RECORD_SIZE);
    }

    #[test]
    fn roundtrip_fixed() {
        let d = ColumnDescriptor::fixed(TypeCode::I64);
        let bytes = d.to_bytes();
        assert_eq!(ColumnDescriptor::from_bytes(&bytes).unwrap(), d);
    }

    #[test]
    fn roundtrip_int_group() {
        let d = ColumnDescriptor::int_group();
        let bytes = d.to_bytes();
        assert_eq!(ColumnDescriptor::from_bytes(&bytes).unwrap(), d);
    }

    #[test]
    fn roundtrip_float_group_log() {
        let d = ColumnDescriptor::float_group(10.0, 14.0, 0.01, true);
        let bytes = d.to_bytes();
        assert_eq!(ColumnDescriptor::from_bytes(&bytes).unwrap(), d);
    }

    #[test]
    fn padding_is_ignored_on_read() {
        let d = ColumnDescriptor::fixed(TypeCode::F32);
        let mut bytes = d.to_bytes();
        bytes[200] = 0xff;
        assert_eq!(ColumnDescriptor::from_bytes(&bytes).unwrap(), d);
    }
}
