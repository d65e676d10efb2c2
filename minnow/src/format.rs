//! Binary format definitions for minnow containers
//!
//! A minnow file is laid out as:
//! 1. A 48-byte fixed header (magic, version, table sizes, footer offset)
//! 2. The payload region: group blocks and header blobs, interleaved in
//!    write order
//! 3. The footer: header/group index tables followed by one tail record
//!    per group, in group order
//!
//! All integers are little-endian.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Read, Write};

use crate::error::{MinnowError, Result};

/// Fixed header magic, `0xacedad`
pub const MAGIC: i64 = 0xacedad;

/// Fixed header version
pub const VERSION: i64 = 1;

/// Size in bytes of the fixed header
pub const FIXED_HEADER_SIZE: u64 = 48;

/// Fixed header: `(magic, version, groups, headers, blocks, tail_start)`,
/// each an `i64`. Written last so the writer can back-patch the real
/// counts once every group and header has been flushed.
#[derive(Debug, Clone, Copy)]
pub struct FixedHeader {
    pub magic: i64,
    pub version: i64,
    pub groups: i64,
    pub headers: i64,
    pub blocks: i64,
    pub tail_start: i64,
}

impl FixedHeader {
    pub fn read<R: Read>(r: &mut R) -> Result<Self> {
        let magic = r.read_i64::<LittleEndian>()?;
        let version = r.read_i64::<LittleEndian>()?;
        if magic != MAGIC || version != VERSION {
            return Err(MinnowError::Open);
        }
        let groups = r.read_i64::<LittleEndian>()?;
        let headers = r.read_i64::<LittleEndian>()?;
        let blocks = r.read_i64::<LittleEndian>()?;
        let tail_start = r.read_i64::<LittleEndian>()?;
        Ok(FixedHeader {
            magic,
            version,
            groups,
            headers,
            blocks,
            tail_start,
        })
    }

    pub fn write<W: Write>(&self, w: &mut W) -> Result<()> {
        w.write_i64::<LittleEndian>(self.magic)?;
        w.write_i64::<LittleEndian>(self.version)?;
        w.write_i64::<LittleEndian>(self.groups)?;
        w.write_i64::<LittleEndian>(self.headers)?;
        w.write_i64::<LittleEndian>(self.blocks)?;
        w.write_i64::<LittleEndian>(self.tail_start)?;
        Ok(())
    }
}

/// Primitive element type of a fixed-size group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i64)]
pub enum TypeCode {
    I64 = 0,
    I32 = 1,
    I16 = 2,
    I8 = 3,
    U64 = 4,
    U32 = 5,
    U16 = 6,
    U8 = 7,
    F64 = 8,
    F32 = 9,
}

/// Group codec code for an `int_group`, stored in the footer's `group_types`
pub const INT_GROUP_CODE: i64 = 10;
/// Group codec code for a `float_group`, stored in the footer's `group_types`
pub const FLOAT_GROUP_CODE: i64 = 11;

impl TypeCode {
    pub fn code(self) -> i64 {
        self as i64
    }

    pub fn from_code(code: i64) -> Result<Self> {
        Ok(match code {
            0 => TypeCode::I64,
            1 => TypeCode::I32,
            2 => TypeCode::I16,
            3 => TypeCode::I8,
            4 => TypeCode::U64,
            5 => TypeCode::U32,
            6 => TypeCode::U16,
            7 => TypeCode::U8,
            8 => TypeCode::F64,
            9 => TypeCode::F32,
            other => {
                return Err(MinnowError::CorruptTail(
                    0,
                    format!("unknown fixed-size type code {other}"),
                ))
            }
        })
    }

    /// Element size in bytes
    pub fn size(self) -> usize {
        match self {
            TypeCode::I64 | TypeCode::U64 | TypeCode::F64 => 8,
            TypeCode::I32 | TypeCode::U32 | TypeCode::F32 => 4,
            TypeCode::I16 | TypeCode::U16 => 2,
            TypeCode::I8 | TypeCode::U8 => 1,
        }
    }
}

/// Runtime-typed numeric array: the in-memory representation of one block's
/// payload at the public API boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    I64(Vec<i64>),
    I32(Vec<i32>),
    I16(Vec<i16>),
    I8(Vec<i8>),
    U64(Vec<u64>),
    U32(Vec<u32>),
    U16(Vec<u16>),
    U8(Vec<u8>),
    F64(Vec<f64>),
    F32(Vec<f32>),
}

impl Payload {
    pub fn type_code(&self) -> TypeCode {
        match self {
            Payload::I64(_) => TypeCode::I64,
            Payload::I32(_) => TypeCode::I32,
            Payload::I16(_) => TypeCode::I16,
            Payload::I8(_) => TypeCode::I8,
            Payload::U64(_) => TypeCode::U64,
            Payload::U32(_) => TypeCode::U32,
            Payload::U16(_) => TypeCode::U16,
            Payload::U8(_) => TypeCode::U8,
            Payload::F64(_) => TypeCode::F64,
            Payload::F32(_) => TypeCode::F32,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Payload::I64(v) => v.len(),
            Payload::I32(v) => v.len(),
            Payload::I16(v) => v.len(),
            Payload::I8(v) => v.len(),
            Payload::U64(v) => v.len(),
            Payload::U32(v) => v.len(),
            Payload::U16(v) => v.len(),
            Payload::U8(v) => v.len(),
            Payload::F64(v) => v.len(),
            Payload::F32(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Serialize to little-endian raw bytes, matching the fixed-size group
    /// on-disk layout.
    pub fn to_le_bytes(&self) -> Vec<u8> {
        match self {
            Payload::I64(v) => v.iter().flat_map(|x| x.to_le_bytes()).collect(),
            Payload::I32(v) => v.iter().flat_map(|x| x.to_le_bytes()).collect(),
            Payload::I16(v) => v.iter().flat_map(|x| x.to_le_bytes()).collect(),
            Payload::I8(v) => v.iter().map(|x| x.to_le_bytes()[0]).collect(),
            Payload::U64(v) => v.iter().flat_map(|x| x.to_le_bytes()).collect(),
            Payload::U32(v) => v.iter().flat_map(|x| x.to_le_bytes()).collect(),
            Payload::U16(v) => v.iter().flat_map(|x| x.to_le_bytes()).collect(),
            Payload::U8(v) => v.clone(),
            Payload::F64(v) => v.iter().flat_map(|x| x.to_le_bytes()).collect(),
            Payload::F32(v) => v.iter().flat_map(|x| x.to_le_bytes()).collect(),
        }
    }

    /// Deserialize `n` little-endian elements of `type_code` from `bytes`.
    pub fn from_le_bytes(type_code: TypeCode, bytes: &[u8], n: usize) -> Result<Self> {
        let need = type_code.size() * n;
        if bytes.len() < need {
            return Err(MinnowError::CorruptTail(
                0,
                format!("expected {need} bytes, got {}", bytes.len()),
            ));
        }
        Ok(match type_code {
            TypeCode::I64 => Payload::I64(
                bytes[..need]
                    .chunks_exact(8)
                    .map(|c| i64::from_le_bytes(c.try_into().unwrap()))
                    .collect(),
            ),
            TypeCode::I32 => Payload::I32(
                bytes[..need]
                    .chunks_exact(4)
                    .map(|c| i32::from_le_bytes(c.try_into().unwrap()))
                    .collect(),
            ),
            TypeCode::I16 => Payload::I16(
                bytes[..need]
                    .chunks_exact(2)
                    .map(|c| i16::from_le_bytes(c.try_into().unwrap()))
                    .collect(),
            ),
            TypeCode::I8 => Payload::I8(bytes[..need].iter().map(|&b| b as i8).collect()),
            TypeCode::U64 => Payload::U64(
                bytes[..need]
                    .chunks_exact(8)
                    .map(|c| u64::from_le_bytes(c.try_into().unwrap()))
                    .collect(),
            ),
            TypeCode::U32 => Payload::U32(
                bytes[..need]
                    .chunks_exact(4)
                    .map(|c| u32::from_le_bytes(c.try_into().unwrap()))
                    .collect(),
            ),
            TypeCode::U16 => Payload::U16(
                bytes[..need]
                    .chunks_exact(2)
                    .map(|c| u16::from_le_bytes(c.try_into().unwrap()))
                    .collect(),
            ),
            TypeCode::U8 => Payload::U8(bytes[..need].to_vec()),
            TypeCode::F64 => Payload::F64(
                bytes[..need]
                    .chunks_exact(8)
                    .map(|c| f64::from_le_bytes(c.try_into().unwrap()))
                    .collect(),
            ),
            TypeCode::F32 => Payload::F32(
                bytes[..need]
                    .chunks_exact(4)
                    .map(|c| f32::from_le_bytes(c.try_into().unwrap()))
                    .collect(),
            ),
        })
    }

    /// View this payload as signed 64-bit integers, widening as needed.
    /// Used by `int_group`, which always works in `i64` space.
    pub fn as_i64(&self) -> Result<Vec<i64>> {
        Ok(match self {
            Payload::I64(v) => v.clone(),
            Payload::I32(v) => v.iter().map(|&x| x as i64).collect(),
            Payload::I16(v) => v.iter().map(|&x| x as i64).collect(),
            Payload::I8(v) => v.iter().map(|&x| x as i64).collect(),
            Payload::U64(v) => v.iter().map(|&x| x as i64).collect(),
            Payload::U32(v) => v.iter().map(|&x| x as i64).collect(),
            Payload::U16(v) => v.iter().map(|&x| x as i64).collect(),
            Payload::U8(v) => v.iter().map(|&x| x as i64).collect(),
            other => {
                return Err(MinnowError::SchemaMismatch(format!(
                    "int_group requires an integer payload, got {:?}",
                    other.type_code()
                )))
            }
        })
    }

    /// View this payload as `f32`, the only type `float_group` accepts.
    pub fn as_f32(&self) -> Result<&[f32]> {
        match self {
            Payload::F32(v) => Ok(v),
            other => Err(MinnowError::SchemaMismatch(format!(
                "float_group requires f32 data, got {:?}",
                other.type_code()
            ))),
        }
    }
}
