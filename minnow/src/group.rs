//! Group dispatch: one variant per codec family, sharing the capability to
//! report block offsets, write/read a footer tail record, and encode/decode
//! one block — matched by hand rather than expressed as a `dyn` trait, the
//! way `format.rs` elsewhere in this codebase dispatches on a plain enum.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Read, Write};

use crate::error::{MinnowError, Result};
use crate::float_group::{self, FloatBlockTail};
use crate::int_group::{self, IntBlockTail};
use crate::format::{Payload, TypeCode, FLOAT_GROUP_CODE, INT_GROUP_CODE};

/// A run of equal-size blocks of one primitive type.
#[derive(Debug, Clone)]
pub struct FixedGroup {
    pub type_code: TypeCode,
    pub n: usize,
    pub start_block: usize,
    pub block_count: usize,
}

/// A run of bit-packed integer blocks.
#[derive(Debug, Clone)]
pub struct IntGroupState {
    pub start_block: usize,
    pub tails: Vec<IntBlockTail>,
    /// `Some(pixels)` when blocks are encoded against a periodic minimum.
    /// Only meaningful while writing; decoding never needs to know.
    pub periodic: Option<i64>,
}

/// A run of quantized float blocks sharing one `(low, high, dx)` grid.
#[derive(Debug, Clone)]
pub struct FloatGroupState {
    pub start_block: usize,
    pub low: f32,
    pub high: f32,
    pub dx: f32,
    pub tails: Vec<FloatBlockTail>,
}

/// One group of a minnow container.
#[derive(Debug, Clone)]
pub enum Group {
    Fixed(FixedGroup),
    Int(IntGroupState),
    Float(FloatGroupState),
}

impl Group {
    pub fn group_code(&self) -> i64 {
        match self {
            Group::Fixed(g) => g.type_code.code(),
            Group::Int(_) => INT_GROUP_CODE,
            Group::Float(_) => FLOAT_GROUP_CODE,
        }
    }

    pub fn start_block(&self) -> usize {
        match self {
            Group::Fixed(g) => g.start_block,
            Group::Int(g) => g.start_block,
            Group::Float(g) => g.start_block,
        }
    }

    pub fn block_count(&self) -> usize {
        match self {
            Group::Fixed(g) => g.block_count,
            Group::Int(g) => g.tails.len(),
            Group::Float(g) => g.tails.len(),
        }
    }

    /// Runtime type of values this group yields on `data()`, regardless of
    /// how they are stored on disk.
    pub fn data_type(&self) -> TypeCode {
        match self {
            Group::Fixed(g) => g.type_code,
            Group::Int(_) => TypeCode::I64,
            Group::Float(_) => TypeCode::F32,
        }
    }

    /// Encode one more block into this (currently open) group, returning the
    /// raw bytes to append to the payload stream. Updates the group's own
    /// bookkeeping (block count / per-block tail).
    pub fn push_block(&mut self, payload: &Payload) -> Result<Vec<u8>> {
        match self {
            Group::Fixed(g) => {
                if payload.type_code() != g.type_code || payload.len() != g.n {
                    return Err(MinnowError::SchemaMismatch(format!(
                        "fixed_size_group expects {:?}[{}], got {:?}[{}]",
                        g.type_code,
                        g.n,
                        payload.type_code(),
                        payload.len()
                    )));
                }
                g.block_count += 1;
                Ok(payload.to_le_bytes())
            }
            Group::Int(g) => {
                let xs = payload.as_i64()?;
                let (tail, bytes) = int_group::encode_block(&xs, g.periodic)?;
                g.tails.push(tail);
                Ok(bytes)
            }
            Group::Float(g) => {
                let xs = payload.as_f32()?;
                let bytes = float_group::encode_block(xs, g.low, g.high, g.dx)?;
                g.tails.push(FloatBlockTail {
                    length: xs.len() as i64,
                    payload_bytes: bytes.len() as i64,
                });
                Ok(bytes)
            }
        }
    }

    /// Byte offset of block `local` (0-based within this group) relative to
    /// the group's first payload byte.
    pub fn block_offset(&self, local: usize) -> u64 {
        match self {
            Group::Fixed(g) => (local * g.n * g.type_code.size()) as u64,
            Group::Int(g) => g.tails[..local].iter().map(|t| t.payload_bytes as u64).sum(),
            Group::Float(g) => g.tails[..local].iter().map(|t| t.payload_bytes as u64).sum(),
        }
    }

    /// Length in bytes of block `local`'s payload.
    pub fn block_len(&self, local: usize) -> u64 {
        match self {
            Group::Fixed(g) => (g.n * g.type_code.size()) as u64,
            Group::Int(g) => g.tails[local].payload_bytes as u64,
            Group::Float(g) => g.tails[local].payload_bytes as u64,
        }
    }

    /// Decode block `local`'s raw bytes back into a typed payload.
    pub fn read_block(&self, bytes: &[u8], local: usize) -> Result<Payload> {
        match self {
            Group::Fixed(g) => Payload::from_le_bytes(g.type_code, bytes, g.n),
            Group::Int(g) => {
                let xs = int_group::decode_block(bytes, &g.tails[local]);
                Ok(Payload::I64(xs))
            }
            Group::Float(g) => {
                let tail = &g.tails[local];
                let xs = float_group::decode_block(bytes, g.low, g.high, g.dx, tail.length as usize);
                Ok(Payload::F32(xs))
            }
        }
    }

    /// Write this group's footer tail record.
    pub fn write_tail<W: Write>(&self, w: &mut W) -> Result<()> {
        match self {
            Group::Fixed(g) => {
                w.write_i64::<LittleEndian>(g.n as i64)?;
                w.write_i64::<LittleEndian>(g.start_block as i64)?;
                w.write_i64::<LittleEndian>(g.block_count as i64)?;
            }
            Group::Int(g) => {
                w.write_i64::<LittleEndian>(g.start_block as i64)?;
                w.write_i64::<LittleEndian>(g.tails.len() as i64)?;
                for t in &g.tails {
                    w.write_i64::<LittleEndian>(t.length)?;
                    w.write_i64::<LittleEndian>(t.min)?;
                    w.write_u8(t.w)?;
                    w.write_i64::<LittleEndian>(t.payload_bytes)?;
                }
            }
            Group::Float(g) => {
                w.write_i64::<LittleEndian>(g.start_block as i64)?;
                w.write_i64::<LittleEndian>(g.tails.len() as i64)?;
                w.write_f32::<LittleEndian>(g.low)?;
                w.write_f32::<LittleEndian>(g.high)?;
                w.write_f32::<LittleEndian>(g.dx)?;
                for t in &g.tails {
                    w.write_i64::<LittleEndian>(t.length)?;
                    w.write_i64::<LittleEndian>(t.payload_bytes)?;
                }
            }
        }
        Ok(())
    }

    /// Parse a group's footer tail record, given its codec code from the
    /// footer's `group_types` table. Self-contained: advances `r` by
    /// exactly the tail's size, independent of neighboring groups.
    pub fn read_tail<R: Read>(r: &mut R, group_index: usize, code: i64) -> Result<Group> {
        if let Ok(type_code) = TypeCode::from_code(code) {
            let n = r.read_i64::<LittleEndian>()? as usize;
            let start_block = r.read_i64::<LittleEndian>()? as usize;
            let block_count = r.read_i64::<LittleEndian>()? as usize;
            return Ok(Group::Fixed(FixedGroup {
                type_code,
                n,
                start_block,
                block_count,
            }));
        }

        match code {
            INT_GROUP_CODE => {
                let start_block = r.read_i64::<LittleEndian>()? as usize;
                let block_count = r.read_i64::<LittleEndian>()? as usize;
                let mut tails = Vec::with_capacity(block_count);
                for _ in 0..block_count {
                    let length = r.read_i64::<LittleEndian>()?;
                    let min = r.read_i64::<LittleEndian>()?;
                    let w = r.read_u8()?;
                    let payload_bytes = r.read_i64::<LittleEndian>()?;
                    tails.push(IntBlockTail {
                        length,
                        min,
                        w,
                        payload_bytes,
                    });
                }
                Ok(Group::Int(IntGroupState {
                    start_block,
                    tails,
                    periodic: None,
                }))
            }
            FLOAT_GROUP_CODE => {
                let start_block = r.read_i64::<LittleEndian>()? as usize;
                let block_count = r.read_i64::<LittleEndian>()? as usize;
                let low = r.read_f32::<LittleEndian>()?;
                let high = r.read_f32::<LittleEndian>()?;
                let dx = r.read_f32::<LittleEndian>()?;
                let mut tails = Vec::with_capacity(block_count);
                for _ in 0..block_count {
                    let length = r.read_i64::<LittleEndian>()?;
                    let payload_bytes = r.read_i64::<LittleEndian>()?;
                    tails.push(FloatBlockTail {
                        length,
                        payload_bytes,
                    });
                }
                Ok(Group::Float(FloatGroupState {
                    start_block,
                    low,
                    high,
                    dx,
                    tails,
                }))
            }
            other => Err(MinnowError::CorruptTail(
                group_index,
                format!("unknown group codec code {other}"),
            )),
        }
    }
}
