//! Minh reader implementation
//!
//! Parses the seven fixed-order schema headers, then answers random
//! `block(b, names)` requests by translating `(b, column)` into a minnow
//! block index and decoding through the underlying minnow reader.

use byteorder::{LittleEndian, ReadBytesExt};
use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek};
use std::path::Path;

use minnow::{MinnowReader, Payload};

use crate::error::{MinhError, Result};
use crate::geometry::Geometry;
use crate::schema::{ColumnDescriptor, COLUMN_RECORD_SIZE};
use crate::{FileType, MAGIC};

/// Random-access reader over a minh file.
pub struct MinhReader<R> {
    inner: MinnowReader<R>,
    file_type: FileType,
    text: Vec<u8>,
    names: Vec<String>,
    cols: Vec<ColumnDescriptor>,
    geometry: Geometry,
    block_lengths: Vec<i64>,
}

impl<R: Read + Seek> MinhReader<R> {
    /// Parse a minh file's seven schema headers.
    pub fn new(reader: R) -> Result<Self> {
        let mut inner = MinnowReader::new(reader)?;

        let header0 = inner.header(0)?;
        let mut cursor = Cursor::new(&header0);
        let magic = cursor.read_i64::<LittleEndian>()?;
        let _version = cursor.read_i64::<LittleEndian>()?;
        let file_type_code = cursor.read_i64::<LittleEndian>()?;
        if magic != MAGIC {
            return Err(MinhError::Open);
        }
        let file_type = FileType::from_code(file_type_code)?;

        let text = inner.header(1)?;
        let names_blob = inner.header_string(2)?;
        let names: Vec<String> = if names_blob.is_empty() {
            Vec::new()
        } else {
            names_blob.split('$').map(String::from).collect()
        };

        let col_bytes = inner.header(3)?;
        let mut cols = Vec::with_capacity(col_bytes.len() / COLUMN_RECORD_SIZE);
        for chunk in col_bytes.chunks(COLUMN_RECORD_SIZE) {
            cols.push(ColumnDescriptor::from_bytes(chunk)?);
        }

        let geom_bytes = inner.header(4)?;
        let mut cursor = Cursor::new(&geom_bytes);
        let l = cursor.read_f32::<LittleEndian>()?;
        let boundary = cursor.read_f32::<LittleEndian>()?;
        let cells = cursor.read_i64::<LittleEndian>()?;
        let geometry = Geometry { l, boundary, cells };

        let block_count_bytes = inner.header(5)?;
        let block_count = i64::from_le_bytes(
            block_count_bytes
                .try_into()
                .map_err(|_| MinhError::SchemaMismatch("malformed block count header".into()))?,
        ) as usize;

        let row_counts_bytes = inner.header(6)?;
        let mut cursor = Cursor::new(&row_counts_bytes);
        let mut block_lengths = Vec::with_capacity(block_count);
        for _ in 0..block_count {
            block_lengths.push(cursor.read_i64::<LittleEndian>()?);
        }

        Ok(MinhReader {
            inner,
            file_type,
            text,
            names,
            cols,
            geometry,
            block_lengths,
        })
    }

    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.cols
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn text(&self) -> &[u8] {
        &self.text
    }

    /// Total row count across all blocks.
    pub fn len(&self) -> usize {
        self.block_lengths.iter().sum::<i64>() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn blocks(&self) -> usize {
        self.block_lengths.len()
    }

    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    pub fn is_boundary(&self) -> bool {
        self.geometry.is_boundary()
    }

    fn column_index(&self, name: &str) -> Result<usize> {
        self.names
            .iter()
            .position(|n| n == name)
            .ok_or_else(|| MinhError::ColumnNotFound(name.to_string()))
    }

    fn minnow_block_index(&self, b: usize, c: usize) -> usize {
        match self.file_type {
            FileType::Basic => b * self.cols.len() + c,
            FileType::Boundary => b + c * self.blocks(),
        }
    }

    /// Fetch the requested columns of logical block `b`, applying the
    /// `10^x` post-transform on any column whose descriptor has `log` set.
    pub fn block(&mut self, b: usize, names: &[&str]) -> Result<Vec<Payload>> {
        if b >= self.blocks() {
            return Err(MinhError::BlockIndex(b, self.blocks()));
        }
        let mut out = Vec::with_capacity(names.len());
        for &name in names {
            let c = self.column_index(name)?;
            let mb = self.minnow_block_index(b, c);
            let payload = self.inner.data(mb)?;
            out.push(if self.cols[c].log {
                exp10(payload)?
            } else {
                payload
            });
        }
        Ok(out)
    }

    /// Horizontally concatenate `block(b, names)` over every block, in
    /// block order.
    pub fn read(&mut self, names: &[&str]) -> Result<Vec<Payload>> {
        let mut acc: Vec<Option<Payload>> = vec![None; names.len()];
        for b in 0..self.blocks() {
            let block = self.block(b, names)?;
            for (slot, payload) in acc.iter_mut().zip(block) {
                match slot {
                    None => *slot = Some(payload),
                    Some(existing) => extend_payload(existing, payload)?,
                }
            }
        }
        let mut out = Vec::with_capacity(names.len());
        for (name, slot) in names.iter().zip(acc) {
            out.push(match slot {
                Some(p) => p,
                None => self.empty_payload(name)?,
            });
        }
        Ok(out)
    }

    fn empty_payload(&self, name: &str) -> Result<Payload> {
        let c = self.column_index(name)?;
        Ok(match self.cols[c].codec {
            crate::schema::ColumnCodec::Fixed(minnow::TypeCode::I64) => Payload::I64(Vec::new()),
            crate::schema::ColumnCodec::Fixed(minnow::TypeCode::I32) => Payload::I32(Vec::new()),
            crate::schema::ColumnCodec::Fixed(minnow::TypeCode::I16) => Payload::I16(Vec::new()),
            crate::schema::ColumnCodec::Fixed(minnow::TypeCode::I8) => Payload::I8(Vec::new()),
            crate::schema::ColumnCodec::Fixed(minnow::TypeCode::U64) => Payload::U64(Vec::new()),
            crate::schema::ColumnCodec::Fixed(minnow::TypeCode::U32) => Payload::U32(Vec::new()),
            crate::schema::ColumnCodec::Fixed(minnow::TypeCode::U16) => Payload::U16(Vec::new()),
            crate::schema::ColumnCodec::Fixed(minnow::TypeCode::U8) => Payload::U8(Vec::new()),
            crate::schema::ColumnCodec::Fixed(minnow::TypeCode::F64) => Payload::F64(Vec::new()),
            crate::schema::ColumnCodec::Fixed(minnow::TypeCode::F32) => Payload::F32(Vec::new()),
            crate::schema::ColumnCodec::IntGroup => Payload::I64(Vec::new()),
            crate::schema::ColumnCodec::FloatGroup => Payload::F32(Vec::new()),
        })
    }
}

impl MinhReader<BufReader<File>> {
    /// Open a minh file from a path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Self::new(BufReader::new(file))
    }
}

/// Convenience function mirroring [`MinhReader::open`].
pub fn open<P: AsRef<Path>>(path: P) -> Result<MinhReader<BufReader<File>>> {
    MinhReader::open(path)
}

fn exp10(payload: Payload) -> Result<Payload> {
    match payload {
        Payload::F32(v) => Ok(Payload::F32(v.into_iter().map(|x| 10f32.powf(x)).collect())),
        Payload::F64(v) => Ok(Payload::F64(v.into_iter().map(|x| 10f64.powf(x)).collect())),
        other => Err(MinhError::SchemaMismatch(format!(
            "log column must be a float type, got {:?}",
            other.type_code()
        ))),
    }
}

/// Extend `acc` in place with `next`'s elements; both must be the same
/// `Payload` variant.
fn extend_payload(acc: &mut Payload, next: Payload) -> Result<()> {
    match (acc, next) {
        (Payload::I64(a), Payload::I64(b)) => a.extend(b),
        (Payload::I32(a), Payload::I32(b)) => a.extend(b),
        (Payload::I16(a), Payload::I16(b)) => a.extend(b),
        (Payload::I8(a), Payload::I8(b)) => a.extend(b),
        (Payload::U64(a), Payload::U64(b)) => a.extend(b),
        (Payload::U32(a), Payload::U32(b)) => a.extend(b),
        (Payload::U16(a), Payload::U16(b)) => a.extend(b),
        (Payload::U8(a), Payload::U8(b)) => a.extend(b),
        (Payload::F64(a), Payload::F64(b)) => a.extend(b),
        (Payload::F32(a), Payload::F32(b)) => a.extend(b),
        (a, b) => {
            return Err(MinhError::SchemaMismatch(format!(
                "block type mismatch while concatenating: {:?} vs {:?}",
                a.type_code(),
                b.type_code()
            )))
        }
    }
    Ok(())
}
