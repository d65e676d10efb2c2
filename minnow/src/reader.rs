//! Minnow reader implementation
//!
//! Parses the fixed header eagerly, then jumps to the footer and parses the
//! index tables plus every group's tail record up front, building a global
//! block -> group map. After `open`, `header`/`data` calls are pure random
//! access: no further scanning of the payload region.

use byteorder::{LittleEndian, ReadBytesExt};
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use crate::error::{MinnowError, Result};
use crate::format::{FixedHeader, Payload, TypeCode};
use crate::group::Group;

/// Random-access reader over a minnow container.
pub struct MinnowReader<R> {
    reader: R,
    header_offsets: Vec<u64>,
    header_sizes: Vec<u64>,
    group_offsets: Vec<u64>,
    groups: Vec<Group>,
    /// block index `b` -> owning group index.
    block_index: Vec<usize>,
}

impl<R: Read + Seek> MinnowReader<R> {
    /// Parse a minnow container's header and footer.
    pub fn new(mut reader: R) -> Result<Self> {
        let fixed = FixedHeader::read(&mut reader)?;

        reader.seek(SeekFrom::Start(fixed.tail_start as u64))?;
        let headers = fixed.headers as usize;
        let groups = fixed.groups as usize;

        let mut header_offsets = Vec::with_capacity(headers);
        for _ in 0..headers {
            header_offsets.push(reader.read_i64::<LittleEndian>()? as u64);
        }
        let mut header_sizes = Vec::with_capacity(headers);
        for _ in 0..headers {
            header_sizes.push(reader.read_i64::<LittleEndian>()? as u64);
        }

        let mut group_offsets = Vec::with_capacity(groups);
        for _ in 0..groups {
            group_offsets.push(reader.read_i64::<LittleEndian>()? as u64);
        }
        let mut group_types = Vec::with_capacity(groups);
        for _ in 0..groups {
            group_types.push(reader.read_i64::<LittleEndian>()?);
        }
        let mut group_blocks = Vec::with_capacity(groups);
        for _ in 0..groups {
            group_blocks.push(reader.read_i64::<LittleEndian>()? as usize);
        }

        let mut parsed_groups = Vec::with_capacity(groups);
        for (g, &code) in group_types.iter().enumerate() {
            let group = Group::read_tail(&mut reader, g, code)?;
            if group.block_count() != group_blocks[g] {
                return Err(MinnowError::CorruptTail(
                    g,
                    format!(
                        "footer declares {} blocks, tail has {}",
                        group_blocks[g],
                        group.block_count()
                    ),
                ));
            }
            parsed_groups.push(group);
        }

        let total_blocks = fixed.blocks as usize;
        let mut block_index = vec![usize::MAX; total_blocks];
        for (g, group) in parsed_groups.iter().enumerate() {
            let start = group.start_block();
            for k in 0..group.block_count() {
                block_index[start + k] = g;
            }
        }

        Ok(MinnowReader {
            reader,
            header_offsets,
            header_sizes,
            group_offsets,
            groups: parsed_groups,
            block_index,
        })
    }

    pub fn groups(&self) -> usize {
        self.groups.len()
    }

    pub fn headers(&self) -> usize {
        self.header_offsets.len()
    }

    pub fn blocks(&self) -> usize {
        self.block_index.len()
    }

    /// Read raw header bytes at index `i`.
    pub fn header(&mut self, i: usize) -> Result<Vec<u8>> {
        if i >= self.header_offsets.len() {
            return Err(MinnowError::HeaderIndex(i, self.header_offsets.len()));
        }
        let mut buf = vec![0u8; self.header_sizes[i] as usize];
        self.reader.seek(SeekFrom::Start(self.header_offsets[i]))?;
        self.reader.read_exact(&mut buf)?;
        Ok(buf)
    }

    /// Read header `i` as an ASCII string (lossy on invalid UTF-8).
    pub fn header_string(&mut self, i: usize) -> Result<String> {
        let bytes = self.header(i)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Read header `i` as a little-endian numeric array of `type_code`.
    pub fn header_array(&mut self, i: usize, type_code: TypeCode, n: usize) -> Result<Payload> {
        let bytes = self.header(i)?;
        Payload::from_le_bytes(type_code, &bytes, n)
    }

    fn group_index_for_block(&self, b: usize) -> Result<usize> {
        let g = *self
            .block_index
            .get(b)
            .ok_or(MinnowError::BlockIndex(b, self.block_index.len()))?;
        if g == usize::MAX {
            return Err(MinnowError::BlockIndex(b, self.block_index.len()));
        }
        Ok(g)
    }

    /// The runtime type of block `b`'s payload.
    pub fn data_type(&self, b: usize) -> Result<TypeCode> {
        let g = self.group_index_for_block(b)?;
        Ok(self.groups[g].data_type())
    }

    /// Read and decode block `b`.
    pub fn data(&mut self, b: usize) -> Result<Payload> {
        let g = self.group_index_for_block(b)?;
        let local = b - self.groups[g].start_block();
        let start = self.group_offsets[g] + self.groups[g].block_offset(local);
        let len = self.groups[g].block_len(local);

        self.reader.seek(SeekFrom::Start(start))?;
        let mut buf = vec![0u8; len as usize];
        self.reader.read_exact(&mut buf)?;

        self.groups[g].read_block(&buf, local)
    }
}

impl MinnowReader<BufReader<File>> {
    /// Open a minnow container from a path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Self::new(BufReader::new(file))
    }
}

/// Convenience function mirroring [`MinnowReader::open`].
pub fn open<P: AsRef<Path>>(path: P) -> Result<MinnowReader<BufReader<File>>> {
    MinnowReader::open(path)
}
