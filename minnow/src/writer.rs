//! Minnow writer implementation
//!
//! Builds a container one group at a time. Opening a new group implicitly
//! closes whatever group was previously open; headers may be written at any
//! point between groups. The fixed header is reserved as 48 zero bytes up
//! front and back-patched with real counts at `close()`.

use byteorder::{LittleEndian, WriteBytesExt};
use std::fs::File;
use std::io::{BufWriter, Seek, SeekFrom, Write};
use std::path::Path;

use crate::error::{MinnowError, Result};
use crate::format::{FixedHeader, Payload, TypeCode, FIXED_HEADER_SIZE, MAGIC, VERSION};
use crate::group::{FixedGroup, FloatGroupState, Group, IntGroupState};

struct HeaderRecord {
    offset: u64,
    size: u64,
}

/// Builder for a minnow container.
pub struct MinnowWriter<W> {
    writer: W,
    headers: Vec<HeaderRecord>,
    /// Closed groups, in the order they were opened, with their first
    /// payload byte's file offset.
    groups: Vec<(u64, Group)>,
    current: Option<(u64, Group)>,
    next_block: usize,
}

impl<W: Write + Seek> MinnowWriter<W> {
    /// Create a new writer, reserving space for the fixed header.
    pub fn new(mut writer: W) -> Result<Self> {
        writer.write_all(&[0u8; FIXED_HEADER_SIZE as usize])?;
        Ok(MinnowWriter {
            writer,
            headers: Vec::new(),
            groups: Vec::new(),
            current: None,
            next_block: 0,
        })
    }

    fn close_current_group(&mut self) {
        if let Some(open) = self.current.take() {
            self.groups.push(open);
        }
    }

    /// Append an opaque byte blob as a header. Returns its assigned index.
    pub fn header(&mut self, bytes: &[u8]) -> Result<usize> {
        let offset = self.writer.stream_position()?;
        self.writer.write_all(bytes)?;
        self.headers.push(HeaderRecord {
            offset,
            size: bytes.len() as u64,
        });
        Ok(self.headers.len() - 1)
    }

    /// Convenience: serialize a typed numeric array as a raw little-endian
    /// header blob.
    pub fn header_array(&mut self, payload: &Payload) -> Result<usize> {
        self.header(&payload.to_le_bytes())
    }

    /// Open a new fixed-size group of `n`-element blocks of `type_code`.
    pub fn fixed_size_group(&mut self, type_code: TypeCode, n: usize) -> Result<()> {
        self.close_current_group();
        let offset = self.writer.stream_position()?;
        self.current = Some((
            offset,
            Group::Fixed(FixedGroup {
                type_code,
                n,
                start_block: self.next_block,
                block_count: 0,
            }),
        ));
        Ok(())
    }

    /// Open a new lossless bit-packed integer group.
    ///
    /// `n` is the nominal per-block element count (documentation only —
    /// `int_group` stores each block's actual length in its tail, so blocks
    /// need not share `n`, per spec.md §4.2).
    pub fn int_group(&mut self, _n: usize) -> Result<()> {
        self.open_int_group(None)
    }

    /// Like [`int_group`](Self::int_group), but blocks are encoded against
    /// the wrap-aware minimum of a ring of circumference `pixels` instead of
    /// a plain min/max — for periodic spatial coordinates.
    pub fn int_group_periodic(&mut self, _n: usize, pixels: i64) -> Result<()> {
        self.open_int_group(Some(pixels))
    }

    fn open_int_group(&mut self, periodic: Option<i64>) -> Result<()> {
        self.close_current_group();
        let offset = self.writer.stream_position()?;
        self.current = Some((
            offset,
            Group::Int(IntGroupState {
                start_block: self.next_block,
                tails: Vec::new(),
                periodic,
            }),
        ));
        Ok(())
    }

    /// Open a new quantized-float group with grid `(low, high)`/`dx`.
    ///
    /// `n` is the nominal per-block element count (documentation only, like
    /// [`int_group`](Self::int_group) — each block's actual length is
    /// stored in its tail).
    pub fn float_group(&mut self, _n: usize, low: f32, high: f32, dx: f32) -> Result<()> {
        self.close_current_group();
        let offset = self.writer.stream_position()?;
        self.current = Some((
            offset,
            Group::Float(FloatGroupState {
                start_block: self.next_block,
                low,
                high,
                dx,
                tails: Vec::new(),
            }),
        ));
        Ok(())
    }

    /// Append one payload block to the currently open group.
    pub fn data(&mut self, payload: Payload) -> Result<usize> {
        let (_, group) = self.current.as_mut().ok_or(MinnowError::NoOpenGroup)?;
        let bytes = group.push_block(&payload)?;
        self.writer.write_all(&bytes)?;
        let b = self.next_block;
        self.next_block += 1;
        Ok(b)
    }

    /// Write the footer, back-patch the fixed header, flush, and hand back
    /// the underlying writer (so in-memory writers, e.g. `Cursor<Vec<u8>>`,
    /// can recover their buffer for immediate reopening in tests).
    pub fn close(mut self) -> Result<W> {
        self.close_current_group();

        let tail_start = self.writer.stream_position()?;

        for h in &self.headers {
            self.writer.write_i64::<LittleEndian>(h.offset as i64)?;
        }
        for h in &self.headers {
            self.writer.write_i64::<LittleEndian>(h.size as i64)?;
        }
        for (offset, _) in &self.groups {
            self.writer.write_i64::<LittleEndian>(*offset as i64)?;
        }
        for (_, group) in &self.groups {
            self.writer.write_i64::<LittleEndian>(group.group_code())?;
        }
        for (_, group) in &self.groups {
            self.writer
                .write_i64::<LittleEndian>(group.block_count() as i64)?;
        }
        for (_, group) in &self.groups {
            group.write_tail(&mut self.writer)?;
        }

        let fixed = FixedHeader {
            magic: MAGIC,
            version: VERSION,
            groups: self.groups.len() as i64,
            headers: self.headers.len() as i64,
            blocks: self.next_block as i64,
            tail_start: tail_start as i64,
        };
        self.writer.seek(SeekFrom::Start(0))?;
        fixed.write(&mut self.writer)?;
        self.writer.flush()?;
        Ok(self.writer)
    }
}

impl MinnowWriter<BufWriter<File>> {
    /// Create a new minnow container at `path`.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::create(path)?;
        Self::new(BufWriter::new(file))
    }
}

/// Convenience function mirroring [`MinnowWriter::create`].
pub fn create<P: AsRef<Path>>(path: P) -> Result<MinnowWriter<BufWriter<File>>> {
    MinnowWriter::create(path)
}
