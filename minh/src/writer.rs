//! Minh writer implementation
//!
//! Layers a columnar schema on top of a minnow container: fixed-order
//! schema headers (magic/version/file_type, text, names, column
//! descriptors), then row-range blocks, one minnow group per
//! `(logical block, column)` pair so that interleaving columns within a
//! block still yields the `b * ncols + c` minnow block numbering spec.md
//! requires. Geometry and the trailing block-count/row-count headers are
//! cached and written at `close()`.

use byteorder::{LittleEndian, WriteBytesExt};
use std::fs::File;
use std::io::{BufWriter, Seek, Write};
use std::path::Path;

use minnow::{MinnowWriter, Payload};

use crate::error::{MinhError, Result};
use crate::geometry::Geometry;
use crate::schema::{ColumnCodec, ColumnDescriptor};
use crate::{FileType, MAGIC, VERSION};

/// Builder for a minh file.
pub struct MinhWriter<W> {
    inner: MinnowWriter<W>,
    names: Vec<String>,
    cols: Vec<ColumnDescriptor>,
    geometry: Geometry,
    block_lengths: Vec<i64>,
}

impl<W: Write + Seek> MinhWriter<W> {
    /// Start a new minh file, writing the fixed magic/version/file_type
    /// header immediately.
    pub fn new(writer: W) -> Result<Self> {
        let mut inner = MinnowWriter::new(writer)?;
        let mut buf = Vec::with_capacity(24);
        buf.write_i64::<LittleEndian>(MAGIC)?;
        buf.write_i64::<LittleEndian>(VERSION)?;
        buf.write_i64::<LittleEndian>(FileType::Basic.code())?;
        inner.header(&buf)?;
        Ok(MinhWriter {
            inner,
            names: Vec::new(),
            cols: Vec::new(),
            geometry: Geometry::default(),
            block_lengths: Vec::new(),
        })
    }

    /// Write the text, column-name, and column-descriptor headers (schema
    /// headers 1, 2, 3, in order). Must be called before any `block()`.
    pub fn header(
        &mut self,
        names: &[String],
        text: &[u8],
        cols: Vec<ColumnDescriptor>,
    ) -> Result<()> {
        self.inner.header(text)?;
        self.inner.header(names.join("$").as_bytes())?;
        let mut record = Vec::with_capacity(cols.len() * crate::schema::COLUMN_RECORD_SIZE);
        for col in &cols {
            record.extend_from_slice(&col.to_bytes());
        }
        self.inner.header(&record)?;
        self.names = names.to_vec();
        self.cols = cols;
        Ok(())
    }

    /// Cache the periodic-box geometry, written at `close()`. Optional;
    /// defaults to all zeros (no geometry / not a boundary file).
    pub fn geometry(&mut self, l: f32, boundary: f32, cells: i64) {
        self.geometry = Geometry { l, boundary, cells };
    }

    /// Append one row-range block: one array per schema column, in schema
    /// order. All arrays must have equal length.
    pub fn block(&mut self, cols: Vec<Payload>) -> Result<()> {
        if cols.len() != self.cols.len() {
            return Err(MinhError::SchemaMismatch(format!(
                "expected {} columns, got {}",
                self.cols.len(),
                cols.len()
            )));
        }
        let length = cols.first().map(Payload::len).unwrap_or(0);
        for (payload, desc) in cols.iter().zip(&self.cols) {
            if payload.len() != length {
                return Err(MinhError::SchemaMismatch(
                    "all columns in one block must have equal length".into(),
                ));
            }
            self.write_column(payload, desc)?;
        }
        self.block_lengths.push(length as i64);
        Ok(())
    }

    fn write_column(&mut self, payload: &Payload, desc: &ColumnDescriptor) -> Result<()> {
        match desc.codec {
            ColumnCodec::Fixed(type_code) => {
                self.inner.fixed_size_group(type_code, payload.len())?;
                self.inner.data(payload.clone())?;
            }
            ColumnCodec::IntGroup => {
                self.inner.int_group(payload.len())?;
                self.inner.data(payload.clone())?;
            }
            ColumnCodec::FloatGroup => {
                let xs = payload.as_f32()?;
                let stored: Vec<f32> = if desc.log {
                    let mut out = Vec::with_capacity(xs.len());
                    for &v in xs {
                        if v <= 0.0 {
                            return Err(MinhError::Minnow(minnow::MinnowError::Domain(format!(
                                "log column received non-positive value {v}"
                            ))));
                        }
                        out.push(v.log10());
                    }
                    out
                } else {
                    xs.to_vec()
                };
                self.inner
                    .float_group(stored.len(), desc.low, desc.high, desc.dx)?;
                self.inner.data(Payload::F32(stored))?;
            }
        }
        Ok(())
    }

    /// Write the trailing geometry, block-count, and per-block row-count
    /// headers (schema headers 4, 5, 6), then close the underlying minnow
    /// container.
    pub fn close(mut self) -> Result<W> {
        let mut geom = Vec::with_capacity(12);
        geom.write_f32::<LittleEndian>(self.geometry.l)?;
        geom.write_f32::<LittleEndian>(self.geometry.boundary)?;
        geom.write_i64::<LittleEndian>(self.geometry.cells)?;
        self.inner.header(&geom)?;

        self.inner
            .header(&(self.block_lengths.len() as i64).to_le_bytes())?;

        let mut lengths = Vec::with_capacity(self.block_lengths.len() * 8);
        for &n in &self.block_lengths {
            lengths.write_i64::<LittleEndian>(n)?;
        }
        self.inner.header(&lengths)?;

        Ok(self.inner.close()?)
    }
}

impl MinhWriter<BufWriter<File>> {
    /// Create a new minh file at `path`.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::create(path)?;
        Self::new(BufWriter::new(file))
    }
}

/// Convenience function mirroring [`MinhWriter::create`].
pub fn create<P: AsRef<Path>>(path: P) -> Result<MinhWriter<BufWriter<File>>> {
    MinhWriter::create(path)
}
