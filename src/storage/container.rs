use std::cell::OnceCell;
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;

use log::debug;
use tempfile::NamedTempFile;

use crate::error::{StoreError, StoreResult};
use crate::storage::chunk::{Chunk, Column};
use crate::storage::list::List;
use crate::storage::row::{ColumnType, Row, RowPtr, Value};

const TAG_INT: u8 = 0x01;
const TAG_TEXT: u8 = 0x02;
const TAG_BOOL: u8 = 0x03;

/// A row list that can offload its chunks to a temp file.
///
/// Chunks written out by `spill` are dropped from memory and reloaded
/// lazily, one chunk at a time, the first time a row inside them is
/// requested. Reloading reads from disk and decodes, so `get_row` is
/// fallible, unlike the purely in-memory stores. Rows appended after a
/// spill accumulate in a fresh resident tail; chunk indices count the
/// spilled prefix first, so pointers handed out before a spill stay valid.
///
/// Not safe to iterate concurrently with `append_row` or `spill`.
pub struct RowContainer {
    types: Vec<ColumnType>,
    max_chunk_rows: usize,
    resident: List,
    spill: Option<SpillFile>,
    num_rows: usize,
}

impl RowContainer {
    /// # Panics
    /// Panics if `max_chunk_rows` is zero.
    pub fn new(types: Vec<ColumnType>, max_chunk_rows: usize) -> Self {
        let resident = List::new(types.clone(), max_chunk_rows);
        RowContainer { types, max_chunk_rows, resident, spill: None, num_rows: 0 }
    }

    /// Total number of rows, spilled or not.
    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    pub fn num_chunks(&self) -> usize {
        self.num_spilled_chunks() + self.resident.num_chunks()
    }

    /// Number of rows in the chunk at `chunk_idx`, whether resident or
    /// spilled.
    ///
    /// # Panics
    /// Panics if `chunk_idx` is out of range.
    pub fn num_rows_of_chunk(&self, chunk_idx: usize) -> usize {
        let spilled = self.num_spilled_chunks();
        if chunk_idx < spilled {
            // Row counts of spilled chunks are kept in the in-memory record
            // index, so this never touches disk.
            self.spill.as_ref().map_or(0, |s| s.records[chunk_idx].num_rows)
        } else {
            self.resident.get_chunk(chunk_idx - spilled).num_rows()
        }
    }

    pub fn has_spilled(&self) -> bool {
        self.spill.is_some()
    }

    /// Path of the spill file, once `spill` has been called.
    pub fn spill_path(&self) -> Option<&Path> {
        self.spill.as_ref().map(|s| s.file.path())
    }

    pub fn column_types(&self) -> &[ColumnType] {
        &self.types
    }

    /// Append one row to the resident tail, returning its pointer.
    pub fn append_row(&mut self, values: &[Value]) -> RowPtr {
        let local = self.resident.append_row(values);
        self.num_rows += 1;
        RowPtr::new(local.chunk_idx + self.num_spilled_chunks() as u32, local.row_idx)
    }

    /// Write every resident chunk to the spill file and drop it from memory.
    ///
    /// Creates the temp file on first use; later calls append to it. If a
    /// write fails, the chunks not yet written are lost and resolving their
    /// rows reports `ChunkNotFound`; a failed spill is not retried.
    pub fn spill(&mut self) -> io::Result<()> {
        let mut spill = match self.spill.take() {
            Some(s) => s,
            None => SpillFile::create()?,
        };
        let drained = std::mem::replace(
            &mut self.resident,
            List::new(self.types.clone(), self.max_chunk_rows),
        );
        debug!(
            "spilling {} resident chunks ({} rows) to {:?}",
            drained.num_chunks(),
            drained.len(),
            spill.file.path()
        );
        let mut res = Ok(());
        for chunk in drained.into_chunks() {
            if res.is_ok() {
                res = spill.append_chunk(&chunk);
            }
        }
        self.spill = Some(spill);
        res
    }

    /// Resolve a row pointer, reading the spill file if the chunk is not
    /// resident. A reloaded chunk stays cached for the life of the
    /// container, so each spilled chunk is read and decoded at most once.
    pub fn get_row(&self, ptr: RowPtr) -> StoreResult<Row<'_>> {
        let chunk_idx = ptr.chunk_idx as usize;
        let spilled = self.num_spilled_chunks();
        if chunk_idx < spilled {
            if let Some(spill) = &self.spill {
                let chunk = spill.chunk(chunk_idx, &self.types)?;
                return Ok(chunk.get_row(ptr.row_idx as usize));
            }
        }
        let local = chunk_idx - spilled;
        if local >= self.resident.num_chunks() {
            return Err(StoreError::ChunkNotFound(chunk_idx));
        }
        Ok(self.resident.get_chunk(local).get_row(ptr.row_idx as usize))
    }

    fn num_spilled_chunks(&self) -> usize {
        self.spill.as_ref().map_or(0, |s| s.records.len())
    }
}

struct SpillRecord {
    offset: u64,
    len: usize,
    num_rows: usize,
    reloaded: OnceCell<Chunk>,
}

struct SpillFile {
    file: NamedTempFile,
    records: Vec<SpillRecord>,
    end: u64,
}

impl SpillFile {
    fn create() -> io::Result<Self> {
        let file = NamedTempFile::new()?;
        debug!("created spill file {:?}", file.path());
        Ok(SpillFile { file, records: Vec::new(), end: 0 })
    }

    fn append_chunk(&mut self, chunk: &Chunk) -> io::Result<()> {
        let buf = encode_chunk(chunk);
        let f = self.file.as_file_mut();
        f.seek(SeekFrom::Start(self.end))?;
        f.write_all(&buf)?;
        self.records.push(SpillRecord {
            offset: self.end,
            len: buf.len(),
            num_rows: chunk.num_rows(),
            reloaded: OnceCell::new(),
        });
        self.end += buf.len() as u64;
        Ok(())
    }

    /// Reload the chunk at `chunk_idx`, or hand back the cached copy.
    fn chunk(&self, chunk_idx: usize, types: &[ColumnType]) -> StoreResult<&Chunk> {
        let rec = &self.records[chunk_idx];
        if let Some(chunk) = rec.reloaded.get() {
            return Ok(chunk);
        }
        debug!(
            "reloading spilled chunk {} ({} bytes at offset {})",
            chunk_idx, rec.len, rec.offset
        );
        let mut buf = vec![0u8; rec.len];
        let mut f: &File = self.file.as_file();
        f.seek(SeekFrom::Start(rec.offset))?;
        f.read_exact(&mut buf)?;
        let chunk = decode_chunk(&buf, chunk_idx, rec.num_rows, types)?;
        Ok(rec.reloaded.get_or_init(|| chunk))
    }
}

// Spill record layout, all integers little-endian:
//
// ┌──────────────┬───────────────────────────────────────────────┐
// │ 4 bytes      │ NUM_ROWS (u32)                                │
// │ 2 bytes      │ NUM_COLS (u16)                                │
// │ per column:  │ 1 byte tag (0x01 int, 0x02 text, 0x03 bool)   │
// │              │ NUM_ROWS presence bytes (0 = NULL)            │
// │              │ int:  NUM_ROWS × 8 bytes                      │
// │              │ text: per row, 4-byte length + UTF-8 bytes    │
// │              │ bool: NUM_ROWS bytes                          │
// └──────────────┴───────────────────────────────────────────────┘

fn encode_chunk(chunk: &Chunk) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.extend(&(chunk.num_rows() as u32).to_le_bytes());
    buf.extend(&(chunk.num_columns() as u16).to_le_bytes());
    for col in chunk.columns() {
        match col {
            Column::Int(data, bitmap) => {
                buf.push(TAG_INT);
                buf.extend(bitmap.iter().map(|&b| b as u8));
                for v in data {
                    buf.extend(&v.to_le_bytes());
                }
            }
            Column::Text(data, bitmap) => {
                buf.push(TAG_TEXT);
                buf.extend(bitmap.iter().map(|&b| b as u8));
                for s in data {
                    buf.extend(&(s.len() as u32).to_le_bytes());
                    buf.extend(s.as_bytes());
                }
            }
            Column::Bool(data, bitmap) => {
                buf.push(TAG_BOOL);
                buf.extend(bitmap.iter().map(|&b| b as u8));
                buf.extend(data.iter().map(|&b| b as u8));
            }
        }
    }
    buf
}

fn decode_chunk(
    buf: &[u8],
    chunk_idx: usize,
    expected_rows: usize,
    types: &[ColumnType],
) -> StoreResult<Chunk> {
    let corrupt = |reason: &str| StoreError::CorruptSpill {
        chunk_idx,
        reason: reason.to_string(),
    };
    let mut r = RecordReader { buf, pos: 0, chunk_idx };

    let num_rows = u32::from_le_bytes(r.take(4)?.try_into().unwrap()) as usize;
    if num_rows != expected_rows {
        return Err(corrupt("row count does not match record index"));
    }
    let num_cols = u16::from_le_bytes(r.take(2)?.try_into().unwrap()) as usize;
    if num_cols != types.len() {
        return Err(corrupt("column count does not match container schema"));
    }

    let mut columns = Vec::with_capacity(num_cols);
    for &ty in types {
        let tag = r.take(1)?[0];
        let bitmap: Vec<bool> = r.take(num_rows)?.iter().map(|&b| b != 0).collect();
        let col = match (tag, ty) {
            (TAG_INT, ColumnType::Int) => {
                let mut data = Vec::with_capacity(num_rows);
                for _ in 0..num_rows {
                    data.push(i64::from_le_bytes(r.take(8)?.try_into().unwrap()));
                }
                Column::Int(data, bitmap)
            }
            (TAG_TEXT, ColumnType::Text) => {
                let mut data = Vec::with_capacity(num_rows);
                for _ in 0..num_rows {
                    let len = u32::from_le_bytes(r.take(4)?.try_into().unwrap()) as usize;
                    let bytes = r.take(len)?;
                    data.push(String::from_utf8_lossy(bytes).into_owned());
                }
                Column::Text(data, bitmap)
            }
            (TAG_BOOL, ColumnType::Bool) => {
                let data = r.take(num_rows)?.iter().map(|&b| b != 0).collect();
                Column::Bool(data, bitmap)
            }
            _ => return Err(corrupt("column tag does not match container schema")),
        };
        columns.push(col);
    }
    if r.pos != buf.len() {
        return Err(corrupt("trailing bytes after last column"));
    }
    Ok(Chunk::from_columns(columns, num_rows))
}

struct RecordReader<'a> {
    buf: &'a [u8],
    pos: usize,
    chunk_idx: usize,
}

impl<'a> RecordReader<'a> {
    fn take(&mut self, n: usize) -> StoreResult<&'a [u8]> {
        if self.buf.len() - self.pos < n {
            return Err(StoreError::CorruptSpill {
                chunk_idx: self.chunk_idx,
                reason: "record truncated".to_string(),
            });
        }
        let bytes = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }
}
