//! The uniform row-iteration protocol.
//!
//! Every operator that walks rows holds a `RowIterator` and never knows
//! which physical store backs it: a slice of materialized rows, a single
//! chunk, a multi-chunk list, an explicit pointer permutation, a spillable
//! container, or a concatenation of other iterators.
//!
//! End of iteration is signalled by the sentinel row, not by an `Option`,
//! so the driving loop is a plain equality check:
//!
//! ```
//! use rowstream::{Chunk, ChunkIterator, ColumnType, RowIterator, Value};
//!
//! let mut chunk = Chunk::new(&[ColumnType::Int]);
//! chunk.append_row(&[Value::Int(7)]);
//! let mut it = ChunkIterator::new(&chunk);
//! let mut row = it.begin();
//! while row != it.end() {
//!     // use row
//!     row = it.next();
//! }
//! ```
//!
//! An iterator is driven by exactly one consumer; cursor and error state
//! are unsynchronized by design.

use crate::error::StoreError;
use crate::storage::chunk::Chunk;
use crate::storage::container::RowContainer;
use crate::storage::list::List;
use crate::storage::row::{Row, RowPtr};

/// The iteration contract shared by every concrete iterator.
///
/// `begin`, `next` and `current` take `&mut self`: they move the private
/// cursor, and for fallible stores `current` may record a resolution
/// failure in the iterator's error slot. Once that slot is set it is never
/// cleared; beyond that point every call returns the sentinel.
pub trait RowIterator<'a> {
    /// Reset the cursor and return the first row, or the sentinel if the
    /// store is empty.
    fn begin(&mut self) -> Row<'a>;

    /// Advance one row. Returns the sentinel once past the last row, and
    /// keeps returning it on further calls.
    fn next(&mut self) -> Row<'a>;

    /// The row last produced by `begin`/`next`, without advancing. The
    /// sentinel if the cursor has not started or is past the end.
    fn current(&mut self) -> Row<'a>;

    /// The end sentinel; only ever compared against, never dereferenced.
    fn end(&self) -> Row<'a> {
        Row::END
    }

    /// Total row count of the bound store.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Park the cursor past the end without visiting the remaining rows.
    fn reach_end(&mut self);

    /// The first resolution failure observed, if any. Stays set for the
    /// life of the iterator. Always `None` for infallible stores.
    fn error(&self) -> Option<&StoreError>;
}

/// Iterates rows of a slice of already-materialized row views.
pub struct SliceIterator<'a> {
    rows: &'a [Row<'a>],
    cursor: usize,
}

impl<'a> SliceIterator<'a> {
    pub fn new(rows: &'a [Row<'a>]) -> Self {
        SliceIterator { rows, cursor: 0 }
    }

    /// Rebind to a new slice and reset the cursor, reusing the iterator
    /// across batches of rows.
    pub fn reset(&mut self, rows: &'a [Row<'a>]) {
        self.rows = rows;
        self.cursor = 0;
    }
}

impl<'a> RowIterator<'a> for SliceIterator<'a> {
    fn begin(&mut self) -> Row<'a> {
        if self.rows.is_empty() {
            return Row::END;
        }
        self.cursor = 1;
        self.rows[0]
    }

    fn next(&mut self) -> Row<'a> {
        let len = self.rows.len();
        if self.cursor >= len {
            self.cursor = len + 1;
            return Row::END;
        }
        let row = self.rows[self.cursor];
        self.cursor += 1;
        row
    }

    fn current(&mut self) -> Row<'a> {
        if self.cursor == 0 || self.cursor > self.rows.len() {
            return Row::END;
        }
        self.rows[self.cursor - 1]
    }

    fn len(&self) -> usize {
        self.rows.len()
    }

    fn reach_end(&mut self) {
        self.cursor = self.rows.len() + 1;
    }

    fn error(&self) -> Option<&StoreError> {
        None
    }
}

/// Iterates rows of a single chunk, resolving each view lazily from the
/// column buffers.
pub struct ChunkIterator<'a> {
    chunk: &'a Chunk,
    cursor: usize,
    // Cached by begin(), not at bind time, so a chunk filled between
    // binding and the first begin() is measured correctly.
    num_rows: usize,
}

impl<'a> ChunkIterator<'a> {
    pub fn new(chunk: &'a Chunk) -> Self {
        ChunkIterator { chunk, cursor: 0, num_rows: 0 }
    }

    /// The bound chunk, for callers that carry it alongside the iterator.
    pub fn chunk(&self) -> &'a Chunk {
        self.chunk
    }

    /// Rebind to a new chunk and reset the cursor.
    pub fn reset(&mut self, chunk: &'a Chunk) {
        self.chunk = chunk;
        self.cursor = 0;
        self.num_rows = 0;
    }
}

impl<'a> RowIterator<'a> for ChunkIterator<'a> {
    fn begin(&mut self) -> Row<'a> {
        self.num_rows = self.chunk.num_rows();
        if self.num_rows == 0 {
            return Row::END;
        }
        self.cursor = 1;
        self.chunk.get_row(0)
    }

    fn next(&mut self) -> Row<'a> {
        if self.cursor >= self.num_rows {
            self.cursor = self.num_rows + 1;
            return Row::END;
        }
        let row = self.chunk.get_row(self.cursor);
        self.cursor += 1;
        row
    }

    fn current(&mut self) -> Row<'a> {
        if self.cursor == 0 || self.cursor > self.len() {
            return Row::END;
        }
        self.chunk.get_row(self.cursor - 1)
    }

    fn len(&self) -> usize {
        self.chunk.num_rows()
    }

    fn reach_end(&mut self) {
        self.cursor = self.len() + 1;
    }

    fn error(&self) -> Option<&StoreError> {
        None
    }
}

/// Iterates rows across the chunks of a list, hiding chunk boundaries.
pub struct ListIterator<'a> {
    list: &'a List,
    chunk_cursor: usize,
    row_cursor: usize,
}

impl<'a> ListIterator<'a> {
    pub fn new(list: &'a List) -> Self {
        ListIterator { list, chunk_cursor: 0, row_cursor: 0 }
    }
}

impl<'a> RowIterator<'a> for ListIterator<'a> {
    fn begin(&mut self) -> Row<'a> {
        if self.list.num_chunks() == 0 {
            return Row::END;
        }
        let chunk = self.list.get_chunk(0);
        let row = chunk.get_row(0);
        if chunk.num_rows() == 1 {
            self.chunk_cursor = 1;
            self.row_cursor = 0;
        } else {
            self.chunk_cursor = 0;
            self.row_cursor = 1;
        }
        row
    }

    fn next(&mut self) -> Row<'a> {
        if self.chunk_cursor >= self.list.num_chunks() {
            self.chunk_cursor = self.list.num_chunks() + 1;
            return Row::END;
        }
        let chunk = self.list.get_chunk(self.chunk_cursor);
        let row = chunk.get_row(self.row_cursor);
        self.row_cursor += 1;
        if self.row_cursor == chunk.num_rows() {
            self.row_cursor = 0;
            self.chunk_cursor += 1;
        }
        row
    }

    fn current(&mut self) -> Row<'a> {
        if (self.chunk_cursor == 0 && self.row_cursor == 0)
            || self.chunk_cursor > self.list.num_chunks()
        {
            return Row::END;
        }
        // A row cursor of 0 means the last produced row was the final row
        // of the previous chunk; the chunk cursor has already rolled over.
        if self.row_cursor == 0 {
            let chunk = self.list.get_chunk(self.chunk_cursor - 1);
            return chunk.get_row(chunk.num_rows() - 1);
        }
        self.list.get_chunk(self.chunk_cursor).get_row(self.row_cursor - 1)
    }

    fn len(&self) -> usize {
        self.list.len()
    }

    fn reach_end(&mut self) {
        self.chunk_cursor = self.list.num_chunks() + 1;
    }

    fn error(&self) -> Option<&StoreError> {
        None
    }
}

/// Iterates rows of a list in an externally supplied pointer order, e.g. a
/// sort permutation or a filtered selection, without moving any row data.
pub struct RowPointerIterator<'a> {
    list: &'a List,
    ptrs: &'a [RowPtr],
    cursor: usize,
}

impl<'a> RowPointerIterator<'a> {
    pub fn new(list: &'a List, ptrs: &'a [RowPtr]) -> Self {
        RowPointerIterator { list, ptrs, cursor: 0 }
    }
}

impl<'a> RowIterator<'a> for RowPointerIterator<'a> {
    fn begin(&mut self) -> Row<'a> {
        if self.ptrs.is_empty() {
            return Row::END;
        }
        self.cursor = 1;
        self.list.get_row(self.ptrs[0])
    }

    fn next(&mut self) -> Row<'a> {
        let len = self.ptrs.len();
        if self.cursor >= len {
            self.cursor = len + 1;
            return Row::END;
        }
        let row = self.list.get_row(self.ptrs[self.cursor]);
        self.cursor += 1;
        row
    }

    fn current(&mut self) -> Row<'a> {
        if self.cursor == 0 || self.cursor > self.ptrs.len() {
            return Row::END;
        }
        self.list.get_row(self.ptrs[self.cursor - 1])
    }

    fn len(&self) -> usize {
        self.ptrs.len()
    }

    fn reach_end(&mut self) {
        self.cursor = self.ptrs.len() + 1;
    }

    fn error(&self) -> Option<&StoreError> {
        None
    }
}

/// Iterates rows of a container whose chunks may live on disk.
///
/// Resolving a spilled row can fail; the first failure is recorded, the
/// cursor is parked past the end, and that call and every later one return
/// the sentinel. Check [`RowIterator::error`] after seeing the sentinel.
pub struct RowContainerIterator<'a> {
    container: &'a RowContainer,
    chunk_idx: usize,
    // None until the first advance of the current binding.
    row_idx: Option<usize>,
    err: Option<StoreError>,
}

impl<'a> RowContainerIterator<'a> {
    pub fn new(container: &'a RowContainer) -> Self {
        RowContainerIterator { container, chunk_idx: 0, row_idx: None, err: None }
    }

    fn advance(&mut self) {
        let next = match self.row_idx {
            None => 0,
            Some(i) => i + 1,
        };
        if next == self.container.num_rows_of_chunk(self.chunk_idx) {
            self.row_idx = Some(0);
            self.chunk_idx += 1;
        } else {
            self.row_idx = Some(next);
        }
    }
}

impl<'a> RowIterator<'a> for RowContainerIterator<'a> {
    // begin is "reset to just-before-first, then next", so a failure on the
    // very first row takes the same path as any mid-stream failure.
    fn begin(&mut self) -> Row<'a> {
        self.chunk_idx = 0;
        self.row_idx = None;
        self.next()
    }

    fn next(&mut self) -> Row<'a> {
        if self.chunk_idx >= self.container.num_chunks() {
            self.reach_end();
            return Row::END;
        }
        self.advance();
        self.current()
    }

    fn current(&mut self) -> Row<'a> {
        let Some(row_idx) = self.row_idx else {
            return Row::END;
        };
        if self.chunk_idx >= self.container.num_chunks() {
            return Row::END;
        }
        let ptr = RowPtr::new(self.chunk_idx as u32, row_idx as u32);
        match self.container.get_row(ptr) {
            Ok(row) => row,
            Err(e) => {
                self.err = Some(e);
                self.reach_end();
                Row::END
            }
        }
    }

    fn len(&self) -> usize {
        self.container.num_rows()
    }

    fn reach_end(&mut self) {
        self.chunk_idx = self.container.num_chunks();
        self.row_idx = Some(0);
    }

    fn error(&self) -> Option<&StoreError> {
        self.err.as_ref()
    }
}

/// Concatenates several iterators into one logical sequence.
///
/// Children with no rows are discarded at construction; `len` is the sum
/// of the rest. A child that reports an error mid-stream aborts the whole
/// composition: the error is adopted, the cursor parks past the end, and
/// no rows from later children are produced.
pub struct MultiIterator<'a> {
    iters: Vec<Box<dyn RowIterator<'a> + 'a>>,
    length: usize,
    cur: usize,
    err: Option<StoreError>,
}

impl<'a> MultiIterator<'a> {
    /// Only children that are empty *now* are dropped; a child that fails
    /// on its very first row still participates and surfaces its error.
    pub fn new(children: Vec<Box<dyn RowIterator<'a> + 'a>>) -> Self {
        let mut iters = Vec::new();
        let mut length = 0;
        for child in children {
            if !child.is_empty() {
                length += child.len();
                iters.push(child);
            }
        }
        MultiIterator { iters, length, cur: 0, err: None }
    }
}

impl<'a> RowIterator<'a> for MultiIterator<'a> {
    fn begin(&mut self) -> Row<'a> {
        self.cur = 0;
        if !self.iters.is_empty() {
            self.iters[0].begin();
        }
        self.current()
    }

    fn next(&mut self) -> Row<'a> {
        if self.cur == self.iters.len() {
            return Row::END;
        }
        let mut row = self.iters[self.cur].next();
        if row.is_end() {
            // The child is done: either it failed, which ends the whole
            // composition, or it ran out of rows and the next child starts.
            if let Some(e) = self.iters[self.cur].error() {
                self.err = Some(e.clone());
                self.reach_end();
                return Row::END;
            }
            self.cur += 1;
            if self.cur == self.iters.len() {
                return Row::END;
            }
            row = self.iters[self.cur].begin();
        }
        row
    }

    fn current(&mut self) -> Row<'a> {
        if self.cur == self.iters.len() {
            return Row::END;
        }
        let row = self.iters[self.cur].current();
        if row.is_end() {
            if let Some(e) = self.iters[self.cur].error() {
                self.err = Some(e.clone());
            }
        }
        row
    }

    fn len(&self) -> usize {
        self.length
    }

    fn reach_end(&mut self) {
        self.cur = self.iters.len();
    }

    fn error(&self) -> Option<&StoreError> {
        self.err.as_ref()
    }
}
