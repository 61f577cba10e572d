use crate::storage::chunk::Chunk;

/// Column types supported by the columnar stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Int,
    Text,
    Bool,
}

/// An owned cell value, used when appending rows into a chunk.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Text(String),
    Bool(bool),
    Null,
}

/// A cell value read back out of a chunk. Text is borrowed from the column
/// buffer, so reading a row copies nothing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ValueRef<'a> {
    Int(i64),
    Text(&'a str),
    Bool(bool),
    Null,
}

/// A read-only view of one row inside a chunk.
///
/// A `Row` is just (backing chunk, row index); it owns no data and is only
/// valid while the backing store is alive and unmutated. Two rows are equal
/// iff they reference the same physical row: the same chunk *object* (pointer
/// identity, not content) at the same index.
///
/// The distinguished value with no backing chunk is the end sentinel returned
/// by every iterator once it runs out of rows; it never equals a row produced
/// from an actual chunk. Callers compare against it directly:
///
/// ```ignore
/// let mut row = it.begin();
/// while row != it.end() {
///     // ...
///     row = it.next();
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    chunk: Option<&'a Chunk>,
    idx: usize,
}

impl<'a> Row<'a> {
    /// The end sentinel.
    pub const END: Row<'static> = Row { chunk: None, idx: 0 };

    pub(crate) fn new(chunk: &'a Chunk, idx: usize) -> Self {
        Row { chunk: Some(chunk), idx }
    }

    /// Whether this row is the end sentinel.
    pub fn is_end(&self) -> bool {
        self.chunk.is_none()
    }

    /// Index of this row within its backing chunk.
    ///
    /// # Panics
    /// Panics if called on the end sentinel.
    pub fn idx(&self) -> usize {
        assert!(self.chunk.is_some(), "idx() on the end sentinel");
        self.idx
    }

    /// Read the cell at `col`. Must not be called on the end sentinel.
    ///
    /// # Panics
    /// Panics if called on the end sentinel or with `col` out of range.
    pub fn value(&self, col: usize) -> ValueRef<'a> {
        let chunk = self.chunk.expect("value() on the end sentinel");
        chunk.cell(col, self.idx)
    }

    /// Number of columns in the backing chunk, 0 for the sentinel.
    pub fn num_columns(&self) -> usize {
        self.chunk.map_or(0, |c| c.num_columns())
    }
}

impl PartialEq for Row<'_> {
    fn eq(&self, other: &Self) -> bool {
        match (self.chunk, other.chunk) {
            (Some(a), Some(b)) => std::ptr::eq(a, b) && self.idx == other.idx,
            (None, None) => true,
            _ => false,
        }
    }
}

/// An explicit locator for a row inside a multi-chunk store: which chunk,
/// and which row within that chunk. Unlike `Row` it borrows nothing, so it
/// can be kept across iterations, e.g. to hold a sort permutation that is
/// replayed later through a `RowPointerIterator`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RowPtr {
    pub chunk_idx: u32,
    pub row_idx: u32,
}

impl RowPtr {
    pub fn new(chunk_idx: u32, row_idx: u32) -> Self {
        RowPtr { chunk_idx, row_idx }
    }
}
