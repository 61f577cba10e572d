use crate::storage::chunk::Chunk;
use crate::storage::row::{ColumnType, Row, RowPtr, Value};

/// An append-only sequence of chunks forming one logical row sequence.
///
/// New rows go into the last chunk until it reaches `max_chunk_rows`, then a
/// fresh chunk is started. Chunk boundaries are an implementation detail of
/// the list; iteration hides them.
#[derive(Debug)]
pub struct List {
    types: Vec<ColumnType>,
    max_chunk_rows: usize,
    chunks: Vec<Chunk>,
    len: usize,
}

impl List {
    /// # Panics
    /// Panics if `max_chunk_rows` is zero.
    pub fn new(types: Vec<ColumnType>, max_chunk_rows: usize) -> Self {
        assert!(max_chunk_rows > 0, "max_chunk_rows must be at least 1");
        List { types, max_chunk_rows, chunks: Vec::new(), len: 0 }
    }

    /// Total number of rows across all chunks.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn num_chunks(&self) -> usize {
        self.chunks.len()
    }

    /// # Panics
    /// Panics if `idx` is out of range.
    pub fn get_chunk(&self, idx: usize) -> &Chunk {
        &self.chunks[idx]
    }

    pub fn column_types(&self) -> &[ColumnType] {
        &self.types
    }

    /// Append one row, returning the pointer it landed at.
    pub fn append_row(&mut self, values: &[Value]) -> RowPtr {
        let needs_chunk = match self.chunks.last() {
            Some(chunk) => chunk.num_rows() >= self.max_chunk_rows,
            None => true,
        };
        if needs_chunk {
            self.chunks.push(Chunk::new(&self.types));
        }
        let chunk_idx = self.chunks.len() - 1;
        let chunk = &mut self.chunks[chunk_idx];
        let row_idx = chunk.num_rows();
        chunk.append_row(values);
        self.len += 1;
        RowPtr::new(chunk_idx as u32, row_idx as u32)
    }

    /// Append a pre-built chunk as-is, keeping its row layout. Used when a
    /// producer already batches rows into chunks of its own sizing.
    ///
    /// # Panics
    /// Panics if the chunk is empty; empty chunks would break the
    /// chunk-boundary arithmetic of list iteration.
    pub fn add_chunk(&mut self, chunk: Chunk) {
        assert!(chunk.num_rows() > 0, "chunk added to a list must have at least 1 row");
        self.len += chunk.num_rows();
        self.chunks.push(chunk);
    }

    pub(crate) fn into_chunks(self) -> Vec<Chunk> {
        self.chunks
    }

    /// Resolve a pointer previously handed out by `append_row`.
    ///
    /// # Panics
    /// Panics if the pointer does not address a row in this list.
    pub fn get_row(&self, ptr: RowPtr) -> Row<'_> {
        self.chunks[ptr.chunk_idx as usize].get_row(ptr.row_idx as usize)
    }
}
