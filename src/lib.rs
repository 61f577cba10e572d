pub mod error;
pub mod storage;
pub mod iter;

pub use error::{StoreError, StoreResult};
pub use iter::{
    ChunkIterator, ListIterator, MultiIterator, RowContainerIterator, RowIterator,
    RowPointerIterator, SliceIterator,
};
pub use storage::{Chunk, ColumnType, List, Row, RowContainer, RowPtr, Value, ValueRef};
