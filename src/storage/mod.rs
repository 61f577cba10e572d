pub mod row;
pub mod chunk;
pub mod list;
pub mod container;

pub use chunk::{Chunk, Column};
pub use container::RowContainer;
pub use list::List;
pub use row::{ColumnType, Row, RowPtr, Value, ValueRef};
