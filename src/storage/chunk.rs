use crate::storage::row::{ColumnType, Row, Value, ValueRef};

/// One typed column buffer: the values plus a presence bitmap
/// (`false` = NULL). Text cells keep their own allocation; everything else
/// is stored inline.
#[derive(Debug, Clone)]
pub enum Column {
    Int(Vec<i64>, Vec<bool>),
    Text(Vec<String>, Vec<bool>),
    Bool(Vec<bool>, Vec<bool>),
}

impl Column {
    fn new(ty: ColumnType) -> Self {
        match ty {
            ColumnType::Int => Column::Int(Vec::new(), Vec::new()),
            ColumnType::Text => Column::Text(Vec::new(), Vec::new()),
            ColumnType::Bool => Column::Bool(Vec::new(), Vec::new()),
        }
    }

    fn ty(&self) -> ColumnType {
        match self {
            Column::Int(..) => ColumnType::Int,
            Column::Text(..) => ColumnType::Text,
            Column::Bool(..) => ColumnType::Bool,
        }
    }

    /// Append one cell. A NULL pushes a zero value so the data vector stays
    /// index-aligned with the bitmap.
    fn push(&mut self, v: &Value, col: usize) {
        match (self, v) {
            (Column::Int(data, bitmap), Value::Int(i)) => {
                data.push(*i);
                bitmap.push(true);
            }
            (Column::Text(data, bitmap), Value::Text(s)) => {
                data.push(s.clone());
                bitmap.push(true);
            }
            (Column::Bool(data, bitmap), Value::Bool(b)) => {
                data.push(*b);
                bitmap.push(true);
            }
            (Column::Int(data, bitmap), Value::Null) => {
                data.push(0);
                bitmap.push(false);
            }
            (Column::Text(data, bitmap), Value::Null) => {
                data.push(String::new());
                bitmap.push(false);
            }
            (Column::Bool(data, bitmap), Value::Null) => {
                data.push(false);
                bitmap.push(false);
            }
            (col_buf, v) => panic!(
                "type mismatch appending {:?} into {:?} column {}",
                v,
                col_buf.ty(),
                col
            ),
        }
    }

    fn get(&self, idx: usize) -> ValueRef<'_> {
        match self {
            Column::Int(data, bitmap) => {
                if bitmap[idx] {
                    ValueRef::Int(data[idx])
                } else {
                    ValueRef::Null
                }
            }
            Column::Text(data, bitmap) => {
                if bitmap[idx] {
                    ValueRef::Text(&data[idx])
                } else {
                    ValueRef::Null
                }
            }
            Column::Bool(data, bitmap) => {
                if bitmap[idx] {
                    ValueRef::Bool(data[idx])
                } else {
                    ValueRef::Null
                }
            }
        }
    }
}

/// A bounded columnar batch holding a contiguous run of rows.
///
/// Rows are appended one at a time; reading never copies. The capacity
/// bookkeeping (how many rows a chunk is allowed to hold) lives in the
/// stores that own chunks, not here.
#[derive(Debug, Clone)]
pub struct Chunk {
    columns: Vec<Column>,
    num_rows: usize,
}

impl Chunk {
    pub fn new(types: &[ColumnType]) -> Self {
        Chunk {
            columns: types.iter().map(|&ty| Column::new(ty)).collect(),
            num_rows: 0,
        }
    }

    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn column_types(&self) -> Vec<ColumnType> {
        self.columns.iter().map(|c| c.ty()).collect()
    }

    /// Append one row.
    ///
    /// # Panics
    /// Panics if the value count or any value type does not match the chunk
    /// schema; schema mismatches are caller bugs, not runtime conditions.
    pub fn append_row(&mut self, values: &[Value]) {
        assert_eq!(
            values.len(),
            self.columns.len(),
            "expected {} values, got {}",
            self.columns.len(),
            values.len()
        );
        for (col, (buf, v)) in self.columns.iter_mut().zip(values).enumerate() {
            buf.push(v, col);
        }
        self.num_rows += 1;
    }

    /// O(1) view of the row at `idx`.
    ///
    /// # Panics
    /// Panics if `idx` is out of range.
    pub fn get_row(&self, idx: usize) -> Row<'_> {
        assert!(idx < self.num_rows, "row {} out of range ({} rows)", idx, self.num_rows);
        Row::new(self, idx)
    }

    /// Rebuild a chunk from decoded column buffers. The caller guarantees
    /// every buffer holds exactly `num_rows` entries.
    pub(crate) fn from_columns(columns: Vec<Column>, num_rows: usize) -> Self {
        Chunk { columns, num_rows }
    }

    pub(crate) fn cell(&self, col: usize, idx: usize) -> ValueRef<'_> {
        self.columns[col].get(idx)
    }

    pub(crate) fn columns(&self) -> &[Column] {
        &self.columns
    }
}
