use std::fs::{self, OpenOptions};

use rowstream::{ColumnType, Row, RowContainer, RowContainerIterator, RowIterator, Value, ValueRef};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn int_container(n: i64, max_chunk_rows: usize) -> RowContainer {
    let mut c = RowContainer::new(vec![ColumnType::Int], max_chunk_rows);
    for v in 0..n {
        c.append_row(&[Value::Int(v)]);
    }
    c
}

fn assert_int(row: Row, expected: i64) {
    assert_eq!(row.value(0), ValueRef::Int(expected));
}

/// Truncate the spill file, so every chunk not yet reloaded fails with a
/// short read. Stands in for an external-storage fault mid-iteration.
fn truncate_spill(c: &RowContainer) {
    let path = c.spill_path().expect("container has not spilled");
    let file = OpenOptions::new().write(true).open(path).unwrap();
    file.set_len(0).unwrap();
}

#[test]
fn resident_container_iterates_like_a_list() {
    init_logging();
    let c = int_container(5, 2);
    assert!(!c.has_spilled());
    let mut it = RowContainerIterator::new(&c);
    assert_eq!(it.len(), 5);

    let mut expected = 0i64;
    let mut row = it.begin();
    while row != it.end() {
        assert_int(row, expected);
        expected += 1;
        row = it.next();
    }
    assert_eq!(expected, 5);
    assert!(it.error().is_none());
}

#[test]
fn spilled_container_round_trips_all_rows() {
    init_logging();
    let mut c = RowContainer::new(
        vec![ColumnType::Int, ColumnType::Text, ColumnType::Bool],
        2,
    );
    for v in 0..5i64 {
        let text = if v % 2 == 0 { Value::Text(format!("row-{v}")) } else { Value::Null };
        c.append_row(&[Value::Int(v), text, Value::Bool(v % 2 == 0)]);
    }
    c.spill().unwrap();
    assert!(c.has_spilled());
    assert!(c.spill_path().is_some());
    assert_eq!(c.num_rows(), 5);
    assert_eq!(c.num_chunks(), 3);

    let mut it = RowContainerIterator::new(&c);
    let mut expected = 0i64;
    let mut row = it.begin();
    while row != it.end() {
        assert_int(row, expected);
        if expected % 2 == 0 {
            assert_eq!(row.value(1), ValueRef::Text(&format!("row-{expected}")));
        } else {
            assert_eq!(row.value(1), ValueRef::Null);
        }
        expected += 1;
        row = it.next();
    }
    assert_eq!(expected, 5);
    assert!(it.error().is_none());
}

#[test]
fn appends_after_spill_land_in_resident_tail() {
    init_logging();
    let mut c = int_container(3, 2);
    c.spill().unwrap();
    c.append_row(&[Value::Int(3)]);
    c.append_row(&[Value::Int(4)]);
    assert_eq!(c.num_rows(), 5);
    // Spilled [2, 1] then resident [2].
    assert_eq!(c.num_chunks(), 3);
    assert_eq!(c.num_rows_of_chunk(1), 1);
    assert_eq!(c.num_rows_of_chunk(2), 2);

    let mut it = RowContainerIterator::new(&c);
    let mut expected = 0i64;
    let mut row = it.begin();
    while row != it.end() {
        assert_int(row, expected);
        expected += 1;
        row = it.next();
    }
    assert_eq!(expected, 5);
}

#[test]
fn mid_stream_failure_parks_iterator_and_keeps_error() {
    init_logging();
    // Chunks [2, 2, 1]: rows 0 and 1 come out of chunk 0, row 2 needs
    // chunk 1 from disk.
    let mut c = int_container(5, 2);
    c.spill().unwrap();

    let mut it = RowContainerIterator::new(&c);
    assert_int(it.begin(), 0);
    assert_int(it.next(), 1);

    truncate_spill(&c);
    assert!(it.next().is_end());
    assert!(it.error().is_some(), "failed resolution must set the error slot");
    // Sentinel and error stick for the rest of the iterator's life.
    assert!(it.next().is_end());
    assert!(it.current().is_end());
    assert!(it.error().is_some());
    // The container-declared length is independent of the failure.
    assert_eq!(it.len(), 5);
}

#[test]
fn corrupt_spill_fails_begin_immediately() {
    init_logging();
    let mut c = int_container(4, 2);
    c.spill().unwrap();
    let path = c.spill_path().unwrap().to_path_buf();
    let len = fs::metadata(&path).unwrap().len() as usize;
    fs::write(&path, vec![0xFFu8; len]).unwrap();

    let mut it = RowContainerIterator::new(&c);
    // begin is "reset, then next": a first-row failure takes the normal
    // failure path.
    assert!(it.begin().is_end());
    let err = it.error().expect("corrupt record must surface an error");
    assert!(err.to_string().contains("corrupt"), "unexpected error: {err}");
    assert_eq!(it.len(), 4);
}

#[test]
fn reloaded_chunks_are_cached() {
    init_logging();
    let mut c = int_container(5, 2);
    c.spill().unwrap();

    // First pass pulls every chunk back into memory.
    let mut it = RowContainerIterator::new(&c);
    let mut row = it.begin();
    while row != it.end() {
        row = it.next();
    }
    assert!(it.error().is_none());

    // With the file gone, a second pass still works from the cache.
    truncate_spill(&c);
    let mut it = RowContainerIterator::new(&c);
    let mut expected = 0i64;
    let mut row = it.begin();
    while row != it.end() {
        assert_int(row, expected);
        expected += 1;
        row = it.next();
    }
    assert_eq!(expected, 5);
    assert!(it.error().is_none());
}

#[test]
fn empty_container() {
    let c = RowContainer::new(vec![ColumnType::Int], 4);
    let mut it = RowContainerIterator::new(&c);
    assert_eq!(it.len(), 0);
    assert!(it.begin().is_end());
    assert!(it.current().is_end());
    assert!(it.error().is_none());
}

#[test]
fn current_before_begin_is_sentinel() {
    let c = int_container(3, 2);
    let mut it = RowContainerIterator::new(&c);
    assert!(it.current().is_end());
}
