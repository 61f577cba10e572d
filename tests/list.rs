use rowstream::{
    Chunk, ColumnType, List, ListIterator, Row, RowIterator, RowPointerIterator, RowPtr, Value,
    ValueRef,
};

fn int_chunk(values: &[i64]) -> Chunk {
    let mut chunk = Chunk::new(&[ColumnType::Int]);
    for &v in values {
        chunk.append_row(&[Value::Int(v)]);
    }
    chunk
}

fn assert_int(row: Row, expected: i64) {
    assert_eq!(row.value(0), ValueRef::Int(expected));
}

#[test]
fn list_append_rolls_into_new_chunks() {
    let mut list = List::new(vec![ColumnType::Int], 2);
    for v in 0..5 {
        list.append_row(&[Value::Int(v)]);
    }
    assert_eq!(list.len(), 5);
    assert_eq!(list.num_chunks(), 3);
    assert_eq!(list.get_chunk(0).num_rows(), 2);
    assert_eq!(list.get_chunk(2).num_rows(), 1);
}

#[test]
fn list_pointers_resolve_after_growth() {
    let mut list = List::new(vec![ColumnType::Int], 2);
    let mut ptrs = Vec::new();
    for v in 0..6 {
        ptrs.push(list.append_row(&[Value::Int(v)]));
    }
    for (v, ptr) in ptrs.iter().enumerate() {
        assert_int(list.get_row(*ptr), v as i64);
    }
}

#[test]
fn list_iterator_hides_chunk_boundaries() {
    // Chunk layout [1, 3, 2]: begin hits the single-row-chunk edge case,
    // and iteration crosses two boundaries.
    let mut list = List::new(vec![ColumnType::Int], 8);
    list.add_chunk(int_chunk(&[0]));
    list.add_chunk(int_chunk(&[1, 2, 3]));
    list.add_chunk(int_chunk(&[4, 5]));
    let mut it = ListIterator::new(&list);
    assert_eq!(it.len(), 6);

    let mut expected = 0i64;
    let mut row = it.begin();
    while row != it.end() {
        assert_int(row, expected);
        expected += 1;
        row = it.next();
    }
    assert_eq!(expected, 6);
    assert!(it.next().is_end());
}

#[test]
fn list_iterator_current_after_boundary_crossing() {
    let mut list = List::new(vec![ColumnType::Int], 8);
    list.add_chunk(int_chunk(&[0]));
    list.add_chunk(int_chunk(&[1, 2, 3]));
    list.add_chunk(int_chunk(&[4, 5]));
    let mut it = ListIterator::new(&list);

    let first = it.begin();
    assert_int(first, 0);
    // begin consumed the whole first chunk; current must still report its
    // last row, not row 0 of the next chunk.
    assert_eq!(it.current(), first);

    let second = it.next();
    assert_int(second, 1);
    assert_eq!(it.current(), second);
    let third = it.next();
    assert_int(third, 2);
    assert_eq!(it.current(), third);

    // Drain chunk 1; current right after the rollover points at its last row.
    let fourth = it.next();
    assert_int(fourth, 3);
    assert_eq!(it.current(), fourth);
    let fifth = it.next();
    assert_int(fifth, 4);
    assert_eq!(it.current(), fifth);
}

#[test]
fn list_iterator_empty_list() {
    let list = List::new(vec![ColumnType::Int], 4);
    let mut it = ListIterator::new(&list);
    assert_eq!(it.len(), 0);
    assert!(it.begin().is_end());
    assert!(it.current().is_end());
    assert!(it.error().is_none());
}

#[test]
fn list_iterator_reach_end() {
    let mut list = List::new(vec![ColumnType::Int], 2);
    for v in 0..5 {
        list.append_row(&[Value::Int(v)]);
    }
    let mut it = ListIterator::new(&list);
    it.begin();
    it.reach_end();
    assert!(it.current().is_end());
    assert!(it.next().is_end());
}

#[test]
fn row_pointer_iterator_replays_a_permutation() {
    let mut list = List::new(vec![ColumnType::Int], 2);
    let mut ptrs = Vec::new();
    for v in 0..5 {
        ptrs.push(list.append_row(&[Value::Int(v)]));
    }
    ptrs.reverse();
    let mut it = RowPointerIterator::new(&list, &ptrs);
    assert_eq!(it.len(), 5);

    let mut expected = 4i64;
    let mut row = it.begin();
    while row != it.end() {
        assert_int(row, expected);
        expected -= 1;
        row = it.next();
    }
    assert_eq!(expected, -1);
}

#[test]
fn row_pointer_iterator_selection_subset() {
    let mut list = List::new(vec![ColumnType::Int], 3);
    for v in 0..6 {
        list.append_row(&[Value::Int(v)]);
    }
    // Pick every other row, out of storage order.
    let ptrs = [RowPtr::new(1, 1), RowPtr::new(0, 0), RowPtr::new(0, 2)];
    let mut it = RowPointerIterator::new(&list, &ptrs);
    assert_eq!(it.len(), 3);
    assert_int(it.begin(), 4);
    assert_int(it.next(), 0);
    let last = it.next();
    assert_int(last, 2);
    assert_eq!(it.current(), last);
    assert!(it.next().is_end());
    assert!(it.error().is_none());
}

#[test]
fn row_pointer_iterator_empty_permutation() {
    let mut list = List::new(vec![ColumnType::Int], 2);
    list.append_row(&[Value::Int(1)]);
    let ptrs: [RowPtr; 0] = [];
    let mut it = RowPointerIterator::new(&list, &ptrs);
    assert_eq!(it.len(), 0);
    assert!(it.begin().is_end());
    assert!(it.current().is_end());
}
