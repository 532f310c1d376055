// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! These tests stand in as their own keys: in the real crate an
//! `ObjRef` only ever comes from `Heap::intern`, but `Table` itself
//! only needs `ObjRef` equality and a cached hash, so tests can use
//! bare indices as keys without a heap at all.

use super::*;

fn ref_of(index: u32) -> ObjRef {
    ObjRef::from_index(index)
}

fn by_index(a: ObjRef, b: ObjRef) -> bool {
    a == b
}

#[test]
fn get_on_empty_table_returns_none() {
    let table = Table::new();
    assert_eq!(table.get(ref_of(0), 1, by_index), None);
}

#[test]
fn set_then_get_roundtrips() {
    let mut table = Table::new();
    table.set(ref_of(1), 42, Value::number(7.0), by_index);
    assert_eq!(table.get(ref_of(1), 42, by_index), Some(Value::number(7.0)));
}

#[test]
fn set_returns_whether_key_was_new() {
    let mut table = Table::new();
    assert!(table.set(ref_of(1), 1, Value::nil(), by_index));
    assert!(!table.set(ref_of(1), 1, Value::bool(true), by_index));
}

#[test]
fn delete_leaves_tombstone_that_does_not_break_later_probes() {
    let mut table = Table::new();
    // Force two keys into the same bucket via a matching low hash bit pattern.
    table.set(ref_of(1), 8, Value::number(1.0), by_index);
    table.set(ref_of(2), 8, Value::number(2.0), by_index);
    assert!(table.delete(ref_of(1), 8, by_index));
    assert_eq!(table.get(ref_of(2), 8, by_index), Some(Value::number(2.0)));
    assert_eq!(table.get(ref_of(1), 8, by_index), None);
}

#[test]
fn grows_past_max_load_factor() {
    let mut table = Table::new();
    for i in 0..100u32 {
        table.set(ref_of(i), i, Value::number(f64::from(i)), by_index);
    }
    assert_eq!(table.len(), 100);
    for i in 0..100u32 {
        assert_eq!(table.get(ref_of(i), i, by_index), Some(Value::number(f64::from(i))));
    }
}

#[test]
fn find_string_matches_by_content_predicate() {
    let mut table = Table::new();
    table.set(ref_of(5), 99, Value::nil(), by_index);
    let found = table.find_string(99, |candidate| candidate == ref_of(5));
    assert_eq!(found, Some(ref_of(5)));
}

#[test]
fn find_string_returns_none_when_hash_does_not_match() {
    let mut table = Table::new();
    table.set(ref_of(5), 99, Value::nil(), by_index);
    assert_eq!(table.find_string(100, |_| true), None);
}
