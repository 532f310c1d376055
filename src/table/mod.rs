// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Open-addressed hash table keyed on interned strings.
//!
//! This is the one data structure backing globals, instance fields, and
//! class method tables. Keys are [`ObjRef`]s that must already name an
//! interned string; equality is by arena index, which collapses to
//! string-content equality because strings are interned (see
//! [`crate::heap::Heap::intern`]).
//!
//! Mirrors the probing scheme in `examples/original_source/src/table.c`:
//! power-of-two capacity, 0.75 max load factor, linear probing, and
//! tombstones on delete so probe chains survive removals.

#[cfg(test)]
mod table_test;

use crate::value::{ObjRef, Value};

const MAX_LOAD: f64 = 0.75;
const INITIAL_CAPACITY: usize = 8;

#[derive(Clone)]
#[derive(Debug)]
enum Slot {
    Empty,
    Tombstone,
    Occupied { key: ObjRef, hash: u32, value: Value },
}

/// A hash table from interned string keys to `Value`s.
#[derive(Debug, Clone)]
pub struct Table {
    entries: Vec<Slot>,
    /// Number of occupied slots plus tombstones (what `table.c` calls `count`).
    count: usize,
}

impl Table {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
            count: 0,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .iter()
            .filter(|s| matches!(s, Slot::Occupied { .. }))
            .count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn capacity(&self) -> usize {
        self.entries.len()
    }

    /// Finds the key's slot, or the first free slot (tombstone preferred)
    /// it would occupy. `hash_of` resolves an `ObjRef` to its cached
    /// string hash without needing a `Heap` reference threaded through
    /// every table method.
    fn find_slot(entries: &[Slot], hash: u32, key: ObjRef, keys_equal: &impl Fn(ObjRef, ObjRef) -> bool) -> usize {
        let cap = entries.len();
        let mut index = (hash as usize) & (cap - 1);
        let mut tombstone: Option<usize> = None;
        loop {
            match &entries[index] {
                Slot::Empty => return tombstone.unwrap_or(index),
                Slot::Tombstone => {
                    if tombstone.is_none() {
                        tombstone = Some(index);
                    }
                }
                Slot::Occupied { key: k, .. } if keys_equal(*k, key) => return index,
                Slot::Occupied { .. } => {}
            }
            index = (index + 1) & (cap - 1);
        }
    }

    fn grow(&mut self, keys_equal: &impl Fn(ObjRef, ObjRef) -> bool) {
        let new_cap = if self.entries.is_empty() {
            INITIAL_CAPACITY
        } else {
            self.entries.len() * 2
        };
        let mut new_entries = vec![Slot::Empty; new_cap];
        let mut new_count = 0;
        for slot in &self.entries {
            if let Slot::Occupied { key, hash, value } = slot {
                let index = Self::find_slot(&new_entries, *hash, *key, keys_equal);
                new_entries[index] = Slot::Occupied {
                    key: *key,
                    hash: *hash,
                    value: *value,
                };
                new_count += 1;
            }
        }
        self.entries = new_entries;
        self.count = new_count;
    }

    /// Looks up `key`, using `hash` (the key's cached string hash) and
    /// `keys_equal` for arena-index comparison.
    #[must_use]
    pub fn get(&self, key: ObjRef, hash: u32, keys_equal: impl Fn(ObjRef, ObjRef) -> bool) -> Option<Value> {
        if self.entries.is_empty() {
            return None;
        }
        let index = Self::find_slot(&self.entries, hash, key, &keys_equal);
        match &self.entries[index] {
            Slot::Occupied { value, .. } => Some(*value),
            _ => None,
        }
    }

    /// Inserts or overwrites `key -> value`. Returns `true` if this was a new key.
    pub fn set(&mut self, key: ObjRef, hash: u32, value: Value, keys_equal: impl Fn(ObjRef, ObjRef) -> bool) -> bool {
        #[allow(clippy::cast_precision_loss)]
        if self.count + 1 > (self.capacity() as f64 * MAX_LOAD) as usize {
            self.grow(&keys_equal);
        }
        let index = Self::find_slot(&self.entries, hash, key, &keys_equal);
        let is_new_key = !matches!(self.entries[index], Slot::Occupied { .. });
        if is_new_key && matches!(self.entries[index], Slot::Empty) {
            self.count += 1;
        }
        self.entries[index] = Slot::Occupied { key, hash, value };
        is_new_key
    }

    /// Removes `key`, leaving a tombstone so later probes don't stop short.
    pub fn delete(&mut self, key: ObjRef, hash: u32, keys_equal: impl Fn(ObjRef, ObjRef) -> bool) -> bool {
        if self.entries.is_empty() {
            return false;
        }
        let index = Self::find_slot(&self.entries, hash, key, &keys_equal);
        if !matches!(self.entries[index], Slot::Occupied { .. }) {
            return false;
        }
        self.entries[index] = Slot::Tombstone;
        true
    }

    /// Finds an interned string slot by raw content, used to dedup string
    /// literals/identifiers during interning itself (`table_find_string`
    /// in the reference table, where the lookup has no `ObjRef` yet to
    /// compare — only the raw bytes and hash).
    pub fn find_string(&self, hash: u32, matches_contents: impl Fn(ObjRef) -> bool) -> Option<ObjRef> {
        if self.entries.is_empty() {
            return None;
        }
        let cap = self.entries.len();
        let mut index = (hash as usize) & (cap - 1);
        loop {
            match &self.entries[index] {
                Slot::Empty => return None,
                Slot::Occupied { key, hash: h, .. } if *h == hash && matches_contents(*key) => return Some(*key),
                Slot::Occupied { .. } | Slot::Tombstone => {}
            }
            index = (index + 1) & (cap - 1);
        }
    }

    /// Copies every entry of `from` into `self`, used when a method table
    /// needs to be cloned (none currently do - kept because it's a cheap,
    /// direct analogue of `table_copy` and the GC mark pass below needs
    /// the same full-slot iteration shape).
    pub fn iter(&self) -> impl Iterator<Item = (ObjRef, Value)> + '_ {
        self.entries.iter().filter_map(|s| match s {
            Slot::Occupied { key, value, .. } => Some((*key, *value)),
            _ => None,
        })
    }
}

impl Default for Table {
    fn default() -> Self {
        Self::new()
    }
}
