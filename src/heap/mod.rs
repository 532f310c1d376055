// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! The object heap: an arena of [`Obj`]s plus the tracing mark-sweep
//! collector's object-local half (marking children, sweeping unmarked
//! slots). Root discovery — the VM stack, call frames, open upvalues,
//! globals, and the active compiler chain — lives on [`crate::vm::Vm`],
//! which owns those structures; this module only knows how to walk an
//! object's *own* references once it has been marked a root.
//!
//! Heap objects are arena slots (`ObjRef` = index) rather than an
//! intrusive linked list of raw pointers, keeping the whole collector
//! safe-Rust. The free list recycles slots vacated by a sweep so
//! long-running programs don't grow the arena unbounded.

#[cfg(test)]
mod heap_test;

use tracing::debug;

use crate::table::Table;
use crate::value::object::LoxString;
use crate::value::{Obj, ObjRef, Value};

/// Handles collected out of one object's body so [`Heap::blacken`] can
/// mark them without holding a borrow of `self.slots`.
enum Children {
    None,
    Value(Value),
    Function { name: Option<ObjRef>, constants: Vec<Value> },
    Closure { function: ObjRef, upvalues: Vec<ObjRef> },
    Table { name: Option<ObjRef>, entries: Vec<(ObjRef, Value)> },
    BoundMethod { receiver: Value, method: ObjRef },
}

/// Trigger the first collection once the heap has grown past this many
/// live bytes (matches the reference implementation's default).
const INITIAL_NEXT_GC: usize = 1024 * 1024;
const GC_HEAP_GROW_FACTOR: usize = 2;

enum Slot {
    Free { next_free: Option<u32> },
    Live { marked: bool, object: Obj },
}

/// Owns every heap-allocated Lox value and the string intern set.
pub struct Heap {
    slots: Vec<Slot>,
    free_head: Option<u32>,
    strings: Table,
    gray_stack: Vec<ObjRef>,
    pub bytes_allocated: usize,
    pub next_gc: usize,
    /// `LOXVM_GC_STRESS=1`: collect before every allocation.
    pub stress_gc: bool,
}

fn approx_size(object: &Obj) -> usize {
    match object {
        Obj::String(s) => core::mem::size_of::<LoxString>() + s.chars.len(),
        Obj::Function(f) => core::mem::size_of_val(f) + f.chunk.code.len() + f.chunk.constants.len() * 16,
        Obj::Closure(c) => core::mem::size_of_val(c) + c.upvalues.len() * 4,
        Obj::Upvalue(u) => core::mem::size_of_val(u),
        Obj::Class(c) => core::mem::size_of_val(c),
        Obj::Instance(i) => core::mem::size_of_val(i),
        Obj::BoundMethod(b) => core::mem::size_of_val(b),
        Obj::Native(n) => core::mem::size_of_val(n),
    }
}

impl Heap {
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_head: None,
            strings: Table::new(),
            gray_stack: Vec::new(),
            bytes_allocated: 0,
            next_gc: INITIAL_NEXT_GC,
            stress_gc: false,
        }
    }

    /// Whether the caller should run a full collection before the next
    /// allocation (checked by `Vm::alloc*` before calling `insert`).
    #[must_use]
    pub fn should_collect(&self) -> bool {
        self.stress_gc || self.bytes_allocated > self.next_gc
    }

    /// Places `object` into a free slot (or grows the arena) and
    /// returns its handle. Does not itself trigger a collection -
    /// callers check [`Self::should_collect`] first so they can mark
    /// their roots before objects move around.
    pub fn insert(&mut self, object: Obj) -> ObjRef {
        self.bytes_allocated += approx_size(&object);
        if let Some(index) = self.free_head {
            let slot = &mut self.slots[index as usize];
            let Slot::Free { next_free } = *slot else {
                unreachable!("free_head must point at a Free slot")
            };
            self.free_head = next_free;
            *slot = Slot::Live { marked: false, object };
            ObjRef::from_index(index)
        } else {
            let index = u32::try_from(self.slots.len()).expect("heap arena exceeds u32::MAX slots");
            self.slots.push(Slot::Live { marked: false, object });
            ObjRef::from_index(index)
        }
    }

    #[must_use]
    pub fn get(&self, r: ObjRef) -> &Obj {
        match &self.slots[r.index() as usize] {
            Slot::Live { object, .. } => object,
            Slot::Free { .. } => panic!("dangling ObjRef {r:?}"),
        }
    }

    pub fn get_mut(&mut self, r: ObjRef) -> &mut Obj {
        match &mut self.slots[r.index() as usize] {
            Slot::Live { object, .. } => object,
            Slot::Free { .. } => panic!("dangling ObjRef {r:?}"),
        }
    }

    fn get_from(slots: &[Slot], r: ObjRef) -> &Obj {
        match &slots[r.index() as usize] {
            Slot::Live { object, .. } => object,
            Slot::Free { .. } => panic!("dangling ObjRef {r:?}"),
        }
    }

    fn string_eq_from(slots: &[Slot], a: ObjRef, b: ObjRef) -> bool {
        a == b || Self::get_from(slots, a).as_string().map(|s| &s.chars) == Self::get_from(slots, b).as_string().map(|s| &s.chars)
    }

    /// Interns `chars`, returning the existing `ObjRef` if an equal
    /// string is already on the heap. Mirrors `table_find_string` in
    /// the reference table: the intern set is keyed by raw content and
    /// hash, since there's no `ObjRef` yet for a lookup that might miss.
    pub fn intern(&mut self, chars: &str) -> ObjRef {
        let hash = LoxString::hash_bytes(chars.as_bytes());
        if let Some(existing) = self.strings.find_string(hash, |candidate| {
            self.get(candidate).as_string().is_some_and(|s| &*s.chars == chars)
        }) {
            return existing;
        }
        let r = self.insert(Obj::String(LoxString {
            chars: chars.into(),
            hash,
        }));
        let slots = &self.slots;
        let eq = |a: ObjRef, b: ObjRef| Self::string_eq_from(slots, a, b);
        self.strings.set(r, hash, Value::Nil, eq);
        r
    }

    /// Marks `r`'s slot and queues it for child-reference tracing.
    /// No-ops if already marked (breaks cycles).
    pub fn mark_object(&mut self, r: ObjRef) {
        if let Slot::Live { marked, .. } = &mut self.slots[r.index() as usize] {
            if *marked {
                return;
            }
            *marked = true;
            self.gray_stack.push(r);
        }
    }

    pub fn mark_value(&mut self, value: Value) {
        if let Value::Obj(r) = value {
            self.mark_object(r);
        }
    }

    /// Drains the gray stack, marking every object reachable from an
    /// already-marked root. Call once all roots have been marked.
    fn trace_references(&mut self) {
        while let Some(r) = self.gray_stack.pop() {
            self.blacken(r);
        }
    }

    fn blacken(&mut self, r: ObjRef) {
        // Each arm copies out only the small handles/values it needs to
        // mark, rather than cloning the whole object (a `LoxFunction`
        // owns its entire `Chunk`).
        let children: Children = match self.get(r) {
            Obj::String(_) | Obj::Native(_) => Children::None,
            Obj::Function(f) => Children::Function {
                name: f.name,
                constants: f.chunk.constants.clone(),
            },
            Obj::Closure(c) => Children::Closure {
                function: c.function,
                upvalues: c.upvalues.clone(),
            },
            Obj::Upvalue(u) => match u.state {
                crate::value::object::UpvalueState::Closed(value) => Children::Value(value),
                crate::value::object::UpvalueState::Open { .. } => Children::None,
            },
            Obj::Class(c) => Children::Table {
                name: Some(c.name),
                entries: c.methods.iter().collect(),
            },
            Obj::Instance(i) => Children::Table {
                name: Some(i.class),
                entries: i.fields.iter().collect(),
            },
            Obj::BoundMethod(b) => Children::BoundMethod {
                receiver: b.receiver,
                method: b.method,
            },
        };
        match children {
            Children::None => {}
            Children::Value(value) => self.mark_value(value),
            Children::Function { name, constants } => {
                if let Some(name) = name {
                    self.mark_object(name);
                }
                for constant in constants {
                    self.mark_value(constant);
                }
            }
            Children::Closure { function, upvalues } => {
                self.mark_object(function);
                for upvalue in upvalues {
                    self.mark_object(upvalue);
                }
            }
            Children::Table { name, entries } => {
                if let Some(name) = name {
                    self.mark_object(name);
                }
                for (key, value) in entries {
                    self.mark_object(key);
                    self.mark_value(value);
                }
            }
            Children::BoundMethod { receiver, method } => {
                self.mark_value(receiver);
                self.mark_object(method);
            }
        }
    }

    /// Removes intern-table entries for strings that didn't survive
    /// this cycle's mark phase (a weak-reference sweep; `table.c` calls
    /// the analogous pass `table_remove_white`).
    fn sweep_strings(&mut self) {
        let dead: Vec<ObjRef> = self
            .strings
            .iter()
            .map(|(key, _)| key)
            .filter(|key| !matches!(self.slots[key.index() as usize], Slot::Live { marked: true, .. }))
            .collect();
        for key in dead {
            let hash = self.get(key).as_string().map_or(0, |s| s.hash);
            let slots = &self.slots;
            let eq = |a: ObjRef, b: ObjRef| Self::string_eq_from(slots, a, b);
            self.strings.delete(key, hash, eq);
        }
    }

    /// Reclaims every unmarked slot, returning bytes freed. Marked
    /// slots are reset to unmarked for the next cycle.
    fn sweep_objects(&mut self) -> usize {
        let mut freed = 0;
        for index in 0..self.slots.len() {
            match &self.slots[index] {
                Slot::Live { marked: true, .. } => {
                    let Slot::Live { marked, .. } = &mut self.slots[index] else {
                        unreachable!()
                    };
                    *marked = false;
                }
                Slot::Live { marked: false, .. } => {
                    let old = core::mem::replace(&mut self.slots[index], Slot::Free { next_free: self.free_head });
                    if let Slot::Live { object, .. } = old {
                        freed += approx_size(&object);
                    }
                    self.free_head = Some(u32::try_from(index).expect("index fit earlier"));
                }
                Slot::Free { .. } => {}
            }
        }
        freed
    }

    /// Runs one full collection. The caller (`Vm::collect_garbage`) must
    /// mark every root - stack, frames, open upvalues, globals,
    /// `init_string`, compiler roots - before calling this.
    pub fn collect(&mut self) {
        let before = self.bytes_allocated;
        self.trace_references();
        self.sweep_strings();
        let freed = self.sweep_objects();
        self.bytes_allocated -= freed;
        self.next_gc = self.bytes_allocated.max(INITIAL_NEXT_GC / GC_HEAP_GROW_FACTOR) * GC_HEAP_GROW_FACTOR;
        debug!(
            freed,
            before,
            after = self.bytes_allocated,
            next_gc = self.next_gc,
            "gc cycle complete"
        );
    }
}

impl Default for Heap {
    fn default() -> Self {
        Self::new()
    }
}
