// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

use super::*;
use crate::value::object::{LoxClosure, LoxFunction};

#[test]
fn interning_the_same_text_returns_the_same_ref() {
    let mut heap = Heap::new();
    let a = heap.intern("hello");
    let b = heap.intern("hello");
    assert_eq!(a, b);
}

#[test]
fn interning_different_text_returns_different_refs() {
    let mut heap = Heap::new();
    let a = heap.intern("hello");
    let b = heap.intern("world");
    assert_ne!(a, b);
}

#[test]
fn unmarked_objects_are_swept() {
    let mut heap = Heap::new();
    heap.intern("garbage");
    let before = heap.bytes_allocated;
    heap.collect();
    assert!(heap.bytes_allocated < before);
}

#[test]
fn marked_objects_survive_a_collection() {
    let mut heap = Heap::new();
    let kept = heap.intern("kept");
    heap.mark_object(kept);
    heap.collect();
    assert_eq!(heap.get(kept).as_string().unwrap().chars.as_ref(), "kept");
}

#[test]
fn function_constants_are_traced_through_a_marked_closure() {
    let mut heap = Heap::new();
    let name = heap.intern("inner");
    let mut function = LoxFunction::new(Some(name));
    let constant_name = heap.intern("payload");
    let _ = function.chunk.add_constant(Value::obj(constant_name));
    let function_ref = heap.insert(Obj::Function(function));
    let closure_ref = heap.insert(Obj::Closure(LoxClosure {
        function: function_ref,
        upvalues: Vec::new(),
    }));

    heap.mark_object(closure_ref);
    heap.collect();

    // If `constant_name` hadn't been traced through closure -> function
    // -> chunk constants, this access would panic on a freed slot.
    assert_eq!(heap.get(constant_name).as_string().unwrap().chars.as_ref(), "payload");
}

#[test]
fn should_collect_honors_stress_flag() {
    let mut heap = Heap::new();
    assert!(!heap.should_collect());
    heap.stress_gc = true;
    assert!(heap.should_collect());
}
