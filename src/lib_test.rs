// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Tests for the library root.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use super::*;

#[test]
fn public_api_round_trips_a_program() {
    let mut vm = Vm::new();
    let mut out = Vec::new();
    let result = vm.interpret("print 1 + 1;", &mut out);
    assert_eq!(result, InterpretResult::Ok);
    assert_eq!(out, b"2\n");
}

#[test]
fn compile_errors_are_reported_without_running_anything() {
    let mut vm = Vm::new();
    let mut out = Vec::new();
    let result = vm.interpret("var;", &mut out);
    assert_eq!(result, InterpretResult::CompileError);
    assert!(out.is_empty());
}
