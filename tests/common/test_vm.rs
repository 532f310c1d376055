// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Test VM for end-to-end testing.
//!
//! Wraps the same public `interpret` entry point the CLI and REPL use,
//! capturing `print` output into a buffer instead of going to real
//! stdout so scenarios can assert on it directly.

use loxvm::{InterpretResult, Vm};

/// A stateful VM with its own heap, for source-to-stdout scenarios.
///
/// Each test should create its own `TestVm`: state (globals, interned
/// strings, heap contents) persists across `run` calls on the same
/// instance, mirroring REPL behavior.
pub struct TestVm {
    vm: Vm,
}

impl Default for TestVm {
    fn default() -> Self {
        Self::new()
    }
}

impl TestVm {
    #[must_use]
    pub fn new() -> Self {
        Self { vm: Vm::new() }
    }

    /// Runs `source`, returning its captured stdout and the interpret result.
    pub fn run(&mut self, source: &str) -> (InterpretResult, String) {
        let mut out = Vec::new();
        let result = self.vm.interpret(source, &mut out);
        (result, String::from_utf8(out).expect("vm output is always valid UTF-8"))
    }

    /// Runs `source` and panics unless it succeeds, returning just the output.
    ///
    /// # Panics
    ///
    /// Panics if `source` doesn't compile and run to completion.
    #[must_use]
    pub fn expect_ok(&mut self, source: &str) -> String {
        let (result, out) = self.run(source);
        assert_eq!(result, InterpretResult::Ok, "expected {source:?} to succeed, output so far: {out:?}");
        out
    }
}
