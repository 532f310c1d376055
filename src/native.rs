// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Host-provided functions exposed to Lox code as globals.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::value::Value;
use crate::vm::Vm;

/// Registers every native function this interpreter provides.
pub fn define_all(vm: &mut Vm) {
    vm.define_native("clock", clock);
}

/// Seconds since the Unix epoch, matching the reference implementation's
/// `clock() / CLOCKS_PER_SEC` (wall-clock rather than CPU time, since
/// there's no portable `clock()` equivalent on the host here).
fn clock(_args: &[Value]) -> Value {
    let elapsed = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default();
    Value::number(elapsed.as_secs_f64())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_returns_a_nonnegative_number() {
        let result = clock(&[]);
        assert!(result.as_number().is_some_and(|n| n >= 0.0));
    }

    #[test]
    fn define_all_registers_clock_as_a_global() {
        let mut vm = Vm::new();
        let mut out = Vec::new();
        let result = vm.interpret("print clock() >= 0;", &mut out);
        assert_eq!(result, crate::vm::InterpretResult::Ok);
        assert_eq!(String::from_utf8(out).unwrap(), "true\n");
    }
}
