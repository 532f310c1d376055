// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Interactive read-eval-print loop: a `"> "` prompt, one line at a
//! time, until EOF. Generic over its input/output so it can be driven
//! by a `Cursor` in tests instead of real stdio.

use std::io::{self, BufRead, Write};

use crate::vm::Vm;

/// Runs the loop over `input`/`output` until `input` reaches EOF.
pub fn run<R: BufRead, W: Write>(mut input: R, mut output: W, vm: &mut Vm) {
    let mut line = String::new();
    loop {
        let _ = write!(output, "> ");
        let _ = output.flush();
        line.clear();
        match input.read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {
                vm.interpret(&line, &mut output);
            }
        }
    }
}

/// Runs the loop over the process's real stdin/stdout.
pub fn run_stdio(vm: &mut Vm) {
    let stdin = io::stdin();
    let stdout = io::stdout();
    run(stdin.lock(), stdout.lock(), vm);
}
