// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! `loxvm` - run a script file, or start an interactive REPL.
//!
//! Usage: `loxvm [script]`

use std::path::PathBuf;
use std::process::ExitCode;
use std::{fs, io};

use clap::Parser;
use loxvm::{InterpretResult, Vm};
use tracing_subscriber::EnvFilter;

/// A bytecode interpreter for a small Lox-family scripting language.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Script file to run. Omit to start an interactive REPL.
    script: Option<PathBuf>,
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_env("LOXVM_LOG").unwrap_or_else(|_| EnvFilter::new("off")))
        .with_writer(io::stderr)
        .init();
}

fn run_file(path: &PathBuf, vm: &mut Vm) -> ExitCode {
    let source = match fs::read_to_string(path) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("loxvm: can't read file '{}': {err}", path.display());
            return ExitCode::from(74);
        }
    };

    let stdout = io::stdout();
    match vm.interpret(&source, &mut stdout.lock()) {
        InterpretResult::Ok => ExitCode::SUCCESS,
        InterpretResult::CompileError => ExitCode::from(65),
        InterpretResult::RuntimeError => ExitCode::from(70),
    }
}

fn main() -> ExitCode {
    // clap's own arity handling doesn't land on the exit code this
    // interpreter promises for "too many arguments", so the check is
    // done by hand before handing off to the derived parser.
    if std::env::args().len() > 2 {
        eprintln!("Usage: loxvm [script]");
        return ExitCode::from(64);
    }

    init_logging();

    let cli = Cli::parse();
    let mut vm = Vm::new();

    match cli.script {
        Some(path) => run_file(&path, &mut vm),
        None => {
            loxvm::repl::run_stdio(&mut vm);
            ExitCode::SUCCESS
        }
    }
}
