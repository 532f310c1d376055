// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Runtime faults. One variant per distinct way the VM can refuse to
//! keep executing; `loxvm` never panics on program input, so every
//! such fault is a `VmError` propagated with `?` rather than a panic.

use core::fmt;

#[derive(Debug, Clone)]
pub enum VmError {
    TypeMismatch { expected: &'static str, got: &'static str, line: u32 },
    UndefinedVariable { name: String, line: u32 },
    NotCallable { type_name: &'static str, line: u32 },
    ArityMismatch { expected: u8, got: u8, line: u32 },
    UndefinedProperty { name: String, line: u32 },
    OnlyInstancesHaveProperties { line: u32 },
    OnlyInstancesHaveMethods { line: u32 },
    StackOverflow { line: u32 },
    OutOfMemory,
}

impl fmt::Display for VmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TypeMismatch { expected, got, .. } => write!(f, "Operand must be {expected}, got {got}."),
            Self::UndefinedVariable { name, .. } => write!(f, "Undefined variable '{name}'."),
            Self::NotCallable { type_name, .. } => write!(f, "Can only call functions and classes, not {type_name}."),
            Self::ArityMismatch { expected, got, .. } => {
                write!(f, "Expected {expected} arguments but got {got}.")
            }
            Self::UndefinedProperty { name, .. } => write!(f, "Undefined property '{name}'."),
            Self::OnlyInstancesHaveProperties { .. } => write!(f, "Only instances have properties."),
            Self::OnlyInstancesHaveMethods { .. } => write!(f, "Only instances have methods."),
            Self::StackOverflow { .. } => write!(f, "Stack overflow."),
            Self::OutOfMemory => write!(f, "Out of memory."),
        }
    }
}

impl VmError {
    #[must_use]
    pub const fn line(&self) -> Option<u32> {
        match self {
            Self::TypeMismatch { line, .. }
            | Self::UndefinedVariable { line, .. }
            | Self::NotCallable { line, .. }
            | Self::ArityMismatch { line, .. }
            | Self::UndefinedProperty { line, .. }
            | Self::OnlyInstancesHaveProperties { line }
            | Self::OnlyInstancesHaveMethods { line }
            | Self::StackOverflow { line } => Some(*line),
            Self::OutOfMemory => None,
        }
    }
}
