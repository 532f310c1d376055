// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Per-function compiler state: locals, upvalues, and the scope-depth
//! bookkeeping that drives block-exit `OP_POP`/`OP_CLOSE_UPVALUE`
//! emission. One [`FunctionScope`] exists per function body being
//! compiled, nested for nested `fun`/method declarations.

use crate::value::object::LoxFunction;

pub const MAX_LOCALS: usize = u8::MAX as usize + 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionKind {
    Function,
    Initializer,
    Method,
    Script,
}

#[derive(Debug, Clone)]
pub struct Local {
    pub name: String,
    /// `None` means "declared but not yet initialized" - reading it is an error.
    pub depth: Option<u32>,
    pub is_captured: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct UpvalueSlot {
    pub index: u8,
    pub is_local: bool,
}

/// One function's worth of local-variable and upvalue bookkeeping, plus
/// the function being built. Chained to its enclosing scope so upvalue
/// resolution can walk outward.
pub struct FunctionScope {
    pub function: LoxFunction,
    pub kind: FunctionKind,
    pub locals: Vec<Local>,
    pub upvalues: Vec<UpvalueSlot>,
    pub scope_depth: u32,
}

impl FunctionScope {
    #[must_use]
    pub fn new(kind: FunctionKind, name: Option<crate::value::ObjRef>) -> Self {
        let receiver_name = if kind == FunctionKind::Function { "" } else { "this" };
        Self {
            function: LoxFunction::new(name),
            kind,
            locals: vec![Local {
                name: receiver_name.to_string(),
                depth: Some(0),
                is_captured: false,
            }],
            upvalues: Vec::new(),
            scope_depth: 0,
        }
    }

    /// Resolves `name` to a local slot index in this scope, innermost first.
    pub fn resolve_local(&self, name: &str) -> Result<Option<usize>, &'static str> {
        for (index, local) in self.locals.iter().enumerate().rev() {
            if local.name == name {
                return if local.depth.is_none() {
                    Err("Can't read local variable in its own initializer.")
                } else {
                    Ok(Some(index))
                };
            }
        }
        Ok(None)
    }

    /// Adds (or reuses) an upvalue referring to `index` in the
    /// immediately enclosing scope (`is_local`) or further out.
    pub fn add_upvalue(&mut self, index: u8, is_local: bool) -> Result<u8, &'static str> {
        for (slot, existing) in self.upvalues.iter().enumerate() {
            if existing.index == index && existing.is_local == is_local {
                return u8::try_from(slot).map_err(|_| "Too many closure variables in function.");
            }
        }
        if self.upvalues.len() >= MAX_LOCALS {
            return Err("Too many closure variables in function.");
        }
        self.upvalues.push(UpvalueSlot { index, is_local });
        self.function.upvalue_count = self.upvalues.len();
        u8::try_from(self.upvalues.len() - 1).map_err(|_| "Too many closure variables in function.")
    }

    pub fn declare_local(&mut self, name: &str) -> Result<(), &'static str> {
        if self.locals.len() >= MAX_LOCALS {
            return Err("Too many local variables in function.");
        }
        for local in self.locals.iter().rev() {
            if let Some(depth) = local.depth {
                if depth < self.scope_depth {
                    break;
                }
            }
            if local.name == name {
                return Err("Already a variable with this name in this scope.");
            }
        }
        self.locals.push(Local {
            name: name.to_string(),
            depth: None,
            is_captured: false,
        });
        Ok(())
    }

    pub fn mark_initialized(&mut self) {
        if self.scope_depth == 0 {
            return;
        }
        if let Some(local) = self.locals.last_mut() {
            local.depth = Some(self.scope_depth);
        }
    }
}

/// Resolves `name` as an upvalue of `scopes[index]`, recursing outward
/// through enclosing scopes and threading a chain of upvalue slots back
/// in so every intermediate function also captures it.
pub fn resolve_upvalue(scopes: &mut [FunctionScope], index: usize, name: &str) -> Result<Option<u8>, &'static str> {
    if index == 0 {
        return Ok(None);
    }

    if let Some(local_index) = scopes[index - 1].resolve_local(name)? {
        scopes[index - 1].locals[local_index].is_captured = true;
        let idx = u8::try_from(local_index).map_err(|_| "Too many local variables in function.")?;
        return scopes[index].add_upvalue(idx, true).map(Some);
    }

    if let Some(upvalue_index) = resolve_upvalue(scopes, index - 1, name)? {
        return scopes[index].add_upvalue(upvalue_index, false).map(Some);
    }

    Ok(None)
}
