// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Heap object variants.
//!
//! Every heap object is a variant of [`Obj`], stored in one arena slot
//! (see [`crate::heap::Heap`]). There is no common struct header the way
//! a C union would have one — the enum discriminant plays that role,
//! and the GC mark bit lives on the arena slot rather than the object.

use crate::chunk::Chunk;
use crate::table::Table;
use crate::value::Value;

/// A handle to a heap object: an index into the heap's arena.
///
/// Two `ObjRef`s are equal iff they name the same arena slot. For
/// interned strings this coincides with content equality.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjRef(pub(crate) u32);

impl ObjRef {
    #[must_use]
    pub(crate) const fn from_index(index: u32) -> Self {
        Self(index)
    }

    #[must_use]
    pub(crate) const fn index(self) -> u32 {
        self.0
    }
}

impl core::fmt::Debug for ObjRef {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// An interned, immutable string.
#[derive(Debug, Clone)]
pub struct LoxString {
    pub chars: Box<str>,
    pub hash: u32,
}

impl LoxString {
    /// FNV-1a, the hash used for string interning.
    #[must_use]
    pub fn hash_bytes(bytes: &[u8]) -> u32 {
        let mut hash: u32 = 2_166_136_261;
        for &b in bytes {
            hash ^= u32::from(b);
            hash = hash.wrapping_mul(16_777_619);
        }
        hash
    }
}

/// A compiled function: arity, upvalue count, optional name, owned chunk.
///
/// The top-level script is represented as a nameless `LoxFunction` with
/// arity 0.
#[derive(Debug, Clone)]
pub struct LoxFunction {
    pub arity: u8,
    pub upvalue_count: usize,
    pub name: Option<ObjRef>,
    pub chunk: Chunk,
}

impl LoxFunction {
    #[must_use]
    pub fn new(name: Option<ObjRef>) -> Self {
        Self {
            arity: 0,
            upvalue_count: 0,
            name,
            chunk: Chunk::new(),
        }
    }
}

/// A closure: a function plus its resolved upvalues.
#[derive(Debug, Clone)]
pub struct LoxClosure {
    pub function: ObjRef,
    pub upvalues: Vec<ObjRef>,
}

/// A captured variable. Open points into the VM stack; closed owns its value.
///
/// `next` threads this object into `Vm::open_upvalues`, an intrusive
/// list sorted by descending stack slot while the upvalue is open.
/// Once closed the field is unused.
#[derive(Debug, Clone)]
pub struct LoxUpvalue {
    pub state: UpvalueState,
    pub next: Option<ObjRef>,
}

#[derive(Debug, Clone, Copy)]
pub enum UpvalueState {
    Open { stack_slot: usize },
    Closed(Value),
}

impl LoxUpvalue {
    #[must_use]
    pub const fn open(stack_slot: usize) -> Self {
        Self {
            state: UpvalueState::Open { stack_slot },
            next: None,
        }
    }
}

/// A class: name plus a method table (method name -> `Value::Obj(Closure)`).
#[derive(Debug, Clone)]
pub struct LoxClass {
    pub name: ObjRef,
    pub methods: Table,
}

impl LoxClass {
    #[must_use]
    pub const fn new(name: ObjRef) -> Self {
        Self {
            name,
            methods: Table::new(),
        }
    }
}

/// An instance: class pointer plus a field table.
#[derive(Debug, Clone)]
pub struct LoxInstance {
    pub class: ObjRef,
    pub fields: Table,
}

impl LoxInstance {
    #[must_use]
    pub const fn new(class: ObjRef) -> Self {
        Self {
            class,
            fields: Table::new(),
        }
    }
}

/// A method bound to a receiver, produced when a method is read as a property.
#[derive(Debug, Clone, Copy)]
pub struct LoxBoundMethod {
    pub receiver: Value,
    pub method: ObjRef,
}

/// A host-provided function: `(arg_count, &args) -> Value`.
pub type NativeFn = fn(args: &[Value]) -> Value;

#[derive(Clone, Copy)]
pub struct LoxNative {
    pub name: ObjRef,
    pub function: NativeFn,
}

impl core::fmt::Debug for LoxNative {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "LoxNative({:?})", self.name)
    }
}

/// One heap object. Discriminant stands in for the C header's `type_tag`.
#[derive(Debug, Clone)]
pub enum Obj {
    String(LoxString),
    Function(LoxFunction),
    Closure(LoxClosure),
    Upvalue(LoxUpvalue),
    Class(LoxClass),
    Instance(LoxInstance),
    BoundMethod(LoxBoundMethod),
    Native(LoxNative),
}

impl Obj {
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::String(_) => "string",
            Self::Function(_) => "function",
            Self::Closure(_) => "function",
            Self::Upvalue(_) => "upvalue",
            Self::Class(_) => "class",
            Self::Instance(_) => "instance",
            Self::BoundMethod(_) => "function",
            Self::Native(_) => "native function",
        }
    }

    #[must_use]
    pub fn as_string(&self) -> Option<&LoxString> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_function(&self) -> Option<&LoxFunction> {
        match self {
            Self::Function(f) => Some(f),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_function_mut(&mut self) -> Option<&mut LoxFunction> {
        match self {
            Self::Function(f) => Some(f),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_closure(&self) -> Option<&LoxClosure> {
        match self {
            Self::Closure(c) => Some(c),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_upvalue(&self) -> Option<&LoxUpvalue> {
        match self {
            Self::Upvalue(u) => Some(u),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_upvalue_mut(&mut self) -> Option<&mut LoxUpvalue> {
        match self {
            Self::Upvalue(u) => Some(u),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_class(&self) -> Option<&LoxClass> {
        match self {
            Self::Class(c) => Some(c),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_class_mut(&mut self) -> Option<&mut LoxClass> {
        match self {
            Self::Class(c) => Some(c),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_instance(&self) -> Option<&LoxInstance> {
        match self {
            Self::Instance(i) => Some(i),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_instance_mut(&mut self) -> Option<&mut LoxInstance> {
        match self {
            Self::Instance(i) => Some(i),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bound_method(&self) -> Option<&LoxBoundMethod> {
        match self {
            Self::BoundMethod(b) => Some(b),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_native(&self) -> Option<&LoxNative> {
        match self {
            Self::Native(n) => Some(n),
            _ => None,
        }
    }
}
