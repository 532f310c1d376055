// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! The single-pass Pratt parser/compiler: turns source text directly
//! into a [`LoxFunction`]'s bytecode, with no intermediate AST.
//!
//! Scan-on-demand, one-token lookahead (`current`/`previous`), and the
//! precedence-climbing `parse_precedence` loop all mirror the reference
//! compiler in `examples/original_source/src/compiler.c`.

mod rules;
mod scope;

use tracing::trace;

use crate::chunk::op;
use crate::heap::Heap;
use crate::scanner::{Scanner, Token, TokenKind};
use crate::value::{ObjRef, Value};
use rules::{get_rule, Precedence};
use scope::{FunctionKind, FunctionScope};

const MAX_CONSTANTS: usize = u8::MAX as usize + 1;
const MAX_ARGS: usize = u8::MAX as usize;

/// Compiles `source` into a top-level script function. Returns `Err(())`
/// if any scan or compile error was reported; diagnostics already went
/// to stderr by the time this returns, matching `compiler_compile`'s
/// `NULL`-on-error contract.
pub fn compile(source: &str, heap: &mut Heap) -> Result<ObjRef, ()> {
    let mut compiler = Compiler::new(source, heap);
    compiler.advance();
    while !compiler.check(TokenKind::Eof) {
        compiler.declaration();
    }
    compiler.consume(TokenKind::Eof, "Expect end of expression.");
    let function = compiler.end_compiler();
    if compiler.had_error {
        Err(())
    } else {
        Ok(function)
    }
}

pub struct Compiler<'src, 'heap> {
    scanner: Scanner<'src>,
    heap: &'heap mut Heap,
    current: Token<'src>,
    previous: Token<'src>,
    had_error: bool,
    panic_mode: bool,
    scopes: Vec<FunctionScope>,
    class_nesting: u32,
    /// Everything allocated on the heap so far this compile that isn't
    /// yet reachable from any VM root. Marked before any collection
    /// triggered mid-compile (relevant under `LOXVM_GC_STRESS`, where a
    /// collection can run after every single intern).
    compiler_roots: Vec<ObjRef>,
}

impl<'src, 'heap> Compiler<'src, 'heap> {
    fn new(source: &'src str, heap: &'heap mut Heap) -> Self {
        let mut scanner = Scanner::new(source);
        let dummy = scanner.scan_token();
        Self {
            scanner,
            heap,
            current: dummy,
            previous: dummy,
            had_error: false,
            panic_mode: false,
            scopes: vec![FunctionScope::new(FunctionKind::Script, None)],
            class_nesting: 0,
            compiler_roots: Vec::new(),
        }
    }

    fn scope(&self) -> &FunctionScope {
        self.scopes.last().expect("at least the script scope is always present")
    }

    fn scope_mut(&mut self) -> &mut FunctionScope {
        self.scopes.last_mut().expect("at least the script scope is always present")
    }

    // ---- token stream -----------------------------------------------

    fn advance(&mut self) {
        self.previous = self.current;
        loop {
            self.current = self.scanner.scan_token();
            if self.current.kind != TokenKind::Error {
                break;
            }
            self.error_at_current(self.current.lexeme);
        }
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.current.kind == kind
    }

    fn match_token(&mut self, kind: TokenKind) -> bool {
        if !self.check(kind) {
            return false;
        }
        self.advance();
        true
    }

    fn consume(&mut self, kind: TokenKind, message: &'static str) {
        if self.current.kind == kind {
            self.advance();
            return;
        }
        self.error_at_current(message);
    }

    fn error_at_current(&mut self, message: &str) {
        self.error_at(self.current, message);
    }

    fn error(&mut self, message: &str) {
        self.error_at(self.previous, message);
    }

    fn error_at(&mut self, token: Token<'src>, message: &str) {
        if self.panic_mode {
            return;
        }
        self.panic_mode = true;

        eprint!("[line {}] Error", token.line);
        match token.kind {
            TokenKind::Eof => eprint!(" at end"),
            TokenKind::Error => {}
            _ => eprint!(" at '{}'", token.lexeme),
        }
        eprintln!(": {message}");
        self.had_error = true;
    }

    fn synchronize(&mut self) {
        self.panic_mode = false;
        while self.current.kind != TokenKind::Eof {
            if self.previous.kind == TokenKind::Semicolon {
                return;
            }
            match self.current.kind {
                TokenKind::Class
                | TokenKind::Fun
                | TokenKind::Var
                | TokenKind::For
                | TokenKind::If
                | TokenKind::While
                | TokenKind::Print
                | TokenKind::Return => return,
                _ => {}
            }
            self.advance();
        }
    }

    // ---- bytecode emission --------------------------------------------

    fn chunk_len(&self) -> usize {
        self.scope().function.chunk.len()
    }

    fn emit_byte(&mut self, byte: u8) {
        let line = self.previous.line;
        self.scope_mut().function.chunk.write(byte, line);
    }

    fn emit_bytes(&mut self, a: u8, b: u8) {
        self.emit_byte(a);
        self.emit_byte(b);
    }

    fn emit_return(&mut self) {
        if self.scope().kind == FunctionKind::Initializer {
            self.emit_bytes(op::GET_LOCAL, 0);
        } else {
            self.emit_byte(op::NIL);
        }
        self.emit_byte(op::RETURN);
    }

    /// Checks the GC stress/threshold condition before allocating so a
    /// collection mid-compile can't reclaim an object this compile has
    /// already produced but not yet wired into any chunk.
    fn checked_intern(&mut self, text: &str) -> ObjRef {
        if self.heap.should_collect() {
            for root in &self.compiler_roots {
                self.heap.mark_object(*root);
            }
            self.heap.collect();
        }
        let r = self.heap.intern(text);
        self.compiler_roots.push(r);
        r
    }

    fn make_constant(&mut self, value: Value) -> u8 {
        if let Value::Obj(r) = value {
            if !self.compiler_roots.contains(&r) {
                self.compiler_roots.push(r);
            }
        }
        match self.scope_mut().function.chunk.add_constant(value) {
            Some(index) => index,
            None => {
                self.error("Too many constants in one chunk.");
                0
            }
        }
    }

    fn emit_constant(&mut self, value: Value) {
        let index = self.make_constant(value);
        self.emit_bytes(op::CONSTANT, index);
    }

    fn emit_jump(&mut self, instruction: u8) -> usize {
        self.emit_byte(instruction);
        self.emit_byte(0xff);
        self.emit_byte(0xff);
        self.chunk_len() - 2
    }

    fn patch_jump(&mut self, offset: usize) {
        let jump = self.chunk_len() - offset - 2;
        if jump > u16::MAX as usize {
            self.error("Too much code to jump over.");
        }
        let bytes = u16::try_from(jump).unwrap_or(u16::MAX).to_be_bytes();
        self.scope_mut().function.chunk.code[offset] = bytes[0];
        self.scope_mut().function.chunk.code[offset + 1] = bytes[1];
    }

    fn emit_loop(&mut self, loop_start: usize) {
        self.emit_byte(op::LOOP);
        let offset = self.chunk_len() - loop_start + 2;
        if offset > u16::MAX as usize {
            self.error("Loop body too large.");
        }
        let bytes = u16::try_from(offset).unwrap_or(u16::MAX).to_be_bytes();
        self.emit_byte(bytes[0]);
        self.emit_byte(bytes[1]);
    }

    fn end_compiler(&mut self) -> ObjRef {
        self.emit_return();
        let scope = self.scopes.pop().expect("compiler always has an active scope while compiling");
        trace!(name = ?scope.function.name, arity = scope.function.arity, "compiled function");
        let r = self.heap.insert(crate::value::Obj::Function(scope.function));
        self.compiler_roots.push(r);
        r
    }

    // ---- declarations & statements -------------------------------------

    fn declaration(&mut self) {
        if self.match_token(TokenKind::Class) {
            self.class_declaration();
        } else if self.match_token(TokenKind::Fun) {
            self.fun_declaration();
        } else if self.match_token(TokenKind::Var) {
            self.var_declaration();
        } else {
            self.statement();
        }
        if self.panic_mode {
            self.synchronize();
        }
    }

    fn statement(&mut self) {
        if self.match_token(TokenKind::Print) {
            self.print_statement();
        } else if self.match_token(TokenKind::For) {
            self.for_statement();
        } else if self.match_token(TokenKind::If) {
            self.if_statement();
        } else if self.match_token(TokenKind::Return) {
            self.return_statement();
        } else if self.match_token(TokenKind::While) {
            self.while_statement();
        } else if self.match_token(TokenKind::LeftBrace) {
            self.begin_scope();
            self.block();
            self.end_scope();
        } else {
            self.expression_statement();
        }
    }

    fn print_statement(&mut self) {
        self.expression();
        self.consume(TokenKind::Semicolon, "Expect ';' after value.");
        self.emit_byte(op::PRINT);
    }

    fn expression_statement(&mut self) {
        self.expression();
        self.consume(TokenKind::Semicolon, "Expect ';' after expression.");
        self.emit_byte(op::POP);
    }

    fn if_statement(&mut self) {
        self.consume(TokenKind::LeftParen, "Expect '(' after 'if'.");
        self.expression();
        self.consume(TokenKind::RightParen, "Expect ')' after condition.");

        let then_jump = self.emit_jump(op::JUMP_IF_FALSE);
        self.emit_byte(op::POP);
        self.statement();
        let else_jump = self.emit_jump(op::JUMP);

        self.patch_jump(then_jump);
        self.emit_byte(op::POP);

        if self.match_token(TokenKind::Else) {
            self.statement();
        }
        self.patch_jump(else_jump);
    }

    fn while_statement(&mut self) {
        let loop_start = self.chunk_len();
        self.consume(TokenKind::LeftParen, "Expect '(' after 'while'.");
        self.expression();
        self.consume(TokenKind::RightParen, "Expect ')' after condition.");

        let exit_jump = self.emit_jump(op::JUMP_IF_FALSE);
        self.emit_byte(op::POP);
        self.statement();
        self.emit_loop(loop_start);

        self.patch_jump(exit_jump);
        self.emit_byte(op::POP);
    }

    fn for_statement(&mut self) {
        self.begin_scope();
        self.consume(TokenKind::LeftParen, "Expect '(' after 'for'.");
        if self.match_token(TokenKind::Semicolon) {
            // No initializer.
        } else if self.match_token(TokenKind::Var) {
            self.var_declaration();
        } else {
            self.expression_statement();
        }

        let mut loop_start = self.chunk_len();
        let mut exit_jump = None;
        if !self.match_token(TokenKind::Semicolon) {
            self.expression();
            self.consume(TokenKind::Semicolon, "Expect ';' after loop condition.");
            exit_jump = Some(self.emit_jump(op::JUMP_IF_FALSE));
            self.emit_byte(op::POP);
        }

        if !self.match_token(TokenKind::RightParen) {
            let body_jump = self.emit_jump(op::JUMP);
            let increment_start = self.chunk_len();
            self.expression();
            self.emit_byte(op::POP);
            self.consume(TokenKind::RightParen, "Expect ')' after for clauses.");

            self.emit_loop(loop_start);
            loop_start = increment_start;
            self.patch_jump(body_jump);
        }

        self.statement();
        self.emit_loop(loop_start);

        if let Some(exit_jump) = exit_jump {
            self.patch_jump(exit_jump);
            self.emit_byte(op::POP);
        }

        self.end_scope();
    }

    fn return_statement(&mut self) {
        if self.scope().kind == FunctionKind::Script {
            self.error("Can't return from top-level code.");
        }
        if self.match_token(TokenKind::Semicolon) {
            self.emit_return();
        } else {
            if self.scope().kind == FunctionKind::Initializer {
                self.error("Can't return a value from an initializer.");
            }
            self.expression();
            self.consume(TokenKind::Semicolon, "Expect ';' after return value.");
            self.emit_byte(op::RETURN);
        }
    }

    fn var_declaration(&mut self) {
        let global = self.parse_variable("Expect variable name.");
        if self.match_token(TokenKind::Equal) {
            self.expression();
        } else {
            self.emit_byte(op::NIL);
        }
        self.consume(TokenKind::Semicolon, "Expect ';' after variable declaration.");
        self.define_variable(global);
    }

    fn fun_declaration(&mut self) {
        let global = self.parse_variable("Expect function name.");
        self.scope_mut().mark_initialized();
        self.function(FunctionKind::Function);
        self.define_variable(global);
    }

    fn class_declaration(&mut self) {
        self.consume(TokenKind::Identifier, "Expect class name.");
        let class_name = self.previous;
        let name_constant = self.identifier_constant(class_name.lexeme);
        self.declare_variable();

        self.emit_bytes(op::CLASS, name_constant);
        self.define_variable(name_constant);

        self.class_nesting += 1;
        self.named_variable(class_name, false);
        self.consume(TokenKind::LeftBrace, "Expect '{' before class body.");
        while !self.check(TokenKind::RightBrace) && !self.check(TokenKind::Eof) {
            self.method();
        }
        self.consume(TokenKind::RightBrace, "Expect '}' after class body.");
        self.emit_byte(op::POP);
        self.class_nesting -= 1;
    }

    fn method(&mut self) {
        self.consume(TokenKind::Identifier, "Expect method name.");
        let name = self.previous.lexeme;
        let constant = self.identifier_constant(name);
        let kind = if name == "init" {
            FunctionKind::Initializer
        } else {
            FunctionKind::Method
        };
        self.function(kind);
        self.emit_bytes(op::METHOD, constant);
    }

    fn block(&mut self) {
        while !self.check(TokenKind::RightBrace) && !self.check(TokenKind::Eof) {
            self.declaration();
        }
        self.consume(TokenKind::RightBrace, "Expect '}' after block.");
    }

    fn function(&mut self, kind: FunctionKind) {
        let name = self.previous.lexeme;
        let name_ref = self.checked_intern(name);
        self.scopes.push(FunctionScope::new(kind, Some(name_ref)));
        self.begin_scope();

        self.consume(TokenKind::LeftParen, "Expect '(' after function name.");
        if !self.check(TokenKind::RightParen) {
            loop {
                if self.scope().function.arity == u8::MAX {
                    self.error_at_current("Can't have more than 255 parameters.");
                }
                self.scope_mut().function.arity += 1;
                let param_constant = self.parse_variable("Expect parameter name.");
                self.define_variable(param_constant);
                if !self.match_token(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.consume(TokenKind::RightParen, "Expect ')' after parameters.");
        self.consume(TokenKind::LeftBrace, "Expect '{' before function body.");
        self.block();

        let upvalues = self.scopes.last().expect("pushed above").upvalues.clone();
        let function_ref = self.end_compiler();

        let constant = self.make_constant(Value::obj(function_ref));
        self.emit_bytes(op::CLOSURE, constant);
        for upvalue in upvalues {
            self.emit_byte(u8::from(upvalue.is_local));
            self.emit_byte(upvalue.index);
        }
    }

    fn begin_scope(&mut self) {
        self.scope_mut().scope_depth += 1;
    }

    fn end_scope(&mut self) {
        self.scope_mut().scope_depth -= 1;
        let depth = self.scope().scope_depth;
        while let Some(local) = self.scope().locals.last() {
            if local.depth.is_some_and(|d| d <= depth) {
                break;
            }
            if local.is_captured {
                self.emit_byte(op::CLOSE_UPVALUE);
            } else {
                self.emit_byte(op::POP);
            }
            self.scope_mut().locals.pop();
        }
    }

    // ---- variables ------------------------------------------------------

    fn parse_variable(&mut self, message: &'static str) -> u8 {
        self.consume(TokenKind::Identifier, message);
        self.declare_variable();
        if self.scope().scope_depth > 0 {
            return 0;
        }
        self.identifier_constant(self.previous.lexeme)
    }

    fn identifier_constant(&mut self, name: &str) -> u8 {
        let r = self.checked_intern(name);
        self.make_constant(Value::obj(r))
    }

    fn declare_variable(&mut self) {
        if self.scope().scope_depth == 0 {
            return;
        }
        let name = self.previous.lexeme;
        if let Err(message) = self.scope_mut().declare_local(name) {
            self.error(message);
        }
    }

    fn define_variable(&mut self, global: u8) {
        if self.scope().scope_depth > 0 {
            self.scope_mut().mark_initialized();
            return;
        }
        self.emit_bytes(op::DEFINE_GLOBAL, global);
    }

    fn named_variable(&mut self, name: Token<'src>, can_assign: bool) {
        let scope_index = self.scopes.len() - 1;
        let local = self.scope().resolve_local(name.lexeme);
        let (get_op, set_op, arg) = match local {
            Ok(Some(index)) => (op::GET_LOCAL, op::SET_LOCAL, u8::try_from(index).expect("bounded by MAX_LOCALS")),
            Ok(None) => match scope::resolve_upvalue(&mut self.scopes, scope_index, name.lexeme) {
                Ok(Some(index)) => (op::GET_UPVALUE, op::SET_UPVALUE, index),
                Ok(None) => {
                    let arg = self.identifier_constant(name.lexeme);
                    (op::GET_GLOBAL, op::SET_GLOBAL, arg)
                }
                Err(message) => {
                    self.error(message);
                    (op::GET_GLOBAL, op::SET_GLOBAL, 0)
                }
            },
            Err(message) => {
                self.error(message);
                (op::GET_LOCAL, op::SET_LOCAL, 0)
            }
        };

        if can_assign && self.match_token(TokenKind::Equal) {
            self.expression();
            self.emit_bytes(set_op, arg);
        } else {
            self.emit_bytes(get_op, arg);
        }
    }

    // ---- expressions ------------------------------------------------------

    fn expression(&mut self) {
        self.parse_precedence(Precedence::Assignment);
    }

    fn parse_precedence(&mut self, precedence: Precedence) {
        self.advance();
        let Some(prefix) = get_rule(self.previous.kind).prefix else {
            self.error("Expect expression.");
            return;
        };
        let can_assign = precedence <= Precedence::Assignment;
        prefix(self, can_assign);

        while precedence <= get_rule(self.current.kind).precedence {
            self.advance();
            if let Some(infix) = get_rule(self.previous.kind).infix {
                infix(self, can_assign);
            }
        }

        if can_assign && self.match_token(TokenKind::Equal) {
            self.error("Invalid assignment target.");
        }
    }

    fn number(&mut self, _can_assign: bool) {
        let value: f64 = self.previous.lexeme.parse().unwrap_or(0.0);
        self.emit_constant(Value::number(value));
    }

    fn grouping(&mut self, _can_assign: bool) {
        self.expression();
        self.consume(TokenKind::RightParen, "Expect ')' after expression.");
    }

    fn unary(&mut self, _can_assign: bool) {
        let operator = self.previous.kind;
        self.parse_precedence(Precedence::Unary);
        match operator {
            TokenKind::Bang => self.emit_byte(op::NOT),
            TokenKind::Minus => self.emit_byte(op::NEGATE),
            _ => unreachable!("unary() only ever called for ! or -"),
        }
    }

    fn binary(&mut self, _can_assign: bool) {
        let operator = self.previous.kind;
        let rule = get_rule(operator);
        self.parse_precedence(rule.precedence.one_higher());
        match operator {
            TokenKind::BangEqual => self.emit_bytes(op::EQUAL, op::NOT),
            TokenKind::EqualEqual => self.emit_byte(op::EQUAL),
            TokenKind::Greater => self.emit_byte(op::GREATER),
            TokenKind::GreaterEqual => self.emit_bytes(op::LESS, op::NOT),
            TokenKind::Less => self.emit_byte(op::LESS),
            TokenKind::LessEqual => self.emit_bytes(op::GREATER, op::NOT),
            TokenKind::Plus => self.emit_byte(op::ADD),
            TokenKind::Minus => self.emit_byte(op::SUBTRACT),
            TokenKind::Star => self.emit_byte(op::MULTIPLY),
            TokenKind::Slash => self.emit_byte(op::DIVIDE),
            _ => unreachable!("binary() only ever called for a binary operator token"),
        }
    }

    fn literal(&mut self, _can_assign: bool) {
        match self.previous.kind {
            TokenKind::False => self.emit_byte(op::FALSE),
            TokenKind::Nil => self.emit_byte(op::NIL),
            TokenKind::True => self.emit_byte(op::TRUE),
            _ => unreachable!("literal() only ever called for false/nil/true"),
        }
    }

    fn string(&mut self, _can_assign: bool) {
        let lexeme = self.previous.lexeme;
        let text = &lexeme[1..lexeme.len() - 1];
        let r = self.checked_intern(text);
        self.emit_constant(Value::obj(r));
    }

    fn variable(&mut self, can_assign: bool) {
        self.named_variable(self.previous, can_assign);
    }

    fn this(&mut self, _can_assign: bool) {
        if self.class_nesting == 0 {
            self.error("Can't use 'this' outside of a class.");
            return;
        }
        self.named_variable(self.previous, false);
    }

    fn and(&mut self, _can_assign: bool) {
        let end_jump = self.emit_jump(op::JUMP_IF_FALSE);
        self.emit_byte(op::POP);
        self.parse_precedence(Precedence::And);
        self.patch_jump(end_jump);
    }

    fn or(&mut self, _can_assign: bool) {
        let else_jump = self.emit_jump(op::JUMP_IF_FALSE);
        let end_jump = self.emit_jump(op::JUMP);
        self.patch_jump(else_jump);
        self.emit_byte(op::POP);
        self.parse_precedence(Precedence::Or);
        self.patch_jump(end_jump);
    }

    fn call(&mut self, _can_assign: bool) {
        let arg_count = self.argument_list();
        self.emit_bytes(op::CALL, arg_count);
    }

    fn dot(&mut self, can_assign: bool) {
        self.consume(TokenKind::Identifier, "Expect property name after '.'.");
        let name = self.identifier_constant(self.previous.lexeme);
        if can_assign && self.match_token(TokenKind::Equal) {
            self.expression();
            self.emit_bytes(op::SET_PROPERTY, name);
        } else if self.match_token(TokenKind::LeftParen) {
            let arg_count = self.argument_list();
            self.emit_bytes(op::INVOKE, name);
            self.emit_byte(arg_count);
        } else {
            self.emit_bytes(op::GET_PROPERTY, name);
        }
    }

    fn argument_list(&mut self) -> u8 {
        let mut count: usize = 0;
        if !self.check(TokenKind::RightParen) {
            loop {
                self.expression();
                if count == MAX_ARGS {
                    self.error("Can't have more than 255 arguments.");
                }
                count += 1;
                if !self.match_token(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.consume(TokenKind::RightParen, "Expect ')' after arguments.");
        u8::try_from(count.min(MAX_ARGS)).expect("clamped above")
    }
}

const _: () = assert!(MAX_CONSTANTS == 256);
