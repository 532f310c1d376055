// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! The Pratt parser's precedence table: for each token kind, which
//! method parses it as a prefix expression, which parses it as an
//! infix operator, and at what binding power.

use crate::compiler::Compiler;
use crate::scanner::TokenKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum Precedence {
    None,
    Assignment, // =
    Or,         // or
    And,        // and
    Equality,   // == !=
    Comparison, // < > <= >=
    Term,       // + -
    Factor,     // * /
    Unary,      // ! -
    Call,       // . ()
    Primary,
}

impl Precedence {
    #[must_use]
    pub const fn one_higher(self) -> Self {
        match self {
            Self::None => Self::Assignment,
            Self::Assignment => Self::Or,
            Self::Or => Self::And,
            Self::And => Self::Equality,
            Self::Equality => Self::Comparison,
            Self::Comparison => Self::Term,
            Self::Term => Self::Factor,
            Self::Factor => Self::Unary,
            Self::Unary => Self::Call,
            Self::Call | Self::Primary => Self::Primary,
        }
    }
}

pub type ParseFn<'src, 'heap> = fn(&mut Compiler<'src, 'heap>, bool);

pub struct ParseRule<'src, 'heap> {
    pub prefix: Option<ParseFn<'src, 'heap>>,
    pub infix: Option<ParseFn<'src, 'heap>>,
    pub precedence: Precedence,
}

const fn rule<'src, 'heap>(
    prefix: Option<ParseFn<'src, 'heap>>,
    infix: Option<ParseFn<'src, 'heap>>,
    precedence: Precedence,
) -> ParseRule<'src, 'heap> {
    ParseRule {
        prefix,
        infix,
        precedence,
    }
}

#[allow(clippy::too_many_lines)]
pub fn get_rule<'src, 'heap>(kind: TokenKind) -> ParseRule<'src, 'heap> {
    use Precedence::{And, Call, Comparison, Equality, Factor, None as Prec, Or, Term};
    use TokenKind as K;

    match kind {
        K::LeftParen => rule(Some(Compiler::grouping), Some(Compiler::call), Call),
        K::RightParen | K::LeftBrace | K::RightBrace | K::Comma | K::Semicolon | K::Equal => rule(None, None, Prec),
        K::Dot => rule(None, Some(Compiler::dot), Call),
        K::Minus => rule(Some(Compiler::unary), Some(Compiler::binary), Term),
        K::Plus => rule(None, Some(Compiler::binary), Term),
        K::Slash | K::Star => rule(None, Some(Compiler::binary), Factor),
        K::Bang => rule(Some(Compiler::unary), None, Prec),
        K::BangEqual | K::EqualEqual => rule(None, Some(Compiler::binary), Equality),
        K::Greater | K::GreaterEqual | K::Less | K::LessEqual => rule(None, Some(Compiler::binary), Comparison),
        K::Identifier => rule(Some(Compiler::variable), None, Prec),
        K::String => rule(Some(Compiler::string), None, Prec),
        K::Number => rule(Some(Compiler::number), None, Prec),
        K::And => rule(None, Some(Compiler::and), And),
        K::Or => rule(None, Some(Compiler::or), Or),
        K::False | K::Nil | K::True => rule(Some(Compiler::literal), None, Prec),
        K::This => rule(Some(Compiler::this), None, Prec),
        K::Class
        | K::Else
        | K::For
        | K::Fun
        | K::If
        | K::Print
        | K::Return
        | K::Super
        | K::Var
        | K::While
        | K::Error
        | K::Eof => rule(None, None, Prec),
    }
}
