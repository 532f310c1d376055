// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

use super::*;

fn kinds(source: &str) -> Vec<TokenKind> {
    let mut scanner = Scanner::new(source);
    let mut out = Vec::new();
    loop {
        let token = scanner.scan_token();
        let done = token.kind == TokenKind::Eof;
        out.push(token.kind);
        if done {
            break;
        }
    }
    out
}

#[test]
fn scans_single_character_tokens() {
    assert_eq!(
        kinds("(){};,.-+/*"),
        vec![
            TokenKind::LeftParen,
            TokenKind::RightParen,
            TokenKind::LeftBrace,
            TokenKind::RightBrace,
            TokenKind::Semicolon,
            TokenKind::Comma,
            TokenKind::Dot,
            TokenKind::Minus,
            TokenKind::Plus,
            TokenKind::Slash,
            TokenKind::Star,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn scans_one_or_two_character_tokens() {
    assert_eq!(
        kinds("! != = == < <= > >="),
        vec![
            TokenKind::Bang,
            TokenKind::BangEqual,
            TokenKind::Equal,
            TokenKind::EqualEqual,
            TokenKind::Less,
            TokenKind::LessEqual,
            TokenKind::Greater,
            TokenKind::GreaterEqual,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn scans_keywords_not_as_identifiers() {
    assert_eq!(
        kinds("and class else false for fun if nil or print return super this true var while"),
        vec![
            TokenKind::And,
            TokenKind::Class,
            TokenKind::Else,
            TokenKind::False,
            TokenKind::For,
            TokenKind::Fun,
            TokenKind::If,
            TokenKind::Nil,
            TokenKind::Or,
            TokenKind::Print,
            TokenKind::Return,
            TokenKind::Super,
            TokenKind::This,
            TokenKind::True,
            TokenKind::Var,
            TokenKind::While,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn identifier_prefix_of_a_keyword_is_still_an_identifier() {
    assert_eq!(kinds("forest"), vec![TokenKind::Identifier, TokenKind::Eof]);
}

#[test]
fn scans_number_literal_with_fraction() {
    let mut scanner = Scanner::new("3.14");
    let token = scanner.scan_token();
    assert_eq!(token.kind, TokenKind::Number);
    assert_eq!(token.lexeme, "3.14");
}

#[test]
fn trailing_dot_without_digit_is_not_part_of_number() {
    let mut scanner = Scanner::new("1.");
    let token = scanner.scan_token();
    assert_eq!(token.kind, TokenKind::Number);
    assert_eq!(token.lexeme, "1");
    assert_eq!(scanner.scan_token().kind, TokenKind::Dot);
}

#[test]
fn scans_string_literal() {
    let mut scanner = Scanner::new("\"hello world\"");
    let token = scanner.scan_token();
    assert_eq!(token.kind, TokenKind::String);
    assert_eq!(token.lexeme, "\"hello world\"");
}

#[test]
fn unterminated_string_is_an_error_token() {
    let mut scanner = Scanner::new("\"oops");
    let token = scanner.scan_token();
    assert_eq!(token.kind, TokenKind::Error);
}

#[test]
fn newlines_inside_strings_advance_the_line_counter() {
    let mut scanner = Scanner::new("\"a\nb\"");
    scanner.scan_token();
    assert_eq!(scanner.line, 2);
}

#[test]
fn line_comments_are_skipped_like_whitespace() {
    assert_eq!(kinds("// a comment\nvar"), vec![TokenKind::Var, TokenKind::Eof]);
}

#[test]
fn tracks_line_numbers_across_newlines() {
    let mut scanner = Scanner::new("var\nvar\nvar");
    scanner.scan_token();
    let second = scanner.scan_token();
    assert_eq!(second.line, 2);
    let third = scanner.scan_token();
    assert_eq!(third.line, 3);
}
