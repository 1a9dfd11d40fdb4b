//! Turns a source string into a token stream.
//!
//! One `Lexer` per source fragment; stateless across calls and
//! non-restartable — it stops at the first error and hands back whatever
//! it has collected in its error list.

mod token;

pub use token::{Literal, Token, TokenKind};

use std::collections::HashMap;
use std::rc::Rc;

use once_cell::sync::Lazy;

use crate::diagnostics::{Error, ErrorList};
use crate::span::Span;

static KEYWORDS: Lazy<HashMap<&'static str, TokenKind>> = Lazy::new(|| {
    use TokenKind::*;
    HashMap::from([
        ("and", And),
        ("assert", Assert),
        ("break", Break),
        ("class", Class),
        ("continue", Continue),
        ("else", Else),
        ("false", False),
        ("fn", Fn),
        ("for", For),
        ("if", If),
        ("in", In),
        ("nil", Nil),
        ("or", Or),
        ("return", Return),
        ("super", Super),
        ("this", This),
        ("true", True),
        ("var", Var),
        ("while", While),
    ])
});

pub struct Lexer {
    source: Rc<str>,
    start: usize,
    pos: usize,
    tokens: Vec<Token>,
    errors: ErrorList,
}

impl Lexer {
    pub fn new(source: impl Into<Rc<str>>) -> Self {
        Self { source: source.into(), start: 0, pos: 0, tokens: Vec::new(), errors: ErrorList::new() }
    }

    /// Lexes the whole source. On success, returns every token (ending with
    /// `Eof`). On the first error, returns the accumulated error list
    /// instead — the lexer does not attempt to recover and resynchronize.
    pub fn lex(mut self) -> Result<Vec<Token>, ErrorList> {
        while self.more() {
            self.start = self.pos;
            self.scan_token();
            if self.errors.has_errors() {
                return Err(self.errors);
            }
        }
        let eof_span = Span::eof(Rc::clone(&self.source));
        self.tokens.push(Token::new(TokenKind::Eof, eof_span, Literal::None));
        Ok(self.tokens)
    }

    fn more(&self) -> bool {
        self.pos < self.source.len()
    }

    fn byte_at(&self, pos: usize) -> u8 {
        self.source.as_bytes()[pos]
    }

    fn peek(&self) -> u8 {
        if self.more() { self.byte_at(self.pos) } else { 0 }
    }

    fn advance(&mut self) -> u8 {
        let b = self.byte_at(self.pos);
        self.pos += 1;
        b
    }

    fn matches(&mut self, expected: u8) -> bool {
        if self.peek() == expected {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn token_span(&self) -> Span {
        Span::new(Rc::clone(&self.source), self.start, self.pos - self.start)
    }

    fn span_at(&self, offset: usize, len: usize) -> Span {
        Span::new(Rc::clone(&self.source), offset, len)
    }

    fn add_token(&mut self, kind: TokenKind, value: Literal) {
        let span = self.token_span();
        self.tokens.push(Token::new(kind, span, value));
    }

    fn error(&mut self, message: impl Into<String>, span: Span) {
        self.errors.push(Error::new(message, span));
    }

    fn scan_token(&mut self) {
        let ch = self.advance();
        match ch {
            b' ' | b'\t' | b'\r' | b'\n' => {}
            b'(' => self.add_token(TokenKind::LeftParen, Literal::None),
            b')' => self.add_token(TokenKind::RightParen, Literal::None),
            b'{' => self.add_token(TokenKind::LeftBrace, Literal::None),
            b'}' => self.add_token(TokenKind::RightBrace, Literal::None),
            b',' => self.add_token(TokenKind::Comma, Literal::None),
            b'.' => self.add_token(TokenKind::Dot, Literal::None),
            b'-' => self.add_token(TokenKind::Minus, Literal::None),
            b'+' => self.add_token(TokenKind::Plus, Literal::None),
            b';' => self.add_token(TokenKind::Semicolon, Literal::None),
            b'*' => self.add_token(TokenKind::Star, Literal::None),
            b'%' => self.add_token(TokenKind::Percent, Literal::None),
            b'!' => {
                let kind = if self.matches(b'=') { TokenKind::BangEqual } else { TokenKind::Bang };
                self.add_token(kind, Literal::None);
            }
            b'=' => {
                let kind = if self.matches(b'=') { TokenKind::EqualEqual } else { TokenKind::Equal };
                self.add_token(kind, Literal::None);
            }
            b'>' => {
                let kind =
                    if self.matches(b'=') { TokenKind::GreaterEqual } else { TokenKind::Greater };
                self.add_token(kind, Literal::None);
            }
            b'<' => {
                let kind = if self.matches(b'=') { TokenKind::LessEqual } else { TokenKind::Less };
                self.add_token(kind, Literal::None);
            }
            b'/' => {
                if self.matches(b'/') {
                    while self.more() && self.peek() != b'\n' {
                        self.pos += 1;
                    }
                } else {
                    self.add_token(TokenKind::Slash, Literal::None);
                }
            }
            b'"' => self.scan_string(),
            b'0'..=b'9' => self.scan_number(),
            b'A'..=b'Z' | b'a'..=b'z' | b'_' => self.scan_identifier(),
            _ => self.error("unknown token", self.token_span()),
        }
    }

    fn scan_string(&mut self) {
        let mut num_escapes = 0usize;
        while self.more() && self.peek() != b'"' {
            let ch = self.advance();
            if ch == b'\\' {
                num_escapes += 1;
                if self.more() {
                    self.pos += 1;
                }
            }
        }
        if !self.more() {
            self.error("unterminated string", self.token_span());
            return;
        }
        self.pos += 1; // closing quote

        let content_start = self.start + 1;
        let content_len = self.pos - self.start - 2;
        let raw = self.source[content_start..content_start + content_len].to_owned();

        let value = if num_escapes > 0 {
            match self.unescape(&raw, content_start) {
                Some(v) => v,
                None => return,
            }
        } else {
            raw
        };
        self.add_token(TokenKind::String, Literal::String(value));
    }

    /// Replaces escape sequences in `raw` (the string literal's content, not
    /// including the surrounding quotes) with the characters they denote.
    /// `content_start` is `raw`'s byte offset within `self.source`, needed
    /// to compute the exact two-byte span of an invalid escape.
    fn unescape(&mut self, raw: &str, content_start: usize) -> Option<String> {
        let bytes = raw.as_bytes();
        let mut out = String::with_capacity(raw.len());
        let mut i = 0;
        while i < bytes.len() {
            if bytes[i] != b'\\' {
                out.push(bytes[i] as char);
                i += 1;
                continue;
            }
            debug_assert!(i + 1 < bytes.len(), "backslash can't be the last byte of a valid literal");
            let escaped = bytes[i + 1];
            match escaped {
                b't' => out.push('\t'),
                b'r' => out.push('\r'),
                b'n' => out.push('\n'),
                b'"' => out.push('"'),
                b'\\' => out.push('\\'),
                b'\n' => {}
                _ => {
                    let backslash_pos = content_start + i;
                    let span = self.span_at(backslash_pos, 2);
                    self.error("unknown escape sequence", span);
                    return None;
                }
            }
            i += 2;
        }
        Some(out)
    }

    fn scan_number(&mut self) {
        while self.peek().is_ascii_digit() {
            self.pos += 1;
        }
        if self.peek() == b'.' && self.byte_at_after(1).is_ascii_digit() {
            self.pos += 1;
            while self.peek().is_ascii_digit() {
                self.pos += 1;
            }
        }
        if matches!(self.peek(), b'e' | b'E') {
            let mut lookahead = self.pos + 1;
            if lookahead < self.source.len() && matches!(self.byte_at(lookahead), b'+' | b'-') {
                lookahead += 1;
            }
            if lookahead < self.source.len() && self.byte_at(lookahead).is_ascii_digit() {
                self.pos = lookahead;
                while self.peek().is_ascii_digit() {
                    self.pos += 1;
                }
            }
        }

        let text = self.token_span();
        match text.text().parse::<f64>() {
            Ok(n) if n.is_finite() => self.add_token(TokenKind::Number, Literal::Number(n)),
            _ => self.error(
                "literal exceeds range of double-precision floating point",
                self.token_span(),
            ),
        }
    }

    fn byte_at_after(&self, offset: usize) -> u8 {
        let pos = self.pos + offset;
        if pos < self.source.len() { self.byte_at(pos) } else { 0 }
    }

    fn scan_identifier(&mut self) {
        while matches!(self.peek(), b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'_') {
            self.pos += 1;
        }
        let text = self.token_span();
        if let Some(&kind) = KEYWORDS.get(text.text()) {
            match kind {
                TokenKind::False => self.add_token(kind, Literal::Bool(false)),
                TokenKind::True => self.add_token(kind, Literal::Bool(true)),
                _ => self.add_token(kind, Literal::None),
            }
        } else {
            self.add_token(TokenKind::Identifier, Literal::None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(src: &str) -> Vec<Token> {
        Lexer::new(src).lex().expect("lex should succeed")
    }

    fn kinds(src: &str) -> Vec<TokenKind> {
        lex(src).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn empty_source_lexes_to_eof_only() {
        assert_eq!(kinds(""), vec![TokenKind::Eof]);
    }

    #[test]
    fn punctuation_and_operators() {
        assert_eq!(
            kinds("( ) { } , . - + ; * / % ! != = == > >= < <="),
            vec![
                TokenKind::LeftParen,
                TokenKind::RightParen,
                TokenKind::LeftBrace,
                TokenKind::RightBrace,
                TokenKind::Comma,
                TokenKind::Dot,
                TokenKind::Minus,
                TokenKind::Plus,
                TokenKind::Semicolon,
                TokenKind::Star,
                TokenKind::Slash,
                TokenKind::Percent,
                TokenKind::Bang,
                TokenKind::BangEqual,
                TokenKind::Equal,
                TokenKind::EqualEqual,
                TokenKind::Greater,
                TokenKind::GreaterEqual,
                TokenKind::Less,
                TokenKind::LessEqual,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn line_comment_is_skipped() {
        assert_eq!(kinds("1 // comment\n2"), vec![TokenKind::Number, TokenKind::Number, TokenKind::Eof]);
    }

    #[test]
    fn keyword_vs_identifier() {
        let tokens = lex("fn foobar while");
        assert_eq!(tokens[0].kind, TokenKind::Fn);
        assert_eq!(tokens[1].kind, TokenKind::Identifier);
        assert_eq!(tokens[2].kind, TokenKind::While);
    }

    #[test]
    fn bool_keywords_carry_value() {
        let tokens = lex("true false");
        assert_eq!(tokens[0].value, Literal::Bool(true));
        assert_eq!(tokens[1].value, Literal::Bool(false));
    }

    #[test]
    fn number_forms() {
        let tokens = lex("1 1.5 1e3 1.5e-2 1E+2");
        let nums: Vec<f64> = tokens
            .iter()
            .filter_map(|t| match t.value {
                Literal::Number(n) => Some(n),
                _ => None,
            })
            .collect();
        assert_eq!(nums, vec![1.0, 1.5, 1000.0, 0.015, 100.0]);
    }

    #[test]
    fn number_out_of_range_is_error() {
        let err = Lexer::new("1e999999").lex().unwrap_err();
        assert!(err.has_errors());
    }

    #[test]
    fn number_in_range_is_ok() {
        assert!(Lexer::new("1e308").lex().is_ok());
    }

    #[test]
    fn string_literal_with_escapes() {
        let tokens = lex(r#""a\tb\nc\"d""#);
        assert_eq!(tokens[0].value, Literal::String("a\tb\nc\"d".to_owned()));
    }

    #[test]
    fn string_line_continuation_erases() {
        let tokens = lex("\"a\\\nb\"");
        assert_eq!(tokens[0].value, Literal::String("ab".to_owned()));
    }

    #[test]
    fn unknown_escape_has_two_byte_span() {
        let err = Lexer::new(r#""a\qb""#).lex().unwrap_err();
        let errors = err.into_vec();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].span.text(), "\\q");
    }

    #[test]
    fn unterminated_string_is_error() {
        let err = Lexer::new("\"abc").lex().unwrap_err();
        let errors = err.into_vec();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].span.offset() + errors[0].span.len(), 4);
    }

    #[test]
    fn unknown_byte_is_error() {
        assert!(Lexer::new("`").lex().is_err());
    }

    #[test]
    fn token_text_is_substring_of_source() {
        let src = "var xyz = 1;";
        for token in lex(src) {
            if token.span.len() > 0 {
                assert!(src.contains(token.span.text()));
            }
        }
    }
}
