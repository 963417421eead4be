//! Lexer for condition expressions.
//!
//! Keywords (`AND`, `OR`, `NOT`, `BETWEEN`, `TRUE`, `FALSE`) are matched
//! case-insensitively; identifiers keep their case. The lexer is lazy: it is an
//! iterator that yields one token at a time, ends with a single `Eof` token,
//! and stops after the first error.

use super::token::{Token, TokenKind};
use crate::error::ExpressionError;

/// Tokenizer over a borrowed source string.
#[derive(Debug)]
pub struct Lexer<'a> {
    input: &'a str,
    pos: usize,
    done: bool,
}

impl<'a> Lexer<'a> {
    /// Create a lexer positioned at the start of `input`.
    #[must_use]
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            done: false,
        }
    }

    /// Tokenize the whole input, ending with `Eof`.
    ///
    /// # Errors
    ///
    /// Returns the first lexical error in the input.
    pub fn tokenize(input: &'a str) -> Result<Vec<Token>, ExpressionError> {
        Self::new(input).collect()
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        let mut chars = self.input[self.pos..].chars();
        chars.next();
        chars.next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn token_from(&self, kind: TokenKind, start: usize) -> Token {
        Token::new(kind, &self.input[start..self.pos], start)
    }

    fn next_token(&mut self) -> Result<Token, ExpressionError> {
        self.skip_whitespace();
        let start = self.pos;

        let Some(ch) = self.bump() else {
            return Ok(Token::new(TokenKind::Eof, "", start));
        };

        let kind = match ch {
            '=' => TokenKind::Eq,
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            ',' => TokenKind::Comma,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '<' => match self.peek() {
                Some('=') => {
                    self.bump();
                    TokenKind::Le
                }
                Some('>') => {
                    self.bump();
                    TokenKind::Ne
                }
                _ => TokenKind::Lt,
            },
            '>' => {
                if self.peek() == Some('=') {
                    self.bump();
                    TokenKind::Ge
                } else {
                    TokenKind::Gt
                }
            }
            '\'' | '"' => {
                self.read_string(ch, start)?;
                TokenKind::String
            }
            c if c.is_ascii_digit() => {
                self.read_number();
                TokenKind::Number
            }
            '#' | ':' => {
                if !self.peek().is_some_and(is_ident_start) {
                    return Err(ExpressionError::Lex {
                        offset: start,
                        found: ch,
                    });
                }
                self.read_ident_chars();
                if ch == '#' {
                    self.read_path_tail()?;
                }
                TokenKind::Ident
            }
            c if is_ident_start(c) => {
                self.read_ident_chars();
                if self.read_path_tail()? {
                    TokenKind::Ident
                } else {
                    TokenKind::keyword(&self.input[start..self.pos]).unwrap_or(TokenKind::Ident)
                }
            }
            found => return Err(ExpressionError::Lex { offset: start, found }),
        };

        Ok(self.token_from(kind, start))
    }

    fn read_ident_chars(&mut self) {
        while self.peek().is_some_and(is_ident_continue) {
            self.bump();
        }
    }

    /// Consume `.segment` continuations of a document path. Returns whether any
    /// were consumed. A `.#` segment must be followed by a name.
    fn read_path_tail(&mut self) -> Result<bool, ExpressionError> {
        let mut consumed = false;
        while self.peek() == Some('.') {
            let next = self.peek_second();
            let is_placeholder = next == Some('#');
            if !is_placeholder && !next.is_some_and(is_ident_start) {
                break;
            }
            self.bump();
            if is_placeholder {
                let offset = self.pos;
                self.bump();
                if !self.peek().is_some_and(is_ident_start) {
                    return Err(ExpressionError::Lex { offset, found: '#' });
                }
            }
            self.read_ident_chars();
            consumed = true;
        }
        Ok(consumed)
    }

    fn read_number(&mut self) {
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.bump();
        }
        if self.peek() == Some('.') && self.peek_second().is_some_and(|c| c.is_ascii_digit()) {
            self.bump();
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.bump();
            }
        }
    }

    fn read_string(&mut self, quote: char, start: usize) -> Result<(), ExpressionError> {
        loop {
            match self.bump() {
                None => return Err(ExpressionError::UnterminatedString { offset: start }),
                Some('\\') => {
                    if self.bump().is_none() {
                        return Err(ExpressionError::UnterminatedString { offset: start });
                    }
                }
                Some(c) if c == quote => return Ok(()),
                Some(_) => {}
            }
        }
    }
}

impl Iterator for Lexer<'_> {
    type Item = Result<Token, ExpressionError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let result = self.next_token();
        self.done = !matches!(&result, Ok(tok) if tok.kind != TokenKind::Eof);
        Some(result)
    }
}

/// Decode a quoted string literal as produced by the lexer.
pub(crate) fn unquote(literal: &str) -> String {
    let inner = literal
        .get(1..literal.len().saturating_sub(1))
        .unwrap_or_default();
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

/// Render `value` as a double-quoted literal that `unquote` reverses.
pub(crate) fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}
