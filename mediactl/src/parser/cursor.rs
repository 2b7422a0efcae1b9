// cursor.rs
//
// Copyright 2026 Stéphane Cerveau <scerveau@igalia.com>
//
// This file is part of MediaCtl
//
// SPDX-License-Identifier: GPL-3.0-only

use crate::error::{MediaError, Result};

/// Byte cursor over descriptor text.
///
/// All tokens of the grammar are ASCII, so the cursor works on bytes and
/// only slices the input at ASCII boundaries.
#[derive(Debug, Clone)]
pub(crate) struct Cursor<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn is_at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    pub fn peek(&self) -> Option<u8> {
        self.input.as_bytes().get(self.pos).copied()
    }

    pub fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    /// Consume `c` if it is the next byte.
    pub fn eat(&mut self, c: u8) -> bool {
        if self.peek() == Some(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    pub fn expect(&mut self, c: u8, what: &str) -> Result<()> {
        if self.eat(c) {
            Ok(())
        } else {
            Err(self.error(format!("expected {}", what)))
        }
    }

    pub fn error(&self, message: impl Into<String>) -> MediaError {
        MediaError::syntax(self.pos, message)
    }

    fn take_while(&mut self, accept: impl Fn(u8) -> bool) -> &'a str {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if accept(c)) {
            self.pos += 1;
        }
        &self.input[start..self.pos]
    }

    /// Decimal unsigned integer.
    pub fn number(&mut self, what: &str) -> Result<u32> {
        let start = self.pos;
        let digits = self.take_while(|c| c.is_ascii_digit());
        if digits.is_empty() {
            return Err(self.error(format!("expected {}", what)));
        }

        digits
            .parse()
            .map_err(|_| MediaError::syntax(start, format!("{} '{}' out of range", what, digits)))
    }

    /// Run of ASCII letters, digits and underscores.
    pub fn word(&mut self) -> &'a str {
        self.take_while(|c| c.is_ascii_alphanumeric() || c == b'_')
    }

    /// Body of a double-quoted string, without the quotes.
    pub fn quoted(&mut self) -> Result<&'a str> {
        self.expect(b'"', "'\"'")?;
        let body = self.take_while(|c| c != b'"');
        if !self.eat(b'"') {
            return Err(self.error("unterminated entity name"));
        }
        Ok(body)
    }
}
