//! On-demand lexer.
//!
//! The parser interleaves graph construction with token consumption, so
//! rather than producing a token stream up front the lexer answers "does
//! the input continue with this syntax?" questions against a byte cursor,
//! skipping whitespace before each match.

use crate::error::{CResult, CompileError};

pub struct Lexer<'a> {
    input: &'a [u8],
    position: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Lexer<'a> {
        Lexer {
            input: source.as_bytes(),
            position: 0,
        }
    }

    pub fn is_eof(&mut self) -> bool {
        self.skip_whitespace();
        self.position >= self.input.len()
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.position).copied()
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(c) if c <= b' ') {
            self.position += 1;
        }
    }

    /// Consume `syntax` if the input continues with it.
    pub fn eat(&mut self, syntax: &str) -> bool {
        self.skip_whitespace();
        if self.input[self.position..].starts_with(syntax.as_bytes()) {
            self.position += syntax.len();
            true
        } else {
            false
        }
    }

    /// Like [`Lexer::eat`] but for keywords: the match must end at a word
    /// boundary, so `if` does not eat the prefix of `iffy`.
    pub fn eat_word(&mut self, word: &str) -> bool {
        self.skip_whitespace();
        if !self.input[self.position..].starts_with(word.as_bytes()) {
            return false;
        }
        if let Some(&c) = self.input.get(self.position + word.len()) {
            if is_id_char(c) {
                return false;
            }
        }
        self.position += word.len();
        true
    }

    /// Look at the next significant character without consuming it.
    pub fn peek_is(&mut self, c: char) -> bool {
        self.skip_whitespace();
        self.peek() == Some(c as u8)
    }

    pub fn peek_number(&mut self) -> bool {
        self.skip_whitespace();
        matches!(self.peek(), Some(c) if c.is_ascii_digit())
    }

    pub fn parse_number(&mut self) -> CResult<i64> {
        self.skip_whitespace();
        let start = self.position;
        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            self.position += 1;
        }
        let digits = String::from_utf8_lossy(&self.input[start..self.position]);
        if digits.len() > 1 && digits.starts_with('0') {
            return Err(CompileError::new(
                "Syntax error: integer values cannot start with '0'",
            ));
        }
        digits
            .parse()
            .map_err(|_| CompileError::new(format!("Integer constant out of range: {digits}")))
    }

    /// Consume an identifier, or nothing if the input does not start with
    /// one. Keywords lex as identifiers; the parser rejects them by name.
    pub fn match_id(&mut self) -> Option<String> {
        self.skip_whitespace();
        if !matches!(self.peek(), Some(c) if is_id_start(c)) {
            return None;
        }
        let start = self.position;
        while matches!(self.peek(), Some(c) if is_id_char(c)) {
            self.position += 1;
        }
        Some(String::from_utf8_lossy(&self.input[start..self.position]).into_owned())
    }

    /// Best-effort description of the next token, for error messages.
    pub fn any_next_token(&mut self) -> String {
        self.skip_whitespace();
        match self.peek() {
            None => String::new(),
            Some(c) if is_id_start(c) => self.match_id().unwrap_or_default(),
            Some(c) => (c as char).to_string(),
        }
    }
}

fn is_id_start(c: u8) -> bool {
    c.is_ascii_alphabetic() || c == b'_'
}

fn is_id_char(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'_'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keywords_respect_word_boundaries() {
        let mut lexer = Lexer::new("iffy if(");
        assert!(!lexer.eat_word("if"));
        assert_eq!(lexer.match_id().as_deref(), Some("iffy"));
        assert!(lexer.eat_word("if"));
        assert!(lexer.eat("("));
        assert!(lexer.is_eof());
    }

    #[test]
    fn numbers_reject_leading_zero() {
        assert_eq!(Lexer::new(" 42 ").parse_number().unwrap(), 42);
        assert_eq!(Lexer::new("0").parse_number().unwrap(), 0);
        assert!(Lexer::new("017").parse_number().is_err());
    }

    #[test]
    fn whitespace_is_insignificant() {
        let mut lexer = Lexer::new("  \n\ta \t=");
        assert_eq!(lexer.match_id().as_deref(), Some("a"));
        assert!(lexer.eat("="));
        assert!(lexer.is_eof());
    }
}
