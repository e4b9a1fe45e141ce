//! One-token lookahead over the tokenizer.

use std::mem;

use crate::lexer::Tokenizer;
use crate::token::{Token, TokenKind};

/// Wraps a [`Tokenizer`] with a current token and one token of lookahead.
///
/// Comment tokens are dropped here, so the directive parser never sees
/// them.
pub struct Lexer<'a> {
    tokenizer: Tokenizer<'a>,
    current: Token,
    next: Token,
}

impl<'a> Lexer<'a> {
    /// Prime the lexer: the first significant token becomes current.
    #[must_use]
    pub fn new(input: &'a str) -> Self {
        let mut tokenizer = Tokenizer::new(input);
        let current = Self::scan_significant(&mut tokenizer);
        let next = Self::scan_significant(&mut tokenizer);
        Self {
            tokenizer,
            current,
            next,
        }
    }

    /// Consume one token and return the new current token.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> &Token {
        let upcoming = Self::scan_significant(&mut self.tokenizer);
        self.current = mem::replace(&mut self.next, upcoming);
        &self.current
    }

    /// The token after the current one, without consuming it.
    #[must_use]
    pub const fn peek(&self) -> &Token {
        &self.next
    }

    #[must_use]
    pub const fn current(&self) -> &Token {
        &self.current
    }

    fn scan_significant(tokenizer: &mut Tokenizer<'_>) -> Token {
        loop {
            let token = tokenizer.scan();
            if token.kind != TokenKind::Comment {
                return token;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyword::Keyword;

    #[test]
    fn peek_does_not_consume() {
        let mut lexer = Lexer::new("a b c");
        assert_eq!(lexer.current().text, "a");
        assert_eq!(lexer.peek().text, "b");
        assert_eq!(lexer.peek().text, "b");
        assert_eq!(lexer.next().text, "b");
        assert_eq!(lexer.peek().text, "c");
    }

    #[test]
    fn comments_are_skipped() {
        let mut lexer = Lexer::new("-- lead\n[ /* inner */ dev # trailing\n]");
        assert!(lexer.current().kind.is_punct('['));
        assert!(lexer.next().kind.is_keyword(Keyword::Dev));
        assert!(lexer.next().kind.is_punct(']'));
        assert_eq!(lexer.next().kind, TokenKind::Eof);
    }

    #[test]
    fn stays_at_eof() {
        let mut lexer = Lexer::new("x");
        assert_eq!(lexer.next().kind, TokenKind::Eof);
        assert_eq!(lexer.next().kind, TokenKind::Eof);
        assert_eq!(lexer.peek().kind, TokenKind::Eof);
    }
}
