use std::fmt;

use crate::keyword::Keyword;
use crate::token::{Operator, Span, Token, TokenKind};

/// Classifies a lexer error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexErrorKind {
    /// Quoted string without its closing delimiter.
    UnterminatedString,
    /// `/*` without a matching `*/`.
    UnterminatedComment,
    /// Back-tick identifier without its closing back-tick.
    UnterminatedIdentifier,
    /// ``` `` ``` with nothing inside.
    EmptyIdentifier,
    /// A letter directly after a number (`12abc`).
    MalformedNumber,
    /// `x'..'` with a missing quote or an odd digit count.
    MalformedHex,
    /// `b'..'` with a missing quote.
    MalformedBit,
    /// Byte that cannot start any token.
    UnexpectedCharacter(char),
}

impl fmt::Display for LexErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnterminatedString => write!(f, "unterminated quoted string"),
            Self::UnterminatedComment => write!(f, "unterminated block comment"),
            Self::UnterminatedIdentifier => {
                write!(f, "unterminated back-tick identifier")
            }
            Self::EmptyIdentifier => write!(f, "empty back-tick identifier"),
            Self::MalformedNumber => write!(f, "malformed numeric literal"),
            Self::MalformedHex => write!(f, "malformed hex literal"),
            Self::MalformedBit => write!(f, "malformed bit literal"),
            Self::UnexpectedCharacter(ch) => {
                write!(f, "unexpected character: {ch}")
            }
        }
    }
}

/// Error produced during lexing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} at line {}, column {}", span.line, span.column)]
pub struct LexError {
    pub kind: LexErrorKind,
    pub span: Span,
}

/// Tokenize a whole script, dropping nothing but the end-of-input marker.
///
/// # Errors
///
/// Returns `LexError` for the first malformed token.
pub fn tokenize(input: &str) -> Result<Vec<Token>, LexError> {
    let mut tokenizer = Tokenizer::new(input);
    let mut tokens = Vec::new();
    loop {
        let token = tokenizer.scan();
        match token.kind {
            TokenKind::Eof => break,
            TokenKind::Error(kind) => {
                return Err(LexError {
                    kind,
                    span: token.span,
                });
            }
            _ => tokens.push(token),
        }
    }
    Ok(tokens)
}

/// Word that makes a `/* [` comment opener a directive block.
const DIRECTIVE_OPENER: &[u8] = b"sqlmbegin";

/// Pull-based SQL tokenizer.
///
/// Each call to [`Tokenizer::scan`] returns the next token. Malformed
/// input does not abort scanning: it is reported as a token of kind
/// [`TokenKind::Error`], and callers decide what to do with it. Once the
/// input is exhausted every further call returns [`TokenKind::Eof`].
pub struct Tokenizer<'a> {
    input: &'a [u8],
    pos: usize,
    line: usize,
    col: usize,
    value_args: usize,
}

impl<'a> Tokenizer<'a> {
    #[must_use]
    pub fn new(input: &'a str) -> Self {
        let bytes = input.as_bytes();
        let start = if bytes.starts_with(&[0xEF, 0xBB, 0xBF]) {
            3
        } else {
            0
        };
        Self {
            input: bytes,
            pos: start,
            line: 1,
            col: 1,
            value_args: 0,
        }
    }

    /// Byte offset of the next unread byte.
    #[must_use]
    pub const fn offset(&self) -> usize {
        self.pos
    }

    /// Current line, starting at 1.
    #[must_use]
    pub const fn line(&self) -> usize {
        self.line
    }

    /// Scan the next token.
    pub fn scan(&mut self) -> Token {
        self.skip_blank();
        let start = self.span();

        let Some(ch) = self.peek() else {
            return Token {
                kind: TokenKind::Eof,
                text: String::new(),
                span: start,
            };
        };

        if is_letter(ch) {
            return self.scan_word(start);
        }
        if ch.is_ascii_digit()
            || (ch == b'.' && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()))
        {
            return self.scan_number(start);
        }

        self.advance();
        match ch {
            b'=' | b',' | b';' | b'(' | b')' | b'+' | b'*' | b'%' | b'^' | b'~' | b'[' | b']'
            | b':' | b'{' | b'}' | b'.' => self.punct(ch, start),
            b'&' => self.operator_if(b'&', Operator::And, ch, start),
            b'|' => self.operator_if(b'|', Operator::Or, ch, start),
            b'!' => self.operator_if(b'=', Operator::NotEqual, ch, start),
            b'?' => {
                self.value_args += 1;
                Token {
                    kind: TokenKind::ValueArg,
                    text: format!(":v{}", self.value_args),
                    span: start,
                }
            }
            b'/' => match self.peek() {
                Some(b'/') => {
                    self.advance();
                    self.scan_line_comment(start)
                }
                Some(b'*') => {
                    self.advance();
                    self.scan_block_comment(start)
                }
                _ => self.punct(ch, start),
            },
            b'#' => self.scan_line_comment(start),
            b'-' => {
                if self.peek() == Some(b'-') {
                    self.advance();
                    self.scan_line_comment(start)
                } else {
                    self.punct(ch, start)
                }
            }
            b'<' => match self.peek() {
                Some(b'>') => {
                    self.advance();
                    self.raw(TokenKind::Operator(Operator::NotEqual), start)
                }
                Some(b'<') => {
                    self.advance();
                    self.raw(TokenKind::Operator(Operator::ShiftLeft), start)
                }
                Some(b'=') => {
                    self.advance();
                    if self.peek() == Some(b'>') {
                        self.advance();
                        self.raw(TokenKind::Operator(Operator::NullSafeEqual), start)
                    } else {
                        self.raw(TokenKind::Operator(Operator::LessEqual), start)
                    }
                }
                _ => self.punct(ch, start),
            },
            b'>' => match self.peek() {
                Some(b'=') => {
                    self.advance();
                    self.raw(TokenKind::Operator(Operator::GreaterEqual), start)
                }
                Some(b'>') => {
                    self.advance();
                    self.raw(TokenKind::Operator(Operator::ShiftRight), start)
                }
                _ => self.punct(ch, start),
            },
            b'\'' | b'"' => self.scan_string(ch, start),
            b'`' => self.scan_backtick(start),
            _ => self.unexpected(start),
        }
    }

    const fn span(&self) -> Span {
        Span {
            offset: self.pos,
            line: self.line,
            column: self.col,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.input.get(self.pos + offset).copied()
    }

    fn advance(&mut self) {
        if self.pos < self.input.len() {
            if self.input[self.pos] == b'\n' {
                self.line += 1;
                self.col = 1;
            } else {
                self.col += 1;
            }
            self.pos += 1;
        }
    }

    fn skip_blank(&mut self) {
        while matches!(self.peek(), Some(b' ' | b'\n' | b'\r' | b'\t')) {
            self.advance();
        }
    }

    fn text_from(&self, start: Span) -> String {
        String::from_utf8_lossy(&self.input[start.offset..self.pos]).into_owned()
    }

    fn raw(&self, kind: TokenKind, start: Span) -> Token {
        Token {
            kind,
            text: self.text_from(start),
            span: start,
        }
    }

    fn punct(&self, ch: u8, start: Span) -> Token {
        self.raw(TokenKind::Punct(char::from(ch)), start)
    }

    fn operator_if(&mut self, second: u8, op: Operator, ch: u8, start: Span) -> Token {
        if self.peek() == Some(second) {
            self.advance();
            self.raw(TokenKind::Operator(op), start)
        } else {
            self.punct(ch, start)
        }
    }

    fn error(kind: LexErrorKind, text: &[u8], start: Span) -> Token {
        Token {
            kind: TokenKind::Error(kind),
            text: String::from_utf8_lossy(text).into_owned(),
            span: start,
        }
    }

    fn unexpected(&mut self, start: Span) -> Token {
        // The first byte was already consumed; step over the rest of
        // a multi-byte character so scanning resumes on a boundary.
        let end = (start.offset + 4).min(self.input.len());
        let ch = String::from_utf8_lossy(&self.input[start.offset..end])
            .chars()
            .next()
            .unwrap_or(char::REPLACEMENT_CHARACTER);
        let width = ch.len_utf8().min(self.input.len() - start.offset);
        for _ in 1..width {
            self.advance();
        }
        Token {
            kind: TokenKind::Error(LexErrorKind::UnexpectedCharacter(ch)),
            text: ch.to_string(),
            span: start,
        }
    }

    fn scan_word(&mut self, start: Span) -> Token {
        let first = self.input[self.pos];
        if self.peek_at(1) == Some(b'\'') {
            if matches!(first, b'x' | b'X') {
                self.advance();
                self.advance();
                return self.scan_quoted_digits(16, LexErrorKind::MalformedHex, start);
            }
            if matches!(first, b'b' | b'B') {
                self.advance();
                self.advance();
                return self.scan_quoted_digits(2, LexErrorKind::MalformedBit, start);
            }
        }

        while self
            .peek()
            .is_some_and(|c| is_letter(c) || c.is_ascii_digit())
        {
            self.advance();
        }

        let text = self.text_from(start);
        let kind = Keyword::lookup(&text).map_or(TokenKind::Ident, TokenKind::Keyword);
        Token {
            kind,
            text,
            span: start,
        }
    }

    /// Body of `x'..'` or `b'..'`, opening quote already consumed.
    fn scan_quoted_digits(&mut self, base: u8, malformed: LexErrorKind, start: Span) -> Token {
        let digits_start = self.pos;
        self.scan_digits(base);
        let digits = &self.input[digits_start..self.pos];

        if self.peek() != Some(b'\'') {
            return Self::error(malformed, digits, start);
        }
        self.advance();

        if base == 16 && digits.len() % 2 != 0 {
            return Self::error(malformed, digits, start);
        }

        let kind = if base == 16 {
            TokenKind::HexString
        } else {
            TokenKind::BitLiteral
        };
        Token {
            kind,
            text: String::from_utf8_lossy(digits).into_owned(),
            span: start,
        }
    }

    fn scan_digits(&mut self, base: u8) {
        while self.peek().is_some_and(|c| digit_value(c) < base) {
            self.advance();
        }
    }

    fn scan_number(&mut self, start: Span) -> Token {
        let mut kind = TokenKind::Integer;

        if self.peek() == Some(b'.') {
            kind = TokenKind::Float;
            self.advance();
            self.scan_digits(10);
        } else {
            if self.peek() == Some(b'0') && matches!(self.peek_at(1), Some(b'x' | b'X')) {
                self.advance();
                self.advance();
                self.scan_digits(16);
                return self.finish_number(TokenKind::HexNumber, start);
            }

            self.scan_digits(10);
            if self.peek() == Some(b'.') {
                kind = TokenKind::Float;
                self.advance();
                self.scan_digits(10);
            }
        }

        if matches!(self.peek(), Some(b'e' | b'E')) {
            kind = TokenKind::Float;
            self.advance();
            if matches!(self.peek(), Some(b'+' | b'-')) {
                self.advance();
            }
            self.scan_digits(10);
        }

        self.finish_number(kind, start)
    }

    fn finish_number(&self, kind: TokenKind, start: Span) -> Token {
        if self.peek().is_some_and(is_letter) {
            return Self::error(
                LexErrorKind::MalformedNumber,
                &self.input[start.offset..self.pos],
                start,
            );
        }
        self.raw(kind, start)
    }

    /// Quoted string body, opening delimiter already consumed.
    fn scan_string(&mut self, delim: u8, start: Span) -> Token {
        let mut value = Vec::new();
        loop {
            match self.peek() {
                None => {
                    return Self::error(LexErrorKind::UnterminatedString, &value, start);
                }
                Some(b'\\') => {
                    self.advance();
                    let Some(escaped) = self.peek() else {
                        return Self::error(LexErrorKind::UnterminatedString, &value, start);
                    };
                    value.push(decode_escape(escaped));
                    self.advance();
                }
                Some(c) if c == delim => {
                    self.advance();
                    // a doubled delimiter stands for one literal delimiter
                    if self.peek() == Some(delim) {
                        value.push(delim);
                        self.advance();
                    } else {
                        break;
                    }
                }
                Some(c) => {
                    value.push(c);
                    self.advance();
                }
            }
        }

        Token {
            kind: TokenKind::String,
            text: String::from_utf8_lossy(&value).into_owned(),
            span: start,
        }
    }

    /// Back-tick identifier body, opening back-tick already consumed.
    fn scan_backtick(&mut self, start: Span) -> Token {
        let mut value = Vec::new();
        loop {
            match self.peek() {
                None => {
                    return Self::error(LexErrorKind::UnterminatedIdentifier, &value, start);
                }
                Some(b'`') => {
                    self.advance();
                    if self.peek() == Some(b'`') {
                        value.push(b'`');
                        self.advance();
                    } else {
                        break;
                    }
                }
                Some(c) => {
                    value.push(c);
                    self.advance();
                }
            }
        }

        if value.is_empty() {
            return Self::error(LexErrorKind::EmptyIdentifier, &value, start);
        }

        Token {
            kind: TokenKind::Ident,
            text: String::from_utf8_lossy(&value).into_owned(),
            span: start,
        }
    }

    /// `--`, `#` or `//` comment; runs through the end of the line.
    fn scan_line_comment(&mut self, start: Span) -> Token {
        while let Some(c) = self.peek() {
            self.advance();
            if c == b'\n' {
                break;
            }
        }
        self.raw(TokenKind::Comment, start)
    }

    /// Block comment, `/*` already consumed.
    ///
    /// A comment opening with `[sqlmbegin` is not a comment at all: the
    /// bracket comes back as punctuation and the directive block is
    /// tokenized like ordinary SQL.
    fn scan_block_comment(&mut self, start: Span) -> Token {
        self.skip_blank();
        if self.peek() == Some(b'[') && self.directive_opener_follows() {
            let bracket = self.span();
            self.advance();
            return self.punct(b'[', bracket);
        }

        loop {
            match self.peek() {
                None => {
                    return Self::error(
                        LexErrorKind::UnterminatedComment,
                        &self.input[start.offset..self.pos],
                        start,
                    );
                }
                Some(b'*') if self.peek_at(1) == Some(b'/') => {
                    self.advance();
                    self.advance();
                    break;
                }
                Some(_) => self.advance(),
            }
        }
        self.raw(TokenKind::Comment, start)
    }

    fn directive_opener_follows(&self) -> bool {
        let from = self.pos + 1;
        self.input
            .get(from..from + DIRECTIVE_OPENER.len())
            .is_some_and(|word| word.eq_ignore_ascii_case(DIRECTIVE_OPENER))
    }
}

const fn is_letter(ch: u8) -> bool {
    ch.is_ascii_alphabetic() || ch == b'_' || ch == b'@'
}

const fn digit_value(ch: u8) -> u8 {
    match ch {
        b'0'..=b'9' => ch - b'0',
        b'a'..=b'f' => ch - b'a' + 10,
        b'A'..=b'F' => ch - b'A' + 10,
        _ => u8::MAX,
    }
}

const fn decode_escape(ch: u8) -> u8 {
    match ch {
        b'0' => 0,
        b'b' => 0x08,
        b'n' => b'\n',
        b'r' => b'\r',
        b't' => b'\t',
        b'Z' => 0x1A,
        other => other,
    }
}
