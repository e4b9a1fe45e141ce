use std::fmt;

use crate::keyword::Keyword;
use crate::lexer::LexErrorKind;

/// Source location for error reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Span {
    /// Byte offset from the start of the input.
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

/// Multi-character operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// `&&`
    And,
    /// `||`
    Or,
    /// `<>` or `!=`
    NotEqual,
    /// `<<`
    ShiftLeft,
    /// `>>`
    ShiftRight,
    /// `<=`
    LessEqual,
    /// `>=`
    GreaterEqual,
    /// `<=>`
    NullSafeEqual,
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::And => "&&",
            Self::Or => "||",
            Self::NotEqual => "<>",
            Self::ShiftLeft => "<<",
            Self::ShiftRight => ">>",
            Self::LessEqual => "<=",
            Self::GreaterEqual => ">=",
            Self::NullSafeEqual => "<=>",
        };
        f.write_str(s)
    }
}

/// Token kinds produced by the tokenizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// End of input.
    Eof,
    /// Bare or back-tick quoted identifier.
    Ident,
    /// Entry of the fixed keyword table.
    Keyword(Keyword),
    /// Single- or double-quoted string, escapes decoded.
    String,
    /// Decimal integer.
    Integer,
    /// Decimal float (`1.5`, `.5`, `1e10`).
    Float,
    /// Hex number (`0x1F`).
    HexNumber,
    /// Hex string (`x'1F'`).
    HexString,
    /// Bit literal (`b'0101'`).
    BitLiteral,
    /// Positional `?` placeholder, text is `:v1`, `:v2`, ...
    ValueArg,
    /// Single punctuation character.
    Punct(char),
    Operator(Operator),
    /// `-- ...`, `# ...`, `// ...` or `/* ... */`.
    Comment,
    /// Malformed input; the text holds what was read so far.
    Error(LexErrorKind),
}

impl TokenKind {
    #[must_use]
    pub const fn is_punct(&self, ch: char) -> bool {
        matches!(self, Self::Punct(c) if *c == ch)
    }

    #[must_use]
    pub fn is_keyword(&self, kw: Keyword) -> bool {
        *self == Self::Keyword(kw)
    }
}

/// A single token with its kind, text, and source location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub span: Span,
}

impl Token {
    /// Text shown in diagnostics: the raw text, or a symbol for
    /// punctuation and operators.
    #[must_use]
    pub fn describe(&self) -> Option<String> {
        match &self.kind {
            TokenKind::Eof => None,
            TokenKind::Punct(c) => Some(c.to_string()),
            TokenKind::Operator(op) => Some(op.to_string()),
            TokenKind::String => Some(format!("\"{}\"", self.text)),
            _ => Some(self.text.clone()),
        }
    }
}
