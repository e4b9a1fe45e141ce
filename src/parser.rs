use std::fmt;

use crate::ast::{Directives, Environment, NestedRef};
use crate::keyword::Keyword;
use crate::lexer::LexErrorKind;
use crate::lookahead::Lexer;
use crate::token::{Span, Token, TokenKind};

/// Classifies a parser error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// Malformed token inside the directive block.
    Lex(LexErrorKind),
    /// Expected `[`, found something else or EOF.
    ExpectedOpenBracket { found: Option<String> },
    /// Expected `]`, found something else or EOF.
    ExpectedCloseBracket { found: Option<String> },
    /// Expected `-` at the start of an entry line.
    ExpectedDash { found: Option<String> },
    /// Expected `:` after an entry key.
    ExpectedColon { found: Option<String> },
    /// Expected `(` after `sqlmref` or `sqlmfile`.
    ExpectedOpenParen { found: Option<String> },
    /// Expected `)` closing a reference.
    ExpectedCloseParen { found: Option<String> },
    /// Expected a specific keyword.
    ExpectedKeyword {
        expected: Keyword,
        found: Option<String>,
    },
    /// Expected a quoted string.
    ExpectedString { found: Option<String> },
    /// Expected an entry key.
    ExpectedKey { found: Option<String> },
    /// Expected a literal, `sqlmref(..)` or `sqlmfile(..)`.
    ExpectedValue { found: Option<String> },
    /// Input ended before `[sqlmend]`.
    UnterminatedBlock,
}

fn expected(f: &mut fmt::Formatter<'_>, what: &str, found: Option<&String>) -> fmt::Result {
    match found {
        None => write!(f, "expected {what}, got end of input"),
        Some(t) => write!(f, "expected {what}, got '{t}'"),
    }
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lex(kind) => write!(f, "{kind}"),
            Self::ExpectedOpenBracket { found } => expected(f, "'['", found.as_ref()),
            Self::ExpectedCloseBracket { found } => expected(f, "']'", found.as_ref()),
            Self::ExpectedDash { found } => expected(f, "'-'", found.as_ref()),
            Self::ExpectedColon { found } => expected(f, "':'", found.as_ref()),
            Self::ExpectedOpenParen { found } => expected(f, "'('", found.as_ref()),
            Self::ExpectedCloseParen { found } => expected(f, "')'", found.as_ref()),
            Self::ExpectedKeyword { expected: kw, found } => {
                expected(f, &format!("'{kw}'"), found.as_ref())
            }
            Self::ExpectedString { found } => expected(f, "a quoted string", found.as_ref()),
            Self::ExpectedKey { found } => expected(f, "an entry key", found.as_ref()),
            Self::ExpectedValue { found } => expected(
                f,
                "a quoted string, sqlmref(..) or sqlmfile(..)",
                found.as_ref(),
            ),
            Self::UnterminatedBlock => {
                write!(f, "directive block is missing [sqlmend]")
            }
        }
    }
}

/// Error produced during parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} at line {}, column {}", span.line, span.column)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub span: Span,
}

/// Parse the directive block at the top of a script.
///
/// A script whose first significant token does not open a
/// `/* [sqlmbegin]` block has no directives and yields an empty tree.
///
/// # Errors
///
/// Returns `ParseError` when the block is structurally broken: missing
/// brackets, colons or parentheses, a bad entry value, a lex error, or no
/// closing `[sqlmend]`. A malformed description is only logged.
pub fn parse(script: &str) -> Result<Directives, ParseError> {
    Parser::new(script).parse()
}

/// Parse a standalone `- name: "..."` line.
///
/// Adjacent string literals are joined with one space.
///
/// # Errors
///
/// Returns `ParseError` if the line does not have that shape.
pub fn parse_name(line: &str) -> Result<String, ParseError> {
    Parser::new(line).parse_name()
}

/// Recursive-descent parser.
///
/// `lexer.current()` is always the next unconsumed token and
/// `lexer.peek()` the one after it.
struct Parser<'a> {
    lexer: Lexer<'a>,
    directives: Directives,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            lexer: Lexer::new(input),
            directives: Directives::default(),
        }
    }

    fn parse(mut self) -> Result<Directives, ParseError> {
        if !self.at_directive_block() {
            tracing::trace!("script has no directive block");
            return Ok(self.directives);
        }

        self.expect_punct('[')?;
        self.expect_keyword(Keyword::SqlmBegin)?;
        self.expect_punct(']')?;

        self.expect_punct('[')?;
        self.expect_keyword(Keyword::Script)?;
        self.expect_punct(']')?;

        self.parse_description()?;
        self.skip_section()?;

        loop {
            let open = self.bump()?;
            match open.kind {
                TokenKind::Punct('[') => {}
                TokenKind::Eof => {
                    return Err(ParseError {
                        kind: ParseErrorKind::UnterminatedBlock,
                        span: open.span,
                    });
                }
                _ => {
                    return Err(ParseError {
                        kind: ParseErrorKind::ExpectedOpenBracket {
                            found: open.describe(),
                        },
                        span: open.span,
                    });
                }
            }

            if self.current().kind.is_keyword(Keyword::SqlmEnd) {
                self.bump()?;
                self.expect_punct(']')?;
                return Ok(self.directives);
            }

            if let Some(env) = section_environment(&self.current().kind) {
                self.bump()?;
                self.expect_punct(']')?;
                while self.current().kind.is_punct('-') {
                    self.parse_entry(env)?;
                }
            } else {
                tracing::debug!(
                    line = self.current().span.line,
                    section = %self.current().text,
                    "skipping unknown directive section"
                );
                self.skip_section()?;
            }
        }
    }

    fn at_directive_block(&self) -> bool {
        self.current().kind.is_punct('[') && self.lexer.peek().kind.is_keyword(Keyword::SqlmBegin)
    }

    /// `- description: STRING+`. Never fatal except for lex errors.
    fn parse_description(&mut self) -> Result<(), ParseError> {
        if !self.current().kind.is_punct('-') {
            tracing::debug!("script section has no description");
            return Ok(());
        }
        if !self.lexer.peek().kind.is_keyword(Keyword::Description) {
            tracing::debug!(
                line = self.current().span.line,
                "script section does not start with a description"
            );
            return Ok(());
        }
        self.bump()?;
        self.bump()?;

        if !self.current().kind.is_punct(':') {
            tracing::warn!(
                line = self.current().span.line,
                found = ?self.current().describe(),
                "malformed description line, expected ':'"
            );
            return Ok(());
        }
        self.bump()?;

        if self.current().kind != TokenKind::String {
            tracing::warn!(
                line = self.current().span.line,
                found = ?self.current().describe(),
                "malformed description line, expected a quoted string"
            );
            return Ok(());
        }
        self.directives.description = self.string_run()?;
        Ok(())
    }

    /// `- name: STRING+`. Not part of the block grammar.
    fn parse_name(&mut self) -> Result<String, ParseError> {
        self.expect_punct('-')?;
        self.expect_keyword(Keyword::Name)?;
        self.expect_punct(':')?;
        if self.current().kind != TokenKind::String {
            return Err(self.unexpected(|found| ParseErrorKind::ExpectedString { found }));
        }
        self.string_run()
    }

    /// `- KEY : ( STRING | sqlmref(STRING) | sqlmfile(STRING) )`
    fn parse_entry(&mut self, env: Environment) -> Result<(), ParseError> {
        self.expect_punct('-')?;

        let key = self.bump()?;
        if !matches!(key.kind, TokenKind::Ident | TokenKind::Keyword(_)) {
            return Err(ParseError {
                kind: ParseErrorKind::ExpectedKey {
                    found: key.describe(),
                },
                span: key.span,
            });
        }
        self.expect_punct(':')?;

        match self.current().kind.clone() {
            TokenKind::Keyword(Keyword::SqlmRef) => {
                self.bump()?;
                let name = self.parse_reference_argument()?;
                self.directives
                    .env_mut(env)
                    .nested
                    .push(NestedRef::name(&key.text, &name));
            }
            TokenKind::Keyword(Keyword::SqlmFile) => {
                self.bump()?;
                let path = self.parse_reference_argument()?;
                self.directives
                    .env_mut(env)
                    .nested
                    .push(NestedRef::file(&key.text, &path));
            }
            TokenKind::String => {
                let value = self.bump()?;
                self.directives
                    .env_mut(env)
                    .keywords
                    .insert(key.text, value.text);
            }
            _ => {
                return Err(self.unexpected(|found| ParseErrorKind::ExpectedValue { found }));
            }
        }
        Ok(())
    }

    /// `( STRING )`
    fn parse_reference_argument(&mut self) -> Result<String, ParseError> {
        self.expect_punct('(')?;
        let arg = self.bump()?;
        if arg.kind != TokenKind::String {
            return Err(ParseError {
                kind: ParseErrorKind::ExpectedString {
                    found: arg.describe(),
                },
                span: arg.span,
            });
        }
        self.expect_punct(')')?;
        Ok(arg.text)
    }

    /// One or more adjacent strings, joined by a space.
    fn string_run(&mut self) -> Result<String, ParseError> {
        let mut out = self.bump()?.text;
        while self.current().kind == TokenKind::String {
            out.push(' ');
            out.push_str(&self.bump()?.text);
        }
        Ok(out)
    }

    /// Consume tokens up to the next `[` or end of input.
    fn skip_section(&mut self) -> Result<(), ParseError> {
        while !self.current().kind.is_punct('[') && self.current().kind != TokenKind::Eof {
            self.bump()?;
        }
        Ok(())
    }

    const fn current(&self) -> &Token {
        self.lexer.current()
    }

    fn bump(&mut self) -> Result<Token, ParseError> {
        let token = self.lexer.current().clone();
        if let TokenKind::Error(kind) = token.kind {
            return Err(ParseError {
                kind: ParseErrorKind::Lex(kind),
                span: token.span,
            });
        }
        self.lexer.next();
        Ok(token)
    }

    fn unexpected(&self, kind: impl FnOnce(Option<String>) -> ParseErrorKind) -> ParseError {
        let token = self.current();
        let kind = match token.kind {
            TokenKind::Error(lex) => ParseErrorKind::Lex(lex),
            _ => kind(token.describe()),
        };
        ParseError {
            kind,
            span: token.span,
        }
    }

    fn expect_punct(&mut self, ch: char) -> Result<(), ParseError> {
        if self.current().kind.is_punct(ch) {
            self.bump()?;
            return Ok(());
        }
        Err(self.unexpected(|found| match ch {
            '[' => ParseErrorKind::ExpectedOpenBracket { found },
            ']' => ParseErrorKind::ExpectedCloseBracket { found },
            ':' => ParseErrorKind::ExpectedColon { found },
            '(' => ParseErrorKind::ExpectedOpenParen { found },
            ')' => ParseErrorKind::ExpectedCloseParen { found },
            _ => ParseErrorKind::ExpectedDash { found },
        }))
    }

    fn expect_keyword(&mut self, kw: Keyword) -> Result<(), ParseError> {
        if self.current().kind.is_keyword(kw) {
            self.bump()?;
            return Ok(());
        }
        Err(self.unexpected(|found| ParseErrorKind::ExpectedKeyword {
            expected: kw,
            found,
        }))
    }
}

const fn section_environment(kind: &TokenKind) -> Option<Environment> {
    match kind {
        TokenKind::Keyword(Keyword::Dev) => Some(Environment::Dev),
        TokenKind::Keyword(Keyword::Prod) => Some(Environment::Prod),
        TokenKind::Keyword(Keyword::Local) => Some(Environment::Local),
        TokenKind::Keyword(Keyword::Int) => Some(Environment::Int),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::RefSource;

    const HEADER: &str = "/*\n[sqlmbegin]\n[script]\n  - description: \"d\"\n";

    fn block(body: &str) -> String {
        format!("{HEADER}{body}[sqlmend]\n*/\nselect 1\n")
    }

    #[test]
    fn no_block_is_empty() {
        let d = parse("select * from t").expect("parse failed");
        assert_eq!(d, Directives::default());
    }

    #[test]
    fn leading_comment_is_skipped() {
        let d = parse(&format!("-- header\n{}", block(""))).expect("parse failed");
        assert_eq!(d.description, "d");
    }

    #[test]
    fn keywords_go_to_their_environment() {
        let d = parse(&block(
            "[prod]\n  - t: \"P\"\n[int]\n  - t: \"I\"\n[local]\n  - t: \"L\"\n",
        ))
        .expect("parse failed");
        assert!(d.dev.keywords.is_empty());
        assert_eq!(d.prod.keywords["t"], "P");
        assert_eq!(d.int.keywords["t"], "I");
        assert_eq!(d.local.keywords["t"], "L");
    }

    #[test]
    fn references_keep_declaration_order() {
        let d = parse(&block(
            "[dev]\n  - b: sqlmfile(\"b.sql\")\n  - a: sqlmref(\"a\")\n  - c: sqlmfile(\"c.sql\")\n",
        ))
        .expect("parse failed");
        let keys: Vec<_> = d.dev.nested.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, ["b", "a", "c"]);
        assert_eq!(d.dev.nested[1].source, RefSource::Name("a".to_string()));
    }

    #[test]
    fn keyword_can_be_used_as_key() {
        let d = parse(&block("[dev]\n  - table: \"x.y\"\n")).expect("parse failed");
        assert_eq!(d.dev.keywords["table"], "x.y");
    }

    #[test]
    fn repeated_environment_sections_accumulate() {
        let d = parse(&block("[dev]\n  - a: \"1\"\n[dev]\n  - b: \"2\"\n")).expect("parse failed");
        assert_eq!(d.dev.keywords.len(), 2);
    }

    #[test]
    fn missing_colon_is_fatal() {
        let err = parse(&block("[dev]\n  - a \"1\"\n")).unwrap_err();
        assert!(matches!(err.kind, ParseErrorKind::ExpectedColon { .. }));
    }

    #[test]
    fn missing_paren_is_fatal() {
        let err = parse(&block("[dev]\n  - a: sqlmref \"x\")\n")).unwrap_err();
        assert!(matches!(err.kind, ParseErrorKind::ExpectedOpenParen { .. }));
        let err = parse(&block("[dev]\n  - a: sqlmfile(\"x\"\n")).unwrap_err();
        assert!(matches!(err.kind, ParseErrorKind::ExpectedCloseParen { .. }));
    }

    #[test]
    fn missing_close_bracket_is_fatal() {
        let err = parse(&block("[dev\n  - a: \"1\"\n")).unwrap_err();
        assert!(matches!(err.kind, ParseErrorKind::ExpectedCloseBracket { .. }));
    }

    #[test]
    fn non_string_value_is_fatal() {
        let err = parse(&block("[dev]\n  - a: 42\n")).unwrap_err();
        assert_eq!(
            err.kind,
            ParseErrorKind::ExpectedValue {
                found: Some("42".to_string())
            }
        );
    }

    #[test]
    fn missing_end_is_fatal() {
        let err = parse("/* [sqlmbegin]\n[script]\n[dev]\n - a: \"1\"\n").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnterminatedBlock);
    }

    #[test]
    fn missing_script_section_is_fatal() {
        let err = parse("/* [sqlmbegin]\n[dev]\n[sqlmend] */").unwrap_err();
        assert_eq!(
            err.kind,
            ParseErrorKind::ExpectedKeyword {
                expected: Keyword::Script,
                found: Some("dev".to_string())
            }
        );
    }

    #[test]
    fn lex_error_in_block_is_fatal() {
        let err = parse(&block("[dev]\n  - a: \"open\n")).unwrap_err();
        assert_eq!(
            err.kind,
            ParseErrorKind::Lex(LexErrorKind::UnterminatedString)
        );
    }

    #[test]
    fn malformed_description_is_not_fatal() {
        let d = parse("/* [sqlmbegin]\n[script]\n - description \"x\"\n[dev]\n - a: \"1\"\n[sqlmend] */")
            .expect("parse failed");
        assert_eq!(d.description, "");
        assert_eq!(d.dev.keywords["a"], "1");
    }

    #[test]
    fn description_joins_adjacent_strings() {
        let d = parse("/* [sqlmbegin]\n[script]\n - description: \"a\" 'b'\n[sqlmend] */")
            .expect("parse failed");
        assert_eq!(d.description, "a b");
    }

    #[test]
    fn name_line() {
        assert_eq!(parse_name("- name: \"daily\" \"load\""), Ok("daily load".to_string()));
        let err = parse_name("- name \"x\"").unwrap_err();
        assert!(matches!(err.kind, ParseErrorKind::ExpectedColon { .. }));
    }

    #[test]
    fn error_display_includes_location() {
        let err = parse(&block("[dev]\n  - a \"1\"\n")).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("expected ':'"), "{msg}");
        assert!(msg.contains("line 6"), "{msg}");
    }
}
