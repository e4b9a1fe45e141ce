//! Tokenizer behaviour on SQL surrounding directive blocks.

use sqlm::{Keyword, LexErrorKind, Operator, TokenKind, Tokenizer, tokenize};

fn kinds(input: &str) -> Vec<TokenKind> {
    tokenize(input)
        .expect("tokenize")
        .into_iter()
        .map(|t| t.kind)
        .collect()
}

#[test]
fn doubled_delimiters_decode_once() {
    let tokens = tokenize(r#"'a''b' "c""d""#).unwrap();
    assert_eq!(tokens[0].text, "a'b");
    assert_eq!(tokens[1].text, "c\"d");
}

#[test]
fn empty_backtick_identifier_is_an_error() {
    let err = tokenize("select `` from t").unwrap_err();
    assert_eq!(err.kind, LexErrorKind::EmptyIdentifier);
    assert_eq!(err.span.column, 8);
}

#[test]
fn unterminated_backtick_identifier_is_an_error() {
    let err = tokenize("select `abc").unwrap_err();
    assert_eq!(err.kind, LexErrorKind::UnterminatedIdentifier);
}

#[test]
fn ordinary_sql_statement() {
    assert_eq!(
        kinds("select a, b from t where x >= 1.5e3 and y <> 'z';"),
        vec![
            TokenKind::Keyword(Keyword::Select),
            TokenKind::Ident,
            TokenKind::Punct(','),
            TokenKind::Ident,
            TokenKind::Keyword(Keyword::From),
            TokenKind::Ident,
            TokenKind::Keyword(Keyword::Where),
            TokenKind::Ident,
            TokenKind::Operator(Operator::GreaterEqual),
            TokenKind::Float,
            TokenKind::Keyword(Keyword::And),
            TokenKind::Ident,
            TokenKind::Operator(Operator::NotEqual),
            TokenKind::String,
            TokenKind::Punct(';'),
        ]
    );
}

#[test]
fn template_placeholders_are_punctuation() {
    assert_eq!(
        kinds("{{ out_table }}"),
        vec![
            TokenKind::Punct('{'),
            TokenKind::Punct('{'),
            TokenKind::Ident,
            TokenKind::Punct('}'),
            TokenKind::Punct('}'),
        ]
    );
}

#[test]
fn comments_are_kept_as_tokens() {
    let tokens = tokenize("-- note\nselect 1 /* c */").unwrap();
    assert_eq!(tokens[0].kind, TokenKind::Comment);
    assert_eq!(tokens[0].text, "-- note\n");
    assert_eq!(tokens.last().unwrap().kind, TokenKind::Comment);
}

#[test]
fn directive_opener_inside_comment() {
    let tokens = tokenize("/*  [SQLMBEGIN] */").unwrap();
    assert_eq!(tokens[0].kind, TokenKind::Punct('['));
    assert_eq!(tokens[0].span.column, 5);
    assert_eq!(tokens[1].kind, TokenKind::Keyword(Keyword::SqlmBegin));
}

#[test]
fn positional_arguments_are_numbered() {
    let tokens = tokenize("? , ?").unwrap();
    assert_eq!(tokens[0].kind, TokenKind::ValueArg);
    assert_eq!(tokens[0].text, ":v1");
    assert_eq!(tokens[2].text, ":v2");
}

#[test]
fn tokenizer_keeps_returning_eof() {
    let mut tokenizer = Tokenizer::new("x");
    assert_eq!(tokenizer.scan().kind, TokenKind::Ident);
    assert_eq!(tokenizer.scan().kind, TokenKind::Eof);
    assert_eq!(tokenizer.scan().kind, TokenKind::Eof);
}

#[test]
fn byte_order_mark_is_skipped() {
    let tokens = tokenize("\u{feff}select").unwrap();
    assert_eq!(tokens[0].kind, TokenKind::Keyword(Keyword::Select));
    assert_eq!(tokens[0].span.offset, 3);
}
