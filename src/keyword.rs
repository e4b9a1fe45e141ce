//! Fixed keyword table.
//!
//! Covers the directive vocabulary plus the common SQL clause words.
//! Lookup is case-insensitive; anything not listed is an identifier.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    // Directive vocabulary.
    SqlmBegin,
    SqlmEnd,
    Script,
    Name,
    Description,
    Dev,
    Prod,
    Local,
    Int,
    SqlmRef,
    SqlmFile,

    // SQL clause words.
    Select,
    From,
    Where,
    Insert,
    Into,
    Values,
    Update,
    Set,
    Delete,
    Create,
    Alter,
    Drop,
    Table,
    View,
    Index,
    Join,
    Left,
    Right,
    Inner,
    Outer,
    On,
    As,
    And,
    Or,
    Not,
    Null,
    Is,
    In,
    Like,
    Between,
    Exists,
    Distinct,
    Group,
    Order,
    By,
    Having,
    Limit,
    Offset,
    Union,
    All,
    With,
    Case,
    When,
    Then,
    Else,
    End,
    Asc,
    Desc,
}

const TABLE: &[(&str, Keyword)] = &[
    ("sqlmbegin", Keyword::SqlmBegin),
    ("sqlmend", Keyword::SqlmEnd),
    ("script", Keyword::Script),
    ("name", Keyword::Name),
    ("description", Keyword::Description),
    ("dev", Keyword::Dev),
    ("prod", Keyword::Prod),
    ("local", Keyword::Local),
    ("int", Keyword::Int),
    ("sqlmref", Keyword::SqlmRef),
    ("sqlmfile", Keyword::SqlmFile),
    ("select", Keyword::Select),
    ("from", Keyword::From),
    ("where", Keyword::Where),
    ("insert", Keyword::Insert),
    ("into", Keyword::Into),
    ("values", Keyword::Values),
    ("update", Keyword::Update),
    ("set", Keyword::Set),
    ("delete", Keyword::Delete),
    ("create", Keyword::Create),
    ("alter", Keyword::Alter),
    ("drop", Keyword::Drop),
    ("table", Keyword::Table),
    ("view", Keyword::View),
    ("index", Keyword::Index),
    ("join", Keyword::Join),
    ("left", Keyword::Left),
    ("right", Keyword::Right),
    ("inner", Keyword::Inner),
    ("outer", Keyword::Outer),
    ("on", Keyword::On),
    ("as", Keyword::As),
    ("and", Keyword::And),
    ("or", Keyword::Or),
    ("not", Keyword::Not),
    ("null", Keyword::Null),
    ("is", Keyword::Is),
    ("in", Keyword::In),
    ("like", Keyword::Like),
    ("between", Keyword::Between),
    ("exists", Keyword::Exists),
    ("distinct", Keyword::Distinct),
    ("group", Keyword::Group),
    ("order", Keyword::Order),
    ("by", Keyword::By),
    ("having", Keyword::Having),
    ("limit", Keyword::Limit),
    ("offset", Keyword::Offset),
    ("union", Keyword::Union),
    ("all", Keyword::All),
    ("with", Keyword::With),
    ("case", Keyword::Case),
    ("when", Keyword::When),
    ("then", Keyword::Then),
    ("else", Keyword::Else),
    ("end", Keyword::End),
    ("asc", Keyword::Asc),
    ("desc", Keyword::Desc),
];

impl Keyword {
    /// Look up a word, ignoring ASCII case.
    #[must_use]
    pub fn lookup(word: &str) -> Option<Self> {
        TABLE
            .iter()
            .find(|(text, _)| text.eq_ignore_ascii_case(word))
            .map(|&(_, kw)| kw)
    }

    /// Canonical lowercase spelling.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        TABLE
            .iter()
            .find(|&&(_, kw)| kw == self)
            .map_or("", |&(text, _)| text)
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
