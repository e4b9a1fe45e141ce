//! SQL script composer.
//!
//! A script may carry one directive block inside a leading comment that
//! declares per-environment substitution keywords and nested references
//! to other scripts. Compiling a script inlines every nested reference
//! for the target environment and substitutes `{{ key }}` placeholders.
//!
//! # Quick start
//!
//! ## Parse a directive block
//!
//! ```
//! use sqlm::{Environment, parse};
//!
//! let script = "/* [sqlmbegin]\n[script]\n\t- description: \"loads d\"\n\
//!               [dev]\n\t- out: \"A.B\"\n[sqlmend] */\n\
//!               insert into {{ out }} select 1;\n";
//! let directives = parse(script).unwrap();
//! assert_eq!(directives.description, "loads d");
//! assert_eq!(directives.env(Environment::Dev).keywords["out"], "A.B");
//! ```
//!
//! ## Compile with nested fragments
//!
//! ```
//! use sqlm::{CompileOptions, Compiler, InMemoryLoader};
//!
//! let root = "/* [sqlmbegin] [script] - description: \"root\"\n\
//!             [dev] - body: sqlmfile(\"child.sql\") [sqlmend] */\n\
//!             with x as ({{ body }}) select * from x\n";
//! let loader = InMemoryLoader::new().file("child.sql", "select 1");
//! let out = Compiler::new(loader)
//!     .compile(root, &CompileOptions::new())
//!     .unwrap();
//! assert!(out.contains("with x as (select 1) select * from x"));
//! ```
//!
//! ## Build and format a directive block
//!
//! ```
//! use sqlm::{Directives, EnvBlock, Environment, format, parse};
//!
//! let d = Directives::new()
//!     .description("loads d")
//!     .env_block(Environment::Prod, EnvBlock::new().keyword("out", "P.B"));
//! assert_eq!(parse(&format(&d)).unwrap(), d);
//! ```

// Allow noisy pedantic lints that don't add value for
// a library crate.
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions
)]

pub mod ast;
pub mod builder;
pub mod compiler;
pub mod formatter;
pub mod keyword;
pub mod lexer;
pub mod loader;
pub mod lookahead;
pub mod migration;
pub mod parser;
pub mod template;
pub mod token;
pub mod watch;

pub use ast::{Directives, EnvBlock, Environment, NestedRef, ParseEnvironmentError, RefSource};
pub use compiler::{CompileError, CompileOptions, Compiler, MAX_FRAGMENTS, Stage};
pub use formatter::format;
pub use keyword::Keyword;
pub use lexer::{LexError, LexErrorKind, Tokenizer, tokenize};
pub use loader::{FsLoader, InMemoryLoader, LoadError, NoRemote, RemoteLookup, ScriptLoader};
pub use lookahead::Lexer;
pub use migration::{MigrationRecord, Migrations, applied_flag_name, sanitize};
pub use parser::{ParseError, ParseErrorKind, parse, parse_name};
pub use token::{Operator, Span, Token, TokenKind};
pub use watch::{Recompiler, SIGNAL_CAPACITY, SignalSender, WatchError, signal_channel};

/// Unified error type for the command-line surface.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{0}")]
    Lex(#[from] LexError),
    #[error("{0}")]
    Parse(#[from] ParseError),
    #[error("{0}")]
    Compile(#[from] CompileError),
    #[error("{0}")]
    Watch(#[from] WatchError),
    #[error("invalid migrations: {0}")]
    Migrations(#[from] serde_json::Error),
}

/// Compile `script` for `options` with nested files read relative to the
/// current directory.
pub fn compile(script: &str, options: &CompileOptions) -> Result<String, Error> {
    Ok(Compiler::new(FsLoader::new(".")).compile(script, options)?)
}
