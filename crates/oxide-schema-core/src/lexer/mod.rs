//! DDL lexer.
//!
//! A hand-written lexer for the subset of SQLite syntax that appears in
//! stored `CREATE TABLE` and `CREATE INDEX` text.

mod span;
mod token;
mod tokenizer;

pub use span::Span;
pub use token::{Keyword, Token, TokenKind};
pub use tokenizer::Lexer;
