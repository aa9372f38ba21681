//! Token types for the DDL lexer.

use super::Span;

/// Keywords that steer the `CREATE TABLE` / `CREATE INDEX` grammar.
///
/// Type names (`INTEGER`, `TEXT`, ...) are deliberately not keywords; they
/// lex as identifiers so that any declared type survives untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    // Statements
    Create,
    Table,
    Index,
    Temp,
    Temporary,
    If,
    Not,
    Exists,
    On,
    Where,
    Without,

    // Constraints
    Constraint,
    Primary,
    Key,
    Unique,
    Check,
    Default,
    Collate,
    References,
    Foreign,
    Generated,
    Always,
    As,
    Null,
    Autoincrement,

    // Ordering
    Asc,
    Desc,

    // Conflict resolution
    Conflict,
    Rollback,
    Abort,
    Fail,
    Ignore,
    Replace,
}

impl Keyword {
    /// Attempts to parse a keyword from a string (case-insensitive).
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "CREATE" => Some(Self::Create),
            "TABLE" => Some(Self::Table),
            "INDEX" => Some(Self::Index),
            "TEMP" => Some(Self::Temp),
            "TEMPORARY" => Some(Self::Temporary),
            "IF" => Some(Self::If),
            "NOT" => Some(Self::Not),
            "EXISTS" => Some(Self::Exists),
            "ON" => Some(Self::On),
            "WHERE" => Some(Self::Where),
            "WITHOUT" => Some(Self::Without),
            "CONSTRAINT" => Some(Self::Constraint),
            "PRIMARY" => Some(Self::Primary),
            "KEY" => Some(Self::Key),
            "UNIQUE" => Some(Self::Unique),
            "CHECK" => Some(Self::Check),
            "DEFAULT" => Some(Self::Default),
            "COLLATE" => Some(Self::Collate),
            "REFERENCES" => Some(Self::References),
            "FOREIGN" => Some(Self::Foreign),
            "GENERATED" => Some(Self::Generated),
            "ALWAYS" => Some(Self::Always),
            "AS" => Some(Self::As),
            "NULL" => Some(Self::Null),
            "AUTOINCREMENT" => Some(Self::Autoincrement),
            "ASC" => Some(Self::Asc),
            "DESC" => Some(Self::Desc),
            "CONFLICT" => Some(Self::Conflict),
            "ROLLBACK" => Some(Self::Rollback),
            "ABORT" => Some(Self::Abort),
            "FAIL" => Some(Self::Fail),
            "IGNORE" => Some(Self::Ignore),
            "REPLACE" => Some(Self::Replace),
            _ => None,
        }
    }

    /// Returns the canonical uppercase spelling.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "CREATE",
            Self::Table => "TABLE",
            Self::Index => "INDEX",
            Self::Temp => "TEMP",
            Self::Temporary => "TEMPORARY",
            Self::If => "IF",
            Self::Not => "NOT",
            Self::Exists => "EXISTS",
            Self::On => "ON",
            Self::Where => "WHERE",
            Self::Without => "WITHOUT",
            Self::Constraint => "CONSTRAINT",
            Self::Primary => "PRIMARY",
            Self::Key => "KEY",
            Self::Unique => "UNIQUE",
            Self::Check => "CHECK",
            Self::Default => "DEFAULT",
            Self::Collate => "COLLATE",
            Self::References => "REFERENCES",
            Self::Foreign => "FOREIGN",
            Self::Generated => "GENERATED",
            Self::Always => "ALWAYS",
            Self::As => "AS",
            Self::Null => "NULL",
            Self::Autoincrement => "AUTOINCREMENT",
            Self::Asc => "ASC",
            Self::Desc => "DESC",
            Self::Conflict => "CONFLICT",
            Self::Rollback => "ROLLBACK",
            Self::Abort => "ABORT",
            Self::Fail => "FAIL",
            Self::Ignore => "IGNORE",
            Self::Replace => "REPLACE",
        }
    }

    /// Returns true if this keyword can open a column constraint.
    #[must_use]
    pub const fn starts_column_constraint(&self) -> bool {
        matches!(
            self,
            Self::Constraint
                | Self::Primary
                | Self::Not
                | Self::Null
                | Self::Unique
                | Self::Check
                | Self::Default
                | Self::Collate
                | Self::References
                | Self::Generated
                | Self::As
        )
    }
}

/// The kind of token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    // Literals
    /// Numeric literal, kept as written (e.g., `42`, `1.5e3`, `0x1F`)
    Number(String),
    /// String literal with quotes removed and `''` unescaped
    String(String),
    /// Blob literal hex digits (e.g., `53514C` for `X'53514C'`)
    Blob(String),

    // Identifiers and keywords
    /// Identifier, bare or quoted with `"`, `` ` `` or `[ ]`
    Identifier(String),
    /// Keyword
    Keyword(Keyword),

    // Operators
    /// +
    Plus,
    /// -
    Minus,
    /// *
    Star,
    /// /
    Slash,
    /// %
    Percent,
    /// = or ==
    Eq,
    /// != or <>
    NotEq,
    /// <
    Lt,
    /// <=
    LtEq,
    /// >
    Gt,
    /// >=
    GtEq,
    /// ||
    Concat,
    /// &
    BitAnd,
    /// |
    BitOr,
    /// ~
    BitNot,
    /// <<
    LeftShift,
    /// >>
    RightShift,

    // Delimiters
    /// (
    LeftParen,
    /// )
    RightParen,
    /// ,
    Comma,
    /// ;
    Semicolon,
    /// .
    Dot,
    /// Bind parameter (`?`, `?1`, `:name`, `@name`, `$name`)
    Parameter,

    // Special
    /// End of input
    Eof,
    /// Invalid/unknown token
    Error(String),
}

/// A token with its span in the source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// The kind of token.
    pub kind: TokenKind,
    /// The location in the source text.
    pub span: Span,
}

impl Token {
    /// Creates a new token.
    #[must_use]
    pub const fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Returns true if this is an EOF token.
    #[must_use]
    pub const fn is_eof(&self) -> bool {
        matches!(self.kind, TokenKind::Eof)
    }

    /// Returns the keyword if this is a keyword token.
    #[must_use]
    pub const fn as_keyword(&self) -> Option<Keyword> {
        match &self.kind {
            TokenKind::Keyword(kw) => Some(*kw),
            _ => None,
        }
    }
}
