//! Recursive-descent parser for stored `CREATE` statements.

use super::ast::{
    ColumnClause, CreateIndexStatement, CreateTableStatement, IndexedColumn, PrimaryKeyClause,
    ReferencesClause, TableConstraint,
};
use super::error::ParseError;
use crate::lexer::{Keyword, Lexer, Span, Token, TokenKind};
use crate::schema::{ForeignKeyAction, OnConflict, SortOrder};

/// DDL parser.
pub struct Parser<'a> {
    source: &'a str,
    lexer: Lexer<'a>,
    current: Token,
    previous: Token,
    /// One token of lookahead, filled on demand.
    lookahead: Option<Token>,
}

impl<'a> Parser<'a> {
    /// Creates a new parser for the given input.
    #[must_use]
    pub fn new(source: &'a str) -> Self {
        let mut lexer = Lexer::new(source);
        let current = lexer.next_token();
        Self {
            source,
            lexer,
            current,
            previous: Token::new(TokenKind::Eof, Span::default()),
            lookahead: None,
        }
    }

    /// Parses a `CREATE TABLE` statement.
    ///
    /// # Errors
    ///
    /// Returns a `ParseError` if the input is not a `CREATE TABLE` statement
    /// with a column list. `CREATE TABLE ... AS SELECT` is rejected.
    pub fn parse_create_table(&mut self) -> Result<CreateTableStatement, ParseError> {
        self.expect_keyword(Keyword::Create)?;
        let temporary = if self.check_keyword(Keyword::Temp) || self.check_keyword(Keyword::Temporary)
        {
            self.advance();
            true
        } else {
            false
        };
        self.expect_keyword(Keyword::Table)?;
        let if_not_exists = self.parse_if_not_exists()?;
        let (schema, name) = self.parse_qualified_name()?;

        if self.check_keyword(Keyword::As) {
            return Err(ParseError::new(
                "CREATE TABLE ... AS SELECT has no column definitions",
                self.current.span,
            ));
        }

        self.expect(&TokenKind::LeftParen)?;
        let mut columns = Vec::new();
        let mut constraints = Vec::new();
        loop {
            if self.check_table_constraint() {
                constraints.push(self.parse_table_constraint()?);
            } else {
                columns.push(self.parse_column_clause()?);
            }
            if self.check(&TokenKind::Comma) {
                self.advance();
            } else {
                break;
            }
        }
        self.expect(&TokenKind::RightParen)?;

        // Table options
        let mut without_rowid = false;
        let mut strict = false;
        loop {
            if self.check_keyword(Keyword::Without) {
                self.advance();
                self.expect_word("ROWID")?;
                without_rowid = true;
            } else if self.check_word("STRICT") {
                self.advance();
                strict = true;
            } else {
                break;
            }
            if self.check(&TokenKind::Comma) {
                self.advance();
            } else {
                break;
            }
        }

        self.expect_end()?;

        Ok(CreateTableStatement {
            temporary,
            if_not_exists,
            schema,
            name,
            columns,
            constraints,
            without_rowid,
            strict,
        })
    }

    /// Parses a `CREATE INDEX` statement.
    ///
    /// # Errors
    ///
    /// Returns a `ParseError` if the input is not a `CREATE INDEX` statement.
    pub fn parse_create_index(&mut self) -> Result<CreateIndexStatement, ParseError> {
        self.expect_keyword(Keyword::Create)?;
        let unique = if self.check_keyword(Keyword::Unique) {
            self.advance();
            true
        } else {
            false
        };
        self.expect_keyword(Keyword::Index)?;
        let if_not_exists = self.parse_if_not_exists()?;
        let (schema, name) = self.parse_qualified_name()?;
        self.expect_keyword(Keyword::On)?;
        let table = self.expect_name()?;
        let columns = self.parse_indexed_columns()?;

        let predicate = if self.check_keyword(Keyword::Where) {
            self.advance();
            Some(self.parse_rest_of_statement()?)
        } else {
            None
        };

        self.expect_end()?;

        Ok(CreateIndexStatement {
            unique,
            if_not_exists,
            schema,
            name,
            table,
            columns,
            predicate,
        })
    }

    fn parse_if_not_exists(&mut self) -> Result<bool, ParseError> {
        if !self.check_keyword(Keyword::If) {
            return Ok(false);
        }
        self.advance();
        self.expect_keyword(Keyword::Not)?;
        self.expect_keyword(Keyword::Exists)?;
        Ok(true)
    }

    /// Parses `[schema.]name`.
    fn parse_qualified_name(&mut self) -> Result<(Option<String>, String), ParseError> {
        let first = self.expect_name()?;
        if self.check(&TokenKind::Dot) {
            self.advance();
            let name = self.expect_name()?;
            Ok((Some(first), name))
        } else {
            Ok((None, first))
        }
    }

    fn check_table_constraint(&self) -> bool {
        matches!(
            self.current.as_keyword(),
            Some(
                Keyword::Constraint
                    | Keyword::Primary
                    | Keyword::Unique
                    | Keyword::Check
                    | Keyword::Foreign
            )
        )
    }

    fn parse_column_clause(&mut self) -> Result<ColumnClause, ParseError> {
        let name = self.expect_name()?;
        let type_name = self.parse_type_name()?;
        let mut column = ColumnClause {
            name,
            type_name,
            ..ColumnClause::default()
        };

        while let Some(keyword) = self
            .current
            .as_keyword()
            .filter(Keyword::starts_column_constraint)
        {
            self.advance();
            match keyword {
                Keyword::Constraint => {
                    self.expect_name()?;
                }
                Keyword::Primary => {
                    self.expect_keyword(Keyword::Key)?;
                    let order = self.parse_order();
                    let on_conflict = self.parse_conflict_clause()?;
                    let auto_increment = if self.check_keyword(Keyword::Autoincrement) {
                        self.advance();
                        true
                    } else {
                        false
                    };
                    column.primary_key = Some(PrimaryKeyClause {
                        order,
                        on_conflict,
                        auto_increment,
                    });
                }
                Keyword::Not => {
                    self.expect_keyword(Keyword::Null)?;
                    column.not_null_on_conflict = self.parse_conflict_clause()?;
                    column.not_null = true;
                }
                Keyword::Null => {
                    self.parse_conflict_clause()?;
                }
                Keyword::Unique => {
                    column.unique_on_conflict = self.parse_conflict_clause()?;
                    column.unique = true;
                }
                Keyword::Check => {
                    let check = self.parse_parenthesized()?;
                    column.checks.push(check);
                }
                Keyword::Default => {
                    column.default = Some(self.parse_default_value()?);
                }
                Keyword::Collate => {
                    column.collation = Some(self.expect_name()?);
                }
                Keyword::References => {
                    column.references = Some(self.parse_references()?);
                }
                Keyword::Generated => {
                    self.expect_keyword(Keyword::Always)?;
                    self.expect_keyword(Keyword::As)?;
                    column.generated = Some(self.parse_generated()?);
                }
                Keyword::As => {
                    column.generated = Some(self.parse_generated()?);
                }
                _ => return Err(self.unexpected("column constraint")),
            }
        }

        Ok(column)
    }

    /// Parses an optional type name such as `UNSIGNED BIG INT` or
    /// `DECIMAL(10, 5)`, returning its source text.
    fn parse_type_name(&mut self) -> Result<Option<String>, ParseError> {
        let start = self.current.span;
        let mut end = None;
        while matches!(self.current.kind, TokenKind::Identifier(_)) {
            end = Some(self.current.span);
            self.advance();
        }
        if end.is_some() && self.check(&TokenKind::LeftParen) {
            self.parse_parenthesized()?;
            end = Some(self.previous.span);
        }
        Ok(end.map(|end| self.text(start.merge(end))))
    }

    /// Parses the value after `DEFAULT`, returning its source text.
    fn parse_default_value(&mut self) -> Result<String, ParseError> {
        let start = self.current.span;
        match &self.current.kind {
            TokenKind::LeftParen => {
                self.parse_parenthesized()?;
            }
            TokenKind::Plus | TokenKind::Minus => {
                self.advance();
                if !matches!(self.current.kind, TokenKind::Number(_)) {
                    return Err(self.unexpected("number"));
                }
                self.advance();
            }
            TokenKind::Number(_)
            | TokenKind::String(_)
            | TokenKind::Blob(_)
            | TokenKind::Identifier(_)
            | TokenKind::Keyword(Keyword::Null) => self.advance(),
            _ => return Err(self.unexpected("default value")),
        }
        Ok(self.text(start.merge(self.previous.span)))
    }

    /// Parses `( expr ) [STORED | VIRTUAL]` of a generated column.
    fn parse_generated(&mut self) -> Result<String, ParseError> {
        let expression = self.parse_parenthesized()?;
        if self.check_word("STORED") || self.check_word("VIRTUAL") {
            self.advance();
        }
        Ok(expression)
    }

    /// Parses `ON CONFLICT resolution` if present.
    fn parse_conflict_clause(&mut self) -> Result<Option<OnConflict>, ParseError> {
        if !self.check_keyword(Keyword::On) {
            return Ok(None);
        }
        self.advance();
        self.expect_keyword(Keyword::Conflict)?;
        let resolution = match self.current.as_keyword() {
            Some(Keyword::Rollback) => OnConflict::Rollback,
            Some(Keyword::Abort) => OnConflict::Abort,
            Some(Keyword::Fail) => OnConflict::Fail,
            Some(Keyword::Ignore) => OnConflict::Ignore,
            Some(Keyword::Replace) => OnConflict::Replace,
            _ => return Err(self.unexpected("ROLLBACK, ABORT, FAIL, IGNORE or REPLACE")),
        };
        self.advance();
        Ok(Some(resolution))
    }

    fn parse_order(&mut self) -> Option<SortOrder> {
        let order = match self.current.as_keyword() {
            Some(Keyword::Asc) => SortOrder::Asc,
            Some(Keyword::Desc) => SortOrder::Desc,
            _ => return None,
        };
        self.advance();
        Some(order)
    }

    /// Parses the clause following `REFERENCES`.
    fn parse_references(&mut self) -> Result<ReferencesClause, ParseError> {
        let table = self.expect_name()?;
        let columns = if self.check(&TokenKind::LeftParen) {
            self.parse_name_list()?
        } else {
            Vec::new()
        };
        let mut clause = ReferencesClause {
            table,
            columns,
            ..ReferencesClause::default()
        };

        loop {
            if self.check_keyword(Keyword::On) {
                self.advance();
                if self.check_word("DELETE") {
                    self.advance();
                    clause.on_delete = Some(self.parse_foreign_key_action()?);
                } else if self.check_word("UPDATE") {
                    self.advance();
                    clause.on_update = Some(self.parse_foreign_key_action()?);
                } else {
                    return Err(self.unexpected("DELETE or UPDATE"));
                }
            } else if self.check_word("MATCH") {
                self.advance();
                self.expect_name()?;
            } else if self.check_word("DEFERRABLE")
                || (self.check_keyword(Keyword::Not) && self.peek_is_word("DEFERRABLE"))
            {
                if self.check_keyword(Keyword::Not) {
                    self.advance();
                }
                self.advance();
                if self.check_word("INITIALLY") {
                    self.advance();
                    if self.check_word("DEFERRED") || self.check_word("IMMEDIATE") {
                        self.advance();
                    } else {
                        return Err(self.unexpected("DEFERRED or IMMEDIATE"));
                    }
                }
            } else {
                break;
            }
        }

        Ok(clause)
    }

    fn parse_foreign_key_action(&mut self) -> Result<ForeignKeyAction, ParseError> {
        let action = if self.check_word("SET") {
            self.advance();
            match self.current.as_keyword() {
                Some(Keyword::Null) => ForeignKeyAction::SetNull,
                Some(Keyword::Default) => ForeignKeyAction::SetDefault,
                _ => return Err(self.unexpected("NULL or DEFAULT")),
            }
        } else if self.check_word("CASCADE") {
            ForeignKeyAction::Cascade
        } else if self.check_word("RESTRICT") {
            ForeignKeyAction::Restrict
        } else if self.check_word("NO") {
            self.advance();
            if !self.check_word("ACTION") {
                return Err(self.unexpected("ACTION"));
            }
            ForeignKeyAction::NoAction
        } else {
            return Err(self.unexpected("foreign key action"));
        };
        self.advance();
        Ok(action)
    }

    fn parse_table_constraint(&mut self) -> Result<TableConstraint, ParseError> {
        if self.check_keyword(Keyword::Constraint) {
            self.advance();
            self.expect_name()?;
        }

        match self.current.as_keyword() {
            Some(Keyword::Primary) => {
                self.advance();
                self.expect_keyword(Keyword::Key)?;
                let columns = self.parse_indexed_columns()?;
                let on_conflict = self.parse_conflict_clause()?;
                Ok(TableConstraint::PrimaryKey {
                    columns,
                    on_conflict,
                })
            }
            Some(Keyword::Unique) => {
                self.advance();
                let columns = self.parse_indexed_columns()?;
                let on_conflict = self.parse_conflict_clause()?;
                Ok(TableConstraint::Unique {
                    columns,
                    on_conflict,
                })
            }
            Some(Keyword::Check) => {
                self.advance();
                Ok(TableConstraint::Check(self.parse_parenthesized()?))
            }
            Some(Keyword::Foreign) => {
                self.advance();
                self.expect_keyword(Keyword::Key)?;
                let columns = self.parse_name_list()?;
                self.expect_keyword(Keyword::References)?;
                let references = self.parse_references()?;
                Ok(TableConstraint::ForeignKey {
                    columns,
                    references,
                })
            }
            _ => Err(self.unexpected("PRIMARY KEY, UNIQUE, CHECK or FOREIGN KEY")),
        }
    }

    /// Parses `( name, ... )`.
    fn parse_name_list(&mut self) -> Result<Vec<String>, ParseError> {
        self.expect(&TokenKind::LeftParen)?;
        let mut names = vec![self.expect_name()?];
        while self.check(&TokenKind::Comma) {
            self.advance();
            names.push(self.expect_name()?);
        }
        self.expect(&TokenKind::RightParen)?;
        Ok(names)
    }

    /// Parses `( indexed-column, ... )`.
    fn parse_indexed_columns(&mut self) -> Result<Vec<IndexedColumn>, ParseError> {
        self.expect(&TokenKind::LeftParen)?;
        let mut columns = vec![self.parse_indexed_column()?];
        while self.check(&TokenKind::Comma) {
            self.advance();
            columns.push(self.parse_indexed_column()?);
        }
        self.expect(&TokenKind::RightParen)?;
        Ok(columns)
    }

    /// Parses a column name or expression, then `[COLLATE name] [ASC|DESC]`.
    fn parse_indexed_column(&mut self) -> Result<IndexedColumn, ParseError> {
        let start = self.current.span;
        let first = self.current.kind.clone();
        let mut depth = 0usize;
        let mut count = 0usize;

        loop {
            match &self.current.kind {
                TokenKind::LeftParen => depth += 1,
                TokenKind::RightParen if depth == 0 => break,
                TokenKind::RightParen => depth -= 1,
                TokenKind::Comma
                | TokenKind::Keyword(Keyword::Collate | Keyword::Asc | Keyword::Desc)
                    if depth == 0 =>
                {
                    break
                }
                TokenKind::Eof | TokenKind::Error(_) => return Err(self.unexpected(")")),
                _ => {}
            }
            count += 1;
            self.advance();
        }

        if count == 0 {
            return Err(self.unexpected("column name or expression"));
        }

        let expression = self.text(start.merge(self.previous.span));
        let name = match first {
            TokenKind::Identifier(name) | TokenKind::String(name) if count == 1 => Some(name),
            TokenKind::Keyword(_) if count == 1 => Some(expression.clone()),
            _ => None,
        };

        let collation = if self.check_keyword(Keyword::Collate) {
            self.advance();
            Some(self.expect_name()?)
        } else {
            None
        };
        let order = self.parse_order();

        Ok(IndexedColumn {
            name,
            expression,
            collation,
            order,
        })
    }

    /// Parses `( ... )` with balanced nesting and returns the inner text.
    fn parse_parenthesized(&mut self) -> Result<String, ParseError> {
        self.expect(&TokenKind::LeftParen)?;
        let inner_start = self.current.span.start;
        let mut depth = 0usize;

        loop {
            match &self.current.kind {
                TokenKind::LeftParen => depth += 1,
                TokenKind::RightParen if depth == 0 => break,
                TokenKind::RightParen => depth -= 1,
                TokenKind::Eof | TokenKind::Error(_) => return Err(self.unexpected(")")),
                _ => {}
            }
            self.advance();
        }

        let inner = self.text(Span::new(inner_start, self.current.span.start));
        self.advance();
        Ok(inner)
    }

    /// Consumes tokens up to the end of the statement and returns their
    /// source text.
    fn parse_rest_of_statement(&mut self) -> Result<String, ParseError> {
        let start = self.current.span;
        let mut count = 0usize;
        loop {
            match &self.current.kind {
                TokenKind::Eof | TokenKind::Semicolon => break,
                TokenKind::Error(_) => return Err(self.unexpected("expression")),
                _ => {}
            }
            count += 1;
            self.advance();
        }
        if count == 0 {
            return Err(self.unexpected("expression"));
        }
        Ok(self.text(start.merge(self.previous.span)))
    }

    /// Expects an optional `;` followed by the end of input.
    fn expect_end(&mut self) -> Result<(), ParseError> {
        if self.check(&TokenKind::Semicolon) {
            self.advance();
        }
        if self.current.is_eof() {
            Ok(())
        } else {
            Err(self.unexpected("end of statement"))
        }
    }

    // --- Helper methods ---

    /// Returns the trimmed source text covered by `span`.
    fn text(&self, span: Span) -> String {
        span.slice(self.source).trim().to_string()
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        ParseError::unexpected(expected, &self.current.kind, self.current.span)
    }

    /// Advances to the next token.
    fn advance(&mut self) {
        let next = self
            .lookahead
            .take()
            .unwrap_or_else(|| self.lexer.next_token());
        self.previous = std::mem::replace(&mut self.current, next);
    }

    /// Returns true if the token after the current one is the bare word
    /// `word`.
    fn peek_is_word(&mut self, word: &str) -> bool {
        let lexer = &mut self.lexer;
        let next = self.lookahead.get_or_insert_with(|| lexer.next_token());
        matches!(&next.kind, TokenKind::Identifier(name) if name.eq_ignore_ascii_case(word))
    }

    /// Checks if the current token matches the given kind.
    fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(&self.current.kind) == std::mem::discriminant(kind)
    }

    /// Checks if the current token is the given keyword.
    fn check_keyword(&self, keyword: Keyword) -> bool {
        matches!(&self.current.kind, TokenKind::Keyword(kw) if *kw == keyword)
    }

    /// Checks if the current token is a non-keyword word such as `CASCADE`.
    fn check_word(&self, word: &str) -> bool {
        matches!(&self.current.kind, TokenKind::Identifier(name) if name.eq_ignore_ascii_case(word))
    }

    /// Expects the current token to be the given kind.
    fn expect(&mut self, kind: &TokenKind) -> Result<(), ParseError> {
        if self.check(kind) {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected(&format!("{kind:?}")))
        }
    }

    /// Expects the current token to be the given keyword.
    fn expect_keyword(&mut self, keyword: Keyword) -> Result<(), ParseError> {
        if self.check_keyword(keyword) {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected(keyword.as_str()))
        }
    }

    /// Expects the current token to be the word `word`.
    fn expect_word(&mut self, word: &str) -> Result<(), ParseError> {
        if self.check_word(word) {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected(word))
        }
    }

    /// Expects and returns a name.
    ///
    /// SQLite lets most keywords and string literals stand in for
    /// identifiers, so those are accepted too.
    fn expect_name(&mut self) -> Result<String, ParseError> {
        let name = match &self.current.kind {
            TokenKind::Identifier(name) | TokenKind::String(name) => name.clone(),
            TokenKind::Keyword(_) => self.text(self.current.span),
            _ => return Err(self.unexpected("identifier")),
        };
        self.advance();
        Ok(name)
    }
}

/// Parses a `CREATE TABLE` statement.
///
/// # Errors
///
/// See [`Parser::parse_create_table`].
pub fn parse_create_table(sql: &str) -> Result<CreateTableStatement, ParseError> {
    Parser::new(sql).parse_create_table()
}

/// Parses a `CREATE INDEX` statement.
///
/// # Errors
///
/// See [`Parser::parse_create_index`].
pub fn parse_create_index(sql: &str) -> Result<CreateIndexStatement, ParseError> {
    Parser::new(sql).parse_create_index()
}
