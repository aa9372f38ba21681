//! Index definitions.

use std::collections::BTreeMap;

use super::{expression, quote_identifier, MAX_INDEX_NAME_LENGTH, TEMP_TABLE_PREFIX};
use crate::error::{DefinitionError, Result};

/// Sort order of an indexed column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SortOrder {
    /// Ascending (the default).
    #[default]
    Asc,
    /// Descending.
    Desc,
}

impl SortOrder {
    /// Returns the SQL keyword.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Definition of an index on one table.
///
/// The key is a sequence of terms. Plain columns are listed in `columns`;
/// expression terms sit in `expressions` under their position in the key.
/// Sort orders and collations are keyed by term: a column name or an
/// expression's source text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IndexDefinition {
    /// Indexed table.
    pub table: String,
    /// Index name.
    pub name: String,
    /// Whether the index is UNIQUE.
    pub unique: bool,
    /// Indexed columns, in key order.
    pub columns: Vec<String>,
    /// Expression terms by key position.
    pub expressions: BTreeMap<usize, String>,
    /// Partial-index predicate (the text after `WHERE`).
    pub predicate: Option<String>,
    /// Descending terms. Terms absent from the map are ascending.
    pub orders: BTreeMap<String, SortOrder>,
    /// Collating sequences of the terms that name one.
    pub collations: BTreeMap<String, String>,
}

/// One key term, borrowed from an [`IndexDefinition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexTerm<'a> {
    /// A plain column.
    Column(&'a str),
    /// An expression, as written.
    Expression(&'a str),
}

impl<'a> IndexTerm<'a> {
    /// The text orders and collations are keyed by.
    #[must_use]
    pub const fn key(&self) -> &'a str {
        match *self {
            Self::Column(text) | Self::Expression(text) => text,
        }
    }
}

impl IndexDefinition {
    /// Creates a new index definition.
    #[must_use]
    pub fn new<I, S>(table: impl Into<String>, name: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            table: table.into(),
            name: name.into(),
            unique: false,
            columns: columns.into_iter().map(Into::into).collect(),
            expressions: BTreeMap::new(),
            predicate: None,
            orders: BTreeMap::new(),
            collations: BTreeMap::new(),
        }
    }

    /// Makes this a unique index.
    #[must_use]
    pub const fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Appends a column to the key.
    #[must_use]
    pub fn column(mut self, column: impl Into<String>) -> Self {
        self.columns.push(column.into());
        self
    }

    /// Appends an expression such as `lower(name)` to the key.
    #[must_use]
    pub fn with_expression(mut self, expression: impl Into<String>) -> Self {
        let position = self.columns.len() + self.expressions.len();
        self.expressions.insert(position, expression.into());
        self
    }

    /// Restricts the index to rows matching `predicate`.
    #[must_use]
    pub fn with_predicate(mut self, predicate: impl Into<String>) -> Self {
        self.predicate = Some(predicate.into());
        self
    }

    /// Sets the sort order of one term. Ascending entries are not stored.
    #[must_use]
    pub fn order(mut self, term: impl Into<String>, order: SortOrder) -> Self {
        let term = term.into();
        match order {
            SortOrder::Desc => {
                self.orders.insert(term, SortOrder::Desc);
            }
            SortOrder::Asc => {
                self.orders.remove(&term);
            }
        }
        self
    }

    /// Sets the collating sequence of one term.
    #[must_use]
    pub fn collate(mut self, term: impl Into<String>, collation: impl Into<String>) -> Self {
        self.collations.insert(term.into(), collation.into());
        self
    }

    /// Returns the sort order of `term`.
    #[must_use]
    pub fn order_of(&self, term: &str) -> SortOrder {
        self.orders.get(term).copied().unwrap_or_default()
    }

    /// The key terms in key order.
    #[must_use]
    pub fn terms(&self) -> Vec<IndexTerm<'_>> {
        let mut columns = self.columns.iter();
        (0..self.columns.len() + self.expressions.len())
            .filter_map(|position| match self.expressions.get(&position) {
                Some(expression) => Some(IndexTerm::Expression(expression)),
                None => columns.next().map(|c| IndexTerm::Column(c.as_str())),
            })
            .collect()
    }

    /// Returns true if the key, or the predicate, refers to `column`.
    #[must_use]
    pub fn references_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
            || self
                .expressions
                .values()
                .chain(&self.predicate)
                .any(|e| expression::mentions_column(e, column))
    }

    /// Checks the name-length limit.
    ///
    /// # Errors
    ///
    /// Returns [`DefinitionError::IndexNameTooLong`] for names longer than
    /// [`MAX_INDEX_NAME_LENGTH`] characters.
    pub fn validate(&self) -> Result<()> {
        if self.name.chars().count() > MAX_INDEX_NAME_LENGTH {
            return Err(DefinitionError::IndexNameTooLong {
                name: self.name.clone(),
                table: self.table.clone(),
                limit: MAX_INDEX_NAME_LENGTH,
            });
        }
        Ok(())
    }

    /// Renders `CREATE [UNIQUE] INDEX [IF NOT EXISTS] ... [WHERE ...]`.
    #[must_use]
    pub fn to_sql(&self, if_not_exists: bool) -> String {
        let mut sql = String::from("CREATE ");
        if self.unique {
            sql.push_str("UNIQUE ");
        }
        sql.push_str("INDEX ");
        if if_not_exists {
            sql.push_str("IF NOT EXISTS ");
        }

        let terms: Vec<String> = self
            .terms()
            .into_iter()
            .map(|term| {
                let mut rendered = match term {
                    IndexTerm::Column(column) => quote_identifier(column),
                    IndexTerm::Expression(expression) => expression.to_string(),
                };
                if let Some(collation) = self.collations.get(term.key()) {
                    rendered.push_str(" COLLATE ");
                    rendered.push_str(&quote_identifier(collation));
                }
                if self.order_of(term.key()) == SortOrder::Desc {
                    rendered.push_str(" DESC");
                }
                rendered
            })
            .collect();

        sql.push_str(&format!(
            "{} ON {} ({})",
            quote_identifier(&self.name),
            quote_identifier(&self.table),
            terms.join(", ")
        ));

        if let Some(ref predicate) = self.predicate {
            sql.push_str(" WHERE ");
            sql.push_str(predicate);
        }
        sql
    }

    /// Returns the `DROP INDEX` statement for this index.
    #[must_use]
    pub fn drop_sql(&self) -> String {
        format!("DROP INDEX {}", quote_identifier(&self.name))
    }

    /// Returns a copy attached to table `to`.
    ///
    /// Moving onto a temporary table prefixes the index name; moving off
    /// one strips the prefix again, so index names never collide with the
    /// originals during a rebuild.
    #[must_use]
    pub fn rename_table(&self, to: &str) -> Self {
        let mut index = self.clone();
        if to.starts_with(TEMP_TABLE_PREFIX) {
            index.name = format!("{TEMP_TABLE_PREFIX}{}", self.name);
        } else if self.table.starts_with(TEMP_TABLE_PREFIX) {
            if let Some(stripped) = self.name.strip_prefix(TEMP_TABLE_PREFIX) {
                index.name = stripped.to_string();
            }
        }
        index.table = to.to_string();
        index
    }

    /// Returns a copy with column `from` renamed to `to`, in the key
    /// columns, the expressions and the predicate.
    #[must_use]
    pub fn rename_column(&self, from: &str, to: &str) -> Self {
        let rename_term = |term: &str| {
            if term == from {
                to.to_string()
            } else if self.expressions.values().any(|e| e == term) {
                expression::rename_column(term, from, to)
            } else {
                term.to_string()
            }
        };

        Self {
            table: self.table.clone(),
            name: self.name.clone(),
            unique: self.unique,
            columns: self
                .columns
                .iter()
                .map(|c| if c == from { to.to_string() } else { c.clone() })
                .collect(),
            expressions: self
                .expressions
                .iter()
                .map(|(position, e)| (*position, expression::rename_column(e, from, to)))
                .collect(),
            predicate: self
                .predicate
                .as_deref()
                .map(|p| expression::rename_column(p, from, to)),
            orders: self
                .orders
                .iter()
                .map(|(term, order)| (rename_term(term), *order))
                .collect(),
            collations: self
                .collations
                .iter()
                .map(|(term, collation)| (rename_term(term), collation.clone()))
                .collect(),
        }
    }
}
