//! Column references inside stored source text.
//!
//! Index expressions, partial-index predicates, `CHECK` constraints and
//! trigger bodies are kept as text. These helpers find and rewrite the
//! column names in that text token by token, so string literals and
//! function names that happen to spell a column are left alone.

use super::quote_identifier;
use crate::lexer::{Keyword, Lexer, Span, Token, TokenKind};

/// Returns true if `token` is the word `word`, keyword or identifier.
fn is_word(token: &Token, source: &str, word: &str) -> bool {
    match &token.kind {
        TokenKind::Identifier(name) => name.eq_ignore_ascii_case(word),
        TokenKind::Keyword(_) => token.span.slice(source).eq_ignore_ascii_case(word),
        _ => false,
    }
}

/// Spans of the tokens in `expression` naming `column`.
fn column_spans(expression: &str, column: &str) -> Vec<Span> {
    let tokens = Lexer::new(expression).tokenize();
    tokens
        .iter()
        .enumerate()
        .filter(|(i, token)| {
            // `name(` is a function call.
            let is_call = tokens
                .get(i + 1)
                .is_some_and(|next| next.kind == TokenKind::LeftParen);
            is_word(token, expression, column) && !is_call
        })
        .map(|(_, token)| token.span)
        .collect()
}

/// Spans of the references to `column` of `table` inside a trigger:
/// `NEW.column`, `OLD.column`, `table.column` and the `UPDATE OF` list.
fn trigger_column_spans(sql: &str, table: &str, column: &str) -> Vec<Span> {
    let tokens = Lexer::new(sql).tokenize();
    let mut spans = Vec::new();
    let mut update_of = false;

    for (i, token) in tokens.iter().enumerate() {
        if update_of {
            if token.kind == TokenKind::Keyword(Keyword::On) {
                update_of = false;
            } else if is_word(token, sql, column) {
                spans.push(token.span);
            }
            continue;
        }
        if i >= 1 && is_word(token, sql, "OF") && is_word(&tokens[i - 1], sql, "UPDATE") {
            update_of = true;
            continue;
        }
        if i >= 2 && tokens[i - 1].kind == TokenKind::Dot && is_word(token, sql, column) {
            let qualifier = &tokens[i - 2];
            if ["NEW", "OLD", table]
                .iter()
                .any(|q| is_word(qualifier, sql, q))
            {
                spans.push(token.span);
            }
        }
    }
    spans
}

fn replace_spans(source: &str, spans: &[Span], to: &str) -> String {
    let replacement = quote_identifier(to);
    let mut replaced = String::with_capacity(source.len() + spans.len() * replacement.len());
    let mut last = 0;
    for span in spans {
        replaced.push_str(&source[last..span.start]);
        replaced.push_str(&replacement);
        last = span.end;
    }
    replaced.push_str(&source[last..]);
    replaced
}

/// Returns true if `expression` refers to `column`.
#[must_use]
pub fn mentions_column(expression: &str, column: &str) -> bool {
    !column_spans(expression, column).is_empty()
}

/// Returns `expression` with every reference to `from` replaced by the
/// quoted name `to`.
#[must_use]
pub fn rename_column(expression: &str, from: &str, to: &str) -> String {
    replace_spans(expression, &column_spans(expression, from), to)
}

/// Returns the `CREATE TRIGGER` text `sql` with the references to column
/// `from` of `table` renamed to `to`.
///
/// Only qualified references and the `UPDATE OF` list are rewritten; an
/// unqualified name in the body may belong to any table the body touches.
#[must_use]
pub fn rename_trigger_column(sql: &str, table: &str, from: &str, to: &str) -> String {
    replace_spans(sql, &trigger_column_spans(sql, table, from), to)
}
