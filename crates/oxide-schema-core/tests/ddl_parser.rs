//! Parses catalog text in the shapes SQLite actually stores.

use oxide_schema_core::ddl::{parse_create_index, parse_create_table, TableConstraint};
use oxide_schema_core::schema::{
    Affinity, ColumnDefinition, ForeignKey, ForeignKeyAction, IndexDefinition, OnConflict,
    PrimaryKey, SortOrder, TableDefinition,
};

#[test]
fn test_statements_in_the_wild() {
    let tables = [
        "CREATE TABLE sqlite_sequence(name,seq)",
        "CREATE TABLE \"users\" (\n  \"id\" INTEGER PRIMARY KEY AUTOINCREMENT,\n  \"email\" TEXT NOT NULL UNIQUE\n)",
        "CREATE TABLE [order items] ([order id] INT, `sku` TEXT COLLATE NOCASE, qty INT CHECK (qty > 0))",
        "create table t(a integer primary key asc, b text default 'it''s', c real default -1.5e3)",
        "CREATE TABLE t (id INTEGER, -- trailing note\n  body TEXT /* inline */ NOT NULL)",
        "CREATE TABLE t (a INT, b INT, UNIQUE (a, b) ON CONFLICT REPLACE) STRICT",
        "CREATE TABLE t (x INT NOT NULL ON CONFLICT FAIL DEFAULT 0)",
        "CREATE TABLE t (p INT REFERENCES parent MATCH FULL DEFERRABLE INITIALLY DEFERRED)",
    ];
    for sql in tables {
        assert!(parse_create_table(sql).is_ok(), "{sql}");
    }

    let indexes = [
        "CREATE INDEX i ON t(a)",
        "CREATE UNIQUE INDEX \"i\" ON \"t\" (\"a\" ASC, \"b\" DESC)",
        "CREATE INDEX i ON t (json_extract(data, '$.kind'))",
        "CREATE INDEX i ON t (a) WHERE a IS NOT NULL AND (b > 1 OR c IN (1, 2))",
    ];
    for sql in indexes {
        assert!(parse_create_index(sql).is_ok(), "{sql}");
    }
}

#[test]
fn test_quoted_names_are_unescaped() {
    let stmt = parse_create_table("CREATE TABLE \"we\"\"ird\" (\"a \"\"b\"\"\" TEXT)").unwrap();
    assert_eq!(stmt.name, "we\"ird");
    assert_eq!(stmt.columns[0].name, "a \"b\"");
}

#[test]
fn test_unique_table_constraint_columns() {
    let stmt =
        parse_create_table("CREATE TABLE t (a INT, b INT, UNIQUE (a, b) ON CONFLICT REPLACE) STRICT")
            .unwrap();
    assert!(stmt.strict);
    match &stmt.constraints[0] {
        TableConstraint::Unique {
            columns,
            on_conflict,
        } => {
            assert!(columns[0].is_column("a"));
            assert!(columns[1].is_column("B"));
            assert_eq!(*on_conflict, Some(OnConflict::Replace));
        }
        other => panic!("unexpected constraint: {other:?}"),
    }
}

#[test]
fn test_rendered_table_parses_back() {
    let table = TableDefinition::new(
        "posts",
        vec![
            ColumnDefinition::new("id", Affinity::Integer)
                .primary_key(PrimaryKey::auto_increment().on_conflict(OnConflict::Abort)),
            ColumnDefinition::new("user_id", Affinity::Integer)
                .not_null()
                .references(
                    ForeignKey::new("user_id", "users", "id").on_delete(ForeignKeyAction::Cascade),
                ),
            ColumnDefinition::new("slug", Affinity::Text).unique(),
        ],
        vec![],
    );

    let stmt = parse_create_table(&table.to_sql(false).unwrap()).unwrap();
    assert_eq!(stmt.name, "posts");
    assert_eq!(
        stmt.primary_key_for("id"),
        Some(PrimaryKey::auto_increment().on_conflict(OnConflict::Abort))
    );
    assert_eq!(stmt.primary_key_for("user_id"), None);

    let user_id = stmt.column("user_id").unwrap();
    assert!(user_id.not_null);
    let references = user_id.references.as_ref().unwrap();
    assert_eq!(references.table, "users");
    assert_eq!(references.on_delete, Some(ForeignKeyAction::Cascade));
    assert!(stmt.column("slug").unwrap().unique);
}

#[test]
fn test_rendered_composite_key_parses_back() {
    let key = PrimaryKey::new().on_conflict(OnConflict::Rollback);
    let table = TableDefinition::new(
        "pairs",
        vec![
            ColumnDefinition::new("a", Affinity::Text).primary_key(key),
            ColumnDefinition::new("b", Affinity::Text).primary_key(key),
        ],
        vec![],
    );
    let stmt = parse_create_table(&table.to_sql(true).unwrap()).unwrap();
    assert!(stmt.if_not_exists);
    assert_eq!(stmt.primary_key_for("a"), Some(key));
    assert_eq!(stmt.primary_key_for("b"), Some(key));
}

#[test]
fn test_rendered_index_parses_back() {
    let index = IndexDefinition::new("events", "events_recent", ["kind", "created_at"])
        .unique()
        .order("created_at", SortOrder::Desc)
        .with_predicate("archived = 0");

    let stmt = parse_create_index(&index.to_sql(true)).unwrap();
    assert!(stmt.unique);
    assert_eq!(stmt.name, "events_recent");
    assert_eq!(stmt.table, "events");
    assert_eq!(stmt.descending_columns(), vec!["created_at"]);
    assert_eq!(stmt.predicate.as_deref(), Some("archived = 0"));
}
