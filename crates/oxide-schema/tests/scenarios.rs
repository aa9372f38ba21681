//! End-to-end schema changes against an in-memory database, on both the
//! native and the rebuild path.

use oxide_schema::prelude::*;
use oxide_schema::pragma;
use oxide_schema_core::InvalidColumnReason;
use sqlx::{Connection, SqliteConnection};

const BEFORE_RENAME_COLUMN: SqliteVersion = SqliteVersion::new(3, 24, 0);
const RENAME_COLUMN: SqliteVersion = SqliteVersion::new(3, 25, 0);
const BEFORE_DROP_COLUMN: SqliteVersion = SqliteVersion::new(3, 34, 1);
const DROP_COLUMN: SqliteVersion = SqliteVersion::new(3, 35, 0);

async fn connect() -> SqliteConnection {
    SqliteConnection::connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory SQLite database")
}

async fn run(conn: &mut SqliteConnection, statements: &[&str]) {
    for sql in statements {
        pragma::execute(conn, sql).await.unwrap();
    }
}

async fn table(conn: &mut SqliteConnection, name: &str) -> TableDefinition {
    SchemaReader::new(conn).table_definition(name).await.unwrap()
}

fn column_names(table: &TableDefinition) -> Vec<&str> {
    table.columns.iter().map(|c| c.name.as_str()).collect()
}

async fn root_page(conn: &mut SqliteConnection, name: &str) -> i64 {
    SchemaReader::new(conn)
        .object_definitions(Some(name), Some(ObjectType::Table), false)
        .await
        .unwrap()[0]
        .root_page
}

async fn count(conn: &mut SqliteConnection, table: &str) -> i64 {
    let sql = format!("SELECT COUNT(*) FROM \"{table}\"");
    sqlx::query_scalar(&sql)
        .fetch_one(conn)
        .await
        .unwrap()
}

async fn users(conn: &mut SqliteConnection) {
    run(
        conn,
        &[
            "CREATE TABLE users (id INTEGER PRIMARY KEY, email TEXT NOT NULL, age INTEGER)",
            "CREATE INDEX users_email ON users (email)",
            "INSERT INTO users (id, email, age) VALUES (1, 'ada@example.com', 36)",
        ],
    )
    .await;
}

async fn users_and_posts(conn: &mut SqliteConnection) {
    run(
        conn,
        &[
            "CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT)",
            "CREATE TABLE posts (\
                id INTEGER PRIMARY KEY, \
                user_id INTEGER REFERENCES users(id), \
                title TEXT, \
                draft INTEGER)",
            "INSERT INTO users (id, name) VALUES (1, 'ada')",
            "INSERT INTO posts (id, user_id, title, draft) VALUES (10, 1, 'hello', 0)",
        ],
    )
    .await;
}

#[tokio::test]
async fn test_drop_column_on_engine_without_native_drop() {
    let mut conn = connect().await;
    users(&mut conn).await;
    let before = table(&mut conn, "users").await;

    SchemaChanger::with_version(&mut conn, BEFORE_DROP_COLUMN)
        .alter_table("users", |t| {
            t.drop_column("age");
        })
        .await
        .unwrap();

    let after = table(&mut conn, "users").await;
    assert_eq!(column_names(&after), vec!["id", "email"]);
    assert_eq!(after.columns, before.columns[..2]);
    assert_eq!(after.indexes, before.indexes);

    let row: (i64, String) = sqlx::query_as("SELECT id, email FROM users")
        .fetch_one(&mut conn)
        .await
        .unwrap();
    assert_eq!(row, (1, "ada@example.com".to_string()));
    assert_eq!(count(&mut conn, "users").await, 1);
}

#[tokio::test]
async fn test_rename_column_keeps_unique_index_enforced() {
    let mut conn = connect().await;
    run(
        &mut conn,
        &[
            "CREATE TABLE users (id INTEGER PRIMARY KEY, email TEXT NOT NULL)",
            "CREATE UNIQUE INDEX users_email ON users (email)",
            "INSERT INTO users (id, email) VALUES (1, 'ada@example.com')",
        ],
    )
    .await;

    SchemaChanger::with_version(&mut conn, BEFORE_RENAME_COLUMN)
        .alter_table("users", |t| {
            t.rename_column("email", "email2");
        })
        .await
        .unwrap();

    let after = table(&mut conn, "users").await;
    assert_eq!(column_names(&after), vec!["id", "email2"]);
    assert_eq!(
        after.indexes,
        vec![IndexDefinition::new("users", "users_email", ["email2"]).unique()]
    );

    let duplicate = pragma::execute(
        &mut conn,
        "INSERT INTO users (id, email2) VALUES (2, 'ada@example.com')",
    )
    .await;
    assert!(matches!(duplicate, Err(SchemaError::Database(_))));
    assert_eq!(count(&mut conn, "users").await, 1);
}

#[tokio::test]
async fn test_drop_unrelated_column_keeps_references_valid() {
    let mut conn = connect().await;
    users_and_posts(&mut conn).await;

    SchemaChanger::with_version(&mut conn, BEFORE_DROP_COLUMN)
        .alter_table("posts", |t| {
            t.drop_column("draft");
        })
        .await
        .unwrap();

    let posts = table(&mut conn, "posts").await;
    assert_eq!(column_names(&posts), vec!["id", "user_id", "title"]);
    assert_eq!(
        posts.column("user_id").and_then(|c| c.references.clone()),
        Some(ForeignKey::new("user_id", "users", "id"))
    );
    assert!(pragma::foreign_key_check(&mut conn).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_rebuild_with_dangling_reference_rolls_back() {
    let mut conn = connect().await;
    users_and_posts(&mut conn).await;

    // Enforcement has to be off to store the dangling row at all.
    pragma::set_foreign_keys(&mut conn, false).await.unwrap();
    run(
        &mut conn,
        &["INSERT INTO posts (id, user_id, title, draft) VALUES (11, 99, 'orphan', 1)"],
    )
    .await;
    pragma::set_foreign_keys(&mut conn, true).await.unwrap();

    let before = table(&mut conn, "posts").await;
    let result = SchemaChanger::with_version(&mut conn, BEFORE_DROP_COLUMN)
        .alter_table("posts", |t| {
            t.drop_column("draft");
        })
        .await;

    match result {
        Err(SchemaError::ForeignKeyViolations(violations)) => {
            assert_eq!(
                violations,
                vec![ForeignKeyViolation {
                    table: "posts".into(),
                    row_id: Some(11),
                    parent: "users".into(),
                }]
            );
        }
        other => panic!("Expected foreign key violations, got {other:?}"),
    }

    assert_eq!(table(&mut conn, "posts").await, before);
    assert_eq!(count(&mut conn, "posts").await, 2);
    assert!(SchemaReader::new(&mut conn)
        .object_definitions(Some("tmp_posts"), None, false)
        .await
        .unwrap()
        .is_empty());

    let settings = RebuildSettings::read(&mut conn).await.unwrap();
    assert!(settings.foreign_keys);
    assert!(!settings.defer_foreign_keys);
    assert!(!settings.legacy_alter_table);
}

#[tokio::test]
async fn test_rename_column_dispatch_boundary() {
    let mut conn = connect().await;
    users(&mut conn).await;

    let page = root_page(&mut conn, "users").await;
    SchemaChanger::with_version(&mut conn, RENAME_COLUMN)
        .alter_table("users", |t| {
            t.rename_column("age", "years");
        })
        .await
        .unwrap();
    assert_eq!(root_page(&mut conn, "users").await, page);

    SchemaChanger::with_version(&mut conn, BEFORE_RENAME_COLUMN)
        .alter_table("users", |t| {
            t.rename_column("years", "age");
        })
        .await
        .unwrap();
    assert_ne!(root_page(&mut conn, "users").await, page);
    assert_eq!(
        column_names(&table(&mut conn, "users").await),
        vec!["id", "email", "age"]
    );
}

#[tokio::test]
async fn test_drop_column_dispatch_boundary() {
    let mut conn = connect().await;
    users(&mut conn).await;

    // Native DROP COLUMN refuses indexed columns; the rebuild drops the
    // index along with the column.
    let native = SchemaChanger::with_version(&mut conn, DROP_COLUMN)
        .alter_table("users", |t| {
            t.drop_column("email");
        })
        .await;
    assert!(matches!(native, Err(SchemaError::Database(_))));

    let page = root_page(&mut conn, "users").await;
    SchemaChanger::with_version(&mut conn, DROP_COLUMN)
        .alter_table("users", |t| {
            t.drop_column("age");
        })
        .await
        .unwrap();
    assert_eq!(root_page(&mut conn, "users").await, page);

    SchemaChanger::with_version(&mut conn, BEFORE_DROP_COLUMN)
        .alter_table("users", |t| {
            t.drop_column("email");
        })
        .await
        .unwrap();
    let after = table(&mut conn, "users").await;
    assert_eq!(column_names(&after), vec!["id"]);
    assert!(after.indexes.is_empty());
}

#[tokio::test]
async fn test_add_column_is_native_on_every_version() {
    for version in [BEFORE_RENAME_COLUMN, DROP_COLUMN] {
        let mut conn = connect().await;
        users(&mut conn).await;
        let page = root_page(&mut conn, "users").await;

        SchemaChanger::with_version(&mut conn, version)
            .alter_table("users", |t| {
                t.add_column(
                    ColumnDefinition::new("active", Affinity::Integer)
                        .not_null()
                        .default_value(LiteralValue::Numeric("1".into())),
                );
            })
            .await
            .unwrap();

        assert_eq!(root_page(&mut conn, "users").await, page);
        let active: i64 = sqlx::query_scalar("SELECT active FROM users WHERE id = 1")
            .fetch_one(&mut conn)
            .await
            .unwrap();
        assert_eq!(active, 1);
    }
}

#[tokio::test]
async fn test_add_column_rejections() {
    let cases = [
        (
            ColumnDefinition::new("id2", Affinity::Integer).primary_key(PrimaryKey::new()),
            InvalidColumnReason::PrimaryKey,
        ),
        (
            ColumnDefinition::new("seen", Affinity::Text)
                .default_value(LiteralValue::CurrentDate),
            InvalidColumnReason::NonConstantDefault,
        ),
        (
            ColumnDefinition::new("nick", Affinity::Text).not_null(),
            InvalidColumnReason::NotNullWithNullDefault,
        ),
    ];

    for version in [BEFORE_RENAME_COLUMN, DROP_COLUMN] {
        for (column, expected) in cases.clone() {
            let mut conn = connect().await;
            users(&mut conn).await;

            let result = SchemaChanger::with_version(&mut conn, version)
                .alter_table("users", |t| {
                    t.drop_column("age").add_column(column);
                })
                .await;

            match result {
                Err(SchemaError::Definition(DefinitionError::InvalidColumn { reason, .. })) => {
                    assert_eq!(reason, expected);
                }
                other => panic!("Expected an invalid column error, got {other:?}"),
            }
            // Nothing ran, not even the drop queued before the bad column.
            assert_eq!(
                column_names(&table(&mut conn, "users").await),
                vec!["id", "email", "age"]
            );
        }
    }
}

#[tokio::test]
async fn test_rebuild_rejects_long_index_names() {
    let mut conn = connect().await;
    let name = "i".repeat(61);
    run(
        &mut conn,
        &[
            "CREATE TABLE users (id INTEGER PRIMARY KEY, email TEXT, age INTEGER)",
            &format!("CREATE INDEX {name} ON users (email)"),
        ],
    )
    .await;

    let result = SchemaChanger::with_version(&mut conn, BEFORE_DROP_COLUMN)
        .alter_table("users", |t| {
            t.drop_column("age");
        })
        .await;

    match result {
        Err(SchemaError::Definition(DefinitionError::IndexNameTooLong { name: long, .. })) => {
            assert_eq!(long, format!("tmp_{name}"));
        }
        other => panic!("Expected a long index name error, got {other:?}"),
    }
    assert_eq!(
        column_names(&table(&mut conn, "users").await),
        vec!["id", "email", "age"]
    );
}

#[tokio::test]
async fn test_rebuild_unknown_column() {
    let mut conn = connect().await;
    users(&mut conn).await;

    let rebuilt = SchemaChanger::with_version(&mut conn, BEFORE_RENAME_COLUMN)
        .alter_table("users", |t| {
            t.rename_column("nickname", "handle");
        })
        .await;
    assert!(matches!(
        rebuilt,
        Err(SchemaError::Definition(DefinitionError::UnknownColumn { .. }))
    ));

    // The native statement leaves the check to the engine.
    let native = SchemaChanger::with_version(&mut conn, RENAME_COLUMN)
        .alter_table("users", |t| {
            t.rename_column("nickname", "handle");
        })
        .await;
    assert!(matches!(native, Err(SchemaError::Database(_))));

    let result = SchemaChanger::with_version(&mut conn, BEFORE_DROP_COLUMN)
        .alter_table("users", |t| {
            t.drop_column("nickname");
        })
        .await;
    assert!(matches!(
        result,
        Err(SchemaError::Definition(DefinitionError::UnknownColumn { .. }))
    ));
}

#[tokio::test]
async fn test_several_operations_in_one_call() {
    let mut conn = connect().await;
    users(&mut conn).await;

    SchemaChanger::with_version(&mut conn, BEFORE_RENAME_COLUMN)
        .alter_table("users", |t| {
            t.rename_column("email", "contact")
                .drop_column("age")
                .add_column(ColumnDefinition::new("bio", Affinity::Text));
        })
        .await
        .unwrap();

    let after = table(&mut conn, "users").await;
    assert_eq!(column_names(&after), vec!["id", "contact", "bio"]);
    assert_eq!(
        after.indexes,
        vec![IndexDefinition::new("users", "users_email", ["contact"])]
    );
    assert_eq!(count(&mut conn, "users").await, 1);
}

#[tokio::test]
async fn test_rename_and_drop_table() {
    let mut conn = connect().await;
    users(&mut conn).await;

    SchemaChanger::with_version(&mut conn, DROP_COLUMN)
        .rename_table("users", "members")
        .await
        .unwrap();

    let members = table(&mut conn, "members").await;
    assert_eq!(column_names(&members), vec!["id", "email", "age"]);
    assert_eq!(members.indexes[0].table, "members");

    {
        let mut changer = SchemaChanger::with_version(&mut conn, DROP_COLUMN);
        changer.drop_table("members", false).await.unwrap();
        changer.drop_table("members", true).await.unwrap();
    }

    assert!(matches!(
        SchemaReader::new(&mut conn).table_definition("members").await,
        Err(SchemaError::TableNotFound(_))
    ));
}

async fn trigger_sql(conn: &mut SqliteConnection, name: &str) -> Option<String> {
    SchemaReader::new(conn)
        .object_definitions(Some(name), Some(ObjectType::Trigger), false)
        .await
        .unwrap()
        .into_iter()
        .next()
        .and_then(|o| o.sql)
}

#[tokio::test]
async fn test_rebuild_parent_table_keeps_child_references() {
    let mut conn = connect().await;
    run(
        &mut conn,
        &[
            "PRAGMA foreign_keys = ON",
            "CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT, age INTEGER)",
            "CREATE TABLE posts (\
                id INTEGER PRIMARY KEY, \
                user_id INTEGER REFERENCES users(id) ON DELETE CASCADE)",
            "INSERT INTO users VALUES (1, 'ada', 36), (2, 'grace', 45)",
            "INSERT INTO posts VALUES (10, 1), (11, 2), (12, 1)",
        ],
    )
    .await;
    let page = root_page(&mut conn, "users").await;

    SchemaChanger::with_version(&mut conn, BEFORE_DROP_COLUMN)
        .alter_table("users", |t| {
            t.drop_column("age");
        })
        .await
        .unwrap();

    assert_ne!(root_page(&mut conn, "users").await, page);
    assert_eq!(count(&mut conn, "posts").await, 3);
    assert_eq!(
        SchemaReader::new(&mut conn).foreign_keys("posts").await.unwrap(),
        vec![ForeignKey::new("user_id", "users", "id").on_delete(ForeignKeyAction::Cascade)]
    );
    assert!(pragma::foreign_key_check(&mut conn).await.unwrap().is_empty());
    assert!(RebuildSettings::read(&mut conn).await.unwrap().foreign_keys);

    run(&mut conn, &["DELETE FROM users WHERE id = 1"]).await;
    assert_eq!(count(&mut conn, "posts").await, 1);
}

#[tokio::test]
async fn test_rebuild_keeps_views_over_the_table() {
    let mut conn = connect().await;
    users(&mut conn).await;
    run(&mut conn, &["CREATE VIEW contacts AS SELECT id, email FROM users"]).await;

    SchemaChanger::with_version(&mut conn, BEFORE_DROP_COLUMN)
        .alter_table("users", |t| {
            t.drop_column("age");
        })
        .await
        .unwrap();

    assert_eq!(column_names(&table(&mut conn, "users").await), vec!["id", "email"]);
    assert_eq!(count(&mut conn, "contacts").await, 1);
    assert!(!RebuildSettings::read(&mut conn).await.unwrap().legacy_alter_table);
}

#[tokio::test]
async fn test_view_using_changed_column_is_refused() {
    let mut conn = connect().await;
    users(&mut conn).await;
    run(&mut conn, &["CREATE VIEW contacts AS SELECT id, email FROM users"]).await;
    let page = root_page(&mut conn, "users").await;

    let result = SchemaChanger::with_version(&mut conn, BEFORE_RENAME_COLUMN)
        .alter_table("users", |t| {
            t.rename_column("email", "contact");
        })
        .await;

    match result {
        Err(SchemaError::Definition(DefinitionError::DependentObject { column, kind, object, .. })) => {
            assert_eq!(column, "email");
            assert_eq!(kind, ObjectType::View);
            assert_eq!(object, "contacts");
        }
        other => panic!("Expected a dependent view error, got {other:?}"),
    }
    assert_eq!(root_page(&mut conn, "users").await, page);
    assert_eq!(count(&mut conn, "contacts").await, 1);
}

#[tokio::test]
async fn test_rebuild_recreates_triggers() {
    let mut conn = connect().await;
    users(&mut conn).await;
    run(
        &mut conn,
        &[
            "CREATE TABLE log (entry TEXT)",
            "CREATE TRIGGER users_log AFTER INSERT ON users BEGIN \
                INSERT INTO log (entry) VALUES (NEW.email); END",
        ],
    )
    .await;

    SchemaChanger::with_version(&mut conn, BEFORE_DROP_COLUMN)
        .alter_table("users", |t| {
            t.drop_column("age");
        })
        .await
        .unwrap();

    assert!(trigger_sql(&mut conn, "users_log").await.is_some());
    run(
        &mut conn,
        &["INSERT INTO users (id, email) VALUES (2, 'grace@example.com')"],
    )
    .await;
    assert_eq!(count(&mut conn, "log").await, 1);

    SchemaChanger::with_version(&mut conn, BEFORE_RENAME_COLUMN)
        .alter_table("users", |t| {
            t.rename_column("email", "contact");
        })
        .await
        .unwrap();

    let sql = trigger_sql(&mut conn, "users_log").await.unwrap();
    assert!(sql.contains("NEW.\"contact\""), "{sql}");
    run(
        &mut conn,
        &["INSERT INTO users (id, contact) VALUES (3, 'joan@example.com')"],
    )
    .await;
    let entry: String = sqlx::query_scalar("SELECT entry FROM log ORDER BY rowid DESC")
        .fetch_one(&mut conn)
        .await
        .unwrap();
    assert_eq!(entry, "joan@example.com");
}

#[tokio::test]
async fn test_trigger_using_dropped_column_is_refused() {
    let mut conn = connect().await;
    users(&mut conn).await;
    run(
        &mut conn,
        &[
            "CREATE TABLE log (entry INTEGER)",
            "CREATE TRIGGER users_age AFTER INSERT ON users BEGIN \
                INSERT INTO log (entry) VALUES (NEW.age); END",
        ],
    )
    .await;
    let before = table(&mut conn, "users").await;
    let page = root_page(&mut conn, "users").await;

    let result = SchemaChanger::with_version(&mut conn, BEFORE_DROP_COLUMN)
        .alter_table("users", |t| {
            t.drop_column("age");
        })
        .await;

    match result {
        Err(SchemaError::Definition(DefinitionError::DependentObject { kind, object, .. })) => {
            assert_eq!(kind, ObjectType::Trigger);
            assert_eq!(object, "users_age");
        }
        other => panic!("Expected a dependent trigger error, got {other:?}"),
    }
    assert_eq!(table(&mut conn, "users").await, before);
    assert_eq!(root_page(&mut conn, "users").await, page);
    assert!(trigger_sql(&mut conn, "users_age").await.is_some());
}

#[tokio::test]
async fn test_rebuild_keeps_expression_indexes_and_collations() {
    let mut conn = connect().await;
    run(
        &mut conn,
        &[
            "CREATE TABLE tags (a TEXT COLLATE NOCASE, b TEXT, age INTEGER)",
            "CREATE UNIQUE INDEX tags_lower ON tags (lower(b))",
            "CREATE UNIQUE INDEX tags_pair ON tags (a, lower(b))",
            "CREATE INDEX tags_b ON tags (b COLLATE NOCASE DESC)",
            "INSERT INTO tags VALUES ('x', 'one', 1), ('x', 'two', 2)",
        ],
    )
    .await;
    let before = table(&mut conn, "tags").await;

    SchemaChanger::with_version(&mut conn, BEFORE_DROP_COLUMN)
        .alter_table("tags", |t| {
            t.drop_column("age");
        })
        .await
        .unwrap();

    let after = table(&mut conn, "tags").await;
    assert_eq!(after.indexes, before.indexes);
    assert_eq!(
        after.column("a").and_then(|c| c.collation.as_deref()),
        Some("NOCASE")
    );
    assert_eq!(
        after.indexes.iter().find(|i| i.name == "tags_pair"),
        Some(
            &IndexDefinition::new("tags", "tags_pair", ["a"])
                .unique()
                .with_expression("lower(b)")
        )
    );

    // lower(b) is still unique on its own.
    let duplicate = pragma::execute(&mut conn, "INSERT INTO tags VALUES ('y', 'ONE')").await;
    assert!(matches!(duplicate, Err(SchemaError::Database(_))));
    // (a, lower(b)) did not collapse to (a).
    run(&mut conn, &["INSERT INTO tags VALUES ('x', 'three')"]).await;
    assert_eq!(count(&mut conn, "tags").await, 3);

    let matches: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tags WHERE a = 'X'")
        .fetch_one(&mut conn)
        .await
        .unwrap();
    assert_eq!(matches, 3);
}

#[tokio::test]
async fn test_rebuild_keeps_without_rowid_key_order() {
    let mut conn = connect().await;
    run(
        &mut conn,
        &[
            "CREATE TABLE pairs (\
                a TEXT NOT NULL, b TEXT NOT NULL, note TEXT, \
                PRIMARY KEY (b, a)) WITHOUT ROWID",
            "INSERT INTO pairs VALUES ('1', '2', 'n')",
        ],
    )
    .await;

    SchemaChanger::with_version(&mut conn, BEFORE_DROP_COLUMN)
        .alter_table("pairs", |t| {
            t.drop_column("note");
        })
        .await
        .unwrap();

    let after = table(&mut conn, "pairs").await;
    assert!(after.without_rowid);
    assert_eq!(after.key_order, vec!["b", "a"]);
    let key: Vec<String> =
        sqlx::query_scalar("SELECT name FROM pragma_table_info('pairs') WHERE pk > 0 ORDER BY pk")
            .fetch_all(&mut conn)
            .await
            .unwrap();
    assert_eq!(key, vec!["b", "a"]);
    assert!(pragma::execute(&mut conn, "SELECT rowid FROM pairs").await.is_err());
    assert_eq!(count(&mut conn, "pairs").await, 1);
}

#[tokio::test]
async fn test_rebuild_keeps_check_and_unique_constraints() {
    let mut conn = connect().await;
    run(
        &mut conn,
        &[
            "CREATE TABLE scores (a INTEGER CHECK (a > 0), b INTEGER, c INTEGER, UNIQUE (a, c))",
            "INSERT INTO scores VALUES (1, 2, 3)",
        ],
    )
    .await;

    SchemaChanger::with_version(&mut conn, BEFORE_DROP_COLUMN)
        .alter_table("scores", |t| {
            t.drop_column("b");
        })
        .await
        .unwrap();

    let after = table(&mut conn, "scores").await;
    assert_eq!(column_names(&after), vec!["a", "c"]);
    assert_eq!(after.checks, vec!["a > 0"]);
    assert_eq!(after.unique_constraints, vec![vec!["a", "c"]]);

    let failed = pragma::execute(&mut conn, "INSERT INTO scores VALUES (0, 1)").await;
    assert!(matches!(failed, Err(SchemaError::Database(_))));
    let failed = pragma::execute(&mut conn, "INSERT INTO scores VALUES (1, 3)").await;
    assert!(matches!(failed, Err(SchemaError::Database(_))));
    run(&mut conn, &["INSERT INTO scores VALUES (1, 4)"]).await;
    assert_eq!(count(&mut conn, "scores").await, 2);
}

#[tokio::test]
async fn test_rebuild_refuses_tables_it_cannot_reproduce() {
    let mut conn = connect().await;
    run(
        &mut conn,
        &[
            "CREATE TABLE computed (a INTEGER, b INTEGER, c INTEGER GENERATED ALWAYS AS (a + 1))",
            "CREATE TABLE typed (a INTEGER, b TEXT) STRICT",
        ],
    )
    .await;

    for (name, expected) in [
        ("computed", UnsupportedFeature::GeneratedColumn),
        ("typed", UnsupportedFeature::Strict),
    ] {
        let page = root_page(&mut conn, name).await;
        let result = SchemaChanger::with_version(&mut conn, BEFORE_DROP_COLUMN)
            .alter_table(name, |t| {
                t.drop_column("b");
            })
            .await;
        match result {
            Err(SchemaError::Definition(DefinitionError::Unsupported { table, feature })) => {
                assert_eq!(table, name);
                assert_eq!(feature, expected);
            }
            other => panic!("Expected an unsupported table error, got {other:?}"),
        }
        assert_eq!(root_page(&mut conn, name).await, page);
    }
}

#[tokio::test]
async fn test_alter_table_uses_stored_name() {
    let mut conn = connect().await;
    run(
        &mut conn,
        &[
            "CREATE TABLE users (id INTEGER PRIMARY KEY AUTOINCREMENT, email TEXT, age INTEGER)",
            "INSERT INTO users (email, age) VALUES ('ada@example.com', 36)",
        ],
    )
    .await;

    SchemaChanger::with_version(&mut conn, BEFORE_DROP_COLUMN)
        .alter_table("USERS", |t| {
            t.drop_column("age");
        })
        .await
        .unwrap();

    let after = table(&mut conn, "users").await;
    assert_eq!(after.name, "users");
    assert_eq!(column_names(&after), vec!["id", "email"]);
    assert_eq!(
        after.column("id").and_then(|c| c.primary_key),
        Some(PrimaryKey::auto_increment())
    );
    let names: Vec<String> = sqlx::query_scalar("SELECT name FROM sqlite_master WHERE type = 'table'")
        .fetch_all(&mut conn)
        .await
        .unwrap();
    assert!(names.contains(&"users".to_string()));
    assert!(!names.contains(&"USERS".to_string()));
}
