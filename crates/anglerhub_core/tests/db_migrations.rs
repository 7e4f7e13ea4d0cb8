use anglerhub_core::db::migrations::latest_version;
use anglerhub_core::db::{open_db, open_db_in_memory, DbError};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "profiles");
    assert_table_exists(&conn, "lakes");
    assert_table_exists(&conn, "catches");
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("profiles.db");

    let conn_first = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_first), latest_version());
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    assert_table_exists(&conn_second, "profiles");
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match err {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn profiles_table_rejects_empty_ids_and_defaults_badges() {
    let conn = open_db_in_memory().unwrap();

    let empty_id = conn.execute(
        "INSERT INTO profiles (id, username, rank) VALUES ('', 'nobody', 'Rookie Silver Fish');",
        [],
    );
    assert!(empty_id.is_err());

    conn.execute(
        "INSERT INTO profiles (id, username, rank) VALUES ('u1', 'angler', 'Rookie Silver Fish');",
        [],
    )
    .unwrap();
    let badges: String = conn
        .query_row("SELECT badges FROM profiles WHERE id = 'u1';", [], |row| {
            row.get(0)
        })
        .unwrap();
    assert_eq!(badges, "[]");
}

#[test]
fn catches_must_reference_an_existing_lake() {
    let conn = open_db_in_memory().unwrap();

    let orphan = conn.execute(
        "INSERT INTO catches (id, angler_id, lake_id, fish_type, weight_kg, image_url)
         VALUES ('c1', 'u1', 'missing', 'Carp', 2.5, 'memory://catches/x.jpg');",
        [],
    );
    assert!(orphan.is_err());

    conn.execute("INSERT INTO lakes (id, name) VALUES ('l1', 'Iskar');", [])
        .unwrap();
    let zero_weight = conn.execute(
        "INSERT INTO catches (id, angler_id, lake_id, fish_type, weight_kg, image_url)
         VALUES ('c1', 'u1', 'l1', 'Carp', 0, 'memory://catches/x.jpg');",
        [],
    );
    assert!(zero_weight.is_err());

    conn.execute(
        "INSERT INTO catches (id, angler_id, lake_id, fish_type, weight_kg, image_url)
         VALUES ('c1', 'u1', 'l1', 'Carp', 2.5, 'memory://catches/x.jpg');",
        [],
    )
    .unwrap();
}

#[test]
fn failed_upgrade_names_the_broken_migration() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("half_upgraded.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch(
        "CREATE TABLE catches (id TEXT PRIMARY KEY);
         PRAGMA user_version = 1;",
    )
    .unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    assert!(matches!(err, DbError::Migration { version: 2, .. }));
    assert!(err.to_string().contains("migration 2"));

    let conn = Connection::open(&path).unwrap();
    assert_eq!(schema_version(&conn), 1);
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}
