use boardshelf_core::db::migrations::latest_version;
use boardshelf_core::db::{open_db, open_db_in_memory, DbError};
use boardshelf_core::{BoardRepoError, SqliteBoardRepository};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    for table in [
        "boards",
        "folders",
        "index_items",
        "folder_items",
        "board_data",
        "settings",
    ] {
        assert_table_exists(&conn, table);
    }
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("boards.db");

    let conn_first = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_first), latest_version());
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    assert_table_exists(&conn_second, "boards");
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
fn repository_rejects_unmigrated_connection() {
    let conn = Connection::open_in_memory().unwrap();

    let err = SqliteBoardRepository::try_new(&conn).unwrap_err();
    assert!(matches!(
        err,
        BoardRepoError::UninitializedConnection {
            actual_version: 0,
            ..
        }
    ));
}

#[test]
fn deleting_a_board_cascades_to_its_snapshot_row() {
    let conn = open_db_in_memory().unwrap();
    conn.execute(
        "INSERT INTO boards (id, name, created_at, updated_at) VALUES ('b1', 'One', 0, 0);",
        [],
    )
    .unwrap();
    conn.execute(
        "INSERT INTO board_data (board_id, data) VALUES ('b1', '{}');",
        [],
    )
    .unwrap();

    conn.execute("DELETE FROM boards WHERE id = 'b1';", []).unwrap();

    let remaining: i64 = conn
        .query_row("SELECT COUNT(*) FROM board_data;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(remaining, 0);
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
