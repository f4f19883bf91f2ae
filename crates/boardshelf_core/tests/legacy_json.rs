use boardshelf_core::{
    open_shelf_db, BoardListItem, BoardRepository, CanvasSnapshot, ShelfPaths,
    SqliteBoardRepository,
};
use serde_json::json;

fn write_json(path: &std::path::Path, value: serde_json::Value) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, value.to_string()).unwrap();
}

fn legacy_board(id: &str, name: &str) -> serde_json::Value {
    json!({
        "id": id,
        "name": name,
        "created_at": "2024-01-01T00:00:00Z",
        "updated_at": "2024-01-02T00:00:00Z",
    })
}

#[test]
fn folder_index_is_migrated_once_with_order_and_active_board() {
    let dir = tempfile::tempdir().unwrap();
    let paths = ShelfPaths::new(dir.path());
    write_json(
        &paths.legacy_index_path(),
        json!({
            "items": [
                {"type": "board", "id": "b1", "name": "One",
                 "created_at": "2024-01-01T00:00:00Z", "updated_at": "2024-01-01T00:00:00Z"},
                {"type": "folder", "id": "f1", "name": "Group", "items": [
                    legacy_board("b2", "Two"),
                    legacy_board("b3", "Three"),
                ]},
            ],
            "active_board_id": "b3",
        }),
    );
    write_json(
        &paths.legacy_board_data_path("b2"),
        json!({"elements": [{"id": "e1"}], "appState": {}, "files": {}}),
    );

    let conn = open_shelf_db(&paths).unwrap();
    let repo = SqliteBoardRepository::try_new(&conn).unwrap();
    let index = repo.get_index().unwrap();

    assert_eq!(index.active_board_id.as_deref(), Some("b3"));
    assert_eq!(index.items.len(), 2);
    match &index.items[1] {
        BoardListItem::Folder(folder) => {
            assert_eq!(folder.id, "f1");
            let inner = folder.items.iter().map(|b| b.id.as_str()).collect::<Vec<_>>();
            assert_eq!(inner, vec!["b2", "b3"]);
        }
        other => panic!("expected folder, got {other:?}"),
    }
    assert_eq!(
        repo.load_snapshot("b2").unwrap(),
        Some(CanvasSnapshot::from_value(
            json!({"elements": [{"id": "e1"}], "appState": {}, "files": {}})
        ))
    );
    assert_eq!(
        repo.load_snapshot("b1").unwrap(),
        Some(CanvasSnapshot::empty())
    );

    repo.delete_board("b1").unwrap();
    drop(conn);

    let reopened = open_shelf_db(&paths).unwrap();
    let repo = SqliteBoardRepository::try_new(&reopened).unwrap();
    assert!(repo.get_board("b1").unwrap().is_none());
    assert!(paths.legacy_index_path().exists());
}

#[test]
fn flat_board_list_is_migrated_and_duplicates_collapse() {
    let dir = tempfile::tempdir().unwrap();
    let paths = ShelfPaths::new(dir.path());
    write_json(
        &paths.legacy_index_path(),
        json!({
            "boards": [
                legacy_board("a", "Alpha"),
                legacy_board("b", "Beta"),
                legacy_board("a", "Alpha again"),
            ],
            "active_board_id": "gone",
        }),
    );
    std::fs::write(paths.legacy_board_data_path("a"), "{not json").unwrap();

    let conn = open_shelf_db(&paths).unwrap();
    let repo = SqliteBoardRepository::try_new(&conn).unwrap();
    let index = repo.get_index().unwrap();

    let ids = index.items.iter().map(|item| item.id()).collect::<Vec<_>>();
    assert_eq!(ids, vec!["a", "b"]);
    assert_eq!(index.active_board_id.as_deref(), Some("a"));
    assert_eq!(
        repo.load_snapshot("a").unwrap(),
        Some(CanvasSnapshot::empty())
    );
}

#[test]
fn fresh_directory_without_legacy_files_starts_empty() {
    let dir = tempfile::tempdir().unwrap();
    let paths = ShelfPaths::new(dir.path());

    let conn = open_shelf_db(&paths).unwrap();
    let repo = SqliteBoardRepository::try_new(&conn).unwrap();

    assert!(paths.db_path().exists());
    let index = repo.get_index().unwrap();
    assert!(index.items.is_empty());
    assert_eq!(index.active_board_id, None);
}
