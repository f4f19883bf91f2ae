use boardshelf_core::db::open_db_in_memory;
use boardshelf_core::service::transfer::{
    build_candidates, default_selection, export_bundle, import_bundle, parse_bundle, read_bundle,
};
use boardshelf_core::{
    BoardFolder, BoardListItem, BoardRepository, CanvasSnapshot, SqliteBoardRepository,
    TransferError, BUNDLE_FORMAT_VERSION,
};
use serde_json::json;
use std::collections::HashSet;

fn bundle_text(boards: serde_json::Value) -> String {
    json!({
        "version": 1,
        "exported_at": "2024-05-01T10:00:00Z",
        "boards": boards,
    })
    .to_string()
}

fn names(repo: &SqliteBoardRepository<'_>) -> Vec<String> {
    repo.get_index()
        .unwrap()
        .boards()
        .map(|board| board.name.clone())
        .collect()
}

#[test]
fn existing_ids_are_deselected_and_skipped_on_confirm() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteBoardRepository::try_new(&conn).unwrap();
    let existing = repo.create_board("Existing").unwrap();
    let bundle = parse_bundle(&bundle_text(json!([
        {"id": existing.id, "name": "Existing", "data": null},
        {"id": "b2", "name": "Fresh", "data": {"elements": [], "appState": {}, "files": {}}},
    ])))
    .unwrap();

    let existing_ids = HashSet::from([existing.id.clone()]);
    let candidates = build_candidates(&bundle, &existing_ids);
    assert!(candidates[0].duplicate);
    assert!(!candidates[0].selected);
    assert!(candidates[1].selected);
    assert!(candidates[1].has_data);
    let selection = default_selection(&candidates);
    assert_eq!(selection, vec![1]);

    let summary = import_bundle(&repo, &bundle, &selection).unwrap();

    assert_eq!(summary.imported, 1);
    assert_eq!(summary.skipped, 1);
    assert_eq!(names(&repo), vec!["Existing", "Fresh"]);
    assert_eq!(
        repo.get_index().unwrap().active_board_id.as_deref(),
        Some(existing.id.as_str())
    );
}

#[test]
fn repeated_ids_within_bundle_are_flagged_and_keyed_uniquely() {
    let bundle = parse_bundle(&bundle_text(json!([
        {"id": "b1", "name": "One"},
        {"id": "b1", "name": "One again"},
        {"id": "  ", "name": ""},
        {"name": "No id"},
    ])))
    .unwrap();

    let candidates = build_candidates(&bundle, &HashSet::new());

    let keys = candidates
        .iter()
        .map(|candidate| candidate.key.as_str())
        .collect::<Vec<_>>();
    assert_eq!(keys, vec!["b1", "b1-2", "entry-2", "entry-3"]);
    assert!(!candidates[0].duplicate);
    assert!(candidates[1].duplicate);
    assert_eq!(candidates[2].name, "Imported board");
    assert_eq!(default_selection(&candidates), vec![0, 2, 3]);
}

#[test]
fn selected_duplicates_are_imported_as_copies() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteBoardRepository::try_new(&conn).unwrap();
    let existing = repo.create_board("Plan").unwrap();
    repo.create_board("plan (copy)").unwrap();
    let bundle = parse_bundle(&bundle_text(json!([
        {"id": existing.id, "name": "Plan"},
        {"id": existing.id, "name": "Plan"},
    ])))
    .unwrap();

    let summary = import_bundle(&repo, &bundle, &[0, 1]).unwrap();

    assert_eq!(summary.imported, 2);
    assert_eq!(summary.skipped, 0);
    assert_eq!(
        names(&repo),
        vec!["Plan", "plan (copy)", "Plan (Copy 2)", "Plan (Copy 3)"]
    );
}

#[test]
fn missing_or_empty_boards_array_is_rejected() {
    for text in [
        json!({"version": 1}).to_string(),
        json!({"version": 1, "boards": {}}).to_string(),
        json!({"version": 1, "boards": []}).to_string(),
    ] {
        assert!(matches!(
            parse_bundle(&text),
            Err(TransferError::NoBoardsFound)
        ));
    }
    assert!(matches!(
        parse_bundle("not json"),
        Err(TransferError::Json(_))
    ));
}

#[test]
fn newer_bundle_version_is_rejected() {
    let text = json!({"version": 2, "boards": [{"id": "b1", "name": "One"}]}).to_string();

    match parse_bundle(&text) {
        Err(TransferError::UnsupportedBundleVersion { found, supported }) => {
            assert_eq!(found, 2);
            assert_eq!(supported, BUNDLE_FORMAT_VERSION);
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn export_walks_display_order_and_round_trips_through_import() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("boards-export.json");
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteBoardRepository::try_new(&conn).unwrap();
    let a = repo.create_board("A").unwrap();
    let b = repo.create_board("B").unwrap();
    let c = repo.create_board("C").unwrap();
    let drawing = CanvasSnapshot::from_value(json!({
        "elements": [{"id": "e1"}],
        "appState": {"theme": "dark"},
        "files": {}
    }));
    repo.save_snapshot(&b.id, &drawing).unwrap();
    repo.set_index(vec![
        BoardListItem::Board(c.clone()),
        BoardListItem::Folder(BoardFolder {
            id: "f1".to_string(),
            name: "Pair".to_string(),
            items: vec![b.clone(), a.clone()],
        }),
    ])
    .unwrap();

    let written = export_bundle(&repo, &path).unwrap();

    let ids = written
        .boards
        .iter()
        .map(|entry| entry.id.clone())
        .collect::<Vec<_>>();
    assert_eq!(ids, vec![c.id.clone(), b.id.clone(), a.id.clone()]);
    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.contains("\n  \"boards\""));

    let other = open_db_in_memory().unwrap();
    let target = SqliteBoardRepository::try_new(&other).unwrap();
    let bundle = read_bundle(&path).unwrap();
    let candidates = build_candidates(&bundle, &HashSet::new());
    let summary = import_bundle(&target, &bundle, &default_selection(&candidates)).unwrap();

    assert_eq!(summary.imported, 3);
    assert_eq!(names(&target), vec!["C", "B", "A"]);
    let imported_b = target
        .get_index()
        .unwrap()
        .boards()
        .find(|board| board.name == "B")
        .cloned()
        .unwrap();
    assert_ne!(imported_b.id, b.id);
    assert_eq!(target.load_snapshot(&imported_b.id).unwrap(), Some(drawing));
}

#[test]
fn importing_nothing_reports_every_entry_skipped() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteBoardRepository::try_new(&conn).unwrap();
    let bundle = parse_bundle(&bundle_text(json!([
        {"id": "b1", "name": "One"},
        {"id": "b2", "name": "Two"},
    ])))
    .unwrap();

    let summary = import_bundle(&repo, &bundle, &[7]).unwrap();

    assert_eq!(summary.imported, 0);
    assert_eq!(summary.skipped, 2);
    assert!(repo.get_index().unwrap().items.is_empty());
}
