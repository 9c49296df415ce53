

use link_deck::board_utils::board::{normalize_url, Board, LinkDropTarget};
use link_deck::persistence::store::{
    self, KvStore, MemStore, Theme, KEY_CURRENT_PANEL, KEY_LINKS, KEY_PANELS,
};
use uuid::Uuid;

fn new_board() -> Board {
    Board::new()
}

// Two panels, three categories, four links in a known order
fn sample_board() -> Board {
    let mut board = new_board();
    let work = board.add_panel("Work".to_string());
    let home = board.add_panel("Home".to_string());
    let dev = board.add_category("Dev".to_string(), work);
    let docs = board.add_category("Docs".to_string(), work);
    let fun = board.add_category("Fun".to_string(), home);
    board.add_link("Repo".to_string(), None, "https://github.com".to_string(), dev);
    board.add_link(
        "CI".to_string(),
        Some("build status".to_string()),
        "https://ci.example.com".to_string(),
        dev,
    );
    board.add_link("Wiki".to_string(), None, "https://wiki.example.com".to_string(), docs);
    board.add_link("Videos".to_string(), None, "https://youtube.com".to_string(), fun);
    board.set_current_panel(work);
    board
}

fn link_names(board: &Board) -> Vec<&str> {
    board.links.iter().map(|l| l.name.as_str()).collect()
}

fn category_names(board: &Board) -> Vec<&str> {
    board.categories.iter().map(|c| c.name.as_str()).collect()
}

#[test]
fn roundtrip_preserves_order_content_and_scalars() {
    let board = sample_board();
    let mut kv = MemStore::new();
    store::save_state(&mut kv, &board, Some(Theme::Dark)).expect("save ok");

    let loaded = store::load_state(&kv);
    assert_eq!(loaded.board.panels, board.panels);
    assert_eq!(loaded.board.categories, board.categories);
    assert_eq!(loaded.board.links, board.links);
    assert_eq!(loaded.board.current_panel, board.current_panel);
    assert_eq!(loaded.theme, Some(Theme::Dark));
}

#[test]
fn unset_current_panel_removes_the_key() {
    let mut board = sample_board();
    let mut kv = MemStore::new();
    store::save_state(&mut kv, &board, None).expect("save ok");
    assert!(kv.get(KEY_CURRENT_PANEL).is_some());

    board.current_panel = None;
    store::save_state(&mut kv, &board, None).expect("save ok");
    assert!(kv.get(KEY_CURRENT_PANEL).is_none());
}

#[test]
fn panel_delete_cascades_categories_and_links() {
    let mut board = sample_board();
    let work = board.panels[0].id;
    let home = board.panels[1].id;
    assert!(board.remove_panel(work), "should remove the work panel");

    // No category may still reference the deleted panel, and no link may
    // reference a category that is gone
    assert!(board.categories.iter().all(|c| c.panel_id != Some(work)));
    let remaining: Vec<Uuid> = board.categories.iter().map(|c| c.id).collect();
    assert!(board.links.iter().all(|l| remaining.contains(&l.category_id)));
    assert_eq!(category_names(&board), vec!["Fun"]);
    assert_eq!(link_names(&board), vec!["Videos"]);
    // Deleting the active panel reassigns current to the first remaining
    assert_eq!(board.current_panel, Some(home));
}

#[test]
fn deleting_last_panel_clears_current() {
    let mut board = new_board();
    let only = board.add_panel("Only".to_string());
    board.set_current_panel(only);
    assert!(board.remove_panel(only));
    assert_eq!(board.current_panel, None);
}

#[test]
fn category_delete_cascades_links() {
    let mut board = sample_board();
    let dev = board.categories[0].id;
    assert!(board.remove_category(dev));
    assert!(board.links.iter().all(|l| l.category_id != dev));
    assert_eq!(link_names(&board), vec!["Wiki", "Videos"]);
    // Removing an unknown id is a no-op
    assert!(!board.remove_category(dev));
}

#[test]
fn category_reorder_inserts_before_target() {
    let mut board = sample_board();
    let dev = board.categories[0].id;
    let fun = board.categories[2].id;
    assert!(board.reorder_category(fun, dev));
    assert_eq!(category_names(&board), vec!["Fun", "Dev", "Docs"]);
}

#[test]
fn category_reorder_onto_successor_is_stable() {
    let mut board = sample_board();
    let dev = board.categories[0].id;
    let docs = board.categories[1].id;
    let before: Vec<Uuid> = board.categories.iter().map(|c| c.id).collect();
    // Dragging onto the immediate successor twice must not drift
    board.reorder_category(dev, docs);
    board.reorder_category(dev, docs);
    let after: Vec<Uuid> = board.categories.iter().map(|c| c.id).collect();
    assert_eq!(before, after);
}

#[test]
fn category_self_drop_is_noop() {
    let mut board = sample_board();
    let dev = board.categories[0].id;
    let before = category_names(&board)
        .into_iter()
        .map(String::from)
        .collect::<Vec<_>>();
    assert!(!board.reorder_category(dev, dev));
    assert_eq!(category_names(&board), before);
}

#[test]
fn link_drop_on_link_reparents_and_inserts_before_it() {
    let mut board = sample_board();
    let repo = board.links[0].id; // in Dev
    let wiki = board.links[2].id; // in Docs
    let docs = board.categories[1].id;
    assert!(board.move_link(repo, LinkDropTarget::Link(wiki)));

    let moved = board.get_link(repo).expect("link still present");
    assert_eq!(moved.category_id, docs);
    // Immediately before the target in the flat order
    let repo_idx = board.links.iter().position(|l| l.id == repo).unwrap();
    let wiki_idx = board.links.iter().position(|l| l.id == wiki).unwrap();
    assert_eq!(repo_idx + 1, wiki_idx);
    // The source category's remaining links keep their relative order
    assert_eq!(link_names(&board), vec!["CI", "Repo", "Wiki", "Videos"]);
}

#[test]
fn link_drop_on_successor_twice_is_stable() {
    let mut board = sample_board();
    let repo = board.links[0].id;
    let ci = board.links[1].id;
    let before = link_names(&board)
        .into_iter()
        .map(String::from)
        .collect::<Vec<_>>();
    board.move_link(repo, LinkDropTarget::Link(ci));
    board.move_link(repo, LinkDropTarget::Link(ci));
    assert_eq!(link_names(&board), before);
}

#[test]
fn link_drop_on_category_appends_to_global_end() {
    let mut board = sample_board();
    let repo = board.links[0].id;
    let fun = board.categories[2].id;
    assert!(board.move_link(repo, LinkDropTarget::Category(fun)));

    let moved = board.links.last().expect("links not empty");
    assert_eq!(moved.id, repo);
    assert_eq!(moved.category_id, fun);
    assert_eq!(link_names(&board), vec!["CI", "Wiki", "Videos", "Repo"]);
}

#[test]
fn link_self_drop_is_noop() {
    let mut board = sample_board();
    let repo = board.links[0].id;
    let before = link_names(&board)
        .into_iter()
        .map(String::from)
        .collect::<Vec<_>>();
    assert!(!board.move_link(repo, LinkDropTarget::Link(repo)));
    assert_eq!(link_names(&board), before);
    // Category membership is untouched as well
    assert_eq!(board.links[0].category_id, board.categories[0].id);
}

#[test]
fn link_drop_outside_reverts_order() {
    let mut board = sample_board();
    let wiki = board.links[2].id;
    let before = link_names(&board)
        .into_iter()
        .map(String::from)
        .collect::<Vec<_>>();
    assert!(!board.move_link(wiki, LinkDropTarget::Outside));
    assert_eq!(link_names(&board), before);
}

#[test]
fn link_drop_on_vanished_target_reverts_order() {
    let mut board = sample_board();
    let repo = board.links[0].id;
    let before = link_names(&board)
        .into_iter()
        .map(String::from)
        .collect::<Vec<_>>();
    assert!(!board.move_link(repo, LinkDropTarget::Link(Uuid::now_v7())));
    assert_eq!(link_names(&board), before);
}

#[test]
fn bootstrap_seeds_work_and_personal() {
    let mut board = new_board();
    assert!(board.bootstrap(), "seeding mutates the board");

    assert_eq!(
        board.panels.iter().map(|p| p.name.as_str()).collect::<Vec<_>>(),
        vec!["Work", "Personal"]
    );
    assert_eq!(category_names(&board), vec!["Projects", "Favorites"]);
    let work = board.panels[0].id;
    let personal = board.panels[1].id;
    assert_eq!(board.categories[0].panel_id, Some(work));
    assert_eq!(board.categories[1].panel_id, Some(personal));
    assert_eq!(board.current_panel, Some(work));

    // A second init over seeded data changes nothing
    assert!(!board.bootstrap());
}

#[test]
fn bootstrap_migrates_legacy_categories_into_main() {
    // A pre-panel store: one category without a panel, no panels at all
    let mut kv = MemStore::new();
    kv.set(
        "dashboard_categories",
        r#"[{"id":"0191f6a0-3f59-7000-8000-000000000001","name":"Old Stuff"}]"#,
    )
    .unwrap();

    let loaded = store::load_state(&kv);
    let mut board = loaded.board;
    assert_eq!(board.categories.len(), 1);
    assert_eq!(board.categories[0].panel_id, None);

    assert!(board.bootstrap());
    assert_eq!(board.panels.len(), 1);
    assert_eq!(board.panels[0].name, "Main");
    assert_eq!(board.categories[0].panel_id, Some(board.panels[0].id));
    assert_eq!(board.current_panel, Some(board.panels[0].id));
}

#[test]
fn stale_current_panel_heals_to_first() {
    let mut board = sample_board();
    board.current_panel = Some(Uuid::now_v7());
    assert!(board.heal_current_panel());
    assert_eq!(board.current_panel, Some(board.panels[0].id));

    // With no panels at all the current panel resolves to None
    let mut empty = new_board();
    empty.current_panel = Some(Uuid::now_v7());
    assert!(empty.heal_current_panel());
    assert_eq!(empty.current_panel, None);
}

#[test]
fn stale_current_panel_in_store_heals_on_load() {
    let board = sample_board();
    let mut kv = MemStore::new();
    store::save_collections(&mut kv, &board).unwrap();
    kv.set(KEY_CURRENT_PANEL, &Uuid::now_v7().to_string()).unwrap();

    let mut loaded = store::load_state(&kv).board;
    loaded.bootstrap();
    assert_eq!(loaded.current_panel, Some(board.panels[0].id));
}

#[test]
fn malformed_collections_degrade_to_empty() {
    let mut kv = MemStore::new();
    kv.set(KEY_PANELS, "{ not valid json").unwrap();
    kv.set(KEY_LINKS, "[]").unwrap();
    kv.set(KEY_CURRENT_PANEL, "also-not-a-uuid").unwrap();

    let loaded = store::load_state(&kv);
    assert!(loaded.board.panels.is_empty());
    assert!(loaded.board.links.is_empty());
    assert_eq!(loaded.board.current_panel, None);
    assert_eq!(loaded.theme, None);
}

#[test]
fn stored_layout_uses_camel_case_weak_refs() {
    let board = sample_board();
    let mut kv = MemStore::new();
    store::save_collections(&mut kv, &board).unwrap();

    let cats = kv.get("dashboard_categories").unwrap();
    assert!(cats.contains("\"panelId\""));
    let links = kv.get(KEY_LINKS).unwrap();
    assert!(links.contains("\"categoryId\""));
    // Empty descriptions are omitted, not serialized as null
    assert!(!links.contains("null"));
}

#[test]
fn update_with_unknown_id_is_a_silent_noop() {
    let mut board = sample_board();
    let ghost = Uuid::now_v7();
    assert!(!board.update_panel_name(ghost, "X".to_string()));
    assert!(!board.update_category_name(ghost, "X".to_string()));
    assert!(!board.update_link(ghost, "X".to_string(), None, "https://x".to_string(), ghost));
    assert_eq!(link_names(&board), vec!["Repo", "CI", "Wiki", "Videos"]);
}

#[test]
fn update_link_merges_fields_and_preserves_position() {
    let mut board = sample_board();
    let ci = board.links[1].id;
    let docs = board.categories[1].id;
    assert!(board.update_link(
        ci,
        "Pipeline".to_string(),
        None,
        "https://ci.example.com/v2".to_string(),
        docs,
    ));
    assert_eq!(board.links[1].name, "Pipeline");
    assert_eq!(board.links[1].description, None);
    assert_eq!(board.links[1].category_id, docs);
    // Still in slot 1 of the flat order
    assert_eq!(link_names(&board), vec!["Repo", "Pipeline", "Wiki", "Videos"]);
}

#[test]
fn dependent_counts_back_delete_confirmations() {
    let board = sample_board();
    let work = board.panels[0].id;
    let home = board.panels[1].id;
    assert_eq!(board.panel_dependents(work), (2, 3));
    assert_eq!(board.panel_dependents(home), (1, 1));
    let dev = board.categories[0].id;
    assert_eq!(board.category_dependents(dev), 2);
}

#[test]
fn normalize_url_prefixes_missing_scheme() {
    assert_eq!(normalize_url("example.com"), "https://example.com");
    assert_eq!(normalize_url("  example.com/a?b=1 "), "https://example.com/a?b=1");
    assert_eq!(normalize_url("http://example.com"), "http://example.com");
    assert_eq!(normalize_url("https://example.com"), "https://example.com");
}

#[test]
fn theme_parses_only_known_values() {
    assert_eq!(Theme::parse("light"), Some(Theme::Light));
    assert_eq!(Theme::parse("dark"), Some(Theme::Dark));
    assert_eq!(Theme::parse("solarized"), None);
    assert_eq!(Theme::Dark.toggled(), Theme::Light);
}
