use std::ffi::OsString;
use std::fs;

use pantry_core::storage::Storage;
use pantry_core::{
    DEFAULT_LIST, FileStorage, ListRegistry, ListStore, MemoryStorage, RegistryError, Session,
    SessionOptions,
};
use tempfile::tempdir;

#[test]
fn store_and_registry_roundtrip_preserves_order() {
    let storage = MemoryStorage::new();
    let mut session = Session::open(storage.clone(), SessionOptions::default());

    session.create_list("Groceries").expect("create groceries");
    session.create_list("Hardware").expect("create hardware");
    session.store_mut().add(DEFAULT_LIST, "Bread", None);
    session.store_mut().add("Groceries", " Apples ", Some("fruit"));
    session.store_mut().add("Hardware", "Screws", None);
    session.store_mut().add("Groceries", "Pears", Some("fruit"));
    let first = session.store().items()[0].id.clone();
    session.store_mut().toggle(&first);
    session.store_mut().copy("Groceries", "Hardware");

    let items_before = session.store().items().to_vec();
    let lists_before = session.registry().names().to_vec();
    drop(session);

    let reopened = Session::open(storage, SessionOptions::default());
    assert_eq!(reopened.store().items(), items_before.as_slice());
    assert_eq!(reopened.registry().names(), lists_before.as_slice());
    assert_eq!(reopened.list_ids(), vec!["default", "Groceries", "Hardware"]);
}

#[test]
fn duplicate_list_name_is_reported_and_registry_unchanged() {
    let storage = MemoryStorage::new();
    let mut registry = ListRegistry::open(storage, "savedLists");

    registry.create("Groceries").expect("first create");
    let err = registry.create("Groceries").expect_err("second create");

    assert_eq!(
        err,
        RegistryError::DuplicateName {
            name: "Groceries".to_string()
        }
    );
    assert_eq!(registry.len(), 1);
}

#[test]
fn file_storage_persists_the_documented_format() {
    let temp = tempdir().expect("tempdir");
    let storage = FileStorage::open(temp.path()).expect("open storage");
    let mut store = ListStore::open(storage.clone(), "shoppingList");
    let mut registry = ListRegistry::open(storage, "savedLists");

    registry.create("Party").expect("create");
    store.add("Party", "Balloons", None);
    store.add(DEFAULT_LIST, "Milk", Some("dairy"));

    let items: serde_json::Value = serde_json::from_str(
        &fs::read_to_string(temp.path().join("shoppingList.json")).expect("items file"),
    )
    .expect("items json");
    let balloons = &items[0];
    assert_eq!(balloons["name"], "Balloons");
    assert_eq!(balloons["completed"], false);
    assert_eq!(balloons["listId"], "Party");
    assert!(balloons.get("category").is_none());
    assert_eq!(items[1]["category"], "dairy");

    let lists = fs::read_to_string(temp.path().join("savedLists.json")).expect("lists file");
    assert_eq!(lists, r#"["Party"]"#);
}

#[test]
fn legacy_browser_export_loads() {
    let storage = MemoryStorage::new()
        .with_entry(
            "shoppingList",
            r#"[{"id":"1718000000000","name":"Milk","completed":true,"listId":"default"},
                {"id":"1718000000001","name":"Cake","completed":false,"category":"bakery","listId":"Party"}]"#,
        )
        .with_entry("savedLists", r#"["Party"]"#);

    let session = Session::open(storage.clone(), SessionOptions::default());
    assert_eq!(session.store().items_for("Party")[0].name, "Cake");
    assert_eq!(session.store().summary(DEFAULT_LIST).completed, 1);
    assert!(session.orphaned_list_ids().is_empty());

    assert!(
        storage
            .read("shoppingList")
            .expect("read")
            .expect("present")
            .contains("1718000000000")
    );
}

#[test]
fn cli_commands_update_the_data_directory() {
    let temp = tempdir().expect("tempdir");
    let rc = temp.path().join("pantryrc");
    fs::write(&rc, "color = off\n").expect("write rc");
    let data = temp.path().join("data");

    let run = |args: &[&str]| {
        let mut full: Vec<OsString> = vec![
            "pantry".into(),
            "--pantryrc".into(),
            rc.clone().into_os_string(),
            "--data".into(),
            data.clone().into_os_string(),
        ];
        full.extend(args.iter().map(OsString::from));
        pantry_core::run(full)
    };

    run(&["lists", "create", "Party"]).expect("create list");
    run(&["-l", "Party", "add", "Paper", "plates", "cat:supplies"]).expect("add to party");
    run(&["add", "Milk"]).expect("add to default");
    run(&["toggle", "1"]).expect("toggle milk");
    run(&["clear"]).expect("clear completed");
    run(&["copy", "Party"]).expect("copy default into party");
    assert!(run(&["lists", "create", "Party"]).is_err());
    assert!(run(&["-l", "Nowhere", "add", "Thing"]).is_err());

    let storage = FileStorage::open(&data).expect("open storage");
    let session = Session::open(storage, SessionOptions::default());
    let party = session.store().items_for("Party");
    assert_eq!(party.len(), 1);
    assert_eq!(party[0].name, "Paper plates");
    assert_eq!(party[0].category.as_deref(), Some("supplies"));
    assert!(session.store().items_for(DEFAULT_LIST).is_empty());
    assert_eq!(session.registry().names(), ["Party"]);
}
