// Copyright 2025 Eric Jingryd (tidynest@proton.me)
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::collections::BTreeMap;
use std::fs;
use tempfile::TempDir;

use crate::config::{AssetStore, DataAsset, JsonAssetStore, ShortcutBindingsAsset, StoreError};

/// Helper to create an asset with one keyboard binding
fn create_test_asset(id: &str, title: &str, path: &str) -> ShortcutBindingsAsset {
    let keyboard = BTreeMap::from([("Shortcuts/Save".to_string(), path.to_string())]);
    ShortcutBindingsAsset::builder()
        .with_id(id)
        .with_title(title)
        .with_keyboard(keyboard)
        .build()
}

fn open_store() -> (TempDir, JsonAssetStore) {
    let temp_dir = TempDir::new().unwrap();
    let store = JsonAssetStore::new(temp_dir.path().join("shortcuts")).unwrap();
    (temp_dir, store)
}

fn backup_count(store: &JsonAssetStore) -> usize {
    fs::read_dir(store.backup_dir()).unwrap().count()
}

#[test]
fn test_new_creates_store_and_backup_dirs() {
    let (_temp_dir, store) = open_store();

    assert!(store.dir().is_dir());
    assert!(store.backup_dir().is_dir());
    assert_eq!(store.backup_dir(), store.dir().join("backups"));
}

#[test]
fn test_save_then_load_all() {
    let (_temp_dir, mut store) = open_store();
    let asset = create_test_asset("ZZ", "Shortcuts", "leftCtrl+s");

    let path = store.save(&asset).unwrap();
    assert_eq!(path, store.dir().join("Shortcuts.json"));

    let loaded = store.load_all().unwrap();
    assert_eq!(loaded, vec![asset]);
}

#[test]
fn test_overwrite_creates_backup_of_previous_content() {
    let (_temp_dir, mut store) = open_store();

    store.save(&create_test_asset("ZZ", "Shortcuts", "leftCtrl+s")).unwrap();
    assert_eq!(backup_count(&store), 0, "First save has nothing to back up");

    store.save(&create_test_asset("ZZ", "Shortcuts", "leftAlt+s")).unwrap();
    assert_eq!(backup_count(&store), 1);

    let backup = fs::read_dir(store.backup_dir()).unwrap().next().unwrap().unwrap();
    let name = backup.file_name().into_string().unwrap();
    assert!(name.starts_with("Shortcuts.json."), "Backup name was {}", name);

    let content = fs::read_to_string(backup.path()).unwrap();
    assert!(content.contains("leftCtrl+s"), "Backup should hold the old bindings");
}

#[test]
fn test_update_renames_file_on_title_change() {
    let (_temp_dir, mut store) = open_store();
    let mut asset = create_test_asset("A1", "Work", "leftCtrl+s");
    store.save(&asset).unwrap();

    asset.set_title("Gaming");
    store.update(&asset).unwrap();

    assert!(!store.dir().join("Work.json").exists());
    assert!(store.dir().join("Gaming.json").exists());

    let loaded = store.load_all().unwrap();
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].title(), "Gaming");
}

#[test]
fn test_update_without_title_change_keeps_file() {
    let (_temp_dir, mut store) = open_store();
    let asset = create_test_asset("A1", "Work", "leftCtrl+s");
    store.save(&asset).unwrap();

    store.update(&create_test_asset("A1", "Work", "s")).unwrap();

    let loaded = store.load_all().unwrap();
    assert_eq!(loaded[0].keyboard()["Shortcuts/Save"], "s");
}

#[test]
fn test_two_titles_are_saved_to_separate_files() {
    let (_temp_dir, mut store) = open_store();
    let work = create_test_asset("A1", "Work", "leftCtrl+s");
    let gaming = create_test_asset("B2", "Gaming", "space");

    let work_path = store.save(&work).unwrap();
    let gaming_path = store.save(&gaming).unwrap();
    assert_ne!(work_path, gaming_path);

    let loaded = store.load_all().unwrap();
    assert_eq!(loaded.len(), 2);
    assert!(loaded.contains(&work));
    assert!(loaded.contains(&gaming));
}

#[test]
fn test_save_rejects_known_id_under_new_title() {
    let (_temp_dir, mut store) = open_store();
    store.save(&create_test_asset("ZZ", "Shortcuts", "leftCtrl+s")).unwrap();

    match store.save(&create_test_asset("ZZ", "Gaming", "space")).unwrap_err() {
        StoreError::TitleMismatch { id, recorded } => {
            assert_eq!(id, "ZZ");
            assert_eq!(recorded, "Shortcuts");
        }
        other => panic!("Expected TitleMismatch error, got: {:?}", other),
    }

    let content = fs::read_to_string(store.dir().join("Shortcuts.json")).unwrap();
    assert!(content.contains("leftCtrl+s"), "First asset should be untouched");
    assert!(!store.dir().join("Gaming.json").exists());
}

#[test]
fn test_save_rejects_title_held_by_another_id() {
    let (_temp_dir, mut store) = open_store();
    store.save(&create_test_asset("A1", "Work", "leftCtrl+s")).unwrap();

    match store.save(&create_test_asset("B2", "Work", "s")).unwrap_err() {
        StoreError::FileInUse { owner, .. } => assert_eq!(owner, "A1"),
        other => panic!("Expected FileInUse error, got: {:?}", other),
    }
    assert_eq!(backup_count(&store), 0);
}

#[test]
fn test_save_rejects_file_of_another_id_on_disk() {
    let (temp_dir, mut store) = open_store();
    store.save(&create_test_asset("A1", "Work", "leftCtrl+s")).unwrap();

    // A new store has not loaded anything yet
    let mut fresh = JsonAssetStore::new(temp_dir.path().join("shortcuts")).unwrap();
    match fresh.save(&create_test_asset("B2", "Work", "s")).unwrap_err() {
        StoreError::FileInUse { owner, .. } => assert_eq!(owner, "A1"),
        other => panic!("Expected FileInUse error, got: {:?}", other),
    }
}

#[test]
fn test_update_rejects_rename_onto_another_asset() {
    let (_temp_dir, mut store) = open_store();
    store.save(&create_test_asset("A1", "Work", "leftCtrl+s")).unwrap();
    let mut gaming = create_test_asset("B2", "Gaming", "space");
    store.save(&gaming).unwrap();

    gaming.set_title("Work");
    match store.update(&gaming).unwrap_err() {
        StoreError::FileInUse { owner, .. } => assert_eq!(owner, "A1"),
        other => panic!("Expected FileInUse error, got: {:?}", other),
    }
    assert!(store.dir().join("Gaming.json").exists());

    let loaded = store.load_all().unwrap();
    let titles = loaded.iter().map(|a| a.title()).collect::<Vec<_>>();
    assert_eq!(titles, vec!["Gaming", "Work"]);
}

#[test]
fn test_load_all_drops_duplicate_title_and_id() {
    let (_temp_dir, mut store) = open_store();
    let write = |name: &str, asset: &ShortcutBindingsAsset| {
        fs::write(store.dir().join(name), serde_json::to_string(asset).unwrap()).unwrap();
    };

    write("a.json", &create_test_asset("A1", "Work", "leftCtrl+s"));
    write("b.json", &create_test_asset("B2", "Work", "s"));
    write("c.json", &create_test_asset("A1", "Other", "s"));
    write("d.json", &create_test_asset("D4", "Gaming", "space"));

    let loaded = store.load_all().unwrap();
    let titles = loaded.iter().map(|a| a.title()).collect::<Vec<_>>();
    assert_eq!(titles, vec!["Work", "Gaming"]);
}

#[test]
fn test_load_all_ignores_non_json_files() {
    let (_temp_dir, mut store) = open_store();
    fs::write(store.dir().join("notes.txt"), "not an asset").unwrap();

    assert!(store.load_all().unwrap().is_empty());
}

#[test]
fn test_load_all_reports_invalid_json_with_path() {
    let (_temp_dir, mut store) = open_store();
    let broken = store.dir().join("broken.json");
    fs::write(&broken, "{ not json").unwrap();

    match store.load_all().unwrap_err() {
        StoreError::Parse { path, .. } => assert_eq!(path, broken),
        other => panic!("Expected Parse error, got: {:?}", other),
    }
}

#[test]
fn test_delete_removes_file() {
    let (_temp_dir, mut store) = open_store();
    let asset = create_test_asset("ZZ", "Shortcuts", "leftCtrl+s");
    let path = store.save(&asset).unwrap();

    store.delete(&asset).unwrap();

    assert!(!path.exists());
    assert!(store.load_all().unwrap().is_empty());
}

#[test]
fn test_delete_unknown_asset() {
    let (_temp_dir, mut store) = open_store();
    let asset = create_test_asset("XX", "Missing", "s");

    match store.delete(&asset).unwrap_err() {
        StoreError::UnknownAsset(id) => assert_eq!(id, "XX"),
        other => panic!("Expected UnknownAsset error, got: {:?}", other),
    }
}
