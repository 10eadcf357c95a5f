use insulin_config::persisted::{
    self, KEY_ACTIVE_PROFILE, KEY_LEGACY_DAY, KEY_LEGACY_NIGHT, KEY_PROFILES, KEY_SETTINGS,
};
use insulin_config::{FileStore, MemoryStore, Settings, Units};
use insulin_traits::KvStore;
use std::fs;
use tempfile::tempdir;

#[test]
fn file_store_round_trips_through_disk() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join("state.json");

    let mut store = FileStore::open(&path);
    assert!(store.get(KEY_PROFILES).is_none());
    store.set(KEY_ACTIVE_PROFILE, "abc".to_string()).unwrap();
    assert!(path.exists(), "first write should create parent dirs and file");

    let reopened = FileStore::open(&path);
    assert_eq!(reopened.get(KEY_ACTIVE_PROFILE).as_deref(), Some("abc"));
}

#[test]
fn file_store_discards_corrupt_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("state.json");
    fs::write(&path, "{not json").unwrap();

    let mut store = FileStore::open(&path);
    assert!(store.get(KEY_SETTINGS).is_none());

    // Next write replaces the corrupt file with valid JSON.
    store.set(KEY_SETTINGS, "{}".to_string()).unwrap();
    let text = fs::read_to_string(&path).unwrap();
    assert!(text.contains(KEY_SETTINGS));
}

#[test]
fn failed_write_leaves_store_unchanged() {
    let dir = tempdir().unwrap();
    let seeded = dir.path().join("state.json");
    let mut store = FileStore::open(&seeded);
    store.set(KEY_ACTIVE_PROFILE, "abc".to_string()).unwrap();

    // A regular file where the parent directory should be makes every flush fail.
    let blocker = dir.path().join("blocker");
    fs::write(&blocker, "").unwrap();
    let mut blocked = FileStore::open(blocker.join("state.json"));
    assert!(blocked.set(KEY_SETTINGS, "{}".to_string()).is_err());
    assert!(blocked.get(KEY_SETTINGS).is_none());

    // Same for removal: the key is still readable after a failed flush.
    fs::remove_file(&seeded).unwrap();
    fs::create_dir(&seeded).unwrap();
    assert!(store.remove(KEY_ACTIVE_PROFILE).is_err());
    assert_eq!(store.get(KEY_ACTIVE_PROFILE).as_deref(), Some("abc"));
}

#[test]
fn remove_deletes_key() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("state.json");
    let mut store = FileStore::open(&path);
    store.set(KEY_LEGACY_DAY, "{}".to_string()).unwrap();
    store.remove(KEY_LEGACY_DAY).unwrap();
    assert!(FileStore::open(&path).get(KEY_LEGACY_DAY).is_none());
}

#[test]
fn corrupt_profiles_load_as_empty() {
    let store = MemoryStore::with_entries([(KEY_PROFILES, "[{broken")]);
    assert!(persisted::load_profiles(&store).is_empty());
}

#[test]
fn corrupt_settings_fall_back_to_defaults() {
    let defaults = Settings::default();
    let store = MemoryStore::with_entries([(KEY_SETTINGS, "\"mmol\"")]);
    assert_eq!(persisted::load_settings(&store, &defaults), defaults);

    let store = MemoryStore::with_entries([(KEY_SETTINGS, r#"{"units":"mmol"}"#)]);
    assert_eq!(persisted::load_settings(&store, &defaults).units, Units::Mmol);
}

#[test]
fn null_active_id_counts_as_unset() {
    let store = MemoryStore::with_entries([(KEY_ACTIVE_PROFILE, "null")]);
    assert_eq!(persisted::load_active_id(&store), None);
}

#[test]
fn legacy_presets_only_load_without_profiles() {
    let store = MemoryStore::with_entries([
        (KEY_LEGACY_DAY, r#"{"carbRatio":"12","correctionFactor":"45","target":110}"#),
        (KEY_LEGACY_NIGHT, "garbage"),
    ]);
    let presets = persisted::load_legacy_presets(&store).expect("presets present");
    let day = presets.day.expect("day preset");
    assert_eq!(day.carb_ratio, Some(12.0));
    assert_eq!(day.correction_factor, Some(45.0));
    assert_eq!(day.target, Some(110.0));
    assert_eq!(presets.night, Some(Default::default()));

    let store = MemoryStore::with_entries([(KEY_LEGACY_DAY, "{}"), (KEY_PROFILES, "[]")]);
    assert!(persisted::load_legacy_presets(&store).is_none());

    assert!(persisted::load_legacy_presets(&MemoryStore::new()).is_none());
}

#[test]
fn clear_legacy_presets_removes_both_keys() {
    let mut store = MemoryStore::with_entries([(KEY_LEGACY_DAY, "{}"), (KEY_LEGACY_NIGHT, "{}")]);
    persisted::clear_legacy_presets(&mut store).unwrap();
    assert!(!store.contains_key(KEY_LEGACY_DAY));
    assert!(!store.contains_key(KEY_LEGACY_NIGHT));
}
