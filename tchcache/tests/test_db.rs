use tchcache::db::DB;
use tchcache::MediaItem;
use tempfile::TempDir;

/// Crée une DB temporaire pour les tests
fn create_test_db() -> (TempDir, DB) {
    let temp_dir = tempfile::tempdir().unwrap();
    let db_path = temp_dir.path().join("test.db");
    let db = DB::init(&db_path, "media").unwrap();
    (temp_dir, db)
}

fn item(identity: &str, title: &str) -> MediaItem {
    MediaItem {
        identity: identity.to_string(),
        source_url: format!("https://www.youtube.com/watch?v={identity}"),
        title: title.to_string(),
        duration_secs: 180,
        locator: format!("/tmp/{identity}.webm"),
        thumbnail: Some(format!("https://i.ytimg.com/vi/{identity}/hq.jpg")),
    }
}

#[test]
fn test_db_init() {
    let temp_dir = tempfile::tempdir().unwrap();
    let db_path = temp_dir.path().join("test.db");
    let db = DB::init(&db_path, "media");
    assert!(db.is_ok());
    assert!(db_path.exists());
}

#[test]
fn test_insert_and_get() {
    let (_temp_dir, db) = create_test_db();

    let (entry, inserted) = db.insert_if_absent(&item("abc", "Song")).unwrap();
    assert!(inserted);
    assert_eq!(entry.item, item("abc", "Song"));
    assert_eq!(entry.hits, 0);
    assert!(entry.last_used.is_none());

    let fetched = db.get("abc").unwrap().unwrap();
    assert_eq!(fetched, entry);
}

#[test]
fn test_get_missing() {
    let (_temp_dir, db) = create_test_db();
    assert!(db.get("nope").unwrap().is_none());
}

#[test]
fn test_second_insert_keeps_first() {
    let (_temp_dir, db) = create_test_db();

    db.insert_if_absent(&item("abc", "First")).unwrap();
    let (entry, inserted) = db.insert_if_absent(&item("abc", "Second")).unwrap();

    assert!(!inserted);
    assert_eq!(entry.item.title, "First");
    assert_eq!(db.count().unwrap(), 1);
}

#[test]
fn test_update_hit() {
    let (_temp_dir, db) = create_test_db();
    db.insert_if_absent(&item("abc", "Song")).unwrap();

    assert!(db.update_hit("abc").unwrap());
    assert!(db.update_hit("abc").unwrap());

    let entry = db.get("abc").unwrap().unwrap();
    assert_eq!(entry.hits, 2);
    assert!(entry.last_used.is_some());

    // Identité inconnue : aucune ligne créée
    assert!(!db.update_hit("unknown").unwrap());
    assert_eq!(db.count().unwrap(), 1);
}

#[test]
fn test_get_all_sorted_by_hits() {
    let (_temp_dir, db) = create_test_db();
    db.insert_if_absent(&item("a", "A")).unwrap();
    db.insert_if_absent(&item("b", "B")).unwrap();
    db.update_hit("b").unwrap();

    let all = db.get_all().unwrap();
    let order: Vec<_> = all.iter().map(|e| e.item.identity.as_str()).collect();
    assert_eq!(order, vec!["b", "a"]);
}
