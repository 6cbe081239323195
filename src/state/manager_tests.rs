//! Tests for StateManager

use super::*;
use crate::types::Timestamp;
use chrono::{TimeZone, Utc};
use tempfile::tempdir;

fn ts(day: u32) -> Timestamp {
    Utc.with_ymd_and_hms(2025, 3, day, 12, 0, 0).unwrap()
}

// ============================================================================
// Construction Tests
// ============================================================================

#[test]
fn test_state_manager_new() {
    let manager = StateManager::new("/tmp/test-state.json");
    assert!(!manager.is_in_memory());
    assert_eq!(manager.path().to_str().unwrap(), "/tmp/test-state.json");
}

#[test]
fn test_state_manager_in_memory() {
    let manager = StateManager::in_memory();
    assert!(manager.is_in_memory());
}

#[tokio::test]
async fn test_state_manager_from_json() {
    let manager = StateManager::from_json(
        r#"{"bookmarks": {"bookings": {"ABC": "2025-03-05T12:00:00Z"}}}"#,
    )
    .unwrap();
    assert!(manager.is_in_memory());
    assert_eq!(manager.get_bookmark("bookings", "ABC").await, Some(ts(5)));

    assert!(StateManager::from_json("{ invalid json }").is_err());
}

// ============================================================================
// Bookmark Tests
// ============================================================================

#[tokio::test]
async fn test_get_set_bookmark() {
    let manager = StateManager::in_memory();

    assert!(manager.get_bookmark("bookings", "ABC").await.is_none());

    assert!(manager.set_bookmark("bookings", "ABC", ts(5)).await.unwrap());
    assert_eq!(manager.get_bookmark("bookings", "ABC").await, Some(ts(5)));
}

#[tokio::test]
async fn test_bookmark_never_regresses() {
    let manager = StateManager::in_memory();

    manager.set_bookmark("bookings", "ABC", ts(5)).await.unwrap();
    assert!(!manager.set_bookmark("bookings", "ABC", ts(2)).await.unwrap());

    assert_eq!(manager.get_bookmark("bookings", "ABC").await, Some(ts(5)));
}

#[tokio::test]
async fn test_bookmark_store_trait() {
    let manager = StateManager::in_memory();
    let store: &dyn BookmarkStore = &manager;

    store.set("invoices", "XYZ", ts(9)).await.unwrap();
    store.set("invoices", "XYZ", ts(1)).await.unwrap();

    assert_eq!(store.get("invoices", "XYZ").await, Some(ts(9)));
    assert!(store.get("invoices", "ABC").await.is_none());
}

// ============================================================================
// Persistence Tests
// ============================================================================

#[tokio::test]
async fn test_save_and_load() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("state.json");

    let manager = StateManager::without_auto_save(&path);
    manager.set_bookmark("bookings", "ABC", ts(5)).await.unwrap();
    manager.save().await.unwrap();

    let manager2 = StateManager::new(&path);
    manager2.load().await.unwrap();

    assert_eq!(manager2.get_bookmark("bookings", "ABC").await, Some(ts(5)));
}

#[tokio::test]
async fn test_load_nonexistent_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nonexistent.json");

    let manager = StateManager::new(&path);
    manager.load().await.unwrap();

    assert!(manager.get_bookmark("bookings", "ABC").await.is_none());
}

#[tokio::test]
async fn test_auto_save() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("auto_state.json");

    let manager = StateManager::from_file(&path, true).unwrap();
    manager.set_bookmark("invoices", "ABC", ts(7)).await.unwrap();

    let manager2 = StateManager::from_file(&path, false).unwrap();
    assert_eq!(manager2.get_bookmark("invoices", "ABC").await, Some(ts(7)));
}

#[tokio::test]
async fn test_from_file_without_auto_save_leaves_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("read_only.json");
    tokio::fs::write(&path, r#"{"bookmarks": {}}"#).await.unwrap();

    let manager = StateManager::from_file(&path, false).unwrap();
    manager.set_bookmark("bookings", "ABC", ts(3)).await.unwrap();

    let contents = tokio::fs::read_to_string(&path).await.unwrap();
    assert_eq!(contents, r#"{"bookmarks": {}}"#);
}

#[tokio::test]
async fn test_save_in_memory_noop() {
    let manager = StateManager::in_memory();
    manager.set_bookmark("bookings", "ABC", ts(1)).await.unwrap();
    manager.save().await.unwrap();
}

#[tokio::test]
async fn test_load_invalid_json() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("invalid.json");

    tokio::fs::write(&path, "{ invalid json }").await.unwrap();

    let manager = StateManager::new(&path);
    assert!(manager.load().await.is_err());
    assert!(StateManager::from_file(&path, false).is_err());
}

// ============================================================================
// Snapshot / Clone Tests
// ============================================================================

#[tokio::test]
async fn test_snapshot_and_clone_share_state() {
    let manager = StateManager::in_memory();
    let cloned = manager.clone();

    manager.set_bookmark("bookings", "ABC", ts(4)).await.unwrap();

    assert_eq!(cloned.get_bookmark("bookings", "ABC").await, Some(ts(4)));
    let snapshot = cloned.snapshot().await;
    assert_eq!(snapshot.get_bookmark("bookings", "ABC"), Some(ts(4)));

    let json = manager.to_json().await.unwrap();
    assert!(json.contains("2025-03-04T12:00:00Z"));
    assert_eq!(manager.state().await.bookmarks.len(), 1);
}
