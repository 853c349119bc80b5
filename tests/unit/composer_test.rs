//! Unit tests for the BookmarkComposer.
//!
//! Drives whole submissions through the app wiring: label reconciliation,
//! bookmark creation, group attachment, cache invalidation and form reset.

#[path = "../common/mod.rs"]
mod common;

use std::sync::Arc;

use serde_json::{json, Value};
use tempfile::TempDir;

use common::{app_with, seed_library, ScriptedStore, USER};
use linkshelf::app::App;
use linkshelf::managers::group_manager::GroupManager;
use linkshelf::services::settings_engine::SettingsEngine;
use linkshelf::types::collection::Collection;
use linkshelf::types::errors::{ComposeError, FormError};
use linkshelf::types::form::{BookmarkForm, WireBookmarkForm};
use linkshelf::types::label::LabelEntry;
use linkshelf::types::query::BookmarkFilters;

struct Fixture {
    store: Arc<ScriptedStore>,
    app: App,
    _dir: TempDir,
}

fn setup() -> Fixture {
    let dir = TempDir::new().expect("temp dir");
    let store = ScriptedStore::new();
    seed_library(&store);
    let app = app_with(store.clone(), &dir);
    Fixture {
        store,
        app,
        _dir: dir,
    }
}

fn wire_form(value: Value) -> BookmarkForm {
    let wire: WireBookmarkForm = serde_json::from_value(value).expect("wire form");
    BookmarkForm::from(wire)
}

fn id_of(record: &Value) -> String {
    record["id"].as_str().unwrap_or_default().to_string()
}

/// The documented end-to-end flow: one novel tag, no category, one group.
#[tokio::test]
async fn test_submit_creates_tag_bookmark_and_membership() {
    let fx = setup();
    let all = BookmarkFilters::default();
    fx.app.bookmarks.list(&all).await.unwrap();
    fx.app.groups.list().await.unwrap();
    fx.store.clear_calls();

    let mut form = wire_form(json!({
        "url": "example.com",
        "tags": [{"id": "temp-1", "text": "news"}],
        "category": "",
        "groups": ["g1"]
    }));
    let bookmark = fx.app.composer.submit(&mut form).await.unwrap();

    let tag_creates = fx.store.creates(Collection::Tags);
    assert_eq!(tag_creates, vec![json!({"tag": "news", "user": USER})]);
    let news = fx
        .store
        .records(Collection::Tags)
        .into_iter()
        .find(|t| t["tag"] == "news")
        .expect("tag stored");

    let bookmark_creates = fx.store.creates(Collection::Bookmarks);
    assert_eq!(bookmark_creates.len(), 1);
    assert_eq!(bookmark_creates[0]["url"], "example.com");
    assert_eq!(bookmark_creates[0]["category"], "");
    assert_eq!(bookmark_creates[0]["tags"], json!([id_of(&news)]));
    assert_eq!(bookmark_creates[0]["user"], USER);
    assert_eq!(bookmark.tags, vec![id_of(&news)]);

    let group_updates = fx.store.updates(Collection::Groups);
    assert_eq!(group_updates.len(), 1);
    assert_eq!(group_updates[0].0, "g1");
    assert_eq!(group_updates[0].1["bookmarks"], json!(["b1", "b3", bookmark.id]));

    assert!(!fx.app.cache.contains(&linkshelf::services::query_builder::bookmark_key(&all)));
    assert!(!fx.app.cache.contains(&GroupManager::key()));
    assert!(form.is_default());

    let notices = fx.app.drain_notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].title, "Bookmark added");
}

/// Labels that already exist are reused whatever their casing.
#[tokio::test]
async fn test_submit_reuses_existing_labels() {
    let fx = setup();
    let mut form = BookmarkForm {
        url: "https://crates.io/".to_string(),
        category: Some(LabelEntry::pending("development")),
        tags: vec![LabelEntry::pending("RUST"), LabelEntry::resolved("t2", "web")],
        ..Default::default()
    };
    let bookmark = fx.app.composer.submit(&mut form).await.unwrap();

    assert!(fx.store.creates(Collection::Tags).is_empty());
    assert!(fx.store.creates(Collection::Categories).is_empty());
    assert_eq!(bookmark.url, "crates.io");
    assert_eq!(bookmark.category.as_deref(), Some("c1"));
    assert_eq!(bookmark.tags, vec!["t1", "t2"]);
}

/// A typed category that does not exist yet is created as a custom category.
#[tokio::test]
async fn test_submit_creates_custom_category() {
    let fx = setup();
    let mut form = BookmarkForm {
        url: "example.org".to_string(),
        category: Some(LabelEntry::pending("Reading")),
        ..Default::default()
    };
    let bookmark = fx.app.composer.submit(&mut form).await.unwrap();

    let creates = fx.store.creates(Collection::Categories);
    assert_eq!(creates, vec![json!({"category": "Reading", "custom": true, "user": USER})]);
    assert!(bookmark.category.is_some());
    assert_ne!(bookmark.category.as_deref(), Some("c1"));
}

/// Only pending labels cause the label lists to be fetched.
#[tokio::test]
async fn test_resolved_labels_skip_label_fetches() {
    let fx = setup();
    let mut form = BookmarkForm {
        url: "example.org".to_string(),
        category: Some(LabelEntry::resolved("c2", "News")),
        tags: vec![LabelEntry::resolved("t1", "rust")],
        ..Default::default()
    };
    fx.app.composer.submit(&mut form).await.unwrap();

    assert_eq!(fx.store.lists(Collection::Tags), 0);
    assert_eq!(fx.store.lists(Collection::Categories), 0);
}

/// A failed bookmark create aborts the flow but keeps labels created on the way.
#[tokio::test]
async fn test_failed_create_keeps_new_labels_and_form() {
    let fx = setup();
    fx.store
        .fail_create_where(Collection::Bookmarks, "url", json!("example.com"));

    let mut form = BookmarkForm {
        url: "example.com".to_string(),
        tags: vec![LabelEntry::pending("news")],
        groups: vec!["g1".to_string()],
        ..Default::default()
    };
    let err = fx.app.composer.submit(&mut form).await.unwrap_err();

    assert!(matches!(err, ComposeError::Store(_)));
    assert!(fx
        .store
        .records(Collection::Tags)
        .iter()
        .any(|t| t["tag"] == "news"));
    assert!(fx.store.updates(Collection::Groups).is_empty());
    assert_eq!(form.url, "example.com");

    let errors = fx.app.notices.errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].title, "Failed to create bookmark");
}

/// A failed tag create drops that tag and the bookmark is still created.
#[tokio::test]
async fn test_failed_tag_create_drops_only_that_tag() {
    let fx = setup();
    fx.store.fail_create_where(Collection::Tags, "tag", json!("broken"));

    let mut form = BookmarkForm {
        url: "example.com".to_string(),
        tags: vec![LabelEntry::pending("broken"), LabelEntry::pending("rust")],
        ..Default::default()
    };
    let bookmark = fx.app.composer.submit(&mut form).await.unwrap();

    assert_eq!(bookmark.tags, vec!["t1"]);
    let titles: Vec<String> = fx.app.drain_notices().into_iter().map(|n| n.title).collect();
    assert_eq!(titles, vec!["Failed to create tag \"broken\"", "Bookmark added"]);
}

/// A group that cannot be updated is reported and does not undo the create.
#[tokio::test]
async fn test_group_failure_is_not_fatal() {
    let fx = setup();
    fx.store.seed(
        Collection::Groups,
        vec![json!({"id": "g2", "title": "Later", "pinned": false, "bookmarks": [], "user": USER})],
    );
    fx.store.fail_update_of(Collection::Groups, "g1");

    let mut form = BookmarkForm {
        url: "example.com".to_string(),
        groups: vec!["g1".to_string(), "g2".to_string(), "g1".to_string()],
        ..Default::default()
    };
    let bookmark = fx.app.composer.submit(&mut form).await.unwrap();

    let updates = fx.store.updates(Collection::Groups);
    assert_eq!(updates.len(), 2);
    assert_eq!(updates[1], ("g2".to_string(), json!({"bookmarks": [bookmark.id]})));
    let errors = fx.app.notices.errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].title, "Failed to add bookmark to group g1");
    assert!(form.is_default());
}

#[tokio::test]
async fn test_invalid_url_is_rejected_before_any_write() {
    let fx = setup();
    let mut form = BookmarkForm {
        url: "ftp://files.example.com".to_string(),
        tags: vec![LabelEntry::pending("news")],
        ..Default::default()
    };
    let err = fx.app.composer.submit(&mut form).await.unwrap_err();

    assert_eq!(
        err,
        ComposeError::InvalidForm(FormError::UnsupportedScheme("ftp".to_string()))
    );
    assert!(fx.store.calls().is_empty());
    assert_eq!(fx.app.notices.errors()[0].title, "Invalid bookmark");
}

#[tokio::test]
async fn test_missing_owner_is_rejected() {
    let dir = TempDir::new().unwrap();
    let store = ScriptedStore::new();
    let path = dir.path().join("settings.json").to_string_lossy().to_string();
    let app = App::new(store.clone(), SettingsEngine::new(Some(path)));

    let mut form = BookmarkForm {
        url: "example.com".to_string(),
        ..Default::default()
    };
    let err = app.composer.submit(&mut form).await.unwrap_err();
    assert_eq!(err, ComposeError::MissingOwner);
    assert!(store.calls().is_empty());
}

/// Editing goes through the same label policy; group selections are ignored.
#[tokio::test]
async fn test_save_edit_round_trip() {
    let fx = setup();
    let mut form = fx.app.composer.edit_form("b1").await.unwrap();
    assert_eq!(form.url, "rust-lang.org");
    assert_eq!(form.category, Some(LabelEntry::resolved("c1", "Development")));
    assert_eq!(form.tags, vec![LabelEntry::resolved("t1", "rust")]);

    form.description = "  Home of Rust  ".to_string();
    form.tags.push(LabelEntry::pending("lang"));
    form.category = None;
    form.groups = vec!["g1".to_string()];
    fx.store.clear_calls();

    let saved = fx.app.composer.save_edit("b1", &form).await.unwrap();

    assert_eq!(saved.description, "Home of Rust");
    assert_eq!(saved.category, None);
    assert_eq!(saved.tags.len(), 2);
    assert_eq!(saved.tags[0], "t1");
    assert_eq!(fx.store.creates(Collection::Tags).len(), 1);
    assert!(fx.store.updates(Collection::Groups).is_empty());
    assert_eq!(fx.app.drain_notices()[0].title, "Bookmark updated");
}

#[tokio::test]
async fn test_save_edit_of_missing_bookmark_reports_failure() {
    let fx = setup();
    let form = BookmarkForm {
        url: "example.com".to_string(),
        ..Default::default()
    };
    let err = fx.app.composer.save_edit("nope", &form).await.unwrap_err();
    assert!(matches!(err, ComposeError::Store(_)));
    assert_eq!(fx.app.notices.errors()[0].title, "Failed to update bookmark");
}
