//! Unit tests for the label Reconciler.
//!
//! The reconciler resolves typed tag and category labels to record ids:
//! existing labels are reused case-insensitively, novel ones are created once,
//! and a failed create drops only its own label.

use std::cell::RefCell;
use std::sync::Arc;

use rstest::rstest;

use linkshelf::services::notifier::CollectingNotifier;
use linkshelf::services::reconciler::{LabelKind, Reconciler};
use linkshelf::types::errors::StoreError;
use linkshelf::types::label::{LabelEntry, WireLabel, PENDING_ID_PREFIX};
use linkshelf::types::taxonomy::{Category, Tag};

fn tag(id: &str, text: &str) -> Tag {
    Tag {
        id: id.to_string(),
        tag: text.to_string(),
        user: "u1".to_string(),
    }
}

fn category(id: &str, text: &str) -> Category {
    Category {
        id: id.to_string(),
        category: text.to_string(),
        custom: true,
        user: "u1".to_string(),
    }
}

fn setup() -> (Reconciler, Arc<CollectingNotifier>) {
    let notifier = Arc::new(CollectingNotifier::new());
    (Reconciler::new(notifier.clone()), notifier)
}

/// Every pending label that matches an existing tag, whatever its casing or
/// surrounding whitespace, resolves without a create call.
#[rstest]
#[case("rust")]
#[case("RUST")]
#[case("  Rust  ")]
#[tokio::test]
async fn test_existing_label_is_reused(#[case] typed: &str) {
    let (reconciler, notifier) = setup();
    let created = RefCell::new(Vec::<String>::new());

    let outcome = reconciler
        .reconcile(
            LabelKind::Tag,
            vec![LabelEntry::pending(typed)],
            &[tag("t1", "rust"), tag("t2", "web")],
            |text| {
                created.borrow_mut().push(text.clone());
                async move { Ok::<_, StoreError>(tag("new", &text)) }
            },
        )
        .await;

    assert!(created.borrow().is_empty());
    assert_eq!(outcome.ids(), vec!["t1"]);
    assert!(outcome.created.is_empty());
    assert!(notifier.snapshot().is_empty());
}

#[tokio::test]
async fn test_novel_label_is_created_exactly_once() {
    let (reconciler, _notifier) = setup();
    let created = RefCell::new(Vec::<String>::new());

    let outcome = reconciler
        .reconcile(
            LabelKind::Tag,
            vec![LabelEntry::pending("news")],
            &[tag("t1", "rust")],
            |text| {
                created.borrow_mut().push(text.clone());
                async move { Ok::<_, StoreError>(tag("t9", &text)) }
            },
        )
        .await;

    assert_eq!(*created.borrow(), vec!["news".to_string()]);
    assert_eq!(outcome.ids(), vec!["t9"]);
    assert_eq!(outcome.created.len(), 1);
}

#[tokio::test]
async fn test_resolved_entries_pass_through() {
    let (reconciler, _notifier) = setup();
    let outcome = reconciler
        .reconcile(
            LabelKind::Tag,
            vec![LabelEntry::resolved("t2", "web"), LabelEntry::pending("rust")],
            &[tag("t1", "rust")],
            |text| async move { Ok::<_, StoreError>(tag("never", &text)) },
        )
        .await;

    assert_eq!(outcome.ids(), vec!["t2", "t1"]);
}

#[tokio::test]
async fn test_failed_create_drops_only_that_label() {
    let (reconciler, notifier) = setup();
    let entries = vec![
        LabelEntry::pending("alpha"),
        LabelEntry::pending("broken"),
        LabelEntry::pending("gamma"),
    ];

    let outcome = reconciler
        .reconcile(LabelKind::Tag, entries, &Vec::<Tag>::new(), |text| async move {
            if text == "broken" {
                Err(StoreError::Status {
                    status: 400,
                    message: "rejected".to_string(),
                })
            } else {
                Ok(tag(&format!("id-{}", text), &text))
            }
        })
        .await;

    assert_eq!(outcome.ids(), vec!["id-alpha", "id-gamma"]);
    assert_eq!(outcome.failures.len(), 1);
    assert_eq!(outcome.failures[0].text, "broken");

    let errors = notifier.errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].title, "Failed to create tag \"broken\"");
}

#[tokio::test]
async fn test_sentinel_ids_from_the_wire_never_leak() {
    let (reconciler, _notifier) = setup();
    let entries: Vec<LabelEntry> = vec![
        WireLabel {
            id: format!("{}1", PENDING_ID_PREFIX),
            text: "news".to_string(),
        },
        WireLabel {
            id: format!("{}2", PENDING_ID_PREFIX),
            text: "broken".to_string(),
        },
    ]
    .into_iter()
    .map(LabelEntry::from_wire)
    .collect();

    let outcome = reconciler
        .reconcile(LabelKind::Tag, entries, &Vec::<Tag>::new(), |text| async move {
            if text == "broken" {
                Err(StoreError::Network("offline".to_string()))
            } else {
                Ok(tag("t5", &text))
            }
        })
        .await;

    assert_eq!(outcome.ids(), vec!["t5"]);
    assert!(outcome.ids().iter().all(|id| !id.starts_with(PENDING_ID_PREFIX)));
}

/// A resolved entry that still carries a sentinel or blank id is reconciled
/// like a typed label instead of passing its id through.
#[rstest]
#[case("temp-1")]
#[case("")]
#[tokio::test]
async fn test_resolved_entry_without_record_id_is_reconciled(#[case] id: &str) {
    let (reconciler, _notifier) = setup();
    let created = RefCell::new(Vec::<String>::new());

    let outcome = reconciler
        .reconcile(
            LabelKind::Tag,
            vec![LabelEntry::resolved(id, "news"), LabelEntry::resolved("temp-2", "Rust")],
            &[tag("t1", "rust")],
            |text| {
                created.borrow_mut().push(text.clone());
                async move { Ok::<_, StoreError>(tag("t9", &text)) }
            },
        )
        .await;

    assert_eq!(*created.borrow(), vec!["news".to_string()]);
    assert_eq!(outcome.ids(), vec!["t9", "t1"]);
}

#[tokio::test]
async fn test_same_failing_label_is_attempted_once() {
    let (reconciler, notifier) = setup();
    let attempts = RefCell::new(0);

    let outcome = reconciler
        .reconcile(
            LabelKind::Tag,
            vec![LabelEntry::pending("down"), LabelEntry::pending("DOWN")],
            &Vec::<Tag>::new(),
            |_text| {
                *attempts.borrow_mut() += 1;
                async { Err::<Tag, _>(StoreError::Network("offline".to_string())) }
            },
        )
        .await;

    assert_eq!(*attempts.borrow(), 1);
    assert!(outcome.labels.is_empty());
    assert_eq!(notifier.errors().len(), 1);
}

#[tokio::test]
async fn test_category_variant_creates_at_most_once() {
    let (reconciler, notifier) = setup();
    let attempts = RefCell::new(0);

    let outcome = reconciler
        .reconcile_one(
            LabelKind::Category,
            Some(LabelEntry::pending("Reading")),
            &[category("c1", "Development")],
            |text| {
                *attempts.borrow_mut() += 1;
                async move { Ok::<_, StoreError>(category("c7", &text)) }
            },
        )
        .await;

    assert_eq!(*attempts.borrow(), 1);
    assert_eq!(outcome.first_id(), Some("c7".to_string()));
    assert!(notifier.errors().is_empty());
}

#[tokio::test]
async fn test_category_failure_yields_no_category() {
    let (reconciler, notifier) = setup();
    let outcome = reconciler
        .reconcile_one(
            LabelKind::Category,
            Some(LabelEntry::pending("Reading")),
            &Vec::<Category>::new(),
            |_text| async { Err::<Category, _>(StoreError::Network("offline".to_string())) },
        )
        .await;

    assert_eq!(outcome.first_id(), None);
    assert_eq!(notifier.errors()[0].title, "Failed to create category \"Reading\"");
}

#[tokio::test]
async fn test_no_category_means_no_work() {
    let (reconciler, _notifier) = setup();
    let outcome = reconciler
        .reconcile_one(
            LabelKind::Category,
            None,
            &Vec::<Category>::new(),
            |text| async move { Ok::<_, StoreError>(category("c1", &text)) },
        )
        .await;
    assert_eq!(outcome.first_id(), None);
}
