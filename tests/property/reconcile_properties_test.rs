//! Property-based tests for label reconciliation.
//!
//! For arbitrary sets of existing and typed labels these check that existing
//! labels are always reused, novel labels are created exactly once, no
//! pending sentinel id survives, and one failing create removes only its label.

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::sync::Arc;

use proptest::prelude::*;

use linkshelf::services::notifier::CollectingNotifier;
use linkshelf::services::reconciler::{LabelKind, Reconciler, Reconciliation};
use linkshelf::types::errors::StoreError;
use linkshelf::types::label::{label_key, LabelEntry, WireLabel, PENDING_ID_PREFIX};
use linkshelf::types::taxonomy::Tag;

fn arb_label() -> impl Strategy<Value = String> {
    "[a-z]{1,8}"
}

/// Randomizes the casing of a label so matches must be case-insensitive.
fn shout(text: &str, upper: bool) -> String {
    if upper {
        text.to_uppercase()
    } else {
        text.to_string()
    }
}

fn run<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("runtime")
        .block_on(future)
}

/// Reconciles `typed` as sentinel-id wire labels against `existing`, with a
/// create that fails for `failing` and records every call.
fn reconcile(typed: &[String], existing: &[Tag], failing: Option<&str>) -> (Reconciliation, Vec<String>) {
    let entries: Vec<LabelEntry> = typed
        .iter()
        .enumerate()
        .map(|(i, text)| {
            LabelEntry::from_wire(WireLabel {
                id: format!("{}{}", PENDING_ID_PREFIX, i),
                text: text.clone(),
            })
        })
        .collect();
    reconcile_entries(entries, existing, failing)
}

fn reconcile_entries(
    entries: Vec<LabelEntry>,
    existing: &[Tag],
    failing: Option<&str>,
) -> (Reconciliation, Vec<String>) {
    let reconciler = Reconciler::new(Arc::new(CollectingNotifier::new()));
    let calls = RefCell::new(Vec::new());

    let outcome = run(reconciler.reconcile(LabelKind::Tag, entries, existing, |text| {
        calls.borrow_mut().push(text.clone());
        let fail = failing.map(|f| label_key(f) == label_key(&text)).unwrap_or(false);
        async move {
            if fail {
                Err(StoreError::Network("offline".to_string()))
            } else {
                Ok(Tag {
                    id: format!("new-{}", label_key(&text)),
                    tag: text,
                    user: "u1".to_string(),
                })
            }
        }
    }));
    (outcome, calls.into_inner())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    // Existing labels are reused and never trigger a create.
    #[test]
    fn existing_labels_are_never_created(
        labels in proptest::collection::btree_set(arb_label(), 1..6),
        upper in any::<bool>(),
    ) {
        let existing: Vec<Tag> = labels
            .iter()
            .enumerate()
            .map(|(i, l)| Tag { id: format!("t{}", i), tag: l.clone(), user: "u1".to_string() })
            .collect();
        let typed: Vec<String> = labels.iter().map(|l| shout(l, upper)).collect();

        let (outcome, calls) = reconcile(&typed, &existing, None);

        prop_assert!(calls.is_empty());
        let expected: Vec<String> = existing.iter().map(|t| t.id.clone()).collect();
        prop_assert_eq!(outcome.ids(), expected);
    }

    // Each novel label is created once, duplicates in the input included.
    #[test]
    fn novel_labels_are_created_exactly_once(
        labels in proptest::collection::vec(arb_label(), 1..8),
    ) {
        let (outcome, calls) = reconcile(&labels, &[], None);

        let distinct: BTreeSet<String> = labels.iter().map(|l| label_key(l)).collect();
        prop_assert_eq!(calls.len(), distinct.len());
        let called: BTreeSet<String> = calls.iter().map(|c| label_key(c)).collect();
        prop_assert_eq!(&called, &distinct);
        prop_assert_eq!(outcome.labels.len(), distinct.len());
    }

    // No output id carries the pending prefix or is blank, even when creates
    // fail or entries arrive marked resolved with a sentinel id.
    #[test]
    fn no_sentinel_ids_in_output(
        labels in proptest::collection::vec((arb_label(), any::<bool>()), 0..8),
        failing in arb_label(),
    ) {
        let entries: Vec<LabelEntry> = labels
            .iter()
            .enumerate()
            .map(|(i, (text, resolved))| {
                if *resolved {
                    LabelEntry::resolved(format!("{}{}", PENDING_ID_PREFIX, i), text.clone())
                } else {
                    LabelEntry::pending(text.clone())
                }
            })
            .collect();
        let (outcome, _calls) = reconcile_entries(entries, &[], Some(&failing));
        for id in outcome.ids() {
            prop_assert!(!id.starts_with(PENDING_ID_PREFIX));
            prop_assert!(!id.is_empty());
        }
    }

    // With N distinct novel labels and exactly one failing, N-1 resolve.
    #[test]
    fn one_failure_drops_one_label(
        labels in proptest::collection::btree_set(arb_label(), 1..8),
        pick in any::<proptest::sample::Index>(),
    ) {
        let typed: Vec<String> = labels.iter().cloned().collect();
        let failing = typed[pick.index(typed.len())].clone();

        let (outcome, _calls) = reconcile(&typed, &[], Some(&failing));

        prop_assert_eq!(outcome.ids().len(), typed.len() - 1);
        prop_assert_eq!(outcome.failures.len(), 1);
        prop_assert_eq!(&outcome.failures[0].text, &failing);
        let failing_id = format!("new-{}", failing);
        prop_assert!(!outcome.ids().contains(&failing_id));
    }
}
