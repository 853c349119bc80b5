//! Label reconciliation for tags and categories.
//!
//! Turns the labels a user typed into record ids: a pending label reuses an
//! existing record whose label matches case-insensitively, otherwise one
//! record is created for it. A failed create drops only that label; the rest
//! of the batch still resolves. Creates are issued one at a time so each
//! failure is attributed to its own label.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use log::{debug, warn};

use crate::services::notifier::{report_failure, Notifier};
use crate::types::errors::StoreError;
use crate::types::label::{label_key, LabelEntry, ResolvedLabel};
use crate::types::taxonomy::LabeledRecord;

/// Which kind of label is being reconciled; only affects messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelKind {
    Tag,
    Category,
}

impl fmt::Display for LabelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LabelKind::Tag => f.write_str("tag"),
            LabelKind::Category => f.write_str("category"),
        }
    }
}

/// A label whose record could not be created.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelFailure {
    pub text: String,
    pub error: StoreError,
}

/// Outcome of one reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reconciliation {
    /// Resolved labels, in input order, without duplicates.
    pub labels: Vec<ResolvedLabel>,
    /// Labels for which a record was created during this pass.
    pub created: Vec<ResolvedLabel>,
    pub failures: Vec<LabelFailure>,
}

impl Reconciliation {
    pub fn ids(&self) -> Vec<String> {
        self.labels.iter().map(|l| l.id.clone()).collect()
    }

    pub fn first_id(&self) -> Option<String> {
        self.labels.first().map(|l| l.id.clone())
    }

    /// Adds a resolved label. A label whose id is already present is ignored;
    /// one whose non-blank text matches an earlier label replaces it.
    fn push(&mut self, label: ResolvedLabel) {
        if self.labels.iter().any(|l| l.id == label.id) {
            return;
        }
        let key = label_key(&label.text);
        if key.is_empty() {
            self.labels.push(label);
            return;
        }
        match self.labels.iter().position(|l| label_key(&l.text) == key) {
            Some(index) => self.labels[index] = label,
            None => self.labels.push(label),
        }
    }
}

pub struct Reconciler {
    notifier: Arc<dyn Notifier>,
}

impl Reconciler {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self { notifier }
    }

    /// Resolves `entries` against `existing`, calling `create` once per novel
    /// label. Resolved entries without a real record id are handled as pending. Never fails as a whole: create errors are reported and recorded
    /// in `Reconciliation::failures`.
    pub async fn reconcile<R, F, Fut>(
        &self,
        kind: LabelKind,
        entries: Vec<LabelEntry>,
        existing: &[R],
        mut create: F,
    ) -> Reconciliation
    where
        R: LabeledRecord,
        F: FnMut(String) -> Fut,
        Fut: Future<Output = Result<R, StoreError>>,
    {
        let entries: Vec<LabelEntry> = entries.into_iter().map(LabelEntry::checked).collect();
        let mut known: HashMap<String, ResolvedLabel> = HashMap::new();
        for record in existing {
            known
                .entry(label_key(record.label()))
                .or_insert_with(|| ResolvedLabel {
                    id: record.id().to_string(),
                    text: record.label().to_string(),
                });
        }
        for entry in &entries {
            if let LabelEntry::Resolved { id, text } = entry {
                known.entry(label_key(text)).or_insert_with(|| ResolvedLabel {
                    id: id.clone(),
                    text: text.clone(),
                });
            }
        }

        let mut outcome = Reconciliation::default();
        let mut failed: HashSet<String> = HashSet::new();

        for entry in entries {
            let text = match entry {
                LabelEntry::Resolved { id, text } => {
                    outcome.push(ResolvedLabel { id, text });
                    continue;
                }
                LabelEntry::Pending { text } => text.trim().to_string(),
            };

            if text.is_empty() {
                debug!("skipping blank {} label", kind);
                continue;
            }

            let key = label_key(&text);
            if let Some(found) = known.get(&key) {
                debug!("reusing {} '{}' ({})", kind, found.text, found.id);
                outcome.push(found.clone());
                continue;
            }
            if failed.contains(&key) {
                continue;
            }

            match create(text.clone()).await {
                Ok(record) => {
                    let label = ResolvedLabel {
                        id: record.id().to_string(),
                        text: record.label().to_string(),
                    };
                    debug!("created {} '{}' ({})", kind, label.text, label.id);
                    known.insert(key, label.clone());
                    outcome.created.push(label.clone());
                    outcome.push(label);
                }
                Err(error) => {
                    warn!("dropping {} '{}' after failed create", kind, text);
                    report_failure(
                        self.notifier.as_ref(),
                        &format!("Failed to create {} \"{}\"", kind, text),
                        &error,
                    );
                    failed.insert(key);
                    outcome.failures.push(LabelFailure { text, error });
                }
            }
        }

        outcome
    }

    /// Single-label variant used for the category: at most one create.
    pub async fn reconcile_one<R, F, Fut>(
        &self,
        kind: LabelKind,
        entry: Option<LabelEntry>,
        existing: &[R],
        create: F,
    ) -> Reconciliation
    where
        R: LabeledRecord,
        F: FnMut(String) -> Fut,
        Fut: Future<Output = Result<R, StoreError>>,
    {
        match entry {
            Some(entry) => self.reconcile(kind, vec![entry], existing, create).await,
            None => Reconciliation::default(),
        }
    }
}
