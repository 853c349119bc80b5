use serde::{Deserialize, Serialize};

/// Id prefix older view code uses for tags that have not been saved yet.
pub const PENDING_ID_PREFIX: &str = "temp-";

/// A label the user wants attached to a bookmark.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum LabelEntry {
    /// Typed by the user, not yet backed by a record.
    Pending { text: String },
    /// Backed by an existing record.
    Resolved { id: String, text: String },
}

/// A label after reconciliation. Always carries a real record id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedLabel {
    pub id: String,
    pub text: String,
}

/// The `{id, text}` shape the tag input widget produces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireLabel {
    pub id: String,
    pub text: String,
}

impl LabelEntry {
    pub fn pending(text: impl Into<String>) -> Self {
        LabelEntry::Pending { text: text.into() }
    }

    pub fn resolved(id: impl Into<String>, text: impl Into<String>) -> Self {
        LabelEntry::Resolved {
            id: id.into(),
            text: text.into(),
        }
    }

    /// Converts the widget shape, treating sentinel-prefixed or empty ids as pending.
    pub fn from_wire(label: WireLabel) -> Self {
        LabelEntry::Resolved {
            id: label.id,
            text: label.text,
        }
        .checked()
    }

    /// Demotes a resolved entry that carries no real record id to pending.
    pub fn checked(self) -> Self {
        match self {
            LabelEntry::Resolved { id, text } if !is_record_id(&id) => LabelEntry::Pending { text },
            other => other,
        }
    }

    pub fn text(&self) -> &str {
        match self {
            LabelEntry::Pending { text } | LabelEntry::Resolved { text, .. } => text,
        }
    }

    pub fn is_pending(&self) -> bool {
        match self {
            LabelEntry::Pending { .. } => true,
            LabelEntry::Resolved { id, .. } => !is_record_id(id),
        }
    }
}

impl From<ResolvedLabel> for LabelEntry {
    fn from(label: ResolvedLabel) -> Self {
        LabelEntry::Resolved {
            id: label.id,
            text: label.text,
        }
    }
}

/// Whether `id` can name a stored record: non-blank and not a sentinel.
pub fn is_record_id(id: &str) -> bool {
    !id.trim().is_empty() && !id.starts_with(PENDING_ID_PREFIX)
}

/// Normalized form used for case-insensitive label comparison.
pub fn label_key(text: &str) -> String {
    text.trim().to_lowercase()
}
