use serde::{Deserialize, Serialize};

/// A record that carries a human-readable label, matched case-insensitively
/// during reconciliation.
pub trait LabeledRecord {
    fn id(&self) -> &str;
    fn label(&self) -> &str;
}

/// A bookmark category. Seeded categories have `custom = false`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Category {
    pub id: String,
    pub category: String,
    #[serde(default)]
    pub custom: bool,
    #[serde(default)]
    pub user: String,
}

/// A free-text tag attached to bookmarks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tag {
    pub id: String,
    pub tag: String,
    #[serde(default)]
    pub user: String,
}

impl LabeledRecord for Category {
    fn id(&self) -> &str {
        &self.id
    }

    fn label(&self) -> &str {
        &self.category
    }
}

impl LabeledRecord for Tag {
    fn id(&self) -> &str {
        &self.id
    }

    fn label(&self) -> &str {
        &self.tag
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CategoryDraft {
    pub category: String,
    pub custom: bool,
    pub user: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TagDraft {
    pub tag: String,
    pub user: String,
}
