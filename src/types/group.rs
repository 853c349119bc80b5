use serde::{Deserialize, Serialize};

use super::bookmark::Bookmark;

/// A named, optionally pinned collection of bookmarks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Group {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub pinned: bool,
    /// Never contains duplicate ids; see `union_members`.
    #[serde(default)]
    pub bookmarks: Vec<String>,
    #[serde(default)]
    pub user: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expand: Option<GroupExpand>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GroupExpand {
    #[serde(default)]
    pub bookmarks: Vec<Bookmark>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GroupDraft {
    pub title: String,
    pub pinned: bool,
    pub bookmarks: Vec<String>,
    pub user: String,
}

/// Partial update for a group. `None` fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct GroupPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pinned: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bookmarks: Option<Vec<String>>,
}

/// Appends `additions` to `current`, keeping first-seen order and dropping
/// duplicates from either side.
pub fn union_members<S: AsRef<str>>(current: &[String], additions: &[S]) -> Vec<String> {
    let mut merged: Vec<String> = Vec::with_capacity(current.len() + additions.len());
    let candidates = current
        .iter()
        .map(String::as_str)
        .chain(additions.iter().map(AsRef::as_ref));
    for id in candidates {
        if !merged.iter().any(|m| m == id) {
            merged.push(id.to_string());
        }
    }
    merged
}

impl Group {
    pub fn contains(&self, bookmark_id: &str) -> bool {
        self.bookmarks.iter().any(|b| b == bookmark_id)
    }
}
