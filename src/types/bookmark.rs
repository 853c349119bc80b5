use serde::{Deserialize, Deserializer, Serialize};

use super::taxonomy::{Category, Tag};

/// A saved bookmark as stored in the `bookmarks` collection.
///
/// Group membership is not stored here; it is derived from `Group::bookmarks`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Bookmark {
    pub id: String,
    /// Stored without scheme or trailing slashes, see `services::url`.
    pub url: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub starred: bool,
    #[serde(default)]
    pub open_source: bool,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub created: String,
    #[serde(default)]
    pub updated: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expand: Option<BookmarkExpand>,
}

/// Related records returned when a list is fetched with `expand=category,tags`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BookmarkExpand {
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

/// Fields written when a bookmark is created. Ids are already resolved.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BookmarkDraft {
    pub url: String,
    pub description: String,
    /// Serialized as `""` when absent, which clears the relation.
    #[serde(serialize_with = "none_as_empty_string")]
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub starred: bool,
    pub open_source: bool,
    pub user: String,
}

/// Partial update for a bookmark. `None` fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct BookmarkPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// `Some(None)` clears the category.
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "nested_none_as_empty_string"
    )]
    pub category: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub starred: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub open_source: Option<bool>,
}

impl Bookmark {
    /// Tags resolved through `expand`, falling back to nothing when the list
    /// was fetched without expansion.
    pub fn expanded_tags(&self) -> &[Tag] {
        self.expand.as_ref().map(|e| e.tags.as_slice()).unwrap_or(&[])
    }

    pub fn expanded_category(&self) -> Option<&Category> {
        self.expand.as_ref().and_then(|e| e.category.as_ref())
    }
}

/// The backend encodes an empty single relation as `""`.
pub(crate) fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.is_empty()))
}

fn none_as_empty_string<S>(value: &Option<String>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(value.as_deref().unwrap_or(""))
}

fn nested_none_as_empty_string<S>(
    value: &Option<Option<String>>,
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(value.as_ref().and_then(|v| v.as_deref()).unwrap_or(""))
}
