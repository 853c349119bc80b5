use serde::{Deserialize, Deserializer, Serialize};

use super::bookmark::Bookmark;
use super::label::{LabelEntry, WireLabel};
use super::taxonomy::{Category, Tag};

/// The add/edit bookmark form as the view layer submits it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BookmarkForm {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub description: String,
    /// At most one category label.
    #[serde(default)]
    pub category: Option<LabelEntry>,
    #[serde(default)]
    pub tags: Vec<LabelEntry>,
    /// Ids of groups the new bookmark should join.
    #[serde(default)]
    pub groups: Vec<String>,
    #[serde(default)]
    pub starred: bool,
    #[serde(default)]
    pub open_source: bool,
}

/// The loosely shaped form payload older views send: tags as `{id, text}` with
/// sentinel ids and the category as a bare id or empty string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WireBookmarkForm {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "wire_category")]
    pub category: Option<WireLabel>,
    #[serde(default)]
    pub tags: Vec<WireLabel>,
    #[serde(default)]
    pub groups: Vec<String>,
    #[serde(default)]
    pub starred: bool,
    #[serde(default)]
    pub open_source: bool,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WireCategory {
    Id(String),
    Label(WireLabel),
}

/// Accepts `"c1"`, `""`, `null` or `{id, text}` for the category.
fn wire_category<'de, D>(deserializer: D) -> Result<Option<WireLabel>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<WireCategory> = Option::deserialize(deserializer)?;
    Ok(value.map(|c| match c {
        WireCategory::Id(id) => WireLabel {
            id,
            text: String::new(),
        },
        WireCategory::Label(label) => label,
    }))
}

impl From<WireBookmarkForm> for BookmarkForm {
    fn from(wire: WireBookmarkForm) -> Self {
        Self {
            url: wire.url,
            description: wire.description.unwrap_or_default(),
            category: wire
                .category
                .filter(|c| !(c.id.is_empty() && c.text.trim().is_empty()))
                .map(LabelEntry::from_wire),
            tags: wire.tags.into_iter().map(LabelEntry::from_wire).collect(),
            groups: wire.groups,
            starred: wire.starred,
            open_source: wire.open_source,
        }
    }
}

impl BookmarkForm {
    /// Restores the empty default state after a successful submit.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }

    /// Prefills an edit form from a stored bookmark. Tag ids that no longer
    /// resolve to a known tag are dropped.
    pub fn from_bookmark(bookmark: &Bookmark, tags: &[Tag], categories: &[Category]) -> Self {
        let tag_entries = bookmark
            .tags
            .iter()
            .filter_map(|id| tags.iter().find(|t| &t.id == id))
            .map(|t| LabelEntry::resolved(t.id.clone(), t.tag.clone()))
            .collect();

        let category = bookmark.category.as_ref().map(|id| {
            let text = categories
                .iter()
                .find(|c| &c.id == id)
                .map(|c| c.category.clone())
                .unwrap_or_default();
            LabelEntry::resolved(id.clone(), text)
        });

        Self {
            url: bookmark.url.clone(),
            description: bookmark.description.clone(),
            category,
            tags: tag_entries,
            groups: Vec::new(),
            starred: bookmark.starred,
            open_source: bookmark.open_source,
        }
    }
}
