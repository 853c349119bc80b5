use std::fmt;

use serde::{Deserialize, Serialize};

/// The record collections the application reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    Bookmarks,
    Categories,
    Tags,
    Groups,
}

impl Collection {
    pub const ALL: [Collection; 4] = [
        Collection::Bookmarks,
        Collection::Categories,
        Collection::Tags,
        Collection::Groups,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Collection::Bookmarks => "bookmarks",
            Collection::Categories => "categories",
            Collection::Tags => "tags",
            Collection::Groups => "groups",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == name)
    }

    /// Target collection of a relation field, used for `expand`.
    pub fn relation_target(self, field: &str) -> Option<Collection> {
        match (self, field) {
            (Collection::Bookmarks, "category") => Some(Collection::Categories),
            (Collection::Bookmarks, "tags") => Some(Collection::Tags),
            (Collection::Groups, "bookmarks") => Some(Collection::Bookmarks),
            _ => None,
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
