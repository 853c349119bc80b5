use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::collection::Collection;

/// Active filter selections on the bookmarks table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookmarkFilters {
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub starred: bool,
    #[serde(default)]
    pub open_source: bool,
    #[serde(default)]
    pub search: String,
}

impl BookmarkFilters {
    /// True when a free-text search is active and the structured filters are disabled.
    pub fn is_searching(&self) -> bool {
        !self.search.trim().is_empty()
    }

    pub fn has_structured_filters(&self) -> bool {
        !self.categories.is_empty() || !self.tags.is_empty() || self.starred || self.open_source
    }
}

/// One conjunct of a filter expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Clause {
    /// `(field.id ?= 'a' || field.id ?= 'b')`
    AnyOf { relation: String, ids: Vec<String> },
    /// `field = true`
    IsTrue(String),
}

/// A conjunction of clauses in the backend filter grammar.
///
/// An expression with no clauses renders as the empty filter and matches every
/// record the caller may read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterExpression {
    clauses: Vec<Clause>,
}

impl FilterExpression {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a clause; empty membership sets are ignored rather than matching nothing.
    pub fn and(mut self, clause: Clause) -> Self {
        if let Clause::AnyOf { ids, .. } = &clause {
            if ids.is_empty() {
                return self;
            }
        }
        self.clauses.push(clause);
        self
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    pub fn is_unconstrained(&self) -> bool {
        self.clauses.is_empty()
    }
}

/// Quotes a value for the filter grammar.
pub fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Clause::AnyOf { relation, ids } => {
                let tests: Vec<String> = ids
                    .iter()
                    .map(|id| format!("{}.id ?= {}", relation, quote(id)))
                    .collect();
                write!(f, "({})", tests.join(" || "))
            }
            Clause::IsTrue(field) => write!(f, "{} = true", field),
        }
    }
}

impl fmt::Display for FilterExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, clause) in self.clauses.iter().enumerate() {
            if i > 0 {
                f.write_str(" && ")?;
            }
            write!(f, "{}", clause)?;
        }
        Ok(())
    }
}

/// Where a bookmark list request is routed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookmarkQuery {
    /// Structured filter path.
    Filter(FilterExpression),
    /// Separate full-text search path; structured filters are ignored.
    Search(String),
}

/// Identifies one cached list: a collection plus the parameters it was fetched with.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryKey {
    pub collection: Collection,
    pub params: BTreeMap<String, String>,
}

impl QueryKey {
    pub fn new(collection: Collection) -> Self {
        Self {
            collection,
            params: BTreeMap::new(),
        }
    }

    pub fn param(mut self, name: &str, value: impl Into<String>) -> Self {
        self.params.insert(name.to_string(), value.into());
        self
    }

    pub fn starts_with(&self, collection: Collection) -> bool {
        self.collection == collection
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.collection)?;
        for (k, v) in &self.params {
            write!(f, " {}={}", k, v)?;
        }
        Ok(())
    }
}
