//! Builds bookmark list queries from the active filter selections.
//!
//! A non-empty search text takes exclusive precedence and routes the request to
//! full-text search; structured filters are ignored. Otherwise each active
//! filter contributes one clause and clauses are joined with `&&`.

use crate::types::collection::Collection;
use crate::types::query::{BookmarkFilters, BookmarkQuery, Clause, FilterExpression, QueryKey};

/// Relations expanded on every bookmark list.
pub const BOOKMARK_EXPAND: [&str; 2] = ["category", "tags"];

pub fn build_query(filters: &BookmarkFilters) -> BookmarkQuery {
    if filters.is_searching() {
        return BookmarkQuery::Search(filters.search.trim().to_string());
    }

    let expr = FilterExpression::new()
        .and(Clause::AnyOf {
            relation: "category".to_string(),
            ids: dedup(&filters.categories),
        })
        .and(Clause::AnyOf {
            relation: "tags".to_string(),
            ids: dedup(&filters.tags),
        });

    let expr = if filters.starred {
        expr.and(Clause::IsTrue("starred".to_string()))
    } else {
        expr
    };
    let expr = if filters.open_source {
        expr.and(Clause::IsTrue("open_source".to_string()))
    } else {
        expr
    };

    BookmarkQuery::Filter(expr)
}

/// Cache key for a bookmark list. Selections are sets, so ids are sorted.
pub fn bookmark_key(filters: &BookmarkFilters) -> QueryKey {
    let key = QueryKey::new(Collection::Bookmarks);
    match build_query(filters) {
        BookmarkQuery::Search(text) => key.param("search", text),
        BookmarkQuery::Filter(_) => {
            let mut categories = dedup(&filters.categories);
            categories.sort();
            let mut tags = dedup(&filters.tags);
            tags.sort();
            key.param("categories", categories.join(","))
                .param("tags", tags.join(","))
                .param("starred", filters.starred.to_string())
                .param("open_source", filters.open_source.to_string())
        }
    }
}

fn dedup(ids: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(ids.len());
    for id in ids {
        let id = id.trim();
        if !id.is_empty() && !out.iter().any(|o| o == id) {
            out.push(id.to_string());
        }
    }
    out
}
