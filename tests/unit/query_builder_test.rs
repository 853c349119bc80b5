//! Unit tests for the bookmark query builder.

use rstest::rstest;

use linkshelf::services::query_builder::{bookmark_key, build_query};
use linkshelf::types::query::{BookmarkFilters, BookmarkQuery};

fn ids(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

fn rendered(filters: &BookmarkFilters) -> String {
    match build_query(filters) {
        BookmarkQuery::Filter(expr) => expr.to_string(),
        BookmarkQuery::Search(text) => panic!("expected a filter, got search {:?}", text),
    }
}

#[rstest]
#[case::nothing(&[], &[], false, false, "")]
#[case::starred_only(&[], &[], true, false, "starred = true")]
#[case::open_source_only(&[], &[], false, true, "open_source = true")]
#[case::one_tag(&[], &["t1"], false, false, "(tags.id ?= 't1')")]
#[case::two_categories(&["c1", "c2"], &[], false, false, "(category.id ?= 'c1' || category.id ?= 'c2')")]
#[case::everything(
    &["c1", "c2"],
    &["t1"],
    true,
    true,
    "(category.id ?= 'c1' || category.id ?= 'c2') && (tags.id ?= 't1') && starred = true && open_source = true"
)]
#[case::duplicates_collapse(&["c1", " c1 "], &["t1", "t1"], false, false, "(category.id ?= 'c1') && (tags.id ?= 't1')")]
fn test_filter_rendering(
    #[case] categories: &[&str],
    #[case] tags: &[&str],
    #[case] starred: bool,
    #[case] open_source: bool,
    #[case] expected: &str,
) {
    let filters = BookmarkFilters {
        categories: ids(categories),
        tags: ids(tags),
        starred,
        open_source,
        search: String::new(),
    };
    assert_eq!(rendered(&filters), expected);
}

#[test]
fn test_search_takes_precedence() {
    let filters = BookmarkFilters {
        categories: ids(&["c1"]),
        tags: ids(&["t1"]),
        starred: true,
        open_source: true,
        search: "  rust  ".to_string(),
    };
    assert_eq!(build_query(&filters), BookmarkQuery::Search("rust".to_string()));
}

#[test]
fn test_quotes_in_ids_are_escaped() {
    let filters = BookmarkFilters {
        tags: ids(&["o'brien"]),
        ..Default::default()
    };
    assert_eq!(rendered(&filters), "(tags.id ?= 'o\\'brien')");
}

#[test]
fn test_key_ignores_selection_order() {
    let a = BookmarkFilters {
        tags: ids(&["t2", "t1"]),
        ..Default::default()
    };
    let b = BookmarkFilters {
        tags: ids(&["t1", "t2", "t1"]),
        ..Default::default()
    };
    assert_eq!(bookmark_key(&a), bookmark_key(&b));
}

#[test]
fn test_key_distinguishes_search_from_filters() {
    let searching = BookmarkFilters {
        search: "rust".to_string(),
        ..Default::default()
    };
    let filtering = BookmarkFilters {
        tags: ids(&["rust"]),
        ..Default::default()
    };
    assert_ne!(bookmark_key(&searching), bookmark_key(&filtering));
    assert_eq!(bookmark_key(&searching).params.get("search").map(String::as_str), Some("rust"));
}

#[test]
fn test_search_keys_ignore_structured_filters() {
    let plain = BookmarkFilters {
        search: "docs".to_string(),
        ..Default::default()
    };
    let with_filters = BookmarkFilters {
        starred: true,
        tags: ids(&["t1"]),
        ..plain.clone()
    };
    assert_eq!(bookmark_key(&plain), bookmark_key(&with_filters));
}
