//! Property-based tests for the bookmark query builder.
//!
//! Free-text search takes exclusive precedence over structured filters, and
//! structured filters always render as a well-formed conjunction.

use proptest::prelude::*;

use linkshelf::remote::filter;
use linkshelf::services::query_builder::build_query;
use linkshelf::types::query::{BookmarkFilters, BookmarkQuery};

fn arb_ids() -> impl Strategy<Value = Vec<String>> {
    proptest::collection::vec("[a-z0-9]{3,6}", 0..4)
}

fn arb_filters() -> impl Strategy<Value = BookmarkFilters> {
    (arb_ids(), arb_ids(), any::<bool>(), any::<bool>()).prop_map(
        |(categories, tags, starred, open_source)| BookmarkFilters {
            categories,
            tags,
            starred,
            open_source,
            search: String::new(),
        },
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn search_text_suppresses_structured_filters(
        filters in arb_filters(),
        search in "[a-z]{1,10}",
    ) {
        let searching = BookmarkFilters { search: search.clone(), ..filters };
        match build_query(&searching) {
            BookmarkQuery::Search(text) => prop_assert_eq!(text, search),
            BookmarkQuery::Filter(expr) => prop_assert!(false, "expected search, got filter {}", expr),
        }
    }

    #[test]
    fn filter_expression_is_well_formed(filters in arb_filters()) {
        let expr = match build_query(&filters) {
            BookmarkQuery::Filter(expr) => expr,
            BookmarkQuery::Search(text) => return Err(TestCaseError::fail(format!("unexpected search {}", text))),
        };
        let rendered = expr.to_string();

        prop_assert!(!rendered.starts_with(" &&") && !rendered.starts_with("&&"));
        prop_assert!(!rendered.ends_with("&& ") && !rendered.ends_with("&&"));
        prop_assert!(!rendered.contains("&& &&"));
        prop_assert!(filter::parse(&rendered).is_ok(), "unparseable filter: {}", rendered);

        let expected_clauses = usize::from(!filters.categories.is_empty())
            + usize::from(!filters.tags.is_empty())
            + usize::from(filters.starred)
            + usize::from(filters.open_source);
        prop_assert_eq!(expr.clauses().len(), expected_clauses);
        prop_assert_eq!(rendered.is_empty(), expected_clauses == 0);
    }

    // Whitespace-only search is no search at all.
    #[test]
    fn blank_search_keeps_structured_filters(filters in arb_filters(), spaces in " {0,4}") {
        let blank = BookmarkFilters { search: spaces, ..filters };
        let is_filter = matches!(build_query(&blank), BookmarkQuery::Filter(_));
        prop_assert!(is_filter);
    }
}
