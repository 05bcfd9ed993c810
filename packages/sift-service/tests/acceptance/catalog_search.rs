use sift_domain::{ResponseGroup, SearchCriteria};
use sift_service::{Error, SearchStrategy};

use super::{DriftingStore, ScriptedIndex, SpyDirect, harness, ids, product};

#[tokio::test]
async fn keyword_search_reconciles_and_projects_views_in_rank_order() {
	let h = harness(
		ScriptedIndex::new(ids(0..60), 60),
		DriftingStore::new(ids(0..60).into_iter().filter(|id| id.as_str() != "p4")),
		SpyDirect::new(Vec::new()),
	);
	let criteria = SearchCriteria::products().with_keyword("coat").with_window(0, 50);
	let result = h
		.service
		.search_products(&criteria, ResponseGroup::ITEM_LARGE, SearchStrategy::Indexed)
		.await
		.expect("Expected product search to succeed.");
	let expected: Vec<String> =
		ids(0..51).into_iter().filter(|id| id.as_str() != "p4").collect();
	let returned: Vec<String> = result.products.iter().map(|view| view.id.clone()).collect();

	assert_eq!(returned, expected);
	assert_eq!(result.total_count, 60);
	assert_eq!(
		result.products[0].images.as_deref(),
		Some(&["https://cdn.example.com/images/p0.png".to_string()][..])
	);
	assert_eq!(h.index.calls(), 2);
	assert_eq!(h.direct.count(), 0);
}

#[tokio::test]
async fn search_without_keyword_goes_to_the_store() {
	let h = harness(
		ScriptedIndex::new(ids(0..5), 5),
		DriftingStore::new(ids(0..5)),
		SpyDirect::new(vec![product("a"), product("b"), product("c")]),
	);
	let criteria = SearchCriteria::products().with_window(1, 5);
	let result = h
		.service
		.search_products(&criteria, ResponseGroup::INFO, SearchStrategy::Indexed)
		.await
		.expect("Expected product search to succeed.");
	let returned: Vec<&str> = result.products.iter().map(|view| view.id.as_str()).collect();

	assert_eq!(returned, vec!["b", "c"]);
	assert_eq!(result.total_count, 3);
	assert!(result.aggregations.is_empty());
	assert_eq!(h.direct.count(), 1);
	assert_eq!(h.index.calls(), 0);
}

#[tokio::test]
async fn direct_strategy_bypasses_the_index_even_with_a_keyword() {
	let h = harness(
		ScriptedIndex::new(ids(0..5), 5),
		DriftingStore::new(ids(0..5)),
		SpyDirect::new(vec![product("a")]),
	);
	let criteria = SearchCriteria::products().with_keyword("coat").with_window(0, 5);

	h.service
		.search_products(&criteria, ResponseGroup::INFO, SearchStrategy::Direct)
		.await
		.expect("Expected product search to succeed.");

	assert_eq!(h.direct.count(), 1);
	assert_eq!(h.index.calls(), 0);
}

#[tokio::test]
async fn oversized_limit_is_an_invalid_request() {
	let h = harness(
		ScriptedIndex::new(ids(0..5), 5),
		DriftingStore::new(ids(0..5)),
		SpyDirect::new(Vec::new()),
	);
	let criteria = SearchCriteria::products().with_keyword("coat").with_window(0, 101);
	let err = h
		.service
		.search_products(&criteria, ResponseGroup::INFO, SearchStrategy::Indexed)
		.await
		.expect_err("Expected the limit to be rejected.");

	assert!(matches!(err, Error::InvalidRequest { .. }));
	assert_eq!(h.index.calls(), 0);
}

#[tokio::test]
async fn category_browsing_reconciles_categories() {
	let h = harness(
		ScriptedIndex::new(ids(0..8), 8),
		DriftingStore::new(ids(0..8).into_iter().filter(|id| id.as_str() != "p0")),
		SpyDirect::new(Vec::new()),
	);
	let criteria = SearchCriteria::categories().with_catalog("goods").with_window(0, 4);
	let result = h
		.service
		.search_categories(&criteria, ResponseGroup::CATEGORY_FULL)
		.await
		.expect("Expected category search to succeed.");
	let returned: Vec<&str> = result.categories.iter().map(|view| view.id.as_str()).collect();

	assert_eq!(returned, vec!["p1", "p2", "p3", "p4"]);
	assert_eq!(result.total_count, 8);
}

#[tokio::test]
async fn category_browsing_rejects_product_criteria() {
	let h = harness(
		ScriptedIndex::new(ids(0..2), 2),
		DriftingStore::new(ids(0..2)),
		SpyDirect::new(Vec::new()),
	);
	let err = h
		.service
		.search_categories(&SearchCriteria::products(), ResponseGroup::INFO)
		.await
		.expect_err("Expected product criteria to be rejected.");

	assert!(matches!(err, Error::InvalidRequest { .. }));
}

#[test]
fn configured_strategy_is_the_default() {
	let h = harness(ScriptedIndex::new(Vec::new(), 0), DriftingStore::new(Vec::new()), SpyDirect::new(Vec::new()));

	assert_eq!(h.service.default_strategy(), SearchStrategy::Indexed);
}
