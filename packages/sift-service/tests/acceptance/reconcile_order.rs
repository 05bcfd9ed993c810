use sift_domain::{
	Category, DocumentType, Product, RawFacets, ResponseGroup, SearchCriteria, find_aggregation,
};
use sift_service::{Error, Reconciler};

use super::{DriftingStore, ScriptedIndex, ids};

#[tokio::test]
async fn page_keeps_index_rank_order_when_the_store_reorders_rows() {
	let index = ScriptedIndex::new(ids(0..10), 10);
	let store = DriftingStore::new(ids(0..10));
	let criteria = SearchCriteria::products().with_keyword("coat").with_window(0, 10);
	let page = Reconciler::<Product>::new(&index, &store)
		.reconcile(&criteria, ResponseGroup::INFO)
		.await
		.expect("Expected reconciliation to succeed.");
	let page_ids: Vec<String> = page.entities.iter().map(|product| product.id.clone()).collect();

	assert_eq!(page_ids, ids(0..10));
	assert_eq!(index.calls(), 1);
}

#[tokio::test]
async fn repeated_and_unrequested_ids_never_appear_twice() {
	let ranked = ["p0", "p1", "p0", "p2", "p1", "p3"].map(str::to_string).to_vec();
	let index = ScriptedIndex::new(ranked, 6);
	let mut store = DriftingStore::new(ids(0..4));

	store.extra = vec!["p1".to_string(), "ghost".to_string()];

	let criteria = SearchCriteria::products().with_keyword("coat").with_window(0, 6);
	let page = Reconciler::<Product>::new(&index, &store)
		.reconcile(&criteria, ResponseGroup::INFO)
		.await
		.expect("Expected reconciliation to succeed.");
	let page_ids: Vec<&str> = page.entities.iter().map(|product| product.id.as_str()).collect();

	assert_eq!(page_ids, vec!["p0", "p1", "p2", "p3"]);
	assert_eq!(store.requests()[0], ids(0..4));
	assert_eq!(page.resolved_count, 4);
}

#[tokio::test]
async fn caller_criteria_are_not_mutated_by_widening() {
	let index = ScriptedIndex::new(ids(0..40), 40);
	let store = DriftingStore::new(ids(0..40).into_iter().filter(|id| id.as_str() != "p1"));
	let criteria = SearchCriteria::products().with_keyword("coat").with_window(0, 10);
	let before = criteria.clone();
	let page = Reconciler::<Product>::new(&index, &store)
		.reconcile(&criteria, ResponseGroup::INFO)
		.await
		.expect("Expected reconciliation to succeed.");

	assert_eq!(page.attempts, 2);
	assert_eq!(criteria, before);
	assert_eq!(criteria.window.limit, 10);
}

#[tokio::test]
async fn catalog_scope_reaches_the_store_and_kind_reaches_the_index() {
	let index = ScriptedIndex::new(ids(0..3), 3);
	let store = DriftingStore::new(ids(0..3));
	let criteria = SearchCriteria::categories().with_catalog("goods").with_window(0, 3);
	let page = Reconciler::<Category>::new(&index, &store)
		.reconcile(&criteria, ResponseGroup::CATEGORY_FULL)
		.await
		.expect("Expected reconciliation to succeed.");

	assert_eq!(page.resolved_count, 3);
	assert_eq!(store.scope_hints(), vec![Some("goods".to_string())]);
	assert_eq!(*index.scopes.lock().expect("scopes lock"), vec![DocumentType::Category]);
}

#[tokio::test]
async fn criteria_for_another_kind_are_rejected() {
	let index = ScriptedIndex::new(ids(0..3), 3);
	let store = DriftingStore::new(ids(0..3));
	let err = Reconciler::<Category>::new(&index, &store)
		.reconcile(&SearchCriteria::products(), ResponseGroup::INFO)
		.await
		.expect_err("Expected mismatched criteria to be rejected.");

	assert!(matches!(err, Error::InvalidRequest { .. }));
	assert_eq!(index.calls(), 0);
}

#[tokio::test]
async fn page_carries_formatted_aggregations() {
	let mut index = ScriptedIndex::new(ids(0..3), 3);
	let mut facets = RawFacets::default();

	facets.push("Color", "red", 6);
	facets.push("Color", "gray", 3);
	facets.push("Color", "black", 13);
	facets.push("Brand", "acme", 0);

	index.facets = facets;

	let store = DriftingStore::new(ids(0..3));
	let criteria = SearchCriteria::products().with_keyword("coat").with_window(0, 3);
	let page = Reconciler::<Product>::new(&index, &store)
		.reconcile(&criteria, ResponseGroup::INFO)
		.await
		.expect("Expected reconciliation to succeed.");
	let color = find_aggregation(&page.aggregations, "color").expect("Expected color facet.");

	assert_eq!(page.aggregations.len(), 1);
	assert_eq!(color.items.len(), 3);
	assert_eq!(color.item("black").map(|item| item.count), Some(13));
}
