use sift_domain::{PageWindow, Product, ResponseGroup, SearchCriteria};
use sift_service::{BoxFuture, Error, ReconciledPage, Reconciler, Result, StoreHydrator};

use super::{DriftingStore, ScriptedIndex, ids};

async fn reconcile(
	index: &ScriptedIndex,
	store: &DriftingStore,
	criteria: &SearchCriteria,
) -> ReconciledPage<Product> {
	Reconciler::<Product>::new(index, store)
		.reconcile(criteria, ResponseGroup::INFO)
		.await
		.expect("Expected reconciliation to succeed.")
}

fn page_ids(page: &ReconciledPage<Product>) -> Vec<&str> {
	page.entities.iter().map(|product| product.id.as_str()).collect()
}

fn limits(index: &ScriptedIndex) -> Vec<u64> {
	index.windows().iter().map(|window| window.limit).collect()
}

#[tokio::test]
async fn widening_adds_exactly_the_shortfall() {
	let index = ScriptedIndex::new(ids(0..30), 30);
	let store = DriftingStore::new(
		ids(0..30).into_iter().filter(|id| !matches!(id.as_str(), "p2" | "p5" | "p7")),
	);
	let criteria = SearchCriteria::products().with_keyword("coat").with_window(0, 10);
	let page = reconcile(&index, &store, &criteria).await;

	assert_eq!(index.windows(), vec![PageWindow::new(0, 10), PageWindow::new(0, 13)]);
	assert_eq!(store.requests()[1], ids(10..13));
	assert_eq!(page.resolved_count, 10);
	assert_eq!(page.attempts, 2);
}

#[tokio::test]
async fn deleted_rows_are_backfilled_from_the_next_index_window() {
	// Limit 10 over 14 index matches; p3 and p8 were deleted from the store.
	let index = ScriptedIndex::new(ids(0..14), 14);
	let store = DriftingStore::new(
		ids(0..14).into_iter().filter(|id| !matches!(id.as_str(), "p3" | "p8")),
	);
	let criteria = SearchCriteria::products().with_keyword("coat").with_window(0, 10);
	let page = reconcile(&index, &store, &criteria).await;

	assert_eq!(limits(&index), vec![10, 12]);
	assert_eq!(store.requests()[1], vec!["p10".to_string(), "p11".to_string()]);
	assert_eq!(
		page_ids(&page),
		vec!["p0", "p1", "p2", "p4", "p5", "p6", "p7", "p9", "p10", "p11"]
	);
	assert_eq!(page.resolved_count, 10);
	assert_eq!(page.index_total_count, 14);
}

#[tokio::test]
async fn persistent_drift_stops_after_four_index_queries() {
	let index = ScriptedIndex::new(ids(0..1_000), 1_000);
	let store = DriftingStore::new(Vec::new());
	let criteria = SearchCriteria::products().with_keyword("coat").with_window(0, 10);
	let page = reconcile(&index, &store, &criteria).await;

	assert_eq!(index.calls(), 4);
	assert_eq!(limits(&index), vec![10, 20, 30, 40]);
	assert!(page.entities.is_empty());
	assert_eq!(page.resolved_count, 0);
	assert_eq!(page.index_total_count, 1_000);
}

#[tokio::test]
async fn widening_stops_once_the_window_covers_every_index_match() {
	let index = ScriptedIndex::new(ids(0..5), 5);
	let store = DriftingStore::new(Vec::new());
	let criteria = SearchCriteria::products().with_keyword("coat").with_window(0, 3);
	let page = reconcile(&index, &store, &criteria).await;

	assert_eq!(index.calls(), 1);
	assert!(page.entities.is_empty());
	assert_eq!(page.index_total_count, 5);
}

#[tokio::test]
async fn widening_respects_the_offset_when_checking_the_total() {
	let index = ScriptedIndex::new(ids(0..20), 20);
	let store =
		DriftingStore::new(ids(0..20).into_iter().filter(|id| id.as_str() != "p12"));
	let criteria = SearchCriteria::products().with_keyword("coat").with_window(10, 5);
	let page = reconcile(&index, &store, &criteria).await;

	assert_eq!(index.windows(), vec![PageWindow::new(10, 5), PageWindow::new(10, 6)]);
	assert_eq!(page_ids(&page), vec!["p10", "p11", "p13", "p14", "p15"]);
}

#[tokio::test]
async fn empty_index_result_is_an_empty_page() {
	let index = ScriptedIndex::new(Vec::new(), 0);
	let store = DriftingStore::new(ids(0..5));
	let criteria = SearchCriteria::products().with_keyword("coat").with_window(0, 10);
	let page = reconcile(&index, &store, &criteria).await;

	assert_eq!(index.calls(), 1);
	assert!(store.requests().is_empty());
	assert!(page.entities.is_empty());
	assert_eq!(page.index_total_count, 0);
}

#[tokio::test]
async fn retry_budget_is_configurable() {
	let index = ScriptedIndex::new(ids(0..100), 100);
	let store = DriftingStore::new(Vec::new());
	let criteria = SearchCriteria::products().with_keyword("coat").with_window(0, 10);
	let page = Reconciler::<Product>::new(&index, &store)
		.with_max_retries(0)
		.reconcile(&criteria, ResponseGroup::INFO)
		.await
		.expect("Expected reconciliation to succeed.");

	assert_eq!(index.calls(), 1);
	assert_eq!(page.attempts, 1);
}

#[tokio::test]
async fn index_failure_propagates_without_retry() {
	let index = ScriptedIndex::failing();
	let store = DriftingStore::new(ids(0..5));
	let criteria = SearchCriteria::products().with_keyword("coat").with_window(0, 10);
	let err = Reconciler::<Product>::new(&index, &store)
		.reconcile(&criteria, ResponseGroup::INFO)
		.await
		.expect_err("Expected the index failure to propagate.");

	assert!(matches!(err, Error::Index { .. }));
	assert_eq!(index.calls(), 1);
	assert!(store.requests().is_empty());
}

struct UnavailableStore;
impl StoreHydrator<Product> for UnavailableStore {
	fn get_by_ids<'a>(
		&'a self,
		_ids: &'a [String],
		_shape: ResponseGroup,
		_scope_hint: Option<&'a str>,
	) -> BoxFuture<'a, Result<Vec<Product>>> {
		Box::pin(async move { Err(Error::Storage { message: "connection refused".to_string() }) })
	}
}

#[tokio::test]
async fn store_failure_propagates() {
	let index = ScriptedIndex::new(ids(0..5), 5);
	let criteria = SearchCriteria::products().with_keyword("coat").with_window(0, 5);
	let err = Reconciler::new(&index, &UnavailableStore)
		.reconcile(&criteria, ResponseGroup::INFO)
		.await
		.expect_err("Expected the store failure to propagate.");

	assert!(matches!(err, Error::Storage { .. }));
	assert_eq!(index.calls(), 1);
}
