use qdrant_client::Qdrant;

use sift_domain::{ResponseGroup, SearchCriteria};
use sift_service::{SearchStrategy, SiftService};
use sift_storage::db::Db;
use sift_testkit::{IndexDocument, SeedProduct, TestDatabase};

use super::test_config;

#[tokio::test]
#[ignore = "Requires external Postgres and Qdrant. Set SIFT_PG_DSN and SIFT_QDRANT_URL to run."]
async fn stale_index_entries_are_skipped_end_to_end() {
	let (Some(base_dsn), Some(qdrant_url)) =
		(sift_testkit::env_dsn(), sift_testkit::env_qdrant_url())
	else {
		eprintln!(
			"Skipping stale_index_entries_are_skipped_end_to_end; set SIFT_PG_DSN and SIFT_QDRANT_URL."
		);

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let mut cfg = test_config();

	cfg.storage.postgres.dsn = test_db.dsn().to_string();
	cfg.storage.qdrant.url = qdrant_url.clone();
	cfg.storage.qdrant.product_collection = test_db.collection_name("sift_products");
	cfg.storage.qdrant.category_collection = test_db.collection_name("sift_categories");

	let client = Qdrant::from_url(&qdrant_url).build().expect("Failed to build Qdrant client.");
	let collection = cfg.storage.qdrant.product_collection.clone();
	let documents: Vec<IndexDocument> = ["p1", "p2", "p3", "p4"]
		.into_iter()
		.map(|id| {
			IndexDocument::new(id).field("catalog_id", "goods").field("name", format!("Coat {id}"))
		})
		.collect();

	sift_testkit::create_index_collection(&client, &collection, &[])
		.await
		.expect("Failed to create collection.");
	sift_testkit::index_documents(&client, &collection, &documents)
		.await
		.expect("Failed to index documents.");

	let db = Db::connect(&cfg.storage.postgres).await.expect("Failed to connect to Postgres.");

	db.ensure_schema().await.expect("Failed to ensure schema.");
	sift_testkit::seed_products(
		&db.pool,
		&[
			SeedProduct::new("p1", "goods", "Coat p1"),
			SeedProduct::new("p2", "goods", "Coat p2").inactive(),
			SeedProduct::new("p4", "goods", "Coat p4"),
		],
	)
	.await
	.expect("Failed to seed products.");

	let service = SiftService::connect(cfg).await.expect("Failed to connect service.");
	let criteria =
		SearchCriteria::products().with_catalog("goods").with_keyword("coat").with_window(0, 4);
	let result = service
		.search_products(&criteria, ResponseGroup::INFO, SearchStrategy::Indexed)
		.await
		.expect("Expected product search to succeed.");

	assert_eq!(result.total_count, 4);
	let mut returned: Vec<&str> = result.products.iter().map(|view| view.id.as_str()).collect();

	returned.sort_unstable();

	assert_eq!(returned, vec!["p1", "p4"]);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}
