//! Postgres and Qdrant behind the collaborator traits.

use sift_domain::{
	Category, DocumentType, IndexQueryResult, Product, ResponseGroup, SearchCriteria,
};
use sift_storage::{
	db::Db,
	qdrant::QdrantIndex,
	queries::{self, DirectPage},
};

use crate::{BoxFuture, DirectSearch, IndexClient, Result, StoreHydrator};

pub struct PgStore {
	pub db: Db,
}
impl PgStore {
	pub fn new(db: Db) -> Self {
		Self { db }
	}
}
impl StoreHydrator<Product> for PgStore {
	fn get_by_ids<'a>(
		&'a self,
		ids: &'a [String],
		shape: ResponseGroup,
		scope_hint: Option<&'a str>,
	) -> BoxFuture<'a, Result<Vec<Product>>> {
		Box::pin(async move {
			Ok(queries::hydrate_products(&self.db.pool, ids, shape, scope_hint).await?)
		})
	}
}
impl StoreHydrator<Category> for PgStore {
	fn get_by_ids<'a>(
		&'a self,
		ids: &'a [String],
		shape: ResponseGroup,
		scope_hint: Option<&'a str>,
	) -> BoxFuture<'a, Result<Vec<Category>>> {
		Box::pin(async move {
			Ok(queries::hydrate_categories(&self.db.pool, ids, shape, scope_hint).await?)
		})
	}
}
impl DirectSearch for PgStore {
	fn search_products<'a>(
		&'a self,
		criteria: &'a SearchCriteria,
		shape: ResponseGroup,
	) -> BoxFuture<'a, Result<DirectPage>> {
		Box::pin(async move {
			let page = queries::search_products_direct(
				&self.db.pool,
				criteria.scope_hint(),
				criteria.keyword(),
				criteria.window,
				shape,
			)
			.await?;

			Ok(page)
		})
	}
}

impl IndexClient for QdrantIndex {
	fn query<'a>(
		&'a self,
		scope: DocumentType,
		criteria: &'a SearchCriteria,
	) -> BoxFuture<'a, Result<IndexQueryResult>> {
		Box::pin(async move { Ok(QdrantIndex::query(self, scope, criteria).await?) })
	}
}
