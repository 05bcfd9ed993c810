pub mod catalog;
pub mod projection;
pub mod reconcile;
pub mod store;
pub mod views;

mod error;

pub use catalog::{CategorySearchResult, ProductSearchResult, SearchStrategy};
pub use error::{Error, Result};
pub use reconcile::{ReconciledPage, Reconciler};
pub use store::PgStore;
pub use views::{AssetUrls, CategoryView, ProductView};

use std::{future::Future, pin::Pin, sync::Arc};

use sift_config::Config;
use sift_domain::{
	CatalogEntity, Category, DocumentType, IndexQueryResult, Product, ResponseGroup,
	SearchCriteria,
};
use sift_storage::{db::Db, qdrant::QdrantIndex, queries::DirectPage};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Runs criteria against the search index of one document kind.
pub trait IndexClient
where
	Self: Send + Sync,
{
	fn query<'a>(
		&'a self,
		scope: DocumentType,
		criteria: &'a SearchCriteria,
	) -> BoxFuture<'a, Result<IndexQueryResult>>;
}

/// Loads full entities from the authoritative store. Unknown ids are omitted and the returned
/// order is unspecified.
pub trait StoreHydrator<E>
where
	Self: Send + Sync,
	E: CatalogEntity,
{
	fn get_by_ids<'a>(
		&'a self,
		ids: &'a [String],
		shape: ResponseGroup,
		scope_hint: Option<&'a str>,
	) -> BoxFuture<'a, Result<Vec<E>>>;
}

/// Product search that bypasses the index.
pub trait DirectSearch
where
	Self: Send + Sync,
{
	fn search_products<'a>(
		&'a self,
		criteria: &'a SearchCriteria,
		shape: ResponseGroup,
	) -> BoxFuture<'a, Result<DirectPage>>;
}

#[derive(Clone)]
pub struct Collaborators {
	pub index: Arc<dyn IndexClient>,
	pub products: Arc<dyn StoreHydrator<Product>>,
	pub categories: Arc<dyn StoreHydrator<Category>>,
	pub direct: Arc<dyn DirectSearch>,
}

pub struct SiftService {
	pub cfg: Config,
	pub collaborators: Collaborators,
	pub assets: AssetUrls,
}
impl SiftService {
	pub fn new(cfg: Config, collaborators: Collaborators) -> Self {
		let assets = AssetUrls::new(&cfg.assets.base_url);

		Self { cfg, collaborators, assets }
	}

	/// Connects to Postgres and Qdrant, bootstraps the store schema, and wires the concrete
	/// collaborators.
	pub async fn connect(cfg: Config) -> Result<Self> {
		let db = Db::connect(&cfg.storage.postgres).await?;

		db.ensure_schema().await?;

		let index = QdrantIndex::new(&cfg.storage.qdrant, &cfg.search)?;
		let store = Arc::new(PgStore::new(db));
		let collaborators = Collaborators {
			index: Arc::new(index),
			products: store.clone(),
			categories: store.clone(),
			direct: store,
		};

		Ok(Self::new(cfg, collaborators))
	}
}
