use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{
	CategoryView, Error, ProductView, Reconciler, Result, SiftService,
	projection::{self, effective_width},
	views::AssetUrls,
};
use sift_domain::{
	Aggregation, CatalogEntity, Category, DocumentType, ResponseGroup, SearchCriteria,
};

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStrategy {
	/// Index query reconciled against the store.
	Indexed,
	/// Store-only name/code match.
	Direct,
}
impl FromStr for SearchStrategy {
	type Err = Error;

	fn from_str(raw: &str) -> Result<Self> {
		match raw.trim().to_lowercase().as_str() {
			"indexed" => Ok(Self::Indexed),
			"direct" => Ok(Self::Direct),
			other => Err(Error::InvalidRequest {
				message: format!("Unknown search strategy {other:?}."),
			}),
		}
	}
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct ProductSearchResult {
	pub products: Vec<ProductView>,
	pub total_count: u64,
	pub aggregations: Vec<Aggregation>,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct CategorySearchResult {
	pub categories: Vec<CategoryView>,
	pub total_count: u64,
}

impl SiftService {
	/// The configured strategy, used when a caller does not pick one.
	pub fn default_strategy(&self) -> SearchStrategy {
		self.cfg.search.strategy.parse().unwrap_or(SearchStrategy::Indexed)
	}

	/// Product search. The index is used only for keyword searches with the indexed strategy;
	/// everything else goes straight to the store.
	pub async fn search_products(
		&self,
		criteria: &SearchCriteria,
		shape: ResponseGroup,
		strategy: SearchStrategy,
	) -> Result<ProductSearchResult> {
		self.check_criteria(criteria, DocumentType::Product)?;

		if strategy == SearchStrategy::Direct || criteria.keyword().is_none() {
			let page = self.collaborators.direct.search_products(criteria, shape).await?;
			let products = self.project_views(page.products, ProductView::project).await?;

			tracing::debug!(
				returned = products.len(),
				total_count = page.total_count,
				"Direct product search completed."
			);

			return Ok(ProductSearchResult {
				products,
				total_count: page.total_count,
				aggregations: Vec::new(),
			});
		}

		let page = Reconciler::new(
			self.collaborators.index.as_ref(),
			self.collaborators.products.as_ref(),
		)
		.with_max_retries(self.cfg.reconcile.max_retries)
		.reconcile(criteria, shape)
		.await?;
		let products = self.project_views(page.entities, ProductView::project).await?;

		Ok(ProductSearchResult {
			products,
			total_count: page.index_total_count,
			aggregations: page.aggregations,
		})
	}

	/// Category browsing. Always index backed.
	pub async fn search_categories(
		&self,
		criteria: &SearchCriteria,
		shape: ResponseGroup,
	) -> Result<CategorySearchResult> {
		self.check_criteria(criteria, DocumentType::Category)?;

		let page = Reconciler::<Category>::new(
			self.collaborators.index.as_ref(),
			self.collaborators.categories.as_ref(),
		)
		.with_max_retries(self.cfg.reconcile.max_retries)
		.reconcile(criteria, shape)
		.await?;
		let categories = self.project_views(page.entities, CategoryView::project).await?;

		Ok(CategorySearchResult { categories, total_count: page.index_total_count })
	}

	fn check_criteria(&self, criteria: &SearchCriteria, expected: DocumentType) -> Result<()> {
		if criteria.document_type != expected {
			return Err(Error::InvalidRequest {
				message: format!("Expected {} criteria.", expected.as_str()),
			});
		}

		criteria.validate(u64::from(self.cfg.search.max_limit))?;

		Ok(())
	}

	/// Projects off the async runtime. Output keeps the input order.
	async fn project_views<E, V>(
		&self,
		entities: Vec<E>,
		map: fn(&E, &AssetUrls) -> V,
	) -> Result<Vec<V>>
	where
		E: CatalogEntity,
		V: Send + Sync + 'static,
	{
		if entities.is_empty() {
			return Ok(Vec::new());
		}

		let width = effective_width(self.cfg.reconcile.projection_concurrency);
		let assets = self.assets.clone();

		tokio::task::spawn_blocking(move || {
			projection::project(&entities, width, |entity| map(entity, &assets))
		})
		.await
		.map_err(|err| Error::Projection { message: format!("Projection worker failed: {err}.") })
	}
}
