use axum::{
	Json, Router,
	extract::State,
	http::StatusCode,
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::state::AppState;
use sift_config::Search;
use sift_domain::{ResponseGroup, SearchCriteria, SearchFilter, SortField};
use sift_service::{CategorySearchResult, Error as ServiceError, ProductSearchResult, SearchStrategy};

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/v1/catalog/products/search", post(search_products))
		.route("/v1/catalog/categories/search", post(search_categories))
		.with_state(state)
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProductSearchRequest {
	pub keyword: Option<String>,
	pub catalog_id: Option<String>,
	pub outlines: Vec<String>,
	pub skip: u64,
	/// Falls back to `search.default_limit`.
	pub take: Option<u64>,
	/// `field`, `field asc`, or `field desc`.
	pub sort: Vec<String>,
	/// Facets to count.
	pub facets: Vec<SearchFilter>,
	pub filters: Vec<SearchFilter>,
	pub currency: Option<String>,
	pub pricelists: Vec<String>,
	pub fuzzy: bool,
	pub fuzzy_min_similarity: Option<f32>,
	pub with_hidden: bool,
	#[serde(with = "sift_domain::time_serde::option")]
	pub visible_at: Option<OffsetDateTime>,
	pub response_groups: Vec<String>,
	pub strategy: Option<SearchStrategy>,
}
impl ProductSearchRequest {
	fn into_criteria(self, search: &Search) -> Result<(SearchCriteria, ResponseGroup), ApiError> {
		let shape = parse_groups(&self.response_groups, ResponseGroup::ITEM_LARGE)?;
		let mut criteria = SearchCriteria::products()
			.with_keyword(self.keyword.unwrap_or_default())
			.with_window(self.skip, take(self.take, search))
			.with_hidden(self.with_hidden);

		criteria.catalog_id = self.catalog_id;
		criteria.outlines = self.outlines;
		criteria.sort = parse_sort(&self.sort)?;
		criteria.declared_filters = self.facets;
		criteria.applied_filters = self.filters;
		criteria.currency = self.currency;
		criteria.pricelists = self.pricelists;
		criteria.visible_at = self.visible_at;

		if self.fuzzy {
			criteria = criteria
				.with_fuzzy(self.fuzzy_min_similarity.unwrap_or(search.fuzzy_min_similarity));
		}

		Ok((criteria, shape))
	}
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CategorySearchRequest {
	pub keyword: Option<String>,
	pub catalog_id: Option<String>,
	pub outlines: Vec<String>,
	pub skip: u64,
	pub take: Option<u64>,
	pub sort: Vec<String>,
	pub with_hidden: bool,
	#[serde(with = "sift_domain::time_serde::option")]
	pub visible_at: Option<OffsetDateTime>,
	pub response_groups: Vec<String>,
}
impl CategorySearchRequest {
	fn into_criteria(self, search: &Search) -> Result<(SearchCriteria, ResponseGroup), ApiError> {
		let shape = parse_groups(&self.response_groups, ResponseGroup::CATEGORY_FULL)?;
		let mut criteria = SearchCriteria::categories()
			.with_keyword(self.keyword.unwrap_or_default())
			.with_window(self.skip, take(self.take, search))
			.with_hidden(self.with_hidden);

		criteria.catalog_id = self.catalog_id;
		criteria.outlines = self.outlines;
		criteria.sort = parse_sort(&self.sort)?;
		criteria.visible_at = self.visible_at;

		Ok((criteria, shape))
	}
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	fields: Option<Vec<String>>,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: String,
	message: String,
	fields: Option<Vec<String>>,
}
impl ApiError {
	fn new(
		status: StatusCode,
		error_code: impl Into<String>,
		message: impl Into<String>,
		fields: Option<Vec<String>>,
	) -> Self {
		Self { status, error_code: error_code.into(), message: message.into(), fields }
	}

	fn invalid_field(message: impl Into<String>, field: String) -> Self {
		Self::new(StatusCode::BAD_REQUEST, "invalid_request", message, Some(vec![field]))
	}
}
impl From<ServiceError> for ApiError {
	fn from(err: ServiceError) -> Self {
		match err {
			ServiceError::InvalidRequest { message } =>
				Self::new(StatusCode::BAD_REQUEST, "invalid_request", message, None),
			ServiceError::Index { message } => {
				tracing::error!(error = %message, "Search index request failed.");

				Self::new(StatusCode::BAD_GATEWAY, "index_unavailable", message, None)
			},
			ServiceError::Storage { message } => {
				tracing::error!(error = %message, "Catalog store request failed.");

				Self::new(StatusCode::SERVICE_UNAVAILABLE, "store_unavailable", message, None)
			},
			ServiceError::Projection { message } => {
				tracing::error!(error = %message, "Result projection failed.");

				Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", message, None)
			},
		}
	}
}
impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body =
			ErrorBody { error_code: self.error_code, message: self.message, fields: self.fields };

		(self.status, Json(body)).into_response()
	}
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn search_products(
	State(state): State<AppState>,
	Json(payload): Json<ProductSearchRequest>,
) -> Result<Json<ProductSearchResult>, ApiError> {
	let strategy = payload.strategy.unwrap_or_else(|| state.service.default_strategy());
	let (criteria, shape) = payload.into_criteria(&state.service.cfg.search)?;
	let result = state.service.search_products(&criteria, shape, strategy).await?;

	Ok(Json(result))
}

async fn search_categories(
	State(state): State<AppState>,
	Json(payload): Json<CategorySearchRequest>,
) -> Result<Json<CategorySearchResult>, ApiError> {
	let (criteria, shape) = payload.into_criteria(&state.service.cfg.search)?;
	let result = state.service.search_categories(&criteria, shape).await?;

	Ok(Json(result))
}

fn take(requested: Option<u64>, search: &Search) -> u64 {
	requested.unwrap_or(u64::from(search.default_limit))
}

fn parse_sort(raw: &[String]) -> Result<Vec<SortField>, ApiError> {
	raw.iter()
		.enumerate()
		.map(|(idx, value)| {
			SortField::parse(value).ok_or_else(|| {
				ApiError::invalid_field(format!("Invalid sort {value:?}."), format!("$.sort[{idx}]"))
			})
		})
		.collect()
}

fn parse_groups(names: &[String], fallback: ResponseGroup) -> Result<ResponseGroup, ApiError> {
	if names.is_empty() {
		return Ok(fallback);
	}

	let mut group = ResponseGroup::INFO;

	for (idx, name) in names.iter().enumerate() {
		group |= ResponseGroup::from_names(std::slice::from_ref(name)).map_err(|err| {
			ApiError::invalid_field(err.to_string(), format!("$.response_groups[{idx}]"))
		})?;
	}

	Ok(group)
}
