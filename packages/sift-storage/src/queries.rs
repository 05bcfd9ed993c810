use sqlx::{PgExecutor, PgPool};

use crate::{
	Error, Result,
	models::{CategoryRow, ProductRow},
};
use sift_domain::{Category, PageWindow, Product, ResponseGroup};

/// One page of a direct store search.
#[derive(Debug)]
pub struct DirectPage {
	pub products: Vec<Product>,
	pub total_count: u64,
}

/// Loads active products by id. Ids that do not resolve are omitted and the row order is not
/// related to `ids`.
pub async fn hydrate_products(
	executor: impl PgExecutor<'_>,
	ids: &[String],
	group: ResponseGroup,
	catalog_id: Option<&str>,
) -> Result<Vec<Product>> {
	if ids.is_empty() {
		return Ok(Vec::new());
	}

	let sql = format!(
		"\
SELECT
	{}
FROM catalog_products
WHERE product_id = ANY($1)
	AND is_active
	AND ($2::text IS NULL OR catalog_id = $2)",
		product_columns(group)
	);
	let rows: Vec<ProductRow> =
		sqlx::query_as(&sql).bind(ids).bind(catalog_id).fetch_all(executor).await?;

	Ok(rows.into_iter().map(Product::from).collect())
}

pub async fn hydrate_categories(
	executor: impl PgExecutor<'_>,
	ids: &[String],
	group: ResponseGroup,
	catalog_id: Option<&str>,
) -> Result<Vec<Category>> {
	if ids.is_empty() {
		return Ok(Vec::new());
	}

	let sql = format!(
		"\
SELECT
	{}
FROM catalog_categories
WHERE category_id = ANY($1)
	AND is_active
	AND ($2::text IS NULL OR catalog_id = $2)",
		category_columns(group)
	);
	let rows: Vec<CategoryRow> =
		sqlx::query_as(&sql).bind(ids).bind(catalog_id).fetch_all(executor).await?;

	Ok(rows.into_iter().map(Category::from).collect())
}

/// Case-insensitive name or code match straight against the store, ordered by name.
pub async fn search_products_direct(
	pool: &PgPool,
	catalog_id: Option<&str>,
	keyword: Option<&str>,
	window: PageWindow,
	group: ResponseGroup,
) -> Result<DirectPage> {
	let pattern = keyword
		.map(str::trim)
		.filter(|keyword| !keyword.is_empty())
		.map(|keyword| format!("%{}%", escape_like(keyword)));
	let offset = to_i64("offset", window.offset)?;
	let limit = to_i64("limit", window.limit)?;
	let total: i64 = sqlx::query_scalar(
		"\
SELECT count(*)
FROM catalog_products
WHERE is_active
	AND ($1::text IS NULL OR catalog_id = $1)
	AND ($2::text IS NULL OR name ILIKE $2 OR code ILIKE $2)",
	)
	.bind(catalog_id)
	.bind(pattern.as_deref())
	.fetch_one(pool)
	.await?;
	let sql = format!(
		"\
SELECT
	{}
FROM catalog_products
WHERE is_active
	AND ($1::text IS NULL OR catalog_id = $1)
	AND ($2::text IS NULL OR name ILIKE $2 OR code ILIKE $2)
ORDER BY lower(name), product_id
OFFSET $3
LIMIT $4",
		product_columns(group)
	);
	let rows: Vec<ProductRow> = sqlx::query_as(&sql)
		.bind(catalog_id)
		.bind(pattern.as_deref())
		.bind(offset)
		.bind(limit)
		.fetch_all(pool)
		.await?;

	Ok(DirectPage {
		products: rows.into_iter().map(Product::from).collect(),
		total_count: total.max(0) as u64,
	})
}

fn product_columns(group: ResponseGroup) -> String {
	[
		"product_id".to_string(),
		"catalog_id".to_string(),
		"category_id".to_string(),
		"code".to_string(),
		"name".to_string(),
		shaped(group, ResponseGroup::OUTLINES, "outlines", "text[]"),
		shaped(group, ResponseGroup::PROPERTIES, "properties", "jsonb"),
		shaped(group, ResponseGroup::ASSETS, "image_paths", "text[]"),
		shaped(group, ResponseGroup::SEO, "seo_slug", "text"),
		"updated_at".to_string(),
	]
	.join(",\n\t")
}

fn category_columns(group: ResponseGroup) -> String {
	[
		"category_id".to_string(),
		"catalog_id".to_string(),
		"parent_id".to_string(),
		"code".to_string(),
		"name".to_string(),
		shaped(group, ResponseGroup::OUTLINES, "outlines", "text[]"),
		shaped(group, ResponseGroup::PARENTS, "parents", "text[]"),
		shaped(group, ResponseGroup::PROPERTIES, "properties", "jsonb"),
		shaped(group, ResponseGroup::ASSETS, "image_paths", "text[]"),
		shaped(group, ResponseGroup::SEO, "seo_slug", "text"),
		"updated_at".to_string(),
	]
	.join(",\n\t")
}

fn shaped(group: ResponseGroup, flag: ResponseGroup, column: &str, sql_type: &str) -> String {
	if group.contains(flag) { column.to_string() } else { format!("NULL::{sql_type} AS {column}") }
}

fn escape_like(raw: &str) -> String {
	let mut out = String::with_capacity(raw.len());

	for ch in raw.chars() {
		if matches!(ch, '%' | '_' | '\\') {
			out.push('\\');
		}

		out.push(ch);
	}

	out
}

fn to_i64(label: &str, value: u64) -> Result<i64> {
	i64::try_from(value).map_err(|_| Error::InvalidArgument(format!("{label} is out of range.")))
}
