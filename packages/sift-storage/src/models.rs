use serde_json::{Map, Value};
use time::OffsetDateTime;

use sift_domain::{Category, Product};

#[derive(Debug, sqlx::FromRow)]
pub struct ProductRow {
	pub product_id: String,
	pub catalog_id: String,
	pub category_id: Option<String>,
	pub code: String,
	pub name: String,
	pub outlines: Option<Vec<String>>,
	pub properties: Option<Value>,
	pub image_paths: Option<Vec<String>>,
	pub seo_slug: Option<String>,
	pub updated_at: OffsetDateTime,
}
impl From<ProductRow> for Product {
	fn from(row: ProductRow) -> Self {
		Self {
			id: row.product_id,
			catalog_id: row.catalog_id,
			category_id: row.category_id,
			code: row.code,
			name: row.name,
			outlines: row.outlines,
			properties: row.properties.and_then(into_object),
			image_paths: row.image_paths,
			seo_slug: row.seo_slug,
			updated_at: row.updated_at,
		}
	}
}

#[derive(Debug, sqlx::FromRow)]
pub struct CategoryRow {
	pub category_id: String,
	pub catalog_id: String,
	pub parent_id: Option<String>,
	pub code: String,
	pub name: String,
	pub outlines: Option<Vec<String>>,
	pub parents: Option<Vec<String>>,
	pub properties: Option<Value>,
	pub image_paths: Option<Vec<String>>,
	pub seo_slug: Option<String>,
	pub updated_at: OffsetDateTime,
}
impl From<CategoryRow> for Category {
	fn from(row: CategoryRow) -> Self {
		Self {
			id: row.category_id,
			catalog_id: row.catalog_id,
			parent_id: row.parent_id,
			code: row.code,
			name: row.name,
			outlines: row.outlines,
			properties: row.properties.and_then(into_object),
			image_paths: row.image_paths,
			seo_slug: row.seo_slug,
			parents: row.parents,
			updated_at: row.updated_at,
		}
	}
}

fn into_object(value: Value) -> Option<Map<String, Value>> {
	match value {
		Value::Object(map) => Some(map),
		_ => None,
	}
}
