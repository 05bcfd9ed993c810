use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use time::OffsetDateTime;

use crate::criteria::DocumentType;

/// A full record from the authoritative store. Fields excluded by the requested response group
/// are `None`.
pub trait CatalogEntity
where
	Self: Send + Sync + 'static,
{
	const KIND: DocumentType;

	fn id(&self) -> &str;
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Product {
	pub id: String,
	pub catalog_id: String,
	pub category_id: Option<String>,
	pub code: String,
	pub name: String,
	pub outlines: Option<Vec<String>>,
	pub properties: Option<Map<String, Value>>,
	pub image_paths: Option<Vec<String>>,
	pub seo_slug: Option<String>,
	#[serde(with = "crate::time_serde")]
	pub updated_at: OffsetDateTime,
}
impl CatalogEntity for Product {
	const KIND: DocumentType = DocumentType::Product;

	fn id(&self) -> &str {
		&self.id
	}
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Category {
	pub id: String,
	pub catalog_id: String,
	pub parent_id: Option<String>,
	pub code: String,
	pub name: String,
	pub outlines: Option<Vec<String>>,
	pub properties: Option<Map<String, Value>>,
	pub image_paths: Option<Vec<String>>,
	pub seo_slug: Option<String>,
	/// Ancestor ids, root first.
	pub parents: Option<Vec<String>>,
	#[serde(with = "crate::time_serde")]
	pub updated_at: OffsetDateTime,
}
impl CatalogEntity for Category {
	const KIND: DocumentType = DocumentType::Category;

	fn id(&self) -> &str {
		&self.id
	}
}
