use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use sift_domain::{Category, Product};

/// Turns stored asset paths into absolute URLs.
#[derive(Clone, Debug)]
pub struct AssetUrls {
	base_url: String,
}
impl AssetUrls {
	pub fn new(base_url: &str) -> Self {
		Self { base_url: base_url.trim().trim_end_matches('/').to_string() }
	}

	pub fn resolve(&self, path: &str) -> String {
		let path = path.trim();

		if path.starts_with("http://") || path.starts_with("https://") {
			return path.to_string();
		}

		format!("{}/{}", self.base_url, path.trim_start_matches('/'))
	}

	fn resolve_all(&self, paths: Option<&[String]>) -> Option<Vec<String>> {
		paths.map(|paths| paths.iter().map(|path| self.resolve(path)).collect())
	}
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct ProductView {
	pub id: String,
	pub code: String,
	pub name: String,
	pub catalog_id: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub category_id: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub outlines: Option<Vec<String>>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub properties: Option<Map<String, Value>>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub images: Option<Vec<String>>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub seo_slug: Option<String>,
}
impl ProductView {
	pub fn project(product: &Product, assets: &AssetUrls) -> Self {
		Self {
			id: product.id.clone(),
			code: product.code.clone(),
			name: product.name.clone(),
			catalog_id: product.catalog_id.clone(),
			category_id: product.category_id.clone(),
			outlines: product.outlines.clone(),
			properties: product.properties.clone(),
			images: assets.resolve_all(product.image_paths.as_deref()),
			seo_slug: product.seo_slug.clone(),
		}
	}
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct CategoryView {
	pub id: String,
	pub code: String,
	pub name: String,
	pub catalog_id: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub parent_id: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub parents: Option<Vec<String>>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub outlines: Option<Vec<String>>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub properties: Option<Map<String, Value>>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub images: Option<Vec<String>>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub seo_slug: Option<String>,
}
impl CategoryView {
	pub fn project(category: &Category, assets: &AssetUrls) -> Self {
		Self {
			id: category.id.clone(),
			code: category.code.clone(),
			name: category.name.clone(),
			catalog_id: category.catalog_id.clone(),
			parent_id: category.parent_id.clone(),
			parents: category.parents.clone(),
			outlines: category.outlines.clone(),
			properties: category.properties.clone(),
			images: assets.resolve_all(category.image_paths.as_deref()),
			seo_slug: category.seo_slug.clone(),
		}
	}
}
