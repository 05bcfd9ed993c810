use std::collections::HashMap;

use qdrant_client::{
	Payload, Qdrant,
	qdrant::{
		CreateCollectionBuilder, CreateFieldIndexCollectionBuilder, Distance, FieldType,
		PointStruct, UpsertPointsBuilder, Value, VectorParamsBuilder,
	},
};
use serde_json::{Map, Value as JsonValue, json};
use sqlx::PgPool;
use uuid::Uuid;

use crate::Result;

/// A `catalog_products` row to insert.
#[derive(Clone, Debug)]
pub struct SeedProduct {
	pub id: String,
	pub catalog_id: String,
	pub category_id: Option<String>,
	pub code: String,
	pub name: String,
	pub active: bool,
	pub outlines: Vec<String>,
	pub properties: JsonValue,
	pub image_paths: Vec<String>,
	pub seo_slug: Option<String>,
}
impl SeedProduct {
	pub fn new(id: &str, catalog_id: &str, name: &str) -> Self {
		Self {
			id: id.to_string(),
			catalog_id: catalog_id.to_string(),
			category_id: None,
			code: id.to_uppercase(),
			name: name.to_string(),
			active: true,
			outlines: Vec::new(),
			properties: json!({}),
			image_paths: Vec::new(),
			seo_slug: None,
		}
	}

	pub fn inactive(mut self) -> Self {
		self.active = false;

		self
	}

	pub fn with_details(mut self, outline: &str, image_path: &str, seo_slug: &str) -> Self {
		self.outlines.push(outline.to_string());
		self.image_paths.push(image_path.to_string());
		self.seo_slug = Some(seo_slug.to_string());
		self.properties = json!({ "color": "red" });

		self
	}
}

/// A `catalog_categories` row to insert.
#[derive(Clone, Debug)]
pub struct SeedCategory {
	pub id: String,
	pub catalog_id: String,
	pub parent_id: Option<String>,
	pub name: String,
	pub active: bool,
	pub parents: Vec<String>,
}
impl SeedCategory {
	pub fn new(id: &str, catalog_id: &str, name: &str) -> Self {
		Self {
			id: id.to_string(),
			catalog_id: catalog_id.to_string(),
			parent_id: None,
			name: name.to_string(),
			active: true,
			parents: Vec::new(),
		}
	}

	pub fn child_of(mut self, parent_id: &str) -> Self {
		self.parent_id = Some(parent_id.to_string());
		self.parents.push(parent_id.to_string());

		self
	}
}

pub async fn seed_products(pool: &PgPool, products: &[SeedProduct]) -> Result<()> {
	for product in products {
		sqlx::query(
			"\
INSERT INTO catalog_products (
	product_id,
	catalog_id,
	category_id,
	code,
	name,
	is_active,
	outlines,
	properties,
	image_paths,
	seo_slug
)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
		)
		.bind(product.id.as_str())
		.bind(product.catalog_id.as_str())
		.bind(product.category_id.as_deref())
		.bind(product.code.as_str())
		.bind(product.name.as_str())
		.bind(product.active)
		.bind(&product.outlines)
		.bind(&product.properties)
		.bind(&product.image_paths)
		.bind(product.seo_slug.as_deref())
		.execute(pool)
		.await?;
	}

	Ok(())
}

pub async fn seed_categories(pool: &PgPool, categories: &[SeedCategory]) -> Result<()> {
	for category in categories {
		sqlx::query(
			"\
INSERT INTO catalog_categories (category_id, catalog_id, parent_id, code, name, is_active, parents)
VALUES ($1, $2, $3, $4, $5, $6, $7)",
		)
		.bind(category.id.as_str())
		.bind(category.catalog_id.as_str())
		.bind(category.parent_id.as_deref())
		.bind(category.id.to_uppercase())
		.bind(category.name.as_str())
		.bind(category.active)
		.bind(&category.parents)
		.execute(pool)
		.await?;
	}

	Ok(())
}

/// A point to index. Visible by default.
#[derive(Clone, Debug)]
pub struct IndexDocument {
	pub id: String,
	pub payload: Map<String, JsonValue>,
}
impl IndexDocument {
	pub fn new(id: &str) -> Self {
		let mut payload = Map::new();

		payload.insert("id".to_string(), JsonValue::from(id));
		payload.insert("visible".to_string(), JsonValue::Bool(true));

		Self { id: id.to_string(), payload }
	}

	pub fn field(mut self, key: &str, value: impl Into<JsonValue>) -> Self {
		self.payload.insert(key.to_string(), value.into());

		self
	}
}

/// Stable point id for a document id.
pub fn point_id(document_id: &str) -> String {
	Uuid::new_v5(&Uuid::NAMESPACE_OID, document_id.as_bytes()).to_string()
}

/// Creates a collection with a full-text index on `name` and float indexes on `numeric_fields`.
pub async fn create_index_collection(
	client: &Qdrant,
	collection: &str,
	numeric_fields: &[&str],
) -> Result<()> {
	client
		.create_collection(
			CreateCollectionBuilder::new(collection)
				.vectors_config(VectorParamsBuilder::new(1, Distance::Dot)),
		)
		.await?;
	client
		.create_field_index(
			CreateFieldIndexCollectionBuilder::new(collection, "name", FieldType::Text).wait(true),
		)
		.await?;

	for field in numeric_fields {
		client
			.create_field_index(
				CreateFieldIndexCollectionBuilder::new(collection, *field, FieldType::Float)
					.wait(true),
			)
			.await?;
	}

	Ok(())
}

pub async fn index_documents(
	client: &Qdrant,
	collection: &str,
	documents: &[IndexDocument],
) -> Result<()> {
	let points = documents
		.iter()
		.map(|document| {
			let payload: HashMap<String, Value> = document
				.payload
				.iter()
				.map(|(key, value)| (key.clone(), Value::from(value.clone())))
				.collect();

			PointStruct::new(point_id(&document.id), vec![1.0_f32], Payload::from(payload))
		})
		.collect::<Vec<_>>();

	client.upsert_points(UpsertPointsBuilder::new(collection, points).wait(true)).await?;

	Ok(())
}
