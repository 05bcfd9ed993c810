//! Snapshot types produced by one index query.

use serde_json::{Map, Value};

/// Lightweight pointer to a document. Its rank is its position in [`IndexQueryResult::documents`].
#[derive(Clone, Debug, PartialEq)]
pub struct DocumentReference {
	pub id: String,
	/// Raw stored fields, as returned by the index.
	pub fields: Map<String, Value>,
}
impl DocumentReference {
	pub fn new(id: impl Into<String>) -> Self {
		Self { id: id.into(), fields: Map::new() }
	}
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FacetBucket {
	pub key: String,
	pub count: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FacetGroup {
	pub field: String,
	pub buckets: Vec<FacetBucket>,
}

/// Raw facet counts keyed by field then bucket id.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RawFacets {
	pub groups: Vec<FacetGroup>,
}
impl RawFacets {
	pub fn is_empty(&self) -> bool {
		self.groups.iter().all(|group| group.buckets.is_empty())
	}

	/// Adds one bucket count, merging into an existing group with the same field name.
	pub fn push(&mut self, field: &str, key: impl Into<String>, count: u64) {
		let bucket = FacetBucket { key: key.into(), count };

		match self.groups.iter_mut().find(|group| group.field.eq_ignore_ascii_case(field)) {
			Some(group) => group.buckets.push(bucket),
			None => self.groups.push(FacetGroup { field: field.to_string(), buckets: vec![bucket] }),
		}
	}
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct IndexQueryResult {
	pub documents: Vec<DocumentReference>,
	/// The index's belief of total matches. May exceed what the store can resolve.
	pub total_count: u64,
	pub facets: RawFacets,
}
