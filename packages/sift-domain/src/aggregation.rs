use serde::{Deserialize, Serialize};

use crate::index::RawFacets;

#[derive(Clone, Debug, Deserialize, PartialEq, Eq, Serialize)]
pub struct AggregationItem {
	pub value: String,
	pub count: u64,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq, Serialize)]
pub struct Aggregation {
	pub field: String,
	pub items: Vec<AggregationItem>,
}
impl Aggregation {
	pub fn item(&self, value: &str) -> Option<&AggregationItem> {
		self.items.iter().find(|item| item.value.eq_ignore_ascii_case(value))
	}
}

/// Maps raw facet buckets to caller-facing aggregations. Zero-count buckets are dropped, and a
/// field left with no buckets is omitted. Groups sharing a field name (case-insensitively) merge.
pub fn format_aggregations(raw: &RawFacets) -> Vec<Aggregation> {
	let mut out: Vec<Aggregation> = Vec::new();

	for group in &raw.groups {
		let items = group
			.buckets
			.iter()
			.filter(|bucket| bucket.count > 0)
			.map(|bucket| AggregationItem { value: bucket.key.clone(), count: bucket.count });

		match out.iter_mut().find(|agg| agg.field.eq_ignore_ascii_case(&group.field)) {
			Some(existing) => existing.items.extend(items),
			None => out.push(Aggregation { field: group.field.clone(), items: items.collect() }),
		}
	}

	out.retain(|agg| !agg.items.is_empty());

	out
}

pub fn find_aggregation<'a>(aggregations: &'a [Aggregation], field: &str) -> Option<&'a Aggregation> {
	aggregations.iter().find(|agg| agg.field.eq_ignore_ascii_case(field))
}
