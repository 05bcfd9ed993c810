//! Read side of the catalog search index.
//!
//! Documents live in one Qdrant collection per entity kind. Each point carries its catalog id in
//! the `id` payload field, plus the fields filters and sorts refer to: `catalog_id`, `outlines`
//! (direct category paths), `outline_paths` (every ancestor path), `name` (full-text indexed),
//! `visible`, `start_date`, `end_date` and lowercased attribute keys. Prices live in
//! `price_<currency>`, or in `price_<currency>_<pricelist>` when a document is priced per pricelist.

use std::{collections::HashMap, future::Future, time::Duration};

use qdrant_client::{
	Qdrant, QdrantError,
	qdrant::{
		Condition, CountPointsBuilder, DatetimeRange, Direction, Filter, MinShould, OrderBy, Query,
		QueryPointsBuilder, Range, ScoredPoint, Timestamp, Value, value::Kind,
	},
};
use serde_json::{Map, Number, Value as JsonValue};
use time::OffsetDateTime;

use crate::{Error, Result};
use sift_domain::{
	DocumentReference, DocumentType, IndexQueryResult, RawFacets, SearchCriteria, SearchFilter,
	criteria::price_fields,
};

pub const ID_FIELD: &str = "id";

pub struct QdrantIndex {
	pub client: Qdrant,
	pub product_collection: String,
	pub category_collection: String,
	pub timeout: Duration,
	/// Lowercased payload fields the index can order by.
	pub sortable_fields: Vec<String>,
}
impl QdrantIndex {
	pub fn new(qdrant: &sift_config::Qdrant, search: &sift_config::Search) -> Result<Self> {
		let client = Qdrant::from_url(&qdrant.url).build()?;

		Ok(Self {
			client,
			product_collection: qdrant.product_collection.clone(),
			category_collection: qdrant.category_collection.clone(),
			timeout: Duration::from_millis(qdrant.timeout_ms),
			sortable_fields: search.sortable_fields.clone(),
		})
	}

	pub fn collection(&self, kind: DocumentType) -> &str {
		match kind {
			DocumentType::Product => self.product_collection.as_str(),
			DocumentType::Category => self.category_collection.as_str(),
		}
	}

	/// Runs one page query, an exact total count, and one exact count per declared facet bucket.
	///
	/// Documents are ranked by the first sortable field in `criteria.sort`. Without one the page
	/// comes back in point-id order, which is stable across calls but carries no relevance.
	pub async fn query(
		&self,
		kind: DocumentType,
		criteria: &SearchCriteria,
	) -> Result<IndexQueryResult> {
		let collection = self.collection(kind);
		let filter = build_filter(criteria, criteria.applied_filters.iter());
		let documents = if criteria.window.limit == 0 {
			Vec::new()
		} else {
			let mut request = QueryPointsBuilder::new(collection)
				.filter(filter.clone())
				.offset(criteria.window.offset)
				.limit(criteria.window.limit)
				.with_payload(true);

			if let Some(order) = self.order_by(criteria) {
				request = request.query(Query::new_order_by(order));
			}

			let response = self.timed("query", self.client.query(request)).await?;

			response.result.into_iter().filter_map(into_reference).collect()
		};
		let total_count = self.count(collection, filter).await?;
		let mut facets = RawFacets::default();

		for declared in criteria.declared_filters.iter().filter(|filter| !filter.is_empty()) {
			let base = build_filter(criteria, criteria.applied_excluding(declared));

			for (key, condition) in bucket_conditions(declared, &criteria.pricelists) {
				let mut filter = base.clone();

				filter.must.push(condition);

				let count = self.count(collection, filter).await?;

				facets.push(declared.facet_name(), key, count);
			}
		}

		tracing::debug!(
			collection,
			offset = criteria.window.offset,
			limit = criteria.window.limit,
			returned = documents.len(),
			total_count,
			"Index query completed."
		);

		Ok(IndexQueryResult { documents, total_count, facets })
	}

	/// First requested sort the index can honor. Sorts on other fields are dropped.
	///
	/// `price` resolves to the highest-priority price field for the criteria's currency that is
	/// sortable.
	pub fn order_by(&self, criteria: &SearchCriteria) -> Option<OrderBy> {
		for sort in &criteria.sort {
			let requested = sort.field.trim().to_lowercase();
			let candidates = match criteria.currency.as_deref() {
				Some(currency) if requested == "price" => price_fields(currency, &criteria.pricelists),
				_ => vec![requested],
			};
			let Some(field) =
				candidates.into_iter().find(|field| self.sortable_fields.contains(field))
			else {
				tracing::debug!(field = %sort.field, "Dropping sort on a field the index cannot order by.");

				continue;
			};

			let direction = if sort.descending { Direction::Desc } else { Direction::Asc };

			return Some(OrderBy { key: field, direction: Some(direction as i32), start_from: None });
		}

		None
	}

	async fn count(&self, collection: &str, filter: Filter) -> Result<u64> {
		let request = CountPointsBuilder::new(collection).filter(filter).exact(true);
		let response = self.timed("count", self.client.count(request)).await?;

		Ok(response.result.map(|result| result.count).unwrap_or(0))
	}

	async fn timed<T>(
		&self,
		operation: &'static str,
		call: impl Future<Output = Result<T, QdrantError>>,
	) -> Result<T> {
		match tokio::time::timeout(self.timeout, call).await {
			Ok(result) => Ok(result?),
			Err(_) =>
				Err(Error::Timeout { operation, timeout_ms: self.timeout.as_millis() as u64 }),
		}
	}
}

/// Filter for `criteria` restricted by `applied` instead of the criteria's own applied filters.
pub fn build_filter<'a>(
	criteria: &SearchCriteria,
	applied: impl IntoIterator<Item = &'a SearchFilter>,
) -> Filter {
	let mut must = Vec::new();
	let mut must_not = Vec::new();
	let mut min_should = None;

	if let Some(catalog_id) = criteria.scope_hint() {
		must.push(Condition::matches("catalog_id", catalog_id.to_string()));
	}
	if !criteria.outlines.is_empty() {
		let outlines = criteria.outlines.iter().map(String::as_str).map(outline_condition);

		must.push(Condition::from(Filter::should(outlines)));
	}
	if !criteria.with_hidden {
		must.push(Condition::matches("visible", true));
	}
	if let Some(instant) = criteria.visible_at {
		let at = timestamp(instant);

		must_not.push(Condition::datetime_range(
			"start_date",
			DatetimeRange { lt: None, gt: Some(at), gte: None, lte: None },
		));
		must_not.push(Condition::datetime_range(
			"end_date",
			DatetimeRange { lt: None, gt: None, gte: None, lte: Some(at) },
		));
	}
	if let Some(keyword) = criteria.keyword() {
		if criteria.fuzzy.enabled {
			let tokens: Vec<&str> = keyword.split_whitespace().collect();
			let required = required_tokens(tokens.len(), criteria.fuzzy.min_similarity);
			let conditions =
				tokens.into_iter().map(|token| Condition::matches_text("name", token)).collect();

			min_should = Some(MinShould { min_count: required, conditions });
		} else {
			must.push(Condition::matches_text("name", keyword));
		}
	}

	for filter in applied.into_iter().filter(|filter| !filter.is_empty()) {
		must.push(applied_condition(filter, &criteria.pricelists));
	}

	Filter { must, should: Vec::new(), must_not, min_should }
}

/// Tokens that must match for a fuzzy keyword to hit. Never less than one.
pub fn required_tokens(tokens: usize, min_similarity: f32) -> u64 {
	let required = (tokens as f64 * f64::from(min_similarity)).ceil() as u64;

	required.clamp(1, tokens.max(1) as u64)
}

fn outline_condition(outline: &str) -> Condition {
	match outline.trim().strip_suffix('*') {
		Some(prefix) => Condition::matches("outline_paths", prefix.trim_end_matches('/').to_string()),
		None => Condition::matches("outlines", outline.trim().to_string()),
	}
}

fn applied_condition(filter: &SearchFilter, pricelists: &[String]) -> Condition {
	match filter {
		SearchFilter::Attribute(attribute) => Condition::matches(
			filter.index_field(),
			attribute.values.iter().map(|value| value.value.clone()).collect::<Vec<_>>(),
		),
		SearchFilter::Range(_) | SearchFilter::PriceRange(_) => Condition::from(Filter::should(
			bucket_conditions(filter, pricelists).into_iter().map(|(_, condition)| condition),
		)),
	}
}

/// One condition per bucket, keyed by bucket id.
fn bucket_conditions(filter: &SearchFilter, pricelists: &[String]) -> Vec<(String, Condition)> {
	let field = filter.index_field();

	match filter {
		SearchFilter::Attribute(attribute) => attribute
			.values
			.iter()
			.map(|value| (value.id.clone(), Condition::matches(field.clone(), value.value.clone())))
			.collect(),
		SearchFilter::Range(range) => range
			.values
			.iter()
			.map(|value| (value.id.clone(), range_condition(&field, value.lower, value.upper)))
			.collect(),
		SearchFilter::PriceRange(range) => {
			let fields = price_fields(&range.currency, pricelists);

			range
				.values
				.iter()
				.map(|value| (value.id.clone(), price_condition(&fields, value.lower, value.upper)))
				.collect()
		},
	}
}

fn range_condition(field: &str, lower: Option<f64>, upper: Option<f64>) -> Condition {
	Condition::range(field, Range { lt: upper, gt: None, gte: lower, lte: None })
}

/// Matches when the first price field a document carries falls in the range. Each field only
/// counts for documents that have none of the fields ahead of it.
fn price_condition(fields: &[String], lower: Option<f64>, upper: Option<f64>) -> Condition {
	if let [field] = fields {
		return range_condition(field, lower, upper);
	}

	let options = fields.iter().enumerate().map(|(idx, field)| {
		let mut must = vec![range_condition(field, lower, upper)];

		must.extend(fields[..idx].iter().map(|earlier| Condition::is_empty(earlier.clone())));

		Condition::from(Filter::must(must))
	});

	Condition::from(Filter::should(options))
}

fn timestamp(instant: OffsetDateTime) -> Timestamp {
	Timestamp { seconds: instant.unix_timestamp(), nanos: instant.nanosecond() as i32 }
}

fn into_reference(point: ScoredPoint) -> Option<DocumentReference> {
	let mut payload = point.payload;
	let id = match payload.remove(ID_FIELD).and_then(|value| value.kind) {
		Some(Kind::StringValue(id)) if !id.is_empty() => id,
		_ => {
			tracing::warn!(point_id = ?point.id, "Index point has no document id. Skipping.");

			return None;
		},
	};

	Some(DocumentReference { id, fields: payload_to_json(payload) })
}

fn payload_to_json(payload: HashMap<String, Value>) -> Map<String, JsonValue> {
	payload.into_iter().map(|(key, value)| (key, value_to_json(value))).collect()
}

fn value_to_json(value: Value) -> JsonValue {
	match value.kind {
		None | Some(Kind::NullValue(_)) => JsonValue::Null,
		Some(Kind::BoolValue(flag)) => JsonValue::Bool(flag),
		Some(Kind::IntegerValue(number)) => JsonValue::from(number),
		Some(Kind::DoubleValue(number)) =>
			Number::from_f64(number).map(JsonValue::Number).unwrap_or(JsonValue::Null),
		Some(Kind::StringValue(text)) => JsonValue::String(text),
		Some(Kind::ListValue(list)) =>
			JsonValue::Array(list.values.into_iter().map(value_to_json).collect()),
		Some(Kind::StructValue(object)) => JsonValue::Object(payload_to_json(object.fields)),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use sift_domain::{
		AttributeFilter, AttributeFilterValue, PriceRangeFilter, RangeFilter, RangeFilterValue,
	};

	fn color(values: &[&str]) -> SearchFilter {
		SearchFilter::Attribute(AttributeFilter {
			key: "Color".to_string(),
			values: values
				.iter()
				.map(|value| AttributeFilterValue { id: value.to_string(), value: value.to_string() })
				.collect(),
		})
	}

	#[test]
	fn required_tokens_rounds_up_and_stays_in_bounds() {
		assert_eq!(required_tokens(3, 0.7), 3);
		assert_eq!(required_tokens(4, 0.5), 2);
		assert_eq!(required_tokens(5, 0.0), 1);
		assert_eq!(required_tokens(2, 1.0), 2);
		assert_eq!(required_tokens(0, 0.7), 1);
	}

	#[test]
	fn default_filter_only_hides_invisible_documents() {
		let filter = build_filter(&SearchCriteria::products(), []);

		assert_eq!(filter.must.len(), 1);
		assert!(filter.must_not.is_empty());
		assert!(filter.min_should.is_none());
	}

	#[test]
	fn fuzzy_keyword_uses_min_should() {
		let criteria = SearchCriteria::products().with_keyword("red wool coat").with_fuzzy(0.6);
		let filter = build_filter(&criteria, []);
		let min_should = filter.min_should.expect("Expected min_should for fuzzy keyword.");

		assert_eq!(min_should.conditions.len(), 3);
		assert_eq!(min_should.min_count, 2);
	}

	#[test]
	fn exact_keyword_is_a_must_condition() {
		let criteria = SearchCriteria::products().with_keyword("coat").with_hidden(true);
		let filter = build_filter(&criteria, []);

		assert_eq!(filter.must.len(), 1);
		assert!(filter.min_should.is_none());
	}

	#[test]
	fn visibility_window_excludes_outside_dates() {
		let criteria = SearchCriteria::products()
			.with_hidden(true)
			.visible_at(time::macros::datetime!(2024-01-01 0:00 UTC));
		let filter = build_filter(&criteria, []);

		assert!(filter.must.is_empty());
		assert_eq!(filter.must_not.len(), 2);
	}

	#[test]
	fn applied_filters_add_one_condition_each() {
		let size = SearchFilter::Range(RangeFilter {
			key: "size".to_string(),
			values: vec![
				RangeFilterValue { id: "s".to_string(), lower: None, upper: Some(5.0) },
				RangeFilterValue { id: "m".to_string(), lower: Some(5.0), upper: Some(10.0) },
			],
		});
		let criteria = SearchCriteria::products()
			.with_hidden(true)
			.with_catalog("goods")
			.apply(color(&["red"]))
			.apply(size)
			.apply(color(&[]));
		let filter = build_filter(&criteria, criteria.applied_filters.iter());

		assert_eq!(filter.must.len(), 3);
	}

	#[test]
	fn order_by_skips_unsortable_fields_and_resolves_price_currency() {
		let index = QdrantIndex {
			client: Qdrant::from_url("http://127.0.0.1:6334").build().expect("Expected a client."),
			product_collection: "products".to_string(),
			category_collection: "categories".to_string(),
			timeout: Duration::from_millis(100),
			sortable_fields: vec!["name".to_string(), "price_usd".to_string()],
		};
		let criteria = SearchCriteria::products()
			.with_currency("USD")
			.with_sort(sift_domain::SortField::descending("popularity"))
			.with_sort(sift_domain::SortField::descending("Price"));
		let order = index.order_by(&criteria).expect("Expected an order.");

		assert_eq!(order.key, "price_usd");
		assert_eq!(order.direction, Some(Direction::Desc as i32));
		assert!(index.order_by(&SearchCriteria::products()).is_none());
	}

	#[test]
	fn order_by_price_follows_pricelist_priority() {
		let index = QdrantIndex {
			client: Qdrant::from_url("http://127.0.0.1:6334").build().expect("Expected a client."),
			product_collection: "products".to_string(),
			category_collection: "categories".to_string(),
			timeout: Duration::from_millis(100),
			sortable_fields: vec!["price_usd_default".to_string(), "price_usd_sale".to_string()],
		};
		let criteria = SearchCriteria::products()
			.with_currency("usd")
			.with_pricelists(["sale", "default"])
			.with_sort(sift_domain::SortField::ascending("price"));
		let order = index.order_by(&criteria).expect("Expected an order.");

		assert_eq!(order.key, "price_usd_sale");
	}

	#[test]
	fn price_range_honors_pricelist_priority() {
		let price = SearchFilter::PriceRange(PriceRangeFilter {
			currency: "USD".to_string(),
			values: vec![RangeFilterValue {
				id: "0_to_100".to_string(),
				lower: Some(0.0),
				upper: Some(100.0),
			}],
		});
		let sale_first = SearchCriteria::products()
			.with_hidden(true)
			.with_pricelists(["sale", "default"])
			.apply(price.clone());
		let default_first = SearchCriteria::products()
			.with_hidden(true)
			.with_pricelists(["default", "sale"])
			.apply(price);
		let sale_filter = build_filter(&sale_first, sale_first.applied_filters.iter());
		let default_filter = build_filter(&default_first, default_first.applied_filters.iter());

		assert_ne!(sale_filter, default_filter);

		let expected = Condition::from(Filter::should([
			Condition::from(Filter::must([range_condition(
				"price_usd_sale",
				Some(0.0),
				Some(100.0),
			)])),
			Condition::from(Filter::must([
				range_condition("price_usd_default", Some(0.0), Some(100.0)),
				Condition::is_empty("price_usd_sale"),
			])),
		]));

		assert_eq!(sale_filter.must, vec![Condition::from(Filter::should([expected]))]);
	}

	#[test]
	fn price_range_without_pricelists_targets_the_currency_field() {
		let price = SearchFilter::PriceRange(PriceRangeFilter {
			currency: "usd".to_string(),
			values: vec![RangeFilterValue { id: "cheap".to_string(), lower: None, upper: Some(10.0) }],
		});
		let buckets = bucket_conditions(&price, &[]);

		assert_eq!(
			buckets,
			vec![("cheap".to_string(), range_condition("price_usd", None, Some(10.0)))]
		);
	}

	#[test]
	fn bucket_conditions_are_keyed_by_bucket_id() {
		let buckets = bucket_conditions(&color(&["red", "black"]), &[]);
		let keys: Vec<&str> = buckets.iter().map(|(key, _)| key.as_str()).collect();

		assert_eq!(keys, vec!["red", "black"]);
	}

	#[test]
	fn payload_values_convert_to_json() {
		let mut payload = HashMap::new();

		payload.insert("name".to_string(), Value::from("Coat".to_string()));
		payload.insert("price_usd".to_string(), Value::from(12.5_f64));
		payload.insert("visible".to_string(), Value::from(true));

		let json = payload_to_json(payload);

		assert_eq!(json["name"], "Coat");
		assert_eq!(json["price_usd"], 12.5);
		assert_eq!(json["visible"], true);
	}
}
