//! Immutable description of one catalog search request.
//!
//! A [`SearchCriteria`] is built by the caller and read by the index client and the reconciliation
//! engine. The engine clones it on entry before widening the page window, so a caller's value is
//! never mutated by a search.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::CriteriaError;

pub const MAX_KEYWORD_CHARS: usize = 256;
pub const DEFAULT_FUZZY_MIN_SIMILARITY: f32 = 0.7;
pub const PRICE_FACET_FIELD: &str = "price";

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
	Product,
	Category,
}
impl DocumentType {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Product => "product",
			Self::Category => "category",
		}
	}
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct PageWindow {
	pub offset: u64,
	pub limit: u64,
}
impl PageWindow {
	pub fn new(offset: u64, limit: u64) -> Self {
		Self { offset, limit }
	}

	/// Exclusive end of the window, saturating at `u64::MAX`.
	pub fn end(self) -> u64 {
		self.offset.saturating_add(self.limit)
	}
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct SortField {
	pub field: String,
	#[serde(default)]
	pub descending: bool,
}
impl SortField {
	pub fn ascending(field: impl Into<String>) -> Self {
		Self { field: field.into(), descending: false }
	}

	pub fn descending(field: impl Into<String>) -> Self {
		Self { field: field.into(), descending: true }
	}

	/// Parses `name`, `name asc`, or `name desc`. Returns `None` for blank input or an unknown
	/// direction keyword.
	pub fn parse(raw: &str) -> Option<Self> {
		let mut parts = raw.split_whitespace();
		let field = parts.next()?;
		let descending = match parts.next().map(str::to_ascii_lowercase).as_deref() {
			None | Some("asc") => false,
			Some("desc") => true,
			Some(_) => return None,
		};

		if parts.next().is_some() {
			return None;
		}

		Some(Self { field: field.to_string(), descending })
	}
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
pub struct FuzzyMatch {
	pub enabled: bool,
	pub min_similarity: f32,
}
impl Default for FuzzyMatch {
	fn default() -> Self {
		Self { enabled: false, min_similarity: DEFAULT_FUZZY_MIN_SIMILARITY }
	}
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct AttributeFilterValue {
	pub id: String,
	pub value: String,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct AttributeFilter {
	pub key: String,
	#[serde(default)]
	pub values: Vec<AttributeFilterValue>,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct RangeFilterValue {
	pub id: String,
	pub lower: Option<f64>,
	pub upper: Option<f64>,
}
impl RangeFilterValue {
	/// Lower bound is inclusive, upper bound is exclusive.
	pub fn contains(&self, value: f64) -> bool {
		self.lower.map(|lower| value >= lower).unwrap_or(true)
			&& self.upper.map(|upper| value < upper).unwrap_or(true)
	}
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct RangeFilter {
	pub key: String,
	#[serde(default)]
	pub values: Vec<RangeFilterValue>,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct PriceRangeFilter {
	pub currency: String,
	#[serde(default)]
	pub values: Vec<RangeFilterValue>,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SearchFilter {
	Attribute(AttributeFilter),
	Range(RangeFilter),
	PriceRange(PriceRangeFilter),
}
impl SearchFilter {
	/// Name the facet is reported under. Field names compare case-insensitively.
	pub fn facet_name(&self) -> &str {
		match self {
			Self::Attribute(filter) => filter.key.as_str(),
			Self::Range(filter) => filter.key.as_str(),
			Self::PriceRange(_) => PRICE_FACET_FIELD,
		}
	}

	/// Index field the filter targets.
	pub fn index_field(&self) -> String {
		match self {
			Self::Attribute(filter) => filter.key.to_lowercase(),
			Self::Range(filter) => filter.key.to_lowercase(),
			Self::PriceRange(filter) => price_field(&filter.currency),
		}
	}

	pub fn bucket_ids(&self) -> Vec<&str> {
		match self {
			Self::Attribute(filter) => filter.values.iter().map(|value| value.id.as_str()).collect(),
			Self::Range(filter) => filter.values.iter().map(|value| value.id.as_str()).collect(),
			Self::PriceRange(filter) => filter.values.iter().map(|value| value.id.as_str()).collect(),
		}
	}

	pub fn is_empty(&self) -> bool {
		match self {
			Self::Attribute(filter) => filter.values.is_empty(),
			Self::Range(filter) => filter.values.is_empty(),
			Self::PriceRange(filter) => filter.values.is_empty(),
		}
	}

	pub fn same_field(&self, other: &Self) -> bool {
		self.index_field() == other.index_field()
	}
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct SearchCriteria {
	pub document_type: DocumentType,
	pub keyword: Option<String>,
	/// Catalog the caller browses. Also narrows store hydration.
	pub catalog_id: Option<String>,
	/// Category path prefixes. A trailing `*` matches every descendant path.
	pub outlines: Vec<String>,
	pub window: PageWindow,
	pub sort: Vec<SortField>,
	/// Facets to count.
	pub declared_filters: Vec<SearchFilter>,
	/// Filters restricting the result set.
	pub applied_filters: Vec<SearchFilter>,
	pub currency: Option<String>,
	pub pricelists: Vec<String>,
	pub fuzzy: FuzzyMatch,
	pub with_hidden: bool,
	#[serde(default, with = "crate::time_serde::option")]
	pub visible_at: Option<OffsetDateTime>,
}
impl SearchCriteria {
	pub fn new(document_type: DocumentType) -> Self {
		Self {
			document_type,
			keyword: None,
			catalog_id: None,
			outlines: Vec::new(),
			window: PageWindow::default(),
			sort: Vec::new(),
			declared_filters: Vec::new(),
			applied_filters: Vec::new(),
			currency: None,
			pricelists: Vec::new(),
			fuzzy: FuzzyMatch::default(),
			with_hidden: false,
			visible_at: None,
		}
	}

	pub fn products() -> Self {
		Self::new(DocumentType::Product)
	}

	pub fn categories() -> Self {
		Self::new(DocumentType::Category)
	}

	pub fn with_keyword(mut self, keyword: impl Into<String>) -> Self {
		let keyword = keyword.into();

		self.keyword = if keyword.trim().is_empty() { None } else { Some(keyword) };

		self
	}

	pub fn with_catalog(mut self, catalog_id: impl Into<String>) -> Self {
		self.catalog_id = Some(catalog_id.into());

		self
	}

	pub fn with_outline(mut self, outline: impl Into<String>) -> Self {
		self.outlines.push(outline.into());

		self
	}

	pub fn with_window(mut self, offset: u64, limit: u64) -> Self {
		self.window = PageWindow::new(offset, limit);

		self
	}

	pub fn with_sort(mut self, sort: SortField) -> Self {
		self.sort.push(sort);

		self
	}

	pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
		self.currency = Some(currency.into());

		self
	}

	pub fn with_pricelists<I, S>(mut self, pricelists: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.pricelists = pricelists.into_iter().map(Into::into).collect();

		self
	}

	pub fn with_fuzzy(mut self, min_similarity: f32) -> Self {
		self.fuzzy = FuzzyMatch { enabled: true, min_similarity };

		self
	}

	pub fn with_hidden(mut self, with_hidden: bool) -> Self {
		self.with_hidden = with_hidden;

		self
	}

	pub fn visible_at(mut self, instant: OffsetDateTime) -> Self {
		self.visible_at = Some(instant);

		self
	}

	/// Declares a facet to count.
	pub fn declare(mut self, filter: SearchFilter) -> Self {
		self.declared_filters.push(filter);

		self
	}

	/// Restricts results to documents matching one of the filter's values.
	pub fn apply(mut self, filter: SearchFilter) -> Self {
		self.applied_filters.push(filter);

		self
	}

	/// Catalog hint passed to store hydration.
	pub fn scope_hint(&self) -> Option<&str> {
		self.catalog_id.as_deref().filter(|catalog| !catalog.trim().is_empty())
	}

	pub fn keyword(&self) -> Option<&str> {
		self.keyword.as_deref().map(str::trim).filter(|keyword| !keyword.is_empty())
	}

	/// Applied filters on other fields than `filter`. Multi-select facets count against these so
	/// that picking one value does not hide its siblings.
	pub fn applied_excluding<'a>(
		&'a self,
		filter: &'a SearchFilter,
	) -> impl Iterator<Item = &'a SearchFilter> + 'a {
		self.applied_filters.iter().filter(move |applied| !applied.same_field(filter))
	}

	pub fn validate(&self, max_limit: u64) -> Result<(), CriteriaError> {
		if self.keyword.as_deref().map(|keyword| keyword.chars().count()).unwrap_or(0)
			> MAX_KEYWORD_CHARS
		{
			return Err(CriteriaError::KeywordTooLong { max: MAX_KEYWORD_CHARS });
		}
		if self.window.limit > max_limit {
			return Err(CriteriaError::LimitTooLarge { limit: self.window.limit, max: max_limit });
		}
		if !self.fuzzy.min_similarity.is_finite()
			|| !(0.0..=1.0).contains(&self.fuzzy.min_similarity)
		{
			return Err(CriteriaError::InvalidFuzzySimilarity);
		}

		for filter in self.declared_filters.iter().chain(self.applied_filters.iter()) {
			match filter {
				SearchFilter::Attribute(AttributeFilter { key, .. })
				| SearchFilter::Range(RangeFilter { key, .. }) =>
					if key.trim().is_empty() {
						return Err(CriteriaError::BlankFilterKey);
					},
				SearchFilter::PriceRange(PriceRangeFilter { currency, .. }) =>
					if currency.trim().is_empty() {
						return Err(CriteriaError::MissingCurrency);
					},
			}
		}

		Ok(())
	}
}

pub fn price_field(currency: &str) -> String {
	format!("price_{}", currency.trim().to_lowercase())
}

/// Index fields holding a price in `currency`, highest priority first.
///
/// Each pricelist has its own `price_<currency>_<pricelist>` field and a document's price is read
/// from the first of them it carries. With no pricelists the single `price_<currency>` field is used.
pub fn price_fields(currency: &str, pricelists: &[String]) -> Vec<String> {
	let base = price_field(currency);
	let mut fields = Vec::with_capacity(pricelists.len());

	for pricelist in pricelists.iter().map(|name| name.trim().to_lowercase()) {
		let field = format!("{base}_{pricelist}");

		if !pricelist.is_empty() && !fields.contains(&field) {
			fields.push(field);
		}
	}

	if fields.is_empty() { vec![base] } else { fields }
}
