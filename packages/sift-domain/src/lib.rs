pub mod aggregation;
pub mod criteria;
pub mod entity;
pub mod error;
pub mod index;
pub mod shape;
pub mod time_serde;

pub use aggregation::{Aggregation, AggregationItem, find_aggregation, format_aggregations};
pub use criteria::{
	AttributeFilter, AttributeFilterValue, DocumentType, FuzzyMatch, PageWindow,
	PriceRangeFilter, RangeFilter, RangeFilterValue, SearchCriteria, SearchFilter, SortField,
};
pub use entity::{CatalogEntity, Category, Product};
pub use error::CriteriaError;
pub use index::{DocumentReference, FacetBucket, FacetGroup, IndexQueryResult, RawFacets};
pub use shape::ResponseGroup;
