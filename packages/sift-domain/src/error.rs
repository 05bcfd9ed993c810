#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CriteriaError {
	#[error("keyword must be at most {max} characters.")]
	KeywordTooLong { max: usize },
	#[error("limit {limit} exceeds the maximum of {max}.")]
	LimitTooLarge { limit: u64, max: u64 },
	#[error("price range filters require a currency.")]
	MissingCurrency,
	#[error("filter keys must be non-empty.")]
	BlankFilterKey,
	#[error("fuzzy min_similarity must be in the range 0.0-1.0.")]
	InvalidFuzzySimilarity,
	#[error("unknown response group {name:?}.")]
	UnknownResponseGroup { name: String },
}
