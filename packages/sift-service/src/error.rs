pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Index error: {message}")]
	Index { message: String },
	#[error("Storage error: {message}")]
	Storage { message: String },
	#[error("Projection error: {message}")]
	Projection { message: String },
}
impl From<sift_domain::CriteriaError> for Error {
	fn from(err: sift_domain::CriteriaError) -> Self {
		Self::InvalidRequest { message: err.to_string() }
	}
}

impl From<sift_storage::Error> for Error {
	fn from(err: sift_storage::Error) -> Self {
		match err {
			sift_storage::Error::Sqlx(inner) => Self::Storage { message: inner.to_string() },
			sift_storage::Error::InvalidArgument(message) => Self::InvalidRequest { message },
			sift_storage::Error::Timeout { .. } => Self::Index { message: err.to_string() },
			sift_storage::Error::Qdrant(inner) => Self::Index { message: inner.to_string() },
		}
	}
}
