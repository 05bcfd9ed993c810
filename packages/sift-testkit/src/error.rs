pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("SIFT_PG_DSN is not a valid Postgres DSN.")]
	InvalidDsn(#[source] sqlx::Error),
	#[error("No admin database accepted a connection. Last error: {last_error}.")]
	AdminUnavailable { last_error: String },
	#[error("Failed to {action} test database {database}.")]
	Database {
		database: String,
		action: &'static str,
		#[source]
		source: sqlx::Error,
	},
	#[error("Qdrant {operation} on {collection:?} timed out.")]
	QdrantTimeout { operation: &'static str, collection: String },
	#[error(transparent)]
	Sqlx(#[from] sqlx::Error),
	#[error(transparent)]
	Qdrant(#[from] Box<qdrant_client::QdrantError>),
}
impl From<qdrant_client::QdrantError> for Error {
	fn from(err: qdrant_client::QdrantError) -> Self {
		Self::Qdrant(Box::new(err))
	}
}
