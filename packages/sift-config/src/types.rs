use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	#[serde(default)]
	pub reconcile: Reconcile,
	pub search: Search,
	pub assets: Assets,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub log_level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
	pub qdrant: Qdrant,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Qdrant {
	pub url: String,
	pub product_collection: String,
	pub category_collection: String,
	/// Per-call transport timeout. Applies to every index request, not to a whole reconciliation.
	#[serde(default = "default_qdrant_timeout_ms")]
	pub timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Reconcile {
	/// Widening attempts after the initial index query.
	#[serde(default = "default_max_retries")]
	pub max_retries: u32,
	/// Worker count for result projection. Zero means the host's available parallelism.
	#[serde(default)]
	pub projection_concurrency: usize,
}
impl Default for Reconcile {
	fn default() -> Self {
		Self { max_retries: default_max_retries(), projection_concurrency: 0 }
	}
}

#[derive(Debug, Clone, Deserialize)]
pub struct Search {
	/// Either "indexed" or "direct".
	#[serde(default = "default_strategy")]
	pub strategy: String,
	/// Payload fields with a numeric or datetime index, which the index can order by. Sorting on any
	/// other field is a no-op.
	#[serde(default)]
	pub sortable_fields: Vec<String>,
	#[serde(default = "default_fuzzy_min_similarity")]
	pub fuzzy_min_similarity: f32,
	#[serde(default = "default_limit")]
	pub default_limit: u32,
	#[serde(default = "default_max_limit")]
	pub max_limit: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Assets {
	pub base_url: String,
}

fn default_qdrant_timeout_ms() -> u64 {
	5_000
}

fn default_max_retries() -> u32 {
	3
}

fn default_strategy() -> String {
	"indexed".to_string()
}

fn default_fuzzy_min_similarity() -> f32 {
	0.7
}

fn default_limit() -> u32 {
	20
}

fn default_max_limit() -> u32 {
	200
}
