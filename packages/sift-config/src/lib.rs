mod error;
mod types;

pub use error::{Error, Result};
pub use types::{Assets, Config, Postgres, Qdrant, Reconcile, Search, Service, Storage};

use std::{fs, path::Path};

pub const MAX_RECONCILE_RETRIES: u32 = 10;

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;
	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(invalid("service.http_bind", "must be non-empty."));
	}
	if cfg.storage.postgres.dsn.trim().is_empty() {
		return Err(invalid("storage.postgres.dsn", "must be non-empty."));
	}
	if cfg.storage.postgres.pool_max_conns == 0 {
		return Err(invalid("storage.postgres.pool_max_conns", "must be greater than zero."));
	}

	let qdrant = &cfg.storage.qdrant;

	if qdrant.url.trim().is_empty() {
		return Err(invalid("storage.qdrant.url", "must be non-empty."));
	}

	for (label, value) in [
		("storage.qdrant.product_collection", &qdrant.product_collection),
		("storage.qdrant.category_collection", &qdrant.category_collection),
	] {
		if value.trim().is_empty() {
			return Err(invalid(label, "must be non-empty."));
		}
	}

	if qdrant.product_collection == qdrant.category_collection {
		return Err(invalid(
			"storage.qdrant.product_collection",
			"and storage.qdrant.category_collection must differ.",
		));
	}
	if qdrant.timeout_ms == 0 {
		return Err(invalid("storage.qdrant.timeout_ms", "must be greater than zero."));
	}
	if cfg.reconcile.max_retries > MAX_RECONCILE_RETRIES {
		return Err(invalid(
			"reconcile.max_retries",
			format!("must be {MAX_RECONCILE_RETRIES} or less."),
		));
	}
	if !matches!(cfg.search.strategy.as_str(), "indexed" | "direct") {
		return Err(invalid("search.strategy", "must be one of indexed or direct."));
	}
	if !cfg.search.fuzzy_min_similarity.is_finite() {
		return Err(invalid("search.fuzzy_min_similarity", "must be a finite number."));
	}
	if !(0.0..=1.0).contains(&cfg.search.fuzzy_min_similarity) {
		return Err(invalid("search.fuzzy_min_similarity", "must be in the range 0.0-1.0."));
	}
	if cfg.search.default_limit == 0 {
		return Err(invalid("search.default_limit", "must be greater than zero."));
	}
	if cfg.search.max_limit < cfg.search.default_limit {
		return Err(invalid(
			"search.max_limit",
			"must be greater than or equal to search.default_limit.",
		));
	}
	if cfg.assets.base_url.trim().is_empty() {
		return Err(invalid("assets.base_url", "must be non-empty."));
	}

	Ok(())
}

fn invalid(field: &'static str, rule: impl Into<String>) -> Error {
	Error::Validation { field, rule: rule.into() }
}

fn normalize(cfg: &mut Config) {
	let mut sortable = Vec::with_capacity(cfg.search.sortable_fields.len());

	for field in cfg.search.sortable_fields.drain(..) {
		let field = field.trim().to_lowercase();

		if field.is_empty() || sortable.contains(&field) {
			continue;
		}

		sortable.push(field);
	}

	cfg.search.sortable_fields = sortable;
	cfg.search.strategy = cfg.search.strategy.trim().to_lowercase();

	let trimmed = cfg.assets.base_url.trim().trim_end_matches('/').to_string();

	cfg.assets.base_url = trimmed;
}
