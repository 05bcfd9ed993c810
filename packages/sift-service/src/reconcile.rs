//! Bounded widening of index pages until the store fills them.
//!
//! The index may reference ids the store no longer resolves (deleted, hidden, or out of scope).
//! Each attempt re-queries the index from the caller's offset with the limit grown by the
//! previous shortfall, hydrates only ids not seen before, and appends them in index rank order.
//! The loop stops when an attempt has no shortfall, when the index has nothing new, when the
//! widened window covers every index match, or when the retry budget is spent.

use std::collections::{HashMap, HashSet};

use sift_domain::{
	Aggregation, CatalogEntity, IndexQueryResult, ResponseGroup, SearchCriteria,
	format_aggregations,
};

use crate::{Error, IndexClient, Result, StoreHydrator};

pub const DEFAULT_MAX_RETRIES: u32 = 3;

#[derive(Clone, Debug, PartialEq)]
pub struct ReconciledPage<E> {
	/// Hydrated entities in index rank order, without duplicates.
	pub entities: Vec<E>,
	pub resolved_count: usize,
	/// Total reported by the last index query. It can exceed what the store resolves.
	pub index_total_count: u64,
	pub aggregations: Vec<Aggregation>,
	/// Index queries issued.
	pub attempts: u32,
}

pub struct Reconciler<'a, E>
where
	E: CatalogEntity,
{
	index: &'a dyn IndexClient,
	store: &'a dyn StoreHydrator<E>,
	max_retries: u32,
}
impl<'a, E> Reconciler<'a, E>
where
	E: CatalogEntity,
{
	pub fn new(index: &'a dyn IndexClient, store: &'a dyn StoreHydrator<E>) -> Self {
		Self { index, store, max_retries: DEFAULT_MAX_RETRIES }
	}

	pub fn with_max_retries(mut self, max_retries: u32) -> Self {
		self.max_retries = max_retries;

		self
	}

	pub async fn reconcile(
		&self,
		criteria: &SearchCriteria,
		shape: ResponseGroup,
	) -> Result<ReconciledPage<E>> {
		if criteria.document_type != E::KIND {
			return Err(Error::InvalidRequest {
				message: format!(
					"Criteria for {} documents cannot be reconciled as {}.",
					criteria.document_type.as_str(),
					E::KIND.as_str()
				),
			});
		}

		// The window grows across attempts. The caller's criteria stay untouched.
		let mut working = criteria.clone();
		let mut ranks: HashMap<String, usize> = HashMap::new();
		let mut entities: Vec<E> = Vec::new();
		let mut last = IndexQueryResult::default();
		let mut attempts = 0_u32;

		loop {
			let result = self.index.query(E::KIND, &working).await?;

			attempts += 1;
			last.total_count = result.total_count;
			last.facets = result.facets;

			if result.documents.is_empty() {
				tracing::debug!(attempt = attempts, "Index returned no documents.");

				break;
			}

			let mut new_ids = Vec::new();

			for document in result.documents {
				if ranks.contains_key(&document.id) {
					continue;
				}

				ranks.insert(document.id.clone(), ranks.len());
				new_ids.push(document.id);
			}

			let found = new_ids.len();

			if found == 0 {
				tracing::debug!(attempt = attempts, "Index returned no new documents.");

				break;
			}

			let hydrated = self.store.get_by_ids(&new_ids, shape, working.scope_hint()).await?;
			let mut resolved = accept_requested(hydrated, &new_ids);

			resolved.sort_by_key(|entity| ranks.get(entity.id()).copied().unwrap_or(usize::MAX));

			let resolved_count = resolved.len();

			entities.extend(resolved);

			if found > resolved_count {
				let shortfall = (found - resolved_count) as u64;

				working.window.limit = working.window.limit.saturating_add(shortfall);

				tracing::info!(
					kind = E::KIND.as_str(),
					attempt = attempts,
					found,
					resolved = resolved_count,
					shortfall,
					"Index references ids the store cannot resolve. Widening the window."
				);
			}

			tracing::debug!(
				kind = E::KIND.as_str(),
				attempt = attempts,
				working_limit = working.window.limit,
				found,
				resolved = resolved_count,
				total = last.total_count,
				"Reconcile attempt completed."
			);

			if found <= resolved_count
				|| attempts > self.max_retries
				|| working.window.end() >= last.total_count
			{
				break;
			}
		}

		Ok(ReconciledPage {
			resolved_count: entities.len(),
			entities,
			index_total_count: last.total_count,
			aggregations: format_aggregations(&last.facets),
			attempts,
		})
	}
}

/// Keeps the first entity for each requested id. Anything else a hydrator returns is dropped so it
/// cannot break rank order or the no-duplicates guarantee.
fn accept_requested<E>(hydrated: Vec<E>, requested: &[String]) -> Vec<E>
where
	E: CatalogEntity,
{
	let mut pending: HashSet<&str> = requested.iter().map(String::as_str).collect();
	let mut accepted = Vec::with_capacity(hydrated.len());

	for entity in hydrated {
		if pending.remove(entity.id()) {
			accepted.push(entity);
		} else {
			tracing::warn!(
				kind = E::KIND.as_str(),
				id = entity.id(),
				"Store returned an entity that was not requested or was already returned. Dropping it."
			);
		}
	}

	accepted
}
