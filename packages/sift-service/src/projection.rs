//! Parallel mapping of hydrated entities into views.
//!
//! Workers claim input positions from a shared counter and write each result into the slot for
//! that position, so the output is in input order without a re-sort. Reconciled pages are already
//! in index rank order, which makes position and rank the same thing here.

use std::{
	num::NonZeroUsize,
	sync::{
		OnceLock,
		atomic::{AtomicUsize, Ordering},
	},
	thread,
};

/// Worker count for a configured width. Zero means the host's available parallelism.
pub fn effective_width(configured: usize) -> usize {
	if configured > 0 {
		return configured;
	}

	thread::available_parallelism().map(NonZeroUsize::get).unwrap_or(1)
}

/// Maps every item with at most `width` scoped workers. Output order always equals input order.
pub fn project<T, V, F>(items: &[T], width: usize, map: F) -> Vec<V>
where
	T: Sync,
	V: Send + Sync,
	F: Fn(&T) -> V + Sync,
{
	let width = width.clamp(1, items.len().max(1));

	if width == 1 {
		return items.iter().map(map).collect();
	}

	let slots: Vec<OnceLock<V>> = items.iter().map(|_| OnceLock::new()).collect();
	let next = AtomicUsize::new(0);

	thread::scope(|scope| {
		for _ in 0..width {
			scope.spawn(|| {
				loop {
					let position = next.fetch_add(1, Ordering::Relaxed);
					let Some(item) = items.get(position) else {
						break;
					};
					let _ = slots[position].set(map(item));
				}
			});
		}
	});

	// Every position below `items.len()` was claimed exactly once, so every slot is filled.
	slots.into_iter().filter_map(OnceLock::into_inner).collect()
}
