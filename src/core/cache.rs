use once_cell::sync::OnceCell;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::models::DerivedSeries;

type Slot = Arc<OnceCell<Arc<DerivedSeries>>>;

/// Write-once memo of derived series keyed by indicator key.
///
/// Each key is computed at most once even under concurrent lookups; later
/// callers share the first result. Entries are never replaced.
#[derive(Debug, Default)]
pub struct SeriesCache {
    slots: RwLock<HashMap<String, Slot>>,
}

impl SeriesCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, key: &str) -> Slot {
        if let Ok(slots) = self.slots.read() {
            if let Some(slot) = slots.get(key) {
                return Arc::clone(slot);
            }
        }
        match self.slots.write() {
            Ok(mut slots) => Arc::clone(slots.entry(key.to_string()).or_default()),
            // A poisoned map still hands out a working cell, just uncached.
            Err(_) => Arc::new(OnceCell::new()),
        }
    }

    pub fn get_or_compute<F>(&self, key: &str, compute: F) -> Arc<DerivedSeries>
    where
        F: FnOnce() -> DerivedSeries,
    {
        let slot = self.slot(key);
        Arc::clone(slot.get_or_init(|| Arc::new(compute())))
    }

    pub fn get(&self, key: &str) -> Option<Arc<DerivedSeries>> {
        let slots = self.slots.read().ok()?;
        slots.get(key)?.get().cloned()
    }

    pub fn len(&self) -> usize {
        self.slots
            .read()
            .map(|slots| slots.values().filter(|s| s.get().is_some()).count())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DataPoint;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    #[test]
    fn test_computes_once_per_key() {
        let cache = SeriesCache::new();
        let calls = AtomicUsize::new(0);
        let compute = || {
            calls.fetch_add(1, Ordering::SeqCst);
            vec![DataPoint::new("2024-01-01", 1.0)]
        };

        let a = cache.get_or_compute("M2_GROWTH", compute);
        let b = cache.get_or_compute("M2_GROWTH", || unreachable!("already cached"));
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
        assert!(cache.get("OTHER").is_none());
    }

    #[test]
    fn test_shared_across_threads() {
        let cache = Arc::new(SeriesCache::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let calls = Arc::clone(&calls);
                thread::spawn(move || {
                    cache
                        .get_or_compute("YIELD_CURVE", || {
                            calls.fetch_add(1, Ordering::SeqCst);
                            vec![DataPoint::new("2024-01-01", 0.5)]
                        })
                        .len()
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), 1);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
