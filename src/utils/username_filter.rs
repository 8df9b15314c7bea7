use std::sync::{PoisonError, RwLock};

use autoscale_cuckoo_filter::CuckooFilter;

/// Expected capacity and false-positive rate.
const FILTER_CAPACITY: usize = 100_000;
const FALSE_POSITIVE_RATE: f64 = 0.001;

#[inline]
pub(crate) fn normalize(username: &str) -> String {
    username.trim().to_lowercase()
}

/// Probabilistic set of every known username. A miss is definite, a hit
/// only means "maybe".
pub struct UsernameFilter {
    inner: RwLock<CuckooFilter<String>>,
}

impl Default for UsernameFilter {
    fn default() -> Self {
        Self::new(FILTER_CAPACITY, FALSE_POSITIVE_RATE)
    }
}

impl UsernameFilter {
    pub fn new(capacity: usize, false_positive_rate: f64) -> Self {
        Self {
            inner: RwLock::new(CuckooFilter::new(capacity, false_positive_rate)),
        }
    }

    /// Check if a username might exist (false positives possible)
    pub fn might_exist(&self, username: &str) -> bool {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&normalize(username))
    }

    pub fn insert(&self, username: &str) {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .add(&normalize(username));
    }

    pub fn remove(&self, username: &str) {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&normalize(username));
    }

    /// Insert a batch under a single write lock.
    pub fn insert_batch(&self, usernames: &[String]) {
        let mut filter = self.inner.write().unwrap_or_else(PoisonError::into_inner);

        for username in usernames {
            filter.add(&normalize(username));
        }
    }
}
