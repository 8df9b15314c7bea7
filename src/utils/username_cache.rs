use std::time::Duration;

use futures::future::join_all;
use moka::future::Cache;

use crate::utils::username_filter::normalize;

const CACHE_CAPACITY: u64 = 500_000;
const CACHE_TTL: Duration = Duration::from_secs(86_400);

/// Exact, bounded cache of usernames known to be taken. Entries expire, so a
/// miss says nothing.
#[derive(Clone)]
pub struct UsernameCache {
    inner: Cache<String, bool>,
}

impl Default for UsernameCache {
    fn default() -> Self {
        Self::new(CACHE_CAPACITY, CACHE_TTL)
    }
}

impl UsernameCache {
    pub fn new(capacity: u64, ttl: Duration) -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(capacity)
                .time_to_live(ttl)
                .build(),
        }
    }

    /// Mark a single username as taken
    pub async fn mark_taken(&self, username: &str) {
        self.inner.insert(normalize(username), true).await;
    }

    pub async fn is_taken(&self, username: &str) -> bool {
        self.inner
            .get(&normalize(username))
            .await
            .unwrap_or(false)
    }

    pub async fn forget(&self, username: &str) {
        self.inner.invalidate(&normalize(username)).await;
    }

    /// Batch mark usernames as taken
    pub async fn batch_mark(&self, usernames: &[String]) {
        let inserts: Vec<_> = usernames
            .iter()
            .map(|u| self.inner.insert(normalize(u), true))
            .collect();

        join_all(inserts).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[actix_web::test]
    async fn marked_names_are_taken_until_forgotten() {
        let cache = UsernameCache::default();
        cache.batch_mark(&["Alice".to_string()]).await;

        assert!(cache.is_taken("alice").await);
        assert!(!cache.is_taken("bob").await);

        cache.forget("ALICE").await;
        assert!(!cache.is_taken("alice").await);
    }
}
