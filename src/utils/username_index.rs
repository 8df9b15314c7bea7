use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, info};

use crate::error::AppResult;
use crate::repository::UserRepository;
use crate::utils::{username_cache::UsernameCache, username_filter::UsernameFilter};

/// Username availability lookup: cuckoo filter first, then the cache of
/// recently seen names, then the database.
#[derive(Default)]
pub struct UsernameIndex {
    filter: UsernameFilter,
    cache: UsernameCache,
    // The filter can only answer "definitely free" once it holds every name.
    filter_ready: AtomicBool,
}

impl UsernameIndex {
    pub async fn is_taken(&self, users: &dyn UserRepository, username: &str) -> AppResult<bool> {
        if self.filter_ready.load(Ordering::Acquire) && !self.filter.might_exist(username) {
            debug!("Username rejected by filter");
            return Ok(false);
        }

        if self.cache.is_taken(username).await {
            debug!("Username found in cache");
            return Ok(true);
        }

        let taken = users.username_exists(username).await?;
        if taken {
            self.cache.mark_taken(username).await;
        }
        Ok(taken)
    }

    pub async fn mark_taken(&self, username: &str) {
        self.filter.insert(username);
        self.cache.mark_taken(username).await;
    }

    pub async fn forget(&self, username: &str) {
        self.filter.remove(username);
        self.cache.forget(username).await;
    }

    /// Loads every username into the filter, then enables filter misses.
    pub async fn warmup_filter(
        &self,
        users: &dyn UserRepository,
        batch_size: usize,
    ) -> AppResult<usize> {
        let usernames = users.usernames(None).await?;

        for batch in usernames.chunks(batch_size.max(1)) {
            self.filter.insert_batch(batch);
        }
        self.filter_ready.store(true, Ordering::Release);

        info!(total = usernames.len(), "Username filter warmup complete");
        Ok(usernames.len())
    }

    /// Load only RECENT usernames into the cache (batched)
    pub async fn warmup_cache(
        &self,
        users: &dyn UserRepository,
        days: u32,
        batch_size: usize,
    ) -> AppResult<usize> {
        let usernames = users.usernames(Some(days)).await?;

        for batch in usernames.chunks(batch_size.max(1)) {
            self.cache.batch_mark(batch).await;
        }

        info!(
            total = usernames.len(),
            days, "Username cache warmup complete"
        );
        Ok(usernames.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::InMemoryStore;

    #[actix_web::test]
    async fn lookups_fall_through_to_the_database() {
        let store = InMemoryStore::default();
        store.seed_user("alice", crate::model::role::Role::Employee);
        let index = UsernameIndex::default();

        assert!(index.is_taken(&store, "alice").await.unwrap());
        assert!(!index.is_taken(&store, "bob").await.unwrap());
    }

    #[actix_web::test]
    async fn warmed_filter_answers_misses_without_the_database() {
        let store = InMemoryStore::default();
        store.seed_user("alice", crate::model::role::Role::Employee);
        let index = UsernameIndex::default();

        assert_eq!(index.warmup_filter(&store, 10).await.unwrap(), 1);
        store.fail_next_queries(true);

        assert!(!index.is_taken(&store, "bob").await.unwrap());
    }

    #[actix_web::test]
    async fn forgotten_names_become_available() {
        let store = InMemoryStore::default();
        let index = UsernameIndex::default();
        index.warmup_filter(&store, 10).await.unwrap();

        index.mark_taken("carol").await;
        assert!(index.is_taken(&store, "carol").await.unwrap());

        index.forget("carol").await;
        assert!(!index.is_taken(&store, "carol").await.unwrap());
    }
}
