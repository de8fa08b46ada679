//! Cached reads and their invalidation after a commit.

use std::{collections::HashMap, fmt, future::Future, sync::Arc};

use serde::{Serialize, de::DeserializeOwned};
use tokio::sync::Mutex;

/// Key of a cached read view.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// Balance and details of one account.
    Account(String),
    /// Transaction list of one account.
    Transactions(String),
    /// The list of bills to pay.
    Bills,
    Bill(String),
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Account(id) => write!(f, "account:{id}"),
            Self::Transactions(id) => write!(f, "transactions:{id}"),
            Self::Bills => f.write_str("bills"),
            Self::Bill(id) => write!(f, "bill:{id}"),
        }
    }
}

/// Anything holding cached reads that a commit can make stale.
pub trait CacheInvalidator: Send + Sync {
    fn invalidate(&self, keys: &[CacheKey]) -> impl Future<Output = ()> + Send;
}

/// In-memory query cache, shared by cloning.
#[derive(Clone, Default)]
pub struct QueryCache {
    inner: Arc<Mutex<Entries>>,
}

#[derive(Default)]
struct Entries {
    values: HashMap<CacheKey, serde_json::Value>,
    /// Bumped on every invalidation of a key; a fetch started under an older
    /// generation must not be stored.
    generations: HashMap<CacheKey, u64>,
}

impl Entries {
    fn generation(&self, key: &CacheKey) -> u64 {
        self.generations.get(key).copied().unwrap_or_default()
    }
}

impl QueryCache {
    pub async fn get<T: DeserializeOwned>(&self, key: &CacheKey) -> Option<T> {
        let guard = self.inner.lock().await;
        decode(key, guard.values.get(key)?)
    }

    pub async fn insert<T: Serialize>(&self, key: CacheKey, value: &T) -> Result<(), serde_json::Error> {
        let value = serde_json::to_value(value)?;
        self.inner.lock().await.values.insert(key, value);
        Ok(())
    }

    pub async fn contains(&self, key: &CacheKey) -> bool {
        self.inner.lock().await.values.contains_key(key)
    }

    /// Serve `key` from the cache, or run `fetch` and remember its result.
    ///
    /// Errors from `fetch` are returned and nothing is cached. A result is
    /// returned but not cached if `key` was invalidated while it was fetched.
    pub async fn get_or_fetch<T, E, F, Fut>(&self, key: CacheKey, fetch: F) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let generation = {
            let guard = self.inner.lock().await;
            if let Some(hit) = guard.values.get(&key).and_then(|value| decode(&key, value)) {
                tracing::debug!("cache hit for {key}");
                return Ok(hit);
            }
            guard.generation(&key)
        };

        tracing::debug!("cache miss for {key}");
        let value = fetch().await?;
        let encoded = match serde_json::to_value(&value) {
            Ok(encoded) => encoded,
            Err(err) => {
                tracing::warn!("failed to cache {key}: {err}");
                return Ok(value);
            }
        };

        let mut guard = self.inner.lock().await;
        if guard.generation(&key) == generation {
            guard.values.insert(key, encoded);
        } else {
            tracing::debug!("{key} was invalidated during the fetch, not caching it");
        }
        Ok(value)
    }
}

fn decode<T: DeserializeOwned>(key: &CacheKey, value: &serde_json::Value) -> Option<T> {
    match serde_json::from_value(value.clone()) {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::warn!("cached {key} has an unexpected shape: {err}");
            None
        }
    }
}

impl CacheInvalidator for QueryCache {
    async fn invalidate(&self, keys: &[CacheKey]) {
        let mut guard = self.inner.lock().await;
        for key in keys {
            *guard.generations.entry(key.clone()).or_default() += 1;
            if guard.values.remove(key).is_some() {
                tracing::debug!("invalidated {key}");
            }
        }
    }
}

impl<T: CacheInvalidator> CacheInvalidator for Arc<T> {
    fn invalidate(&self, keys: &[CacheKey]) -> impl Future<Output = ()> + Send {
        (**self).invalidate(keys)
    }
}
