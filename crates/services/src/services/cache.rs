//! TTL cache for expensive read results.
//!
//! Entries are serialized values keyed by the computing function's name plus
//! its arguments, so two calls with the same inputs share one computation
//! until the entry expires. Each entry carries its own TTL, supplied at
//! write time. Writes elsewhere do not invalidate entries; a stale read can
//! last at most the entry's TTL.

use std::{
    collections::HashMap,
    env,
    fmt::Display,
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, warn};

const DEFAULT_TTL_SECS: u64 = 300;

/// Cache key derived from a function name and its arguments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(func: &str, args: &[&dyn Display]) -> Self {
        let mut key = String::from(func);
        for arg in args {
            key.push(':');
            key.push_str(&arg.to_string());
        }
        Self(key)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Clone)]
pub struct ResultCache {
    entries: Arc<Mutex<HashMap<CacheKey, (serde_json::Value, Instant)>>>,
    default_ttl: Duration,
}

impl ResultCache {
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            default_ttl,
        }
    }

    /// Default TTL from `TB_CACHE_TTL_SECS`, falling back to five minutes.
    /// A value of zero disables caching for callers using the default.
    pub fn from_env() -> Self {
        Self::from_env_with(|name| env::var(name).ok())
    }

    fn from_env_with<F>(get_env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let ttl_secs = match get_env("TB_CACHE_TTL_SECS") {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) => secs,
                Err(_) => {
                    warn!(value = %raw, "invalid TB_CACHE_TTL_SECS, using default");
                    DEFAULT_TTL_SECS
                }
            },
            None => DEFAULT_TTL_SECS,
        };
        Self::new(Duration::from_secs(ttl_secs))
    }

    /// The TTL callers use when they have no per-computation bound of their
    /// own.
    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    pub fn get<T: DeserializeOwned>(&self, key: &CacheKey) -> Option<T> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        match entries.get(key) {
            Some((value, expires_at)) if Instant::now() < *expires_at => {
                serde_json::from_value(value.clone()).ok()
            }
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Stores a value that expires after `ttl`. A zero TTL stores nothing.
    pub fn set<T: Serialize>(&self, key: CacheKey, value: &T, ttl: Duration) {
        if ttl.is_zero() {
            return;
        }
        let Ok(value) = serde_json::to_value(value) else {
            return;
        };
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(key, (value, Instant::now() + ttl));
    }

    /// Returns the cached value for `key`, or runs `compute` and stores its
    /// result for `ttl`. Errors are never cached.
    pub async fn get_or_compute<T, E, F, Fut>(
        &self,
        key: CacheKey,
        ttl: Duration,
        compute: F,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(hit) = self.get(&key) {
            debug!(key = key.as_str(), "cache hit");
            return Ok(hit);
        }
        let value = compute().await?;
        self.set(key, &value, ttl);
        Ok(value)
    }

    pub fn clear(&self) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.clear();
    }
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::from_env()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    const LONG: Duration = Duration::from_secs(300);

    #[test]
    fn key_includes_function_and_args() {
        let key = CacheKey::new("topic_stats", &[&"a1", &7]);
        assert_eq!(key.as_str(), "topic_stats:a1:7");

        let other = CacheKey::new("topic_stats", &[&"a1", &8]);
        assert_ne!(key, other);
    }

    #[tokio::test]
    async fn second_call_with_same_key_is_served_from_cache() {
        let cache = ResultCache::new(LONG);
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let value: i64 = cache
                .get_or_compute(CacheKey::new("expensive", &[&42]), LONG, || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, std::convert::Infallible>(7)
                })
                .await
                .unwrap();
            assert_eq!(value, 7);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn distinct_args_do_not_share_entries() {
        let cache = ResultCache::new(LONG);
        cache.set(CacheKey::new("f", &[&1]), &10i64, LONG);
        cache.set(CacheKey::new("f", &[&2]), &20i64, LONG);

        assert_eq!(cache.get::<i64>(&CacheKey::new("f", &[&1])), Some(10));
        assert_eq!(cache.get::<i64>(&CacheKey::new("f", &[&2])), Some(20));
    }

    #[tokio::test]
    async fn errors_are_not_cached() {
        let cache = ResultCache::new(LONG);
        let calls = AtomicUsize::new(0);

        let key = CacheKey::new("flaky", &[]);
        let first: Result<i64, &str> = cache
            .get_or_compute(key.clone(), LONG, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err("boom")
            })
            .await;
        assert!(first.is_err());

        let second: Result<i64, &str> = cache
            .get_or_compute(key, LONG, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(5)
            })
            .await;
        assert_eq!(second.unwrap(), 5);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn zero_ttl_stores_nothing() {
        let cache = ResultCache::new(LONG);
        let key = CacheKey::new("f", &[]);
        cache.set(key.clone(), &1i64, Duration::ZERO);
        assert_eq!(cache.get::<i64>(&key), None);
    }

    #[test]
    fn expired_entries_are_dropped() {
        let cache = ResultCache::new(LONG);
        let key = CacheKey::new("f", &[]);
        cache.set(key.clone(), &1i64, Duration::from_nanos(1));
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(cache.get::<i64>(&key), None);
    }

    #[test]
    fn entries_expire_on_their_own_ttl() {
        let cache = ResultCache::new(LONG);
        let short = CacheKey::new("short", &[]);
        let long = CacheKey::new("long", &[]);
        cache.set(short.clone(), &1i64, Duration::from_nanos(1));
        cache.set(long.clone(), &2i64, LONG);

        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(cache.get::<i64>(&short), None);
        assert_eq!(cache.get::<i64>(&long), Some(2));
    }

    #[test]
    fn env_override_and_fallback() {
        let cache = ResultCache::from_env_with(|name| {
            (name == "TB_CACHE_TTL_SECS").then(|| "60".to_string())
        });
        assert_eq!(cache.default_ttl(), Duration::from_secs(60));

        let cache = ResultCache::from_env_with(|_| None);
        assert_eq!(cache.default_ttl(), Duration::from_secs(300));

        let cache = ResultCache::from_env_with(|_| Some("nope".to_string()));
        assert_eq!(cache.default_ttl(), Duration::from_secs(300));
    }
}
