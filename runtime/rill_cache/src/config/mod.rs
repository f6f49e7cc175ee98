//! Cache configuration.

use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

/// Environment variable overriding [`CacheConfig::pool_capacity`].
pub const ENV_POOL_CAPACITY: &str = "RILL_CACHE_POOL_CAPACITY";
/// Environment variable overriding [`CacheConfig::max_entries`].
pub const ENV_MAX_ENTRIES: &str = "RILL_CACHE_MAX_ENTRIES";
/// Environment variable overriding [`CacheConfig::idle_ttl`], in seconds.
/// `0` disables idle eviction.
pub const ENV_IDLE_SECS: &str = "RILL_CACHE_IDLE_SECS";

/// Sizing and eviction policy of a [`SerializationCache`].
///
/// [`SerializationCache`]: crate::SerializationCache
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct CacheConfig {
    /// Clean working copies kept per entry for reuse. At least 1.
    pub pool_capacity: usize,
    /// Entries allowed to hold a canonical graph at once; the least recently
    /// used beyond this are invalidated.
    pub max_entries: usize,
    /// Entries unused for longer than this are invalidated by
    /// `evict_idle`. `None` disables idle eviction.
    pub idle_ttl: Option<Duration>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            pool_capacity: 4,
            max_entries: 256,
            idle_ttl: Some(Duration::from_secs(300)),
        }
    }
}

impl CacheConfig {
    #[must_use]
    pub fn with_pool_capacity(mut self, capacity: usize) -> Self {
        self.pool_capacity = capacity.max(1);
        self
    }

    #[must_use]
    pub fn with_max_entries(mut self, max: usize) -> Self {
        self.max_entries = max;
        self
    }

    #[must_use]
    pub fn with_idle_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.idle_ttl = ttl;
        self
    }

    /// Defaults overridden by the `RILL_CACHE_*` environment variables.
    /// Unparseable values are logged and ignored.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each
    /// `RILL_CACHE_*` variable name.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(capacity) = read_number(&lookup, ENV_POOL_CAPACITY) {
            config = config.with_pool_capacity(capacity);
        }
        if let Some(max) = read_number(&lookup, ENV_MAX_ENTRIES) {
            config = config.with_max_entries(max);
        }
        if let Some(secs) = read_number::<u64>(&lookup, ENV_IDLE_SECS) {
            let ttl = (secs > 0).then(|| Duration::from_secs(secs));
            config = config.with_idle_ttl(ttl);
        }
        config
    }
}

fn read_number<T>(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<T>
where
    T: FromStr,
    T::Err: Display,
{
    let raw = lookup(name)?;
    match raw.trim().parse::<T>() {
        Ok(n) => Some(n),
        Err(err) => {
            warn!(variable = name, value = %raw, %err, "ignoring invalid cache setting");
            None
        }
    }
}
