//! Engine configuration.

use core::num::NonZeroUsize;

/// Default number of key tables kept by the table cache.
///
/// Each table holds 151 552 bytes of point data, so the default bounds the
/// cache at roughly 9.25 MiB.
pub const DEFAULT_TABLE_CACHE_CAPACITY: NonZeroUsize = match NonZeroUsize::new(64) {
    Some(capacity) => capacity,
    None => unreachable!(),
};

/// Tunables of an [`Engine`](crate::Engine).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EngineConfig {
    /// Maximum number of public-key tables held by the table cache.
    pub table_cache_capacity: NonZeroUsize,

    /// Build and cache the table of every freshly generated or imported key.
    pub cache_generated_keys: bool,

    /// Build the generator table in [`Engine::new`](crate::Engine::new)
    /// instead of on first use.
    pub eager_generator_table: bool,
}

impl EngineConfig {
    /// Sets the table cache capacity.
    pub fn with_table_cache_capacity(mut self, capacity: NonZeroUsize) -> Self {
        self.table_cache_capacity = capacity;
        self
    }

    /// Sets whether generated keys get their table built up front.
    pub fn with_cache_generated_keys(mut self, enabled: bool) -> Self {
        self.cache_generated_keys = enabled;
        self
    }

    /// Sets whether the generator table is built eagerly.
    pub fn with_eager_generator_table(mut self, enabled: bool) -> Self {
        self.eager_generator_table = enabled;
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            table_cache_capacity: DEFAULT_TABLE_CACHE_CAPACITY,
            cache_generated_keys: true,
            eager_generator_table: false,
        }
    }
}
