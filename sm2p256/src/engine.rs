//! The SM2 engine: owns the generator table and the key table cache.

use crate::{
    arithmetic::{
        AffinePoint, PrecomputedArithmetic, PrecomputedTable, ProjectivePoint, Scalar, Sm2,
    },
    cache::TableCache,
    EngineConfig, PublicKey, Result,
};
use std::sync::{Arc, OnceLock};

/// Explicit context for SM2 operations.
///
/// An engine is cheap to share: wrap it in an [`Arc`] and hand it to every
/// thread which signs or verifies. The generator table is built once, on
/// first use unless [`EngineConfig::eager_generator_table`] is set, and read
/// without locking afterwards.
#[derive(Debug)]
pub struct Engine {
    config: EngineConfig,
    generator_table: OnceLock<PrecomputedTable>,
    cache: TableCache,
}

impl Engine {
    /// Create an engine with the given configuration.
    pub fn new(config: EngineConfig) -> Self {
        let engine = Self {
            cache: TableCache::new(config.table_cache_capacity),
            generator_table: OnceLock::new(),
            config,
        };

        if engine.config.eager_generator_table {
            engine.generator_table();
        }

        engine
    }

    /// Borrow the configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Borrow the key table cache.
    pub fn cache(&self) -> &TableCache {
        &self.cache
    }

    /// The generator's comb table, building it on first call.
    ///
    /// Concurrent first callers block until the single build completes.
    pub fn generator_table(&self) -> &PrecomputedTable {
        self.generator_table.get_or_init(|| {
            let _span = tracing::debug_span!("build_generator_table").entered();
            let table = Sm2::build_table(&AffinePoint::GENERATOR);
            tracing::debug!(bytes = PrecomputedTable::BYTE_SIZE, "generator table ready");
            table
        })
    }

    /// Fixed-base multiplication: `[k] G`.
    pub fn mul_base(&self, k: &Scalar) -> ProjectivePoint {
        Sm2::mul_fixed(self.generator_table(), k)
    }

    /// Fixed-point multiplication: `[k] Q` using Q's attached, cached or
    /// freshly built table.
    pub fn mul_point(&self, public_key: &PublicKey, k: &Scalar) -> Result<ProjectivePoint> {
        let table = self.public_key_table(public_key)?;
        Ok(Sm2::mul_fixed(&table, k))
    }

    /// Combined multiplication: `[k1] G + [k2] Q`.
    pub fn combined_mul(
        &self,
        k1: &Scalar,
        public_key: &PublicKey,
        k2: &Scalar,
    ) -> Result<ProjectivePoint> {
        let table = self.public_key_table(public_key)?;
        Ok(Sm2::mul_combined(self.generator_table(), k1, &table, k2))
    }

    /// Find the comb table for `public_key`.
    ///
    /// A table attached to the key wins; otherwise the cache is consulted and
    /// populated on a miss. The table found is attached to `public_key`, so
    /// later lookups through the same key survive cache eviction.
    pub fn public_key_table(&self, public_key: &PublicKey) -> Result<Arc<PrecomputedTable>> {
        if let Some(table) = public_key.attached_table() {
            return Ok(Arc::clone(table));
        }

        let table = self.cache.get_or_build(&public_key.fingerprint(), || {
            let _span = tracing::debug_span!("build_key_table").entered();
            Ok(Sm2::build_table(public_key.as_affine()))
        })?;

        Ok(Arc::clone(public_key.attach_table(table)))
    }

    /// Build `public_key`'s table and publish it in the cache.
    ///
    /// Reuses the cached table when one exists.
    pub(crate) fn build_public_key_table(&self, public_key: &PublicKey) -> Arc<PrecomputedTable> {
        let fingerprint = public_key.fingerprint();

        if let Some(table) = self.cache.get(&fingerprint) {
            return table;
        }

        let _span = tracing::debug_span!("build_key_table").entered();
        let table = Arc::new(Sm2::build_table(public_key.as_affine()));
        self.cache.insert(&fingerprint, table)
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}
