//! Canonical test configurations.
//!
//! Single source of truth for config structs used across tests.

use crate::infrastructure::config::resolver::ResolverConfig;
use crate::infrastructure::config::store::StoreConfig;

/// Local store config for pool `pool`.
pub fn store(pool: &str) -> StoreConfig {
    StoreConfig::new("localhost", 27017, pool)
}

/// Resolver config that stops hydrating below `max_depth` levels.
pub fn shallow_resolver(max_depth: usize) -> ResolverConfig {
    ResolverConfig::with_max_depth(max_depth)
}
