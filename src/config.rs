//! Configuration for the cache layer and the fact evaluator.
//!
//! # Example
//!
//! ```
//! use roster_facts::{CacheConfig, EvaluatorConfig};
//!
//! // Minimal config (uses defaults)
//! let config = CacheConfig::default();
//! assert_eq!(config.l1_max_entries, 10_000);
//!
//! // Full config
//! let config = EvaluatorConfig {
//!     pair_cache: CacheConfig {
//!         l1_max_entries: 4096,
//!         evict_fraction: 0.25,
//!         ..Default::default()
//!     },
//!     day_facts_max_entries: 2000,
//!     ..Default::default()
//! };
//! # let _ = config;
//! ```

use serde::Deserialize;

/// Configuration for a single [`TieredCache`](crate::TieredCache) instance.
///
/// All fields have sensible defaults tuned for one solving session.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Maximum entries held strongly in L1 (default: 10 000)
    #[serde(default = "default_l1_max_entries")]
    pub l1_max_entries: usize,

    /// Maximum entries retained in L2 after demotion (default: 10 000)
    #[serde(default = "default_l2_max_entries")]
    pub l2_max_entries: usize,

    /// Fraction of L1 demoted on overflow, in (0, 1] (default: 0.25)
    #[serde(default = "default_evict_fraction")]
    pub evict_fraction: f64,

    /// Default TTL in seconds for `put` and derived-fact entries (default: 3600)
    #[serde(default = "default_ttl_secs")]
    pub default_ttl_secs: u64,
}

fn default_l1_max_entries() -> usize { 10_000 }
fn default_l2_max_entries() -> usize { 10_000 }
fn default_evict_fraction() -> f64 { 0.25 }
fn default_ttl_secs() -> u64 { 3600 }

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            l1_max_entries: default_l1_max_entries(),
            l2_max_entries: default_l2_max_entries(),
            evict_fraction: default_evict_fraction(),
            default_ttl_secs: default_ttl_secs(),
        }
    }
}

impl CacheConfig {
    /// How many entries one overflow eviction demotes. Always at least 1 so
    /// an insert into a full L1 makes progress.
    pub(crate) fn eviction_batch(&self) -> usize {
        let fraction = self.evict_fraction.clamp(0.0, 1.0);
        ((self.l1_max_entries as f64 * fraction).ceil() as usize).max(1)
    }
}

/// Configuration for [`FactEvaluator`](crate::FactEvaluator).
#[derive(Debug, Clone, Deserialize)]
pub struct EvaluatorConfig {
    /// Config shared by the pair caches (unit comparison, day distance)
    #[serde(default)]
    pub pair_cache: CacheConfig,

    /// Ceiling for the per-date calendar facts map (default: 20 000)
    #[serde(default = "default_day_facts_max_entries")]
    pub day_facts_max_entries: usize,

    /// Ceiling for the per-identity maps (unit codes, admin flags) (default: 20 000)
    #[serde(default = "default_identity_max_entries")]
    pub identity_max_entries: usize,

    /// Fraction removed from an oversized per-date/per-identity map during
    /// `check_and_cleanup_large_caches` (default: 0.25)
    #[serde(default = "default_evict_fraction")]
    pub cleanup_fraction: f64,

    /// Sweep interval in seconds for a [`Sweeper`](crate::Sweeper) serving
    /// this evaluator's caches (default: 60)
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

fn default_day_facts_max_entries() -> usize { 20_000 }
fn default_identity_max_entries() -> usize { 20_000 }
fn default_sweep_interval_secs() -> u64 { 60 }

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            pair_cache: CacheConfig::default(),
            day_facts_max_entries: default_day_facts_max_entries(),
            identity_max_entries: default_identity_max_entries(),
            cleanup_fraction: default_evict_fraction(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let c = CacheConfig::default();
        assert_eq!(c.l1_max_entries, 10_000);
        assert_eq!(c.l2_max_entries, 10_000);
        assert!((c.evict_fraction - 0.25).abs() < f64::EPSILON);
        assert_eq!(c.default_ttl_secs, 3600);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let c: CacheConfig = serde_json::from_str(r#"{"l1_max_entries": 4}"#).unwrap();
        assert_eq!(c.l1_max_entries, 4);
        assert_eq!(c.l2_max_entries, 10_000);
        assert!((c.evict_fraction - 0.25).abs() < f64::EPSILON);

        let e: EvaluatorConfig =
            serde_json::from_str(r#"{"day_facts_max_entries": 500}"#).unwrap();
        assert_eq!(e.day_facts_max_entries, 500);
        assert_eq!(e.pair_cache.l1_max_entries, 10_000);
        assert_eq!(e.sweep_interval_secs, 60);
    }

    #[test]
    fn test_eviction_batch_rounds_up_and_never_zero() {
        let c = CacheConfig {
            l1_max_entries: 4,
            evict_fraction: 0.25,
            ..Default::default()
        };
        assert_eq!(c.eviction_batch(), 1);

        let c = CacheConfig {
            l1_max_entries: 10,
            evict_fraction: 0.25,
            ..Default::default()
        };
        assert_eq!(c.eviction_batch(), 3);

        let c = CacheConfig {
            l1_max_entries: 100,
            evict_fraction: 0.0,
            ..Default::default()
        };
        assert_eq!(c.eviction_batch(), 1);
    }
}
