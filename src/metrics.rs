//! Metrics instrumentation for roster-facts.
//!
//! Uses the `metrics` crate for backend-agnostic metrics collection.
//! The host process is responsible for choosing the exporter (Prometheus, OTEL, etc.)
//!
//! # Metric Naming Convention
//! - `roster_facts_` prefix for all metrics
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Labels
//! - `cache`: the cache instance name (e.g. "unit_cmp", "day_diff")
//! - `tier`: L1, L2

use metrics::{counter, gauge, histogram};
use std::time::Duration;

/// Record a cache hit, labelled with the tier that served it.
/// Static labels keep this allocation-free on the query path.
pub fn record_hit(cache: &'static str, tier: &'static str) {
    counter!(
        "roster_facts_hits_total",
        "cache" => cache,
        "tier" => tier
    )
    .increment(1);
}

/// Record a cache miss (loader invoked or absent reported)
pub fn record_miss(cache: &'static str) {
    counter!(
        "roster_facts_misses_total",
        "cache" => cache
    )
    .increment(1);
}

/// Record entries demoted from L1 to L2
pub fn record_evictions(cache: &str, count: usize) {
    counter!(
        "roster_facts_evictions_total",
        "cache" => cache.to_string()
    )
    .increment(count as u64);
}

/// Record entries dropped by TTL expiry
pub fn record_expirations(cache: &str, count: usize) {
    counter!(
        "roster_facts_expirations_total",
        "cache" => cache.to_string()
    )
    .increment(count as u64);
}

/// Record a loader failure (error propagated uncached)
pub fn record_loader_error(cache: &'static str) {
    counter!(
        "roster_facts_loader_errors_total",
        "cache" => cache
    )
    .increment(1);
}

/// Record a degraded fact answer caused by malformed input
pub fn record_parse_fallback(kind: &'static str) {
    counter!(
        "roster_facts_parse_fallbacks_total",
        "kind" => kind
    )
    .increment(1);
}

/// Set current entry count for a cache tier
pub fn set_tier_entries(cache: &str, tier: &str, count: usize) {
    gauge!(
        "roster_facts_tier_entries",
        "cache" => cache.to_string(),
        "tier" => tier.to_string()
    )
    .set(count as f64);
}

/// Set point-in-time hit rate for a cache
pub fn set_hit_rate(cache: &str, rate: f64) {
    gauge!(
        "roster_facts_hit_rate",
        "cache" => cache.to_string()
    )
    .set(rate);
}

/// Record one sweeper pass
pub fn record_sweep(removed: usize, duration: Duration) {
    counter!("roster_facts_sweeps_total").increment(1);
    counter!("roster_facts_swept_entries_total").increment(removed as u64);
    histogram!("roster_facts_sweep_seconds").record(duration.as_secs_f64());
}

/// Record an assignment index rebuild
pub fn record_index_rebuild(participants: usize, entries: usize, duration: Duration) {
    counter!("roster_facts_index_rebuilds_total").increment(1);
    gauge!("roster_facts_index_participants").set(participants as f64);
    gauge!("roster_facts_index_entries").set(entries as f64);
    histogram!("roster_facts_index_rebuild_seconds").record(duration.as_secs_f64());
}

/// Record a proactive cleanup pass over oversized sub-caches
pub fn record_cache_cleanup(cache: &str, evicted: usize) {
    counter!(
        "roster_facts_cleanup_evictions_total",
        "cache" => cache.to_string()
    )
    .increment(evicted as u64);
}
