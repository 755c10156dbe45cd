//! Tiered memoization cache and its background sweeper.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     Cache Module                             │
//! ├──────────────────────────────────────────────────────────────┤
//! │  tiered.rs   - TieredCache<K, V>                             │
//! │  └─ L1: strong, size-bounded, fractional demotion            │
//! │  └─ L2: strict-capacity overflow tier, insertion-order trim  │
//! │  └─ CacheStats: point-in-time snapshot                       │
//! ├──────────────────────────────────────────────────────────────┤
//! │  sweeper.rs  - periodic expiry purge                         │
//! │  └─ SweepTarget: seam implemented by every TieredCache       │
//! │  └─ Sweeper: one named thread, explicit start/stop           │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Eviction order within an L1 batch is whatever the underlying map
//! iterates, an explicit non-LRU policy. The only guarantee is the
//! capacity bound.

pub mod sweeper;
pub mod tiered;
