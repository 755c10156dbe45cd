//! # roster-facts
//!
//! The performance layer of an exam-assignment scheduling system: a tiered
//! memoization cache and an indexed fact evaluator that make repeated
//! constraint evaluation cheap inside a combinatorial search.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  Constraint-rule layer                      │
//! │  • Calls fact queries on every evaluated move               │
//! │  • Potentially millions of calls per solve                  │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      FactEvaluator                          │
//! │  • Per-date calendar facts, per-identity org facts          │
//! │  • Per-pair unit comparison / day distance (TieredCache)    │
//! │  • Participant→dates index, rebuilt once per solve          │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   TieredCache<K, V>                         │
//! │  • L1: strong, size-bounded, fractional demotion            │
//! │  • L2: strict-capacity overflow tier                        │
//! │  • TTL expiry: lazy on read + background Sweeper            │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use roster_facts::{
//!     AssignmentRecord, EvaluatorConfig, FactEvaluator, HolidayCalendar,
//!     StaticDirectory, Sweeper,
//! };
//!
//! let calendar = HolidayCalendar::new();
//! let directory = Arc::new(
//!     StaticDirectory::new()
//!         .with_participant("zhang", Some("区域三室"), Some("甲班"))
//!         .with_participant("li", Some("三室"), Some("乙班")),
//! );
//! let evaluator = Arc::new(FactEvaluator::new(
//!     calendar,
//!     directory,
//!     EvaluatorConfig::default(),
//! ));
//!
//! // One snapshot rebuild before the solve, then O(1) queries throughout.
//! evaluator.rebuild_index(&[AssignmentRecord::new(
//!     "2026-08-24",
//!     Some("zhang"),
//!     Some("li"),
//!     None,
//! )]);
//! assert!(evaluator.is_participant_assigned_on_date("zhang", "2026-08-24"));
//! assert!(evaluator.are_same_organizational_unit("zhang", "li"));
//!
//! // The sweeper is owned by whoever orchestrates the session.
//! let mut sweeper = Sweeper::new(Duration::from_secs(60));
//! for target in evaluator.sweep_targets() {
//!     sweeper.register(target);
//! }
//! sweeper.start();
//! // ... solve ...
//! sweeper.stop();
//! ```
//!
//! ## Concurrency
//!
//! One evaluator serves one solving session across any number of worker
//! threads. Memoization maps are sharded concurrent maps with atomic
//! compute-if-absent; no global lock spans a lookup, so racing misses on
//! one key may compute it twice (loaders are pure, so the answers agree).
//! `rebuild_index` must finish before concurrent reads for that solve
//! begin. The sweeper only removes entries and never blocks readers.

pub mod cache;
pub mod calendar;
pub mod config;
pub mod directory;
pub mod evaluator;
pub mod metrics;

pub use cache::sweeper::{SweepTarget, Sweeper};
pub use cache::tiered::{CacheStats, TieredCache};
pub use calendar::HolidayCalendar;
pub use config::{CacheConfig, EvaluatorConfig};
pub use directory::{ParticipantDirectory, ParticipantRecord, StaticDirectory};
pub use evaluator::{
    AssignmentIndex, AssignmentRecord, DayFacts, EvaluatorStats, FactError, FactEvaluator,
    OrgUnit, MAX_DAY_DISTANCE,
};
