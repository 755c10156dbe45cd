//! Indexed fact evaluator: memoized predicates over calendar, participant,
//! and assignment data.
//!
//! This sits directly under the constraint-rule layer, which calls these
//! query methods on every evaluated move — potentially millions of times per
//! solve. Every answer is therefore memoized: per-date calendar facts and
//! per-identity facts in concurrent maps, per-pair comparisons in bounded
//! [`TieredCache`] instances, and assignment conflicts in a rebuildable
//! index.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                   Evaluator Module                           │
//! ├──────────────────────────────────────────────────────────────┤
//! │  mod.rs      - FactEvaluator, DayFacts, FactError            │
//! │  org_unit.rs - label normalization, OrgUnit codes            │
//! │  index.rs    - participant → assigned-dates index            │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Failure semantics
//!
//! Malformed dates and unknown identities never propagate: they degrade to
//! conservative defaults (not a holiday, maximum day distance, invalid
//! unit), get logged once per memoized key, and the solve keeps running.

pub mod index;
pub mod org_unit;

use chrono::{Datelike, NaiveDate, Weekday};
use dashmap::DashMap;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use crate::cache::sweeper::SweepTarget;
use crate::cache::tiered::{CacheStats, TieredCache};
use crate::calendar::HolidayCalendar;
use crate::config::EvaluatorConfig;
use crate::directory::ParticipantDirectory;
use crate::metrics;

pub use index::{AssignmentIndex, AssignmentRecord};
pub use org_unit::{normalize, OrgUnit};

/// Internal fallible steps. Never escapes the evaluator's public surface.
#[derive(Debug, Error)]
pub enum FactError {
    #[error("unparseable date '{input}': {source}")]
    InvalidDate {
        input: String,
        #[source]
        source: chrono::ParseError,
    },
}

/// Memoized calendar facts for one date string.
///
/// For malformed input every flag is false and `weekday` is `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayFacts {
    pub holiday: bool,
    pub weekend: bool,
    pub workday: bool,
    pub weekday: Option<Weekday>,
}

impl DayFacts {
    const DEGRADED: DayFacts = DayFacts {
        holiday: false,
        weekend: false,
        workday: false,
        weekday: None,
    };
}

/// Relationship between two participants' organizational units. An invalid
/// unit on either side makes the relation indeterminate: such a pair is
/// neither "same" nor "different".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UnitRelation {
    Same,
    Different,
    Indeterminate,
}

/// Sentinel distance for unparseable date pairs: conservatively "as far
/// apart as possible", so distance-based constraints never misfire on junk.
pub const MAX_DAY_DISTANCE: i64 = i64::MAX;

/// Shift/group labels that explicitly mark non-shift (administrative) staff.
const ADMIN_GROUP_MARKERS: [&str; 3] = ["行政班", "行政", "常日班"];

/// Accepted date spellings, tried in order.
const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%Y/%m/%d"];

/// Point-in-time snapshot of every sub-cache, for monitoring and tests.
#[derive(Debug, Clone, Serialize)]
pub struct EvaluatorStats {
    pub day_facts_entries: usize,
    pub unit_code_entries: usize,
    pub admin_flag_entries: usize,
    pub index_built: bool,
    pub index_participants: usize,
    pub unit_cmp: CacheStats,
    pub day_diff: CacheStats,
}

/// The evaluator. One instance per solving session; shared across the
/// session's worker threads behind an `Arc`.
pub struct FactEvaluator {
    calendar: HolidayCalendar,
    directory: Arc<dyn ParticipantDirectory>,
    config: EvaluatorConfig,

    /// date string → calendar facts
    day_facts: DashMap<String, DayFacts>,
    /// participant id → normalized unit
    unit_codes: DashMap<String, OrgUnit>,
    /// participant id → administrative flag
    admin_flags: DashMap<String, bool>,
    /// ordered (a, b) identity pair → unit relation
    unit_cmp: Arc<TieredCache<(String, String), UnitRelation>>,
    /// sorted (d1, d2) date pair → absolute day distance
    day_diff: Arc<TieredCache<(String, String), i64>>,
    /// participant → assigned dates, rebuilt per solve
    index: AssignmentIndex,
}

impl FactEvaluator {
    pub fn new(
        calendar: HolidayCalendar,
        directory: Arc<dyn ParticipantDirectory>,
        config: EvaluatorConfig,
    ) -> Self {
        Self {
            calendar,
            directory,
            day_facts: DashMap::new(),
            unit_codes: DashMap::new(),
            admin_flags: DashMap::new(),
            unit_cmp: Arc::new(TieredCache::new("unit_cmp", config.pair_cache.clone())),
            day_diff: Arc::new(TieredCache::new("day_diff", config.pair_cache.clone())),
            index: AssignmentIndex::new(),
            config,
        }
    }

    // ------------------------------------------------------------------
    // Calendar facts
    // ------------------------------------------------------------------

    /// All memoized facts for one date string.
    pub fn day_facts(&self, date: &str) -> DayFacts {
        if let Some(facts) = self.day_facts.get(date) {
            return *facts;
        }
        *self
            .day_facts
            .entry(date.to_string())
            .or_insert_with(|| self.compute_day_facts(date))
    }

    /// True iff `date` is a registered holiday. Malformed input → false.
    pub fn is_holiday(&self, date: &str) -> bool {
        self.day_facts(date).holiday
    }

    /// Day of week, or `None` for malformed input.
    pub fn day_of_week(&self, date: &str) -> Option<Weekday> {
        self.day_facts(date).weekday
    }

    /// Weekend for scheduling purposes (make-up workdays excluded).
    pub fn is_weekend(&self, date: &str) -> bool {
        self.day_facts(date).weekend
    }

    /// `!is_holiday && !is_weekend`, exactly. Malformed input → false.
    pub fn is_workday(&self, date: &str) -> bool {
        self.day_facts(date).workday
    }

    // ------------------------------------------------------------------
    // Identity facts
    // ------------------------------------------------------------------

    /// True iff the participant's shift/group designation is absent, empty,
    /// or a recognized non-shift marker.
    pub fn is_administrative_participant(&self, id: &str) -> bool {
        if let Some(flag) = self.admin_flags.get(id) {
            return *flag;
        }
        *self.admin_flags.entry(id.to_string()).or_insert_with(|| {
            match self.directory.shift_group_label(id) {
                None => true,
                Some(label) => {
                    let label = label.trim();
                    label.is_empty() || ADMIN_GROUP_MARKERS.contains(&label)
                }
            }
        })
    }

    /// Normalized organizational unit for a participant, memoized.
    pub fn organizational_unit(&self, id: &str) -> OrgUnit {
        if let Some(unit) = self.unit_codes.get(id) {
            return *unit;
        }
        *self.unit_codes.entry(id.to_string()).or_insert_with(|| {
            match self.directory.org_unit_label(id) {
                Some(label) => org_unit::normalize(&label),
                None => OrgUnit::Invalid,
            }
        })
    }

    /// True iff both participants resolve to the same valid unit code. An
    /// invalid unit on either side answers false.
    pub fn are_same_organizational_unit(&self, a: &str, b: &str) -> bool {
        self.unit_relation(a, b) == UnitRelation::Same
    }

    /// True iff both participants resolve to valid unit codes that differ.
    /// An invalid unit on either side answers false here too: junk input is
    /// neither "same" nor "different".
    pub fn are_different_organizational_units(&self, a: &str, b: &str) -> bool {
        self.unit_relation(a, b) == UnitRelation::Different
    }

    // ------------------------------------------------------------------
    // Date arithmetic
    // ------------------------------------------------------------------

    /// Absolute calendar-day distance, symmetric, memoized per sorted pair.
    /// Malformed input on either side → [`MAX_DAY_DISTANCE`].
    pub fn days_between(&self, d1: &str, d2: &str) -> i64 {
        let (lo, hi) = if d1 <= d2 { (d1, d2) } else { (d2, d1) };
        self.day_diff.get_or_compute(
            (lo.to_string(), hi.to_string()),
            self.day_diff.default_ttl(),
            || match (Self::parse_date(lo), Self::parse_date(hi)) {
                (Ok(a), Ok(b)) => (b - a).num_days().abs(),
                (Err(e), _) | (_, Err(e)) => {
                    metrics::record_parse_fallback("date_pair");
                    warn!(error = %e, "day distance degraded to maximum");
                    MAX_DAY_DISTANCE
                }
            },
        )
    }

    /// True iff the two dates are exactly one calendar day apart. The same
    /// date twice is not consecutive.
    pub fn are_consecutive_dates(&self, d1: &str, d2: &str) -> bool {
        self.days_between(d1, d2) == 1
    }

    // ------------------------------------------------------------------
    // Conflict index
    // ------------------------------------------------------------------

    /// Clear and repopulate the participant→dates index from a snapshot.
    ///
    /// Must complete on one thread before concurrent constraint evaluation
    /// for the solve begins; it is a static snapshot, not kept consistent
    /// with subsequent moves.
    pub fn rebuild_index(&self, snapshot: &[AssignmentRecord]) {
        self.index.rebuild(snapshot);
    }

    /// O(1): is the participant already assigned on this date? False when
    /// the index was never built or has no entry — never an error.
    pub fn is_participant_assigned_on_date(&self, id: &str, date: &str) -> bool {
        self.index.is_assigned_on(id, date)
    }

    // ------------------------------------------------------------------
    // Administration
    // ------------------------------------------------------------------

    /// Drop every memoized fact and the assignment index. Test harnesses
    /// call this between scenarios; production calls it between solves.
    pub fn clear_all_caches(&self) {
        self.day_facts.clear();
        self.unit_codes.clear();
        self.admin_flags.clear();
        self.unit_cmp.clear();
        self.day_diff.clear();
        self.index.clear();
        info!("all evaluator caches cleared");
    }

    /// Compare each sub-cache against its configured ceiling and evict a
    /// fraction from any that exceeds it. Capacity pressure is handled here
    /// and in the tiered caches' own overflow path; it is never an error.
    pub fn check_and_cleanup_large_caches(&self) {
        Self::shrink_map("day_facts", &self.day_facts, self.config.day_facts_max_entries, self.config.cleanup_fraction);
        Self::shrink_map("unit_codes", &self.unit_codes, self.config.identity_max_entries, self.config.cleanup_fraction);
        Self::shrink_map("admin_flags", &self.admin_flags, self.config.identity_max_entries, self.config.cleanup_fraction);

        if self.unit_cmp.l1_len() >= self.config.pair_cache.l1_max_entries {
            let evicted = self.unit_cmp.evict_batch();
            metrics::record_cache_cleanup(self.unit_cmp.name(), evicted);
        }
        if self.day_diff.l1_len() >= self.config.pair_cache.l1_max_entries {
            let evicted = self.day_diff.evict_batch();
            metrics::record_cache_cleanup(self.day_diff.name(), evicted);
        }
    }

    /// Point-in-time stats across every sub-cache.
    pub fn stats(&self) -> EvaluatorStats {
        EvaluatorStats {
            day_facts_entries: self.day_facts.len(),
            unit_code_entries: self.unit_codes.len(),
            admin_flag_entries: self.admin_flags.len(),
            index_built: self.index.is_built(),
            index_participants: self.index.participant_count(),
            unit_cmp: self.unit_cmp.stats(),
            day_diff: self.day_diff.stats(),
        }
    }

    /// The evaluator's tiered caches, for registration with a
    /// [`Sweeper`](crate::Sweeper).
    pub fn sweep_targets(&self) -> Vec<Arc<dyn SweepTarget>> {
        vec![self.unit_cmp.clone(), self.day_diff.clone()]
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn unit_relation(&self, a: &str, b: &str) -> UnitRelation {
        self.unit_cmp.get_or_compute(
            (a.to_string(), b.to_string()),
            self.unit_cmp.default_ttl(),
            || {
                let ua = self.organizational_unit(a);
                let ub = self.organizational_unit(b);
                match (ua, ub) {
                    (OrgUnit::Invalid, _) | (_, OrgUnit::Invalid) => UnitRelation::Indeterminate,
                    (OrgUnit::Unit(ca), OrgUnit::Unit(cb)) if ca == cb => UnitRelation::Same,
                    _ => UnitRelation::Different,
                }
            },
        )
    }

    fn parse_date(input: &str) -> Result<NaiveDate, FactError> {
        let trimmed = input.trim();
        let mut last_err = None;
        for format in DATE_FORMATS {
            match NaiveDate::parse_from_str(trimmed, format) {
                Ok(date) => return Ok(date),
                Err(e) => last_err = Some(e),
            }
        }
        Err(FactError::InvalidDate {
            input: input.to_string(),
            // DATE_FORMATS is non-empty, so an error was recorded.
            source: last_err.expect("at least one format attempted"),
        })
    }

    /// Computed once per distinct date string; the memo map makes repeats
    /// free and keeps the degraded-input warning to one line per bad date.
    fn compute_day_facts(&self, date: &str) -> DayFacts {
        match Self::parse_date(date) {
            Ok(parsed) => DayFacts {
                holiday: self.calendar.is_holiday(parsed),
                weekend: self.calendar.is_weekend(parsed),
                workday: self.calendar.is_working_day(parsed),
                weekday: Some(parsed.weekday()),
            },
            Err(e) => {
                metrics::record_parse_fallback("date");
                warn!(error = %e, "calendar facts degraded to defaults");
                DayFacts::DEGRADED
            }
        }
    }

    fn shrink_map<V>(
        name: &'static str,
        map: &DashMap<String, V>,
        ceiling: usize,
        fraction: f64,
    ) {
        if map.len() <= ceiling {
            return;
        }
        let batch = ((map.len() as f64 * fraction.clamp(0.0, 1.0)).ceil() as usize).max(1);
        let victims: Vec<String> = map.iter().take(batch).map(|e| e.key().clone()).collect();
        for key in &victims {
            map.remove(key);
        }
        metrics::record_cache_cleanup(name, victims.len());
        warn!(
            cache = name,
            ceiling,
            evicted = victims.len(),
            remaining = map.len(),
            "memo map exceeded ceiling, evicted a fraction"
        );
    }
}
