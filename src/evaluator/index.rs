//! Participant → assigned-dates conflict index.
//!
//! Rebuilt once per solve session from a snapshot of current assignments;
//! never updated incrementally. It trades one O(n) rebuild for O(1)
//! membership checks on every constraint evaluation afterwards, and it is
//! stale the instant assignments change without another rebuild — by design.

use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::time::Instant;
use tracing::info;

use crate::metrics;

/// One exam assignment as seen by the index: a date plus up to three
/// participant roles. Empty/absent roles contribute nothing.
#[derive(Debug, Clone, Default)]
pub struct AssignmentRecord {
    /// Assignment date, canonical `YYYY-MM-DD`
    pub date: String,
    /// Primary participant id
    pub primary: Option<String>,
    /// Secondary participant id
    pub secondary: Option<String>,
    /// Backup participant id
    pub backup: Option<String>,
}

impl AssignmentRecord {
    /// Convenience constructor for snapshots and tests.
    pub fn new(
        date: impl Into<String>,
        primary: Option<&str>,
        secondary: Option<&str>,
        backup: Option<&str>,
    ) -> Self {
        Self {
            date: date.into(),
            primary: primary.map(str::to_string),
            secondary: secondary.map(str::to_string),
            backup: backup.map(str::to_string),
        }
    }

    fn roles(&self) -> impl Iterator<Item = &str> {
        [&self.primary, &self.secondary, &self.backup]
            .into_iter()
            .flatten()
            .map(String::as_str)
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }
}

/// The rebuildable index. Readers take a shared lock for the O(1) lookup;
/// rebuild swaps the whole map under the write lock. The lock makes a racing
/// rebuild/read merely stale, never unsound — serializing the handoff at
/// solve start is still the caller's job.
#[derive(Debug, Default)]
pub struct AssignmentIndex {
    by_participant: RwLock<HashMap<String, HashSet<String>>>,
    built: RwLock<bool>,
}

impl AssignmentIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear and repopulate from `snapshot` in one pass.
    pub fn rebuild(&self, snapshot: &[AssignmentRecord]) {
        let start = Instant::now();
        let mut fresh: HashMap<String, HashSet<String>> = HashMap::new();
        let mut entries = 0usize;

        for record in snapshot {
            let date = record.date.trim();
            if date.is_empty() {
                continue;
            }
            for id in record.roles() {
                if fresh
                    .entry(id.to_string())
                    .or_default()
                    .insert(date.to_string())
                {
                    entries += 1;
                }
            }
        }

        let participants = fresh.len();
        *self.by_participant.write() = fresh;
        *self.built.write() = true;

        metrics::record_index_rebuild(participants, entries, start.elapsed());
        info!(
            assignments = snapshot.len(),
            participants,
            entries,
            elapsed_us = start.elapsed().as_micros() as u64,
            "assignment index rebuilt"
        );
    }

    /// O(1) membership check. False when the index was never built or has
    /// no entry for the participant — never an error.
    pub fn is_assigned_on(&self, id: &str, date: &str) -> bool {
        self.by_participant
            .read()
            .get(id.trim())
            .is_some_and(|dates| dates.contains(date.trim()))
    }

    /// Whether a rebuild has ever completed.
    pub fn is_built(&self) -> bool {
        *self.built.read()
    }

    /// Number of indexed participants.
    pub fn participant_count(&self) -> usize {
        self.by_participant.read().len()
    }

    /// Drop all index contents and the built flag.
    pub fn clear(&self) {
        self.by_participant.write().clear();
        *self.built.write() = false;
    }
}
