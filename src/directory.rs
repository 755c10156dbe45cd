//! Participant directory seam.
//!
//! The evaluator reads two attributes per participant: the organizational
//! unit label and the shift/group label. Where those come from (ORM
//! entities, a snapshot, a fixture) is the caller's business; the trait is
//! the boundary.

use std::collections::HashMap;

/// Read-only access to participant attributes.
pub trait ParticipantDirectory: Send + Sync {
    /// Raw organizational-unit label for a participant, if known.
    fn org_unit_label(&self, id: &str) -> Option<String>;

    /// Raw shift/group label for a participant, if known.
    fn shift_group_label(&self, id: &str) -> Option<String>;
}

/// Attributes of one participant.
#[derive(Debug, Clone, Default)]
pub struct ParticipantRecord {
    /// Organizational-unit label as entered upstream (unnormalized)
    pub org_unit: Option<String>,
    /// Shift/group label; empty or absent marks non-shift staff
    pub shift_group: Option<String>,
}

/// In-memory directory built from a snapshot. Used by tests and by hosts
/// that materialize participants before a solve.
#[derive(Debug, Clone, Default)]
pub struct StaticDirectory {
    records: HashMap<String, ParticipantRecord>,
}

impl StaticDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a participant record. Builder-style.
    pub fn with_participant(
        mut self,
        id: impl Into<String>,
        org_unit: Option<&str>,
        shift_group: Option<&str>,
    ) -> Self {
        self.records.insert(
            id.into(),
            ParticipantRecord {
                org_unit: org_unit.map(str::to_string),
                shift_group: shift_group.map(str::to_string),
            },
        );
        self
    }

    pub fn insert(&mut self, id: impl Into<String>, record: ParticipantRecord) {
        self.records.insert(id.into(), record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl ParticipantDirectory for StaticDirectory {
    fn org_unit_label(&self, id: &str) -> Option<String> {
        self.records.get(id).and_then(|r| r.org_unit.clone())
    }

    fn shift_group_label(&self, id: &str) -> Option<String> {
        self.records.get(id).and_then(|r| r.shift_group.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_directory_lookup() {
        let dir = StaticDirectory::new()
            .with_participant("p1", Some("区域三室"), Some("甲班"))
            .with_participant("p2", None, None);

        assert_eq!(dir.org_unit_label("p1").as_deref(), Some("区域三室"));
        assert_eq!(dir.shift_group_label("p1").as_deref(), Some("甲班"));
        assert_eq!(dir.org_unit_label("p2"), None);
        assert_eq!(dir.org_unit_label("missing"), None);
        assert_eq!(dir.len(), 2);
    }
}
