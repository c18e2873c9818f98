//! Admission policies for the pending update queue.

use std::collections::HashMap;
use std::fmt;

use crate::math::{ColumnKey, Region};
use crate::update::config::AdmissionPolicyKind;

/// What the scheduler should do with an incoming region
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AdmissionDecision {
    /// Add a new queue entry
    Insert,
    /// Fold into the entry already queued for this column
    Merge,
}

/// Read-only view of which columns currently have pending entries
pub struct PendingColumns<'a> {
    counts: &'a HashMap<ColumnKey, usize>,
}

impl<'a> PendingColumns<'a> {
    pub(crate) fn new(counts: &'a HashMap<ColumnKey, usize>) -> Self {
        Self { counts }
    }

    /// Number of pending entries for a column
    pub fn count(&self, key: ColumnKey) -> usize {
        self.counts.get(&key).copied().unwrap_or(0)
    }

    pub fn contains(&self, key: ColumnKey) -> bool {
        self.count(key) > 0
    }
}

/// Decides whether an aligned region becomes a new queue entry.
pub trait AdmissionPolicy: Send + Sync + fmt::Debug {
    fn decide(&self, region: &Region, pending: &PendingColumns<'_>) -> AdmissionDecision;

    fn name(&self) -> &'static str;
}

/// Queue everything; the renderer absorbs redundant work.
#[derive(Clone, Copy, Debug, Default)]
pub struct AlwaysAdmit;

impl AdmissionPolicy for AlwaysAdmit {
    fn decide(&self, _region: &Region, _pending: &PendingColumns<'_>) -> AdmissionDecision {
        AdmissionDecision::Insert
    }

    fn name(&self) -> &'static str {
        AdmissionPolicyKind::AlwaysAdmit.name()
    }
}

/// At most one pending entry per chunk column.
#[derive(Clone, Copy, Debug, Default)]
pub struct DedupeByColumn;

impl AdmissionPolicy for DedupeByColumn {
    fn decide(&self, region: &Region, pending: &PendingColumns<'_>) -> AdmissionDecision {
        if pending.contains(region.column_key()) {
            AdmissionDecision::Merge
        } else {
            AdmissionDecision::Insert
        }
    }

    fn name(&self) -> &'static str {
        AdmissionPolicyKind::DedupeByColumn.name()
    }
}

impl AdmissionPolicyKind {
    /// Instantiate the policy this kind names
    pub fn build(self) -> Box<dyn AdmissionPolicy> {
        match self {
            AdmissionPolicyKind::AlwaysAdmit => Box::new(AlwaysAdmit),
            AdmissionPolicyKind::DedupeByColumn => Box::new(DedupeByColumn),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::IVec3;

    fn column(x: i32, z: i32) -> Region {
        Region::new(IVec3::new(x, 0, z), IVec3::new(x + 15, 255, z + 15))
    }

    #[test]
    fn test_always_admit_ignores_pending() {
        let mut counts = HashMap::new();
        counts.insert(ColumnKey::new(0, 0), 3);
        let pending = PendingColumns::new(&counts);

        assert_eq!(AlwaysAdmit.decide(&column(0, 0), &pending), AdmissionDecision::Insert);
    }

    #[test]
    fn test_dedupe_by_column() {
        let mut counts = HashMap::new();
        counts.insert(ColumnKey::new(16, -32), 1);
        let pending = PendingColumns::new(&counts);

        assert_eq!(DedupeByColumn.decide(&column(16, -32), &pending), AdmissionDecision::Merge);
        assert_eq!(DedupeByColumn.decide(&column(0, -32), &pending), AdmissionDecision::Insert);
    }

    #[test]
    fn test_kind_builds_matching_policy() {
        assert_eq!(AdmissionPolicyKind::AlwaysAdmit.build().name(), "always_admit");
        assert_eq!(AdmissionPolicyKind::DedupeByColumn.build().name(), "dedupe_by_column");
    }
}
