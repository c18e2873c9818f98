//! Distance-ordered queue of pending render updates.
//!
//! Regions are released nearest-first relative to an observer position, with
//! admission order breaking ties. All operations lock a single mutex, so one
//! scheduler can be shared (via `Arc`) between the thread that reports world
//! changes and the thread that drains work for the mesher.

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::core::{Error, Result, Vec3};
use crate::math::{ColumnKey, Region};
use crate::update::config::UpdateConfig;
use crate::update::policy::{AdmissionDecision, AdmissionPolicy, AlwaysAdmit, PendingColumns};

/// Result of handing a region to [`UpdateScheduler::admit`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Admission {
    /// Added as a new entry
    Queued,
    /// Folded into the entry already pending for the same column
    Merged,
    /// Added, and the queue cap pushed out this (lowest priority) region
    Evicted(Region),
}

/// Running counters (for diagnostics)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    pub pending: usize,
    pub admitted: u64,
    pub merged: u64,
    pub evicted: u64,
    pub popped: u64,
}

/// Queue entry. Orders by distance, then admission sequence; the sequence is
/// unique so no two entries compare equal.
///
/// The key is `f64`: anchors are whole blocks, so squared distances stay exact
/// for any observer within 2^26 blocks of them.
#[derive(Clone, Copy, Debug)]
struct PendingEntry {
    region: Region,
    distance_sq: f64,
    sequence: u64,
}

impl Eq for PendingEntry {}

impl PartialEq for PendingEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Ord for PendingEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance_sq
            .total_cmp(&other.distance_sq)
            .then(self.sequence.cmp(&other.sequence))
    }
}

impl PartialOrd for PendingEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Debug)]
struct PendingQueue {
    /// First = nearest, last = farthest
    entries: BTreeSet<PendingEntry>,
    /// Pending entry count per column
    columns: HashMap<ColumnKey, usize>,
    observer: Vec3,
    next_sequence: u64,
    stats: SchedulerStats,
}

impl PendingQueue {
    fn new(observer: Vec3) -> Self {
        Self {
            entries: BTreeSet::new(),
            columns: HashMap::new(),
            observer,
            next_sequence: 0,
            stats: SchedulerStats::default(),
        }
    }

    fn distance_sq(&self, region: &Region, anchor_offset: i32) -> f64 {
        self.observer.as_dvec3().distance_squared(region.anchor(anchor_offset))
    }

    fn insert(&mut self, region: Region, anchor_offset: i32) {
        let entry = PendingEntry {
            region,
            distance_sq: self.distance_sq(&region, anchor_offset),
            sequence: self.next_sequence,
        };
        self.next_sequence += 1;
        *self.columns.entry(region.column_key()).or_insert(0) += 1;
        self.entries.insert(entry);
    }

    fn forget_column(&mut self, key: ColumnKey) {
        if let Some(count) = self.columns.get_mut(&key) {
            *count -= 1;
            if *count == 0 {
                self.columns.remove(&key);
            }
        }
    }

    fn pop_first(&mut self) -> Option<Region> {
        let entry = self.entries.pop_first()?;
        self.forget_column(entry.region.column_key());
        self.stats.popped += 1;
        Some(entry.region)
    }

    fn pop_last(&mut self) -> Option<Region> {
        let entry = self.entries.pop_last()?;
        self.forget_column(entry.region.column_key());
        Some(entry.region)
    }
}

/// Owns the pending regions and releases them in priority order.
#[derive(Debug)]
pub struct UpdateScheduler {
    config: UpdateConfig,
    policy: Box<dyn AdmissionPolicy>,
    queue: Mutex<PendingQueue>,
}

impl UpdateScheduler {
    /// Create a scheduler using the policy named by `config.admission`.
    ///
    /// Fails with [`Error::Config`] if the configuration does not validate.
    pub fn new(config: UpdateConfig) -> Result<Self> {
        let policy = config.admission.build();
        Self::with_policy(config, policy)
    }

    /// Create a scheduler with a caller-supplied admission policy.
    pub fn with_policy(config: UpdateConfig, policy: Box<dyn AdmissionPolicy>) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_valid(config, policy))
    }

    /// Create with default configuration.
    pub fn with_defaults() -> Self {
        Self::from_valid(UpdateConfig::default(), Box::new(AlwaysAdmit))
    }

    fn from_valid(config: UpdateConfig, policy: Box<dyn AdmissionPolicy>) -> Self {
        Self {
            config,
            policy,
            queue: Mutex::new(PendingQueue::new(Vec3::ZERO)),
        }
    }

    pub fn config(&self) -> &UpdateConfig {
        &self.config
    }

    pub fn policy_name(&self) -> &'static str {
        self.policy.name()
    }

    // The queue only holds plain data and is consistent between statements,
    // so a panic on another thread does not invalidate it.
    fn lock(&self) -> MutexGuard<'_, PendingQueue> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a region to the queue. Never fails and never blocks on consumers.
    pub fn admit(&self, region: Region) -> Admission {
        self.admit_counted(region).0
    }

    /// Like [`UpdateScheduler::admit`], also returning the queue length as it
    /// stood right after this admission (under the same lock).
    pub fn admit_counted(&self, region: Region) -> (Admission, usize) {
        let mut queue = self.lock();

        let decision = self.policy.decide(&region, &PendingColumns::new(&queue.columns));
        if decision == AdmissionDecision::Merge {
            queue.stats.merged += 1;
            log::trace!("{} merged into pending column {:?}", region, region.column_key());
            return (Admission::Merged, queue.entries.len());
        }

        queue.insert(region, self.config.anchor_offset());
        queue.stats.admitted += 1;

        let mut admission = Admission::Queued;
        if let Some(cap) = self.config.max_pending {
            if queue.entries.len() > cap {
                if let Some(evicted) = queue.pop_last() {
                    queue.stats.evicted += 1;
                    log::debug!("Pending cap {} reached, dropped {}", cap, evicted);
                    admission = Admission::Evicted(evicted);
                }
            }
        }

        (admission, queue.entries.len())
    }

    /// Remove and return the nearest pending region.
    pub fn pop(&self) -> Result<Region> {
        self.lock().pop_first().ok_or(Error::EmptyQueue)
    }

    /// Return the nearest pending region without removing it.
    pub fn peek(&self) -> Result<Region> {
        self.lock()
            .entries
            .first()
            .map(|entry| entry.region)
            .ok_or(Error::EmptyQueue)
    }

    /// Pop up to `max_count` regions in priority order.
    pub fn drain(&self, max_count: usize) -> Vec<Region> {
        let mut queue = self.lock();
        let count = max_count.min(queue.entries.len());
        let mut batch = Vec::with_capacity(count);
        while batch.len() < count {
            match queue.pop_first() {
                Some(region) => batch.push(region),
                None => break,
            }
        }
        batch
    }

    /// Move the observer and re-prioritize everything pending.
    ///
    /// Admission order is kept, so ties still resolve earliest-first.
    pub fn set_observer(&self, position: Vec3) {
        let offset = self.config.anchor_offset();
        let mut queue = self.lock();
        queue.observer = position;

        let entries = std::mem::take(&mut queue.entries);
        let rekeyed: BTreeSet<PendingEntry> = entries
            .into_iter()
            .map(|entry| PendingEntry {
                distance_sq: queue.distance_sq(&entry.region, offset),
                ..entry
            })
            .collect();
        queue.entries = rekeyed;

        log::trace!("Observer moved to {}, {} regions re-keyed", position, queue.entries.len());
    }

    pub fn observer(&self) -> Vec3 {
        self.lock().observer
    }

    /// Get the number of pending regions
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    /// Check if nothing is pending
    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    /// Check whether any pending entry belongs to the column
    pub fn contains_column(&self, key: ColumnKey) -> bool {
        self.lock().columns.contains_key(&key)
    }

    /// Drop all pending regions. Counters are kept.
    pub fn clear(&self) {
        let mut queue = self.lock();
        queue.entries.clear();
        queue.columns.clear();
    }

    pub fn stats(&self) -> SchedulerStats {
        let queue = self.lock();
        SchedulerStats {
            pending: queue.entries.len(),
            ..queue.stats
        }
    }
}

impl Default for UpdateScheduler {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::IVec3;
    use crate::update::config::AdmissionPolicyKind;
    use std::sync::Arc;

    /// Chunk-aligned column whose anchor is `(x + 8, 8, z + 8)`
    fn column(x: i32, z: i32) -> Region {
        Region::new(IVec3::new(x, 0, z), IVec3::new(x + 15, 255, z + 15))
    }

    /// Region whose anchor lies exactly `d` blocks along +X from an observer at (0, 8, 0)
    fn at_distance(d: i32) -> Region {
        Region::new(IVec3::new(d - 8, 0, -8), IVec3::new(d + 7, 255, 7))
    }

    fn observer_at_anchor_height(scheduler: &UpdateScheduler) {
        scheduler.set_observer(Vec3::new(0.0, 8.0, 0.0));
    }

    #[test]
    fn test_empty_queue() {
        let scheduler = UpdateScheduler::with_defaults();
        assert!(scheduler.is_empty());
        assert!(matches!(scheduler.pop(), Err(Error::EmptyQueue)));
        assert!(matches!(scheduler.peek(), Err(Error::EmptyQueue)));
        assert!(scheduler.drain(4).is_empty());
    }

    #[test]
    fn test_pop_orders_by_distance() {
        let scheduler = UpdateScheduler::with_defaults();
        observer_at_anchor_height(&scheduler);

        for d in [10, 5, 20] {
            assert_eq!(scheduler.admit(at_distance(d)), Admission::Queued);
        }

        assert_eq!(scheduler.pop().unwrap(), at_distance(5));
        assert_eq!(scheduler.pop().unwrap(), at_distance(10));
        assert_eq!(scheduler.pop().unwrap(), at_distance(20));
        assert!(scheduler.pop().unwrap_err().is_empty_queue());
    }

    #[test]
    fn test_far_columns_keep_exact_order() {
        let scheduler = UpdateScheduler::with_defaults();
        observer_at_anchor_height(&scheduler);

        // Squared distances 9220776064 and 9220775040: equal once rounded to f32
        let farther = column(96000, 1792);
        let nearer = column(96016, 400);
        scheduler.admit(farther);
        scheduler.admit(nearer);

        assert_eq!(scheduler.pop().unwrap(), nearer);
        assert_eq!(scheduler.pop().unwrap(), farther);
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let bad = UpdateConfig { chunk_size: 0, ..Default::default() };
        assert!(matches!(UpdateScheduler::new(bad), Err(Error::Config(_))));

        let bad = UpdateConfig { safety_margin: -2, ..Default::default() };
        assert!(matches!(
            UpdateScheduler::with_policy(bad, Box::new(AlwaysAdmit)),
            Err(Error::Config(_))
        ));

        assert!(UpdateScheduler::new(UpdateConfig::default()).is_ok());
    }

    #[test]
    fn test_admit_counted_reports_length_after_admission() {
        let config = UpdateConfig {
            admission: AdmissionPolicyKind::DedupeByColumn,
            max_pending: Some(2),
            ..Default::default()
        };
        let scheduler = UpdateScheduler::new(config).unwrap();

        assert_eq!(scheduler.admit_counted(column(0, 0)), (Admission::Queued, 1));
        assert_eq!(scheduler.admit_counted(column(0, 0)), (Admission::Merged, 1));
        assert_eq!(scheduler.admit_counted(column(16, 0)), (Admission::Queued, 2));
        assert_eq!(
            scheduler.admit_counted(column(320, 0)),
            (Admission::Evicted(column(320, 0)), 2)
        );
    }

    #[test]
    fn test_ties_pop_in_admission_order() {
        let scheduler = UpdateScheduler::with_defaults();

        // Mirror images across the observer: identical distance
        let a = column(16, 0);
        let b = column(-32, 0);
        scheduler.admit(a);
        scheduler.admit(b);

        assert_eq!(scheduler.pop().unwrap(), a);
        assert_eq!(scheduler.pop().unwrap(), b);
    }

    #[test]
    fn test_peek_does_not_remove() {
        let scheduler = UpdateScheduler::with_defaults();
        scheduler.admit(column(32, 32));
        scheduler.admit(column(0, 0));

        assert_eq!(scheduler.peek().unwrap(), column(0, 0));
        assert_eq!(scheduler.len(), 2);
        assert_eq!(scheduler.pop().unwrap(), column(0, 0));
        assert_eq!(scheduler.peek().unwrap(), column(32, 32));
    }

    #[test]
    fn test_drain_batches() {
        let scheduler = UpdateScheduler::with_defaults();
        observer_at_anchor_height(&scheduler);
        for d in [40, 10, 30, 20, 50] {
            scheduler.admit(at_distance(d));
        }

        let batch = scheduler.drain(2);
        assert_eq!(batch, vec![at_distance(10), at_distance(20)]);
        assert_eq!(scheduler.len(), 3);

        let rest = scheduler.drain(10);
        assert_eq!(rest, vec![at_distance(30), at_distance(40), at_distance(50)]);
        assert!(scheduler.is_empty());
        assert_eq!(scheduler.stats().popped, 5);
    }

    #[test]
    fn test_always_admit_keeps_duplicates() {
        let scheduler = UpdateScheduler::with_defaults();
        scheduler.admit(column(0, 0));
        scheduler.admit(column(0, 0));

        assert_eq!(scheduler.len(), 2);
        assert_eq!(scheduler.drain(8), vec![column(0, 0), column(0, 0)]);
        assert!(!scheduler.contains_column(ColumnKey::new(0, 0)));
    }

    #[test]
    fn test_dedupe_by_column() {
        let config = UpdateConfig {
            admission: AdmissionPolicyKind::DedupeByColumn,
            ..Default::default()
        };
        let scheduler = UpdateScheduler::new(config).unwrap();
        assert_eq!(scheduler.policy_name(), "dedupe_by_column");

        assert_eq!(scheduler.admit(column(0, 0)), Admission::Queued);
        assert_eq!(scheduler.admit(column(0, 0)), Admission::Merged);
        assert_eq!(scheduler.admit(column(16, 0)), Admission::Queued);
        assert_eq!(scheduler.len(), 2);
        assert!(scheduler.contains_column(ColumnKey::new(0, 0)));

        // Once consumed, the column can be queued again
        assert_eq!(scheduler.pop().unwrap(), column(0, 0));
        assert_eq!(scheduler.admit(column(0, 0)), Admission::Queued);

        let stats = scheduler.stats();
        assert_eq!(stats.admitted, 3);
        assert_eq!(stats.merged, 1);
        assert_eq!(stats.pending, 2);
    }

    #[test]
    fn test_cap_evicts_farthest() {
        let config = UpdateConfig { max_pending: Some(2), ..Default::default() };
        let scheduler = UpdateScheduler::new(config).unwrap();
        observer_at_anchor_height(&scheduler);

        scheduler.admit(at_distance(30));
        scheduler.admit(at_distance(10));
        assert_eq!(scheduler.admit(at_distance(20)), Admission::Evicted(at_distance(30)));

        // A newcomer farther than everything pending is the one dropped
        assert_eq!(scheduler.admit(at_distance(99)), Admission::Evicted(at_distance(99)));

        assert_eq!(scheduler.drain(5), vec![at_distance(10), at_distance(20)]);
        assert_eq!(scheduler.stats().evicted, 2);
    }

    #[test]
    fn test_cap_evicts_latest_on_tie() {
        let config = UpdateConfig { max_pending: Some(1), ..Default::default() };
        let scheduler = UpdateScheduler::new(config).unwrap();

        let first = column(16, 0);
        let second = column(-32, 0);
        scheduler.admit(first);
        assert_eq!(scheduler.admit(second), Admission::Evicted(second));
        assert_eq!(scheduler.pop().unwrap(), first);
    }

    #[test]
    fn test_set_observer_reorders() {
        let scheduler = UpdateScheduler::with_defaults();
        let near_origin = column(0, 0);
        let far_east = column(320, 0);
        scheduler.admit(far_east);
        scheduler.admit(near_origin);
        assert_eq!(scheduler.peek().unwrap(), near_origin);

        scheduler.set_observer(Vec3::new(328.0, 8.0, 8.0));
        assert_eq!(scheduler.observer(), Vec3::new(328.0, 8.0, 8.0));
        assert_eq!(scheduler.pop().unwrap(), far_east);
        assert_eq!(scheduler.pop().unwrap(), near_origin);
    }

    #[test]
    fn test_clear() {
        let scheduler = UpdateScheduler::with_defaults();
        scheduler.admit(column(0, 0));
        scheduler.admit(column(16, 16));
        scheduler.clear();

        assert!(scheduler.is_empty());
        assert!(!scheduler.contains_column(ColumnKey::new(0, 0)));
        assert_eq!(scheduler.stats().admitted, 2);
    }

    #[test]
    fn test_concurrent_admit_and_drain() {
        let scheduler = Arc::new(UpdateScheduler::with_defaults());
        let producers: Vec<_> = (0..4)
            .map(|t| {
                let scheduler = Arc::clone(&scheduler);
                std::thread::spawn(move || {
                    for i in 0..250 {
                        scheduler.admit(column(i * 16, t * 16));
                    }
                })
            })
            .collect();

        let mut drained = 0;
        while drained < 1000 {
            drained += scheduler.drain(32).len();
            if producers.iter().all(|p| p.is_finished()) && scheduler.is_empty() {
                break;
            }
        }
        for producer in producers {
            producer.join().unwrap();
        }
        drained += scheduler.drain(usize::MAX).len();

        assert_eq!(drained, 1000);
        assert_eq!(scheduler.stats().popped, 1000);
    }
}
