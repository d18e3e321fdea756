//! Duplicate-alert suppression.

use std::collections::{HashSet, VecDeque};

/// Default capacity of the recently-flagged set.
pub const FLAGGED_CAPACITY: usize = 100;

/// Insertion-ordered set of recently reported process identifiers.
///
/// Suppresses repeat alerts for the same still-running offender. When over
/// capacity the oldest entry is evicted, so a long-lived offender will be
/// re-reported eventually rather than silenced forever.
#[derive(Debug)]
pub struct RecentlyFlaggedSet {
    order: VecDeque<u32>,
    members: HashSet<u32>,
    capacity: usize,
}

impl RecentlyFlaggedSet {
    pub fn new(capacity: usize) -> Self {
        Self {
            order: VecDeque::with_capacity(capacity),
            members: HashSet::with_capacity(capacity),
            capacity,
        }
    }

    /// Record `pid`; returns true if it was not already present (i.e. the
    /// caller should report it).
    pub fn insert(&mut self, pid: u32) -> bool {
        if !self.members.insert(pid) {
            return false;
        }
        self.order.push_back(pid);
        if self.order.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.members.remove(&oldest);
            }
        }
        true
    }

    pub fn contains(&self, pid: u32) -> bool {
        self.members.contains(&pid)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl Default for RecentlyFlaggedSet {
    fn default() -> Self {
        Self::new(FLAGGED_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_insert_reports_second_suppresses() {
        let mut set = RecentlyFlaggedSet::default();
        assert!(set.insert(42));
        assert!(!set.insert(42));
    }

    #[test]
    fn eviction_is_oldest_first() {
        let mut set = RecentlyFlaggedSet::new(3);
        set.insert(1);
        set.insert(2);
        set.insert(3);
        set.insert(4);
        assert_eq!(set.len(), 3);
        assert!(!set.contains(1));
        assert!(set.contains(4));
    }

    #[test]
    fn evicted_pid_reports_again() {
        let mut set = RecentlyFlaggedSet::new(2);
        set.insert(1);
        set.insert(2);
        set.insert(3); // evicts 1
        assert!(set.insert(1));
    }
}
