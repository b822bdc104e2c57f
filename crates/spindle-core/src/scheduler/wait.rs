//! Wait indexes: who is parked on a timer, who is parked on a signal.
//!
//! Design:
//! - `time`: TaskId -> absolute wake time on the scheduler clock
//! - `signal`: TaskId -> name of the awaited signal
//! - Invariant: a TaskId is in at most one of the two maps
//!
//! Iteration order of a HashMap is arbitrary, so candidate scans walk the
//! scheduler's registration order and probe the maps.

use std::collections::{HashMap, HashSet};

use crate::domain::TaskId;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum WaitEntry {
    Time(f64),
    Signal(String),
}

#[derive(Debug, Default)]
pub(crate) struct WaitIndex {
    time: HashMap<TaskId, f64>,
    signal: HashMap<TaskId, String>,
}

impl WaitIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, task: TaskId) -> bool {
        self.time.contains_key(&task) || self.signal.contains_key(&task)
    }

    pub fn get(&self, task: TaskId) -> Option<WaitEntry> {
        if let Some(wake_at) = self.time.get(&task) {
            return Some(WaitEntry::Time(*wake_at));
        }
        self.signal
            .get(&task)
            .map(|name| WaitEntry::Signal(name.clone()))
    }

    /// Park `task` on the given entry. Returns false (and changes nothing)
    /// if the task already occupies either map.
    pub fn insert(&mut self, task: TaskId, entry: WaitEntry) -> bool {
        if self.contains(task) {
            return false;
        }
        match entry {
            WaitEntry::Time(wake_at) => {
                self.time.insert(task, wake_at);
            }
            WaitEntry::Signal(name) => {
                self.signal.insert(task, name);
            }
        }
        true
    }

    pub fn remove(&mut self, task: TaskId) -> Option<WaitEntry> {
        if let Some(wake_at) = self.time.remove(&task) {
            return Some(WaitEntry::Time(wake_at));
        }
        self.signal.remove(&task).map(WaitEntry::Signal)
    }

    /// Timers due at `now`, in `order`.
    pub fn expired(&self, order: &[TaskId], now: f64) -> Vec<TaskId> {
        order
            .iter()
            .copied()
            .filter(|task| self.time.get(task).is_some_and(|wake_at| *wake_at <= now))
            .collect()
    }

    /// Signal waits matched by `raised`, in `order`.
    pub fn signalled(&self, order: &[TaskId], raised: &HashSet<String>) -> Vec<TaskId> {
        order
            .iter()
            .copied()
            .filter(|task| self.signal.get(task).is_some_and(|name| raised.contains(name)))
            .collect()
    }

    /// Drop every entry whose task fails the predicate.
    pub fn retain(&mut self, mut keep: impl FnMut(TaskId) -> bool) {
        self.time.retain(|task, _| keep(*task));
        self.signal.retain(|task, _| keep(*task));
    }

    pub fn clear(&mut self) {
        self.time.clear();
        self.signal.clear();
    }

    #[cfg(test)]
    pub fn time_len(&self) -> usize {
        self.time.len()
    }

    #[cfg(test)]
    pub fn signal_len(&self) -> usize {
        self.signal.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ulid::Ulid;

    fn id(n: u128) -> TaskId {
        TaskId::from_ulid(Ulid(n))
    }

    #[test]
    fn a_task_occupies_at_most_one_map() {
        let mut index = WaitIndex::new();

        assert!(index.insert(id(1), WaitEntry::Time(2.0)));
        assert!(!index.insert(id(1), WaitEntry::Signal("go".into())));
        assert!(!index.insert(id(1), WaitEntry::Time(5.0)));

        assert_eq!(index.get(id(1)), Some(WaitEntry::Time(2.0)));
        assert_eq!(index.signal_len(), 0);
    }

    #[test]
    fn remove_returns_the_entry() {
        let mut index = WaitIndex::new();
        index.insert(id(1), WaitEntry::Signal("go".into()));

        assert_eq!(index.remove(id(1)), Some(WaitEntry::Signal("go".into())));
        assert_eq!(index.remove(id(1)), None);
        assert!(!index.contains(id(1)));
    }

    #[test]
    fn expired_follows_registration_order() {
        let mut index = WaitIndex::new();
        index.insert(id(3), WaitEntry::Time(1.0));
        index.insert(id(1), WaitEntry::Time(0.5));
        index.insert(id(2), WaitEntry::Time(9.0));

        let order = [id(1), id(2), id(3)];
        assert_eq!(index.expired(&order, 1.0), vec![id(1), id(3)]);
        assert_eq!(index.expired(&order, 0.25), Vec::<TaskId>::new());
    }

    #[test]
    fn signalled_matches_raised_names() {
        let mut index = WaitIndex::new();
        index.insert(id(1), WaitEntry::Signal("a".into()));
        index.insert(id(2), WaitEntry::Signal("b".into()));
        index.insert(id(3), WaitEntry::Time(0.0));

        let raised = HashSet::from(["b".to_string()]);
        assert_eq!(index.signalled(&[id(1), id(2), id(3)], &raised), vec![id(2)]);
    }

    #[test]
    fn retain_prunes_both_maps() {
        let mut index = WaitIndex::new();
        index.insert(id(1), WaitEntry::Signal("a".into()));
        index.insert(id(2), WaitEntry::Time(1.0));
        index.insert(id(3), WaitEntry::Time(1.0));

        index.retain(|task| task == id(3));

        assert_eq!(index.signal_len(), 0);
        assert_eq!(index.time_len(), 1);
        assert!(index.contains(id(3)));
    }
}
