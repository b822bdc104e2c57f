//! Read-only views of scheduler state, for debugging and tests.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::domain::{TaskId, TaskState};

/// What a task is parked on, if anything.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WaitSnapshot {
    /// In the time index, due at this scheduler clock value.
    Until { wake_at: f64 },
    /// In the signal index.
    Signal { name: String },
    /// Timer frozen by a pause, with the seconds left on it.
    FrozenSeconds { remaining: f64 },
    /// Signal wait frozen by a pause.
    FrozenSignal { name: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSnapshot {
    pub id: TaskId,
    pub state: TaskState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prior_state: Option<TaskState>,
    pub tags: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wait: Option<WaitSnapshot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskCounts {
    pub running: usize,
    pub paused: usize,
    pub waiting_for_time: usize,
    pub waiting_for_signal: usize,
    pub completed: usize,
}

impl TaskCounts {
    pub fn record(&mut self, state: TaskState) {
        match state {
            TaskState::Running => self.running += 1,
            TaskState::Paused => self.paused += 1,
            TaskState::WaitingForTime => self.waiting_for_time += 1,
            TaskState::WaitingForSignal => self.waiting_for_signal += 1,
            TaskState::Completed => self.completed += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.running + self.paused + self.waiting_for_time + self.waiting_for_signal + self.completed
    }

    /// Tasks that can still make progress.
    pub fn live(&self) -> usize {
        self.total() - self.completed
    }
}
