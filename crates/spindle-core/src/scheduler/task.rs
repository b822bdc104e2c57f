//! Task record: one script instance + its scheduling metadata.

use std::collections::BTreeSet;
use std::fmt;

use crate::domain::{TaskId, TaskState};
use crate::script::Script;

/// A wait held aside while the task is paused under `PausePolicy::Freeze`.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum FrozenWait {
    /// Seconds that were left on the timer when the pause happened.
    Seconds(f64),
    Signal(String),
}

/// Metadata + body for a task in the scheduler.
///
/// Design:
/// - This is the single source of truth for the task's state.
/// - Wait indexes hold TaskId only.
/// - State bookkeeping lives here; index bookkeeping lives in the scheduler.
pub(crate) struct Task {
    pub id: TaskId,
    pub state: TaskState,

    /// State to restore on resume. Only meaningful while Paused.
    prior_state: Option<TaskState>,

    /// Fixed at creation.
    pub tags: BTreeSet<String>,

    /// None while the body is being stepped, and after completion.
    body: Option<Box<dyn Script>>,

    pub frozen: Option<FrozenWait>,

    /// Set when the body returned an error.
    pub failure: Option<String>,

    /// Tick number of the last step, used to enforce one step per tick.
    pub last_stepped: Option<u64>,
}

impl Task {
    pub fn new(id: TaskId, body: Box<dyn Script>, tags: BTreeSet<String>) -> Self {
        Self {
            id,
            state: TaskState::Running,
            prior_state: None,
            tags,
            body: Some(body),
            frozen: None,
            failure: None,
            last_stepped: None,
        }
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    pub fn prior_state(&self) -> Option<TaskState> {
        self.prior_state
    }

    /// Lend the body out for one step.
    pub fn take_body(&mut self) -> Option<Box<dyn Script>> {
        self.body.take()
    }

    /// Put the body back after a step. A task that completed meanwhile drops it.
    pub fn restore_body(&mut self, body: Box<dyn Script>) {
        if !self.state.is_terminal() {
            self.body = Some(body);
        }
    }

    /// Record the current state and freeze. Returns false for a no-op.
    pub fn pause(&mut self) -> bool {
        if matches!(self.state, TaskState::Paused | TaskState::Completed) {
            return false;
        }
        self.prior_state = Some(self.state);
        self.state = TaskState::Paused;
        true
    }

    /// Restore the state saved by `pause`. Returns the restored state, or None
    /// when the task was not paused.
    pub fn resume(&mut self) -> Option<TaskState> {
        if self.state != TaskState::Paused {
            return None;
        }
        self.state = self.prior_state.take().unwrap_or(TaskState::Running);
        Some(self.state)
    }

    /// Returns false if the task was already completed.
    pub fn cancel(&mut self) -> bool {
        if self.state.is_terminal() {
            return false;
        }
        self.finish();
        true
    }

    pub fn complete(&mut self) {
        self.finish();
    }

    pub fn fail(&mut self, message: String) {
        self.failure = Some(message);
        self.finish();
    }

    /// Enter a wait state. A task that paused itself during its own step keeps
    /// the pause and the wait becomes the state restored on resume.
    pub fn enter_wait(&mut self, waiting: TaskState) {
        debug_assert!(waiting.is_waiting());
        if self.state == TaskState::Paused {
            self.prior_state = Some(waiting);
        } else {
            self.state = waiting;
        }
    }

    /// Back to Running after a wait was satisfied.
    pub fn wake(&mut self) {
        self.state = TaskState::Running;
    }

    fn finish(&mut self) {
        self.state = TaskState::Completed;
        self.prior_state = None;
        self.frozen = None;
        self.body = None;
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("prior_state", &self.prior_state)
            .field("tags", &self.tags)
            .field("frozen", &self.frozen)
            .field("failure", &self.failure)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::{Context, Step, from_fn};
    use rstest::rstest;
    use ulid::Ulid;

    fn task() -> Task {
        let body = from_fn(|_: &mut Context<'_>| Ok(Step::Complete));
        Task::new(
            TaskId::from_ulid(Ulid(7)),
            Box::new(body),
            BTreeSet::from(["clock".to_string()]),
        )
    }

    #[rstest]
    #[case(TaskState::Running)]
    #[case(TaskState::WaitingForTime)]
    #[case(TaskState::WaitingForSignal)]
    fn pause_then_resume_restores_state(#[case] before: TaskState) {
        let mut t = task();
        t.state = before;

        assert!(t.pause());
        assert_eq!(t.state, TaskState::Paused);
        assert_eq!(t.prior_state(), Some(before));

        assert_eq!(t.resume(), Some(before));
        assert_eq!(t.state, before);
    }

    #[test]
    fn pausing_twice_keeps_the_first_prior_state() {
        let mut t = task();
        t.state = TaskState::WaitingForTime;

        assert!(t.pause());
        assert!(!t.pause());
        assert_eq!(t.resume(), Some(TaskState::WaitingForTime));
    }

    #[test]
    fn resume_on_non_paused_task_is_noop() {
        let mut t = task();
        assert_eq!(t.resume(), None);
        assert_eq!(t.state, TaskState::Running);
    }

    #[test]
    fn cancel_is_idempotent_and_terminal() {
        let mut t = task();

        assert!(t.cancel());
        assert!(!t.cancel());
        assert_eq!(t.state, TaskState::Completed);
        assert!(!t.pause());
        assert_eq!(t.resume(), None);
        assert!(t.take_body().is_none());
    }

    #[test]
    fn body_is_dropped_when_task_completed_while_lent_out() {
        let mut t = task();
        let body = t.take_body().unwrap();
        t.cancel();
        t.restore_body(body);

        assert!(t.take_body().is_none());
    }

    #[test]
    fn waiting_while_self_paused_updates_prior_state() {
        let mut t = task();
        t.pause();
        t.enter_wait(TaskState::WaitingForSignal);

        assert_eq!(t.state, TaskState::Paused);
        assert_eq!(t.resume(), Some(TaskState::WaitingForSignal));
    }
}
