//! Scheduler - 中断と再開のエンジン
//!
//! # 1 tick の流れ（`update`）
//! 1. 時計を進める
//! 2. シグナル集合をクリアし、tick 外で送られたシグナルを取り込む
//! 3. Completed のタスクを掃除（待機インデックスの残骸も消す）
//! 4. Running のタスクをスナップショット順に 1 ステップずつ進める
//! 5. 期限切れのタイマー待ちを起こし、その場で 1 ステップ進める
//! 6. シグナル待ちを起こし、その場で 1 ステップ進める
//!    （起こしたタスクが新しく送ったシグナルも同じ tick 内で配送する。
//!    同じシグナルで同じ待機を 2 回起こすことはない）
//!
//! どのタスクも 1 tick に 2 回以上は進めない。同じ tick 内で既に進めたタスクが
//! 起こされた場合は Running に戻すだけで、次の tick で進める。
//!
//! script のエラーや契約違反が起きても tick は最後まで進め、最初のエラーを返す。

mod builder;
mod config;
mod snapshot;
mod task;
mod wait;


pub use self::builder::SchedulerBuilder;
pub use self::config::{PausePolicy, SchedulerConfig};
pub use self::snapshot::{TaskCounts, TaskSnapshot, WaitSnapshot};

use std::collections::{BTreeSet, HashMap, HashSet};

use tracing::{debug, error, trace};

use self::task::{FrozenWait, Task};
use self::wait::{WaitEntry, WaitIndex};
use crate::domain::{SchedulerError, Suspend, TaskId, TaskState};
use crate::ports::IdGenerator;
use crate::script::{Context, Script, Step};

pub struct Scheduler {
    config: SchedulerConfig,
    ids: Box<dyn IdGenerator>,

    /// Accumulated tick deltas.
    now: f64,

    /// Number of `update` calls that advanced the clock.
    tick: u64,

    /// True while `update` is stepping scripts.
    in_tick: bool,

    /// Registration order; drives every scan so results are deterministic.
    order: Vec<TaskId>,

    records: HashMap<TaskId, Task>,
    waits: WaitIndex,

    /// Signals raised during the current tick.
    raised: HashSet<String>,

    /// Signals sent by the host between ticks, raised at the next tick.
    pending: HashSet<String>,
}

impl Scheduler {
    /// Scheduler with the default config and ULID task handles.
    pub fn new() -> Self {
        SchedulerBuilder::new().build()
    }

    pub fn builder() -> SchedulerBuilder {
        SchedulerBuilder::new()
    }

    pub(crate) fn from_parts(config: SchedulerConfig, ids: Box<dyn IdGenerator>) -> Self {
        Self {
            config,
            ids,
            now: 0.0,
            tick: 0,
            in_tick: false,
            order: Vec::new(),
            records: HashMap::new(),
            waits: WaitIndex::new(),
            raised: HashSet::new(),
            pending: HashSet::new(),
        }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Register a script under the given tags. It starts Running and is first
    /// stepped on the next tick's running pass.
    pub fn execute<S, I, T>(&mut self, body: S, tags: I) -> TaskId
    where
        S: Script + 'static,
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let id = self.allocate_task_id();
        let tags: BTreeSet<String> = tags.into_iter().map(Into::into).collect();
        debug!(task = %id, ?tags, "task scheduled");

        self.records.insert(id, Task::new(id, Box::new(body), tags));
        self.order.push(id);
        id
    }

    /// Build a script from `factory` and fixed arguments, then register it.
    ///
    /// Several arguments travel as a tuple:
    /// ```ignore
    /// scheduler.execute_with_args(
    ///     |(name, fix_seconds)| clockmaker(name, fix_seconds),
    ///     ("Gilligan".to_string(), 3.0),
    ///     ["crew"],
    /// );
    /// ```
    pub fn execute_with_args<A, S, F, I, T>(&mut self, factory: F, args: A, tags: I) -> TaskId
    where
        F: FnOnce(A) -> S,
        S: Script + 'static,
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.execute(factory(args), tags)
    }

    /// Advance the clock by `delta` seconds and run one tick.
    ///
    /// A script error or contract violation marks the offending task
    /// Completed (failed); the rest of the tick still runs and the first such
    /// error is returned.
    pub fn update(&mut self, delta: f64) -> Result<(), SchedulerError> {
        if !delta.is_finite() || delta < 0.0 {
            return Err(SchedulerError::InvalidDelta(delta));
        }

        self.now += delta;
        self.tick += 1;

        self.raised.clear();
        let pending = std::mem::take(&mut self.pending);
        self.raised.extend(pending);

        self.purge_completed();
        trace!(tick = self.tick, now = self.now, tasks = self.order.len(), "tick");

        self.in_tick = true;
        let first_error = self.run_tick(delta);
        self.in_tick = false;
        first_error.map_or(Ok(()), Err)
    }

    fn run_tick(&mut self, delta: f64) -> Option<SchedulerError> {
        let mut first_error = None;

        let running: Vec<TaskId> = self
            .order
            .iter()
            .copied()
            .filter(|id| self.state(*id) == Some(TaskState::Running))
            .collect();
        for id in running {
            keep_first(&mut first_error, self.step_task(id, delta));
        }

        let due = self.waits.expired(&self.order, self.now);
        for id in due {
            keep_first(&mut first_error, self.reawaken(id, TaskState::WaitingForTime, delta));
        }

        // Each pass only matches names raised since the previous pass, so a
        // waiter re-registered on a name it was just woken by stays parked.
        let mut fresh = self.raised.clone();
        while !fresh.is_empty() {
            let seen = self.raised.clone();
            let signalled = self.waits.signalled(&self.order, &fresh);
            for id in signalled {
                keep_first(
                    &mut first_error,
                    self.reawaken(id, TaskState::WaitingForSignal, delta),
                );
            }
            fresh = self.raised.difference(&seen).cloned().collect();
        }

        first_error
    }

    /// Wake a wait candidate and give it its courtesy step.
    fn reawaken(
        &mut self,
        id: TaskId,
        expected: TaskState,
        delta: f64,
    ) -> Result<(), SchedulerError> {
        let Some(task) = self.records.get_mut(&id) else {
            return Ok(());
        };
        // Cancelled or paused by an earlier step in this tick.
        if task.state != expected {
            return Ok(());
        }
        if self.waits.remove(id).is_none() {
            return Ok(());
        }

        task.wake();
        let stepped_this_tick = task.last_stepped == Some(self.tick);
        debug!(task = %id, from = ?expected, "task reawakened");

        if stepped_this_tick {
            return Ok(());
        }
        self.step_task(id, delta)
    }

    /// Advance one Running task by one unit of its script.
    fn step_task(&mut self, id: TaskId, delta: f64) -> Result<(), SchedulerError> {
        let tick = self.tick;
        let Some(task) = self.records.get_mut(&id) else {
            return Ok(());
        };
        if task.state != TaskState::Running || task.last_stepped == Some(tick) {
            return Ok(());
        }
        task.last_stepped = Some(tick);
        let Some(mut body) = task.take_body() else {
            return Ok(());
        };

        let result = {
            let mut cx = Context::new(self, id, delta);
            body.step(&mut cx)
        };

        let Some(task) = self.records.get_mut(&id) else {
            return Ok(());
        };
        task.restore_body(body);

        match result {
            Ok(Step::Skip) => Ok(()),
            Ok(Step::Complete) => {
                task.complete();
                self.waits.remove(id);
                debug!(task = %id, "task completed");
                Ok(())
            }
            Ok(Step::Wait(request)) => {
                if task.state.is_terminal() {
                    debug!(task = %id, "task cancelled during its own step, wait dropped");
                    return Ok(());
                }
                self.register_wait(id, request)
            }
            Err(source) => {
                error!(task = %id, error = %source, "script failed");
                task.fail(source.to_string());
                self.waits.remove(id);
                Err(SchedulerError::ScriptFailed { task: id, source })
            }
        }
    }

    /// Park `id` on the given request.
    ///
    /// A task that paused itself during the step that produced the request
    /// stays Paused; the wait is what it resumes into.
    pub(crate) fn register_wait(
        &mut self,
        id: TaskId,
        request: Suspend,
    ) -> Result<(), SchedulerError> {
        let policy = self.config.pause_policy;
        let now = self.now;
        let Some(task) = self.records.get_mut(&id) else {
            return Ok(());
        };

        if self.waits.contains(id) || task.frozen.is_some() {
            task.fail("registered a second wait".to_string());
            self.waits.remove(id);
            return Err(SchedulerError::AlreadyWaiting(id));
        }

        let (entry, waiting) = match request {
            Suspend::Seconds(delay) => (WaitEntry::Time(now + delay.max(0.0)), TaskState::WaitingForTime),
            Suspend::Signal(name) if name.is_empty() => {
                task.fail("waited for an empty signal name".to_string());
                return Err(SchedulerError::EmptySignalName(id));
            }
            Suspend::Signal(name) => (WaitEntry::Signal(name), TaskState::WaitingForSignal),
        };
        debug!(task = %id, wait = ?entry, "task waiting");

        if task.state == TaskState::Paused && policy == PausePolicy::Freeze {
            task.frozen = Some(match entry {
                WaitEntry::Time(wake_at) => FrozenWait::Seconds(wake_at - now),
                WaitEntry::Signal(name) => FrozenWait::Signal(name),
            });
        } else {
            self.waits.insert(id, entry);
        }
        task.enter_wait(waiting);
        Ok(())
    }

    /// Raise a signal.
    ///
    /// From inside a tick the signal is current immediately, so its waiters
    /// wake later in the same tick. From the host, between ticks, it becomes
    /// current at the start of the next tick.
    pub fn send_signal(&mut self, name: impl Into<String>) {
        let name = name.into();
        trace!(signal = %name, in_tick = self.in_tick, "signal sent");
        if self.in_tick {
            self.raised.insert(name);
        } else {
            self.pending.insert(name);
        }
    }

    pub fn pause_by_tag(&mut self, tag: &str) {
        for id in self.tasks_by_tag(tag) {
            self.pause_task(id);
        }
    }

    pub fn resume_by_tag(&mut self, tag: &str) {
        for id in self.tasks_by_tag(tag) {
            self.resume_task(id);
        }
    }

    /// Cancel every task carrying `tag`. Their waits are dropped immediately.
    pub fn abort_by_tag(&mut self, tag: &str) {
        let aborted = self.abort_where(|task| task.has_tag(tag));
        debug!(tag, aborted, "tasks aborted by tag");
    }

    /// Cancel every task not carrying `tag`.
    pub fn abort_without_tag(&mut self, tag: &str) {
        let aborted = self.abort_where(|task| !task.has_tag(tag));
        debug!(tag, aborted, "tasks aborted without tag");
    }

    /// Cancel everything and forget all waits and raised signals.
    pub fn abort_all(&mut self) {
        let mut aborted = 0;
        for task in self.records.values_mut() {
            if task.cancel() {
                aborted += 1;
            }
        }
        self.waits.clear();
        self.raised.clear();
        self.pending.clear();
        debug!(aborted, "all tasks aborted");
    }

    fn pause_task(&mut self, id: TaskId) {
        let policy = self.config.pause_policy;
        let now = self.now;
        let Some(task) = self.records.get_mut(&id) else {
            return;
        };
        if !task.pause() {
            return;
        }

        if policy == PausePolicy::Freeze {
            task.frozen = self.waits.remove(id).map(|entry| match entry {
                WaitEntry::Time(wake_at) => FrozenWait::Seconds((wake_at - now).max(0.0)),
                WaitEntry::Signal(name) => FrozenWait::Signal(name),
            });
        }
        debug!(task = %id, prior = ?task.prior_state(), "task paused");
    }

    fn resume_task(&mut self, id: TaskId) {
        let now = self.now;
        let Some(task) = self.records.get_mut(&id) else {
            return;
        };
        let Some(restored) = task.resume() else {
            return;
        };

        if let Some(frozen) = task.frozen.take() {
            let entry = match frozen {
                FrozenWait::Seconds(remaining) => WaitEntry::Time(now + remaining),
                FrozenWait::Signal(name) => WaitEntry::Signal(name),
            };
            let reinstated = self.waits.insert(id, entry);
            debug_assert!(reinstated, "{id} resumed while still holding a wait entry");
            if !reinstated {
                error!(task = %id, "frozen wait dropped on resume, index already occupied");
            }
        }
        debug!(task = %id, state = ?restored, "task resumed");
    }

    fn abort_where(&mut self, mut matches: impl FnMut(&Task) -> bool) -> usize {
        let mut aborted = 0;
        for task in self.records.values_mut() {
            if matches(&*task) && task.cancel() {
                aborted += 1;
            }
        }

        let records = &self.records;
        self.waits
            .retain(|id| records.get(&id).is_some_and(|task| !task.state.is_terminal()));
        aborted
    }

    fn purge_completed(&mut self) {
        let records = &mut self.records;
        self.order.retain(|id| {
            let live = records.get(id).is_some_and(|task| !task.state.is_terminal());
            if !live {
                records.remove(id);
            }
            live
        });

        let records = &self.records;
        self.waits.retain(|id| records.contains_key(&id));
    }

    fn allocate_task_id(&mut self) -> TaskId {
        loop {
            let id = self.ids.generate_task_id();
            if !self.records.contains_key(&id) {
                return id;
            }
            debug!(task = %id, "generated task id collides with a registered task, retrying");
        }
    }

    // ---- introspection ----

    /// Scheduler clock: the sum of all deltas passed to `update`.
    pub fn now(&self) -> f64 {
        self.now
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    /// Every registered task in registration order, including tasks that
    /// completed this tick and have not been purged yet.
    pub fn all_tasks(&self) -> Vec<TaskId> {
        self.order.clone()
    }

    pub fn tasks_by_tag(&self, tag: &str) -> Vec<TaskId> {
        self.order
            .iter()
            .copied()
            .filter(|id| self.records.get(id).is_some_and(|task| task.has_tag(tag)))
            .collect()
    }

    pub fn state(&self, id: TaskId) -> Option<TaskState> {
        self.records.get(&id).map(|task| task.state)
    }

    pub fn snapshot(&self, id: TaskId) -> Option<TaskSnapshot> {
        let task = self.records.get(&id)?;
        let wait = match (self.waits.get(id), &task.frozen) {
            (Some(WaitEntry::Time(wake_at)), _) => Some(WaitSnapshot::Until { wake_at }),
            (Some(WaitEntry::Signal(name)), _) => Some(WaitSnapshot::Signal { name }),
            (None, Some(FrozenWait::Seconds(remaining))) => Some(WaitSnapshot::FrozenSeconds {
                remaining: *remaining,
            }),
            (None, Some(FrozenWait::Signal(name))) => {
                Some(WaitSnapshot::FrozenSignal { name: name.clone() })
            }
            (None, None) => None,
        };

        Some(TaskSnapshot {
            id,
            state: task.state,
            prior_state: task.prior_state(),
            tags: task.tags.clone(),
            wait,
            failure: task.failure.clone(),
        })
    }

    pub fn snapshots(&self) -> Vec<TaskSnapshot> {
        self.order.iter().filter_map(|id| self.snapshot(*id)).collect()
    }

    pub fn counts(&self) -> TaskCounts {
        let mut counts = TaskCounts::default();
        for task in self.records.values() {
            counts.record(task.state);
        }
        counts
    }

    /// No task can make progress any more.
    pub fn is_idle(&self) -> bool {
        self.records.values().all(|task| task.state.is_terminal())
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

/// Keep the first failure of a tick; later ones are only logged.
fn keep_first(slot: &mut Option<SchedulerError>, result: Result<(), SchedulerError>) {
    let Err(err) = result else {
        return;
    };
    match slot {
        None => *slot = Some(err),
        Some(_) => error!(error = %err, "further failure in the same tick"),
    }
}
