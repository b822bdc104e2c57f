use crate::domain::TaskId;
use crate::scheduler::Scheduler;
use crate::script::Script;

/// Handed to a script for the duration of one step.
///
/// Gives the script the tick's delta and the scheduler operations a script
/// may call on itself or its peers. `update` is deliberately absent: a
/// script cannot drive a nested tick.
pub struct Context<'a> {
    scheduler: &'a mut Scheduler,
    task: TaskId,
    delta: f64,
}

impl<'a> Context<'a> {
    pub(crate) fn new(scheduler: &'a mut Scheduler, task: TaskId, delta: f64) -> Self {
        Self {
            scheduler,
            task,
            delta,
        }
    }

    /// The task being stepped.
    pub fn task_id(&self) -> TaskId {
        self.task
    }

    /// Seconds passed to the `update` driving this step.
    pub fn delta(&self) -> f64 {
        self.delta
    }

    /// Scheduler clock after this tick's advance.
    pub fn now(&self) -> f64 {
        self.scheduler.now()
    }

    pub fn tick_count(&self) -> u64 {
        self.scheduler.tick_count()
    }

    /// Raise a signal; tasks waiting on it wake later in this same tick.
    pub fn send_signal(&mut self, name: impl Into<String>) {
        self.scheduler.send_signal(name);
    }

    /// Start another script. It first runs on the next tick.
    pub fn execute<S, I, T>(&mut self, body: S, tags: I) -> TaskId
    where
        S: Script + 'static,
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.scheduler.execute(body, tags)
    }

    pub fn execute_with_args<A, S, F, I, T>(&mut self, factory: F, args: A, tags: I) -> TaskId
    where
        F: FnOnce(A) -> S,
        S: Script + 'static,
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.scheduler.execute_with_args(factory, args, tags)
    }

    pub fn pause_by_tag(&mut self, tag: &str) {
        self.scheduler.pause_by_tag(tag);
    }

    pub fn resume_by_tag(&mut self, tag: &str) {
        self.scheduler.resume_by_tag(tag);
    }

    pub fn abort_by_tag(&mut self, tag: &str) {
        self.scheduler.abort_by_tag(tag);
    }

    pub fn abort_without_tag(&mut self, tag: &str) {
        self.scheduler.abort_without_tag(tag);
    }

    pub fn abort_all(&mut self) {
        self.scheduler.abort_all();
    }

    pub fn tasks_by_tag(&self, tag: &str) -> Vec<TaskId> {
        self.scheduler.tasks_by_tag(tag)
    }
}
