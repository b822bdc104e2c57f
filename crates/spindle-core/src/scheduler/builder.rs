//! SchedulerBuilder - Scheduler の構築とワイヤリング
//!
//! # 使用例
//! ```ignore
//! let scheduler = Scheduler::builder()
//!     .pause_policy(PausePolicy::Elapse)
//!     .id_generator(SequentialIdGenerator::new())
//!     .build();
//! ```

use super::{PausePolicy, Scheduler, SchedulerConfig};
use crate::ports::{IdGenerator, SystemClock, UlidGenerator};

pub struct SchedulerBuilder {
    config: SchedulerConfig,
    ids: Option<Box<dyn IdGenerator>>,
}

impl SchedulerBuilder {
    pub fn new() -> Self {
        Self {
            config: SchedulerConfig::default(),
            ids: None,
        }
    }

    /// Replace the whole config (e.g. one loaded from a file).
    pub fn config(mut self, config: SchedulerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn pause_policy(mut self, policy: PausePolicy) -> Self {
        self.config.pause_policy = policy;
        self
    }

    /// Source of task handles. Defaults to ULIDs stamped with the system clock.
    pub fn id_generator(mut self, ids: impl IdGenerator + 'static) -> Self {
        self.ids = Some(Box::new(ids));
        self
    }

    pub fn build(self) -> Scheduler {
        let ids = self
            .ids
            .unwrap_or_else(|| Box::new(UlidGenerator::new(SystemClock)));
        Scheduler::from_parts(self.config, ids)
    }
}

impl Default for SchedulerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::SequentialIdGenerator;
    use crate::script::{Context, Step, from_fn};

    #[test]
    fn build_uses_default_config() {
        let scheduler = SchedulerBuilder::new().build();
        assert_eq!(scheduler.config(), &SchedulerConfig::default());
    }

    #[test]
    fn build_with_custom_policy_and_ids() {
        let mut scheduler = Scheduler::builder()
            .pause_policy(PausePolicy::Elapse)
            .id_generator(SequentialIdGenerator::new())
            .build();

        let id = scheduler.execute(from_fn(|_: &mut Context<'_>| Ok(Step::Complete)), ["a"]);

        assert_eq!(scheduler.config().pause_policy, PausePolicy::Elapse);
        assert_eq!(id.as_ulid().0, 1);
    }

    #[test]
    fn config_replaces_previous_settings() {
        let scheduler = Scheduler::builder()
            .pause_policy(PausePolicy::Elapse)
            .config(SchedulerConfig::default())
            .build();

        assert_eq!(scheduler.config().pause_policy, PausePolicy::Freeze);
    }
}
