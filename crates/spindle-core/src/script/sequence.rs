use std::collections::VecDeque;

use crate::domain::ScriptError;
use crate::script::{Context, Script, Step};

type Stage = Box<dyn FnOnce(&mut Context<'_>) -> Result<Step, ScriptError>>;

/// A linear script: each stage runs once, in order.
///
/// The step a stage returns decides how long the script parks before the next
/// stage runs. The script completes when a stage returns [`Step::Complete`]
/// or when it is stepped with no stages left.
///
/// ```ignore
/// let body = Sequence::new()
///     .then(|_| Ok(Step::wait_signal("done")))
///     .then(|_| Ok(Step::wait_seconds(3.0)))
///     .then(|_| {
///         println!("fixed");
///         Ok(Step::Complete)
///     });
/// ```
#[derive(Default)]
pub struct Sequence {
    stages: VecDeque<Stage>,
}

impl Sequence {
    pub fn new() -> Self {
        Self {
            stages: VecDeque::new(),
        }
    }

    pub fn then<F>(mut self, stage: F) -> Self
    where
        F: FnOnce(&mut Context<'_>) -> Result<Step, ScriptError> + 'static,
    {
        self.stages.push_back(Box::new(stage));
        self
    }

    /// Append a stage that only parks.
    pub fn wait(self, step: Step) -> Self {
        self.then(move |_| Ok(step))
    }

    pub fn remaining(&self) -> usize {
        self.stages.len()
    }
}

impl Script for Sequence {
    fn step(&mut self, cx: &mut Context<'_>) -> Result<Step, ScriptError> {
        match self.stages.pop_front() {
            Some(stage) => stage(cx),
            None => Ok(Step::Complete),
        }
    }
}
