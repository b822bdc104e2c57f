//! Script - Scheduler が実行する再開可能な処理
//!
//! Rust には安定版のジェネレータがないので、script は「1 単位だけ進めて、
//! 次にどうしたいかを返す」ステートマシンとして表現します。
//!
//! # 二層構造
//! - **`Script` trait**: 任意の型で実装できる（enum のステートマシンなど）
//! - **クロージャ**: `FnMut(&mut Context<'_>) -> Result<Step, ScriptError>` は
//!   そのまま `Script` として使える
//!
//! 直線的な script は [`Sequence`] で段階ごとのクロージャを並べて書けます。

mod context;
mod sequence;

pub use self::context::Context;
pub use self::sequence::Sequence;

use crate::domain::{ScriptError, Suspend};

/// What a script wants after one unit of work.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// No more work; the task completes.
    Complete,

    /// Park until the request is satisfied.
    Wait(Suspend),

    /// Stay running and get stepped again on the next tick.
    Skip,
}

impl Step {
    pub fn wait_seconds(delay: f64) -> Self {
        Step::Wait(Suspend::seconds(delay))
    }

    pub fn wait_signal(name: impl Into<String>) -> Self {
        Step::Wait(Suspend::signal(name))
    }
}

/// Script は Scheduler によって 1 tick に高々 1 回進められる
///
/// # 使用例
/// ```ignore
/// let mut remaining = 3;
/// scheduler.execute(
///     move |_cx: &mut Context<'_>| {
///         if remaining == 0 {
///             return Ok(Step::Complete);
///         }
///         remaining -= 1;
///         Ok(Step::wait_seconds(1.0))
///     },
///     ["countdown"],
/// );
/// ```
pub trait Script {
    /// Run one unit of work.
    ///
    /// Returning `Err` completes the task as failed and the error is
    /// propagated out of [`Scheduler::update`](crate::Scheduler::update).
    fn step(&mut self, cx: &mut Context<'_>) -> Result<Step, ScriptError>;
}

impl<F> Script for F
where
    F: FnMut(&mut Context<'_>) -> Result<Step, ScriptError>,
{
    fn step(&mut self, cx: &mut Context<'_>) -> Result<Step, ScriptError> {
        self(cx)
    }
}

/// Pin a closure to the [`Script`] signature so its argument types are
/// inferred without annotations.
pub fn from_fn<F>(f: F) -> F
where
    F: FnMut(&mut Context<'_>) -> Result<Step, ScriptError>,
{
    f
}
