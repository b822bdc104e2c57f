//! Errors - エラー型と分類
//!
//! # 分類
//! - 契約違反（プログラマのバグ）: `SchedulerError` として `update` から返す
//! - 良性の競合（同じ tick 内で abort 済みなど）: エラーにせずスキップ
//! - 無害な入力（誰も待っていないシグナルなど）: no-op

use thiserror::Error;

use super::ids::TaskId;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// ScriptError は script 本体が返す失敗
///
/// Scheduler は握りつぶさず、`SchedulerError::ScriptFailed` として
/// `update` の呼び出し元に返します。
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ScriptError {
    message: String,
    #[source]
    source: Option<BoxError>,
}

impl ScriptError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Wrap an underlying error raised inside a script.
    pub fn with_source(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("tick delta must be finite and non-negative, got {0}")]
    InvalidDelta(f64),

    #[error("{0} registered a second wait while already waiting")]
    AlreadyWaiting(TaskId),

    #[error("{0} asked to wait for a signal with an empty name")]
    EmptySignalName(TaskId),

    #[error("script of {task} failed: {source}")]
    ScriptFailed {
        task: TaskId,
        #[source]
        source: ScriptError,
    },
}

impl SchedulerError {
    /// The task at fault, if the error is tied to one.
    pub fn task(&self) -> Option<TaskId> {
        match self {
            SchedulerError::InvalidDelta(_) => None,
            SchedulerError::AlreadyWaiting(task)
            | SchedulerError::EmptySignalName(task)
            | SchedulerError::ScriptFailed { task, .. } => Some(*task),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;
    use ulid::Ulid;

    #[test]
    fn script_error_keeps_source() {
        let io = std::io::Error::other("disk on fire");
        let err = ScriptError::with_source("could not load level", io);

        assert_eq!(err.to_string(), "could not load level");
        assert_eq!(err.source().unwrap().to_string(), "disk on fire");
    }

    #[test]
    fn script_failed_names_the_task() {
        let task = TaskId::from_ulid(Ulid::new());
        let err = SchedulerError::ScriptFailed {
            task,
            source: ScriptError::new("boom"),
        };

        assert_eq!(err.task(), Some(task));
        assert!(err.to_string().contains("boom"));
        assert!(err.to_string().contains(&task.to_string()));
    }
}
