//! State - タスクの状態
//!
//! # 状態遷移
//! - Running ⇄ Paused（pause / resume）
//! - Running → WaitingForTime → Running（待機登録 / 時間経過）
//! - Running → WaitingForSignal → Running（待機登録 / シグナル受信）
//! - WaitingFor* ⇄ Paused（待機中の pause / resume）
//! - 任意の状態 → Completed（cancel、または本体の終了）
//!
//! Completed は終端状態で、そこから出る遷移はありません。

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    /// Eligible to be stepped on the next running pass.
    Running,

    /// Frozen by a pause; the state before the pause is kept aside.
    Paused,

    /// Parked in the time-wait index.
    WaitingForTime,

    /// Parked in the signal-wait index.
    WaitingForSignal,

    /// Finished, cancelled or failed. Purged at the start of the next tick.
    Completed,
}

impl TaskState {
    /// Is this a terminal state (no further transitions)?
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskState::Completed)
    }

    /// Is the task parked on a time or signal wait?
    pub fn is_waiting(self) -> bool {
        matches!(self, TaskState::WaitingForTime | TaskState::WaitingForSignal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(TaskState::Running, false, false)]
    #[case(TaskState::Paused, false, false)]
    #[case(TaskState::WaitingForTime, false, true)]
    #[case(TaskState::WaitingForSignal, false, true)]
    #[case(TaskState::Completed, true, false)]
    fn classification(#[case] state: TaskState, #[case] terminal: bool, #[case] waiting: bool) {
        assert_eq!(state.is_terminal(), terminal);
        assert_eq!(state.is_waiting(), waiting);
    }

    #[test]
    fn serializes_as_snake_case() {
        let json = serde_json::to_string(&TaskState::WaitingForSignal).unwrap();
        assert_eq!(json, "\"waiting_for_signal\"");
    }
}
