//! spindle-core
//!
//! 協調的な tick 駆動のスクリプトスケジューラ
//!
//! script は [`Scheduler::update`] で 1 ステップずつ進められる再開可能な
//! ステートマシンです。各ステップで「終了する」「一定時間または名前付き
//! シグナルを待つ」「次の tick でもう一度進めてもらう」のいずれかを選びます。
//! タスクには文字列タグを付けられ、タグ単位で pause / resume / abort できます。
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, state, suspend, errors）
//! - **ports**: 抽象化レイヤー（Clock, IdGenerator）
//! - **script**: Script trait, Step, Context, Sequence
//! - **scheduler**: Scheduler 本体、設定、スナップショット

pub mod domain;
pub mod ports;
pub mod scheduler;
pub mod script;

pub use domain::{SchedulerError, ScriptError, Suspend, TaskId, TaskState};
pub use scheduler::{
    PausePolicy, Scheduler, SchedulerBuilder, SchedulerConfig, TaskCounts, TaskSnapshot,
    WaitSnapshot,
};
pub use script::{Context, Script, Sequence, Step};

/// Tag list for a task that carries no tags.
pub const NO_TAGS: [&str; 0] = [];
