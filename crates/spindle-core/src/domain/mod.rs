//! Domain model (ids, task state, suspend requests, errors).

pub mod errors;
pub mod ids;
pub mod state;
pub mod suspend;

pub use self::errors::{SchedulerError, ScriptError};
pub use self::ids::{Id, IdMarker, TaskId, TaskMarker};
pub use self::state::TaskState;
pub use self::suspend::Suspend;
