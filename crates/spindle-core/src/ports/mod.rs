//! Ports - 抽象化レイヤー
//!
//! Scheduler の外側にある関心事（壁時計、ID 生成）を trait として切り出し、
//! テストで差し替えられるようにします。

pub mod clock;
pub mod id_generator;

pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::id_generator::{IdGenerator, SequentialIdGenerator, UlidGenerator};
