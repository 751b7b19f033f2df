//! 内存模块 - 槽位模型与共享存储

pub mod slot;
pub mod storage;

pub use slot::{Slot, SlotState};
pub use storage::SlotStorage;
