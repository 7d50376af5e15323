//! Domain Layer - 领域层
//!
//! 包含两个限界上下文:
//! - Voice Context: 静态音色目录
//! - Job Context: 变声任务记录

pub mod job;
pub mod voice;

// 共享的变调算法
mod pitch;

pub use pitch::{pitch_shift, resample_indices};
