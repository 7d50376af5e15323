//! Job Context - 变声任务
//!
//! 一次上传到输出的映射，由进程内的 JobStore 独占持有

mod entity;

pub use entity::{JobStatus, TransformationJob};
