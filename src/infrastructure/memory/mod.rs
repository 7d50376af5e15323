//! Memory Layer - In-Memory State Management
//!
//! 实现 JobStore，管理变声任务历史的内存状态

mod job_store;

pub use job_store::InMemoryJobStore;
