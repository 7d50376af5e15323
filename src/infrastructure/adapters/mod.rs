//! Infrastructure Adapters
//!
//! 六边形架构的适配器实现

pub mod storage;
pub mod transformer;

pub use storage::*;
pub use transformer::*;
