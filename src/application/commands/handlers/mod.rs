//! Command Handlers 实现

mod transform_handlers;

pub use transform_handlers::*;
