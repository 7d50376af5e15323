//! Voice Context - 音色限界上下文
//!
//! 职责:
//! - 静态音色目录
//! - 性别到变调系数的映射

mod catalog;
mod errors;
mod value_objects;

pub use catalog::{Catalog, VoiceDescriptor};
pub use errors::VoiceError;
pub use value_objects::{Gender, PitchFactor};
