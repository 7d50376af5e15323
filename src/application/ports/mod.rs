//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层的抽象接口

mod job_store;
mod storage_adapter;
mod voice_transformer;

pub use job_store::{JobStoreError, JobStorePort};
pub use storage_adapter::{StorageAdapterPort, StorageError};
pub use voice_transformer::{
    AudioContainer, TransformError, TransformedAudio, VoiceTransformerPort,
};
