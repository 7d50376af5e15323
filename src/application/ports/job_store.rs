//! Job Store Port - 变声任务历史
//!
//! 定义任务历史的抽象接口，具体实现在 infrastructure/memory 层

use thiserror::Error;
use uuid::Uuid;

use crate::domain::job::{JobStatus, TransformationJob};

/// Job Store 错误
#[derive(Debug, Error)]
pub enum JobStoreError {
    #[error("Job not found: {0}")]
    NotFound(Uuid),

    #[error("Job already exists: {0}")]
    AlreadyExists(Uuid),
}

/// Job Store Port
///
/// 只追加、保持插入顺序；任务从不删除
pub trait JobStorePort: Send + Sync {
    /// 追加新任务
    fn append(&self, job: TransformationJob) -> Result<(), JobStoreError>;

    /// 按 id 原地更新状态
    fn update_status(&self, id: Uuid, status: JobStatus) -> Result<(), JobStoreError>;

    /// 记录存储后端返回的地址
    fn set_storage_url(&self, id: Uuid, url: String) -> Result<(), JobStoreError>;

    /// 获取单个任务
    fn get(&self, id: Uuid) -> Option<TransformationJob>;

    /// 按插入顺序列出全部任务
    fn list_all(&self) -> Vec<TransformationJob>;

    /// 任务数量
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
