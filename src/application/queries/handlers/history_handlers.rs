//! History Query Handlers

use std::sync::Arc;

use crate::application::error::ApplicationError;
use crate::application::ports::JobStorePort;
use crate::application::queries::ListHistory;
use crate::domain::job::TransformationJob;

/// ListHistory Handler
pub struct ListHistoryHandler {
    job_store: Arc<dyn JobStorePort>,
}

impl ListHistoryHandler {
    pub fn new(job_store: Arc<dyn JobStorePort>) -> Self {
        Self { job_store }
    }

    /// 按插入顺序返回全部任务，不分页
    pub async fn handle(
        &self,
        _query: ListHistory,
    ) -> Result<Vec<TransformationJob>, ApplicationError> {
        Ok(self.job_store.list_all())
    }
}
