//! Application State
//!
//! 包含所有 Command/Query Handlers 的应用状态

use std::path::PathBuf;
use std::sync::Arc;

use crate::application::{
    JobStorePort, ListHistoryHandler, ListVoicesHandler, StorageAdapterPort,
    TransformVoiceHandler, VoiceTransformerPort, WorkDirs,
};
use crate::domain::voice::Catalog;

/// 应用状态
pub struct AppState {
    // ========== Command Handlers ==========
    pub transform_handler: TransformVoiceHandler,

    // ========== Query Handlers ==========
    pub list_voices_handler: ListVoicesHandler,
    pub list_history_handler: ListHistoryHandler,

    /// 静态文件目录，挂载在 /outputs
    pub output_dir: PathBuf,
}

impl AppState {
    /// 创建应用状态
    pub fn new(
        catalog: Catalog,
        job_store: Arc<dyn JobStorePort>,
        transformer: Arc<dyn VoiceTransformerPort>,
        storage: Arc<dyn StorageAdapterPort>,
        dirs: WorkDirs,
    ) -> Self {
        let output_dir = dirs.output_dir.clone();

        Self {
            transform_handler: TransformVoiceHandler::new(
                catalog,
                job_store.clone(),
                transformer,
                storage,
                dirs,
            ),
            list_voices_handler: ListVoicesHandler::new(catalog),
            list_history_handler: ListHistoryHandler::new(job_store),
            output_dir,
        }
    }
}
