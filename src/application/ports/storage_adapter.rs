//! Storage Adapter Port - 出站端口
//!
//! 产物存储后端的统一约定：上传返回地址，下载返回是否成功。
//! 后端之间互斥，部署时只选一个。

use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

/// 存储后端错误
///
/// 仅在适配器内部使用，对外约定中记录日志后转为 None / false
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage credentials missing: {0}")]
    MissingCredentials(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("IO error: {0}")]
    IoError(String),

    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        StorageError::IoError(err.to_string())
    }
}

/// Storage Adapter Port
#[async_trait]
pub trait StorageAdapterPort: Send + Sync {
    /// 后端名称（用于日志）
    fn name(&self) -> &'static str;

    /// 上传本地文件，返回可访问地址
    ///
    /// 凭据缺失或上传失败时返回 None，错误只记录日志
    async fn upload(&self, local_path: &Path) -> Option<String>;

    /// 将远端文件下载到本地路径
    ///
    /// 任何失败都返回 false
    async fn download(&self, remote_url: &str, local_path: &Path) -> bool;
}
