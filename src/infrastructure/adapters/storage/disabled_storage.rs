//! Disabled Storage - 凭据缺失时的降级实现
//!
//! 上传总是返回 None，下载总是返回 false

use async_trait::async_trait;
use std::path::Path;

use crate::application::ports::StorageAdapterPort;

/// 不可用的存储后端
pub struct DisabledStorage {
    /// 被禁用的后端名称
    backend: &'static str,
    reason: String,
}

impl DisabledStorage {
    pub fn new(backend: &'static str, reason: impl Into<String>) -> Self {
        Self {
            backend,
            reason: reason.into(),
        }
    }

    pub fn backend(&self) -> &'static str {
        self.backend
    }
}

#[async_trait]
impl StorageAdapterPort for DisabledStorage {
    fn name(&self) -> &'static str {
        "disabled"
    }

    async fn upload(&self, local_path: &Path) -> Option<String> {
        tracing::warn!(
            backend = self.backend,
            reason = %self.reason,
            path = %local_path.display(),
            "Storage backend unavailable, skipping upload"
        );
        None
    }

    async fn download(&self, remote_url: &str, _local_path: &Path) -> bool {
        tracing::warn!(
            backend = self.backend,
            reason = %self.reason,
            url = %remote_url,
            "Storage backend unavailable, skipping download"
        );
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_always_fails() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("a.wav");
        std::fs::write(&path, b"data").unwrap();

        let storage = DisabledStorage::new("azure", "credentials not set");
        assert!(storage.upload(&path).await.is_none());
        assert!(storage.upload(&temp_dir.path().join("missing.wav")).await.is_none());
        assert!(!storage.download("https://x/y/z.wav", &path).await);
        assert_eq!(storage.backend(), "azure");
    }
}
