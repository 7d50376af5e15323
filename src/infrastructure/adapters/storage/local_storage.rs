//! Local Storage - 本地文件系统存储实现
//!
//! 实现 StorageAdapterPort trait。默认根目录即输出目录，此时上传不发生拷贝。

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::application::ports::{StorageAdapterPort, StorageError};

/// 本地文件存储
pub struct LocalStorage {
    /// 存储根目录
    root: PathBuf,
    /// 对外 URL 前缀
    public_prefix: String,
}

impl LocalStorage {
    /// 创建新的本地存储
    pub async fn new(
        root: impl AsRef<Path>,
        public_prefix: impl Into<String>,
    ) -> Result<Self, StorageError> {
        let root = root.as_ref().to_path_buf();

        // 确保目录存在
        fs::create_dir_all(&root).await?;

        Ok(Self {
            root,
            public_prefix: public_prefix.into(),
        })
    }

    /// 获取存储根目录
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn public_url(&self, name: &str) -> String {
        format!("{}/{}", self.public_prefix.trim_end_matches('/'), name)
    }

    async fn try_upload(&self, local_path: &Path) -> Result<String, StorageError> {
        let name = local_path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| StorageError::FileNotFound(local_path.display().to_string()))?;

        if !fs::try_exists(local_path).await? {
            return Err(StorageError::FileNotFound(local_path.display().to_string()));
        }

        let target = self.root.join(name);
        if !is_same_file(local_path, &target).await {
            fs::copy(local_path, &target).await?;
        }

        tracing::debug!(file = %name, root = %self.root.display(), "Stored file locally");

        Ok(self.public_url(name))
    }

    async fn try_download(&self, remote_url: &str, local_path: &Path) -> Result<(), StorageError> {
        let name = last_path_segment(remote_url)
            .ok_or_else(|| StorageError::InvalidUrl(remote_url.to_string()))?;

        let source = self.root.join(name);
        if !fs::try_exists(&source).await? {
            return Err(StorageError::FileNotFound(source.display().to_string()));
        }

        let data = fs::read(&source).await?;
        fs::write(local_path, data).await?;
        Ok(())
    }
}

/// URL 的最后一段路径（去掉查询串），拒绝空段和相对段
fn last_path_segment(url: &str) -> Option<&str> {
    let path = url.split(['?', '#']).next()?;
    let name = path.rsplit('/').next()?;
    match name {
        "" | "." | ".." => None,
        name if name.contains('\\') => None,
        name => Some(name),
    }
}

async fn is_same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a).await, fs::canonicalize(b).await) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

#[async_trait]
impl StorageAdapterPort for LocalStorage {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn upload(&self, local_path: &Path) -> Option<String> {
        match self.try_upload(local_path).await {
            Ok(url) => Some(url),
            Err(e) => {
                tracing::error!(path = %local_path.display(), error = %e, "Error uploading to local storage");
                None
            }
        }
    }

    async fn download(&self, remote_url: &str, local_path: &Path) -> bool {
        match self.try_download(remote_url, local_path).await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(url = %remote_url, error = %e, "Error downloading from local storage");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_upload_and_download() {
        let temp_dir = tempdir().unwrap();
        let storage = LocalStorage::new(temp_dir.path().join("store"), "/files")
            .await
            .unwrap();

        let source = temp_dir.path().join("clip.wav");
        std::fs::write(&source, b"fake wav data").unwrap();

        let url = storage.upload(&source).await.unwrap();
        assert_eq!(url, "/files/clip.wav");
        assert!(storage.root().join("clip.wav").exists());

        let target = temp_dir.path().join("downloaded.wav");
        assert!(storage.download(&url, &target).await);
        assert_eq!(std::fs::read(&target).unwrap(), b"fake wav data");
    }

    #[tokio::test]
    async fn test_upload_in_place() {
        let temp_dir = tempdir().unwrap();
        let storage = LocalStorage::new(temp_dir.path(), "/outputs/").await.unwrap();

        let source = temp_dir.path().join("out.wav");
        std::fs::write(&source, b"data").unwrap();

        let url = storage.upload(&source).await.unwrap();
        assert_eq!(url, "/outputs/out.wav");
        assert_eq!(std::fs::read(&source).unwrap(), b"data");
    }

    #[tokio::test]
    async fn test_upload_missing_file() {
        let temp_dir = tempdir().unwrap();
        let storage = LocalStorage::new(temp_dir.path(), "/outputs").await.unwrap();

        assert!(storage.upload(&temp_dir.path().join("nope.wav")).await.is_none());
    }

    #[tokio::test]
    async fn test_download_rejects_bad_url() {
        let temp_dir = tempdir().unwrap();
        let storage = LocalStorage::new(temp_dir.path(), "/outputs").await.unwrap();
        let target = temp_dir.path().join("x");

        assert!(!storage.download("/outputs/", &target).await);
        assert!(!storage.download("/outputs/..", &target).await);
        assert!(!storage.download("/outputs/missing.wav", &target).await);
    }

    #[test]
    fn test_last_path_segment() {
        assert_eq!(last_path_segment("/outputs/a.wav"), Some("a.wav"));
        assert_eq!(last_path_segment("http://h/x/b.wav?sig=1"), Some("b.wav"));
        assert_eq!(last_path_segment("a.wav"), Some("a.wav"));
        assert_eq!(last_path_segment("http://h/x/"), None);
    }
}
