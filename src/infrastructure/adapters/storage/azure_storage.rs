//! Azure Blob Storage
//!
//! 基于 object_store 的 Azure 适配器。下载时从 blob URL 中解析容器名和 blob 名，
//! 格式: `https://{account}.blob.core.windows.net/{container}/{blob}`

use async_trait::async_trait;
use object_store::azure::MicrosoftAzureBuilder;
use object_store::path::Path as StorePath;
use object_store::{ObjectStore, PutPayload};
use std::path::Path;
use std::sync::Arc;
use tokio::fs;

use crate::application::ports::{StorageAdapterPort, StorageError};

/// Azure 存储配置
#[derive(Debug, Clone)]
pub struct AzureStorageConfig {
    pub account_name: String,
    pub account_key: String,
    /// 上传目标容器
    pub container: String,
}

/// Azure Blob 存储
pub struct AzureBlobStorage {
    config: AzureStorageConfig,
    /// 上传容器对应的 store
    inner: Arc<dyn ObjectStore>,
}

impl AzureBlobStorage {
    pub fn new(config: AzureStorageConfig) -> Result<Self, StorageError> {
        let inner = build_store(&config, &config.container)?;
        Ok(Self { config, inner })
    }

    /// blob 的公开地址
    pub fn blob_url(&self, container: &str, blob: &str) -> String {
        format!(
            "https://{}.blob.core.windows.net/{}/{}",
            self.config.account_name, container, blob
        )
    }

    async fn try_upload(&self, local_path: &Path) -> Result<String, StorageError> {
        let blob_name = local_path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| StorageError::FileNotFound(local_path.display().to_string()))?;

        let data = fs::read(local_path).await?;
        let size = data.len();

        self.inner
            .put(&StorePath::from(blob_name), PutPayload::from(data))
            .await
            .map_err(|e| StorageError::UploadFailed(e.to_string()))?;

        tracing::debug!(
            container = %self.config.container,
            blob = %blob_name,
            size = size,
            "Uploaded blob"
        );

        Ok(self.blob_url(&self.config.container, blob_name))
    }

    async fn try_download(&self, blob_url: &str, local_path: &Path) -> Result<(), StorageError> {
        let (container, blob_name) = parse_blob_url(blob_url)?;

        let store = if container == self.config.container {
            self.inner.clone()
        } else {
            build_store(&self.config, &container)?
        };

        let result = store
            .get(&StorePath::from(blob_name.as_str()))
            .await
            .map_err(|e| StorageError::DownloadFailed(e.to_string()))?;

        let bytes = result
            .bytes()
            .await
            .map_err(|e| StorageError::DownloadFailed(e.to_string()))?;

        fs::write(local_path, &bytes).await?;
        Ok(())
    }
}

fn build_store(
    config: &AzureStorageConfig,
    container: &str,
) -> Result<Arc<dyn ObjectStore>, StorageError> {
    let store = MicrosoftAzureBuilder::new()
        .with_account(&config.account_name)
        .with_access_key(&config.account_key)
        .with_container_name(container)
        .build()
        .map_err(|e| StorageError::MissingCredentials(e.to_string()))?;

    Ok(Arc::new(store))
}

/// 从 blob URL 解析 (容器名, blob 名)
///
/// 去掉协议后按 `/` 切分：第 1 段为容器，其余以 `/` 拼接为 blob 名
pub fn parse_blob_url(blob_url: &str) -> Result<(String, String), StorageError> {
    let stripped = blob_url
        .strip_prefix("https://")
        .or_else(|| blob_url.strip_prefix("http://"))
        .unwrap_or(blob_url);

    let parts: Vec<&str> = stripped.split('/').collect();
    if parts.len() < 3 {
        return Err(StorageError::InvalidUrl(blob_url.to_string()));
    }

    let container = parts[1];
    let blob_name = parts[2..].join("/");
    if container.is_empty() || blob_name.is_empty() {
        return Err(StorageError::InvalidUrl(blob_url.to_string()));
    }

    Ok((container.to_string(), blob_name))
}

#[async_trait]
impl StorageAdapterPort for AzureBlobStorage {
    fn name(&self) -> &'static str {
        "azure"
    }

    async fn upload(&self, local_path: &Path) -> Option<String> {
        match self.try_upload(local_path).await {
            Ok(url) => Some(url),
            Err(e) => {
                tracing::error!(path = %local_path.display(), error = %e, "Error uploading to Azure Storage");
                None
            }
        }
    }

    async fn download(&self, remote_url: &str, local_path: &Path) -> bool {
        match self.try_download(remote_url, local_path).await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(url = %remote_url, error = %e, "Error downloading from Azure Storage");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_blob_url() {
        let (container, blob) =
            parse_blob_url("https://acct.blob.core.windows.net/outputs/transformed_1.wav").unwrap();
        assert_eq!(container, "outputs");
        assert_eq!(blob, "transformed_1.wav");

        let (container, blob) =
            parse_blob_url("https://acct.blob.core.windows.net/media/2024/a/b.wav").unwrap();
        assert_eq!(container, "media");
        assert_eq!(blob, "2024/a/b.wav");
    }

    #[test]
    fn test_parse_blob_url_rejects_short() {
        assert!(parse_blob_url("https://acct.blob.core.windows.net/outputs").is_err());
        assert!(parse_blob_url("https://acct.blob.core.windows.net/outputs/").is_err());
        assert!(parse_blob_url("").is_err());
    }

    #[test]
    fn test_blob_url() {
        let storage = AzureBlobStorage::new(AzureStorageConfig {
            account_name: "acct".to_string(),
            account_key: "a2V5".to_string(),
            container: "outputs".to_string(),
        })
        .unwrap();

        let url = storage.blob_url("outputs", "x.wav");
        assert_eq!(url, "https://acct.blob.core.windows.net/outputs/x.wav");
        assert_eq!(
            parse_blob_url(&url).unwrap(),
            ("outputs".to_string(), "x.wav".to_string())
        );
    }
}
