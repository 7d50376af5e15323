//! Storage Factory - 按配置选择存储后端
//!
//! 云后端缺少凭据时不会导致启动失败，而是退化为 DisabledStorage，
//! 之后所有上传返回 None，下载返回 false。

use std::path::Path;
use std::sync::Arc;

use crate::application::ports::{StorageAdapterPort, StorageError};
use crate::config::{AzureSettings, CloudinarySettings, StorageConfig, StorageProvider};

use super::azure_storage::{AzureBlobStorage, AzureStorageConfig};
use super::cloudinary_storage::{CloudinaryConfig, CloudinaryStorage};
use super::disabled_storage::DisabledStorage;
use super::local_storage::LocalStorage;

pub struct StorageFactory;

impl StorageFactory {
    /// 创建存储适配器
    ///
    /// 本地存储根目录默认为 `output_dir`
    pub async fn create(
        config: &StorageConfig,
        output_dir: &Path,
    ) -> Result<Arc<dyn StorageAdapterPort>, StorageError> {
        match config.provider {
            StorageProvider::Local => {
                let root = config.local.root.as_deref().unwrap_or(output_dir);
                let storage = LocalStorage::new(root, config.local.public_prefix.clone()).await?;
                Ok(Arc::new(storage))
            }
            StorageProvider::Azure => Ok(Self::azure(&config.azure)),
            StorageProvider::Cloudinary => Ok(Self::cloudinary(&config.cloudinary)),
        }
    }

    fn azure(settings: &AzureSettings) -> Arc<dyn StorageAdapterPort> {
        let (Some(account_name), Some(account_key)) =
            (non_empty(&settings.account_name), non_empty(&settings.account_key))
        else {
            return disabled("azure", "Azure Storage credentials not configured");
        };

        let config = AzureStorageConfig {
            account_name: account_name.to_string(),
            account_key: account_key.to_string(),
            container: settings.container.clone(),
        };

        match AzureBlobStorage::new(config) {
            Ok(storage) => Arc::new(storage),
            Err(e) => disabled("azure", e.to_string()),
        }
    }

    fn cloudinary(settings: &CloudinarySettings) -> Arc<dyn StorageAdapterPort> {
        let (Some(cloud_name), Some(api_key), Some(api_secret)) = (
            non_empty(&settings.cloud_name),
            non_empty(&settings.api_key),
            non_empty(&settings.api_secret),
        ) else {
            return disabled("cloudinary", "Cloudinary credentials not configured");
        };

        let config = CloudinaryConfig::new(cloud_name, api_key, api_secret)
            .with_folder(settings.folder.clone());

        match CloudinaryStorage::new(config) {
            Ok(storage) => Arc::new(storage),
            Err(e) => disabled("cloudinary", e.to_string()),
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn disabled(backend: &'static str, reason: impl Into<String>) -> Arc<dyn StorageAdapterPort> {
    let reason = reason.into();
    tracing::warn!(backend = backend, reason = %reason, "Storage backend disabled");
    Arc::new(DisabledStorage::new(backend, reason))
}
