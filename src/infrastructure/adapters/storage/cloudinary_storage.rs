//! Cloudinary Storage - 通过 HTTP 调用 Cloudinary
//!
//! 上传: POST {api_base}/{cloud}/auto/upload（签名请求）
//! 下载: 从资源 URL 解析 public_id，经 Admin API 取得资源地址后下载
//!
//! 资源 URL 格式:
//! `https://res.cloudinary.com/{cloud}/{resource_type}/upload/v{version}/{folder}/{public_id}.{ext}`

use async_trait::async_trait;
use chrono::Utc;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use sha1::{Digest, Sha1};
use std::path::Path;
use std::time::Duration;
use tokio::fs;

use crate::application::ports::{StorageAdapterPort, StorageError};

const DEFAULT_API_BASE: &str = "https://api.cloudinary.com/v1_1";

/// Cloudinary 配置
#[derive(Debug, Clone)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
    /// 上传目录
    pub folder: String,
    /// API 基础地址
    pub api_base: String,
    /// 请求超时时间（秒）
    pub timeout_secs: u64,
}

impl CloudinaryConfig {
    pub fn new(
        cloud_name: impl Into<String>,
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
    ) -> Self {
        Self {
            cloud_name: cloud_name.into(),
            api_key: api_key.into(),
            api_secret: api_secret.into(),
            folder: "voice-forge/outputs".to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            timeout_secs: 60,
        }
    }

    pub fn with_folder(mut self, folder: impl Into<String>) -> Self {
        self.folder = folder.into();
        self
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
}

#[derive(Debug, Deserialize)]
struct ResourceResponse {
    secure_url: String,
}

/// 从资源 URL 解析出的定位信息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetLocator {
    pub resource_type: String,
    /// 含目录的 public_id，不含扩展名
    pub public_id: String,
}

/// Cloudinary 存储
pub struct CloudinaryStorage {
    client: Client,
    config: CloudinaryConfig,
}

impl CloudinaryStorage {
    pub fn new(config: CloudinaryConfig) -> Result<Self, StorageError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| StorageError::IoError(e.to_string()))?;

        Ok(Self { client, config })
    }

    fn upload_url(&self) -> String {
        format!("{}/{}/auto/upload", self.config.api_base, self.config.cloud_name)
    }

    fn resource_url(&self, locator: &AssetLocator) -> String {
        format!(
            "{}/{}/resources/{}/upload/{}",
            self.config.api_base, self.config.cloud_name, locator.resource_type, locator.public_id
        )
    }

    async fn try_upload(&self, local_path: &Path) -> Result<String, StorageError> {
        let file_name = local_path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| StorageError::FileNotFound(local_path.display().to_string()))?
            .to_string();

        // public_id 取文件名第一个 `.` 之前的部分
        let public_id = file_name.split('.').next().unwrap_or_default().to_string();
        let timestamp = Utc::now().timestamp().to_string();

        let params = [
            ("folder", self.config.folder.as_str()),
            ("public_id", public_id.as_str()),
            ("timestamp", timestamp.as_str()),
        ];
        let signature = sign_params(&params, &self.config.api_secret);

        let data = fs::read(local_path).await?;
        let form = Form::new()
            .text("folder", self.config.folder.clone())
            .text("public_id", public_id.clone())
            .text("timestamp", timestamp.clone())
            .text("api_key", self.config.api_key.clone())
            .text("signature", signature)
            .part("file", Part::bytes(data).file_name(file_name.clone()));

        tracing::debug!(url = %self.upload_url(), public_id = %public_id, "Uploading to Cloudinary");

        let response = self
            .client
            .post(self.upload_url())
            .multipart(form)
            .send()
            .await
            .map_err(|e| StorageError::UploadFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(StorageError::UploadFailed(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        let body: UploadResponse = response
            .json()
            .await
            .map_err(|e| StorageError::UploadFailed(format!("Invalid response: {}", e)))?;

        Ok(body.secure_url)
    }

    async fn try_download(&self, url: &str, local_path: &Path) -> Result<(), StorageError> {
        let locator = parse_asset_url(url)?;

        let response = self
            .client
            .get(self.resource_url(&locator))
            .basic_auth(&self.config.api_key, Some(&self.config.api_secret))
            .send()
            .await
            .map_err(|e| StorageError::DownloadFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(StorageError::DownloadFailed(format!(
                "Resource lookup for {} returned HTTP {}",
                locator.public_id, status
            )));
        }

        let resource: ResourceResponse = response
            .json()
            .await
            .map_err(|e| StorageError::DownloadFailed(format!("Invalid response: {}", e)))?;

        let bytes = self
            .client
            .get(&resource.secure_url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| StorageError::DownloadFailed(e.to_string()))?
            .bytes()
            .await
            .map_err(|e| StorageError::DownloadFailed(e.to_string()))?;

        fs::write(local_path, &bytes).await?;
        Ok(())
    }
}

/// 计算 Cloudinary 请求签名
///
/// 参数按键名排序后拼成 `k=v&k=v`，末尾追加 secret，取 SHA-1 十六进制
pub fn sign_params(params: &[(&str, &str)], api_secret: &str) -> String {
    let mut sorted: Vec<_> = params.iter().filter(|(_, v)| !v.is_empty()).collect();
    sorted.sort_by_key(|(k, _)| *k);

    let to_sign = sorted
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha1::new();
    hasher.update(to_sign.as_bytes());
    hasher.update(api_secret.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// 从资源 URL 解析 resource_type 和 public_id
///
/// 优先按 `/{resource_type}/upload/` 定位并跳过版本段；
/// 找不到时退化为最后两段 `{folder}/{public_id}`，资源类型按 video 处理
pub fn parse_asset_url(url: &str) -> Result<AssetLocator, StorageError> {
    let path = url.split(['?', '#']).next().unwrap_or_default();
    let parts: Vec<&str> = path.split('/').filter(|p| !p.is_empty()).collect();

    let strip_ext = |s: &str| s.split('.').next().unwrap_or_default().to_string();

    if let Some(pos) = parts.iter().position(|p| *p == "upload") {
        if pos >= 1 && pos + 1 < parts.len() {
            let resource_type = parts[pos - 1].to_string();
            let mut rest = &parts[pos + 1..];
            if rest.len() > 1 && is_version_segment(rest[0]) {
                rest = &rest[1..];
            }

            let (last, dirs) = rest
                .split_last()
                .ok_or_else(|| StorageError::InvalidUrl(url.to_string()))?;
            let mut segments: Vec<String> = dirs.iter().map(|s| s.to_string()).collect();
            segments.push(strip_ext(*last));

            let public_id = segments.join("/");
            if public_id.is_empty() {
                return Err(StorageError::InvalidUrl(url.to_string()));
            }
            return Ok(AssetLocator {
                resource_type,
                public_id,
            });
        }
    }

    if parts.len() < 2 {
        return Err(StorageError::InvalidUrl(url.to_string()));
    }
    let folder = parts[parts.len() - 2];
    let id = strip_ext(parts[parts.len() - 1]);
    if id.is_empty() {
        return Err(StorageError::InvalidUrl(url.to_string()));
    }

    Ok(AssetLocator {
        resource_type: "video".to_string(),
        public_id: format!("{}/{}", folder, id),
    })
}

fn is_version_segment(segment: &str) -> bool {
    segment
        .strip_prefix('v')
        .map(|digits| !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()))
        .unwrap_or(false)
}

#[async_trait]
impl StorageAdapterPort for CloudinaryStorage {
    fn name(&self) -> &'static str {
        "cloudinary"
    }

    async fn upload(&self, local_path: &Path) -> Option<String> {
        match self.try_upload(local_path).await {
            Ok(url) => Some(url),
            Err(e) => {
                tracing::error!(path = %local_path.display(), error = %e, "Error uploading to Cloudinary");
                None
            }
        }
    }

    async fn download(&self, remote_url: &str, local_path: &Path) -> bool {
        match self.try_download(remote_url, local_path).await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(url = %remote_url, error = %e, "Error downloading from Cloudinary");
                false
            }
        }
    }
}
