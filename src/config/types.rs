//! Configuration Types
//!
//! 定义所有配置结构体

use serde::Deserialize;
use std::path::PathBuf;

/// 应用主配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// 服务器配置
    #[serde(default)]
    pub server: ServerConfig,

    /// 工作目录配置
    #[serde(default)]
    pub paths: PathsConfig,

    /// 存储后端配置
    #[serde(default)]
    pub storage: StorageConfig,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

/// 服务器配置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,

    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,

    /// 允许跨域的来源
    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,

    /// 上传文件最大大小（字节），默认 50MB
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_cors_origin() -> String {
    "http://localhost:5173".to_string()
}

fn default_max_upload_size() -> u64 {
    50 * 1024 * 1024 // 50 MB
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origin: default_cors_origin(),
            max_upload_size: default_max_upload_size(),
        }
    }
}

impl ServerConfig {
    /// 获取服务器地址
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// 工作目录配置
#[derive(Debug, Clone, Deserialize)]
pub struct PathsConfig {
    /// 上传临时文件目录
    #[serde(default = "default_upload_dir")]
    pub upload_dir: PathBuf,

    /// 输出文件目录，通过 /outputs 对外提供
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_upload_dir() -> PathBuf {
    PathBuf::from("uploads")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("outputs")
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            upload_dir: default_upload_dir(),
            output_dir: default_output_dir(),
        }
    }
}

/// 存储后端类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageProvider {
    #[default]
    Local,
    Azure,
    Cloudinary,
}

impl std::fmt::Display for StorageProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageProvider::Local => write!(f, "local"),
            StorageProvider::Azure => write!(f, "azure"),
            StorageProvider::Cloudinary => write!(f, "cloudinary"),
        }
    }
}

/// 存储配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorageConfig {
    /// 选用的后端，只能有一个
    #[serde(default)]
    pub provider: StorageProvider,

    #[serde(default)]
    pub local: LocalStorageSettings,

    #[serde(default)]
    pub azure: AzureSettings,

    #[serde(default)]
    pub cloudinary: CloudinarySettings,
}

/// 本地存储配置
#[derive(Debug, Clone, Deserialize)]
pub struct LocalStorageSettings {
    /// 存储根目录，未设置时使用输出目录
    #[serde(default)]
    pub root: Option<PathBuf>,

    /// 对外 URL 前缀
    #[serde(default = "default_public_prefix")]
    pub public_prefix: String,
}

fn default_public_prefix() -> String {
    "/outputs".to_string()
}

impl Default for LocalStorageSettings {
    fn default() -> Self {
        Self {
            root: None,
            public_prefix: default_public_prefix(),
        }
    }
}

/// Azure Blob 配置
#[derive(Debug, Clone, Deserialize)]
pub struct AzureSettings {
    #[serde(default)]
    pub account_name: Option<String>,

    #[serde(default)]
    pub account_key: Option<String>,

    /// 上传容器
    #[serde(default = "default_azure_container")]
    pub container: String,
}

fn default_azure_container() -> String {
    "outputs".to_string()
}

impl Default for AzureSettings {
    fn default() -> Self {
        Self {
            account_name: None,
            account_key: None,
            container: default_azure_container(),
        }
    }
}

/// Cloudinary 配置
#[derive(Debug, Clone, Deserialize)]
pub struct CloudinarySettings {
    #[serde(default)]
    pub cloud_name: Option<String>,

    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default)]
    pub api_secret: Option<String>,

    /// 上传目录
    #[serde(default = "default_cloudinary_folder")]
    pub folder: String,
}

fn default_cloudinary_folder() -> String {
    "voice-forge/outputs".to_string()
}

impl Default for CloudinarySettings {
    fn default() -> Self {
        Self {
            cloud_name: None,
            api_key: None,
            api_secret: None,
            folder: default_cloudinary_folder(),
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}
