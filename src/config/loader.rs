//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. 配置文件（config.toml）
//! 3. 默认值

use config::{builder::DefaultState, Config, ConfigBuilder, ConfigError as ConfigCrateError, Environment, File};
use std::path::Path;
use thiserror::Error;

use super::types::{AppConfig, StorageProvider};

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["config", "config.local"];

/// 沿用的无前缀环境变量 -> 配置键
const LEGACY_ENV_KEYS: &[(&str, &str)] = &[
    ("CORS_ORIGINS", "server.cors_origin"),
    ("STORAGE_ACCOUNT_NAME", "storage.azure.account_name"),
    ("STORAGE_ACCOUNT_KEY", "storage.azure.account_key"),
    ("CLOUDINARY_CLOUD_NAME", "storage.cloudinary.cloud_name"),
    ("CLOUDINARY_API_KEY", "storage.cloudinary.api_key"),
    ("CLOUDINARY_API_SECRET", "storage.cloudinary.api_secret"),
];

/// 加载应用配置
///
/// 按优先级从高到低合并配置：
/// 1. 环境变量（前缀 `VOICEFORGE_`，层级分隔符 `__`；以及沿用的 `CORS_ORIGINS` 等变量）
/// 2. 配置文件（config.toml 或 config.local.toml）
/// 3. 默认值
///
/// # 环境变量示例
/// - `VOICEFORGE_SERVER__PORT=8080`
/// - `VOICEFORGE_STORAGE__PROVIDER=azure`
/// - `STORAGE_ACCOUNT_NAME=myaccount`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
///
/// # 参数
/// - `config_path` - 可选的配置文件路径，如果为 None 则使用默认搜索路径
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    build_config(config_path, |name| std::env::var(name).ok())
}

/// 构建配置，`lookup` 用于读取沿用的环境变量
fn build_config<F>(config_path: Option<&Path>, lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut builder = Config::builder();

    // 1. 首先设置默认值（最低优先级）
    builder = builder
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 8000)?
        .set_default("server.cors_origin", "http://localhost:5173")?
        .set_default("server.max_upload_size", 50 * 1024 * 1024)?
        .set_default("paths.upload_dir", "uploads")?
        .set_default("paths.output_dir", "outputs")?
        .set_default("storage.provider", "local")?
        .set_default("storage.local.public_prefix", "/outputs")?
        .set_default("storage.azure.container", "outputs")?
        .set_default("storage.cloudinary.folder", "voice-forge/outputs")?
        .set_default("log.level", "info")?;

    // 2. 添加配置文件（如果存在）
    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 3. 添加环境变量（最高优先级）
    // 例如: VOICEFORGE_STORAGE__AZURE__CONTAINER=media
    builder = builder.add_source(
        Environment::with_prefix("VOICEFORGE")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );
    builder = apply_legacy_env(builder, lookup)?;

    // 4. 构建并反序列化
    let config = builder.build()?;
    let app_config: AppConfig = config.try_deserialize().map_err(|e| {
        ConfigError::ParseError(format!("Failed to deserialize config: {}", e))
    })?;

    // 5. 验证配置
    validate_config(&app_config)?;

    Ok(app_config)
}

/// 沿用变量作为覆盖项，空值忽略
fn apply_legacy_env<F>(
    mut builder: ConfigBuilder<DefaultState>,
    lookup: F,
) -> Result<ConfigBuilder<DefaultState>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    for (var, key) in LEGACY_ENV_KEYS {
        let value = lookup(var).filter(|v| !v.trim().is_empty());
        builder = builder.set_override_option(*key, value)?;
    }
    Ok(builder)
}

/// 验证配置有效性
fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "Server port cannot be 0".to_string(),
        ));
    }

    if config.server.max_upload_size == 0 {
        return Err(ConfigError::ValidationError(
            "Max upload size cannot be 0".to_string(),
        ));
    }

    if config.paths.upload_dir.as_os_str().is_empty() {
        return Err(ConfigError::ValidationError(
            "Upload directory cannot be empty".to_string(),
        ));
    }

    if config.paths.output_dir.as_os_str().is_empty() {
        return Err(ConfigError::ValidationError(
            "Output directory cannot be empty".to_string(),
        ));
    }

    Ok(())
}

fn mask(secret: &Option<String>) -> &'static str {
    match secret {
        Some(s) if !s.is_empty() => "***",
        _ => "<unset>",
    }
}

/// 打印配置信息（用于启动时日志），密钥不输出
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Application Configuration ===");
    tracing::info!("Server: {}:{}", config.server.host, config.server.port);
    tracing::info!("CORS Origin: {}", config.server.cors_origin);
    tracing::info!("Max Upload Size: {} bytes", config.server.max_upload_size);
    tracing::info!("Upload Directory: {:?}", config.paths.upload_dir);
    tracing::info!("Output Directory: {:?}", config.paths.output_dir);
    tracing::info!("Storage Provider: {}", config.storage.provider);
    match config.storage.provider {
        StorageProvider::Local => {
            tracing::info!("Local Prefix: {}", config.storage.local.public_prefix);
        }
        StorageProvider::Azure => {
            let azure = &config.storage.azure;
            tracing::info!(
                "Azure Account: {}",
                azure.account_name.as_deref().unwrap_or("<unset>")
            );
            tracing::info!("Azure Key: {}", mask(&azure.account_key));
            tracing::info!("Azure Container: {}", azure.container);
        }
        StorageProvider::Cloudinary => {
            let cloudinary = &config.storage.cloudinary;
            tracing::info!(
                "Cloudinary Cloud: {}",
                cloudinary.cloud_name.as_deref().unwrap_or("<unset>")
            );
            tracing::info!("Cloudinary Key: {}", mask(&cloudinary.api_key));
            tracing::info!("Cloudinary Secret: {}", mask(&cloudinary.api_secret));
            tracing::info!("Cloudinary Folder: {}", cloudinary.folder);
        }
    }
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("=================================");
}
