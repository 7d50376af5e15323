//! VoiceForge - 变声 HTTP 服务
//!
//! 架构:
//! - Domain: voice/, job/ (Bounded Contexts), pitch
//! - Application: commands, queries, ports
//! - Infrastructure: http, memory, adapters

use std::sync::Arc;

use anyhow::Context;
use voiceforge::application::WorkDirs;
use voiceforge::config::{load_config, print_config};
use voiceforge::domain::voice::Catalog;
use voiceforge::infrastructure::http::{AppState, HttpServer};
use voiceforge::infrastructure::{InMemoryJobStore, ResampleTransformer, StorageFactory};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let config = load_config().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    // 初始化日志
    let log_filter = format!(
        "{},voiceforge={},tower_http=debug",
        config.log.level, config.log.level
    );
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_filter)),
        )
        .init();

    tracing::info!("VoiceForge - voice transform service");
    print_config(&config);

    // 工作目录无法创建时直接退出
    tokio::fs::create_dir_all(&config.paths.upload_dir)
        .await
        .with_context(|| format!("Failed to create upload directory {:?}", config.paths.upload_dir))?;
    tokio::fs::create_dir_all(&config.paths.output_dir)
        .await
        .with_context(|| format!("Failed to create output directory {:?}", config.paths.output_dir))?;

    // 存储后端
    let storage = StorageFactory::create(&config.storage, &config.paths.output_dir).await?;
    tracing::info!(backend = storage.name(), "Storage adapter ready");

    let catalog = Catalog::seeded();
    tracing::info!(voices = catalog.len(), "Voice catalog loaded");

    let state = AppState::new(
        catalog,
        Arc::new(InMemoryJobStore::new()),
        Arc::new(ResampleTransformer::new()),
        storage,
        WorkDirs::new(&config.paths.upload_dir, &config.paths.output_dir),
    );

    let server = HttpServer::new(config.server.clone(), state);

    // 启动服务器（带优雅关闭）
    server
        .run_with_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for ctrl-c");
                std::future::pending::<()>().await;
            }
            tracing::info!("Received shutdown signal");
        })
        .await?;

    tracing::info!("Server shutdown complete");

    Ok(())
}
