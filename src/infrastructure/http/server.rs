//! HTTP Server
//!
//! Axum HTTP 服务器启动和配置

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::Router;
use http::{HeaderValue, Method};
use tokio::net::TcpListener;
use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use super::middleware::error_logging_middleware;
use super::routes::create_routes;
use super::state::AppState;
use crate::config::ServerConfig;

/// HTTP 服务器
pub struct HttpServer {
    config: ServerConfig,
    state: Arc<AppState>,
}

impl HttpServer {
    /// 创建新的 HTTP 服务器
    pub fn new(config: ServerConfig, state: AppState) -> Self {
        Self {
            config,
            state: Arc::new(state),
        }
    }

    /// 构建 Router
    pub fn build_router(&self) -> Router {
        let body_limit = usize::try_from(self.config.max_upload_size).unwrap_or(usize::MAX);

        create_routes(&self.state.output_dir)
            .layer(DefaultBodyLimit::max(body_limit))
            .layer(middleware::from_fn(error_logging_middleware))
            .layer(TraceLayer::new_for_http())
            .layer(cors_layer(&self.config.cors_origin))
            .with_state(self.state.clone())
    }

    /// 启动服务器（带优雅关闭）
    pub async fn run_with_shutdown<F>(self, shutdown_signal: F) -> Result<(), std::io::Error>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let router = self.build_router();
        let addr = self.config.addr();

        info!("Starting HTTP server on {} (with graceful shutdown)", addr);

        let listener = TcpListener::bind(&addr).await?;
        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal)
            .await?;

        Ok(())
    }
}

/// CORS 配置
///
/// `origins` 为逗号分隔的来源列表，允许携带凭据；无法解析的来源被忽略。
/// 列表中出现 `*` 时回显请求来源（带凭据的响应不能使用通配符）。
fn cors_layer(origins: &str) -> CorsLayer {
    let entries: Vec<&str> = origins
        .split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .collect();

    let allow_origin = if entries.contains(&"*") {
        AllowOrigin::mirror_request()
    } else {
        AllowOrigin::list(parse_origins(&entries))
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
        .max_age(std::time::Duration::from_secs(3600))
}

fn parse_origins(entries: &[&str]) -> Vec<HeaderValue> {
    entries
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use tower::util::ServiceExt;

    use crate::application::WorkDirs;
    use crate::domain::voice::Catalog;
    use crate::infrastructure::adapters::{LocalStorage, ResampleTransformer};
    use crate::infrastructure::memory::InMemoryJobStore;

    async fn test_server(dir: &std::path::Path) -> HttpServer {
        test_server_with_origins(dir, "http://localhost:5173, https://app.example.com").await
    }

    async fn test_server_with_origins(dir: &std::path::Path, origins: &str) -> HttpServer {
        let output_dir = dir.join("outputs");
        let storage = LocalStorage::new(&output_dir, "/outputs").await.unwrap();
        let state = AppState::new(
            Catalog::seeded(),
            Arc::new(InMemoryJobStore::new()),
            Arc::new(ResampleTransformer::new()),
            Arc::new(storage),
            WorkDirs::new(dir.join("uploads"), &output_dir),
        );

        let config = ServerConfig {
            cors_origin: origins.to_string(),
            ..ServerConfig::default()
        };
        HttpServer::new(config, state)
    }

    #[tokio::test]
    async fn test_cors_allows_configured_origin() {
        let dir = tempfile::tempdir().unwrap();
        let router = test_server(dir.path()).await.build_router();

        let request = Request::builder()
            .uri("/api/voices")
            .header(header::ORIGIN, "https://app.example.com")
            .body(Body::empty())
            .unwrap();
        let response = router.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "https://app.example.com"
        );
        assert_eq!(
            response
                .headers()
                .get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS)
                .unwrap(),
            "true"
        );
    }

    #[tokio::test]
    async fn test_cors_rejects_other_origin() {
        let dir = tempfile::tempdir().unwrap();
        let router = test_server(dir.path()).await.build_router();

        let request = Request::builder()
            .uri("/api/voices")
            .header(header::ORIGIN, "https://evil.example.com")
            .body(Body::empty())
            .unwrap();
        let response = router.oneshot(request).await.unwrap();

        assert!(response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .is_none());
    }

    #[test]
    fn test_wildcard_origin_builds_layer() {
        let _ = cors_layer("*");
        let _ = cors_layer("http://localhost:5173, *");
    }

    #[tokio::test]
    async fn test_wildcard_origin_echoes_request_origin() {
        let dir = tempfile::tempdir().unwrap();
        let router = test_server_with_origins(dir.path(), "*")
            .await
            .build_router();

        let request = Request::builder()
            .uri("/api/voices")
            .header(header::ORIGIN, "https://anywhere.example.org")
            .body(Body::empty())
            .unwrap();
        let response = router.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "https://anywhere.example.org"
        );
        assert_eq!(
            response
                .headers()
                .get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS)
                .unwrap(),
            "true"
        );
    }
}
