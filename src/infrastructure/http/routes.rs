//! HTTP Routes
//!
//! API Endpoints:
//! - /                  GET   欢迎信息
//! - /api/ping          GET   健康检查
//! - /api/voices        GET   列出音色目录
//! - /api/transform     POST  上传音频并变声（multipart）
//! - /api/history       GET   变声任务历史
//! - /outputs/{name}    GET   输出文件（静态）

use axum::{
    routing::{get, post},
    Router,
};
use std::path::Path;
use std::sync::Arc;
use tower_http::services::ServeDir;

use super::handlers;
use super::state::AppState;

/// 创建所有路由
pub fn create_routes(output_dir: &Path) -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(handlers::root))
        .nest("/api", api_routes())
        .nest_service("/outputs", ServeDir::new(output_dir))
}

/// API 路由
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ping", get(handlers::ping))
        .route("/voices", get(handlers::list_voices))
        .route("/transform", post(handlers::transform_voice))
        .route("/history", get(handlers::list_history))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
    };
    use serde_json::Value;
    use tempfile::TempDir;
    use tower::util::ServiceExt;

    use crate::application::WorkDirs;
    use crate::domain::voice::Catalog;
    use crate::infrastructure::adapters::{DecodedPcm, LocalStorage, ResampleTransformer};
    use crate::infrastructure::memory::InMemoryJobStore;

    const BOUNDARY: &str = "voiceforge-test-boundary";

    struct TestApp {
        router: Router,
        dir: TempDir,
    }

    async fn test_app() -> TestApp {
        let dir = tempfile::tempdir().unwrap();
        let upload_dir = dir.path().join("uploads");
        let output_dir = dir.path().join("outputs");
        tokio::fs::create_dir_all(&upload_dir).await.unwrap();

        let storage = LocalStorage::new(&output_dir, "/outputs").await.unwrap();
        let state = AppState::new(
            Catalog::seeded(),
            Arc::new(InMemoryJobStore::new()),
            Arc::new(ResampleTransformer::new()),
            Arc::new(storage),
            WorkDirs::new(&upload_dir, &output_dir),
        );

        let router = create_routes(&output_dir).with_state(Arc::new(state));
        TestApp { router, dir }
    }

    fn sine_wav(frames: usize) -> Vec<u8> {
        let samples = (0..frames)
            .map(|i| (((i as f64) * 0.05).sin() * 1.0e9) as i32)
            .collect();
        ResampleTransformer::new()
            .encode_wav(&DecodedPcm {
                samples,
                sample_rate: 16000,
                channels: 1,
                bits_per_sample: 16,
            })
            .unwrap()
    }

    /// (字段名, 文件名, 内容)
    fn multipart_request(fields: &[(&str, Option<&str>, &[u8])]) -> Request<Body> {
        let mut body = Vec::new();
        for (name, filename, content) in fields {
            body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
            match filename {
                Some(f) => body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
                        name, f
                    )
                    .as_bytes(),
                ),
                None => body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
                ),
            }
            body.extend_from_slice(content);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

        Request::builder()
            .method("POST")
            .uri("/api/transform")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(body))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, body.to_vec())
    }

    async fn send_json(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let (status, body) = send(router, request).await;
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_root_message() {
        let app = test_app().await;
        let (status, json) = send_json(&app.router, get("/")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["message"], "Welcome to VoiceForge API");
    }

    #[tokio::test]
    async fn test_ping() {
        let app = test_app().await;
        let (status, json) = send_json(&app.router, get("/api/ping")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ok");
    }

    #[tokio::test]
    async fn test_list_voices() {
        let app = test_app().await;
        let (status, json) = send_json(&app.router, get("/api/voices")).await;
        assert_eq!(status, StatusCode::OK);

        let voices = json["voices"].as_array().unwrap();
        assert_eq!(voices.len(), 4);
        assert_eq!(voices[0]["id"], "en-US-terrell");
        assert_eq!(voices[0]["gender"], "Male");
    }

    #[tokio::test]
    async fn test_transform_wav_and_fetch_output() {
        let app = test_app().await;
        let wav = sine_wav(1000);

        let request = multipart_request(&[
            ("file", Some("Clip.WAV"), &wav),
            ("voice_id", None, b"en-US-terrell"),
            ("retain_accent", None, b"false"),
        ]);
        let (status, json) = send_json(&app.router, request).await;
        assert_eq!(status, StatusCode::OK);

        let filename = json["filename"].as_str().unwrap().to_string();
        assert!(filename.starts_with("transformed_"));
        assert!(filename.ends_with(".wav"));
        assert_eq!(json["url"], format!("/outputs/{}", filename));
        assert_eq!(json["storage_url"], format!("/outputs/{}", filename));

        // 男声 0.85：1000 帧 -> 1176 帧
        let output = std::fs::read(app.dir.path().join("outputs").join(&filename)).unwrap();
        assert_eq!(output.len(), 44 + 1176 * 2);

        let (status, served) = send(&app.router, get(&format!("/outputs/{}", filename))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(served, output);

        let (_, history) = send_json(&app.router, get("/api/history")).await;
        let history = history["history"].as_array().unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0]["status"], "transformed");
        assert_eq!(history[0]["original_filename"], "Clip.WAV");
        assert_eq!(history[0]["voice_id"], "en-US-terrell");
        assert_eq!(history[0]["retain_prosody"], true);
        assert_eq!(history[0]["retain_accent"], false);

        // 上传临时文件已删除
        let leftover = std::fs::read_dir(app.dir.path().join("uploads")).unwrap().count();
        assert_eq!(leftover, 0);
    }

    #[tokio::test]
    async fn test_transform_undecodable_falls_back() {
        let app = test_app().await;
        let garbage = b"definitely not audio".to_vec();

        let request = multipart_request(&[
            ("file", Some("noise.wav"), &garbage),
            ("voice_id", None, b"en-US-emma"),
        ]);
        let (status, json) = send_json(&app.router, request).await;
        assert_eq!(status, StatusCode::OK);

        let filename = json["filename"].as_str().unwrap();
        let output = std::fs::read(app.dir.path().join("outputs").join(filename)).unwrap();
        assert_eq!(output, garbage);

        let (_, history) = send_json(&app.router, get("/api/history")).await;
        assert_eq!(history["history"][0]["status"], "fallback");
    }

    #[tokio::test]
    async fn test_transform_unknown_voice() {
        let app = test_app().await;
        let wav = sine_wav(100);

        let request = multipart_request(&[
            ("file", Some("clip.wav"), &wav),
            ("voice_id", None, b"en-GB-nobody"),
        ]);
        let (status, json) = send_json(&app.router, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["detail"].as_str().unwrap().contains("en-GB-nobody"));

        let (_, history) = send_json(&app.router, get("/api/history")).await;
        assert!(history["history"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_transform_requires_file() {
        let app = test_app().await;
        let request = multipart_request(&[("voice_id", None, b"en-US-sarah")]);
        let (status, json) = send_json(&app.router, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["detail"], "Audio file is required");
    }

    #[tokio::test]
    async fn test_transform_rejects_bad_flag() {
        let app = test_app().await;
        let wav = sine_wav(100);
        let request = multipart_request(&[
            ("file", Some("clip.wav"), &wav),
            ("voice_id", None, b"en-US-sarah"),
            ("retain_prosody", None, b"sometimes"),
        ]);
        let (status, _) = send_json(&app.router, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_missing_output_is_not_found() {
        let app = test_app().await;
        let (status, _) = send(&app.router, get("/outputs/missing.wav")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
