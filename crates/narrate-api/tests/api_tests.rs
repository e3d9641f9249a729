//! HTTP-level tests driving the router with `oneshot`.

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::{json, Value};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

use narrate_api::{create_router, ApiConfig, AppState};
use narrate_compiler::{CompilerConfig, MediaToolkit, SceneCompiler};
use narrate_media::{MediaError, MediaResult, NormalizedSegment, ResolvedAsset, SceneClip};
use narrate_models::{AssetKind, MediaReference, VisualKind};

/// Writes placeholder files instead of running FFmpeg.
#[derive(Default)]
struct StubToolkit {
    mux_timeout: bool,
}

#[async_trait]
impl MediaToolkit for StubToolkit {
    async fn resolve(
        &self,
        _reference: &MediaReference,
        kind: AssetKind,
        dir: &Path,
        stem: &str,
    ) -> MediaResult<ResolvedAsset> {
        let mut file = tempfile::Builder::new()
            .prefix(&format!("{}-", stem))
            .suffix(kind.default_suffix())
            .tempfile_in(dir)?;
        file.write_all(b"asset")?;
        Ok(ResolvedAsset::new(file.into_temp_path(), None, 5))
    }

    async fn normalize(
        &self,
        _kind: VisualKind,
        _input: &Path,
        output: &Path,
        target: f64,
    ) -> MediaResult<NormalizedSegment> {
        tokio::fs::write(output, b"segment").await?;
        Ok(NormalizedSegment {
            path: output.to_path_buf(),
            duration: target,
        })
    }

    async fn mux(&self, segment: &NormalizedSegment, _audio: &Path, output: &Path) -> MediaResult<SceneClip> {
        if self.mux_timeout {
            return Err(MediaError::Timeout(Duration::from_secs(120)));
        }
        tokio::fs::write(output, b"clip").await?;
        Ok(SceneClip {
            path: output.to_path_buf(),
            duration: segment.duration - 0.25,
        })
    }

    async fn concat(&self, _clips: &[PathBuf], _work_dir: &Path, output: &Path) -> MediaResult<PathBuf> {
        tokio::fs::write(output, b"joined video").await?;
        Ok(output.to_path_buf())
    }

    async fn burn(&self, _video: &Path, _captions: &Path, output: &Path) -> MediaResult<PathBuf> {
        tokio::fs::write(output, b"final video").await?;
        Ok(output.to_path_buf())
    }
}

fn app(root: &Path, toolkit: StubToolkit) -> Router {
    app_with_config(root, toolkit, ApiConfig::default())
}

fn app_with_config(root: &Path, toolkit: StubToolkit, config: ApiConfig) -> Router {
    let compiler = SceneCompiler::new(CompilerConfig::default().with_work_dir(root), Arc::new(toolkit));
    create_router(AppState::new(config, compiler), None)
}

fn compile_request(body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/video/compile")
        .header("content-type", "application/json")
        .body(body.into())
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn scene(id: &str, duration: f64) -> Value {
    json!({
        "id": id,
        "narration": "hello there",
        "duration": duration,
        "media": {"type": "photo", "url": "data:image/png;base64,iVBORw0KGgo="},
        "audio": {"url": "data:audio/mpeg;base64,SUQzBAA="}
    })
}

#[tokio::test]
async fn test_health() {
    let root = tempfile::tempdir().unwrap();
    let response = app(root.path(), StubToolkit::default())
        .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    assert_eq!(response.headers()["x-content-type-options"], "nosniff");
    let body = json_body(response).await;
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_ready_reports_work_dir() {
    let root = tempfile::tempdir().unwrap();
    let response = app(&root.path().join("work"), StubToolkit::default())
        .oneshot(Request::builder().uri("/ready").body(Body::empty()).unwrap())
        .await
        .unwrap();

    // 503 on hosts without FFmpeg; the work dir check passes either way
    let body = json_body(response).await;
    assert_eq!(body["checks"]["work_dir"]["status"], "ok");
    assert!(body["checks"]["ffmpeg"]["status"].is_string());
}

#[tokio::test]
async fn test_compile_returns_inline_video() {
    let root = tempfile::tempdir().unwrap();
    let body = json!({"scenes": [scene("s1", 5.0), scene("s2", 3.0)], "subtitles": true});

    let response = app(root.path(), StubToolkit::default())
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/video/compile")
                .header("content-type", "application/json")
                .header("x-request-id", "req-42")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-request-id"], "req-42");

    let body = json_body(response).await;
    let url = body["videoUrl"].as_str().unwrap();
    let payload = url.strip_prefix("data:video/mp4;base64,").unwrap();
    assert_eq!(STANDARD.decode(payload).unwrap(), b"final video");

    assert_eq!(body["sceneDurations"], json!([4.75, 2.75]));
    assert!((body["totalDurationSeconds"].as_f64().unwrap() - 7.5).abs() < 1e-9);
    assert!(body["jobId"].as_str().unwrap().starts_with("video-"));

    // Workspace is gone once the response is built
    assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_compile_without_subtitles_returns_joined_video() {
    let root = tempfile::tempdir().unwrap();
    let body = json!({"scenes": [scene("only", 2.0)]});

    let response = app(root.path(), StubToolkit::default())
        .oneshot(compile_request(body.to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    let payload = body["videoUrl"].as_str().unwrap().trim_start_matches("data:video/mp4;base64,");
    assert_eq!(STANDARD.decode(payload).unwrap(), b"joined video");
}

#[tokio::test]
async fn test_large_inline_assets_are_accepted() {
    let root = tempfile::tempdir().unwrap();
    let photo = STANDARD.encode(vec![0u8; 3 * 1024 * 1024]);
    let mut big = scene("big", 2.0);
    big["media"]["url"] = json!(format!("data:image/png;base64,{}", photo));
    let body = json!({"scenes": [big]}).to_string();
    assert!(body.len() > 4 * 1024 * 1024);

    let response = app(root.path(), StubToolkit::default())
        .oneshot(compile_request(body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["sceneDurations"], json!([1.75]));
}

#[tokio::test]
async fn test_body_over_configured_limit_is_rejected() {
    let root = tempfile::tempdir().unwrap();
    let config = ApiConfig {
        max_body_size: 1024,
        ..Default::default()
    };
    let mut big = scene("big", 2.0);
    big["media"]["url"] = json!(format!("data:image/png;base64,{}", "A".repeat(4096)));
    let body = json!({"scenes": [big]}).to_string();

    let response = app_with_config(root.path(), StubToolkit::default(), config)
        .oneshot(compile_request(body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_empty_scene_list_is_rejected() {
    let root = tempfile::tempdir().unwrap();
    let response = app(root.path(), StubToolkit::default())
        .oneshot(compile_request(json!({"scenes": []}).to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["code"], "validation_error");
    assert_eq!(body["stage"], "validate");
    assert!(body["sceneId"].is_null());
    assert!(body["detail"].as_str().unwrap().contains("At least one scene"));
}

#[tokio::test]
async fn test_malformed_json_is_rejected() {
    let root = tempfile::tempdir().unwrap();
    let response = app(root.path(), StubToolkit::default())
        .oneshot(compile_request("{\"scenes\": [}"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["code"], "validation_error");
    assert!(body["detail"].as_str().unwrap().starts_with("Malformed request body"));
}

#[tokio::test]
async fn test_missing_audio_names_the_scene() {
    let root = tempfile::tempdir().unwrap();
    let mut broken = scene("s2", 3.0);
    broken.as_object_mut().unwrap().remove("audio");
    let body = json!({"scenes": [scene("s1", 5.0), broken]});

    let response = app(root.path(), StubToolkit::default())
        .oneshot(compile_request(body.to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["sceneId"], "s2");
    assert_eq!(std::fs::read_dir(root.path()).map(|d| d.count()).unwrap_or(0), 0);
}

#[tokio::test]
async fn test_stage_timeout_maps_to_gateway_timeout() {
    let root = tempfile::tempdir().unwrap();
    let toolkit = StubToolkit { mux_timeout: true };
    let body = json!({"scenes": [scene("s1", 5.0)]});

    let response = app(root.path(), toolkit)
        .oneshot(compile_request(body.to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    let body = json_body(response).await;
    assert_eq!(body["code"], "timeout");
    assert_eq!(body["stage"], "mux");
    assert_eq!(body["sceneId"], "s1");
    assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_metrics_route_absent_when_disabled() {
    let root = tempfile::tempdir().unwrap();
    let response = app(root.path(), StubToolkit::default())
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
