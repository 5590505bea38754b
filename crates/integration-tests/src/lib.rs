//! Shared harness for the end-to-end tests: a full router over an in-memory
//! SQLite database and a temporary upload directory.

use std::path::PathBuf;
use std::sync::Arc;

use api_adapters::{router, AppState, UploadMount};
use axum::body::{to_bytes, Body};
use axum::http::{header, HeaderMap, Method, Request, StatusCode};
use axum::Router;
use domains::{CategoryRepo, SymbolRepo, ThumbnailStore};
use serde_json::Value;
use storage_adapters::{LocalThumbnailStore, SqliteStore};
use tempfile::TempDir;
use tower::ServiceExt;

pub const PLACEHOLDER: &str = "/assets/no-template-preview.jpg";
pub const THUMBS_FOLDER: &str = "symbols";

pub struct TestApp {
    pub router: Router,
    pub store: Arc<SqliteStore>,
    pub uploads: TempDir,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let uploads = tempfile::tempdir().expect("temp upload dir");
        let store = Arc::new(SqliteStore::new("sqlite::memory:", 1).await.expect("sqlite store"));
        let thumbs: Arc<dyn ThumbnailStore> = Arc::new(LocalThumbnailStore::new(
            uploads.path().to_path_buf(),
            "/uploads".into(),
            THUMBS_FOLDER.into(),
            PLACEHOLDER.into(),
            128,
        ));

        let symbols: Arc<dyn SymbolRepo> = store.clone();
        let categories: Arc<dyn CategoryRepo> = store.clone();
        let content = services::symbol_service(symbols, categories, thumbs);

        let router = router(
            AppState::new(content),
            Some(UploadMount {
                url_prefix: "/uploads".into(),
                dir: uploads.path().to_path_buf(),
            }),
        );
        Self { router, store, uploads }
    }

    pub fn thumb_path(&self, id: i64) -> PathBuf {
        self.uploads.path().join(THUMBS_FOLDER).join(format!("{id}.png"))
    }

    /// Writes raw bytes as the thumbnail of `id`.
    pub fn put_thumb_file(&self, id: i64, bytes: &[u8]) {
        std::fs::create_dir_all(self.uploads.path().join(THUMBS_FOLDER)).unwrap();
        std::fs::write(self.thumb_path(id), bytes).unwrap();
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into()))
        };
        TestResponse { status, headers, body }
    }

    pub async fn json(&self, method: Method, uri: &str, body: Option<Value>) -> TestResponse {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send(request).await
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        self.json(Method::GET, uri, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> TestResponse {
        self.json(Method::POST, uri, Some(body)).await
    }

    pub async fn delete(&self, uri: &str) -> TestResponse {
        self.json(Method::DELETE, uri, None).await
    }

    /// Creates a symbol and returns its id, asserting success.
    pub async fn create_symbol(&self, body: Value) -> i64 {
        let res = self.post("/api/v1/symbols", body).await;
        assert_eq!(res.status, StatusCode::CREATED, "create failed: {}", res.body);
        res.body["id"].as_i64().expect("symbol id")
    }

    pub async fn create_category(&self, name: &str) -> i64 {
        let res = self.post("/api/v1/symbol-categories", serde_json::json!({ "name": name })).await;
        assert_eq!(res.status, StatusCode::CREATED, "category create failed: {}", res.body);
        res.body["id"].as_i64().expect("category id")
    }
}

/// A small solid PNG.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba([20, 120, 220, 255]));
    let mut out = Vec::new();
    img.write_to(&mut std::io::Cursor::new(&mut out), image::ImageFormat::Png)
        .unwrap();
    out
}
