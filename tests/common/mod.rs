#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use axum::body::Bytes;
use axum_test::{TestResponse, TestServer};
use serde_json::{json, Value};

use schoolhub_api::database::{MemoryStore, Repositories};
use schoolhub_api::services::MediaStorage;
use schoolhub_api::AppState;

/// The full router over a fresh in-memory store and a private uploads directory
pub struct TestApp {
    pub server: TestServer,
    pub db: Repositories,
    pub uploads: PathBuf,
}

impl TestApp {
    pub fn spawn() -> Result<Self> {
        let uploads = std::env::temp_dir().join(format!("schoolhub-test-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&uploads)?;

        let db = Repositories::new(Arc::new(MemoryStore::new()));
        let state = AppState::new(db.clone(), MediaStorage::new(uploads.clone()));
        let server = TestServer::new(schoolhub_api::app(state))?;

        Ok(Self { server, db, uploads })
    }

    /// POST /students/register and return the `data` payload
    pub async fn register(&self, name: &str, email: &str) -> Value {
        let res = self
            .server
            .post("/students/register")
            .json(&json!({ "name": name, "email": email }))
            .await;
        assert_eq!(res.status_code(), 201, "register failed: {}", res.text());
        data(&res)
    }

    /// Multipart upload with one file part plus text fields
    pub async fn upload(
        &self,
        path: &str,
        fields: &[(&str, &str)],
        file: Option<(&str, &str, &str, &[u8])>,
    ) -> TestResponse {
        let (body, content_type) = multipart_body(fields, file);
        self.server
            .post(path)
            .content_type(&content_type)
            .bytes(Bytes::from(body))
            .await
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.uploads);
    }
}

/// The `data` field of a success envelope
pub fn data(res: &TestResponse) -> Value {
    let body = res.json::<Value>();
    assert_eq!(body["success"], true, "expected success envelope: {}", body);
    body["data"].clone()
}

/// Hand-built `multipart/form-data`; `file` is (field, file name, content type, bytes)
pub fn multipart_body(fields: &[(&str, &str)], file: Option<(&str, &str, &str, &[u8])>) -> (Vec<u8>, String) {
    let boundary = "schoolhub-test-boundary";
    let mut body = Vec::new();

    for (name, value) in fields {
        body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
        body.extend_from_slice(format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes());
        body.extend_from_slice(value.as_bytes());
        body.extend_from_slice(b"\r\n");
    }

    if let Some((field, file_name, content_type, bytes)) = file {
        body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                field, file_name
            )
            .as_bytes(),
        );
        body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", content_type).as_bytes());
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }

    body.extend_from_slice(format!("--{}--\r\n", boundary).as_bytes());
    (body, format!("multipart/form-data; boundary={}", boundary))
}
