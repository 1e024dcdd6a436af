//! Harness for driving the API through `warp::test`

#![allow(dead_code)]

use avs_core::Role;
use avs_objects::LocalObjectStore;
use avs_server::auth::hash_password_with_cost;
use avs_server::{routes, AppState, StudioConfig};
use avs_store::{MemoryStorage, NewUser, Storage};
use avs_test_utils::StubGenerator;
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;
use warp::http::{HeaderMap, StatusCode};

pub struct TestApp {
    pub state: AppState,
    pub storage: Arc<MemoryStorage>,
    pub generator: Arc<StubGenerator>,
    _objects: TempDir,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
    pub raw: bytes::Bytes,
}

impl TestResponse {
    pub fn data(&self) -> &Value {
        assert_eq!(self.body["ok"], json!(true), "expected success: {}", self.body);
        &self.body["data"]
    }

    pub fn error_code(&self) -> &str {
        assert_eq!(self.body["ok"], json!(false), "expected failure: {}", self.body);
        self.body["error"]["code"].as_str().unwrap()
    }

    pub fn error_message(&self) -> &str {
        self.body["error"]["message"].as_str().unwrap()
    }

    /// `name=value` part of the session cookie
    pub fn session_cookie(&self) -> String {
        let header = self.headers["set-cookie"].to_str().unwrap();
        header.split(';').next().unwrap().to_string()
    }
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_generator(StubGenerator::new())
    }

    pub fn with_generator(generator: StubGenerator) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let storage = Arc::new(MemoryStorage::new());
        let generator = Arc::new(generator);
        let config = StudioConfig::default().with_objects_root(dir.path());
        let state = AppState::new(
            config,
            storage.clone(),
            generator.clone(),
            Arc::new(LocalObjectStore::new(dir.path())),
        );
        Self {
            state,
            storage,
            generator,
            _objects: dir,
        }
    }

    pub async fn send(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        cookie: Option<&str>,
    ) -> TestResponse {
        let mut request = warp::test::request().method(method).path(path);
        if let Some(cookie) = cookie {
            request = request.header("cookie", cookie);
        }
        if let Some(body) = body {
            request = request.json(&body);
        }
        let response = request.reply(&routes::app(&self.state)).await;
        let raw = response.body().clone();
        let body = if raw.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&raw).unwrap_or(Value::Null)
        };
        TestResponse {
            status: response.status(),
            headers: response.headers().clone(),
            body,
            raw,
        }
    }

    pub async fn get(&self, path: &str, cookie: &str) -> TestResponse {
        self.send("GET", path, None, Some(cookie)).await
    }

    pub async fn post(&self, path: &str, body: Value, cookie: &str) -> TestResponse {
        self.send("POST", path, Some(body), Some(cookie)).await
    }

    pub async fn patch(&self, path: &str, body: Value, cookie: &str) -> TestResponse {
        self.send("PATCH", path, Some(body), Some(cookie)).await
    }

    pub async fn delete(&self, path: &str, cookie: &str) -> TestResponse {
        self.send("DELETE", path, None, Some(cookie)).await
    }

    /// Insert an account directly (cheap hash) and sign in
    pub async fn sign_in_as(&self, email: &str, role: Role) -> String {
        self.storage
            .create_user(NewUser {
                email: email.to_string(),
                name: None,
                password_hash: hash_password_with_cost("password1", 4).await.unwrap(),
                role,
            })
            .await
            .unwrap();
        let response = self
            .send(
                "POST",
                "/api/auth/login",
                Some(json!({ "email": email, "password": "password1" })),
                None,
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "{}", response.body);
        response.session_cookie()
    }

    pub async fn user(&self, email: &str) -> String {
        self.sign_in_as(email, Role::User).await
    }

    pub async fn admin(&self) -> String {
        self.sign_in_as("admin@example.com", Role::Admin).await
    }

    /// Client → project → asset for the signed-in caller; returns the ids
    pub async fn hierarchy(&self, cookie: &str) -> (String, String, String) {
        let client = self
            .post("/api/clients", json!({ "name": "Acme" }), cookie)
            .await;
        let client_id = client.data()["id"].as_str().unwrap().to_string();

        let project = self
            .post(
                "/api/projects",
                json!({ "clientId": client_id, "name": "Spring", "brief": "Fresh" }),
                cookie,
            )
            .await;
        let project_id = project.data()["id"].as_str().unwrap().to_string();

        let asset = self
            .post(
                "/api/assets",
                json!({
                    "projectId": project_id,
                    "name": "Banner",
                    "templateSvg": avs_test_utils::SAMPLE_TEMPLATE,
                    "defaultBindings": { "headline": "Default", "cta": "Go" }
                }),
                cookie,
            )
            .await;
        assert_eq!(asset.status, StatusCode::CREATED, "{}", asset.body);
        let asset_id = asset.data()["id"].as_str().unwrap().to_string();
        (client_id, project_id, asset_id)
    }
}
