//! Common test utilities for HTTP tests
//!
//! Builds the full router over an in-memory store, so these tests need no
//! database. Requests go through `tower::ServiceExt::oneshot`.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use teamtask_api::app::{build_router, AppState};
use teamtask_api::config::Config;
use teamtask_shared::ai::{ExtractorError, GeneratedTask, TaskExtractor};
use teamtask_shared::clock::SystemClock;
use teamtask_shared::store::InMemoryStore;
use tower::ServiceExt;
use uuid::Uuid;

pub const JWT_SECRET: &str = "test-secret-key-at-least-32-bytes-long";

pub fn test_config() -> Config {
    let vars: HashMap<&str, &str> = [
        ("DATABASE_URL", "postgresql://unused/test"),
        ("JWT_SECRET", JWT_SECRET),
    ]
    .into_iter()
    .collect();

    Config::from_lookup(|key| vars.get(key).map(|v| v.to_string())).expect("test config")
}

/// Answers every extraction with the same candidates
pub struct StaticExtractor(pub Vec<GeneratedTask>);

#[async_trait]
impl TaskExtractor for StaticExtractor {
    async fn extract(&self, _text: &str, _reference_time: DateTime<Utc>) -> Result<Vec<GeneratedTask>, ExtractorError> {
        Ok(self.0.clone())
    }
}

/// A signed-up user and their personal organization
#[derive(Debug, Clone)]
pub struct Account {
    pub token: String,
    pub refresh_token: String,
    pub user_id: Uuid,
    pub organization_id: Uuid,
    pub invite_code: String,
}

pub struct TestApp {
    pub app: Router,
}

impl TestApp {
    pub fn new() -> Self {
        Self::build(None)
    }

    pub fn with_extractor(extractor: Arc<dyn TaskExtractor>) -> Self {
        Self::build(Some(extractor))
    }

    fn build(extractor: Option<Arc<dyn TaskExtractor>>) -> Self {
        let state = AppState::new(
            Arc::new(InMemoryStore::new()),
            Arc::new(SystemClock),
            extractor,
            test_config(),
        );

        Self {
            app: build_router(state),
        }
    }

    /// Sends one request; the body is parsed as JSON (`Null` when empty)
    pub async fn request(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();

        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };

        (status, json)
    }

    pub async fn get(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.request(Method::GET, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, Some(token), Some(body)).await
    }

    pub async fn signup(&self, username: &str) -> Account {
        let (status, body) = self
            .request(
                Method::POST,
                "/v1/auth/signup",
                None,
                Some(serde_json::json!({ "username": username, "password": "correct horse" })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "signup failed: {body}");

        Account {
            token: body["access_token"].as_str().unwrap().to_string(),
            refresh_token: body["refresh_token"].as_str().unwrap().to_string(),
            user_id: body["user"]["id"].as_str().unwrap().parse().unwrap(),
            organization_id: body["organization"]["id"].as_str().unwrap().parse().unwrap(),
            invite_code: body["organization"]["invite_code"].as_str().unwrap().to_string(),
        }
    }

    /// Creates a task in `organization_id` and returns its id
    pub async fn create_task(&self, account: &Account, organization_id: Uuid, title: &str) -> Uuid {
        let (status, body) = self
            .post(
                "/v1/tasks",
                &account.token,
                serde_json::json!({ "organization_id": organization_id, "title": title }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create task failed: {body}");

        body["task"]["id"].as_str().unwrap().parse().unwrap()
    }
}
