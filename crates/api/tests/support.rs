//! Shared fixtures for app-level tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use profilesync_core::{LeaveDecision, LeavePrompt, UnloadInterceptor};
use profilesync_domain::{Config, ProfileField};
use serde_json::{json, Value};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Config pointing at `server` with a single attempt per request.
pub fn config_for(server: &MockServer) -> Config {
    let mut config = Config::default();
    config.api.base_url = server.uri();
    config.api.max_attempts = 1;
    config.api.timeout_secs = 5;
    config.api.access_token = Some("test-token".into());
    config
}

pub fn stored_record(record_id: &str, user_id: &str) -> Value {
    json!({
        "id": record_id,
        "userId": user_id,
        "profile": { "name": "Ada", "ttsEnabled": true, "theme": "sky" },
        "companion": { "id": 2 },
        "interests": ["chess", { "id": "topic-1", "label": "Fractions" }],
    })
}

pub async fn mount_listing(server: &MockServer, user_id: &str, ids: &[&str]) {
    let entries: Vec<Value> = ids.iter().map(|id| json!({ "id": id, "userId": user_id })).collect();
    Mock::given(method("GET"))
        .and(path("/records"))
        .and(query_param("matching", user_id))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": entries })))
        .mount(server)
        .await;
}

pub async fn mount_detail(server: &MockServer, record_id: &str, body: Value) {
    Mock::given(method("GET"))
        .and(path(format!("/record/{record_id}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// Number of requests the server saw for `method_name path`.
pub async fn request_count(server: &MockServer, method_name: &str, request_path: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|request| {
            request.method.as_str() == method_name && request.url.path() == request_path
        })
        .count()
}

/// Poll until `request_count` reaches `expected` or two seconds pass.
pub async fn wait_for_requests(
    server: &MockServer,
    method_name: &str,
    request_path: &str,
    expected: usize,
) -> usize {
    let mut seen = 0;
    for _ in 0..40 {
        seen = request_count(server, method_name, request_path).await;
        if seen >= expected {
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    seen
}

pub struct FixedPrompt {
    decision: LeaveDecision,
    asked: AtomicUsize,
}

impl FixedPrompt {
    pub fn answering(decision: LeaveDecision) -> Arc<Self> {
        Arc::new(Self { decision, asked: AtomicUsize::new(0) })
    }

    pub fn asked(&self) -> usize {
        self.asked.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LeavePrompt for FixedPrompt {
    async fn confirm_leave(&self, _changed: &[ProfileField]) -> LeaveDecision {
        self.asked.fetch_add(1, Ordering::SeqCst);
        self.decision
    }
}

#[derive(Default)]
pub struct FlagInterceptor {
    armed: std::sync::atomic::AtomicBool,
}

impl FlagInterceptor {
    pub fn is_armed(&self) -> bool {
        self.armed.load(Ordering::SeqCst)
    }
}

impl UnloadInterceptor for FlagInterceptor {
    fn arm(&self) {
        self.armed.store(true, Ordering::SeqCst);
    }

    fn disarm(&self) {
        self.armed.store(false, Ordering::SeqCst);
    }
}
