//! Shared test helpers for `profilesync-core` integration tests.
//!
//! `InMemoryProfileStore` keeps raw JSON records the way the remote store
//! would, so tests can seed legacy shapes and then simulate edits made on
//! another device. Operations can be made to fail or held at a gate to
//! exercise interleavings.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use profilesync_core::{LeaveDecision, LeavePrompt, RemoteProfileStore, UnloadInterceptor};
use profilesync_domain::{
    CreateRecordRequest, ProfileField, ProfileSyncError, Result, UpdateRecordRequest,
};
use serde_json::{json, Value};
use tokio::sync::Notify;

/// Store operation, for scripting failures and gates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    Find,
    Fetch,
    Create,
    Update,
}

/// Holds an operation until released.
#[derive(Default)]
pub struct Gate {
    entered: Notify,
    release: Notify,
}

impl Gate {
    /// Wait until the gated operation has started.
    pub async fn entered(&self) {
        self.entered.notified().await;
    }

    /// Let the gated operation continue.
    pub fn release(&self) {
        self.release.notify_one();
    }
}

#[derive(Default)]
pub struct InMemoryProfileStore {
    records: Mutex<Vec<Value>>,
    failures: Mutex<HashMap<StoreOp, ProfileSyncError>>,
    lost_responses: Mutex<HashMap<StoreOp, ProfileSyncError>>,
    gates: Mutex<HashMap<StoreOp, Arc<Gate>>>,
    calls: Mutex<HashMap<StoreOp, usize>>,
    last_update: Mutex<Option<UpdateRecordRequest>>,
    last_create: Mutex<Option<CreateRecordRequest>>,
    next_id: AtomicUsize,
}

impl InMemoryProfileStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Seed a record body exactly as the server would return it.
    pub fn with_record(self: Arc<Self>, body: Value) -> Arc<Self> {
        self.records.lock().push(body);
        self
    }

    /// Make every call of `op` fail with `error` until cleared.
    pub fn fail(&self, op: StoreOp, error: ProfileSyncError) {
        self.failures.lock().insert(op, error);
    }

    /// Let the next call of `op` take effect, then fail with `error` as if
    /// the response never arrived.
    pub fn lose_next_response(&self, op: StoreOp, error: ProfileSyncError) {
        self.lost_responses.lock().insert(op, error);
    }

    pub fn clear_failures(&self) {
        self.failures.lock().clear();
    }

    /// Hold the next call of `op` until the returned gate is released.
    pub fn gate(&self, op: StoreOp) -> Arc<Gate> {
        let gate = Arc::new(Gate::default());
        self.gates.lock().insert(op, Arc::clone(&gate));
        gate
    }

    pub fn calls(&self, op: StoreOp) -> usize {
        self.calls.lock().get(&op).copied().unwrap_or(0)
    }

    pub fn record_count(&self) -> usize {
        self.records.lock().len()
    }

    pub fn record(&self, record_id: &str) -> Option<Value> {
        self.records.lock().iter().find(|body| body["id"] == record_id).cloned()
    }

    /// Change one key of a record's profile section, as another device would.
    pub fn set_profile_value(&self, record_id: &str, key: &str, value: Value) {
        let mut records = self.records.lock();
        if let Some(body) = records.iter_mut().find(|body| body["id"] == record_id) {
            body["profile"][key] = value;
        }
    }

    /// Replace a top-level key of a record (`companion`, `interests`).
    pub fn set_record_value(&self, record_id: &str, key: &str, value: Value) {
        let mut records = self.records.lock();
        if let Some(body) = records.iter_mut().find(|body| body["id"] == record_id) {
            body[key] = value;
        }
    }

    pub fn last_update(&self) -> Option<UpdateRecordRequest> {
        self.last_update.lock().clone()
    }

    pub fn last_create(&self) -> Option<CreateRecordRequest> {
        self.last_create.lock().clone()
    }

    async fn enter(&self, op: StoreOp) -> Result<()> {
        *self.calls.lock().entry(op).or_default() += 1;

        let gate = self.gates.lock().remove(&op);
        if let Some(gate) = gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }

        match self.failures.lock().get(&op) {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl RemoteProfileStore for InMemoryProfileStore {
    async fn find_records(&self, identity: &str) -> Result<Value> {
        self.enter(StoreOp::Find).await?;
        let matching: Vec<Value> = self
            .records
            .lock()
            .iter()
            .filter(|body| body["userId"] == identity)
            .map(|body| json!({ "id": body["id"].clone(), "userId": body["userId"].clone() }))
            .collect();
        Ok(json!({ "data": matching }))
    }

    async fn fetch_record(&self, record_id: &str) -> Result<Option<Value>> {
        self.enter(StoreOp::Fetch).await?;
        Ok(self.record(record_id))
    }

    async fn create_record(&self, request: &CreateRecordRequest) -> Result<Value> {
        self.enter(StoreOp::Create).await?;
        let id = format!("rec-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        let body = json!({
            "id": id,
            "userId": request.user_id,
            "profile": request.profile,
            "companion": request.companion,
            "interests": request.interests,
        });
        self.records.lock().push(body);
        *self.last_create.lock() = Some(request.clone());
        if let Some(error) = self.lost_responses.lock().remove(&StoreOp::Create) {
            return Err(error);
        }
        Ok(json!({ "data": { "id": id } }))
    }

    async fn update_record(&self, record_id: &str, request: &UpdateRecordRequest) -> Result<()> {
        self.enter(StoreOp::Update).await?;
        let mut records = self.records.lock();
        let Some(body) = records.iter_mut().find(|body| body["id"] == record_id) else {
            return Err(ProfileSyncError::NotFound(format!("record {record_id}")));
        };
        body["profile"] = json!(request.profile);
        body["companion"] = json!(request.companion);
        body["interests"] = json!(request.interests);
        drop(records);
        *self.last_update.lock() = Some(request.clone());
        Ok(())
    }
}

/// Leave prompt that answers with a fixed decision and records each call.
pub struct ScriptedPrompt {
    answer: LeaveDecision,
    asked: Mutex<Vec<Vec<ProfileField>>>,
}

impl ScriptedPrompt {
    pub fn answering(answer: LeaveDecision) -> Arc<Self> {
        Arc::new(Self { answer, asked: Mutex::new(Vec::new()) })
    }

    pub fn asked(&self) -> Vec<Vec<ProfileField>> {
        self.asked.lock().clone()
    }
}

#[async_trait]
impl LeavePrompt for ScriptedPrompt {
    async fn confirm_leave(&self, changed: &[ProfileField]) -> LeaveDecision {
        self.asked.lock().push(changed.to_vec());
        self.answer
    }
}

/// Unload interceptor that records arm/disarm transitions.
#[derive(Default)]
pub struct RecordingInterceptor {
    armed: AtomicBool,
    transitions: Mutex<Vec<bool>>,
    changed: Notify,
}

impl RecordingInterceptor {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn is_armed(&self) -> bool {
        self.armed.load(Ordering::SeqCst)
    }

    pub fn transitions(&self) -> Vec<bool> {
        self.transitions.lock().clone()
    }

    /// Wait for the next arm or disarm.
    pub async fn next_transition(&self) {
        self.changed.notified().await;
    }

    fn record(&self, armed: bool) {
        self.armed.store(armed, Ordering::SeqCst);
        self.transitions.lock().push(armed);
        self.changed.notify_one();
    }
}

impl UnloadInterceptor for RecordingInterceptor {
    fn arm(&self) {
        self.record(true);
    }

    fn disarm(&self) {
        self.record(false);
    }
}

/// Record body in the current nested shape.
pub fn record_body(record_id: &str, user_id: &str, name: &str, theme: &str, companion: u32) -> Value {
    json!({
        "id": record_id,
        "userId": user_id,
        "profile": { "name": name, "ttsEnabled": false, "theme": theme },
        "companion": { "id": companion },
        "interests": ["chess"],
    })
}
