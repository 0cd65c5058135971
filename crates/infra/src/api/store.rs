//! HTTP adapter for the remote profile store
//!
//! Endpoints:
//! - `GET {base}/records?matching=<identity>`: listing lookup
//! - `GET {base}/record/{id}`: detail
//! - `POST {base}/record`: create
//! - `PATCH {base}/record/{id}`: partial update
//!
//! Bodies are passed through as raw JSON; shape normalization happens in
//! `profilesync-core`.

use std::sync::Arc;

use async_trait::async_trait;
use profilesync_core::RemoteProfileStore;
use profilesync_domain::constants::{MATCHING_QUERY_PARAM, RECORDS_PATH, RECORD_PATH};
use profilesync_domain::{CreateRecordRequest, Result, UpdateRecordRequest};
use serde_json::Value;
use tracing::instrument;

use super::client::ApiClient;

pub struct HttpProfileStore {
    client: Arc<ApiClient>,
}

impl HttpProfileStore {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    fn listing_path(identity: &str) -> String {
        format!("{RECORDS_PATH}?{MATCHING_QUERY_PARAM}={}", urlencoding::encode(identity))
    }

    fn record_path(record_id: &str) -> String {
        format!("{RECORD_PATH}/{}", urlencoding::encode(record_id))
    }
}

#[async_trait]
impl RemoteProfileStore for HttpProfileStore {
    #[instrument(skip(self))]
    async fn find_records(&self, identity: &str) -> Result<Value> {
        Ok(self.client.get(&Self::listing_path(identity)).await?)
    }

    #[instrument(skip(self))]
    async fn fetch_record(&self, record_id: &str) -> Result<Option<Value>> {
        Ok(self.client.get_optional(&Self::record_path(record_id)).await?)
    }

    #[instrument(skip(self, request))]
    async fn create_record(&self, request: &CreateRecordRequest) -> Result<Value> {
        Ok(self.client.post(RECORD_PATH, request).await?)
    }

    #[instrument(skip(self, request))]
    async fn update_record(&self, record_id: &str, request: &UpdateRecordRequest) -> Result<()> {
        Ok(self.client.patch(&Self::record_path(record_id), request).await?)
    }
}
