//! In-process gateway.
//!
//! Keeps rows and objects in memory and records every call in order, so
//! tests can check exactly which round trips a flow performed. Failures can
//! be injected per operation.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use serde_json::Value;

use super::{Gateway, PhotoUpload, Row};
use crate::entry::{SurveyEntry, STORAGE_BUCKET_NAME};
use crate::error::{Error, Result};

/// A gateway call, as recorded by [`MemoryGateway`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayCall {
    /// `insert` with the entry's establishment name.
    Insert(String),
    /// `select_all`.
    SelectAll,
    /// `upload` with the object path.
    Upload(String),
}

#[derive(Debug, Default)]
struct State {
    rows: Vec<Row>,
    objects: BTreeMap<String, Vec<u8>>,
    calls: Vec<GatewayCall>,
    next_id: i64,
    fail_insert: Option<String>,
    fail_select: Option<String>,
    fail_upload: Option<String>,
}

/// Gateway backed by process memory.
#[derive(Debug)]
pub struct MemoryGateway {
    bucket: String,
    state: Mutex<State>,
}

impl Default for MemoryGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryGateway {
    /// Create an empty gateway using the default bucket.
    #[must_use]
    pub fn new() -> Self {
        Self::with_bucket(STORAGE_BUCKET_NAME)
    }

    /// Create an empty gateway for the given bucket.
    #[must_use]
    pub fn with_bucket(bucket: &str) -> Self {
        Self {
            bucket: bucket.to_string(),
            state: Mutex::new(State {
                next_id: 1,
                ..State::default()
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        // A panic while holding the lock leaves plain data behind; keep going.
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Make every following `insert` fail with `message`.
    pub fn fail_inserts(&self, message: impl Into<String>) {
        self.state().fail_insert = Some(message.into());
    }

    /// Make every following `select_all` fail with `message`.
    pub fn fail_selects(&self, message: impl Into<String>) {
        self.state().fail_select = Some(message.into());
    }

    /// Make every following `upload` fail with `message`.
    pub fn fail_uploads(&self, message: impl Into<String>) {
        self.state().fail_upload = Some(message.into());
    }

    /// Seed a raw row, bypassing `insert` and the call log.
    pub fn push_row(&self, row: Row) {
        self.state().rows.push(row);
    }

    /// Calls made so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<GatewayCall> {
        self.state().calls.clone()
    }

    /// Number of `upload` calls made so far.
    #[must_use]
    pub fn upload_count(&self) -> usize {
        self.state()
            .calls
            .iter()
            .filter(|c| matches!(c, GatewayCall::Upload(_)))
            .count()
    }

    /// Number of `insert` calls made so far.
    #[must_use]
    pub fn insert_count(&self) -> usize {
        self.state()
            .calls
            .iter()
            .filter(|c| matches!(c, GatewayCall::Insert(_)))
            .count()
    }

    /// Stored rows.
    #[must_use]
    pub fn rows(&self) -> Vec<Row> {
        self.state().rows.clone()
    }

    /// Stored object contents, if present.
    #[must_use]
    pub fn object(&self, path: &str) -> Option<Vec<u8>> {
        self.state().objects.get(path).cloned()
    }
}

#[async_trait::async_trait]
impl Gateway for MemoryGateway {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn insert(&self, entry: &SurveyEntry) -> Result<()> {
        let mut state = self.state();
        state
            .calls
            .push(GatewayCall::Insert(entry.establishment_name.clone()));
        if let Some(message) = &state.fail_insert {
            return Err(Error::Injected {
                operation: "insert",
                message: message.clone(),
            });
        }

        let Value::Object(fields) = serde_json::to_value(entry)? else {
            return Err(Error::internal("survey entry did not serialize to an object"));
        };
        let id = state.next_id;
        state.next_id += 1;

        let mut row = Row::new();
        row.insert("id".to_string(), Value::from(id));
        row.extend(fields);
        row.entry("created_by".to_string()).or_insert(Value::Null);
        state.rows.push(row);
        Ok(())
    }

    async fn select_all(&self) -> Result<Vec<Row>> {
        let mut state = self.state();
        state.calls.push(GatewayCall::SelectAll);
        if let Some(message) = &state.fail_select {
            return Err(Error::Injected {
                operation: "select",
                message: message.clone(),
            });
        }
        Ok(state.rows.clone())
    }

    async fn upload(&self, path: &str, photo: &PhotoUpload) -> Result<()> {
        let mut state = self.state();
        state.calls.push(GatewayCall::Upload(path.to_string()));
        if let Some(message) = &state.fail_upload {
            return Err(Error::Injected {
                operation: "upload",
                message: message.clone(),
            });
        }
        state.objects.insert(path.to_string(), photo.bytes.clone());
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        format!("memory://{}/{path}", self.bucket)
    }
}
