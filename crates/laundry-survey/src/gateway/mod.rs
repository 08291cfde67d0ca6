//! Persistence gateway.
//!
//! A thin pass-through to the backend's table and object storage. Each
//! call is one round trip; failures come back verbatim and nothing is
//! retried, batched or paginated.

pub mod local;
pub mod memory;
pub mod rest;

use std::path::Path;

use serde_json::{Map, Value};

use crate::config::{BackendKind, Config};
use crate::entry::SurveyEntry;
use crate::error::{Error, Result};

pub use local::LocalGateway;
pub use memory::{GatewayCall, MemoryGateway};
pub use rest::RestGateway;

/// One row as returned by `select *`, keyed by column name in column order.
pub type Row = Map<String, Value>;

/// A photo attached to a submission.
#[derive(Clone, PartialEq, Eq)]
pub struct PhotoUpload {
    /// Original file name, used for the extension.
    pub file_name: String,
    /// File contents.
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for PhotoUpload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhotoUpload")
            .field("file_name", &self.file_name)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl PhotoUpload {
    /// Create an upload from a name and contents.
    #[must_use]
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    /// Read a photo from disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| Error::FileRead {
                path: path.to_path_buf(),
                source,
            })?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self { file_name, bytes })
    }

    /// The extension used for the stored object name.
    ///
    /// A name without a dot is used whole.
    #[must_use]
    pub fn extension(&self) -> &str {
        self.file_name.rsplit('.').next().unwrap_or_default()
    }

    /// MIME type derived from the extension.
    #[must_use]
    pub fn content_type(&self) -> &'static str {
        match self.extension().to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => "image/jpeg",
            "png" => "image/png",
            "gif" => "image/gif",
            "webp" => "image/webp",
            "heic" => "image/heic",
            "bmp" => "image/bmp",
            _ => "application/octet-stream",
        }
    }
}

/// Table and object storage operations used by the form, grid and export.
#[async_trait::async_trait]
pub trait Gateway: Send + Sync {
    /// Backend name for logging and status output.
    fn name(&self) -> &'static str;

    /// Insert one entry.
    ///
    /// # Errors
    ///
    /// Returns the backend's error verbatim.
    async fn insert(&self, entry: &SurveyEntry) -> Result<()>;

    /// Fetch every row of the entries table.
    ///
    /// # Errors
    ///
    /// Returns the backend's error verbatim.
    async fn select_all(&self) -> Result<Vec<Row>>;

    /// Store a photo at `path` inside the bucket.
    ///
    /// # Errors
    ///
    /// Returns the backend's error verbatim.
    async fn upload(&self, path: &str, photo: &PhotoUpload) -> Result<()>;

    /// Public URL for an object path. A pure function of bucket and path.
    fn public_url(&self, path: &str) -> String;
}

/// Open the gateway selected by configuration.
///
/// # Errors
///
/// Returns an error if the backend cannot be initialized.
pub fn connect(config: &Config) -> Result<Box<dyn Gateway>> {
    let backend = &config.backend;
    let gateway: Box<dyn Gateway> = match backend.kind {
        BackendKind::Rest => Box::new(RestGateway::from_config(backend)?),
        BackendKind::Local => Box::new(LocalGateway::open(
            config.database_path(),
            config.objects_dir(),
            &backend.table,
            &backend.bucket,
        )?),
        BackendKind::Memory => Box::new(MemoryGateway::with_bucket(&backend.bucket)),
    };
    tracing::debug!("Connected to {} gateway", gateway.name());
    Ok(gateway)
}
