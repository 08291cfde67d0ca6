//! Hosted backend gateway.
//!
//! Talks to a PostgREST-style table endpoint and an object storage endpoint
//! under the same project URL, authenticating every request with the
//! project's API key.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response, Url};
use tracing::{debug, info};

use super::{Gateway, PhotoUpload, Row};
use crate::config::BackendConfig;
use crate::entry::SurveyEntry;
use crate::error::{Error, Result};

/// Gateway for the hosted database and object storage.
#[derive(Clone)]
pub struct RestGateway {
    client: Client,
    base_url: Url,
    api_key: String,
    table: String,
    bucket: String,
}

impl std::fmt::Debug for RestGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestGateway")
            .field("base_url", &self.base_url.as_str())
            .field("api_key", &"<redacted>")
            .field("table", &self.table)
            .field("bucket", &self.bucket)
            .finish_non_exhaustive()
    }
}

impl RestGateway {
    /// Create a gateway for the given project URL and API key.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL does not parse or the HTTP client cannot
    /// be built.
    pub fn new(
        base_url: &str,
        api_key: impl Into<String>,
        table: impl Into<String>,
        bucket: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let base_url = Url::parse(base_url.trim_end_matches('/')).map_err(|e| {
            Error::ConfigValidation {
                message: format!("invalid backend url {base_url}: {e}"),
            }
        })?;
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("lsurvey/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url,
            api_key: api_key.into(),
            table: table.into(),
            bucket: bucket.into(),
        })
    }

    /// Create a gateway from the backend section of the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL or API key is missing, or the client
    /// cannot be built.
    pub fn from_config(backend: &BackendConfig) -> Result<Self> {
        let url = backend.url.as_deref().ok_or_else(|| Error::ConfigValidation {
            message: "backend.url is required for the rest backend".to_string(),
        })?;
        let api_key = backend
            .api_key
            .as_deref()
            .ok_or_else(|| Error::ConfigValidation {
                message: "backend.api_key is required for the rest backend".to_string(),
            })?;
        Self::new(
            url,
            api_key,
            &backend.table,
            &backend.bucket,
            backend.timeout(),
        )
    }

    fn base(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    /// Endpoint for the entries table.
    #[must_use]
    pub fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.base(), self.table)
    }

    /// Endpoint for writing an object.
    #[must_use]
    pub fn object_url(&self, path: &str) -> String {
        format!("{}/storage/v1/object/{}/{path}", self.base(), self.bucket)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    /// Turn a non-success response into [`Error::Remote`], body verbatim.
    async fn check(operation: &'static str, response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        Err(Error::Remote {
            operation,
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait::async_trait]
impl Gateway for RestGateway {
    fn name(&self) -> &'static str {
        "rest"
    }

    async fn insert(&self, entry: &SurveyEntry) -> Result<()> {
        let url = self.table_url();
        debug!("POST {}", url);
        let response = self
            .authorized(self.client.post(&url))
            .header("Prefer", "return=minimal")
            .json(&[entry])
            .send()
            .await?;
        Self::check("insert", response).await?;
        info!("Inserted entry for {}", entry.establishment_name);
        Ok(())
    }

    async fn select_all(&self) -> Result<Vec<Row>> {
        let url = self.table_url();
        debug!("GET {}?select=*", url);
        let response = self
            .authorized(self.client.get(&url))
            .query(&[("select", "*")])
            .send()
            .await?;
        let rows: Vec<Row> = Self::check("select", response).await?.json().await?;
        debug!("Fetched {} rows", rows.len());
        Ok(rows)
    }

    async fn upload(&self, path: &str, photo: &PhotoUpload) -> Result<()> {
        let url = self.object_url(path);
        debug!("POST {} ({} bytes)", url, photo.bytes.len());
        let response = self
            .authorized(self.client.post(&url))
            .header(reqwest::header::CONTENT_TYPE, photo.content_type())
            .body(photo.bytes.clone())
            .send()
            .await?;
        Self::check("upload", response).await?;
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{path}",
            self.base(),
            self.bucket
        )
    }
}
