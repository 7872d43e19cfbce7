//! Appwrite adapter using the Databases REST API.
//!
//! Readings live as documents in one Appwrite collection. The adapter lists
//! documents with server-side queries, so ordering, filtering and the page
//! cap are applied by Appwrite:
//!
//! - latest: `orderDesc("$createdAt")`, `limit(n)`
//! - ranged: `greaterThan("$createdAt", <iso8601>)`, `orderDesc("$createdAt")`, `limit(n)`
//!
//! ## Example
//!
//! ```rust,no_run
//! use aquawatch_adapters::appwrite::AppwriteStore;
//! use aquawatch_adapters::ReadingStore;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = AppwriteStore::builder()
//!         .project("my-project")
//!         .database("water")
//!         .collection("readings")
//!         .jwt("eyJhbGciOi...")
//!         .build()?;
//!
//!     for reading in store.latest(5).await? {
//!         println!("{} pH={}", reading.created_at, reading.ph);
//!     }
//!
//!     Ok(())
//! }
//! ```

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::Client;
use serde::Deserialize;

use aquawatch_types::Reading;

use crate::{AdapterError, ReadingStore};

/// Default Appwrite Cloud endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://cloud.appwrite.io/v1";

/// Attribute Appwrite stamps on every document at creation.
const CREATED_AT: &str = "$createdAt";

/// How requests authenticate against the project.
#[derive(Debug, Clone, PartialEq)]
pub enum Credentials {
    /// A user session JWT (`X-Appwrite-JWT`).
    Jwt(String),
    /// A server API key (`X-Appwrite-Key`).
    ApiKey(String),
    /// No credentials; only works for publicly readable collections.
    Anonymous,
}

impl Credentials {
    fn header(&self) -> Option<(&'static str, &str)> {
        match self {
            Credentials::Jwt(token) => Some(("X-Appwrite-JWT", token)),
            Credentials::ApiKey(key) => Some(("X-Appwrite-Key", key)),
            Credentials::Anonymous => None,
        }
    }
}

/// A single list-documents query.
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    OrderDesc(String),
    Limit(usize),
    GreaterThan(String, String),
}

impl Query {
    /// Serialize to the JSON query string format Appwrite expects.
    pub fn to_query_string(&self) -> String {
        let value = match self {
            Query::OrderDesc(attribute) => serde_json::json!({
                "method": "orderDesc",
                "attribute": attribute,
            }),
            Query::Limit(n) => serde_json::json!({
                "method": "limit",
                "values": [n],
            }),
            Query::GreaterThan(attribute, value) => serde_json::json!({
                "method": "greaterThan",
                "attribute": attribute,
                "values": [value],
            }),
        };
        value.to_string()
    }
}

/// Appwrite adapter for reading sensor documents.
#[derive(Debug, Clone)]
pub struct AppwriteStore {
    client: Client,
    endpoint: String,
    project: String,
    database: String,
    collection: String,
    credentials: Credentials,
    description: String,
}

impl AppwriteStore {
    /// Create a new builder for configuring the adapter.
    pub fn builder() -> AppwriteStoreBuilder {
        AppwriteStoreBuilder::default()
    }

    /// URL of the collection's list-documents endpoint.
    fn documents_url(&self) -> String {
        format!(
            "{}/databases/{}/collections/{}/documents",
            self.endpoint.trim_end_matches('/'),
            self.database,
            self.collection
        )
    }

    async fn list_documents(&self, queries: &[Query]) -> Result<Vec<Reading>, AdapterError> {
        let params: Vec<(&str, String)> =
            queries.iter().map(|q| ("queries[]", q.to_query_string())).collect();

        let mut request = self
            .client
            .get(self.documents_url())
            .header("X-Appwrite-Project", &self.project)
            .query(&params);

        if let Some((name, value)) = self.credentials.header() {
            request = request.header(name, value);
        }

        tracing::debug!(url = %self.documents_url(), queries = queries.len(), "listing documents");
        let response = request.send().await?;

        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Err(AdapterError::Auth("Invalid or expired credentials".to_string()));
        }

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(AdapterError::Http(format!(
                "Collection '{}' not found in database '{}'",
                self.collection, self.database
            )));
        }

        if !response.status().is_success() {
            return Err(AdapterError::Http(format!(
                "API returned status {}",
                response.status()
            )));
        }

        let body = response.text().await?;
        decode_documents(&body)
    }
}

#[async_trait]
impl ReadingStore for AppwriteStore {
    async fn latest(&self, limit: usize) -> Result<Vec<Reading>, AdapterError> {
        self.list_documents(&[Query::OrderDesc(CREATED_AT.to_string()), Query::Limit(limit)])
            .await
    }

    async fn created_after(
        &self,
        after: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<Reading>, AdapterError> {
        self.list_documents(&[
            Query::GreaterThan(
                CREATED_AT.to_string(),
                after.to_rfc3339_opts(SecondsFormat::Millis, true),
            ),
            Query::OrderDesc(CREATED_AT.to_string()),
            Query::Limit(limit),
        ])
        .await
    }

    fn description(&self) -> &str {
        &self.description
    }
}

/// Builder for AppwriteStore.
#[derive(Debug, Default)]
pub struct AppwriteStoreBuilder {
    endpoint: Option<String>,
    project: Option<String>,
    database: Option<String>,
    collection: Option<String>,
    credentials: Option<Credentials>,
    timeout: Option<Duration>,
}

impl AppwriteStoreBuilder {
    /// Set the API endpoint (default: Appwrite Cloud).
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Set the project ID.
    pub fn project(mut self, project: impl Into<String>) -> Self {
        self.project = Some(project.into());
        self
    }

    /// Set the database ID.
    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    /// Set the collection ID holding readings.
    pub fn collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = Some(collection.into());
        self
    }

    /// Authenticate with a user session JWT.
    pub fn jwt(mut self, token: impl Into<String>) -> Self {
        self.credentials = Some(Credentials::Jwt(token.into()));
        self
    }

    /// Authenticate with a server API key.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.credentials = Some(Credentials::ApiKey(key.into()));
        self
    }

    /// Set the request timeout (default: 10 seconds).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the adapter.
    ///
    /// Fails if the project, database or collection is missing, or if the
    /// HTTP client cannot be constructed.
    pub fn build(self) -> Result<AppwriteStore, AdapterError> {
        let project = required(self.project, "project")?;
        let database = required(self.database, "database")?;
        let collection = required(self.collection, "collection")?;
        let endpoint = self.endpoint.unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
        let timeout = self.timeout.unwrap_or(Duration::from_secs(10));

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AdapterError::Config(format!("Failed to build HTTP client: {}", e)))?;

        let description = format!("appwrite: {}/{}", database, collection);

        Ok(AppwriteStore {
            client,
            endpoint,
            project,
            database,
            collection,
            credentials: self.credentials.unwrap_or(Credentials::Anonymous),
            description,
        })
    }
}

fn required(value: Option<String>, name: &str) -> Result<String, AdapterError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(AdapterError::Config(format!("{} is required", name))),
    }
}

/// Decode a list-documents response body into readings.
pub fn decode_documents(body: &str) -> Result<Vec<Reading>, AdapterError> {
    let list: DocumentList = serde_json::from_str(body)?;
    Ok(list.documents)
}

/// Document list from the Appwrite Databases API.
#[derive(Debug, Deserialize)]
struct DocumentList {
    #[serde(default)]
    #[allow(dead_code)]
    total: u64,
    documents: Vec<Reading>,
}
