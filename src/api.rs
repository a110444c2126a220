//! Paprika sync API access.
//!
//! [`RecipeSource`] is the seam between the export pipeline and the network:
//! the pipeline only ever talks to the trait, [`PaprikaClient`] implements it
//! over HTTP, and tests substitute a recording mock.
//!
//! ## Wire contract
//!
//! | Operation | Request | `result` payload |
//! |-----------|---------|------------------|
//! | list recipes | `GET {base}/sync/recipes/` | `[{uid, hash}]` |
//! | categories | `GET {base}/sync/categories/` | `[{uid, name, ...}]` |
//! | one recipe | `GET {base}/sync/recipe/{uid}/` | full recipe object |
//! | token check | `GET {base}/sync/status/` | ignored; status code only |
//! | login | `POST {base}/account/login/` (form `email`, `password`) | `{token}` |
//!
//! Authenticated calls carry `Authorization: Bearer <token>`. Success is the
//! HTTP status alone; error bodies are not parsed. Photos are fetched from
//! their absolute URL without credentials.

use crate::config::ApiConfig;
use crate::types::{CanonicalRecipe, CategoryMapping, RemoteRecipeSummary};
use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Got {status} from Paprika API when fetching {operation}")]
    Status { status: u16, operation: &'static str },
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
}

impl ApiError {
    /// HTTP status for status failures; `None` for transport errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Request(e) => e.status().map(|s| s.as_u16()),
        }
    }
}

/// Read access to a user's recipes.
///
/// All operations are idempotent reads. No retries happen at this layer;
/// callers decide whether a failure is fatal.
#[async_trait]
pub trait RecipeSource: Send + Sync {
    /// Every recipe's uid and content hash, in remote order.
    async fn list_recipes(&self) -> Result<Vec<RemoteRecipeSummary>, ApiError>;

    /// Category uid → name for the whole account.
    async fn categories(&self) -> Result<CategoryMapping, ApiError>;

    /// The full recipe for one uid.
    async fn recipe(&self, uid: &str) -> Result<CanonicalRecipe, ApiError>;

    /// Raw bytes of a recipe photo.
    async fn photo(&self, url: &str) -> Result<Vec<u8>, ApiError>;
}

#[derive(Deserialize)]
struct Envelope<T> {
    result: T,
}

#[derive(Deserialize)]
struct RemoteCategory {
    uid: String,
    name: String,
}

#[derive(Deserialize)]
struct LoginResult {
    token: String,
}

/// HTTP client for the Paprika v2 sync API, bound to one bearer token.
#[derive(Debug, Clone)]
pub struct PaprikaClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl PaprikaClient {
    pub fn new(config: &ApiConfig, token: impl Into<String>) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .gzip(true)
            .build()?;
        Ok(Self::with_http(http, &config.base_url, token))
    }

    /// Reuse an existing `reqwest::Client` (and its connection pool).
    pub fn with_http(http: reqwest::Client, base_url: &str, token: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    /// Same client, different token. Used after a fresh login.
    pub fn with_token(&self, token: impl Into<String>) -> Self {
        Self {
            http: self.http.clone(),
            base_url: self.base_url.clone(),
            token: token.into(),
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn get_result<T: DeserializeOwned>(
        &self,
        path: &str,
        operation: &'static str,
    ) -> Result<T, ApiError> {
        let url = self.endpoint(path);
        debug!(%url, "GET");
        let response = self.http.get(&url).bearer_auth(&self.token).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                operation,
            });
        }
        let envelope: Envelope<T> = response.json().await?;
        Ok(envelope.result)
    }

    /// Whether the sync API accepts the current token.
    ///
    /// A rejected token is `Ok(false)`; only transport failures are errors.
    pub async fn token_is_valid(&self) -> Result<bool, ApiError> {
        if self.token.trim().is_empty() {
            return Ok(false);
        }
        let response = self
            .http
            .get(self.endpoint("sync/status/"))
            .bearer_auth(&self.token)
            .send()
            .await?;
        Ok(response.status().is_success())
    }

    /// Exchange account credentials for a new bearer token.
    pub async fn login(&self, email: &str, password: &str) -> Result<String, ApiError> {
        let response = self
            .http
            .post(self.endpoint("account/login/"))
            .form(&[("email", email), ("password", password)])
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                operation: "login",
            });
        }
        let envelope: Envelope<LoginResult> = response.json().await?;
        Ok(envelope.result.token)
    }
}

#[async_trait]
impl RecipeSource for PaprikaClient {
    async fn list_recipes(&self) -> Result<Vec<RemoteRecipeSummary>, ApiError> {
        self.get_result("sync/recipes/", "recipes list").await
    }

    async fn categories(&self) -> Result<CategoryMapping, ApiError> {
        let raw: Vec<RemoteCategory> = self.get_result("sync/categories/", "categories").await?;
        Ok(raw.into_iter().map(|c| (c.uid, c.name)).collect())
    }

    async fn recipe(&self, uid: &str) -> Result<CanonicalRecipe, ApiError> {
        self.get_result(&format!("sync/recipe/{uid}/"), "recipe")
            .await
    }

    async fn photo(&self, url: &str) -> Result<Vec<u8>, ApiError> {
        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                operation: "photo",
            });
        }
        Ok(response.bytes().await?.to_vec())
    }
}
