/*!
 * Portfolio Client
 * Typed access to the content and maintenance API with a local fallback copy
 */
pub mod cache;

pub use cache::{CacheError, FileCache, LocalCache, MemoryCache};

use chrono::Utc;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde_json::{Map, Value};
use std::{sync::Arc, time::Duration};
use thiserror::Error;

use crate::content::{
    self, defaults,
    schema::{ContactSubmission, MaintenancePatch, MaintenanceRecord},
    ContentError, Mutation, Section,
};
use crate::gate::{MaintenanceGate, SiteState, View};
use crate::routes::ApiResponse;

/// Cache key for the visitor's colour theme.
pub const THEME_KEY: &str = "theme";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum ClientError {
    /// The request never completed or the body could not be read.
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with a failure envelope or a non-2xx status.
    #[error("Status error: {1} (Status {0})")]
    Status(StatusCode, String),

    #[error("Unexpected response: {0}")]
    InvalidResponse(String),

    #[error("A maintenance token is required for this operation")]
    MissingToken,

    #[error(transparent)]
    Content(#[from] ContentError),

    #[error(transparent)]
    Cache(#[from] CacheError),
}

impl ClientError {
    /// The server could not be reached or failed on its side; the request
    /// itself may well have been fine.
    pub fn is_unavailable(&self) -> bool {
        match self {
            ClientError::Transport(_) => true,
            ClientError::Status(status, _) => status.is_server_error(),
            _ => false,
        }
    }
}

/// Where a write ended up.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncOutcome {
    /// Accepted by the server; carries the item or section it returned.
    Remote(Option<Value>),
    /// Server unavailable; applied to the cached copy only.
    Local(Option<Value>),
}

impl SyncOutcome {
    pub fn is_remote(&self) -> bool {
        matches!(self, SyncOutcome::Remote(_))
    }

    pub fn value(&self) -> Option<&Value> {
        match self {
            SyncOutcome::Remote(value) | SyncOutcome::Local(value) => value.as_ref(),
        }
    }
}

/// One visitor or admin session against the portfolio API.
pub struct PortfolioClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
    cache: Arc<dyn LocalCache>,
    gate: MaintenanceGate,
}

impl PortfolioClient {
    pub fn new(base_url: impl Into<String>, cache: Arc<dyn LocalCache>) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
            cache,
            gate: MaintenanceGate::new(),
        })
    }

    /// Pre-shared maintenance token sent as a bearer credential on admin writes.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn gate(&self) -> &MaintenanceGate {
        &self.gate
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http.request(method, format!("{}{}", self.base_url, path))
    }

    fn content_request(&self, method: Method, section: Section, id: Option<&str>) -> RequestBuilder {
        let builder = self
            .request(method, "/api/content")
            .query(&[("section", section.as_str())]);
        let builder = match id {
            Some(id) => builder.query(&[("id", id)]),
            None => builder,
        };
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Send and unwrap the response envelope.
    async fn send(&self, builder: RequestBuilder) -> Result<Option<Value>, ClientError> {
        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;

        let envelope: ApiResponse = serde_json::from_str(&body).map_err(|e| {
            if status.is_success() {
                ClientError::InvalidResponse(e.to_string())
            } else {
                ClientError::Status(status, body.clone())
            }
        })?;

        if !status.is_success() || !envelope.success {
            let reason = envelope
                .error
                .or(envelope.message)
                .unwrap_or_else(|| "request failed".to_string());
            return Err(ClientError::Status(status, reason));
        }
        Ok(envelope.data)
    }

    fn remember(&self, key: &str, value: &Value) {
        if let Err(e) = self.cache.store(key, value) {
            tracing::warn!(key, error = %e, "failed to update local cache");
        }
    }

    /// Cached copy for `key`, or the original error when there is none.
    fn cached_or(&self, key: &str, error: ClientError) -> Result<Value, ClientError> {
        tracing::warn!(key, error = %error, "request failed, using cached copy");
        match self.cache.load(key) {
            Ok(Some(value)) => Ok(value),
            Ok(None) => Err(error),
            Err(cache_error) => {
                tracing::warn!(key, error = %cache_error, "local cache unreadable");
                Err(error)
            }
        }
    }

    // ------------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------------

    /// Every section; falls back to whatever sections are cached.
    pub async fn fetch_all(&self) -> Result<Map<String, Value>, ClientError> {
        let error = match self.send(self.request(Method::GET, "/api/content")).await {
            Ok(Some(Value::Object(sections))) => {
                for (key, value) in &sections {
                    if let Ok(section) = key.parse::<Section>() {
                        self.remember(&section.cache_key(), value);
                    }
                }
                return Ok(sections);
            }
            Ok(_) => ClientError::InvalidResponse("content is not an object".to_string()),
            Err(e) => e,
        };

        tracing::warn!(error = %error, "content fetch failed, using cached sections");
        let cached: Map<String, Value> = Section::ALL
            .into_iter()
            .filter_map(|section| {
                self.cache
                    .load(&section.cache_key())
                    .ok()
                    .flatten()
                    .map(|value| (section.as_str().to_string(), value))
            })
            .collect();

        if cached.is_empty() {
            Err(error)
        } else {
            Ok(cached)
        }
    }

    pub async fn fetch_section(&self, section: Section) -> Result<Value, ClientError> {
        let key = section.cache_key();
        let result = self
            .send(self.content_request(Method::GET, section, None))
            .await
            .and_then(|data| data.ok_or_else(|| ClientError::InvalidResponse("missing data".to_string())));

        match result {
            Ok(value) => {
                self.remember(&key, &value);
                Ok(value)
            }
            Err(e) => self.cached_or(&key, e),
        }
    }

    /// One project or blog post by id. Served from the cached section when offline.
    pub async fn fetch_item(&self, section: Section, id: &str) -> Result<Option<Value>, ClientError> {
        match self.send(self.content_request(Method::GET, section, Some(id))).await {
            Ok(item) => Ok(item),
            Err(ClientError::Status(StatusCode::NOT_FOUND, _)) => Ok(None),
            Err(e) => {
                let cached = self.cached_or(&section.cache_key(), e)?;
                Ok(content::find_item(section, &cached, id).cloned())
            }
        }
    }

    // ------------------------------------------------------------------------
    // Writes
    // ------------------------------------------------------------------------

    async fn write(
        &self,
        section: Section,
        builder: RequestBuilder,
        mutation: Mutation,
    ) -> Result<SyncOutcome, ClientError> {
        match self.send(builder).await {
            Ok(data) => {
                // Keep the cached section in step with the server.
                if let Err(e) = self.fetch_section(section).await {
                    tracing::debug!(section = %section, error = %e, "cache refresh after write failed");
                }
                Ok(SyncOutcome::Remote(data))
            }
            Err(e) if e.is_unavailable() && section != Section::Maintenance => {
                tracing::warn!(
                    section = %section,
                    error = %e,
                    "server unavailable, applying change to cached copy"
                );
                self.apply_locally(section, mutation).map(SyncOutcome::Local)
            }
            Err(e) => Err(e),
        }
    }

    fn apply_locally(&self, section: Section, mutation: Mutation) -> Result<Option<Value>, ClientError> {
        let key = section.cache_key();
        let current = match self.cache.load(&key)? {
            Some(value) => value,
            None => defaults::section(section, Utc::now()),
        };
        let applied = content::apply(section, &current, mutation)?;
        if applied.affected.is_some() {
            self.cache.store(&key, &applied.value)?;
        }
        Ok(applied.affected)
    }

    /// Section-level save from the admin panel: a patch object, or the full
    /// array for `projects`.
    pub async fn update_section(&self, section: Section, body: Value) -> Result<SyncOutcome, ClientError> {
        let mutation = Mutation::patch_section(section, body.clone())?;
        let builder = self.content_request(Method::PUT, section, None).json(&body);
        self.write(section, builder, mutation).await
    }

    pub async fn create_item(&self, section: Section, item: Value) -> Result<SyncOutcome, ClientError> {
        if section.collection().is_none() {
            return Err(ContentError::NotAnArray(section).into());
        }
        let mutation = Mutation::Insert {
            item: content::into_object(item.clone())?,
            at: Utc::now(),
        };
        let builder = self.content_request(Method::POST, section, None).json(&item);
        self.write(section, builder, mutation).await
    }

    pub async fn update_item(&self, section: Section, id: &str, patch: Value) -> Result<SyncOutcome, ClientError> {
        let mutation = Mutation::MergeItem {
            id: id.to_string(),
            patch: content::into_object(patch.clone())?,
        };
        let builder = self.content_request(Method::PUT, section, Some(id)).json(&patch);
        self.write(section, builder, mutation).await
    }

    pub async fn delete_item(&self, section: Section, id: &str) -> Result<SyncOutcome, ClientError> {
        let mutation = Mutation::RemoveItem { id: id.to_string() };
        let builder = self.content_request(Method::DELETE, section, Some(id));
        self.write(section, builder, mutation).await
    }

    /// Contact submissions are never cached; a failure is returned to the caller.
    pub async fn submit_contact(&self, submission: &ContactSubmission) -> Result<(), ClientError> {
        let builder = self
            .content_request(Method::POST, Section::Contact, None)
            .json(submission);
        self.send(builder).await.map(|_| ())
    }

    // ------------------------------------------------------------------------
    // Maintenance
    // ------------------------------------------------------------------------

    /// Current record; falls back to the cached copy, then to an inactive record.
    pub async fn maintenance_status(&self) -> MaintenanceRecord {
        let key = Section::Maintenance.cache_key();
        let fetched = self
            .send(self.request(Method::GET, "/api/maintenance"))
            .await
            .and_then(|data| data.ok_or_else(|| ClientError::InvalidResponse("missing data".to_string())));

        let value = match fetched {
            Ok(value) => {
                self.remember(&key, &value);
                value
            }
            Err(e) => match self.cached_or(&key, e) {
                Ok(value) => value,
                Err(_) => return MaintenanceRecord::default(),
            },
        };

        serde_json::from_value(value).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "maintenance record unreadable, assuming inactive");
            MaintenanceRecord::default()
        })
    }

    pub async fn update_maintenance(&self, patch: &MaintenancePatch) -> Result<MaintenanceRecord, ClientError> {
        let token = self.token.as_deref().ok_or(ClientError::MissingToken)?;
        let builder = self
            .request(Method::POST, "/api/maintenance")
            .bearer_auth(token)
            .json(patch);

        let value = self
            .send(builder)
            .await?
            .ok_or_else(|| ClientError::InvalidResponse("missing data".to_string()))?;
        self.remember(&Section::Maintenance.cache_key(), &value);

        serde_json::from_value(value).map_err(|e| ClientError::InvalidResponse(e.to_string()))
    }

    /// Check the token with the server, then let this session past the gate.
    pub async fn enter_admin(&self) -> Result<(), ClientError> {
        let token = self.token.as_deref().ok_or(ClientError::MissingToken)?;
        self.send(
            self.request(Method::POST, "/api/maintenance/bypass")
                .bearer_auth(token),
        )
        .await?;
        self.gate.enable_admin_bypass();
        tracing::info!("admin bypass enabled for client session");
        Ok(())
    }

    pub async fn site_state(&self) -> SiteState {
        let record = self.maintenance_status().await;
        self.gate.state(&record, Utc::now())
    }

    pub async fn resolve_view(&self, path: &str) -> View {
        let record = self.maintenance_status().await;
        self.gate.resolve(path, &record, Utc::now())
    }

    // ------------------------------------------------------------------------
    // Preferences
    // ------------------------------------------------------------------------

    pub fn theme(&self) -> Option<String> {
        self.cache
            .load(THEME_KEY)
            .ok()
            .flatten()
            .and_then(|value| value.as_str().map(str::to_string))
    }

    pub fn set_theme(&self, theme: &str) -> Result<(), ClientError> {
        self.cache.store(THEME_KEY, &Value::String(theme.to_string()))?;
        Ok(())
    }
}
