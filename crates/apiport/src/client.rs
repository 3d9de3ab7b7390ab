//! HTTP client for the ApiPort REST API.
//!
//! [`ApiPortClient`] owns the credentials and the token cache. Every tracker
//! call goes through [`ApiPortClient::request`], which:
//!
//! 1. obtains a token that is outside its refresh window (authenticating if needed)
//! 2. sends the request with `Authorization: Bearer <token>`
//! 3. on a 401, drops that token, re-authenticates once and retries once
//! 4. maps any other non-2xx answer to [`Error::Upstream`]

use crate::auth::{AccessToken, Credentials, TokenCache, TokenState};
use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::domain::{
    NewSprint, NewWorkItem, ProjectId, SprintId, UserId, WorkItemId, WorkItemUpdate,
    dedup_work_items,
};
use crate::error::{Error, Result, truncate_body};
use crate::tracker::Tracker;
use async_trait::async_trait;
use reqwest::{Client, Method, Response, StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Path of the token endpoint, relative to the base URL.
const TOKEN_PATH: &str = "/api/accounts/token/";

/// Prefix of every tracker endpoint, relative to the base URL.
const TRACKER_PATH: &str = "/api/tracker/";

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access: String,
}

/// Authenticated client for the ApiPort task manager.
///
/// One instance is meant to be shared (behind an `Arc`) by every caller in the
/// process; the underlying `reqwest::Client` pools connections and the token
/// cache serializes renewals.
#[derive(Debug)]
pub struct ApiPortClient {
    http: Client,
    base_url: String,
    credentials: Credentials,
    tokens: TokenCache,
}

impl ApiPortClient {
    /// Create a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if credentials are missing or the HTTP client
    /// cannot be built.
    pub fn new(config: &Config) -> Result<Self> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a client that reads time from `clock`.
    ///
    /// # Errors
    ///
    /// Same as [`ApiPortClient::new`].
    pub fn with_clock(config: &Config, clock: Arc<dyn Clock>) -> Result<Self> {
        let credentials = config.credentials()?;

        if !config.verify_ssl {
            warn!("TLS certificate verification is disabled");
        }

        let http = Client::builder()
            .timeout(config.request_timeout())
            .danger_accept_invalid_certs(!config.verify_ssl)
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.base_url().to_string(),
            credentials,
            tokens: TokenCache::new(config.token_policy(), clock),
        })
    }

    /// Base URL requests are sent to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Validity of the cached token right now.
    pub async fn token_state(&self) -> TokenState {
        self.tokens.state().await
    }

    /// Exchange the credentials for a new access token and cache it,
    /// replacing any cached token.
    ///
    /// # Errors
    ///
    /// Returns `Error::Authentication` if the credentials are rejected or the
    /// token payload is malformed, `Error::Transport` on network failure.
    pub async fn authenticate(&self) -> Result<AccessToken> {
        self.tokens.refresh(|| self.fetch_token()).await
    }

    /// Return a token that is safe to send, authenticating first when none is
    /// cached or the cached one is inside its refresh window.
    ///
    /// # Errors
    ///
    /// Same as [`ApiPortClient::authenticate`].
    pub async fn ensure_token(&self) -> Result<AccessToken> {
        self.tokens.get_or_refresh(|| self.fetch_token()).await
    }

    async fn fetch_token(&self) -> Result<String> {
        let url = format!("{}{TOKEN_PATH}", self.base_url);
        debug!(email = %self.credentials.email(), "Requesting access token");

        let response = self
            .http
            .post(&url)
            .json(&json!({
                "email": self.credentials.email(),
                "password": self.credentials.password(),
            }))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(Error::Authentication(format!(
                "token endpoint returned HTTP {}: {}",
                status.as_u16(),
                truncate_body(&body)
            )));
        }

        let payload: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| Error::Authentication(format!("malformed token response: {e}")))?;
        if payload.access.trim().is_empty() {
            return Err(Error::Authentication(
                "token response contained an empty access token".to_string(),
            ));
        }

        info!(email = %self.credentials.email(), "Obtained new access token");
        Ok(payload.access)
    }

    /// Send an authenticated request to a tracker endpoint and decode the JSON body.
    ///
    /// `endpoint` is relative to `/api/tracker/`, e.g. `projects/3/sprints/`.
    /// An empty 2xx body decodes as `Value::Null`.
    ///
    /// # Errors
    ///
    /// - `Error::Authentication` if a token cannot be obtained, or the request is
    ///   still rejected with 401 after one re-authentication
    /// - `Error::Upstream` for any other non-2xx status
    /// - `Error::Transport` for network failures and timeouts
    /// - `Error::InvalidResponse` if a 2xx body is not JSON
    pub async fn request(&self, method: Method, endpoint: &str, body: Option<&Value>) -> Result<Value> {
        let url = format!("{}{TRACKER_PATH}{endpoint}", self.base_url);
        let token = self.ensure_token().await?;

        debug!(%method, %url, "Sending request");
        let mut response = self.send(&method, &url, body, &token).await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            warn!(%method, %url, "Access token rejected, re-authenticating");
            self.tokens.invalidate(&token).await;

            let fresh = self.ensure_token().await?;
            response = self.send(&method, &url, body, &fresh).await?;

            if response.status() == StatusCode::UNAUTHORIZED {
                self.tokens.invalidate(&fresh).await;
                let detail = response.text().await.unwrap_or_default();
                return Err(Error::Authentication(format!(
                    "{method} {endpoint} rejected after re-authentication: {}",
                    truncate_body(&detail)
                )));
            }
        }

        Self::read_json(response).await
    }

    async fn send(
        &self,
        method: &Method,
        url: &str,
        body: Option<&Value>,
        token: &AccessToken,
    ) -> Result<Response> {
        let mut builder = self
            .http
            .request(method.clone(), url)
            .bearer_auth(token.secret());
        if let Some(body) = body {
            builder = builder.json(body);
        }
        Ok(builder.send().await?)
    }

    async fn read_json(response: Response) -> Result<Value> {
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            debug!(status = status.as_u16(), "Request failed");
            return Err(Error::upstream(status.as_u16(), &text));
        }
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text)
            .map_err(|e| Error::InvalidResponse(format!("expected a JSON body: {e}")))
    }

    async fn get(&self, endpoint: &str) -> Result<Value> {
        self.request(Method::GET, endpoint, None).await
    }

    async fn post(&self, endpoint: &str, body: Option<&Value>) -> Result<Value> {
        self.request(Method::POST, endpoint, body).await
    }
}

/// Take the object stored under `key`.
fn unwrap_object(mut data: Value, key: &str) -> Result<Value> {
    match data.get_mut(key).map(Value::take) {
        Some(Value::Object(object)) => Ok(Value::Object(object)),
        _ => Err(Error::InvalidResponse(format!(
            "expected an object under '{key}'"
        ))),
    }
}

/// Take the array stored under `key`. A missing key means no entries.
fn unwrap_list(mut data: Value, key: &str) -> Result<Vec<Value>> {
    match data.get_mut(key).map(Value::take) {
        Some(Value::Array(items)) => Ok(items),
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(_) => Err(Error::InvalidResponse(format!(
            "expected an array under '{key}'"
        ))),
    }
}

#[async_trait]
impl Tracker for ApiPortClient {
    async fn list_projects(&self) -> Result<Vec<Value>> {
        unwrap_list(self.get("projects/").await?, "projects")
    }

    async fn get_project(&self, id: ProjectId) -> Result<Value> {
        unwrap_object(self.get(&format!("projects/{id}/")).await?, "project")
    }

    async fn list_sprints(&self, project: ProjectId) -> Result<Vec<Value>> {
        unwrap_list(
            self.get(&format!("projects/{project}/sprints/")).await?,
            "sprints",
        )
    }

    async fn get_sprint(&self, id: SprintId) -> Result<Value> {
        unwrap_object(self.get(&format!("sprints/{id}/")).await?, "sprint")
    }

    async fn create_sprint(&self, project: ProjectId, sprint: &NewSprint) -> Result<Value> {
        let payload = sprint.payload()?;
        let data = self
            .post(&format!("projects/{project}/sprints/"), Some(&payload))
            .await?;
        unwrap_object(data, "sprint")
    }

    async fn activate_sprint(&self, id: SprintId) -> Result<Value> {
        unwrap_object(self.post(&format!("sprints/{id}/activate/"), None).await?, "sprint")
    }

    async fn close_sprint(&self, id: SprintId) -> Result<Value> {
        unwrap_object(self.post(&format!("sprints/{id}/close/"), None).await?, "sprint")
    }

    async fn list_work_items(&self, project: ProjectId) -> Result<Vec<Value>> {
        unwrap_list(
            self.get(&format!("projects/{project}/work-items/")).await?,
            "work_items",
        )
    }

    async fn get_work_item(&self, id: WorkItemId) -> Result<Value> {
        unwrap_object(self.get(&format!("work-items/{id}/")).await?, "work_item")
    }

    async fn create_work_item(&self, project: ProjectId, item: &NewWorkItem) -> Result<Value> {
        let payload = item.payload()?;
        let data = self
            .post(&format!("projects/{project}/work-items/"), Some(&payload))
            .await?;
        unwrap_object(data, "work_item")
    }

    async fn update_work_item(&self, id: WorkItemId, update: &WorkItemUpdate) -> Result<Value> {
        update.validate()?;
        let payload = update.payload()?;
        let data = self
            .request(Method::PATCH, &format!("work-items/{id}/"), Some(&payload))
            .await?;
        unwrap_object(data, "work_item")
    }

    async fn get_backlog(&self, project: ProjectId) -> Result<Vec<Value>> {
        unwrap_list(
            self.get(&format!("projects/{project}/backlog/")).await?,
            "work_items",
        )
    }

    async fn bulk_assign_to_sprint(&self, sprint: SprintId, items: &[WorkItemId]) -> Result<Value> {
        let items = dedup_work_items(items)?;
        let payload = json!({ "work_item_ids": items });
        self.post(&format!("sprints/{sprint}/bulk-assign/"), Some(&payload))
            .await
    }

    async fn add_sprint_member(&self, sprint: SprintId, user: UserId) -> Result<Value> {
        let payload = json!({ "user_id": user });
        self.post(&format!("sprints/{sprint}/members/"), Some(&payload))
            .await
    }

    async fn remove_sprint_member(&self, sprint: SprintId, member_id: u64) -> Result<Value> {
        self.request(
            Method::DELETE,
            &format!("sprints/{sprint}/members/{member_id}/"),
            None,
        )
        .await
    }
}
