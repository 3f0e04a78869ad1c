//! HTTP client for the hosted identity + storage service.
//!
//! Identity operations go to the `auth/v1` endpoints, row CRUD to the
//! `rest/v1` endpoints. Every request carries the public API key; once a
//! session exists its access token replaces the key as the bearer
//! credential, which is what activates the service's row-level ownership
//! filters.

use async_trait::async_trait;
use jot_core::backend::{
    AuthService, Backend, OAuthProvider, RowFilter, SelectQuery, TableService,
};
use jot_core::config::BackendConfig;
use jot_core::error::{JotError, Result};
use jot_core::session::{AuthUser, SessionChange};
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use url::Url;
use uuid::Uuid;

const AUTH_PATH: &str = "auth/v1";
const REST_PATH: &str = "rest/v1";
const CHANGE_CHANNEL_CAPACITY: usize = 16;

/// A session as issued by the identity endpoints.
#[derive(Debug, Clone)]
struct StoredSession {
    access_token: String,
    refresh_token: String,
}

/// Client for the hosted service, implementing both backend traits.
///
/// Constructed from a validated [`BackendConfig`]; there is no global
/// instance anywhere. Callers hold it behind `Arc` and pass it down.
#[derive(Debug)]
pub struct HttpBackend {
    http: Client,
    base_url: Url,
    anon_key: String,
    session: RwLock<Option<StoredSession>>,
    changes: broadcast::Sender<SessionChange>,
}

impl HttpBackend {
    /// Creates a client from connection parameters.
    ///
    /// # Errors
    ///
    /// [`JotError::Config`] when the endpoint URL does not parse. The
    /// required-parameter checks already happened in
    /// [`BackendConfig::new`].
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let mut base_url = Url::parse(&config.url)
            .map_err(|err| JotError::config(format!("invalid backend URL: {err}")))?;
        // Normalize so `join` keeps the full base path.
        if !base_url.path().ends_with('/') {
            base_url.set_path(&format!("{}/", base_url.path()));
        }

        Ok(Self {
            http: Client::new(),
            base_url,
            anon_key: config.anon_key.clone(),
            session: RwLock::new(None),
            changes: broadcast::channel(CHANGE_CHANNEL_CAPACITY).0,
        })
    }

    /// Creates the client and wraps it into a [`Backend`] handle.
    pub fn connect(config: &BackendConfig) -> Result<Backend> {
        let client = Arc::new(Self::new(config)?);
        Ok(Backend::new(client.clone(), client))
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|err| JotError::internal(format!("endpoint construction failed: {err}")))
    }

    fn auth_endpoint(&self, name: &str) -> Result<Url> {
        self.endpoint(&format!("{AUTH_PATH}/{name}"))
    }

    /// Builds the `rest/v1` URL for a table call, encoding filters,
    /// ordering and limit as query parameters.
    fn table_url(&self, table: &str, query: &SelectQuery) -> Result<Url> {
        let mut url = self.endpoint(&format!("{REST_PATH}/{table}"))?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("select", "*");
            for (column, value) in &query.filter.eq {
                pairs.append_pair(column, &format!("eq.{value}"));
            }
            if let Some(order) = &query.order {
                let direction = if order.descending { "desc" } else { "asc" };
                pairs.append_pair("order", &format!("{}.{}", order.column, direction));
            }
            if let Some(limit) = query.limit {
                pairs.append_pair("limit", &limit.to_string());
            }
        }
        Ok(url)
    }

    async fn bearer_token(&self) -> String {
        match self.session.read().await.as_ref() {
            Some(session) => session.access_token.clone(),
            None => self.anon_key.clone(),
        }
    }

    async fn store_session(&self, token: TokenResponse, change: fn(AuthUser) -> SessionChange) {
        let user = token.user.into_auth_user();
        *self.session.write().await = Some(StoredSession {
            access_token: token.access_token,
            refresh_token: token.refresh_token,
        });
        let _ = self.changes.send(change(user));
    }

    async fn clear_session(&self) {
        if self.session.write().await.take().is_some() {
            let _ = self.changes.send(SessionChange::SignedOut);
        }
    }

    /// Normalizes a non-success response into a data-access error,
    /// pulling the human-readable message out of the service's error
    /// body when it has one.
    async fn check(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(JotError::data_access(format!(
            "{status}: {}",
            parse_error_message(&body)
        )))
    }
}

#[async_trait]
impl AuthService for HttpBackend {
    async fn current_session(&self) -> Result<Option<AuthUser>> {
        let token = match self.session.read().await.as_ref() {
            Some(session) => session.access_token.clone(),
            None => return Ok(None),
        };

        let response = self
            .http
            .get(self.auth_endpoint("user")?)
            .header("apikey", &self.anon_key)
            .bearer_auth(&token)
            .send()
            .await
            .map_err(|err| JotError::data_access(format!("session lookup failed: {err}")))?;

        if response.status() == StatusCode::UNAUTHORIZED {
            // Stored token is no longer valid; the session is gone.
            self.clear_session().await;
            return Ok(None);
        }

        let user: UserDto = Self::check(response).await?.json().await.map_err(|err| {
            JotError::serialization(format!("malformed user payload: {err}"))
        })?;
        Ok(Some(user.into_auth_user()))
    }

    async fn sign_in_oauth(&self, provider: OAuthProvider, redirect_url: &str) -> Result<String> {
        let mut url = self.auth_endpoint("authorize")?;
        url.query_pairs_mut()
            .append_pair("provider", &provider.to_string())
            .append_pair("redirect_to", redirect_url);
        Ok(url.into())
    }

    async fn exchange_code(&self, code: &str) -> Result<AuthUser> {
        let mut url = self.auth_endpoint("token")?;
        url.query_pairs_mut().append_pair("grant_type", "pkce");

        let response = self
            .http
            .post(url)
            .header("apikey", &self.anon_key)
            .json(&serde_json::json!({ "auth_code": code }))
            .send()
            .await
            .map_err(|err| JotError::data_access(format!("code exchange failed: {err}")))?;

        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(JotError::provider(format!(
                "authorization code rejected: {}",
                parse_error_message(&body)
            )));
        }

        let token: TokenResponse = response.json().await.map_err(|err| {
            JotError::serialization(format!("malformed token payload: {err}"))
        })?;
        let user = token.user.clone().into_auth_user();
        self.store_session(token, |user| SessionChange::SignedIn { user })
            .await;
        Ok(user)
    }

    async fn sign_in_password(&self, email: &str, password: &str) -> Result<AuthUser> {
        let mut url = self.auth_endpoint("token")?;
        url.query_pairs_mut().append_pair("grant_type", "password");

        let response = self
            .http
            .post(url)
            .header("apikey", &self.anon_key)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(|err| JotError::data_access(format!("sign-in request failed: {err}")))?;

        let status = response.status();
        if status == StatusCode::BAD_REQUEST || status == StatusCode::UNAUTHORIZED {
            return Err(JotError::invalid_credentials());
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(JotError::provider(parse_error_message(&body)));
        }

        let token: TokenResponse = response.json().await.map_err(|err| {
            JotError::serialization(format!("malformed token payload: {err}"))
        })?;
        let user = token.user.clone().into_auth_user();
        self.store_session(token, |user| SessionChange::SignedIn { user })
            .await;
        Ok(user)
    }

    async fn sign_up_password(
        &self,
        email: &str,
        password: &str,
        redirect_url: &str,
    ) -> Result<AuthUser> {
        let mut url = self.auth_endpoint("signup")?;
        url.query_pairs_mut().append_pair("redirect_to", redirect_url);

        let response = self
            .http
            .post(url)
            .header("apikey", &self.anon_key)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(|err| JotError::data_access(format!("sign-up request failed: {err}")))?;

        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(JotError::provider(parse_error_message(&body)));
        }

        // With auto-confirm the service answers with a full session;
        // otherwise only with the pending user.
        let payload: SignUpResponse = response.json().await.map_err(|err| {
            JotError::serialization(format!("malformed sign-up payload: {err}"))
        })?;
        match payload {
            SignUpResponse::Session(token) => {
                let user = token.user.clone().into_auth_user();
                self.store_session(token, |user| SessionChange::SignedIn { user })
                    .await;
                Ok(user)
            }
            SignUpResponse::PendingUser(user) => Ok(user.into_auth_user()),
        }
    }

    async fn sign_out(&self) -> Result<()> {
        let token = self.session.read().await.as_ref().map(|s| s.access_token.clone());
        if let Some(token) = token {
            let result = self
                .http
                .post(self.auth_endpoint("logout")?)
                .header("apikey", &self.anon_key)
                .bearer_auth(token)
                .send()
                .await;
            if let Err(err) = result {
                // The local session ends regardless; the server-side
                // token will expire on its own.
                tracing::warn!(%err, "sign-out request failed");
            }
        }
        self.clear_session().await;
        Ok(())
    }

    async fn refresh_session(&self) -> Result<Option<AuthUser>> {
        let refresh_token = match self.session.read().await.as_ref() {
            Some(session) => session.refresh_token.clone(),
            None => return Ok(None),
        };

        let mut url = self.auth_endpoint("token")?;
        url.query_pairs_mut().append_pair("grant_type", "refresh_token");

        let response = self
            .http
            .post(url)
            .header("apikey", &self.anon_key)
            .json(&serde_json::json!({ "refresh_token": refresh_token }))
            .send()
            .await
            .map_err(|err| JotError::data_access(format!("refresh request failed: {err}")))?;

        if !response.status().is_success() {
            // Refresh token rejected: the session is over.
            self.clear_session().await;
            return Ok(None);
        }

        let token: TokenResponse = response.json().await.map_err(|err| {
            JotError::serialization(format!("malformed token payload: {err}"))
        })?;
        let user = token.user.clone().into_auth_user();
        self.store_session(token, |user| SessionChange::TokenRefreshed { user })
            .await;
        Ok(Some(user))
    }

    fn subscribe(&self) -> broadcast::Receiver<SessionChange> {
        self.changes.subscribe()
    }
}

#[async_trait]
impl TableService for HttpBackend {
    async fn select(&self, table: &str, query: SelectQuery) -> Result<Vec<Value>> {
        let response = self
            .http
            .get(self.table_url(table, &query)?)
            .header("apikey", &self.anon_key)
            .bearer_auth(self.bearer_token().await)
            .send()
            .await
            .map_err(|err| JotError::data_access(format!("select on {table} failed: {err}")))?;

        Self::check(response)
            .await?
            .json()
            .await
            .map_err(|err| JotError::serialization(format!("malformed rows from {table}: {err}")))
    }

    async fn insert(&self, table: &str, row: Value) -> Result<Value> {
        let url = self.table_url(table, &SelectQuery::new())?;
        let response = self
            .http
            .post(url)
            .header("apikey", &self.anon_key)
            .header("Prefer", "return=representation")
            .bearer_auth(self.bearer_token().await)
            .json(&row)
            .send()
            .await
            .map_err(|err| JotError::data_access(format!("insert into {table} failed: {err}")))?;

        let rows: Vec<Value> = Self::check(response)
            .await?
            .json()
            .await
            .map_err(|err| JotError::serialization(format!("malformed row from {table}: {err}")))?;
        rows.into_iter()
            .next()
            .ok_or_else(|| JotError::data_access(format!("insert into {table} returned no row")))
    }

    async fn update(&self, table: &str, filter: RowFilter, patch: Value) -> Result<Vec<Value>> {
        let query = SelectQuery {
            filter,
            ..SelectQuery::new()
        };
        let response = self
            .http
            .patch(self.table_url(table, &query)?)
            .header("apikey", &self.anon_key)
            .header("Prefer", "return=representation")
            .bearer_auth(self.bearer_token().await)
            .json(&patch)
            .send()
            .await
            .map_err(|err| JotError::data_access(format!("update on {table} failed: {err}")))?;

        Self::check(response)
            .await?
            .json()
            .await
            .map_err(|err| JotError::serialization(format!("malformed rows from {table}: {err}")))
    }

    async fn delete(&self, table: &str, filter: RowFilter) -> Result<()> {
        let query = SelectQuery {
            filter,
            ..SelectQuery::new()
        };
        let response = self
            .http
            .delete(self.table_url(table, &query)?)
            .header("apikey", &self.anon_key)
            .bearer_auth(self.bearer_token().await)
            .send()
            .await
            .map_err(|err| JotError::data_access(format!("delete on {table} failed: {err}")))?;

        Self::check(response).await.map(|_| ())
    }
}

#[derive(Debug, Clone, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    user: UserDto,
}

#[derive(Debug, Clone, Deserialize)]
struct UserDto {
    id: Uuid,
    email: Option<String>,
}

impl UserDto {
    fn into_auth_user(self) -> AuthUser {
        AuthUser {
            id: self.id,
            email: self.email.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SignUpResponse {
    Session(TokenResponse),
    PendingUser(UserDto),
}

/// The identity endpoints wrap messages as `error_description`/`msg`,
/// the storage endpoints as `message`. Fall back to the raw body.
fn parse_error_message(body: &str) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        error_description: Option<String>,
        msg: Option<String>,
        message: Option<String>,
    }

    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|parsed| parsed.error_description.or(parsed.msg).or(parsed.message))
        .unwrap_or_else(|| body.to_string())
}
