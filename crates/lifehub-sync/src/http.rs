//! # HTTP Service Clients
//!
//! reqwest-backed implementations of [`AuthApi`] and [`DataApi`].
//!
//! ## Wire Contract
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       REST Endpoints                                    │
//! │                                                                         │
//! │  Auth service                                                          │
//! │  ────────────                                                          │
//! │  POST /auth/sign_in    {identifier, secret}     → SignInResponse       │
//! │  POST /auth/register   {identifier, secret, …}  → RegisterResponse     │
//! │  POST /auth/refresh    Bearer token             → RefreshResponse      │
//! │  POST /auth/sign_out   Bearer token             → 204                  │
//! │  GET  /auth/session    Bearer cookie            → SessionRecord | 204  │
//! │                                                                         │
//! │  Data service (per domain)                                             │
//! │  ─────────────────────────                                             │
//! │  GET  /api/{domain}?user_id=…                   → [DomainRecord]       │
//! │  POST /api/{domain}    {user_id, record}        → 201 | 409 | error    │
//! │                                                                         │
//! │  STATUS MAPPING:                                                       │
//! │  401 → InvalidCredentials      409 (register) → DuplicateIdentifier    │
//! │  403 → EmailUnconfirmed        409 (push)     → Duplicate (success)    │
//! │  timeout → NetworkTimeout      other          → RemoteRejected/Network │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use lifehub_core::{Domain, DomainRecord, SessionRecord};

use crate::api::{
    AuthApi, AuthEvent, DataApi, PushAck, RefreshResponse, RegisterResponse, SignInResponse,
};
use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};

/// Capacity of the auth event channel. Events are small and consumers are
/// fast; lagging receivers simply skip ahead.
const AUTH_EVENT_CAPACITY: usize = 16;

/// Fallback client-wide timeout for auth calls that have no dedicated
/// budget in the config (sign-in, register, sign-out).
const AUTH_REQUEST_TIMEOUT_SECS: u64 = 10;

fn map_transport(err: reqwest::Error, budget_secs: u64) -> SyncError {
    if err.is_timeout() {
        SyncError::NetworkTimeout(budget_secs)
    } else {
        SyncError::Network(err.to_string())
    }
}

fn build_client() -> SyncResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(AUTH_REQUEST_TIMEOUT_SECS))
        .build()
        .map_err(|e| SyncError::Network(e.to_string()))
}

// =============================================================================
// Auth Client
// =============================================================================

#[derive(Serialize)]
struct CredentialsBody<'a> {
    identifier: &'a str,
    secret: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    display_name: Option<&'a str>,
}

/// HTTP implementation of the auth service contract.
///
/// Emits [`AuthEvent`]s for its own transitions; a deployment with real
/// server push would emit the same events from its push channel.
pub struct HttpAuthClient {
    base_url: String,
    client: reqwest::Client,
    session_check_budget: Duration,
    events: broadcast::Sender<AuthEvent>,
}

impl HttpAuthClient {
    /// Creates a client from the configured endpoints and budgets.
    pub fn new(config: &SyncConfig) -> SyncResult<Self> {
        let (events, _) = broadcast::channel(AUTH_EVENT_CAPACITY);
        Ok(HttpAuthClient {
            base_url: config.endpoints.auth_url.trim_end_matches('/').to_string(),
            client: build_client()?,
            session_check_budget: config.timeouts.session_check(),
            events,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn emit(&self, event: AuthEvent) {
        // No receivers is fine: nobody has subscribed yet.
        let _ = self.events.send(event);
    }
}

#[async_trait]
impl AuthApi for HttpAuthClient {
    async fn sign_in(&self, identifier: &str, secret: &str) -> SyncResult<SignInResponse> {
        let response = self
            .client
            .post(self.url("/auth/sign_in"))
            .json(&CredentialsBody {
                identifier,
                secret,
                display_name: None,
            })
            .send()
            .await
            .map_err(|e| map_transport(e, AUTH_REQUEST_TIMEOUT_SECS))?;

        match response.status() {
            StatusCode::UNAUTHORIZED => Err(SyncError::InvalidCredentials),
            StatusCode::FORBIDDEN => Err(SyncError::EmailUnconfirmed),
            status if status.is_success() => {
                let body: SignInResponse = response
                    .json()
                    .await
                    .map_err(|e| SyncError::Network(e.to_string()))?;
                self.emit(AuthEvent::SignedIn {
                    user_id: body.user_id.clone(),
                });
                Ok(body)
            }
            status => Err(SyncError::Network(format!(
                "sign_in returned {}",
                status
            ))),
        }
    }

    async fn register(
        &self,
        identifier: &str,
        secret: &str,
        display_name: Option<&str>,
    ) -> SyncResult<RegisterResponse> {
        let response = self
            .client
            .post(self.url("/auth/register"))
            .json(&CredentialsBody {
                identifier,
                secret,
                display_name,
            })
            .send()
            .await
            .map_err(|e| map_transport(e, AUTH_REQUEST_TIMEOUT_SECS))?;

        match response.status() {
            StatusCode::CONFLICT => Err(SyncError::DuplicateIdentifier),
            status if status.is_success() => response
                .json()
                .await
                .map_err(|e| SyncError::Network(e.to_string())),
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(SyncError::RegistrationFailed(format!(
                    "{}: {}",
                    status, body
                )))
            }
        }
    }

    async fn refresh(&self, access_token: &str) -> SyncResult<RefreshResponse> {
        let response = self
            .client
            .post(self.url("/auth/refresh"))
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| map_transport(e, AUTH_REQUEST_TIMEOUT_SECS))?;

        match response.status() {
            StatusCode::UNAUTHORIZED => Err(SyncError::InvalidCredentials),
            status if status.is_success() => {
                let body: RefreshResponse = response
                    .json()
                    .await
                    .map_err(|e| SyncError::Network(e.to_string()))?;
                self.emit(AuthEvent::TokenRefreshed);
                Ok(body)
            }
            status => Err(SyncError::Network(format!("refresh returned {}", status))),
        }
    }

    async fn current_session(&self) -> SyncResult<Option<SessionRecord>> {
        let budget = self.session_check_budget;
        let response = self
            .client
            .get(self.url("/auth/session"))
            .timeout(budget)
            .send()
            .await
            .map_err(|e| map_transport(e, budget.as_secs()))?;

        match response.status() {
            StatusCode::NO_CONTENT | StatusCode::UNAUTHORIZED => Ok(None),
            status if status.is_success() => {
                let record: SessionRecord = response
                    .json()
                    .await
                    .map_err(|e| SyncError::Network(e.to_string()))?;
                Ok(Some(record))
            }
            status => Err(SyncError::Network(format!("session returned {}", status))),
        }
    }

    async fn sign_out(&self, access_token: &str) -> SyncResult<()> {
        let response = self
            .client
            .post(self.url("/auth/sign_out"))
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| map_transport(e, AUTH_REQUEST_TIMEOUT_SECS))?;

        if !response.status().is_success() {
            warn!(status = %response.status(), "Remote sign-out returned non-success");
        }
        self.emit(AuthEvent::SignedOut);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }
}

// =============================================================================
// Data Client
// =============================================================================

#[derive(Serialize)]
struct CreateRecordBody<'a> {
    user_id: &'a str,
    record: &'a DomainRecord,
}

/// HTTP implementation of the per-domain remote data service.
pub struct HttpDataClient {
    base_url: String,
    client: reqwest::Client,
    fetch_budget: Duration,
    push_budget: Duration,
}

impl HttpDataClient {
    /// Creates a client from the configured endpoints and budgets.
    pub fn new(config: &SyncConfig) -> SyncResult<Self> {
        Ok(HttpDataClient {
            base_url: config.endpoints.data_url.trim_end_matches('/').to_string(),
            client: build_client()?,
            fetch_budget: config.timeouts.domain_fetch(),
            push_budget: config.timeouts.push_request(),
        })
    }

    fn domain_url(&self, domain: Domain) -> String {
        format!("{}/api/{}", self.base_url, domain.as_str())
    }
}

#[async_trait]
impl DataApi for HttpDataClient {
    async fn list_domain(&self, user_id: &str, domain: Domain) -> SyncResult<Vec<DomainRecord>> {
        let response = self
            .client
            .get(self.domain_url(domain))
            .query(&[("user_id", user_id)])
            .timeout(self.fetch_budget)
            .send()
            .await
            .map_err(|e| map_transport(e, self.fetch_budget.as_secs()))?;

        if !response.status().is_success() {
            return Err(SyncError::Network(format!(
                "list {} returned {}",
                domain,
                response.status()
            )));
        }

        let records: Vec<DomainRecord> = response
            .json()
            .await
            .map_err(|e| SyncError::Network(e.to_string()))?;

        debug!(%domain, count = records.len(), "Fetched domain");
        Ok(records)
    }

    async fn create_record(
        &self,
        user_id: &str,
        domain: Domain,
        record: &DomainRecord,
    ) -> SyncResult<PushAck> {
        let response = self
            .client
            .post(self.domain_url(domain))
            .json(&CreateRecordBody { user_id, record })
            .timeout(self.push_budget)
            .send()
            .await
            .map_err(|e| map_transport(e, self.push_budget.as_secs()))?;

        match response.status() {
            StatusCode::CONFLICT => Ok(PushAck::Duplicate),
            status if status.is_success() => Ok(PushAck::Created),
            status => Err(SyncError::RemoteRejected {
                id: record.id.clone(),
                reason: status.to_string(),
            }),
        }
    }
}
