//! HTTP client for the marketplace REST API.
//!
//! One `ApiClient` per signed-in session. Every request carries the app
//! API key; authenticated endpoints additionally carry the bearer token
//! installed by [`ApiClient::set_access_token`]. Non-2xx responses become
//! [`Error::Api`] with the server's message when it supplies one.

mod messages;
mod offers;
mod transactions;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::RwLock;

use crate::config::ClientConfig;
use crate::dispatch::NegotiationBackend;
use crate::error::{Error, Result};
use crate::models::{MeetupProposal, Offer, OfferId, TransactionId, UserProfile};
use crate::util::{compact_text, normalize_text_option};

pub use messages::OutgoingMessage;
pub use offers::CreateOffer;

/// Header carrying the app API key
pub const API_KEY_HEADER: &str = "X-API-Key";

const HTTP_TIMEOUT_SECS: u64 = 10;

/// Client for the marketplace REST API
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    api_key: Option<String>,
    access_token: Arc<RwLock<Option<String>>>,
    client: Client,
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            base_url: config.api_base_url.clone(),
            api_key: config.api_key.clone(),
            access_token: Arc::new(RwLock::new(None)),
            client,
        })
    }

    /// Install (or clear) the bearer token used for authenticated calls.
    /// Shared across clones of this client.
    pub async fn set_access_token(&self, token: Option<String>) {
        *self.access_token.write().await = normalize_text_option(token);
    }

    /// Sign in with email and password. Installs the returned token on
    /// this client.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthSession> {
        let email = email.trim();
        if email.is_empty() {
            return Err(Error::InvalidInput("email is required".to_string()));
        }
        if password.trim().is_empty() {
            return Err(Error::InvalidInput("password is required".to_string()));
        }

        let response = self
            .send(self.client.post(self.url("/auth/login")).json(&json!({
                "email": email,
                "password": password,
            })))
            .await?;

        let session = response.json::<AuthSession>().await?;
        self.set_access_token(Some(session.token.clone())).await;
        Ok(session)
    }

    /// Fetch the signed-in user's profile
    pub async fn profile(&self) -> Result<UserProfile> {
        let response = self.send(self.client.get(self.url("/auth/profile"))).await?;
        Ok(response.json::<UserProfile>().await?)
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    pub(crate) fn http(&self) -> &Client {
        &self.client
    }

    /// Attach credentials, send, and check the status. The error message
    /// of a non-2xx response is extracted from the body.
    pub(crate) async fn send(&self, builder: RequestBuilder) -> Result<Response> {
        let mut builder = builder;
        if let Some(key) = &self.api_key {
            builder = builder.header(API_KEY_HEADER, key);
        }
        let token = self.access_token.read().await.clone();
        if let Some(token) = token {
            builder = builder.bearer_auth(token);
        }

        let response = builder.send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api(parse_api_error(status, &body)));
        }
        Ok(response)
    }
}

impl NegotiationBackend for ApiClient {
    async fn accept_offer(&self, id: &OfferId) -> Result<Offer> {
        ApiClient::accept_offer(self, id).await
    }

    async fn reject_offer(&self, id: &OfferId) -> Result<Offer> {
        ApiClient::reject_offer(self, id).await
    }

    async fn update_offer(&self, id: &OfferId, new_amount: &str) -> Result<Offer> {
        ApiClient::update_offer(self, id, new_amount).await
    }

    async fn propose_meetup(&self, id: &TransactionId, proposal: &MeetupProposal) -> Result<()> {
        ApiClient::propose_meetup(self, id, proposal).await
    }

    async fn accept_meetup(&self, id: &TransactionId) -> Result<()> {
        ApiClient::accept_meetup(self, id).await
    }
}

/// Signed-in session returned by the login endpoint
#[derive(Clone, Serialize, Deserialize)]
pub struct AuthSession {
    pub token: String,
    pub user: UserProfile,
}

impl fmt::Debug for AuthSession {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("AuthSession")
            .field("token", &"[REDACTED]")
            .field("user", &self.user)
            .finish()
    }
}

/// Extract the server's error message from a non-2xx body.
///
/// Mutation endpoints report `{message}`, middleware reports `{error}`;
/// fall back to the compacted body plus status when neither parses.
pub(crate) fn parse_api_error(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<ApiErrorBody>(body) {
        if let Some(message) = payload.message.or(payload.error) {
            let message = message.trim();
            if !message.is_empty() {
                return message.to_string();
            }
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        format!("{} ({})", compact_text(trimmed), status.as_u16())
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: Option<String>,
    error: Option<String>,
}
