//! bol.com authentication module.
//!
//! Exchanges the retailer's client id/secret for a bearer token using the
//! OAuth2 client-credentials grant, and caches that token until shortly
//! before it expires.
//!
//! Concurrent callers that find no valid token share one refresh: the first
//! caller stores a shared future in the cache and everyone else awaits a
//! clone of it, so the login endpoint sees exactly one request per episode.

use std::sync::Arc;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, TimeDelta, Utc};
use futures::FutureExt as _;
use futures::future::{BoxFuture, Shared};
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::AuthError;
use super::transport::{HttpRequest, HttpTransport};
use crate::clock::Clock;

/// Milliseconds shaved off the upstream-reported token lifetime.
const EXPIRY_MARGIN_MS: i64 = 5_000;

/// OAuth2 client credentials issued by bol.com.
///
/// Implements `Debug` manually to redact the secret.
#[derive(Clone)]
pub struct ClientCredentials {
    /// Client ID (public).
    pub client_id: String,
    /// Client secret.
    pub client_secret: SecretString,
}

impl ClientCredentials {
    /// Create credentials from an id and secret.
    #[must_use]
    pub fn new(client_id: impl Into<String>, client_secret: SecretString) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret,
        }
    }

    /// `Authorization: Basic base64(id:secret)` header value.
    fn basic_authorization(&self) -> Result<HeaderValue, AuthError> {
        let encoded = STANDARD.encode(format!(
            "{}:{}",
            self.client_id,
            self.client_secret.expose_secret()
        ));
        let mut value = HeaderValue::from_str(&format!("Basic {encoded}"))
            .map_err(|e| AuthError::Malformed(format!("invalid client credentials: {e}")))?;
        value.set_sensitive(true);
        Ok(value)
    }
}

impl std::fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .finish()
    }
}

/// Access token obtained from the bol.com login endpoint.
#[derive(Clone)]
pub struct BearerToken {
    access_token: SecretString,
    authorization: HeaderValue,
    expires_at: DateTime<Utc>,
}

impl BearerToken {
    /// Wrap an access token that stops being valid at `expires_at`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Malformed` if the token cannot be sent as a header.
    pub fn new(access_token: impl Into<String>, expires_at: DateTime<Utc>) -> Result<Self, AuthError> {
        let access_token = access_token.into();
        let mut authorization = HeaderValue::from_str(&format!("Bearer {access_token}"))
            .map_err(|_| AuthError::Malformed("access_token is not a valid header value".to_string()))?;
        authorization.set_sensitive(true);

        Ok(Self {
            access_token: SecretString::from(access_token),
            authorization,
            expires_at,
        })
    }

    /// The raw access token.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.access_token.expose_secret()
    }

    /// `Authorization: Bearer <token>` header value.
    #[must_use]
    pub fn authorization(&self) -> HeaderValue {
        self.authorization.clone()
    }

    /// Instant after which the token must not be used.
    #[must_use]
    pub const fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// A token is valid strictly before its expiry instant.
    #[must_use]
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }

    fn same_as(&self, other: &Self) -> bool {
        self.expires_at == other.expires_at && self.expose() == other.expose()
    }
}

impl std::fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BearerToken")
            .field("access_token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Response from the token endpoint.
#[derive(Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
    /// Token lifetime in seconds.
    #[serde(default)]
    expires_in: Option<i64>,
}

type RefreshFuture = Shared<BoxFuture<'static, Result<BearerToken, AuthError>>>;

#[derive(Default)]
struct CacheState {
    token: Option<BearerToken>,
    /// The refresh in progress, if any. Cleared by the refresh itself.
    refresh: Option<RefreshFuture>,
}

/// In-memory bearer token cache with single-flight refresh.
///
/// Cheap to clone; clones share the same cached token.
#[derive(Clone)]
pub struct TokenCache {
    inner: Arc<TokenCacheInner>,
}

struct TokenCacheInner {
    transport: Arc<dyn HttpTransport>,
    clock: Arc<dyn Clock>,
    credentials: ClientCredentials,
    token_url: Url,
    state: Mutex<CacheState>,
}

impl TokenCache {
    /// Create an empty cache that authenticates against `login_url`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEndpoint` if `login_url` cannot carry a path.
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        clock: Arc<dyn Clock>,
        credentials: ClientCredentials,
        login_url: &Url,
    ) -> Result<Self, AuthError> {
        let token_url = token_endpoint(login_url)?;

        Ok(Self {
            inner: Arc::new(TokenCacheInner {
                transport,
                clock,
                credentials,
                token_url,
                state: Mutex::new(CacheState::default()),
            }),
        })
    }

    /// Return a valid bearer token, refreshing it if necessary.
    ///
    /// # Errors
    ///
    /// Returns `AuthError` if the refresh this call waited on failed. Every
    /// caller that waited on the same refresh receives the same error.
    pub async fn valid_token(&self) -> Result<BearerToken, AuthError> {
        let refresh = {
            let mut state = self.inner.state.lock().await;
            let now = self.inner.clock.now();

            if let Some(token) = state.token.as_ref().filter(|token| token.is_valid_at(now)) {
                return Ok(token.clone());
            }

            if let Some(in_flight) = state.refresh.clone() {
                debug!("Joining in-flight token refresh");
                in_flight
            } else {
                let inner = Arc::clone(&self.inner);
                let refresh = async move { inner.refresh().await }.boxed().shared();
                state.refresh = Some(refresh.clone());
                // Drive the refresh to completion even if every caller goes away.
                tokio::spawn(refresh.clone());
                refresh
            }
        };

        refresh.await
    }

    /// Check if a valid token is cached, without refreshing.
    pub async fn has_valid_token(&self) -> bool {
        let now = self.inner.clock.now();
        self.inner
            .state
            .lock()
            .await
            .token
            .as_ref()
            .is_some_and(|token| token.is_valid_at(now))
    }

    /// Drop the cached token if it is still `token`.
    ///
    /// Called when upstream rejects a token before its computed expiry; the
    /// next [`valid_token`](Self::valid_token) call refreshes.
    pub async fn invalidate(&self, token: &BearerToken) {
        let mut state = self.inner.state.lock().await;
        if state
            .token
            .as_ref()
            .is_some_and(|cached| cached.same_as(token))
        {
            state.token = None;
            debug!("Dropped rejected access token");
        }
    }
}

impl TokenCacheInner {
    async fn refresh(self: Arc<Self>) -> Result<BearerToken, AuthError> {
        let result = self.request_token().await;

        let mut state = self.state.lock().await;
        state.refresh = None;
        match &result {
            Ok(token) => {
                info!(expires_at = %token.expires_at(), "Obtained bol.com access token");
                state.token = Some(token.clone());
            }
            Err(e) => warn!(error = %e, "bol.com token refresh failed"),
        }

        result
    }

    #[instrument(skip(self), fields(client_id = %self.credentials.client_id))]
    async fn request_token(&self) -> Result<BearerToken, AuthError> {
        let requested_at = self.clock.now();

        let request = HttpRequest::post(self.token_url.clone())
            .header(AUTHORIZATION, self.credentials.basic_authorization()?)
            .header(
                CONTENT_TYPE,
                HeaderValue::from_static("application/x-www-form-urlencoded"),
            )
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .body(String::new());

        let response = self.transport.send(request).await?;

        if !response.is_success() {
            return Err(AuthError::Rejected {
                status: response.status.as_u16(),
                body: response.body,
            });
        }

        let payload: TokenResponse = response
            .json()
            .map_err(|e| AuthError::Malformed(e.to_string()))?;

        let access_token = payload
            .access_token
            .filter(|token| !token.is_empty())
            .ok_or_else(|| AuthError::Malformed("missing access_token".to_string()))?;
        let expires_in = payload
            .expires_in
            .ok_or_else(|| AuthError::Malformed("missing expires_in".to_string()))?;

        BearerToken::new(access_token, expiry_from(requested_at, expires_in))
    }
}

/// `POST {login_url}/token?grant_type=client_credentials`.
fn token_endpoint(login_url: &Url) -> Result<Url, AuthError> {
    let mut url = login_url.clone();
    url.path_segments_mut()
        .map_err(|()| AuthError::InvalidEndpoint(login_url.to_string()))?
        .pop_if_empty()
        .push("token");
    url.set_query(Some("grant_type=client_credentials"));
    Ok(url)
}

/// `issued_at + expires_in seconds - 5 seconds`, saturating at the extremes.
fn expiry_from(issued_at: DateTime<Utc>, expires_in: i64) -> DateTime<Utc> {
    let lifetime_ms = expires_in
        .saturating_mul(1_000)
        .saturating_sub(EXPIRY_MARGIN_MS);

    TimeDelta::try_milliseconds(lifetime_ms)
        .and_then(|lifetime| issued_at.checked_add_signed(lifetime))
        .unwrap_or(if lifetime_ms > 0 {
            DateTime::<Utc>::MAX_UTC
        } else {
            issued_at
        })
}
