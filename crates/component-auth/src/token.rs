//! Component access token lifecycle
//!
//! The `component_access_token` signs every other component API call. It is
//! minted from the platform app id, app secret and the latest verify ticket,
//! lives for `expires_in` seconds (7200 in practice), and is cached for
//! `expires_in - 1500` seconds so a token is never served close to expiry.
//!
//! Per cache key the token moves through
//! `Unknown -> Cached(valid) -> Cached(expired) -> Refreshing -> Cached(valid)`;
//! a forced refresh jumps straight to `Refreshing`.
//!
//! Refreshes are single-flight: callers that miss the cache queue on one
//! guard and re-check the cache once they hold it, so a burst of misses
//! produces one remote call. Another process sharing the same cache store
//! can still refresh concurrently; the last write wins.

use std::sync::Arc;
use std::time::Duration;

use cache_store::CacheStore;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use transport::Transport;

use crate::config::ComponentConfig;
use crate::constants::{
    ACCESS_TOKEN_CACHE_PREFIX, ACCESS_TOKEN_EXPIRY_MARGIN_SECS, API_COMPONENT_TOKEN,
    TOKEN_QUERY_NAME,
};
use crate::error::{Error, Result};
use crate::ticket::VerifyTicketStore;

/// Token endpoint response.
///
/// `expires_in` is a delta in seconds from the response time.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TokenGrant {
    #[serde(rename = "component_access_token")]
    pub token: String,
    pub expires_in: u64,
}

impl TokenGrant {
    /// Parse a token endpoint response, keeping the raw payload in the error.
    pub fn from_response(response: &serde_json::Value) -> Result<Self> {
        let grant: TokenGrant = serde_json::from_value(response.clone()).map_err(|e| {
            Error::Refresh(format!(
                "request component access token failed ({e}); response: {response}"
            ))
        })?;
        if grant.token.is_empty() {
            return Err(Error::Refresh(format!(
                "empty component_access_token; response: {response}"
            )));
        }
        Ok(grant)
    }

    /// How long the token may be served from cache, or `None` when the
    /// declared lifetime does not exceed the safety margin.
    pub fn cache_ttl(&self) -> Option<Duration> {
        self.expires_in
            .checked_sub(ACCESS_TOKEN_EXPIRY_MARGIN_SECS)
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}

/// Owns acquisition, caching and forced refresh of the component access token.
pub struct AccessTokenManager {
    config: Arc<ComponentConfig>,
    cache: Arc<dyn CacheStore>,
    transport: Arc<dyn Transport>,
    tickets: VerifyTicketStore,
    cache_key: String,
    refresh_guard: Mutex<()>,
}

impl AccessTokenManager {
    pub fn new(
        config: Arc<ComponentConfig>,
        cache: Arc<dyn CacheStore>,
        transport: Arc<dyn Transport>,
        tickets: VerifyTicketStore,
    ) -> Self {
        let cache_key = format!("{ACCESS_TOKEN_CACHE_PREFIX}{}", config.app_id);
        Self {
            config,
            cache,
            transport,
            tickets,
            cache_key,
            refresh_guard: Mutex::new(()),
        }
    }

    /// Use `prefix` followed by the app id as the cache key.
    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.cache_key = format!("{prefix}{}", self.config.app_id);
        self
    }

    /// Use an exact cache key, ignoring the app id.
    pub fn with_cache_key(mut self, cache_key: impl Into<String>) -> Self {
        self.cache_key = cache_key.into();
        self
    }

    pub fn app_id(&self) -> &str {
        &self.config.app_id
    }

    pub fn cache_key(&self) -> &str {
        &self.cache_key
    }

    pub fn verify_tickets(&self) -> &VerifyTicketStore {
        &self.tickets
    }

    /// Return a non-expired token, refreshing from the server when needed.
    ///
    /// With `force_refresh` the cache is bypassed and exactly one remote call
    /// is made. A failed refresh leaves any previously cached token in place.
    pub async fn get_token(&self, force_refresh: bool) -> Result<String> {
        if !force_refresh {
            if let Some(token) = self.cached().await? {
                return Ok(token);
            }
        }

        let _guard = self.refresh_guard.lock().await;

        if !force_refresh {
            // Another caller may have refreshed while we waited on the guard
            if let Some(token) = self.cached().await? {
                debug!(app_id = %self.config.app_id, "token refreshed by concurrent caller");
                return Ok(token);
            }
        }

        let grant = match self.fetch_from_server().await {
            Ok(grant) => grant,
            Err(e) => {
                metrics::counter!("component_token_refresh_total", "outcome" => "failure")
                    .increment(1);
                return Err(e);
            }
        };
        metrics::counter!("component_token_refresh_total", "outcome" => "success").increment(1);

        match grant.cache_ttl() {
            Some(ttl) => {
                self.cache
                    .save(&self.cache_key, grant.token.clone(), Some(ttl))
                    .await?;
                info!(
                    app_id = %self.config.app_id,
                    ttl_secs = ttl.as_secs(),
                    forced = force_refresh,
                    "component access token refreshed"
                );
            }
            None => {
                // The previously cached token is superseded and must not be served
                self.cache.delete(&self.cache_key).await?;
                warn!(
                    app_id = %self.config.app_id,
                    expires_in = grant.expires_in,
                    "token lifetime within safety margin, not caching"
                );
            }
        }

        Ok(grant.token)
    }

    /// Request a new token from the token endpoint.
    ///
    /// The verify ticket is read from the ticket store on every call so the
    /// most recently pushed ticket is always used.
    pub async fn fetch_from_server(&self) -> Result<TokenGrant> {
        let ticket = self
            .tickets
            .get()
            .await?
            .ok_or_else(|| Error::MissingVerifyTicket(self.config.app_id.clone()))?;

        let body = serde_json::json!({
            "component_appid": self.config.app_id,
            "component_appsecret": self.config.app_secret.expose(),
            "component_verify_ticket": ticket,
        });
        let url = self.config.endpoint(API_COMPONENT_TOKEN);
        let response = self.transport.post_json(&url, &body).await?;

        TokenGrant::from_response(&response)
    }

    /// Query parameter pair used to sign component API calls.
    pub async fn query_fields(&self) -> Result<(&'static str, String)> {
        Ok((TOKEN_QUERY_NAME, self.get_token(false).await?))
    }

    /// Absolute URL for `path`, signed with the current token.
    pub async fn signed_url(&self, path: &str) -> Result<String> {
        let (name, token) = self.query_fields().await?;
        Ok(format!(
            "{}?{name}={}",
            self.config.endpoint(path),
            urlencoding::encode(&token)
        ))
    }

    async fn cached(&self) -> Result<Option<String>> {
        let cached = self.cache.fetch(&self.cache_key).await?;
        let result = if cached.is_some() { "hit" } else { "miss" };
        metrics::counter!("component_cache_lookups_total", "kind" => "access_token", "result" => result)
            .increment(1);
        debug!(key = %self.cache_key, result, "access token cache lookup");
        Ok(cached)
    }
}
