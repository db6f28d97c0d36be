//! Pre-auth code caching
//!
//! A pre-auth code is presented to a tenant during the consent redirect. The
//! remote API issues one per call and it stays valid for `expires_in` seconds
//! (600 in practice), so codes are cached per caller-chosen identification
//! for `expires_in - 300` seconds. Once a code has been handed to a login
//! page the caller forgets it so the next login gets a fresh one.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use cache_store::CacheStore;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use transport::Transport;

use crate::constants::{
    API_CREATE_PREAUTHCODE, PRE_AUTH_CODE_CACHE_PREFIX, PRE_AUTH_CODE_EXPIRY_MARGIN_SECS,
};
use crate::error::{Error, Result};
use crate::token::AccessTokenManager;

/// Response of the create-pre-auth-code endpoint.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PreAuthCode {
    #[serde(rename = "pre_auth_code")]
    pub code: String,
    pub expires_in: u64,
}

impl PreAuthCode {
    /// Parse the endpoint response. Both fields are required.
    pub fn from_response(response: &serde_json::Value) -> Result<Self> {
        let code: PreAuthCode = serde_json::from_value(response.clone()).map_err(|e| {
            Error::Refresh(format!(
                "create pre_auth_code failed ({e}); response: {response}"
            ))
        })?;
        if code.code.is_empty() {
            return Err(Error::Refresh(format!(
                "empty pre_auth_code; response: {response}"
            )));
        }
        Ok(code)
    }

    pub fn cache_ttl(&self) -> Option<Duration> {
        self.expires_in
            .checked_sub(PRE_AUTH_CODE_EXPIRY_MARGIN_SECS)
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}

/// Caches pre-auth codes per identification.
///
/// Each identification has its own single-flight guard, so concurrent logins
/// for one identification share a code while different identifications never
/// wait on each other.
pub struct PreAuthCodeManager {
    tokens: Arc<AccessTokenManager>,
    cache: Arc<dyn CacheStore>,
    transport: Arc<dyn Transport>,
    guards: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl PreAuthCodeManager {
    pub fn new(
        tokens: Arc<AccessTokenManager>,
        cache: Arc<dyn CacheStore>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            tokens,
            cache,
            transport,
            guards: Mutex::new(HashMap::new()),
        }
    }

    /// Cache key for an identification, namespaced by platform app id.
    pub fn cache_key(&self, identification: &str) -> String {
        format!(
            "{PRE_AUTH_CODE_CACHE_PREFIX}{}.{identification}",
            self.tokens.app_id()
        )
    }

    /// Return the cached code for `identification`, or create a new one.
    pub async fn create_pre_auth_code(&self, identification: &str) -> Result<String> {
        let key = self.cache_key(identification);
        if let Some(code) = self.cached(&key).await? {
            return Ok(code);
        }

        let guard = self.guard_for(&key).await;
        let result = {
            let _lock = guard.lock().await;
            match self.cached(&key).await {
                Ok(Some(code)) => Ok(code),
                Ok(None) => self.fetch_and_store(&key, identification).await,
                Err(e) => Err(e),
            }
        };
        self.release_guard(&key, guard).await;
        result
    }

    /// Evict the cached code so it is never handed out twice.
    ///
    /// Returns whether a live code was evicted.
    pub async fn forget_pre_auth_code(&self, identification: &str) -> Result<bool> {
        let key = self.cache_key(identification);
        let removed = self.cache.delete(&key).await?;
        debug!(identification, removed, "forgot pre-auth code");
        Ok(removed)
    }

    async fn fetch_and_store(&self, key: &str, identification: &str) -> Result<String> {
        let url = self.tokens.signed_url(API_CREATE_PREAUTHCODE).await?;
        let body = serde_json::json!({ "component_appid": self.tokens.app_id() });
        let response = self.transport.post_json(&url, &body).await?;
        let code = PreAuthCode::from_response(&response)?;

        match code.cache_ttl() {
            Some(ttl) => {
                self.cache.save(key, code.code.clone(), Some(ttl)).await?;
                info!(identification, ttl_secs = ttl.as_secs(), "created pre-auth code");
            }
            None => {
                warn!(
                    identification,
                    expires_in = code.expires_in,
                    "pre-auth code lifetime within safety margin, not caching"
                );
            }
        }
        Ok(code.code)
    }

    async fn cached(&self, key: &str) -> Result<Option<String>> {
        let cached = self.cache.fetch(key).await?;
        let result = if cached.is_some() { "hit" } else { "miss" };
        metrics::counter!("component_cache_lookups_total", "kind" => "pre_auth_code", "result" => result)
            .increment(1);
        debug!(key, result, "pre-auth code cache lookup");
        Ok(cached)
    }

    async fn guard_for(&self, key: &str) -> Arc<Mutex<()>> {
        let mut guards = self.guards.lock().await;
        // Entries only the map references were left by dropped requests
        guards.retain(|_, guard| Arc::strong_count(guard) > 1);
        guards.entry(key.to_owned()).or_default().clone()
    }

    /// Drop the guard entry once no other caller holds it.
    async fn release_guard(&self, key: &str, guard: Arc<Mutex<()>>) {
        let mut guards = self.guards.lock().await;
        // One reference in the map, one held here
        if Arc::strong_count(&guard) == 2 {
            guards.remove(key);
        }
    }
}
