//! Authorization facade
//!
//! Composes the verify-ticket slot, the access-token manager and the
//! pre-auth-code manager behind one handle. The authorization handshake is:
//!
//! 1. `login_page()` builds the consent URL around a pre-auth code
//! 2. The tenant admin approves; WeChat redirects back with an authorization code
//! 3. `query_auth()` exchanges that code for the tenant's credentials
//!
//! The authorizer info/option calls are signed pass-throughs; their JSON
//! responses are returned verbatim.

use std::sync::Arc;

use cache_store::CacheStore;
use serde_json::{Value, json};
use tracing::debug;
use transport::Transport;

use crate::config::ComponentConfig;
use crate::constants::{
    API_GET_AUTHORIZER_INFO, API_GET_AUTHORIZER_OPTION, API_QUERY_AUTH,
    API_SET_AUTHORIZER_OPTION,
};
use crate::error::Result;
use crate::login::build_login_url;
use crate::pre_auth::PreAuthCodeManager;
use crate::ticket::VerifyTicketStore;
use crate::token::AccessTokenManager;

/// Third-party platform client for one component app id.
pub struct Component {
    config: Arc<ComponentConfig>,
    transport: Arc<dyn Transport>,
    tokens: Arc<AccessTokenManager>,
    pre_auth: PreAuthCodeManager,
}

impl Component {
    /// Wire the managers over a shared cache and transport.
    ///
    /// The verify ticket, access token and pre-auth codes all live in `cache`,
    /// each under a key namespaced by the app id.
    pub fn new(
        config: ComponentConfig,
        cache: Arc<dyn CacheStore>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        let config = Arc::new(config);
        let tickets = VerifyTicketStore::new(cache.clone(), &config.app_id);
        let tokens = Arc::new(AccessTokenManager::new(
            config.clone(),
            cache.clone(),
            transport.clone(),
            tickets,
        ));
        Self::with_tokens(config, tokens, cache, transport)
    }

    /// Build around an already configured token manager (custom cache key).
    pub fn with_tokens(
        config: Arc<ComponentConfig>,
        tokens: Arc<AccessTokenManager>,
        cache: Arc<dyn CacheStore>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        let pre_auth = PreAuthCodeManager::new(tokens.clone(), cache, transport.clone());
        Self {
            config,
            transport,
            tokens,
            pre_auth,
        }
    }

    pub fn app_id(&self) -> &str {
        &self.config.app_id
    }

    pub fn tokens(&self) -> &AccessTokenManager {
        &self.tokens
    }

    pub fn verify_tickets(&self) -> &VerifyTicketStore {
        self.tokens.verify_tickets()
    }

    /// Consent page URL for `identification`, redirecting back to `redirect_url`.
    ///
    /// Makes no network call beyond fetching the pre-auth code.
    pub async fn login_page(&self, redirect_url: &str, identification: &str) -> Result<String> {
        let code = self.pre_auth.create_pre_auth_code(identification).await?;
        Ok(build_login_url(&self.config.app_id, &code, redirect_url))
    }

    pub async fn create_pre_auth_code(&self, identification: &str) -> Result<String> {
        self.pre_auth.create_pre_auth_code(identification).await
    }

    /// Evict a consumed pre-auth code. Returns whether one was cached.
    pub async fn forget_pre_auth_code(&self, identification: &str) -> Result<bool> {
        self.pre_auth.forget_pre_auth_code(identification).await
    }

    /// Exchange a one-time authorization code for the tenant's credentials.
    pub async fn query_auth(&self, authorization_code: &str) -> Result<Value> {
        self.call(
            API_QUERY_AUTH,
            json!({
                "component_appid": self.config.app_id,
                "authorization_code": authorization_code,
            }),
        )
        .await
    }

    pub async fn get_authorizer_info(&self, authorizer_appid: &str) -> Result<Value> {
        self.call(
            API_GET_AUTHORIZER_INFO,
            json!({
                "component_appid": self.config.app_id,
                "authorizer_appid": authorizer_appid,
            }),
        )
        .await
    }

    pub async fn get_authorizer_option(
        &self,
        authorizer_appid: &str,
        option_name: &str,
    ) -> Result<Value> {
        self.call(
            API_GET_AUTHORIZER_OPTION,
            json!({
                "component_appid": self.config.app_id,
                "authorizer_appid": authorizer_appid,
                "option_name": option_name,
            }),
        )
        .await
    }

    pub async fn set_authorizer_option(
        &self,
        authorizer_appid: &str,
        option_name: &str,
        option_value: &str,
    ) -> Result<Value> {
        self.call(
            API_SET_AUTHORIZER_OPTION,
            json!({
                "component_appid": self.config.app_id,
                "authorizer_appid": authorizer_appid,
                "option_name": option_name,
                "option_value": option_value,
            }),
        )
        .await
    }

    async fn call(&self, path: &str, body: Value) -> Result<Value> {
        let url = self.tokens.signed_url(path).await?;
        debug!(path, "calling component API");
        Ok(self.transport.post_json(&url, &body).await?)
    }
}
