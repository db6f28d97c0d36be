//! Platform identity shared by the managers and the facade

use common::Secret;

use crate::constants::DEFAULT_API_BASE;

/// Component (third-party platform) credentials and API location.
#[derive(Debug, Clone)]
pub struct ComponentConfig {
    pub app_id: String,
    pub app_secret: Secret<String>,
    pub api_base: String,
}

impl ComponentConfig {
    pub fn new(app_id: impl Into<String>, app_secret: Secret<String>) -> Self {
        Self {
            app_id: app_id.into(),
            app_secret,
            api_base: DEFAULT_API_BASE.to_owned(),
        }
    }

    /// Point the API calls at another host (test servers, regional proxies).
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Absolute URL for an endpoint path.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.api_base.trim_end_matches('/'), path)
    }
}
