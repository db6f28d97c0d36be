//! WeChat open platform component authorization
//!
//! Client side of the third-party platform ("component") protocol: keeps the
//! platform-level `component_access_token` fresh, caches pre-auth codes, and
//! drives the tenant authorization handshake. Cache and HTTP are injected
//! through the `cache_store::CacheStore` and `transport::Transport` traits.
//!
//! Authorization flow:
//! 1. The verify-ticket push is written via `VerifyTicketStore::set()`
//! 2. `AccessTokenManager::get_token()` mints/caches the platform token
//! 3. `Component::login_page()` builds the consent URL around a pre-auth code
//! 4. `Component::query_auth()` exchanges the returned authorization code
//! 5. `Component::forget_pre_auth_code()` retires the consumed code

pub mod component;
pub mod config;
pub mod constants;
pub mod error;
pub mod login;
pub mod pre_auth;
pub mod ticket;
pub mod token;

#[cfg(test)]
mod testing;

pub use component::Component;
pub use config::ComponentConfig;
pub use constants::*;
pub use error::{Error, Result};
pub use login::build_login_url;
pub use pre_auth::{PreAuthCode, PreAuthCodeManager};
pub use ticket::VerifyTicketStore;
pub use token::{AccessTokenManager, TokenGrant};
