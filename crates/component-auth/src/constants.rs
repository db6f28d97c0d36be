//! WeChat open platform constants
//!
//! Endpoint paths, cache key namespaces and the safety margins subtracted
//! from server-declared lifetimes before caching.

/// Default API host; overridable through `ComponentConfig::with_api_base`
pub const DEFAULT_API_BASE: &str = "https://api.weixin.qq.com";

/// Consent page the tenant is redirected to. Not affected by the API base.
pub const COMPONENT_LOGIN_PAGE: &str = "https://mp.weixin.qq.com/cgi-bin/componentloginpage";

pub const API_COMPONENT_TOKEN: &str = "/cgi-bin/component/api_component_token";
pub const API_CREATE_PREAUTHCODE: &str = "/cgi-bin/component/api_create_preauthcode";
pub const API_QUERY_AUTH: &str = "/cgi-bin/component/api_query_auth";
pub const API_GET_AUTHORIZER_INFO: &str = "/cgi-bin/component/api_get_authorizer_info";
pub const API_GET_AUTHORIZER_OPTION: &str = "/cgi-bin/component/api_get_authorizer_option";
pub const API_SET_AUTHORIZER_OPTION: &str = "/cgi-bin/component/api_set_authorizer_option";

/// Query parameter carrying the component access token on signed calls
pub const TOKEN_QUERY_NAME: &str = "component_access_token";

/// Seconds shaved off the access token lifetime so a token never expires mid-flight
pub const ACCESS_TOKEN_EXPIRY_MARGIN_SECS: u64 = 1500;

/// Seconds shaved off the pre-auth code lifetime
pub const PRE_AUTH_CODE_EXPIRY_MARGIN_SECS: u64 = 300;

/// Cache key prefixes. Each is followed by the platform app id.
pub const ACCESS_TOKEN_CACHE_PREFIX: &str = "wechat.component.access_token.";
pub const PRE_AUTH_CODE_CACHE_PREFIX: &str = "wechat.component.pre_auth_code.";
pub const VERIFY_TICKET_CACHE_PREFIX: &str = "wechat.component.verify_ticket.";
