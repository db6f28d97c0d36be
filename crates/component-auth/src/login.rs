//! Consent page URL construction

use crate::constants::COMPONENT_LOGIN_PAGE;

/// Build the consent page URL a tenant admin is redirected to.
///
/// Parameters appear in a fixed order: platform app id, pre-auth code, then
/// the percent-encoded redirect target WeChat calls back with the
/// authorization code.
pub fn build_login_url(app_id: &str, pre_auth_code: &str, redirect_uri: &str) -> String {
    format!(
        "{}?component_appid={}&pre_auth_code={}&redirect_uri={}",
        COMPONENT_LOGIN_PAGE,
        app_id,
        pre_auth_code,
        urlencoding::encode(redirect_uri),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_has_fixed_parameter_order() {
        let url = build_login_url("wx_component", "preauthcode@@@P", "https://cb.example/x");
        assert_eq!(
            url,
            "https://mp.weixin.qq.com/cgi-bin/componentloginpage?component_appid=wx_component&pre_auth_code=preauthcode@@@P&redirect_uri=https%3A%2F%2Fcb.example%2Fx"
        );
    }

    #[test]
    fn redirect_query_is_encoded() {
        let url = build_login_url("wx1", "P", "https://cb.example/done?tenant=a b&x=1");
        assert!(url.ends_with("redirect_uri=https%3A%2F%2Fcb.example%2Fdone%3Ftenant%3Da%20b%26x%3D1"));
    }
}
