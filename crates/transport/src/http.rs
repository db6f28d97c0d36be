//! reqwest-backed transport
//!
//! POSTs JSON bodies and decodes JSON responses. Non-2xx statuses carry the
//! response body in the error for diagnosability, and WeChat's in-band
//! `errcode` envelope is surfaced as `Error::Api`.

use std::time::Duration;

use tracing::debug;

use crate::{Error, Result, Transport, TransportFuture, check_errcode};

/// HTTP transport over a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Build a transport whose requests time out after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Http(format!("building HTTP client: {e}")))?;
        Ok(Self { client })
    }

    /// Wrap an existing client (shares its connection pool).
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    async fn send(&self, url: &str, body: &serde_json::Value) -> Result<serde_json::Value> {
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                // reqwest's Display appends the full URL, token query included
                Error::Http(format!(
                    "request to {} failed: {}",
                    redact_query(url),
                    e.without_url()
                ))
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| Error::Http(format!("reading response body: {}", e.without_url())))?;

        if !status.is_success() {
            return Err(Error::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        debug!(url = %redact_query(url), status = status.as_u16(), "remote call completed");

        let parsed: serde_json::Value = serde_json::from_str(&text)
            .map_err(|e| Error::Decode(format!("{e}; body: {text}")))?;
        check_errcode(parsed)
    }
}

impl Transport for HttpTransport {
    fn post_json<'a>(&'a self, url: &'a str, body: &'a serde_json::Value) -> TransportFuture<'a> {
        Box::pin(self.send(url, body))
    }
}

/// Strip the query string so access tokens never reach logs.
fn redact_query(url: &str) -> &str {
    url.split_once('?').map_or(url, |(base, _)| base)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use serde_json::json;

    fn transport() -> HttpTransport {
        HttpTransport::new(Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn posts_json_and_parses_response() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/cgi-bin/component/api_component_token")
            .match_body(Matcher::Json(json!({
                "component_appid": "wx_component",
                "component_appsecret": "secret",
                "component_verify_ticket": "ticket@@@abc"
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({"component_access_token": "T", "expires_in": 7200}).to_string())
            .create_async()
            .await;

        let url = format!("{}/cgi-bin/component/api_component_token", server.url());
        let body = json!({
            "component_appid": "wx_component",
            "component_appsecret": "secret",
            "component_verify_ticket": "ticket@@@abc"
        });
        let response = transport().post_json(&url, &body).await.unwrap();

        assert_eq!(response["component_access_token"], "T");
        assert_eq!(response["expires_in"], 7200);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn forwards_signing_query() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/cgi-bin/component/api_query_auth")
            .match_query(Matcher::UrlEncoded(
                "component_access_token".into(),
                "T".into(),
            ))
            .with_status(200)
            .with_body(r#"{"authorization_info":{"authorizer_appid":"wx_tenant"}}"#)
            .create_async()
            .await;

        let url = format!(
            "{}/cgi-bin/component/api_query_auth?component_access_token=T",
            server.url()
        );
        let response = transport()
            .post_json(&url, &json!({"authorization_code": "code"}))
            .await
            .unwrap();

        assert_eq!(response["authorization_info"]["authorizer_appid"], "wx_tenant");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn non_success_status_carries_body() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/boom")
            .with_status(502)
            .with_body("upstream down")
            .create_async()
            .await;

        let url = format!("{}/boom", server.url());
        let err = transport().post_json(&url, &json!({})).await.unwrap_err();
        match err {
            Error::Status { status, body } => {
                assert_eq!(status, 502);
                assert_eq!(body, "upstream down");
            }
            other => panic!("expected Status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn errcode_envelope_is_api_error() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/cgi-bin/component/api_create_preauthcode")
            .with_status(200)
            .with_body(r#"{"errcode":42001,"errmsg":"access_token expired"}"#)
            .create_async()
            .await;

        let url = format!("{}/cgi-bin/component/api_create_preauthcode", server.url());
        let err = transport().post_json(&url, &json!({})).await.unwrap_err();
        assert!(matches!(err, Error::Api { code: 42001, .. }), "got {err:?}");
    }

    #[tokio::test]
    async fn non_json_body_is_decode_error() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/html")
            .with_status(200)
            .with_body("<html>maintenance</html>")
            .create_async()
            .await;

        let url = format!("{}/html", server.url());
        let err = transport().post_json(&url, &json!({})).await.unwrap_err();
        match err {
            Error::Decode(msg) => assert!(msg.contains("maintenance"), "got {msg}"),
            other => panic!("expected Decode error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn connect_error_does_not_leak_token() {
        // Grab a free port, then close it so the connect is refused
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let url = format!("http://127.0.0.1:{port}/x?component_access_token=SECRET_TOKEN");

        let err = transport().post_json(&url, &json!({})).await.unwrap_err();
        assert!(matches!(err, Error::Http(_)), "got {err:?}");
        let rendered = format!("{err} {err:?}");
        assert!(!rendered.contains("SECRET_TOKEN"), "got {rendered}");
        assert!(rendered.contains(&format!("127.0.0.1:{port}/x")), "got {rendered}");
    }

    #[test]
    fn redact_query_drops_token() {
        assert_eq!(
            redact_query("https://api.weixin.qq.com/x?component_access_token=T"),
            "https://api.weixin.qq.com/x"
        );
        assert_eq!(redact_query("https://api.weixin.qq.com/x"), "https://api.weixin.qq.com/x");
    }
}
