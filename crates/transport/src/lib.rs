//! JSON transport abstraction for the WeChat open platform API
//!
//! Defines the `Transport` trait that decouples the token managers and the
//! authorization facade from the HTTP client. `HttpTransport` is the reqwest
//! implementation; tests substitute a scripted fake behind the same trait.

pub mod http;

pub use http::HttpTransport;

use std::future::Future;
use std::pin::Pin;

/// Errors from a transport call.
///
/// The component layer propagates these unchanged; no retry happens here.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("remote returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid JSON response: {0}")]
    Decode(String),

    /// WeChat reports most failures as HTTP 200 with a non-zero `errcode`.
    #[error("remote API error {code}: {message}")]
    Api { code: i64, message: String },
}

/// Result alias for transport operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Boxed future returned by `Transport::post_json`.
pub type TransportFuture<'a> =
    Pin<Box<dyn Future<Output = Result<serde_json::Value>> + Send + 'a>>;

/// Performs a JSON POST and returns the parsed JSON response.
///
/// Uses `Pin<Box<dyn Future>>` return types for dyn-compatibility (`Arc<dyn Transport>`).
pub trait Transport: Send + Sync {
    /// POST `body` as JSON to `url`. The url already carries any signing query.
    fn post_json<'a>(&'a self, url: &'a str, body: &'a serde_json::Value) -> TransportFuture<'a>;
}

/// Map a WeChat `{"errcode": N, "errmsg": "..."}` envelope to `Error::Api`.
///
/// Responses without `errcode`, or with `errcode == 0`, pass through.
pub fn check_errcode(response: serde_json::Value) -> Result<serde_json::Value> {
    match response.get("errcode").and_then(serde_json::Value::as_i64) {
        Some(code) if code != 0 => {
            let message = response
                .get("errmsg")
                .and_then(serde_json::Value::as_str)
                .unwrap_or_default()
                .to_owned();
            Err(Error::Api { code, message })
        }
        _ => Ok(response),
    }
}
