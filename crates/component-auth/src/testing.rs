//! Test doubles for the cache and transport seams

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use cache_store::{CacheFuture, CacheStore, MemoryCache};
use common::Secret;
use serde_json::Value;
use transport::{Transport, TransportFuture};

use crate::config::ComponentConfig;

pub const APP_ID: &str = "wx_component";

pub fn config() -> ComponentConfig {
    ComponentConfig::new(APP_ID, Secret::new("component-secret".into()))
        .with_api_base("https://api.test")
}

/// A recorded transport call.
#[derive(Debug, Clone)]
pub struct Call {
    pub url: String,
    pub body: Value,
}

/// Transport answering from per-path queues of scripted responses.
#[derive(Default)]
pub struct FakeTransport {
    responses: Mutex<HashMap<String, VecDeque<transport::Result<Value>>>>,
    calls: Mutex<Vec<Call>>,
}

impl FakeTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond(&self, path: &str, response: Value) {
        self.push(path, Ok(response));
    }

    pub fn fail(&self, path: &str, error: transport::Error) {
        self.push(path, Err(error));
    }

    fn push(&self, path: &str, response: transport::Result<Value>) {
        self.responses
            .lock()
            .unwrap()
            .entry(path.to_owned())
            .or_default()
            .push_back(response);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, path: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| path_of(&c.url) == path)
            .count()
    }
}

fn path_of(url: &str) -> &str {
    let without_query = url.split_once('?').map_or(url, |(base, _)| base);
    without_query
        .strip_prefix("https://api.test")
        .unwrap_or(without_query)
}

impl Transport for FakeTransport {
    fn post_json<'a>(&'a self, url: &'a str, body: &'a Value) -> TransportFuture<'a> {
        Box::pin(async move {
            self.calls.lock().unwrap().push(Call {
                url: url.to_owned(),
                body: body.clone(),
            });
            // Give concurrent callers a chance to pile up behind the guard
            tokio::task::yield_now().await;
            let path = path_of(url).to_owned();
            let next = self
                .responses
                .lock()
                .unwrap()
                .get_mut(&path)
                .and_then(VecDeque::pop_front);
            next.unwrap_or_else(|| {
                Err(transport::Error::Http(format!(
                    "no scripted response for {path}"
                )))
            })
        })
    }
}

/// Memory cache that records the TTL of every save.
#[derive(Default)]
pub struct RecordingCache {
    inner: MemoryCache,
    saves: Mutex<Vec<(String, Option<Duration>)>>,
}

impl RecordingCache {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn ttl_of(&self, key: &str) -> Option<Duration> {
        self.saves
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .and_then(|(_, ttl)| *ttl)
    }
}

impl CacheStore for RecordingCache {
    fn fetch<'a>(&'a self, key: &'a str) -> CacheFuture<'a, Option<String>> {
        self.inner.fetch(key)
    }

    fn save<'a>(
        &'a self,
        key: &'a str,
        value: String,
        ttl: Option<Duration>,
    ) -> CacheFuture<'a, ()> {
        self.saves.lock().unwrap().push((key.to_owned(), ttl));
        self.inner.save(key, value, ttl)
    }

    fn delete<'a>(&'a self, key: &'a str) -> CacheFuture<'a, bool> {
        self.inner.delete(key)
    }
}
