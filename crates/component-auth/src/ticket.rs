//! Verify ticket slot
//!
//! WeChat pushes a `component_verify_ticket` to the platform's callback
//! every ten minutes. Whatever decodes that push writes the ticket here; the
//! access-token manager reads it each time it mints a new token. The slot
//! has no TTL and is overwritten by each push.

use std::sync::Arc;

use cache_store::CacheStore;
use tracing::debug;

use crate::constants::VERIFY_TICKET_CACHE_PREFIX;
use crate::error::Result;

/// Named slot for one platform's latest verify ticket.
#[derive(Clone)]
pub struct VerifyTicketStore {
    cache: Arc<dyn CacheStore>,
    key: String,
}

impl VerifyTicketStore {
    pub fn new(cache: Arc<dyn CacheStore>, app_id: &str) -> Self {
        Self {
            cache,
            key: format!("{VERIFY_TICKET_CACHE_PREFIX}{app_id}"),
        }
    }

    /// Persist a freshly pushed ticket, replacing the previous one.
    pub async fn set(&self, ticket: &str) -> Result<()> {
        self.cache.save(&self.key, ticket.to_owned(), None).await?;
        debug!(key = %self.key, "stored component verify ticket");
        Ok(())
    }

    /// The latest ticket, if one has been pushed.
    pub async fn get(&self) -> Result<Option<String>> {
        Ok(self.cache.fetch(&self.key).await?)
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}
