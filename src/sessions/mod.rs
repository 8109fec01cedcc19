//! Server-side sessions keyed by an opaque cookie id.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

pub mod extractors;
mod memory;
mod pg;

pub use extractors::Session;
pub use memory::MemorySessionStore;
pub use pg::PgSessionStore;

/// What the server remembers about a client between requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionData {
    pub user_id: i32,
    pub username: String,
    #[serde(rename = "loggedIn")]
    pub logged_in: bool,
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Expired sessions read as `None`.
    async fn get(&self, id: Uuid) -> anyhow::Result<Option<SessionData>>;
    /// Inserts or replaces the session and restarts its ttl.
    async fn set(&self, id: Uuid, data: SessionData) -> anyhow::Result<()>;
    async fn destroy(&self, id: Uuid) -> anyhow::Result<()>;
    /// Drops expired sessions, returning how many were removed.
    async fn purge_expired(&self) -> anyhow::Result<u64>;
}

/// Periodically removes expired sessions until the runtime shuts down.
pub fn spawn_purge_task(store: Arc<dyn SessionStore>, every: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        loop {
            ticker.tick().await;
            match store.purge_expired().await {
                Ok(0) => {}
                Ok(n) => debug!(removed = n, "purged expired sessions"),
                Err(e) => warn!(error = %e, "session purge failed"),
            }
        }
    })
}
