use std::collections::HashMap;

use async_trait::async_trait;
use time::{Duration, OffsetDateTime};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{SessionData, SessionStore};

/// Process-local store; sessions are lost on restart.
pub struct MemorySessionStore {
    ttl: Duration,
    inner: RwLock<HashMap<Uuid, (SessionData, OffsetDateTime)>>,
}

impl MemorySessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            inner: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get(&self, id: Uuid) -> anyhow::Result<Option<SessionData>> {
        let map = self.inner.read().await;
        Ok(map
            .get(&id)
            .filter(|(_, expires_at)| *expires_at > OffsetDateTime::now_utc())
            .map(|(data, _)| data.clone()))
    }

    async fn set(&self, id: Uuid, data: SessionData) -> anyhow::Result<()> {
        let expires_at = OffsetDateTime::now_utc() + self.ttl;
        self.inner.write().await.insert(id, (data, expires_at));
        Ok(())
    }

    async fn destroy(&self, id: Uuid) -> anyhow::Result<()> {
        self.inner.write().await.remove(&id);
        Ok(())
    }

    async fn purge_expired(&self) -> anyhow::Result<u64> {
        let now = OffsetDateTime::now_utc();
        let mut map = self.inner.write().await;
        let before = map.len();
        map.retain(|_, (_, expires_at)| *expires_at > now);
        Ok((before - map.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data() -> SessionData {
        SessionData {
            user_id: 1,
            username: "Victor".into(),
            logged_in: true,
        }
    }

    #[tokio::test]
    async fn set_get_destroy() {
        let store = MemorySessionStore::new(Duration::minutes(5));
        let id = Uuid::new_v4();
        assert_eq!(store.get(id).await.unwrap(), None);

        store.set(id, data()).await.unwrap();
        assert_eq!(store.get(id).await.unwrap(), Some(data()));

        store.destroy(id).await.unwrap();
        assert_eq!(store.get(id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn expired_sessions_are_invisible_and_purged() {
        let store = MemorySessionStore::new(Duration::seconds(-1));
        let id = Uuid::new_v4();
        store.set(id, data()).await.unwrap();

        assert_eq!(store.get(id).await.unwrap(), None);
        assert_eq!(store.purge_expired().await.unwrap(), 1);
        assert_eq!(store.purge_expired().await.unwrap(), 0);
    }
}
