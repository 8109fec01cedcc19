use std::sync::Arc;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap, HeaderValue},
};
use tracing::{debug, warn};
use uuid::Uuid;

use super::{SessionData, SessionStore};
use crate::{config::SessionConfig, error::ApiError, state::AppState};

/// Session attached to the current request.
///
/// Loaded from the store using the id found in the session cookie. A
/// missing, malformed or expired cookie yields an empty session.
pub struct Session {
    id: Option<Uuid>,
    data: Option<SessionData>,
    store: Arc<dyn SessionStore>,
    config: SessionConfig,
}

#[async_trait]
impl FromRequestParts<AppState> for Session {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let config = state.config.session.clone();
        let id = session_id_from_headers(&parts.headers, &config.cookie_name);

        let data = match id {
            Some(id) => state.sessions.get(id).await?,
            None => None,
        };
        if id.is_some() && data.is_none() {
            debug!("session cookie present but no live session");
        }

        Ok(Session {
            id,
            data,
            store: state.sessions.clone(),
            config,
        })
    }
}

impl Session {
    pub fn data(&self) -> Option<&SessionData> {
        self.data.as_ref()
    }

    pub fn is_logged_in(&self) -> bool {
        self.data.as_ref().is_some_and(|d| d.logged_in)
    }

    /// Stores `data` under a fresh session id and returns the cookie to send.
    /// Any previous session for this client is dropped.
    pub async fn establish(&mut self, data: SessionData) -> anyhow::Result<HeaderMap> {
        if let Some(old) = self.id.take() {
            self.store.destroy(old).await?;
        }
        let id = Uuid::new_v4();
        self.store.set(id, data.clone()).await?;
        debug!(user_id = data.user_id, "session established");
        self.id = Some(id);
        self.data = Some(data);

        let max_age = self.config.ttl_minutes * 60;
        set_cookie_headers(&self.config, &id.to_string(), max_age)
    }

    /// Removes the session from the store and expires the cookie.
    pub async fn destroy(mut self) -> anyhow::Result<HeaderMap> {
        if let Some(id) = self.id.take() {
            self.store.destroy(id).await?;
        }
        self.data = None;
        set_cookie_headers(&self.config, "", 0)
    }
}

fn session_id_from_headers(headers: &HeaderMap, cookie_name: &str) -> Option<Uuid> {
    let raw = headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == cookie_name)
        .map(|(_, value)| value.trim())?;

    match Uuid::parse_str(raw) {
        Ok(id) => Some(id),
        Err(_) => {
            warn!("ignoring malformed session cookie");
            None
        }
    }
}

fn set_cookie_headers(
    config: &SessionConfig,
    value: &str,
    max_age: i64,
) -> anyhow::Result<HeaderMap> {
    let mut cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        config.cookie_name, value, max_age
    );
    if config.secure_cookie {
        cookie.push_str("; Secure");
    }
    let mut headers = HeaderMap::new();
    headers.insert(header::SET_COOKIE, HeaderValue::from_str(&cookie)?);
    Ok(headers)
}
