use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionBackend {
    Memory,
    Postgres,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    pub backend: SessionBackend,
    pub cookie_name: String,
    pub ttl_minutes: i64,
    pub secure_cookie: bool,
}

/// Switches between the full user route set and the flat one.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct UsersConfig {
    pub include_associations: bool,
    pub sessions: bool,
}

impl Default for UsersConfig {
    fn default() -> Self {
        Self {
            include_associations: true,
            sessions: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub max_connections: u32,
    pub session: SessionConfig,
    pub users: UsersConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let host = std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let port = env_parse("APP_PORT").unwrap_or(8080);
        let database_url = std::env::var("DATABASE_URL")?;
        let max_connections = env_parse("DATABASE_MAX_CONNECTIONS").unwrap_or(10);

        let backend = match std::env::var("SESSION_STORE")
            .unwrap_or_else(|_| "postgres".into())
            .to_lowercase()
            .as_str()
        {
            "memory" => SessionBackend::Memory,
            "postgres" | "pg" => SessionBackend::Postgres,
            other => anyhow::bail!("unknown SESSION_STORE {other:?}, expected memory or postgres"),
        };
        let session = SessionConfig {
            backend,
            cookie_name: std::env::var("SESSION_COOKIE_NAME").unwrap_or_else(|_| "sid".into()),
            ttl_minutes: env_parse("SESSION_TTL_MINUTES").unwrap_or(60 * 24),
            secure_cookie: env_flag("SESSION_COOKIE_SECURE").unwrap_or(false),
        };

        let users = UsersConfig {
            include_associations: env_flag("USERS_INCLUDE_ASSOCIATIONS").unwrap_or(true),
            sessions: env_flag("USERS_SESSIONS").unwrap_or(true),
        };

        Ok(Self {
            host,
            port,
            database_url,
            max_connections,
            session,
            users,
        })
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse::<T>().ok())
}

fn env_flag(key: &str) -> Option<bool> {
    std::env::var(key).ok().and_then(|v| parse_flag(&v))
}

fn parse_flag(v: &str) -> Option<bool> {
    match v.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_flag_accepts_common_spellings() {
        assert_eq!(parse_flag("true"), Some(true));
        assert_eq!(parse_flag(" ON "), Some(true));
        assert_eq!(parse_flag("0"), Some(false));
        assert_eq!(parse_flag("no"), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }

    #[test]
    fn users_config_defaults_to_full_route_set() {
        let cfg = UsersConfig::default();
        assert!(cfg.include_associations);
        assert!(cfg.sessions);
    }
}
