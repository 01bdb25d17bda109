//! Server configuration read from the environment (after `.env` is loaded).

use std::{
    net::{AddrParseError, SocketAddr},
    path::PathBuf,
};

use crate::auth::TokenHash;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub environment: String,
    /// Hash of the pre-shared token required for maintenance writes.
    pub maintenance_token: Option<TokenHash>,
    /// Built single-page app served behind the maintenance gate.
    pub static_dir: Option<PathBuf>,
    pub database_url: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3001,
            environment: "development".to_string(),
            maintenance_token: None,
            static_dir: None,
            database_url: None,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from an arbitrary key lookup. Unparseable values fall
    /// back to the defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        // MAINTENANCE_TOKEN_HASH wins over a plain MAINTENANCE_TOKEN.
        let maintenance_token = match non_empty("MAINTENANCE_TOKEN_HASH") {
            Some(hash) => match TokenHash::parse(&hash) {
                Ok(hash) => Some(hash),
                Err(e) => {
                    tracing::warn!("Ignoring MAINTENANCE_TOKEN_HASH: {}", e);
                    None
                }
            },
            None => non_empty("MAINTENANCE_TOKEN").map(|token| TokenHash::from_plain(&token)),
        };

        Self {
            host: non_empty("HOST").unwrap_or(defaults.host),
            port: non_empty("PORT")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.port),
            environment: non_empty("ENVIRONMENT").unwrap_or(defaults.environment),
            maintenance_token,
            static_dir: non_empty("STATIC_DIR").map(PathBuf::from),
            database_url: non_empty("DATABASE_URL"),
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }
}
