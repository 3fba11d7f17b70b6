use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;

const DEV_SECRET: &str = "dev-secret-change-me";

/// Server settings, read from `PARLEY_*` environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub jwt_secret: String,
    pub db_path: PathBuf,
    pub host: String,
    pub port: u16,
    /// Base64 AES-256 key for message bodies. Unset means bodies are stored
    /// as plaintext.
    pub message_key: Option<String>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let port = match get("PARLEY_PORT") {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("PARLEY_PORT is not a port number: {raw}"))?,
            None => 3000,
        };

        Ok(Self {
            jwt_secret: get("PARLEY_JWT_SECRET").unwrap_or_else(|| DEV_SECRET.into()),
            db_path: PathBuf::from(get("PARLEY_DB_PATH").unwrap_or_else(|| "parley.db".into())),
            host: get("PARLEY_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
            message_key: get("PARLEY_MESSAGE_KEY").filter(|k| !k.trim().is_empty()),
        })
    }

    pub fn uses_dev_secret(&self) -> bool {
        self.jwt_secret == DEV_SECRET
    }

    pub fn addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", self.host, self.port))
    }
}
