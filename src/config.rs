//! Process configuration read from the environment.

use std::path::PathBuf;

use thiserror::Error;

const DEFAULT_PDS_HOST: &str = "https://bsky.social";

/// Errors raised while reading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    Missing(&'static str),
    #[error("invalid {name} value {value:?}: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Deployment environment, from `APP_ENV`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
    Test,
}

impl Environment {
    fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            "test" => Ok(Self::Test),
            _ => Err(ConfigError::Invalid {
                name: "APP_ENV",
                value: value.to_owned(),
                reason: "expected development, production or test".to_owned(),
            }),
        }
    }
}

/// Settings for the protocol client.
#[derive(Debug, Clone)]
pub struct AtprotoConfig {
    /// Personal data server base URL, e.g. `https://bsky.social`.
    pub pds_host: String,
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub debug: bool,
    /// Externally visible base URL. Empty means "derive from the Host header".
    pub public_url: String,
    pub db_path: String,
    /// Secret used to sign the session cookie.
    pub cookie_secret: String,
    pub environment: Environment,
    pub static_dir: PathBuf,
    pub atproto: AtprotoConfig,
}

impl Config {
    /// Loads the configuration from the process environment.
    ///
    /// Call [`dotenvy::dotenv`] first if a `.env` file should be honoured.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads the configuration from an arbitrary key lookup. Empty values are
    /// treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| {
            lookup(key)
                .filter(|value| !value.is_empty())
                .unwrap_or_else(|| default.to_owned())
        };

        let port_raw = get("PORT", "8080");
        let port = port_raw.parse::<u16>().map_err(|e| ConfigError::Invalid {
            name: "PORT",
            value: port_raw.clone(),
            reason: e.to_string(),
        })?;

        let cookie_secret = get("COOKIE_SECRET", "");
        if cookie_secret.is_empty() {
            return Err(ConfigError::Missing("COOKIE_SECRET"));
        }

        Ok(Self {
            host: get("HOST", "127.0.0.1"),
            port,
            debug: get("DEBUG", "false") == "true",
            public_url: get("PUBLIC_URL", "").trim_end_matches('/').to_owned(),
            db_path: get("DB_PATH", "./statusphere.db"),
            cookie_secret,
            environment: Environment::parse(&get("APP_ENV", "development"))?,
            static_dir: PathBuf::from(get("STATIC_DIR", "static")),
            atproto: AtprotoConfig {
                pds_host: get("ATPROTO_PDS_HOST", DEFAULT_PDS_HOST),
            },
        })
    }

    /// Host and port the server binds to. The host may be a name such as
    /// `localhost`; it is resolved when the listener is bound.
    pub fn bind_addr(&self) -> (&str, u16) {
        (self.host.as_str(), self.port)
    }

    /// Sea-ORM connection URL for [`Config::db_path`]. Paths that already are
    /// `sqlite:` URLs are passed through.
    pub fn database_url(&self) -> String {
        if self.db_path.starts_with("sqlite:") {
            self.db_path.clone()
        } else {
            format!("sqlite://{}?mode=rwc", self.db_path)
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }
}
