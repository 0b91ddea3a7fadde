use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_request_size_bytes: usize,
    pub enable_request_logging: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub max_connections: u32,
    /// Seconds to wait for a pooled connection
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// Empty means any origin is allowed
    pub cors_origins: Vec<String>,
    pub auth_domain: Option<String>,
    pub issuer: Option<String>,
    pub audience: String,
    pub jwks_url: Option<String>,
    pub jwks_file: Option<PathBuf>,
}

/// Where the token verification keys come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JwksSource {
    File(PathBuf),
    Url(Url),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("token issuer is not configured (set AUTH_ISSUER or AUTH0_DOMAIN)")]
    MissingIssuer,

    #[error("token key set is not configured (set AUTH_JWKS_FILE, AUTH_JWKS_URL or AUTH0_DOMAIN)")]
    MissingJwks,

    #[error("DATABASE_URL is not configured")]
    MissingDatabaseUrl,

    #[error("invalid URL for {field}: {source}")]
    InvalidUrl {
        field: &'static str,
        #[source]
        source: url::ParseError,
    },
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = match lookup("APP_ENV").as_deref() {
            Some("production") | Some("prod") => Environment::Production,
            Some("staging") | Some("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_overrides(lookup)
    }

    fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        // Server overrides
        if let Some(v) = lookup("HOST") {
            self.server.host = v;
        }
        if let Some(port) = lookup("DRINKS_API_PORT")
            .or_else(|| lookup("PORT"))
            .and_then(|v| v.parse().ok())
        {
            self.server.port = port;
        }
        if let Some(v) = lookup("API_MAX_REQUEST_SIZE_BYTES") {
            self.server.max_request_size_bytes = v.parse().unwrap_or(self.server.max_request_size_bytes);
        }
        if let Some(v) = lookup("API_ENABLE_REQUEST_LOGGING") {
            self.server.enable_request_logging = v.parse().unwrap_or(self.server.enable_request_logging);
        }

        // Database overrides
        if let Some(v) = lookup("DATABASE_URL") {
            self.database.url = Some(v);
        }
        if let Some(v) = lookup("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Some(v) = lookup("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }

        // Security overrides
        if let Some(v) = lookup("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
        if let Some(v) = lookup("AUTH0_DOMAIN") {
            self.security.auth_domain = Some(v);
        }
        if let Some(v) = lookup("AUTH_ISSUER") {
            self.security.issuer = Some(v);
        }
        if let Some(v) = lookup("API_AUDIENCE") {
            self.security.audience = v;
        }
        if let Some(v) = lookup("AUTH_JWKS_URL") {
            self.security.jwks_url = Some(v);
        }
        if let Some(v) = lookup("AUTH_JWKS_FILE") {
            self.security.jwks_file = Some(PathBuf::from(v));
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 5000,
                max_request_size_bytes: 1024 * 1024, // 1MB
                enable_request_logging: true,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 5,
                connection_timeout: 30,
            },
            security: SecurityConfig {
                cors_origins: Vec::new(),
                auth_domain: None,
                issuer: None,
                audience: "drinks".to_string(),
                jwks_url: None,
                jwks_file: None,
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
                max_request_size_bytes: 256 * 1024,
                enable_request_logging: true,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 10,
                connection_timeout: 10,
            },
            security: SecurityConfig {
                cors_origins: vec!["https://staging.example.com".to_string()],
                auth_domain: None,
                issuer: None,
                audience: "drinks".to_string(),
                jwks_url: None,
                jwks_file: None,
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
                max_request_size_bytes: 64 * 1024,
                enable_request_logging: false,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 20,
                connection_timeout: 5,
            },
            security: SecurityConfig {
                cors_origins: vec!["https://app.example.com".to_string()],
                auth_domain: None,
                issuer: None,
                audience: "drinks".to_string(),
                jwks_url: None,
                jwks_file: None,
            },
        }
    }
}

impl DatabaseConfig {
    pub fn require_url(&self) -> Result<&str, ConfigError> {
        self.url.as_deref().ok_or(ConfigError::MissingDatabaseUrl)
    }
}

impl SecurityConfig {
    /// Expected `iss` claim. An explicit issuer wins over the one derived
    /// from the Auth0 domain.
    pub fn issuer(&self) -> Result<String, ConfigError> {
        if let Some(issuer) = &self.issuer {
            return Ok(issuer.clone());
        }
        let domain = self.auth_domain.as_deref().ok_or(ConfigError::MissingIssuer)?;
        Ok(domain_url(domain)?.to_string())
    }

    pub fn jwks_source(&self) -> Result<JwksSource, ConfigError> {
        if let Some(path) = &self.jwks_file {
            return Ok(JwksSource::File(path.clone()));
        }
        if let Some(raw) = &self.jwks_url {
            let url = Url::parse(raw).map_err(|source| ConfigError::InvalidUrl {
                field: "AUTH_JWKS_URL",
                source,
            })?;
            return Ok(JwksSource::Url(url));
        }
        let domain = self.auth_domain.as_deref().ok_or(ConfigError::MissingJwks)?;
        let url = domain_url(domain)?
            .join(".well-known/jwks.json")
            .map_err(|source| ConfigError::InvalidUrl {
                field: "AUTH0_DOMAIN",
                source,
            })?;
        Ok(JwksSource::Url(url))
    }
}

fn domain_url(domain: &str) -> Result<Url, ConfigError> {
    let domain = domain.trim_end_matches('/');
    let raw = if domain.starts_with("http://") || domain.starts_with("https://") {
        format!("{}/", domain)
    } else {
        format!("https://{}/", domain)
    };
    Url::parse(&raw).map_err(|source| ConfigError::InvalidUrl {
        field: "AUTH0_DOMAIN",
        source,
    })
}
