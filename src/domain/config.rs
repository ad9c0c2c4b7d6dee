//! Application configuration, read once from the environment at boot.

use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

/// Main application configuration.
///
/// The signing secret is intentionally optional: its absence is reported
/// per-request as a JWT_SECRET_MISSING failure, never at boot, since token
/// routes may be unused in a given deployment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// HTTP bind port (default: 3001).
    pub port: u16,
    /// Document store connection string.
    pub mongodb_uri: String,
    /// Document store database name (default: "defaultdb").
    pub mongodb_db_name: String,
    /// HS256 signing secret for the local token scheme.
    pub jwt_secret: Option<String>,
    /// Identity provider credentials; None disables the provider scheme.
    pub identity: Option<IdentityConfig>,
    /// Development mode: failure responses may carry raw driver detail.
    pub development: bool,
    /// Log every request/response pair.
    pub debug_requests: bool,
}

/// Identity provider credentials.
#[derive(Debug, Clone)]
pub struct IdentityConfig {
    pub project_id: String,
    pub api_key: String,
    pub verify_url: String,
}

impl AppConfig {
    /// Read configuration from the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mongodb_uri = env::var("MONGODB_URI")
            .map_err(|_| ConfigError::MissingVar("MONGODB_URI"))?;

        let port = match env::var("PORT") {
            Ok(raw) => raw
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidVar("PORT", raw))?,
            Err(_) => 3001,
        };

        let identity = match (
            env::var("IDENTITY_PROJECT_ID"),
            env::var("IDENTITY_API_KEY"),
            env::var("IDENTITY_VERIFY_URL"),
        ) {
            (Ok(project_id), Ok(api_key), Ok(verify_url)) => Some(IdentityConfig {
                project_id,
                api_key,
                verify_url,
            }),
            _ => None,
        };

        let config = Self {
            port,
            mongodb_uri,
            mongodb_db_name: env::var("MONGODB_DB_NAME")
                .unwrap_or_else(|_| "defaultdb".to_string()),
            jwt_secret: env::var("JWT_SECRET").ok().filter(|s| !s.is_empty()),
            identity,
            development: env::var("APP_ENV")
                .map(|v| v == "development")
                .unwrap_or(false),
            debug_requests: env::var("DEBUG_REQUESTS")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.mongodb_uri.is_empty() {
            return Err(ConfigError::MissingVar("MONGODB_URI"));
        }
        if self.mongodb_db_name.is_empty() {
            return Err(ConfigError::InvalidVar(
                "MONGODB_DB_NAME",
                self.mongodb_db_name.clone(),
            ));
        }
        if let Some(identity) = &self.identity {
            if !identity.verify_url.starts_with("http://")
                && !identity.verify_url.starts_with("https://")
            {
                return Err(ConfigError::InvalidVar(
                    "IDENTITY_VERIFY_URL",
                    identity.verify_url.clone(),
                ));
            }
        }
        Ok(())
    }

    /// HTTP bind address.
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), self.port)
    }
}

/// Configuration errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    /// A required environment variable is absent.
    #[error("missing environment variable: {0}")]
    MissingVar(&'static str),
    /// An environment variable holds an unusable value.
    #[error("invalid value for {0}: {1}")]
    InvalidVar(&'static str, String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> AppConfig {
        AppConfig {
            port: 3001,
            mongodb_uri: "mongodb://localhost:27017".to_string(),
            mongodb_db_name: "testdb".to_string(),
            jwt_secret: Some("secret".to_string()),
            identity: None,
            development: false,
            debug_requests: false,
        }
    }

    #[test]
    fn test_valid_config() {
        assert!(test_config().validate().is_ok());
    }

    #[test]
    fn test_empty_db_name_rejected() {
        let mut config = test_config();
        config.mongodb_db_name = String::new();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidVar("MONGODB_DB_NAME", _))
        ));
    }

    #[test]
    fn test_identity_url_scheme_checked() {
        let mut config = test_config();
        config.identity = Some(IdentityConfig {
            project_id: "proj".to_string(),
            api_key: "key".to_string(),
            verify_url: "ftp://auth.example.com".to_string(),
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bind_addr_uses_port() {
        assert_eq!(test_config().bind_addr().port(), 3001);
    }
}
