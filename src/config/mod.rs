use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FrontendConfig {
    pub environment: Environment,
    /// Substitute generated payloads for every data store read.
    #[serde(default)]
    pub use_fake_data: bool,
    /// Log at debug level instead of info.
    #[serde(default)]
    pub debug: bool,
    pub server: ServerConfig,
    pub session: SessionConfig,
    pub backend: BackendConfig,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    pub port: u16,
    pub static_dir: String,
    pub enable_cors: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionConfig {
    pub cookie_name: String,
    pub secret: String,
    pub max_age_hours: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BackendConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
}

impl FrontendConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    /// Loads a YAML config file; environment variables still win over file values.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;

        Self::from_yaml_str(&raw)
            .map_err(|source| ConfigError::Parse {
                path: path.display().to_string(),
                source,
            })
            .map(Self::with_env_overrides)
    }

    fn from_yaml_str(raw: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(raw)
    }

    fn with_env_overrides(mut self) -> Self {
        if let Ok(v) = env::var("USE_FAKE_DATA") {
            self.use_fake_data = v.parse().unwrap_or(self.use_fake_data);
        }
        if let Ok(v) = env::var("FRONTEND_DEBUG") {
            self.debug = v.parse().unwrap_or(self.debug);
        }

        // Server overrides
        if let Some(port) = env::var("FRONTEND_PORT")
            .ok()
            .or_else(|| env::var("PORT").ok())
            .and_then(|s| s.parse::<u16>().ok())
        {
            self.server.port = port;
        }
        if let Ok(v) = env::var("FRONTEND_STATIC_DIR") {
            self.server.static_dir = v;
        }
        if let Ok(v) = env::var("FRONTEND_ENABLE_CORS") {
            self.server.enable_cors = v.parse().unwrap_or(self.server.enable_cors);
        }

        // Session overrides
        if let Ok(v) = env::var("SESSION_COOKIE_NAME") {
            self.session.cookie_name = v;
        }
        if let Ok(v) = env::var("SESSION_SECRET") {
            self.session.secret = v;
        }
        if let Ok(v) = env::var("SESSION_MAX_AGE_HOURS") {
            self.session.max_age_hours = v.parse().unwrap_or(self.session.max_age_hours);
        }

        // Backend overrides
        if let Ok(v) = env::var("BACKEND_BASE_URL") {
            self.backend.base_url = v;
        }
        if let Ok(v) = env::var("BACKEND_TIMEOUT_SECS") {
            self.backend.timeout_secs = v.parse().unwrap_or(self.backend.timeout_secs);
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            use_fake_data: true,
            debug: true,
            server: ServerConfig {
                port: 9000,
                static_dir: "static".to_string(),
                enable_cors: true,
            },
            session: SessionConfig {
                cookie_name: "prixfixecookie".to_string(),
                secret: "development-session-secret-do-not-use".to_string(),
                max_age_hours: 24 * 7, // 1 week
            },
            backend: BackendConfig {
                base_url: "http://localhost:8888".to_string(),
                timeout_secs: 10,
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            use_fake_data: false,
            debug: true,
            server: ServerConfig {
                port: 80,
                static_dir: "/static".to_string(),
                enable_cors: false,
            },
            session: SessionConfig {
                cookie_name: "prixfixecookie".to_string(),
                secret: String::new(),
                max_age_hours: 24,
            },
            backend: BackendConfig {
                base_url: "http://api.staging.svc.cluster.local".to_string(),
                timeout_secs: 5,
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            use_fake_data: false,
            debug: false,
            server: ServerConfig {
                port: 80,
                static_dir: "/static".to_string(),
                enable_cors: false,
            },
            session: SessionConfig {
                cookie_name: "prixfixecookie".to_string(),
                secret: String::new(),
                max_age_hours: 4,
            },
            backend: BackendConfig {
                base_url: "http://api.prod.svc.cluster.local".to_string(),
                timeout_secs: 5,
            },
        }
    }
}

impl Default for FrontendConfig {
    fn default() -> Self {
        Self::development()
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<FrontendConfig> = Lazy::new(FrontendConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static FrontendConfig {
    &CONFIG
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_development_config() {
        let config = FrontendConfig::development();
        assert!(config.use_fake_data);
        assert!(config.debug);
        assert_eq!(config.server.static_dir, "static");
    }

    #[test]
    fn test_default_production_config() {
        let config = FrontendConfig::production();
        assert!(!config.use_fake_data);
        assert!(!config.debug);
        assert!(config.session.secret.is_empty());
    }

    #[test]
    fn test_yaml_config_parses() {
        let raw = r#"
environment: staging
use_fake_data: true
server:
  port: 8080
  static_dir: assets
  enable_cors: false
session:
  cookie_name: pf
  secret: hunter2
  max_age_hours: 1
backend:
  base_url: http://backend
  timeout_secs: 3
"#;
        let config = FrontendConfig::from_yaml_str(raw).unwrap();
        assert_eq!(config.environment, Environment::Staging);
        assert!(config.use_fake_data);
        assert!(!config.debug);
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.session.cookie_name, "pf");
        assert_eq!(config.backend.timeout_secs, 3);
    }
}
