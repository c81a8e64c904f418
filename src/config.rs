//! Configuration management for Bookshelf server

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Hosted auth/database service (GoTrue + PostgREST)
#[derive(Debug, Deserialize, Clone)]
pub struct BackendConfig {
    pub url: String,
    pub anon_key: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    /// Session cookie name; derived from the backend host when unset
    pub cookie_name: Option<String>,
    pub cookie_secure: bool,
    /// Access tokens expiring within this window are refreshed first
    pub refresh_margin_secs: i64,
    /// Sign-up is limited to these email domains (empty = any domain)
    #[serde(default)]
    pub allowed_email_domains: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RoutesConfig {
    pub protected_prefixes: Vec<String>,
    pub auth_prefixes: Vec<String>,
    pub login_path: String,
    pub dashboard_path: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub backend: BackendConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub routes: RoutesConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let config = Config::builder()
            .add_source(File::with_name("config/default"))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Environment variables (with prefix BOOKSHELF_)
            .add_source(
                Environment::with_prefix("BOOKSHELF")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("backend.url", env::var("SUPABASE_URL").ok())?
            .set_override_option("backend.anon_key", env::var("SUPABASE_ANON_KEY").ok())?
            .build()?;

        let config: Self = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the server cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.backend.url.trim().is_empty() {
            return Err(ConfigError::Message(
                "backend.url is not set (SUPABASE_URL)".to_string(),
            ));
        }
        if self.backend.anon_key.trim().is_empty() {
            return Err(ConfigError::Message(
                "backend.anon_key is not set (SUPABASE_ANON_KEY)".to_string(),
            ));
        }
        if !self.routes.login_path.starts_with('/') || !self.routes.dashboard_path.starts_with('/') {
            return Err(ConfigError::Message(
                "routes.login_path and routes.dashboard_path must be absolute paths".to_string(),
            ));
        }
        Ok(())
    }

    /// Name of the cookie holding the serialized session
    pub fn session_cookie_name(&self) -> String {
        if let Some(ref name) = self.auth.cookie_name {
            return name.clone();
        }
        format!("sb-{}-auth-token", project_ref(&self.backend.url))
    }
}

impl BackendConfig {
    /// First characters of the API key, for startup diagnostics
    pub fn masked_key(&self) -> String {
        let prefix: String = self.anon_key.chars().take(12).collect();
        format!("{}...", prefix)
    }
}

/// First label of the backend host (`https://abcd.supabase.co` -> `abcd`)
fn project_ref(url: &str) -> &str {
    let host = url
        .split("://")
        .nth(1)
        .unwrap_or(url)
        .split(['/', ':'])
        .next()
        .unwrap_or_default();
    host.split('.').next().filter(|s| !s.is_empty()).unwrap_or("local")
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:54321".to_string(),
            anon_key: String::new(),
            timeout_secs: 10,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            cookie_name: None,
            cookie_secure: false,
            refresh_margin_secs: 60,
            allowed_email_domains: Vec::new(),
        }
    }
}

impl Default for RoutesConfig {
    fn default() -> Self {
        Self {
            protected_prefixes: vec!["/dashboard".to_string()],
            auth_prefixes: vec!["/user/login".to_string(), "/user/register".to_string()],
            login_path: "/user/login".to_string(),
            dashboard_path: "/dashboard".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            backend: BackendConfig::default(),
            auth: AuthConfig::default(),
            routes: RoutesConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}
