//! Service configuration

use serde::Deserialize;

#[derive(Clone, Deserialize)]
pub struct Config {
    /// Address to bind
    pub bind_addr: String,

    /// Port to listen on
    pub port: u16,

    /// SQLite database file; in-memory storage when unset
    pub database_path: Option<String>,

    /// Bearer token accepted as a service admin principal
    pub admin_token: Option<String>,

    /// Admin account created at startup when missing
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

#[derive(Clone, Deserialize)]
pub struct BootstrapAdmin {
    pub email: String,
    pub password: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0".to_string(),
            port: 3000,
            database_path: None,
            admin_token: None,
            bootstrap_admin: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// - BIND_ADDR (default: 0.0.0.0)
    /// - PORT (default: 3000)
    /// - DATABASE_PATH
    /// - ADMIN_API_TOKEN
    /// - ADMIN_EMAIL and ADMIN_PASSWORD (both required to bootstrap)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|s| !s.trim().is_empty());
        let defaults = Self::default();

        let port = match get("PORT").map(|s| s.parse::<u16>()) {
            Some(Ok(port)) => port,
            Some(Err(e)) => {
                tracing::warn!(error = %e, "Ignoring invalid PORT");
                defaults.port
            }
            None => defaults.port,
        };

        let bootstrap_admin = match (get("ADMIN_EMAIL"), get("ADMIN_PASSWORD")) {
            (Some(email), Some(password)) => Some(BootstrapAdmin { email, password }),
            _ => None,
        };

        Self {
            bind_addr: get("BIND_ADDR").unwrap_or(defaults.bind_addr),
            port,
            database_path: get("DATABASE_PATH"),
            admin_token: get("ADMIN_API_TOKEN"),
            bootstrap_admin,
        }
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }
}

// Secrets stay out of logs
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("bind_addr", &self.bind_addr)
            .field("port", &self.port)
            .field("database_path", &self.database_path)
            .field("admin_token", &self.admin_token.as_ref().map(|_| "<redacted>"))
            .field(
                "bootstrap_admin",
                &self.bootstrap_admin.as_ref().map(|a| a.email.as_str()),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]);
        assert_eq!(config.listen_addr(), "0.0.0.0:3000");
        assert!(config.database_path.is_none());
        assert!(config.admin_token.is_none());
        assert!(config.bootstrap_admin.is_none());
    }

    #[test]
    fn test_reads_values() {
        let config = config_from(&[
            ("PORT", "8080"),
            ("DATABASE_PATH", "/tmp/verify.db"),
            ("ADMIN_API_TOKEN", "s3cret"),
            ("ADMIN_EMAIL", "ops@example.com"),
            ("ADMIN_PASSWORD", "longpassword"),
        ]);
        assert_eq!(config.port, 8080);
        assert_eq!(config.database_path.as_deref(), Some("/tmp/verify.db"));
        assert_eq!(config.admin_token.as_deref(), Some("s3cret"));
        assert_eq!(config.bootstrap_admin.unwrap().email, "ops@example.com");
    }

    #[test]
    fn test_invalid_port_and_blank_token_fall_back() {
        let config = config_from(&[("PORT", "not-a-port"), ("ADMIN_API_TOKEN", "  ")]);
        assert_eq!(config.port, 3000);
        assert!(config.admin_token.is_none());
    }

    #[test]
    fn test_debug_redacts_token() {
        let config = config_from(&[("ADMIN_API_TOKEN", "s3cret")]);
        let debug = format!("{:?}", config);
        assert!(!debug.contains("s3cret"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_bootstrap_needs_both_values() {
        let config = config_from(&[("ADMIN_EMAIL", "ops@example.com")]);
        assert!(config.bootstrap_admin.is_none());
    }
}
