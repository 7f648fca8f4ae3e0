//! Configuration loading and representation.
//!
//! Everything comes from environment variables. Missing required variables are
//! reported together so a misconfigured deployment fails once, not one variable
//! at a time.

use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;

use stockroom_inventory::LOW_STOCK_THRESHOLD;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_IDENTITY_TIMEOUT_MS: u64 = 5_000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variables: {}", .0.join(", "))]
    Missing(Vec<&'static str>),

    #[error("invalid value for {name}: '{value}' ({reason})")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Which identity provider backs token verification.
#[derive(Clone, PartialEq, Eq)]
pub enum IdentityConfig {
    Supabase { url: String, service_role_key: String },
    /// Process-local provider with no registered users; for development only.
    InMemory,
}

impl core::fmt::Debug for IdentityConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            IdentityConfig::Supabase { url, .. } => f
                .debug_struct("Supabase")
                .field("url", url)
                .field("service_role_key", &"<redacted>")
                .finish(),
            IdentityConfig::InMemory => f.write_str("InMemory"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub bind_addr: SocketAddr,
    /// `None` selects the in-memory stores.
    pub database_url: Option<String>,
    pub identity: IdentityConfig,
    pub identity_timeout: Duration,
    pub low_stock_threshold: i64,
    pub frontend_url: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let bind_raw = get("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw.parse().map_err(|e: std::net::AddrParseError| ConfigError::Invalid {
            name: "BIND_ADDR",
            value: bind_raw.clone(),
            reason: e.to_string(),
        })?;

        let identity = match get("IDENTITY_PROVIDER").as_deref() {
            Some("memory") => IdentityConfig::InMemory,
            None | Some("supabase") => {
                let url = get("SUPABASE_URL");
                let key = get("SUPABASE_SERVICE_ROLE_KEY");
                match (url, key) {
                    (Some(url), Some(service_role_key)) => IdentityConfig::Supabase {
                        url: url.trim_end_matches('/').to_string(),
                        service_role_key,
                    },
                    (url, key) => {
                        let mut missing = Vec::new();
                        if url.is_none() {
                            missing.push("SUPABASE_URL");
                        }
                        if key.is_none() {
                            missing.push("SUPABASE_SERVICE_ROLE_KEY");
                        }
                        return Err(ConfigError::Missing(missing));
                    }
                }
            }
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: "IDENTITY_PROVIDER",
                    value: other.to_string(),
                    reason: "expected 'supabase' or 'memory'".to_string(),
                });
            }
        };

        let timeout_ms = parse_number("IDENTITY_TIMEOUT_MS", get("IDENTITY_TIMEOUT_MS"), DEFAULT_IDENTITY_TIMEOUT_MS)?;
        if timeout_ms == 0 {
            return Err(ConfigError::Invalid {
                name: "IDENTITY_TIMEOUT_MS",
                value: "0".to_string(),
                reason: "must be positive".to_string(),
            });
        }

        let low_stock_threshold = parse_number("LOW_STOCK_THRESHOLD", get("LOW_STOCK_THRESHOLD"), LOW_STOCK_THRESHOLD)?;

        Ok(Self {
            bind_addr,
            database_url: get("DATABASE_URL"),
            identity,
            identity_timeout: Duration::from_millis(timeout_ms),
            low_stock_threshold,
            frontend_url: get("FRONTEND_URL"),
        })
    }
}

fn parse_number<T>(name: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: core::str::FromStr,
    T::Err: core::fmt::Display,
{
    match raw {
        None => Ok(default),
        Some(value) => value.parse().map_err(|e: T::Err| ConfigError::Invalid {
            name,
            reason: e.to_string(),
            value,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let map: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Config::from_lookup(|name| map.get(name).cloned())
    }

    #[test]
    fn defaults_with_memory_identity() {
        let cfg = load(&[("IDENTITY_PROVIDER", "memory")]).unwrap();
        assert_eq!(cfg.bind_addr.to_string(), "0.0.0.0:8080");
        assert_eq!(cfg.identity, IdentityConfig::InMemory);
        assert_eq!(cfg.identity_timeout, Duration::from_millis(5_000));
        assert_eq!(cfg.low_stock_threshold, 10);
        assert!(cfg.database_url.is_none());
    }

    #[test]
    fn missing_supabase_variables_are_listed_together() {
        let err = load(&[]).unwrap_err();
        assert_eq!(err, ConfigError::Missing(vec!["SUPABASE_URL", "SUPABASE_SERVICE_ROLE_KEY"]));
        assert_eq!(
            err.to_string(),
            "missing required environment variables: SUPABASE_URL, SUPABASE_SERVICE_ROLE_KEY"
        );
    }

    #[test]
    fn supabase_url_is_normalised_and_key_redacted() {
        let cfg = load(&[
            ("SUPABASE_URL", "https://abc.supabase.co/"),
            ("SUPABASE_SERVICE_ROLE_KEY", "secret-key"),
            ("DATABASE_URL", "postgres://localhost/stockroom"),
            ("LOW_STOCK_THRESHOLD", "25"),
        ])
        .unwrap();

        assert_eq!(
            cfg.identity,
            IdentityConfig::Supabase {
                url: "https://abc.supabase.co".to_string(),
                service_role_key: "secret-key".to_string(),
            }
        );
        assert_eq!(cfg.low_stock_threshold, 25);
        assert!(!format!("{cfg:?}").contains("secret-key"));
    }

    #[test]
    fn bad_numbers_are_rejected() {
        assert!(matches!(
            load(&[("IDENTITY_PROVIDER", "memory"), ("IDENTITY_TIMEOUT_MS", "soon")]),
            Err(ConfigError::Invalid { name: "IDENTITY_TIMEOUT_MS", .. })
        ));
        assert!(matches!(
            load(&[("IDENTITY_PROVIDER", "memory"), ("BIND_ADDR", "nowhere")]),
            Err(ConfigError::Invalid { name: "BIND_ADDR", .. })
        ));
        assert!(matches!(
            load(&[("IDENTITY_PROVIDER", "ldap")]),
            Err(ConfigError::Invalid { name: "IDENTITY_PROVIDER", .. })
        ));
    }
}
