use std::{env, str::FromStr};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{key} has an invalid value: {value}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,
    pub token_ttl_hours: u64,

    // Rate limiting
    pub rate_login_per_min: u32,
    pub rate_protected_per_min: u32,

    pub api_prefix: String,
    pub log_dir: String,

    // First admin, created when missing
    pub admin_username: String,
    pub admin_password: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup; `from_env` passes the process
    /// environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let or = |key: &str, default: &str| var(key).unwrap_or_else(|| default.to_string());

        let port: u16 = parse(&var, "PORT", 8080)?;
        let server_addr = or("SERVER_ADDR", &format!("0.0.0.0:{port}"));

        let database_url = match var("DATABASE_URL") {
            Some(url) => url,
            None => {
                let db_port: u16 = parse(&var, "DB_PORT", 3306)?;
                let user = or("DB_USER", "root");
                let credentials = match var("DB_PASSWORD") {
                    Some(password) => format!("{user}:{password}"),
                    None => user,
                };
                format!(
                    "mysql://{credentials}@{}:{db_port}/{}",
                    or("DB_HOST", "localhost"),
                    or("DB_NAME", "attendance"),
                )
            }
        };

        let jwt_secret = var("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?;

        let token_ttl_hours: u64 = parse(&var, "JWT_EXPIRES_HOURS", 24)?;
        if token_ttl_hours == 0 {
            return Err(ConfigError::Invalid {
                key: "JWT_EXPIRES_HOURS",
                value: "0".into(),
            });
        }

        let rate_login_per_min: u32 = parse(&var, "RATE_LOGIN_PER_MIN", 60)?;
        let rate_protected_per_min: u32 = parse(&var, "RATE_PROTECTED_PER_MIN", 1000)?;
        for (key, rate) in [
            ("RATE_LOGIN_PER_MIN", rate_login_per_min),
            ("RATE_PROTECTED_PER_MIN", rate_protected_per_min),
        ] {
            if rate == 0 {
                return Err(ConfigError::Invalid {
                    key,
                    value: rate.to_string(),
                });
            }
        }

        let mut api_prefix = or("API_PREFIX", "/api");
        if !api_prefix.starts_with('/') {
            api_prefix.insert(0, '/');
        }
        let api_prefix = api_prefix.trim_end_matches('/').to_string();

        Ok(Self {
            database_url,
            jwt_secret,
            server_addr,
            token_ttl_hours,
            rate_login_per_min,
            rate_protected_per_min,
            api_prefix,
            log_dir: or("LOG_DIR", "logs"),
            admin_username: or("ADMIN_USERNAME", "admin"),
            admin_password: or("ADMIN_PASSWORD", "admin123"),
        })
    }
}

fn parse<T, F>(var: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match var(key) {
        Some(raw) => match raw.trim().parse() {
            Ok(value) => Ok(value),
            Err(_) => Err(ConfigError::Invalid { key, value: raw }),
        },
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_only_secret_is_set() {
        let config = Config::from_lookup(lookup(&[("JWT_SECRET", "s")])).unwrap();

        assert_eq!(config.server_addr, "0.0.0.0:8080");
        assert_eq!(config.database_url, "mysql://root@localhost:3306/attendance");
        assert_eq!(config.token_ttl_hours, 24);
        assert_eq!(config.rate_login_per_min, 60);
        assert_eq!(config.rate_protected_per_min, 1000);
        assert_eq!(config.api_prefix, "/api");
        assert_eq!(config.log_dir, "logs");
        assert_eq!(config.admin_username, "admin");
        assert_eq!(config.admin_password, "admin123");
    }

    #[test]
    fn database_url_is_composed_from_parts() {
        let config = Config::from_lookup(lookup(&[
            ("JWT_SECRET", "s"),
            ("DB_HOST", "db"),
            ("DB_PORT", "3307"),
            ("DB_NAME", "hr"),
            ("DB_USER", "app"),
            ("DB_PASSWORD", "pw"),
            ("PORT", "9000"),
        ]))
        .unwrap();

        assert_eq!(config.database_url, "mysql://app:pw@db:3307/hr");
        assert_eq!(config.server_addr, "0.0.0.0:9000");
    }

    #[test]
    fn explicit_values_win() {
        let config = Config::from_lookup(lookup(&[
            ("JWT_SECRET", "s"),
            ("DATABASE_URL", "mysql://u@h/d"),
            ("SERVER_ADDR", "127.0.0.1:1234"),
            ("API_PREFIX", "v1/"),
        ]))
        .unwrap();

        assert_eq!(config.database_url, "mysql://u@h/d");
        assert_eq!(config.server_addr, "127.0.0.1:1234");
        assert_eq!(config.api_prefix, "/v1");
    }

    #[test]
    fn missing_secret_is_an_error() {
        let err = Config::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("JWT_SECRET")));
    }

    #[test]
    fn unparsable_numbers_are_errors() {
        let err = Config::from_lookup(lookup(&[("JWT_SECRET", "s"), ("JWT_EXPIRES_HOURS", "soon")]))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                key: "JWT_EXPIRES_HOURS",
                ..
            }
        ));

        let err = Config::from_lookup(lookup(&[("JWT_SECRET", "s"), ("RATE_LOGIN_PER_MIN", "0")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }
}
