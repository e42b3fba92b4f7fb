use std::env;
use std::ops::RangeInclusive;

/// Signing secret used when `AUTH_DEV_MODE=true` and no `JWT_SECRET` is set.
pub const DEV_JWT_SECRET: &str = "neurocare-development-secret";

/// Session lifetimes from one hour up to one year.
pub const JWT_TTL_HOURS_RANGE: RangeInclusive<i64> = 1..=8760;
/// PBKDF2 rounds accepted for new password hashes.
pub const PASSWORD_HASH_ITERATIONS_RANGE: RangeInclusive<u32> = 1_000..=10_000_000;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
    #[error("JWT_SECRET must be set unless AUTH_DEV_MODE=true")]
    MissingJwtSecret,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_ttl_hours: i64,
    pub cors_origin: Option<String>,
    pub password_hash_iterations: u32,
    pub dev_mode: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the config from any variable source; `from_env` passes the
    /// process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str, default: &str| lookup(name).unwrap_or_else(|| default.to_string());

        let dev_mode = var("AUTH_DEV_MODE", "false") == "true";
        let jwt_secret = match lookup("JWT_SECRET").filter(|s| !s.is_empty()) {
            Some(secret) => secret,
            None if dev_mode => DEV_JWT_SECRET.to_string(),
            None => return Err(ConfigError::MissingJwtSecret),
        };

        let cors_origin = lookup("CORS_ORIGIN").filter(|o| !o.is_empty());
        if let Some(origin) = &cors_origin {
            if !(origin.starts_with("http://") || origin.starts_with("https://")) {
                return Err(ConfigError::Invalid {
                    name: "CORS_ORIGIN",
                    value: origin.clone(),
                });
            }
        }

        Ok(Self {
            host: var("HOST", "127.0.0.1"),
            port: parse("PORT", var("PORT", "5000"))?,
            database_url: var("DATABASE_URL", "sqlite://neurocare.db?mode=rwc"),
            jwt_secret,
            jwt_ttl_hours: parse_in_range(
                "JWT_TTL_HOURS",
                var("JWT_TTL_HOURS", "24"),
                JWT_TTL_HOURS_RANGE,
            )?,
            cors_origin,
            password_hash_iterations: parse_in_range(
                "PASSWORD_HASH_ITERATIONS",
                var("PASSWORD_HASH_ITERATIONS", "100000"),
                PASSWORD_HASH_ITERATIONS_RANGE,
            )?,
            dev_mode,
        })
    }
}

fn parse<T: std::str::FromStr>(name: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::Invalid { name, value })
}

fn parse_in_range<T>(
    name: &'static str,
    value: String,
    range: RangeInclusive<T>,
) -> Result<T, ConfigError>
where
    T: std::str::FromStr + PartialOrd,
{
    let parsed: T = parse(name, value.clone())?;
    if range.contains(&parsed) {
        Ok(parsed)
    } else {
        Err(ConfigError::Invalid { name, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[("JWT_SECRET", "s3cret")]).unwrap();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 5000);
        assert_eq!(config.database_url, "sqlite://neurocare.db?mode=rwc");
        assert_eq!(config.jwt_ttl_hours, 24);
        assert_eq!(config.password_hash_iterations, 100_000);
        assert!(config.cors_origin.is_none());
        assert!(!config.dev_mode);
    }

    #[test]
    fn test_secret_required_outside_dev_mode() {
        assert!(matches!(config_from(&[]), Err(ConfigError::MissingJwtSecret)));

        let config = config_from(&[("AUTH_DEV_MODE", "true")]).unwrap();
        assert!(config.dev_mode);
        assert_eq!(config.jwt_secret, DEV_JWT_SECRET);
    }

    #[test]
    fn test_invalid_values_are_reported() {
        let err = config_from(&[("JWT_SECRET", "x"), ("PORT", "eighty")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "PORT", .. }));

        let err = config_from(&[("JWT_SECRET", "x"), ("CORS_ORIGIN", "example.com")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "CORS_ORIGIN", .. }));

        let config = config_from(&[("JWT_SECRET", "x"), ("CORS_ORIGIN", "https://app.example.com")])
            .unwrap();
        assert_eq!(config.cors_origin.as_deref(), Some("https://app.example.com"));
    }

    #[test]
    fn test_out_of_range_security_settings() {
        for ttl in ["0", "-5", "8761", "9223372036854775807"] {
            let err = config_from(&[("JWT_SECRET", "x"), ("JWT_TTL_HOURS", ttl)]).unwrap_err();
            assert!(
                matches!(err, ConfigError::Invalid { name: "JWT_TTL_HOURS", .. }),
                "{ttl}"
            );
        }

        for iterations in ["0", "999", "10000001"] {
            let err = config_from(&[("JWT_SECRET", "x"), ("PASSWORD_HASH_ITERATIONS", iterations)])
                .unwrap_err();
            assert!(
                matches!(err, ConfigError::Invalid { name: "PASSWORD_HASH_ITERATIONS", .. }),
                "{iterations}"
            );
        }

        let config = config_from(&[
            ("JWT_SECRET", "x"),
            ("JWT_TTL_HOURS", "8760"),
            ("PASSWORD_HASH_ITERATIONS", "1000"),
        ])
        .unwrap();
        assert_eq!(config.jwt_ttl_hours, 8760);
        assert_eq!(config.password_hash_iterations, 1000);
    }
}
