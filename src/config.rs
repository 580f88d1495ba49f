const DEV_SECRET_KEY: &str = "dev-insecure-secret-change-me";
/// One hundred years.
pub const MAX_TTL_MINUTES: i64 = 525_600 * 100;

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub connect_timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub allowed_origins: Vec<String>,
    pub host: String,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let url = lookup("DATABASE_URL")
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| anyhow::anyhow!("DATABASE_URL is not set"))?;

        let production = lookup("APP_ENV")
            .map(|v| v.eq_ignore_ascii_case("production"))
            .unwrap_or(false);

        let secret = match lookup("SECRET_KEY").filter(|v| !v.is_empty()) {
            Some(s) => s,
            None if production => anyhow::bail!("SECRET_KEY must be set when APP_ENV=production"),
            None => {
                tracing::warn!("SECRET_KEY not set; using insecure development secret");
                DEV_SECRET_KEY.to_string()
            }
        };

        let ttl_minutes = parse_or(&lookup, "ACCESS_TOKEN_EXPIRE_MINUTES", 60i64)?;
        anyhow::ensure!(ttl_minutes > 0, "ACCESS_TOKEN_EXPIRE_MINUTES must be positive");
        anyhow::ensure!(
            ttl_minutes <= MAX_TTL_MINUTES,
            "ACCESS_TOKEN_EXPIRE_MINUTES must be at most {}",
            MAX_TTL_MINUTES
        );

        let allowed_origins = lookup("ALLOWED_ORIGINS")
            .unwrap_or_else(|| "http://localhost:3000".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(Self {
            database: DatabaseConfig {
                url,
                max_connections: parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 10u32)?,
                connect_timeout_secs: parse_or(&lookup, "DATABASE_CONNECT_TIMEOUT_SECS", 10u64)?,
            },
            jwt: JwtConfig {
                secret,
                ttl_minutes,
            },
            allowed_origins,
            host: lookup("APP_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: parse_or(&lookup, "APP_PORT", 8080u16)?,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("invalid {key}={raw:?}: {e}")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> anyhow::Result<AppConfig> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|k| env.get(k).cloned())
    }

    #[test]
    fn database_url_is_required() {
        let err = load(&[("SECRET_KEY", "s")]).unwrap_err();
        assert!(err.to_string().contains("DATABASE_URL"));
    }

    #[test]
    fn defaults_apply() {
        let cfg = load(&[("DATABASE_URL", "postgres://x"), ("SECRET_KEY", "s")]).unwrap();
        assert_eq!(cfg.jwt.ttl_minutes, 60);
        assert_eq!(cfg.allowed_origins, vec!["http://localhost:3000".to_string()]);
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.database.max_connections, 10);
    }

    #[test]
    fn origins_are_split_and_trimmed() {
        let cfg = load(&[
            ("DATABASE_URL", "postgres://x"),
            ("ALLOWED_ORIGINS", "http://a.test, http://b.test ,"),
        ])
        .unwrap();
        assert_eq!(cfg.allowed_origins, vec!["http://a.test", "http://b.test"]);
    }

    #[test]
    fn missing_secret_falls_back_outside_production() {
        let cfg = load(&[("DATABASE_URL", "postgres://x")]).unwrap();
        assert_eq!(cfg.jwt.secret, DEV_SECRET_KEY);
    }

    #[test]
    fn missing_secret_is_fatal_in_production() {
        let err = load(&[("DATABASE_URL", "postgres://x"), ("APP_ENV", "production")]).unwrap_err();
        assert!(err.to_string().contains("SECRET_KEY"));
    }

    #[test]
    fn rejects_bad_ttl() {
        assert!(load(&[("DATABASE_URL", "postgres://x"), ("ACCESS_TOKEN_EXPIRE_MINUTES", "abc")]).is_err());
        assert!(load(&[("DATABASE_URL", "postgres://x"), ("ACCESS_TOKEN_EXPIRE_MINUTES", "0")]).is_err());
    }

    #[test]
    fn ttl_has_upper_bound() {
        let err = load(&[
            ("DATABASE_URL", "postgres://x"),
            ("ACCESS_TOKEN_EXPIRE_MINUTES", "10000000000"),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("at most"));

        let max = MAX_TTL_MINUTES.to_string();
        let cfg = load(&[("DATABASE_URL", "postgres://x"), ("ACCESS_TOKEN_EXPIRE_MINUTES", &max)]).unwrap();
        assert_eq!(cfg.jwt.ttl_minutes, MAX_TTL_MINUTES);
    }
}
