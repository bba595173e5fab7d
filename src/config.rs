use std::time::Duration;

use anyhow::{ensure, Context};

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub db_max_connections: u32,
    /// Products with `stock` strictly below this are reported by the scan.
    pub low_stock_threshold: i32,
    pub low_stock_interval: Duration,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let interval_secs: u64 = lookup("LOW_STOCK_INTERVAL_SECS")
            .unwrap_or_else(|| "300".to_string())
            .parse()
            .context("LOW_STOCK_INTERVAL_SECS must be a valid number of seconds")?;
        ensure!(interval_secs > 0, "LOW_STOCK_INTERVAL_SECS must be greater than zero");

        Ok(Self {
            database_url: lookup("DATABASE_URL").context("DATABASE_URL must be set")?,
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: lookup("PORT")
                .unwrap_or_else(|| "8000".to_string())
                .parse()
                .context("PORT must be a valid number")?,
            db_max_connections: lookup("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|| "20".to_string())
                .parse()
                .context("DB_MAX_CONNECTIONS must be a valid number")?,
            low_stock_threshold: lookup("LOW_STOCK_THRESHOLD")
                .unwrap_or_else(|| "10".to_string())
                .parse()
                .context("LOW_STOCK_THRESHOLD must be a valid integer")?,
            low_stock_interval: Duration::from_secs(interval_secs),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_with(vars: &[(&str, &str)]) -> anyhow::Result<Config> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_only_database_url_is_set() {
        let config = config_with(&[("DATABASE_URL", "postgres://localhost/inventory_db")]).unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8000);
        assert_eq!(config.db_max_connections, 20);
        assert_eq!(config.low_stock_threshold, 10);
        assert_eq!(config.low_stock_interval, Duration::from_secs(300));
    }

    #[test]
    fn missing_database_url_is_an_error() {
        let err = config_with(&[]).unwrap_err();
        assert!(err.to_string().contains("DATABASE_URL"));
    }

    #[test]
    fn overrides_are_parsed() {
        let config = config_with(&[
            ("DATABASE_URL", "postgres://db/inv"),
            ("PORT", "9000"),
            ("LOW_STOCK_THRESHOLD", "3"),
            ("LOW_STOCK_INTERVAL_SECS", "60"),
        ])
        .unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.low_stock_threshold, 3);
        assert_eq!(config.low_stock_interval, Duration::from_secs(60));
    }

    #[test]
    fn zero_interval_is_rejected() {
        assert!(config_with(&[("DATABASE_URL", "x"), ("LOW_STOCK_INTERVAL_SECS", "0")]).is_err());
    }

    #[test]
    fn bad_port_is_rejected() {
        assert!(config_with(&[("DATABASE_URL", "x"), ("PORT", "eighty")]).is_err());
    }
}
