use std::env;
use std::time::Duration;

use chrono_tz::Tz;

pub const DEFAULT_TIMEZONE: &str = "America/Fortaleza";
pub const DEFAULT_PROVIDER_BASE_URL: &str = "https://api.mercadopago.com";

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub default_timezone: Tz,
    pub mp_access_token: Option<String>,
    pub mp_webhook_url: Option<String>,
    pub mp_api_base_url: String,
    pub payment_timeout: Duration,
    pub hold_sweep_interval: Duration,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup. Panics on
    /// malformed or missing required values: a bad configuration must stop
    /// the process before it serves anything.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            database_url: non_empty("DATABASE_URL").expect("DATABASE_URL must be set"),
            port: non_empty("PORT").unwrap_or_else(|| "3000".to_string()).parse().expect("PORT must be a number"),
            default_timezone: non_empty("DEFAULT_TIMEZONE")
                .unwrap_or_else(|| DEFAULT_TIMEZONE.to_string())
                .parse()
                .expect("DEFAULT_TIMEZONE must be a valid IANA time zone"),
            mp_access_token: non_empty("MP_ACCESS_TOKEN"),
            mp_webhook_url: non_empty("MP_WEBHOOK_URL"),
            mp_api_base_url: non_empty("MP_API_BASE_URL")
                .unwrap_or_else(|| DEFAULT_PROVIDER_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            payment_timeout: Duration::from_secs(
                non_empty("PAYMENT_TIMEOUT_SECS").map_or(10, |v| v.parse().expect("PAYMENT_TIMEOUT_SECS must be a number")),
            ),
            hold_sweep_interval: Duration::from_secs(
                non_empty("HOLD_SWEEP_INTERVAL_SECS").map_or(60, |v| v.parse().expect("HOLD_SWEEP_INTERVAL_SECS must be a number")),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_only_database_url_is_set() {
        let config = Config::from_lookup(lookup_from(&[("DATABASE_URL", "sqlite://test.db")]));
        assert_eq!(config.port, 3000);
        assert_eq!(config.default_timezone, chrono_tz::America::Fortaleza);
        assert!(config.mp_access_token.is_none());
        assert_eq!(config.mp_api_base_url, DEFAULT_PROVIDER_BASE_URL);
        assert_eq!(config.payment_timeout, Duration::from_secs(10));
        assert_eq!(config.hold_sweep_interval, Duration::from_secs(60));
    }

    #[test]
    fn blank_credential_counts_as_missing() {
        let config = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "sqlite://test.db"),
            ("MP_ACCESS_TOKEN", "   "),
            ("MP_API_BASE_URL", "http://localhost:9999/"),
        ]));
        assert!(config.mp_access_token.is_none());
        assert_eq!(config.mp_api_base_url, "http://localhost:9999");
    }

    #[test]
    #[should_panic(expected = "DATABASE_URL must be set")]
    fn missing_database_url_is_fatal() {
        Config::from_lookup(lookup_from(&[]));
    }

    #[test]
    #[should_panic(expected = "DEFAULT_TIMEZONE")]
    fn invalid_default_timezone_is_fatal() {
        Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "sqlite://test.db"),
            ("DEFAULT_TIMEZONE", "Mars/Olympus_Mons"),
        ]));
    }
}
