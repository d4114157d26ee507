use crate::error::{Error, Result};
use std::str::FromStr;
use std::time::Duration;

pub const CAPACITY_VAR: &str = "RXCACHE_CAPACITY";
pub const DEFAULT_TTL_VAR: &str = "RXCACHE_DEFAULT_TTL_SECS";
pub const LOG_LOCATION_VAR: &str = "RXCACHE_LOG_LOCATION";

const DEFAULT_CAPACITY: u64 = 10_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    pub capacity:    u64,
    /// `None` means entries written with the default expiry never expire.
    pub default_ttl: Option<Duration>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity:    DEFAULT_CAPACITY,
            default_ttl: None,
        }
    }
}

impl CacheConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let capacity = parse_var(&lookup, CAPACITY_VAR)?.unwrap_or(DEFAULT_CAPACITY);
        let default_ttl = match parse_var::<u64, _>(&lookup, DEFAULT_TTL_VAR)? {
            None | Some(0) => None,
            Some(secs) => Some(Duration::from_secs(secs)),
        };
        Ok(Self {
            capacity,
            default_ttl,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Annotate log lines with file and line number.
    pub location: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            location: cfg!(debug_assertions),
        }
    }
}

impl LogConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let location = parse_var(&lookup, LOG_LOCATION_VAR)?.unwrap_or(cfg!(debug_assertions));
        Ok(Self { location })
    }
}

fn parse_var<T, F>(lookup: &F, name: &'static str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e: T::Err| Error::InvalidConfig(name, format!("{raw:?}: {e}").into())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = CacheConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, CacheConfig::default());
    }

    #[test]
    fn test_reads_capacity_and_ttl() {
        let config = CacheConfig::from_lookup(lookup(&[
            (CAPACITY_VAR, "250"),
            (DEFAULT_TTL_VAR, " 30 "),
        ]))
        .unwrap();
        assert_eq!(config.capacity, 250);
        assert_eq!(config.default_ttl, Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_zero_ttl_means_never() {
        let config = CacheConfig::from_lookup(lookup(&[(DEFAULT_TTL_VAR, "0")])).unwrap();
        assert_eq!(config.default_ttl, None);
    }

    #[test]
    fn test_rejects_garbage() {
        let err = CacheConfig::from_lookup(lookup(&[(CAPACITY_VAR, "lots")])).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(CAPACITY_VAR, _)));

        let err = LogConfig::from_lookup(lookup(&[(LOG_LOCATION_VAR, "maybe")])).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(LOG_LOCATION_VAR, _)));
    }

    #[test]
    fn test_log_location_flag() {
        let config = LogConfig::from_lookup(lookup(&[(LOG_LOCATION_VAR, "true")])).unwrap();
        assert!(config.location);
    }
}
