use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::types::{AppError, Result};

/// Crate configuration, loaded from the environment (with `.env`
/// support) and falling back to sensible defaults everywhere.
#[derive(Debug, Clone)]
pub struct Config {
    pub cache: CacheSettings,
    pub openalex: OpenAlexSettings,
    pub arxiv: ArxivSettings,
    pub search: SearchSettings,
}

#[derive(Debug, Clone)]
pub struct CacheSettings {
    /// Root directory for the per-source cache namespaces.
    pub dir: PathBuf,
}

#[derive(Debug, Clone)]
pub struct OpenAlexSettings {
    pub base_url: String,
    /// Polite-pool contact address sent as the user agent.
    pub mailto: String,
    pub requests_per_minute: u32,
}

#[derive(Debug, Clone)]
pub struct ArxivSettings {
    pub base_url: String,
    pub requests_per_minute: u32,
}

#[derive(Debug, Clone)]
pub struct SearchSettings {
    /// Papers requested per search.
    pub result_limit: usize,
    /// Per-request HTTP timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Config {
            cache: CacheSettings {
                dir: PathBuf::from(env_or("CACHE_DIR", "results/cache/api")),
            },
            openalex: OpenAlexSettings {
                base_url: env_or("OPENALEX_BASE_URL", "https://api.openalex.org/works"),
                mailto: env_or("OPENALEX_MAILTO", "contact@example.org"),
                requests_per_minute: env_parse("OPENALEX_RPM", 100)?,
            },
            arxiv: ArxivSettings {
                base_url: env_or("ARXIV_BASE_URL", "https://export.arxiv.org/api/query"),
                requests_per_minute: env_parse("ARXIV_RPM", 20)?,
            },
            search: SearchSettings {
                result_limit: env_parse("SEARCH_RESULT_LIMIT", 10)?,
                request_timeout_secs: env_parse("SEARCH_TIMEOUT_SECS", 10)?,
            },
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: FromStr>(key: &str, default: T) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse()
            .map_err(|e| AppError::Config(format!("Invalid value for {}: {}", key, e))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_parse_default() {
        assert_eq!(env_parse("PAPERSCOUT_TEST_UNSET", 42u32).unwrap(), 42);
    }

    #[test]
    fn test_env_parse_invalid_value() {
        env::set_var("PAPERSCOUT_TEST_BAD_U32", "not a number");
        let result: Result<u32> = env_parse("PAPERSCOUT_TEST_BAD_U32", 1);
        assert!(matches!(result, Err(AppError::Config(_))));
        env::remove_var("PAPERSCOUT_TEST_BAD_U32");
    }
}
