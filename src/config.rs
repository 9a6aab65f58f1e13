use crate::location::cache::DEFAULT_TTL;
use crate::location::providers::{BRASILAPI_URL, DEFAULT_USER_AGENT, NOMINATIM_URL, VIACEP_URL};
use crate::zones::DEFAULT_TARGET_CITY;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    // Upstream services
    pub brasilapi_url: String,
    pub viacep_url: String,
    pub nominatim_url: String,
    pub user_agent: String,

    // Timeouts and cache
    pub lookup_timeout_secs: u64,
    pub geocode_timeout_secs: u64,
    pub cache_ttl_secs: u64,

    // Classification
    pub target_city: String,

    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            brasilapi_url: BRASILAPI_URL.to_string(),
            viacep_url: VIACEP_URL.to_string(),
            nominatim_url: NOMINATIM_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            lookup_timeout_secs: 5,
            geocode_timeout_secs: 10,
            cache_ttl_secs: DEFAULT_TTL.as_secs(),
            target_city: DEFAULT_TARGET_CITY.to_string(),
            debug: false,
        }
    }
}

impl Config {
    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_secs(self.lookup_timeout_secs)
    }

    pub fn geocode_timeout(&self) -> Duration {
        Duration::from_secs(self.geocode_timeout_secs)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

fn env_string(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn env_secs(name: &str, default: u64) -> u64 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

pub fn load_config() -> anyhow::Result<Config> {
    let defaults = Config::default();

    let brasilapi_url = env_string("CEPZONES_BRASILAPI_URL", &defaults.brasilapi_url);
    let viacep_url = env_string("CEPZONES_VIACEP_URL", &defaults.viacep_url);
    let nominatim_url = env_string("CEPZONES_NOMINATIM_URL", &defaults.nominatim_url);
    let user_agent = env_string("CEPZONES_USER_AGENT", &defaults.user_agent);

    let lookup_timeout_secs =
        env_secs("CEPZONES_LOOKUP_TIMEOUT_SECS", defaults.lookup_timeout_secs);
    let geocode_timeout_secs =
        env_secs("CEPZONES_GEOCODE_TIMEOUT_SECS", defaults.geocode_timeout_secs);
    let cache_ttl_secs = env_secs("CEPZONES_CACHE_TTL_SECS", defaults.cache_ttl_secs);

    let target_city = env_string("CEPZONES_TARGET_CITY", &defaults.target_city);
    if target_city.trim().is_empty() {
        anyhow::bail!("CEPZONES_TARGET_CITY must not be empty");
    }

    let debug = std::env::var("DEBUG").is_ok();

    Ok(Config {
        brasilapi_url,
        viacep_url,
        nominatim_url,
        user_agent,
        lookup_timeout_secs,
        geocode_timeout_secs,
        cache_ttl_secs,
        target_city,
        debug,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = Config::default();
        assert_eq!(cfg.brasilapi_url, "https://brasilapi.com.br");
        assert_eq!(cfg.lookup_timeout(), Duration::from_secs(5));
        assert_eq!(cfg.geocode_timeout(), Duration::from_secs(10));
        assert_eq!(cfg.cache_ttl(), Duration::from_secs(3600));
        assert_eq!(cfg.target_city, "São Paulo");
        assert!(!cfg.debug);
    }

    #[test]
    fn test_env_secs_fallback() {
        std::env::set_var("CEPZONES_TEST_SECS_BAD", "soon");
        std::env::set_var("CEPZONES_TEST_SECS_GOOD", " 42 ");
        assert_eq!(env_secs("CEPZONES_TEST_SECS_BAD", 7), 7);
        assert_eq!(env_secs("CEPZONES_TEST_SECS_GOOD", 7), 42);
        assert_eq!(env_secs("CEPZONES_TEST_SECS_UNSET", 7), 7);
    }

    #[test]
    fn test_env_string_fallback() {
        assert_eq!(env_string("CEPZONES_TEST_UNSET_URL", "http://x"), "http://x");
    }
}
