use embassy_time::Duration;
use heapless::String;

use crate::text::truncate_into;

// Upstream hosts
pub const API_HOST: &str = "api.openweathermap.org";
pub const GEO_HOST: &str = "api.openweathermap.org";
pub const HTTP_PORT: u16 = 80;
pub const HTTPS_PORT: u16 = 443;

// Timing
pub const DEFAULT_CACHE_DURATION: Duration = Duration::from_secs(60);
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
/// How long the transport sleeps between readiness polls.
pub const POLL_INTERVAL: Duration = Duration::from_millis(2);

// Setting capacities
pub const API_KEY_MAX: usize = 47;
pub const LANGUAGE_MAX: usize = 7;

/// Unit system requested from the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Units {
    /// Kelvin, meter/sec.
    Standard,
    /// Celsius, meter/sec.
    #[default]
    Metric,
    /// Fahrenheit, miles/hour.
    Imperial,
}

impl Units {
    /// Value of the `units` query parameter, `None` for the API default.
    pub fn as_query(&self) -> Option<&'static str> {
        match self {
            Units::Standard => None,
            Units::Metric => Some("metric"),
            Units::Imperial => Some("imperial"),
        }
    }
}

/// Everything a client needs to know to talk to the API.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_key: String<API_KEY_MAX>,
    pub use_https: bool,
    pub units: Units,
    pub language: String<LANGUAGE_MAX>,
    pub debug: bool,
    /// Zero disables the current-weather cache.
    pub cache_duration: Duration,
    /// Budget for one complete request, connect through last byte.
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(api_key: &str) -> Self {
        Self {
            api_key: truncate_into(api_key),
            ..Self::default()
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            use_https: false,
            units: Units::default(),
            language: truncate_into("en"),
            debug: false,
            cache_duration: DEFAULT_CACHE_DURATION,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_upstream_library() {
        let config = ClientConfig::new("secret");
        assert_eq!(config.api_key, "secret");
        assert_eq!(config.units, Units::Metric);
        assert_eq!(config.language, "en");
        assert!(!config.use_https);
        assert_eq!(config.cache_duration, Duration::from_secs(60));
        assert_eq!(config.timeout, Duration::from_secs(10));
    }

    #[test]
    fn oversized_api_key_is_truncated() {
        let key = "0123456789abcdef0123456789abcdef0123456789abcdef0123";
        let config = ClientConfig::new(key);
        assert_eq!(config.api_key.len(), API_KEY_MAX);
        assert!(key.starts_with(config.api_key.as_str()));
    }

    #[test]
    fn units_query_values() {
        assert_eq!(Units::Standard.as_query(), None);
        assert_eq!(Units::Metric.as_query(), Some("metric"));
        assert_eq!(Units::Imperial.as_query(), Some("imperial"));
    }
}
