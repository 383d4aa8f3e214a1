//! Request paths for every endpoint.
//!
//! Builders never fail: a path that outgrows [`PATH_CAPACITY`] is cut short
//! (and logged), which the server then rejects like any other bad request.

use core::fmt::{self, Write as _};

use heapless::String;
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};

use crate::{
    config::ClientConfig,
    text::Truncating,
    weather::model::{MAX_FORECAST_ITEMS, MAX_GEO_RESULTS},
};

pub const PATH_CAPACITY: usize = 320;
pub type Path = String<PATH_CAPACITY>;

// Commas stay literal: the geocoder splits `q` and `zip` on them.
const QUERY_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'&')
    .add(b'+')
    .add(b'/')
    .add(b'<')
    .add(b'=')
    .add(b'>')
    .add(b'?')
    .add(b'\\')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

/// A coordinate with the four decimals the API is queried with.
struct Coord(f32);

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}", self.0)
    }
}

/// `&units=...&lang=...` for the weather and forecast endpoints.
struct Localization<'a>(&'a ClientConfig);

impl fmt::Display for Localization<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(units) = self.0.units.as_query() {
            write!(f, "&units={}", units)?;
        }
        write!(f, "&lang={}", self.0.language)
    }
}

/// `&cnt=N`, omitted for zero.
struct Count(usize);

impl fmt::Display for Count {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            0 => Ok(()),
            n => write!(f, "&cnt={}", n.min(MAX_FORECAST_ITEMS)),
        }
    }
}

/// Comma-joined, percent-encoded query parts; empty parts are skipped.
struct Joined<'a, const K: usize>([Option<&'a str>; K]);

impl<const K: usize> fmt::Display for Joined<'_, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts = self.0.iter().flatten().filter(|part| !part.is_empty());
        for (i, part) in parts.enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}", utf8_percent_encode(part, QUERY_ENCODE_SET))?;
        }
        Ok(())
    }
}

fn build(args: fmt::Arguments<'_>) -> Path {
    let mut path = Path::new();
    let truncated = {
        let mut out = Truncating::new(&mut path);
        let _ = out.write_fmt(args);
        out.truncated()
    };
    if truncated {
        log::warn!("request path truncated to {} bytes", PATH_CAPACITY);
    }
    path
}

/// `/data/2.5/weather` for a coordinate pair.
pub fn current_weather_path(config: &ClientConfig, lat: f32, lon: f32) -> Path {
    build(format_args!(
        "/data/2.5/weather?lat={}&lon={}{}&appid={}",
        Coord(lat),
        Coord(lon),
        Localization(config),
        config.api_key
    ))
}

/// `/data/2.5/forecast`; `cnt` of 0 asks for the full five days, anything
/// above [`MAX_FORECAST_ITEMS`] is clamped.
pub fn forecast_path(config: &ClientConfig, lat: f32, lon: f32, cnt: usize) -> Path {
    build(format_args!(
        "/data/2.5/forecast?lat={}&lon={}{}{}&appid={}",
        Coord(lat),
        Coord(lon),
        Localization(config),
        Count(cnt),
        config.api_key
    ))
}

pub fn air_pollution_path(config: &ClientConfig, lat: f32, lon: f32) -> Path {
    build(format_args!(
        "/data/2.5/air_pollution?lat={}&lon={}&appid={}",
        Coord(lat),
        Coord(lon),
        config.api_key
    ))
}

pub fn air_pollution_forecast_path(config: &ClientConfig, lat: f32, lon: f32) -> Path {
    build(format_args!(
        "/data/2.5/air_pollution/forecast?lat={}&lon={}&appid={}",
        Coord(lat),
        Coord(lon),
        config.api_key
    ))
}

/// `start` and `end` are Unix timestamps (UTC).
pub fn air_pollution_history_path(
    config: &ClientConfig,
    lat: f32,
    lon: f32,
    start: u64,
    end: u64,
) -> Path {
    build(format_args!(
        "/data/2.5/air_pollution/history?lat={}&lon={}&start={}&end={}&appid={}",
        Coord(lat),
        Coord(lon),
        start,
        end,
        config.api_key
    ))
}

/// `/geo/1.0/direct` with `q=city[,state][,country]`.
pub fn direct_geocode_path(
    config: &ClientConfig,
    city: &str,
    state: Option<&str>,
    country: Option<&str>,
    limit: usize,
) -> Path {
    build(format_args!(
        "/geo/1.0/direct?q={}&limit={}&appid={}",
        Joined([Some(city), state, country]),
        limit.min(MAX_GEO_RESULTS),
        config.api_key
    ))
}

pub fn zip_geocode_path(config: &ClientConfig, zip: &str, country: &str) -> Path {
    build(format_args!(
        "/geo/1.0/zip?zip={}&appid={}",
        Joined([Some(zip), Some(country)]),
        config.api_key
    ))
}

pub fn reverse_geocode_path(config: &ClientConfig, lat: f32, lon: f32, limit: usize) -> Path {
    build(format_args!(
        "/geo/1.0/reverse?lat={}&lon={}&limit={}&appid={}",
        Coord(lat),
        Coord(lon),
        limit.min(MAX_GEO_RESULTS),
        config.api_key
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Units;

    fn config() -> ClientConfig {
        ClientConfig::new("KEY")
    }

    #[test]
    fn current_weather_carries_units_and_language() {
        assert_eq!(
            current_weather_path(&config(), 51.5085, -0.1257),
            "/data/2.5/weather?lat=51.5085&lon=-0.1257&units=metric&lang=en&appid=KEY"
        );
    }

    #[test]
    fn standard_units_add_nothing() {
        let mut config = config();
        config.units = Units::Standard;
        config.language = crate::text::truncate_into("de");
        assert_eq!(
            current_weather_path(&config, 10.0, 20.0),
            "/data/2.5/weather?lat=10.0000&lon=20.0000&lang=de&appid=KEY"
        );
        config.units = Units::Imperial;
        assert_eq!(
            current_weather_path(&config, 10.0, 20.0),
            "/data/2.5/weather?lat=10.0000&lon=20.0000&units=imperial&lang=de&appid=KEY"
        );
    }

    #[test]
    fn forecast_count_is_optional_and_clamped() {
        assert_eq!(
            forecast_path(&config(), 1.0, 2.0, 0),
            "/data/2.5/forecast?lat=1.0000&lon=2.0000&units=metric&lang=en&appid=KEY"
        );
        assert_eq!(
            forecast_path(&config(), 1.0, 2.0, 8),
            "/data/2.5/forecast?lat=1.0000&lon=2.0000&units=metric&lang=en&cnt=8&appid=KEY"
        );
        assert!(forecast_path(&config(), 1.0, 2.0, 500).contains("&cnt=40&"));
    }

    #[test]
    fn air_pollution_paths_skip_localization() {
        assert_eq!(
            air_pollution_path(&config(), 1.0, 2.0),
            "/data/2.5/air_pollution?lat=1.0000&lon=2.0000&appid=KEY"
        );
        assert_eq!(
            air_pollution_forecast_path(&config(), 1.0, 2.0),
            "/data/2.5/air_pollution/forecast?lat=1.0000&lon=2.0000&appid=KEY"
        );
        assert_eq!(
            air_pollution_history_path(&config(), 1.0, 2.0, 1_606_223_802, 1_606_482_999),
            "/data/2.5/air_pollution/history?lat=1.0000&lon=2.0000&start=1606223802&end=1606482999&appid=KEY"
        );
    }

    #[test]
    fn direct_geocoding_encodes_spaces_but_not_commas() {
        assert_eq!(
            direct_geocode_path(&config(), "San Francisco", Some("CA"), Some("US"), 3),
            "/geo/1.0/direct?q=San%20Francisco,CA,US&limit=3&appid=KEY"
        );
    }

    #[test]
    fn direct_geocoding_skips_missing_parts() {
        assert_eq!(
            direct_geocode_path(&config(), "London", None, Some("GB"), 1),
            "/geo/1.0/direct?q=London,GB&limit=1&appid=KEY"
        );
        assert_eq!(
            direct_geocode_path(&config(), "London", Some(""), None, 1),
            "/geo/1.0/direct?q=London&limit=1&appid=KEY"
        );
    }

    #[test]
    fn query_separators_are_escaped() {
        let path = direct_geocode_path(&config(), "A&B=C", None, None, 1);
        assert_eq!(path, "/geo/1.0/direct?q=A%26B%3DC&limit=1&appid=KEY");
    }

    #[test]
    fn geocoding_limits_are_clamped() {
        assert!(direct_geocode_path(&config(), "Paris", None, None, 50).contains("&limit=5&"));
        assert_eq!(
            reverse_geocode_path(&config(), 48.8566, 2.3522, 9),
            "/geo/1.0/reverse?lat=48.8566&lon=2.3522&limit=5&appid=KEY"
        );
    }

    #[test]
    fn zip_geocoding() {
        assert_eq!(
            zip_geocode_path(&config(), "E14", "GB"),
            "/geo/1.0/zip?zip=E14,GB&appid=KEY"
        );
    }

    #[test]
    fn oversized_paths_are_truncated() {
        let city = "x".repeat(400);
        let path = direct_geocode_path(&config(), &city, None, None, 1);
        assert_eq!(path.len(), PATH_CAPACITY);
        assert!(path.starts_with("/geo/1.0/direct?q=xxx"));
    }
}
