use core::fmt::Write as _;

use embassy_time::{Duration, Instant};
use heapless::String;

use self::{
    cache::WeatherCache,
    decode::DecodeError,
    http::{GetRequest, Transport},
    model::{AirPollution, CurrentWeather, Forecast, GeoLocation, MAX_GEO_RESULTS},
};
use crate::{
    config::{API_HOST, ClientConfig, GEO_HOST, Units},
    error::Error,
    text::{Truncating, truncate_into},
};

pub mod api;
pub mod cache;
pub mod decode;
pub mod http;
pub(crate) mod json;
pub(crate) mod lenient;
pub mod model;

/// Default size of the response body buffer owned by each client.
/// A full 40 step forecast runs to about 17 KiB.
pub const RESPONSE_CAPACITY: usize = 24 * 1024;
pub const LAST_ERROR_MAX: usize = 63;

/// Blocking OpenWeatherMap client.
///
/// Every call performs at most one request (two for the `*_by_city`
/// variants) through `T` and decodes the body out of a fixed `N`-byte buffer.
/// After each call [`last_http_code`](Self::last_http_code) and
/// [`last_error`](Self::last_error) describe the outcome.
pub struct OpenWeatherMap<T, const N: usize = RESPONSE_CAPACITY> {
    transport: T,
    config: ClientConfig,
    cache: WeatherCache,
    last_http_code: u16,
    last_error: String<LAST_ERROR_MAX>,
    response: [u8; N],
}

/// Endpoint part of a request path; the query carries the API key.
fn endpoint(path: &str) -> &str {
    path.split_once('?').map_or(path, |(endpoint, _)| endpoint)
}

impl<T: Transport, const N: usize> OpenWeatherMap<T, N> {
    pub fn new(transport: T, api_key: &str) -> Self {
        Self::with_config(transport, ClientConfig::new(api_key))
    }

    pub fn with_config(transport: T, config: ClientConfig) -> Self {
        Self {
            transport,
            cache: WeatherCache::new(config.cache_duration),
            config,
            last_http_code: 0,
            last_error: String::new(),
            response: [0; N],
        }
    }

    pub fn set_api_key(&mut self, api_key: &str) {
        self.config.api_key = truncate_into(api_key);
    }

    pub fn set_https(&mut self, use_https: bool) {
        self.config.use_https = use_https;
    }

    /// Also drops the cached reading, which was taken in the old units.
    pub fn set_units(&mut self, units: Units) {
        if self.config.units != units {
            self.cache.clear();
        }
        self.config.units = units;
    }

    /// Also drops the cached reading, whose descriptions are in the old language.
    pub fn set_language(&mut self, language: &str) {
        if self.config.language != language {
            self.cache.clear();
        }
        self.config.language = truncate_into(language);
    }

    pub fn set_debug(&mut self, debug: bool) {
        self.config.debug = debug;
    }

    /// Zero disables caching.
    pub fn set_cache_duration(&mut self, duration: Duration) {
        self.config.cache_duration = duration;
        self.cache.set_duration(duration);
    }

    pub fn set_timeout(&mut self, timeout: Duration) {
        self.config.timeout = timeout;
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn cache(&self) -> &WeatherCache {
        &self.cache
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Status of the last completed exchange, 0 if it never got a response.
    pub fn last_http_code(&self) -> u16 {
        self.last_http_code
    }

    /// Message of the last failure, empty after a success.
    pub fn last_error(&self) -> &str {
        &self.last_error
    }

    /// Current conditions at a coordinate pair, served from the cache when a
    /// fresh reading for (nearly) the same place is held.
    pub fn current_weather(&mut self, lat: f32, lon: f32) -> Result<CurrentWeather, Error> {
        if let Some(hit) = self.cache.lookup(lat, lon, Instant::now()) {
            if self.config.debug {
                log::info!("current weather for {:.4},{:.4} served from cache", lat, lon);
            }
            self.last_error.clear();
            return Ok(hit.clone());
        }

        let path = api::current_weather_path(&self.config, lat, lon);
        let weather = self.fetch(API_HOST, &path, decode::decode_current_weather)?;
        self.cache.store(&weather, lat, lon, Instant::now());
        Ok(weather)
    }

    /// Geocode `city` (first match only), then fetch its current conditions.
    pub fn current_weather_by_city(
        &mut self,
        city: &str,
        country: Option<&str>,
    ) -> Result<CurrentWeather, Error> {
        let place = self.locate(city, country)?;
        self.current_weather(place.lat, place.lon)
    }

    /// 5 day / 3 hour forecast. `cnt` limits the number of steps, 0 for all.
    pub fn forecast(&mut self, lat: f32, lon: f32, cnt: usize) -> Result<Forecast, Error> {
        let path = api::forecast_path(&self.config, lat, lon, cnt);
        self.fetch(API_HOST, &path, decode::decode_forecast)
    }

    pub fn forecast_by_city(
        &mut self,
        city: &str,
        country: Option<&str>,
        cnt: usize,
    ) -> Result<Forecast, Error> {
        let place = self.locate(city, country)?;
        self.forecast(place.lat, place.lon, cnt)
    }

    pub fn air_pollution(&mut self, lat: f32, lon: f32) -> Result<AirPollution, Error> {
        let path = api::air_pollution_path(&self.config, lat, lon);
        self.fetch(API_HOST, &path, decode::decode_air_pollution)
    }

    /// Hourly air pollution forecast. Fills `out` in order and returns how
    /// many entries were written.
    pub fn air_pollution_forecast(
        &mut self,
        lat: f32,
        lon: f32,
        out: &mut [AirPollution],
    ) -> Result<usize, Error> {
        decode::reset(out);
        let path = api::air_pollution_forecast_path(&self.config, lat, lon);
        self.fetch(API_HOST, &path, |body| {
            decode::decode_air_pollution_list(body, out)
        })
    }

    /// Hourly air pollution between two Unix timestamps.
    pub fn air_pollution_history(
        &mut self,
        lat: f32,
        lon: f32,
        start: u64,
        end: u64,
        out: &mut [AirPollution],
    ) -> Result<usize, Error> {
        decode::reset(out);
        let path = api::air_pollution_history_path(&self.config, lat, lon, start, end);
        self.fetch(API_HOST, &path, |body| {
            decode::decode_air_pollution_list(body, out)
        })
    }

    /// Direct geocoding. Requests as many places as `out` holds (at most
    /// [`MAX_GEO_RESULTS`]); an empty `out` returns 0 without a request.
    pub fn coordinates_by_name(
        &mut self,
        city: &str,
        country: Option<&str>,
        state: Option<&str>,
        out: &mut [GeoLocation],
    ) -> Result<usize, Error> {
        decode::reset(out);
        let limit = out.len().min(MAX_GEO_RESULTS);
        if limit == 0 {
            return Ok(0);
        }
        let path = api::direct_geocode_path(&self.config, city, state, country, limit);
        self.fetch(GEO_HOST, &path, |body| {
            decode::decode_geo_locations(body, &mut out[..limit])
        })
    }

    pub fn coordinates_by_zip(&mut self, zip: &str, country: &str) -> Result<GeoLocation, Error> {
        let path = api::zip_geocode_path(&self.config, zip, country);
        self.fetch(GEO_HOST, &path, decode::decode_geo_zip)
    }

    /// Reverse geocoding, with the same `out` rules as
    /// [`coordinates_by_name`](Self::coordinates_by_name).
    pub fn location_by_coordinates(
        &mut self,
        lat: f32,
        lon: f32,
        out: &mut [GeoLocation],
    ) -> Result<usize, Error> {
        decode::reset(out);
        let limit = out.len().min(MAX_GEO_RESULTS);
        if limit == 0 {
            return Ok(0);
        }
        let path = api::reverse_geocode_path(&self.config, lat, lon, limit);
        self.fetch(GEO_HOST, &path, |body| {
            decode::decode_geo_locations(body, &mut out[..limit])
        })
    }

    fn locate(&mut self, city: &str, country: Option<&str>) -> Result<GeoLocation, Error> {
        let mut found = [GeoLocation::default()];
        match self.coordinates_by_name(city, country, None, &mut found)? {
            0 => Err(self.fail(Error::LocationNotFound)),
            _ => {
                let [place] = found;
                if self.config.debug {
                    log::info!("{} is at {:.4},{:.4}", city, place.lat, place.lon);
                }
                Ok(place)
            }
        }
    }

    fn fetch<R>(
        &mut self,
        host: &str,
        path: &str,
        decode: impl FnOnce(&[u8]) -> Result<R, DecodeError>,
    ) -> Result<R, Error> {
        let body_len = self.round_trip(host, path).map_err(|e| self.fail(e))?;
        match decode(&self.response[..body_len]) {
            Ok(value) => Ok(value),
            Err(e) => {
                if self.config.debug {
                    log::info!("{} body did not decode: {}", endpoint(path), e);
                }
                Err(self.fail(e.into()))
            }
        }
    }

    /// One GET; returns the body length on a 200.
    fn round_trip(&mut self, host: &str, path: &str) -> Result<usize, Error> {
        self.last_http_code = 0;
        self.last_error.clear();

        if self.config.debug {
            log::info!("GET {}{}", host, endpoint(path));
        }
        let request = GetRequest {
            host,
            path,
            secure: self.config.use_https,
            timeout: self.config.timeout,
        };
        let response = self.transport.perform_get(&request, &mut self.response)?;

        self.last_http_code = response.status;
        if response.status != 200 {
            return Err(Error::Http(response.status));
        }
        if self.config.debug {
            log::info!("{} bytes from {}", response.body_len, endpoint(path));
        }
        Ok(response.body_len.min(N))
    }

    /// Record `err` as the last error and hand it back.
    fn fail(&mut self, err: Error) -> Error {
        self.last_error.clear();
        let _ = write!(Truncating::new(&mut self.last_error), "{}", err);
        log::error!("OpenWeatherMap request failed: {}", err);
        err
    }
}
