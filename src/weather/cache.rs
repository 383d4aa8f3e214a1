use embassy_time::{Duration, Instant};

use super::model::CurrentWeather;

/// Two requests closer than this (in degrees, per axis) share a cache entry.
pub const COORDINATE_TOLERANCE: f32 = 0.01;

#[derive(Debug, Clone)]
enum State {
    Empty,
    Valid {
        weather: CurrentWeather,
        lat: f32,
        lon: f32,
        stored_at: Instant,
    },
}

/// Single-entry cache for current weather by coordinates.
#[derive(Debug, Clone)]
pub struct WeatherCache {
    duration: Duration,
    state: State,
}

fn near(a: f32, b: f32) -> bool {
    let d = a - b;
    d < COORDINATE_TOLERANCE && d > -COORDINATE_TOLERANCE
}

impl WeatherCache {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            state: State::Empty,
        }
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Change the lifetime of entries. Zero disables the cache and drops
    /// whatever it holds.
    pub fn set_duration(&mut self, duration: Duration) {
        self.duration = duration;
        if !self.is_enabled() {
            self.clear();
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.duration > Duration::from_ticks(0)
    }

    /// Whether an entry is stored, fresh or not.
    pub fn is_valid(&self) -> bool {
        matches!(self.state, State::Valid { .. })
    }

    /// The stored reading if it is younger than the cache duration and was
    /// taken at (nearly) the same coordinates.
    pub fn lookup(&self, lat: f32, lon: f32, now: Instant) -> Option<&CurrentWeather> {
        if !self.is_enabled() {
            return None;
        }
        match &self.state {
            State::Valid {
                weather,
                lat: cached_lat,
                lon: cached_lon,
                stored_at,
            } => {
                let age = now.checked_duration_since(*stored_at)?;
                let fresh = age < self.duration;
                (fresh && near(lat, *cached_lat) && near(lon, *cached_lon)).then_some(weather)
            }
            State::Empty => None,
        }
    }

    /// Remember `weather` as the reading for the requested coordinates.
    pub fn store(&mut self, weather: &CurrentWeather, lat: f32, lon: f32, now: Instant) {
        if !self.is_enabled() {
            return;
        }
        self.state = State::Valid {
            weather: weather.clone(),
            lat,
            lon,
            stored_at: now,
        };
    }

    pub fn clear(&mut self) {
        self.state = State::Empty;
    }
}
