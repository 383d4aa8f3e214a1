use core::fmt::Write as _;

use heapless::{String, Vec};
use serde::Deserialize;

use super::lenient;

// Heapless sizing limits
pub const MAX_FORECAST_ITEMS: usize = 40;
pub const MAX_GEO_RESULTS: usize = 5;
/// Four days of hourly air-quality forecast fit with room to spare.
pub const MAX_AIR_POLLUTION_ITEMS: usize = 120;

// String capacities, in bytes
pub const CITY_NAME_MAX: usize = 63;
pub const COUNTRY_MAX: usize = 7;
pub const STATE_MAX: usize = 31;
pub const CONDITION_GROUP_MAX: usize = 31;
pub const DESCRIPTION_MAX: usize = 63;
pub const ICON_MAX: usize = 7;
pub const DT_TXT_MAX: usize = 19;
pub const ICON_URL_MAX: usize = 64;

const ICON_URL_BASE: &str = "https://openweathermap.org/img/wn/";

/// A place returned by the geocoding endpoints.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct GeoLocation {
    #[serde(deserialize_with = "lenient::text")]
    pub name: String<CITY_NAME_MAX>,
    /// ISO 3166 country code.
    #[serde(deserialize_with = "lenient::text")]
    pub country: String<COUNTRY_MAX>,
    /// Empty when upstream has no state for the place.
    #[serde(deserialize_with = "lenient::text")]
    pub state: String<STATE_MAX>,
    #[serde(deserialize_with = "lenient::number")]
    pub lat: f32,
    #[serde(deserialize_with = "lenient::number")]
    pub lon: f32,
}

/// Primary weather condition (first entry of the upstream `weather` array).
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct WeatherCondition {
    #[serde(deserialize_with = "lenient::number")]
    pub id: i32,
    /// Group such as "Rain", "Snow" or "Clouds".
    #[serde(deserialize_with = "lenient::text")]
    pub main: String<CONDITION_GROUP_MAX>,
    #[serde(deserialize_with = "lenient::text")]
    pub description: String<DESCRIPTION_MAX>,
    #[serde(deserialize_with = "lenient::text")]
    pub icon: String<ICON_MAX>,
}

impl WeatherCondition {
    /// URL of the 2x PNG for this condition's icon.
    pub fn icon_url(&self) -> String<ICON_URL_MAX> {
        let mut url = String::new();
        let _ = write!(url, "{}{}@2x.png", ICON_URL_BASE, self.icon);
        url
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct MainData {
    #[serde(deserialize_with = "lenient::number")]
    pub temp: f32,
    #[serde(deserialize_with = "lenient::number")]
    pub feels_like: f32,
    #[serde(deserialize_with = "lenient::number")]
    pub temp_min: f32,
    #[serde(deserialize_with = "lenient::number")]
    pub temp_max: f32,
    /// hPa
    #[serde(deserialize_with = "lenient::number")]
    pub pressure: i32,
    /// %
    #[serde(deserialize_with = "lenient::number")]
    pub humidity: i32,
    #[serde(deserialize_with = "lenient::number")]
    pub sea_level: i32,
    #[serde(deserialize_with = "lenient::number")]
    pub grnd_level: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct WindData {
    #[serde(deserialize_with = "lenient::number")]
    pub speed: f32,
    /// Degrees, meteorological.
    #[serde(deserialize_with = "lenient::number")]
    pub deg: i32,
    /// Zero when upstream reports no gusts.
    #[serde(deserialize_with = "lenient::number")]
    pub gust: f32,
}

/// Current conditions at a location.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "CurrentWeatherWire")]
pub struct CurrentWeather {
    pub lat: f32,
    pub lon: f32,
    pub weather: WeatherCondition,
    pub main: MainData,
    /// Meters.
    pub visibility: i32,
    pub wind: WindData,
    /// Cloudiness, %.
    pub clouds: i32,
    /// Rain volume for the last hour, mm.
    pub rain_1h: f32,
    /// Snow volume for the last hour, mm.
    pub snow_1h: f32,
    /// Observation time, Unix UTC.
    pub dt: u64,
    pub country: String<COUNTRY_MAX>,
    pub sunrise: u64,
    pub sunset: u64,
    /// Shift from UTC in seconds.
    pub timezone: i32,
    pub name: String<CITY_NAME_MAX>,
}

/// Pollutant concentrations in μg/m³.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AirComponents {
    #[serde(deserialize_with = "lenient::number")]
    pub co: f32,
    #[serde(deserialize_with = "lenient::number")]
    pub no: f32,
    #[serde(deserialize_with = "lenient::number")]
    pub no2: f32,
    #[serde(deserialize_with = "lenient::number")]
    pub o3: f32,
    #[serde(deserialize_with = "lenient::number")]
    pub so2: f32,
    #[serde(deserialize_with = "lenient::number")]
    pub pm2_5: f32,
    #[serde(deserialize_with = "lenient::number")]
    pub pm10: f32,
    #[serde(deserialize_with = "lenient::number")]
    pub nh3: f32,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "AirPollutionWire")]
pub struct AirPollution {
    /// Unix UTC.
    pub dt: u64,
    /// Air Quality Index, 1 (good) to 5 (very poor); 0 if absent.
    pub aqi: u8,
    pub components: AirComponents,
}

impl AirPollution {
    pub fn quality(&self) -> AirQuality {
        AirQuality::from_index(self.aqi)
    }
}

/// Qualitative reading of the Air Quality Index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AirQuality {
    Good,
    Fair,
    Moderate,
    Poor,
    VeryPoor,
    Unknown,
}

impl AirQuality {
    pub fn from_index(aqi: u8) -> Self {
        match aqi {
            1 => AirQuality::Good,
            2 => AirQuality::Fair,
            3 => AirQuality::Moderate,
            4 => AirQuality::Poor,
            5 => AirQuality::VeryPoor,
            _ => AirQuality::Unknown,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            AirQuality::Good => "Good",
            AirQuality::Fair => "Fair",
            AirQuality::Moderate => "Moderate",
            AirQuality::Poor => "Poor",
            AirQuality::VeryPoor => "Very Poor",
            AirQuality::Unknown => "Unknown",
        }
    }
}

/// One 3-hour step of the 5 day forecast.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "ForecastItemWire")]
pub struct ForecastItem {
    pub dt: u64,
    pub main: MainData,
    pub weather: WeatherCondition,
    pub wind: WindData,
    pub clouds: i32,
    pub visibility: i32,
    /// Probability of precipitation, 0 to 1.
    pub pop: f32,
    pub rain_3h: f32,
    pub snow_3h: f32,
    /// "YYYY-MM-DD hh:mm:ss", UTC.
    pub dt_txt: String<DT_TXT_MAX>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "ForecastWire")]
pub struct Forecast {
    /// Chronological, as delivered upstream.
    pub items: Vec<ForecastItem, MAX_FORECAST_ITEMS>,
    pub city_name: String<CITY_NAME_MAX>,
    pub country: String<COUNTRY_MAX>,
    pub lat: f32,
    pub lon: f32,
    pub timezone: i32,
    pub sunrise: u64,
    pub sunset: u64,
}

impl Forecast {
    /// Number of forecast steps held.
    pub fn cnt(&self) -> usize {
        self.items.len()
    }
}

/// `{"list": [...]}` envelope of the air pollution endpoints.
#[derive(Default, Deserialize)]
pub(crate) struct AirPollutionList<const N: usize> {
    #[serde(default, deserialize_with = "lenient::bounded")]
    pub list: Vec<AirPollution, N>,
}

// Upstream shapes that do not map one-to-one onto the public types.

#[derive(Default, Deserialize)]
#[serde(default)]
struct Coord {
    #[serde(deserialize_with = "lenient::number")]
    lat: f32,
    #[serde(deserialize_with = "lenient::number")]
    lon: f32,
}

#[derive(Default, Deserialize)]
#[serde(default)]
struct Clouds {
    #[serde(deserialize_with = "lenient::number")]
    all: i32,
}

#[derive(Default, Deserialize)]
#[serde(default)]
struct Volume {
    #[serde(rename = "1h", deserialize_with = "lenient::number")]
    one_hour: f32,
    #[serde(rename = "3h", deserialize_with = "lenient::number")]
    three_hours: f32,
}

#[derive(Default, Deserialize)]
#[serde(default)]
struct Sys {
    #[serde(deserialize_with = "lenient::text")]
    country: String<COUNTRY_MAX>,
    #[serde(deserialize_with = "lenient::number")]
    sunrise: u64,
    #[serde(deserialize_with = "lenient::number")]
    sunset: u64,
}

#[derive(Default, Deserialize)]
#[serde(default)]
struct CurrentWeatherWire {
    #[serde(deserialize_with = "lenient::object")]
    coord: Coord,
    #[serde(deserialize_with = "lenient::first")]
    weather: WeatherCondition,
    #[serde(deserialize_with = "lenient::object")]
    main: MainData,
    #[serde(deserialize_with = "lenient::number")]
    visibility: i32,
    #[serde(deserialize_with = "lenient::object")]
    wind: WindData,
    #[serde(deserialize_with = "lenient::object")]
    clouds: Clouds,
    #[serde(deserialize_with = "lenient::object")]
    rain: Volume,
    #[serde(deserialize_with = "lenient::object")]
    snow: Volume,
    #[serde(deserialize_with = "lenient::number")]
    dt: u64,
    #[serde(deserialize_with = "lenient::object")]
    sys: Sys,
    #[serde(deserialize_with = "lenient::number")]
    timezone: i32,
    #[serde(deserialize_with = "lenient::text")]
    name: String<CITY_NAME_MAX>,
}

impl From<CurrentWeatherWire> for CurrentWeather {
    fn from(w: CurrentWeatherWire) -> Self {
        Self {
            lat: w.coord.lat,
            lon: w.coord.lon,
            weather: w.weather,
            main: w.main,
            visibility: w.visibility,
            wind: w.wind,
            clouds: w.clouds.all,
            rain_1h: w.rain.one_hour,
            snow_1h: w.snow.one_hour,
            dt: w.dt,
            country: w.sys.country,
            sunrise: w.sys.sunrise,
            sunset: w.sys.sunset,
            timezone: w.timezone,
            name: w.name,
        }
    }
}

#[derive(Default, Deserialize)]
#[serde(default)]
struct AqiIndex {
    #[serde(deserialize_with = "lenient::number")]
    aqi: u8,
}

#[derive(Default, Deserialize)]
#[serde(default)]
struct AirPollutionWire {
    #[serde(deserialize_with = "lenient::number")]
    dt: u64,
    #[serde(deserialize_with = "lenient::object")]
    main: AqiIndex,
    #[serde(deserialize_with = "lenient::object")]
    components: AirComponents,
}

impl From<AirPollutionWire> for AirPollution {
    fn from(w: AirPollutionWire) -> Self {
        Self {
            dt: w.dt,
            aqi: w.main.aqi,
            components: w.components,
        }
    }
}

#[derive(Default, Deserialize)]
#[serde(default)]
struct ForecastItemWire {
    #[serde(deserialize_with = "lenient::number")]
    dt: u64,
    #[serde(deserialize_with = "lenient::object")]
    main: MainData,
    #[serde(deserialize_with = "lenient::first")]
    weather: WeatherCondition,
    #[serde(deserialize_with = "lenient::object")]
    wind: WindData,
    #[serde(deserialize_with = "lenient::object")]
    clouds: Clouds,
    #[serde(deserialize_with = "lenient::number")]
    visibility: i32,
    #[serde(deserialize_with = "lenient::number")]
    pop: f32,
    #[serde(deserialize_with = "lenient::object")]
    rain: Volume,
    #[serde(deserialize_with = "lenient::object")]
    snow: Volume,
    #[serde(deserialize_with = "lenient::text")]
    dt_txt: String<DT_TXT_MAX>,
}

impl From<ForecastItemWire> for ForecastItem {
    fn from(w: ForecastItemWire) -> Self {
        Self {
            dt: w.dt,
            main: w.main,
            weather: w.weather,
            wind: w.wind,
            clouds: w.clouds.all,
            visibility: w.visibility,
            pop: w.pop,
            rain_3h: w.rain.three_hours,
            snow_3h: w.snow.three_hours,
            dt_txt: w.dt_txt,
        }
    }
}

#[derive(Default, Deserialize)]
#[serde(default)]
struct City {
    #[serde(deserialize_with = "lenient::text")]
    name: String<CITY_NAME_MAX>,
    #[serde(deserialize_with = "lenient::text")]
    country: String<COUNTRY_MAX>,
    #[serde(deserialize_with = "lenient::object")]
    coord: Coord,
    #[serde(deserialize_with = "lenient::number")]
    timezone: i32,
    #[serde(deserialize_with = "lenient::number")]
    sunrise: u64,
    #[serde(deserialize_with = "lenient::number")]
    sunset: u64,
}

#[derive(Default, Deserialize)]
#[serde(default)]
struct ForecastWire {
    #[serde(deserialize_with = "lenient::bounded")]
    list: Vec<ForecastItem, MAX_FORECAST_ITEMS>,
    #[serde(deserialize_with = "lenient::object")]
    city: City,
}

impl From<ForecastWire> for Forecast {
    fn from(w: ForecastWire) -> Self {
        Self {
            items: w.list,
            city_name: w.city.name,
            country: w.city.country,
            lat: w.city.coord.lat,
            lon: w.city.coord.lon,
            timezone: w.city.timezone,
            sunrise: w.city.sunrise,
            sunset: w.city.sunset,
        }
    }
}
