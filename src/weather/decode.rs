//! Projection of response bodies onto the fixed-size model types.
//!
//! Every decoder either returns a fully populated value (absent fields at
//! their defaults) or fails; slice outputs are reset to defaults before
//! anything is written.

use serde::Deserialize;

use super::{
    json,
    lenient::{Document, List},
    model::{
        AirPollution, AirPollutionList, CurrentWeather, Forecast, GeoLocation,
        MAX_AIR_POLLUTION_ITEMS, MAX_GEO_RESULTS,
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// The body is not valid JSON.
    #[error("JSON parse error")]
    MalformedJson,
    /// Valid JSON, but the top-level value has the wrong shape.
    #[error("Invalid response format")]
    InvalidFormat,
}

/// Room to unescape one string value; longer strings keep their escapes.
const UNESCAPE_CAPACITY: usize = 256;

fn parse<'a, T: Deserialize<'a>>(body: &'a [u8]) -> Result<T, DecodeError> {
    let mut scratch = [0u8; UNESCAPE_CAPACITY];
    json::from_slice::<T>(body, &mut scratch).map_err(|e| {
        log::debug!("JSON parse failed: {:?}", e);
        DecodeError::MalformedJson
    })
}

fn parse_object<'a, T>(body: &'a [u8]) -> Result<T, DecodeError>
where
    T: Deserialize<'a> + Default,
{
    parse::<Document<T>>(body)?
        .0
        .ok_or(DecodeError::InvalidFormat)
}

pub(crate) fn reset<T: Default>(out: &mut [T]) {
    out.iter_mut().for_each(|slot| *slot = T::default());
}

/// Move `items` into the front of `out`, returning how many fit.
fn fill<T, I: IntoIterator<Item = T>>(items: I, out: &mut [T]) -> usize {
    out.iter_mut()
        .zip(items)
        .map(|(slot, item)| *slot = item)
        .count()
}

/// `/data/2.5/weather` body.
pub fn decode_current_weather(body: &[u8]) -> Result<CurrentWeather, DecodeError> {
    parse_object(body)
}

/// `/data/2.5/forecast` body; at most [`MAX_FORECAST_ITEMS`](super::model::MAX_FORECAST_ITEMS) steps are kept.
pub fn decode_forecast(body: &[u8]) -> Result<Forecast, DecodeError> {
    parse_object(body)
}

/// `/data/2.5/air_pollution` body: only the first `list` entry is read.
///
/// An empty list decodes to an all-zero reading.
pub fn decode_air_pollution(body: &[u8]) -> Result<AirPollution, DecodeError> {
    let envelope: AirPollutionList<1> = parse_object(body)?;
    Ok(envelope.list.into_iter().next().unwrap_or_default())
}

/// Air pollution forecast or history body, in upstream order, bounded by `out.len()`.
pub fn decode_air_pollution_list(
    body: &[u8],
    out: &mut [AirPollution],
) -> Result<usize, DecodeError> {
    reset(out);
    let envelope: AirPollutionList<MAX_AIR_POLLUTION_ITEMS> = parse_object(body)?;
    Ok(fill(envelope.list, out))
}

/// Direct or reverse geocoding body: a bare array of places.
///
/// At most `out.len()` (and never more than [`MAX_GEO_RESULTS`]) entries are
/// written.
pub fn decode_geo_locations(body: &[u8], out: &mut [GeoLocation]) -> Result<usize, DecodeError> {
    reset(out);
    let places = parse::<List<GeoLocation, MAX_GEO_RESULTS>>(body)?
        .0
        .ok_or(DecodeError::InvalidFormat)?;
    Ok(fill(places, out))
}

/// `/geo/1.0/zip` body: a single place object.
pub fn decode_geo_zip(body: &[u8]) -> Result<GeoLocation, DecodeError> {
    parse_object(body)
}
