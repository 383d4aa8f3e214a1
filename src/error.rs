use crate::weather::{decode::DecodeError, http::TransportError};

/// Failure of a single client operation.
///
/// The `Display` text is what ends up in `OpenWeatherMap::last_error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The server answered with something other than 200; the body was not decoded.
    #[error("HTTP Error: {0}")]
    Http(u16),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// A by-name lookup returned no geocoding results.
    #[error("City not found")]
    LocationNotFound,
}
