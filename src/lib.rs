#![cfg_attr(not(any(test, feature = "std")), no_std)]

pub mod config;
pub mod error;
#[cfg(feature = "std")]
pub mod std_net;
pub mod text;
pub mod time;
pub mod weather;

pub use config::{ClientConfig, Units};
pub use error::Error;
pub use weather::OpenWeatherMap;
