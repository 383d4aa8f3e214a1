use std::{env, process::ExitCode};

use log::info;
use owm_embedded::{
    OpenWeatherMap,
    std_net::StdConnector,
    time::{format_date, format_hh_mm},
    weather::http::SocketTransport,
};

const USAGE: &str = "usage: OWM_API_KEY=<key> owm_embedded <city> [country]";

fn main() -> ExitCode {
    env_logger::init();

    let Ok(api_key) = env::var("OWM_API_KEY") else {
        eprintln!("{USAGE}");
        return ExitCode::FAILURE;
    };
    let mut args = env::args().skip(1);
    let Some(city) = args.next() else {
        eprintln!("{USAGE}");
        return ExitCode::FAILURE;
    };
    let country = args.next();

    let transport = SocketTransport::new(StdConnector::new());
    let mut owm: OpenWeatherMap<_> = OpenWeatherMap::new(transport, &api_key);
    owm.set_debug(true);

    info!("Fetching current weather for {}", city);
    let weather = match owm.current_weather_by_city(&city, country.as_deref()) {
        Ok(weather) => weather,
        Err(e) => {
            eprintln!(
                "Fetching weather failed: {} (HTTP {})",
                e,
                owm.last_http_code()
            );
            return ExitCode::FAILURE;
        }
    };

    let tz = weather.timezone;
    println!("{}, {}", weather.name, weather.country);
    if let Some(date) = format_date(weather.dt, tz) {
        println!("{}", date);
    }
    println!(
        "{} ({}), {:.1}°C, feels like {:.1}°C",
        weather.weather.main, weather.weather.description, weather.main.temp, weather.main.feels_like
    );
    println!(
        "Humidity {}%, pressure {} hPa, wind {:.1} m/s from {}°",
        weather.main.humidity, weather.main.pressure, weather.wind.speed, weather.wind.deg
    );
    if let (Some(rise), Some(set)) = (
        format_hh_mm(weather.sunrise, tz),
        format_hh_mm(weather.sunset, tz),
    ) {
        println!("Sunrise {}, sunset {}", rise, set);
    }
    println!("Icon: {}", weather.weather.icon_url());

    ExitCode::SUCCESS
}
