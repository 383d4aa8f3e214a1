use std::{cell::RefCell, collections::VecDeque, rc::Rc};

use embassy_time::Duration;
use embedded_io::{ErrorKind, ErrorType, Read, ReadReady, Write};
use owm_embedded::{
    Error, OpenWeatherMap, Units,
    weather::{
        http::{Connector, SocketTransport, TransportError},
        model::{AirPollution, AirQuality, GeoLocation},
    },
};

/// Canned server replies, one per connection, and a log of what was sent.
#[derive(Default)]
struct Upstream {
    replies: VecDeque<Vec<u8>>,
    requests: Vec<String>,
    hang: bool,
}

struct Wire {
    reply: Vec<u8>,
    pos: usize,
    sent: Vec<u8>,
    hang: bool,
    upstream: Rc<RefCell<Upstream>>,
}

impl Drop for Wire {
    fn drop(&mut self) {
        let sent = String::from_utf8_lossy(&self.sent).into_owned();
        self.upstream.borrow_mut().requests.push(sent);
    }
}

impl ErrorType for Wire {
    type Error = ErrorKind;
}

impl Read for Wire {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, ErrorKind> {
        // Dribble the reply out in small pieces.
        let n = buf.len().min(48).min(self.reply.len() - self.pos);
        buf[..n].copy_from_slice(&self.reply[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}

impl ReadReady for Wire {
    fn read_ready(&mut self) -> Result<bool, ErrorKind> {
        Ok(self.pos < self.reply.len() || !self.hang)
    }
}

impl Write for Wire {
    fn write(&mut self, buf: &[u8]) -> Result<usize, ErrorKind> {
        self.sent.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), ErrorKind> {
        Ok(())
    }
}

#[derive(Clone, Default)]
struct Loopback(Rc<RefCell<Upstream>>);

impl Loopback {
    fn reply(&self, status: &str, body: &str) {
        let reply = format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{body}",
            body.len()
        );
        self.0.borrow_mut().replies.push_back(reply.into_bytes());
    }

    fn requests(&self) -> Vec<String> {
        self.0.borrow().requests.clone()
    }
}

impl Connector for Loopback {
    type Connection = Wire;

    fn connect(
        &mut self,
        _host: &str,
        _port: u16,
        _secure: bool,
        _timeout: Duration,
    ) -> Result<Wire, TransportError> {
        let mut upstream = self.0.borrow_mut();
        let reply = upstream
            .replies
            .pop_front()
            .ok_or(TransportError::ConnectFailed)?;
        Ok(Wire {
            reply,
            pos: 0,
            sent: Vec::new(),
            hang: upstream.hang,
            upstream: self.0.clone(),
        })
    }
}

fn client(upstream: &Loopback) -> OpenWeatherMap<SocketTransport<Loopback>> {
    OpenWeatherMap::new(SocketTransport::new(upstream.clone()), "0123abcd")
}

const LONDON: &str = r#"[{"name":"London","local_names":{"en":"London","fr":"Londres"},"lat":51.5073219,"lon":-0.1276474,"country":"GB","state":"England"}]"#;

const LONDON_WEATHER: &str = r#"{"coord":{"lon":-0.1276,"lat":51.5073},"weather":[{"id":804,"main":"Clouds","description":"overcast clouds","icon":"04n"}],"base":"stations","main":{"temp":9.71,"feels_like":7.46,"temp_min":8.84,"temp_max":10.53,"pressure":1009,"humidity":88},"visibility":10000,"wind":{"speed":4.12,"deg":220},"clouds":{"all":100},"dt":1700000000,"sys":{"type":2,"id":2091269,"country":"GB","sunrise":1699945845,"sunset":1699978720},"timezone":0,"id":2643743,"name":"London","cod":200}"#;

#[test]
fn weather_by_city_end_to_end() {
    let upstream = Loopback::default();
    upstream.reply("200 OK", LONDON);
    upstream.reply("200 OK", LONDON_WEATHER);

    let mut owm = client(&upstream);
    let weather = owm.current_weather_by_city("London", Some("GB")).unwrap();

    assert_eq!(weather.name, "London");
    assert_eq!(weather.weather.description, "overcast clouds");
    assert_eq!(weather.main.pressure, 1009);
    assert_eq!(weather.clouds, 100);
    assert_eq!(
        weather.weather.icon_url(),
        "https://openweathermap.org/img/wn/04n@2x.png"
    );
    assert_eq!(owm.last_http_code(), 200);

    let requests = upstream.requests();
    assert_eq!(requests.len(), 2);
    assert!(requests[0].starts_with("GET /geo/1.0/direct?q=London,GB&limit=1&appid=0123abcd HTTP/1.1\r\n"));
    assert!(requests[1].starts_with(
        "GET /data/2.5/weather?lat=51.5073&lon=-0.1276&units=metric&lang=en&appid=0123abcd HTTP/1.1\r\n"
    ));
    assert!(requests[1].contains("Host: api.openweathermap.org\r\n"));

    // Same place again: answered from the cache, no third connection.
    let again = owm.current_weather(51.5073, -0.1276).unwrap();
    assert_eq!(again, weather);
    assert_eq!(upstream.requests().len(), 2);
}

#[test]
fn geocoding_results_in_order() {
    let upstream = Loopback::default();
    upstream.reply(
        "200 OK",
        r#"[{"name":"Springfield","lat":39.8,"lon":-89.6,"country":"US","state":"Illinois"},{"name":"Springfield","lat":37.2,"lon":-93.3,"country":"US","state":"Missouri"}]"#,
    );

    let mut owm = client(&upstream);
    let mut places: [GeoLocation; 5] = Default::default();
    let n = owm
        .coordinates_by_name("Springfield", Some("US"), None, &mut places)
        .unwrap();

    assert_eq!(n, 2);
    assert_eq!(places[0].state, "Illinois");
    assert_eq!(places[1].state, "Missouri");
    assert_eq!(places[2], GeoLocation::default());
}

#[test]
fn air_quality_reading() {
    let upstream = Loopback::default();
    upstream.reply(
        "200 OK",
        r#"{"coord":{"lon":50,"lat":50},"list":[{"main":{"aqi":3},"components":{"co":230.31,"no":0.01,"no2":1.15,"o3":76.53,"so2":0.51,"pm2_5":9.66,"pm10":12.34,"nh3":0.12},"dt":1700000000}]}"#,
    );

    let mut owm = client(&upstream);
    let reading = owm.air_pollution(50.0, 50.0).unwrap();
    assert_eq!(reading.quality(), AirQuality::Moderate);
    assert_eq!(reading.quality().description(), "Moderate");
    assert_eq!(reading.components.pm2_5, 9.66);
    assert_eq!(reading.dt, 1_700_000_000);
    assert!(upstream.requests()[0].starts_with("GET /data/2.5/air_pollution?lat=50.0000&lon=50.0000&appid="));
}

#[test]
fn air_pollution_forecast_respects_the_slice() {
    let entries: Vec<String> = (0..6)
        .map(|i| format!(r#"{{"main":{{"aqi":1}},"components":{{}},"dt":{}}}"#, 1_700_000_000 + i * 3600))
        .collect();
    let body = format!(r#"{{"list":[{}]}}"#, entries.join(","));
    let upstream = Loopback::default();
    upstream.reply("200 OK", &body);

    let mut owm = client(&upstream);
    let mut hours: [AirPollution; 4] = Default::default();
    let n = owm.air_pollution_forecast(1.0, 2.0, &mut hours).unwrap();
    assert_eq!(n, 4);
    assert_eq!(hours[3].dt, 1_700_010_800);
}

#[test]
fn forecast_in_imperial_units() {
    let upstream = Loopback::default();
    upstream.reply(
        "200 OK",
        r#"{"cod":"200","message":0,"cnt":2,"list":[{"dt":1700010000,"main":{"temp":48.2},"weather":[{"id":500,"main":"Rain","description":"light rain","icon":"10n"}],"pop":0.6,"rain":{"3h":0.4},"dt_txt":"2023-11-15 01:00:00"},{"dt":1700020800,"main":{"temp":47.1},"weather":[],"dt_txt":"2023-11-15 04:00:00"}],"city":{"name":"London","country":"GB","coord":{"lat":51.5073,"lon":-0.1276},"timezone":0,"sunrise":1699945845,"sunset":1699978720}}"#,
    );

    let mut owm = client(&upstream);
    owm.set_units(Units::Imperial);
    owm.set_language("fr");
    let forecast = owm.forecast(51.5073, -0.1276, 2).unwrap();

    assert_eq!(forecast.cnt(), 2);
    assert_eq!(forecast.city_name, "London");
    assert_eq!(forecast.items[0].weather.main, "Rain");
    assert_eq!(forecast.items[0].rain_3h, 0.4);
    assert_eq!(forecast.items[1].weather.id, 0);
    assert_eq!(forecast.items[1].dt_txt, "2023-11-15 04:00:00");
    assert!(upstream.requests()[0].contains("&units=imperial&lang=fr&cnt=2&appid="));
}

#[test]
fn http_errors_are_reported() {
    let upstream = Loopback::default();
    upstream.reply(
        "401 Unauthorized",
        r#"{"cod":401,"message":"Invalid API key. Please see https://openweathermap.org/faq#error401 for more info."}"#,
    );

    let mut owm = client(&upstream);
    assert_eq!(owm.current_weather(1.0, 2.0), Err(Error::Http(401)));
    assert_eq!(owm.last_http_code(), 401);
    assert_eq!(owm.last_error(), "HTTP Error: 401");
}

#[test]
fn silent_server_times_out() {
    let upstream = Loopback::default();
    upstream.0.borrow_mut().hang = true;
    upstream.reply("200 OK", "");

    let mut owm = client(&upstream);
    owm.set_timeout(Duration::from_millis(50));
    // Headers and empty body arrive, then the server never closes.
    assert_eq!(
        owm.air_pollution(1.0, 2.0),
        Err(Error::Transport(TransportError::ReadTimeout))
    );
    assert_eq!(owm.last_error(), "Response timeout");
    assert_eq!(upstream.requests().len(), 1, "connection was closed");
}

#[test]
fn unreachable_server() {
    let upstream = Loopback::default();
    let mut owm = client(&upstream);
    assert_eq!(
        owm.coordinates_by_zip("E14", "GB"),
        Err(Error::Transport(TransportError::ConnectFailed))
    );
    assert_eq!(owm.last_http_code(), 0);
    assert_eq!(owm.last_error(), "Connection failed");
}
