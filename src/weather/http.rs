use core::fmt::Write as _;
use embassy_time::{Duration, Instant, block_for};
use embedded_io::{Read, ReadReady, Write};
use heapless::{String, Vec};

use crate::config::{HTTP_PORT, HTTPS_PORT, POLL_INTERVAL};

const REQUEST_CAPACITY: usize = 512;
const STATUS_LINE_CAPACITY: usize = 32;
const READ_CHUNK: usize = 256;

/// Transport-level failure of a GET exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("Connection failed")]
    ConnectFailed,
    #[error("Connection timeout")]
    ConnectTimeout,
    #[error("Response timeout")]
    ReadTimeout,
    #[error("Failed to send request")]
    SendFailed,
    #[error("Socket read error")]
    ReadFailed,
    /// Peer closed before the blank line ending the headers.
    #[error("Malformed HTTP response")]
    MalformedResponse,
    /// Body larger than the receive buffer.
    #[error("Response too large")]
    ResponseTooLarge,
}

/// One GET exchange to perform.
#[derive(Debug, Clone, Copy)]
pub struct GetRequest<'a> {
    pub host: &'a str,
    pub path: &'a str,
    pub secure: bool,
    /// Absolute budget for the whole exchange.
    pub timeout: Duration,
}

impl GetRequest<'_> {
    pub fn port(&self) -> u16 {
        if self.secure { HTTPS_PORT } else { HTTP_PORT }
    }
}

/// Status and body length of a completed exchange.
///
/// The body itself sits in the first `body_len` bytes of the buffer handed
/// to [`Transport::perform_get`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body_len: usize,
}

/// Something that can run a blocking HTTP GET.
///
/// Implementations must release their connection on every return path.
pub trait Transport {
    fn perform_get(
        &mut self,
        request: &GetRequest<'_>,
        body: &mut [u8],
    ) -> Result<HttpResponse, TransportError>;
}

/// Opens byte streams to remote hosts.
///
/// TLS, when `secure` is set, is the connector's business: the returned
/// connection must already carry plaintext HTTP. Dropping the connection
/// closes it.
pub trait Connector {
    type Connection: Read + Write + ReadReady;

    fn connect(
        &mut self,
        host: &str,
        port: u16,
        secure: bool,
        timeout: Duration,
    ) -> Result<Self::Connection, TransportError>;
}

/// Raw-socket transport: writes the request itself and polls the connection
/// for the response.
pub struct SocketTransport<C> {
    connector: C,
}

impl<C: Connector> SocketTransport<C> {
    pub fn new(connector: C) -> Self {
        Self { connector }
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }
}

impl<C: Connector> Transport for SocketTransport<C> {
    fn perform_get(
        &mut self,
        request: &GetRequest<'_>,
        body: &mut [u8],
    ) -> Result<HttpResponse, TransportError> {
        let deadline = Instant::now() + request.timeout;

        log::debug!("connecting to {}:{}...", request.host, request.port());
        let mut conn = self.connector.connect(
            request.host,
            request.port(),
            request.secure,
            request.timeout,
        )?;
        log::debug!("connected");

        // `conn` is dropped, and so closed, whichever way this returns.
        exchange(&mut conn, request, deadline, body)
    }
}

/// Build the request head: GET line, `Host` and `Connection: close`.
pub fn build_http_request<const N: usize>(
    host: &str,
    path: &str,
) -> Result<String<N>, TransportError> {
    let mut req: String<N> = String::new();
    write!(
        req,
        "GET {} HTTP/1.1\r\nHost: {}\r\nConnection: close\r\n\r\n",
        path, host
    )
    .map_err(|_| TransportError::SendFailed)?;
    Ok(req)
}

fn exchange<S: Read + Write + ReadReady>(
    conn: &mut S,
    request: &GetRequest<'_>,
    deadline: Instant,
    body: &mut [u8],
) -> Result<HttpResponse, TransportError> {
    let head: String<REQUEST_CAPACITY> = build_http_request(request.host, request.path)
        .inspect_err(|_| log::error!("HTTP request for {} is too long", request.host))?;

    if let Err(e) = conn.write_all(head.as_bytes()).and_then(|_| conn.flush()) {
        log::error!("Failed to send HTTP request: {:?}", e);
        return Err(TransportError::SendFailed);
    }
    log::debug!("HTTP request sent");

    let mut parser = ResponseHead::default();
    let mut body_len = 0;
    let mut chunk = [0u8; READ_CHUNK];

    loop {
        if Instant::now() >= deadline {
            log::error!("Timed out while reading HTTP response");
            return Err(TransportError::ReadTimeout);
        }

        match conn.read_ready() {
            Ok(true) => {}
            Ok(false) => {
                block_for(POLL_INTERVAL);
                continue;
            }
            Err(e) => {
                log::error!("Socket read error: {:?}", e);
                return Err(TransportError::ReadFailed);
            }
        }

        let n = match conn.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) => {
                log::error!("Socket read error: {:?}", e);
                return Err(TransportError::ReadFailed);
            }
        };

        let mut bytes = &chunk[..n];
        if !parser.complete {
            let used = parser.feed(bytes);
            bytes = &bytes[used..];
        }
        if bytes.is_empty() {
            continue;
        }

        let end = body_len + bytes.len();
        if end > body.len() {
            log::error!("HTTP response body exceeds {} bytes", body.len());
            return Err(TransportError::ResponseTooLarge);
        }
        body[body_len..end].copy_from_slice(bytes);
        body_len = end;
    }

    if !parser.complete {
        log::error!("connection closed before end of HTTP headers");
        return Err(TransportError::MalformedResponse);
    }

    log::info!("Received HTTP {} with {} body bytes", parser.status, body_len);
    Ok(HttpResponse {
        status: parser.status,
        body_len,
    })
}

/// Incremental parser for the status line and header block.
///
/// Only the status code is kept; every other header is skipped.
#[derive(Default)]
struct ResponseHead {
    status: u16,
    line: Vec<u8, STATUS_LINE_CAPACITY>,
    line_len: usize,
    /// Header lines finished so far; only the first carries the status.
    lines: usize,
    complete: bool,
}

impl ResponseHead {
    /// Consume header bytes. Returns how many bytes of `bytes` belonged to
    /// the head; the rest is body.
    fn feed(&mut self, bytes: &[u8]) -> usize {
        for (i, &b) in bytes.iter().enumerate() {
            match b {
                b'\n' => {
                    if self.line_len == 0 {
                        self.complete = true;
                        return i + 1;
                    }
                    if self.lines == 0 {
                        if let Some(status) = parse_status_line(&self.line) {
                            self.status = status;
                        }
                    }
                    self.lines += 1;
                    self.line.clear();
                    self.line_len = 0;
                }
                b'\r' => {}
                _ => {
                    self.line_len += 1;
                    let _ = self.line.push(b);
                }
            }
        }
        bytes.len()
    }
}

/// `HTTP/1.1 404 Not Found` -> `404`.
fn parse_status_line(line: &[u8]) -> Option<u16> {
    if !line.starts_with(b"HTTP/") {
        return None;
    }
    let line = core::str::from_utf8(line).ok()?;
    line.split(' ')
        .nth(1)
        .and_then(|code| code.get(..3))
        .and_then(|code| code.parse().ok())
}
