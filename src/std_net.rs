//! Plain TCP connector for hosted targets.

use std::{
    io,
    net::{SocketAddr, TcpStream, ToSocketAddrs},
    time::Duration as StdDuration,
};

use embassy_time::Duration;
use embedded_io::{ErrorKind, ErrorType, Read, ReadReady, Write};

use crate::weather::http::{Connector, TransportError};

fn error_kind(e: io::Error) -> ErrorKind {
    match e.kind() {
        io::ErrorKind::ConnectionRefused => ErrorKind::ConnectionRefused,
        io::ErrorKind::ConnectionReset => ErrorKind::ConnectionReset,
        io::ErrorKind::ConnectionAborted => ErrorKind::ConnectionAborted,
        io::ErrorKind::NotConnected => ErrorKind::NotConnected,
        io::ErrorKind::BrokenPipe => ErrorKind::BrokenPipe,
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => ErrorKind::TimedOut,
        io::ErrorKind::Interrupted => ErrorKind::Interrupted,
        io::ErrorKind::InvalidData => ErrorKind::InvalidData,
        _ => ErrorKind::Other,
    }
}

/// Opens `std::net::TcpStream`s. No TLS: secure requests are refused.
#[derive(Debug, Default, Clone)]
pub struct StdConnector {
    redirect: Option<SocketAddr>,
}

impl StdConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Send every connection to `addr` regardless of host and port, e.g. a
    /// local mock server. The `Host` header still names the requested host.
    pub fn redirected(addr: SocketAddr) -> Self {
        Self {
            redirect: Some(addr),
        }
    }

    fn resolve(&self, host: &str, port: u16) -> Result<Vec<SocketAddr>, TransportError> {
        if let Some(addr) = self.redirect {
            return Ok(vec![addr]);
        }
        (host, port)
            .to_socket_addrs()
            .map(Iterator::collect)
            .map_err(|e| {
                log::error!("Failed to resolve {}: {}", host, e);
                TransportError::ConnectFailed
            })
    }
}

impl Connector for StdConnector {
    type Connection = StdConnection;

    fn connect(
        &mut self,
        host: &str,
        port: u16,
        secure: bool,
        timeout: Duration,
    ) -> Result<StdConnection, TransportError> {
        if secure {
            log::error!("HTTPS requested but the std connector has no TLS");
            return Err(TransportError::ConnectFailed);
        }

        let timeout = StdDuration::from_millis(timeout.as_millis().max(1));
        let mut failure = TransportError::ConnectFailed;
        for addr in self.resolve(host, port)? {
            match TcpStream::connect_timeout(&addr, timeout) {
                Ok(stream) => {
                    stream
                        .set_read_timeout(Some(timeout))
                        .map_err(|_| TransportError::ConnectFailed)?;
                    return Ok(StdConnection { stream });
                }
                Err(e) => {
                    log::warn!("Connecting to {} failed: {}", addr, e);
                    if e.kind() == io::ErrorKind::TimedOut {
                        failure = TransportError::ConnectTimeout;
                    }
                }
            }
        }
        Err(failure)
    }
}

/// Connected stream; closed when dropped.
#[derive(Debug)]
pub struct StdConnection {
    stream: TcpStream,
}

impl ErrorType for StdConnection {
    type Error = ErrorKind;
}

impl Read for StdConnection {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        io::Read::read(&mut self.stream, buf).map_err(error_kind)
    }
}

impl Write for StdConnection {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        io::Write::write(&mut self.stream, buf).map_err(error_kind)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        io::Write::flush(&mut self.stream).map_err(error_kind)
    }
}

impl ReadReady for StdConnection {
    /// Ready when a byte is waiting or the peer has closed.
    fn read_ready(&mut self) -> Result<bool, Self::Error> {
        self.stream.set_nonblocking(true).map_err(error_kind)?;
        let mut peeked = [0u8; 1];
        let ready = match self.stream.peek(&mut peeked) {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(false),
            Err(e) => Err(error_kind(e)),
        };
        self.stream.set_nonblocking(false).map_err(error_kind)?;
        ready
    }
}
