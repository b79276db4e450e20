use std::io::{self, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::str::Utf8Error;
use std::thread;
use std::time::Duration;

use city_proto::{Request, Response, ResponseError};
use thiserror::Error;
use tracing::{debug, error, trace};

use crate::config::{ClientConfig, DEFAULT_TIMEOUT};

/// Message returned once every attempt was refused or timed out.
pub const CONNECTION_FAILED: &str = "connection failed";

/// One request/response exchange with the engine.
pub trait Transport {
    /// Sends `payload` and returns whatever the engine wrote back.
    fn round_trip(&self, payload: &[u8]) -> io::Result<Vec<u8>>;

    /// Waits between attempts.
    fn pause(&self, duration: Duration) {
        thread::sleep(duration);
    }
}

/// Opens a fresh TCP connection for every exchange.
#[derive(Debug, Clone)]
pub struct TcpTransport {
    address: String,
    timeout: Duration,
    recv_buffer_bytes: usize,
}

impl TcpTransport {
    /// A zero `timeout` falls back to [`DEFAULT_TIMEOUT`]; every attempt is
    /// bounded.
    pub fn new(address: impl Into<String>, timeout: Duration, recv_buffer_bytes: usize) -> Self {
        Self {
            address: address.into(),
            timeout: if timeout.is_zero() {
                DEFAULT_TIMEOUT
            } else {
                timeout
            },
            recv_buffer_bytes: recv_buffer_bytes.max(1),
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.address(), config.timeout, config.recv_buffer_bytes)
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn connect(&self) -> io::Result<TcpStream> {
        let mut last_err = None;
        for addr in self.address.to_socket_addrs()? {
            match TcpStream::connect_timeout(&addr, self.timeout) {
                Ok(stream) => return Ok(stream),
                Err(err) => {
                    trace!(target: "city_client::transport", %addr, error = %err, "connect.candidate_failed");
                    last_err = Some(err);
                }
            }
        }
        Err(last_err.unwrap_or_else(|| {
            io::Error::new(
                io::ErrorKind::AddrNotAvailable,
                format!("no addresses resolved for {}", self.address),
            )
        }))
    }
}

impl Transport for TcpTransport {
    fn round_trip(&self, payload: &[u8]) -> io::Result<Vec<u8>> {
        let mut stream = self.connect()?;
        stream.set_read_timeout(Some(self.timeout))?;
        stream.set_write_timeout(Some(self.timeout))?;
        stream.write_all(payload)?;
        stream.flush()?;

        // The engine answers with one JSON object and no framing, so a single
        // read is all the protocol offers.
        let mut buffer = vec![0u8; self.recv_buffer_bytes];
        let read = stream.read(&mut buffer)?;
        buffer.truncate(read);
        Ok(buffer)
    }
}

/// Fixed-backoff retry for refused or timed-out exchanges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    backoff: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn backoff(&self) -> Duration {
        self.backoff
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(200))
    }
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("{0}")]
    Io(#[from] io::Error),
    #[error("engine closed the connection without replying")]
    EmptyReply,
    #[error("reply is not valid UTF-8: {0}")]
    Utf8(#[from] Utf8Error),
    #[error(transparent)]
    Response(#[from] ResponseError),
    #[error("failed to encode request: {0}")]
    Encode(#[source] serde_json::Error),
}

impl TransportError {
    /// Refusals and timeouts are worth another attempt; everything else is
    /// final for the call.
    pub fn is_retryable(&self) -> bool {
        match self {
            TransportError::Io(err) => matches!(
                err.kind(),
                io::ErrorKind::ConnectionRefused
                    | io::ErrorKind::TimedOut
                    | io::ErrorKind::WouldBlock
            ),
            _ => false,
        }
    }
}

/// Sends `request` and returns the engine's reply unmodified.
///
/// Failures never escape as `Err`: after `policy.max_attempts()` refused or
/// timed-out attempts the result is a `connection failed` error response, and
/// any other failure becomes an error response carrying its description.
pub fn send_command<T>(transport: &T, policy: &RetryPolicy, request: &Request) -> Response
where
    T: Transport + ?Sized,
{
    let action = request.action();
    let payload = match request.to_json() {
        Ok(payload) => payload,
        Err(err) => return Response::error(TransportError::Encode(err).to_string()),
    };
    debug!(
        target: "city_client::transport",
        action,
        payload = %String::from_utf8_lossy(&payload),
        "command.sent"
    );

    let mut attempt = 0;
    loop {
        attempt += 1;
        match exchange(transport, &payload) {
            Ok(response) => {
                debug!(
                    target: "city_client::transport",
                    action,
                    attempt,
                    status = response.status().unwrap_or("<missing>"),
                    "command.received"
                );
                return response;
            }
            Err(err) if err.is_retryable() => {
                if attempt >= policy.max_attempts() {
                    error!(
                        target: "city_client::transport",
                        action,
                        attempts = attempt,
                        error = %err,
                        "command.failed"
                    );
                    return Response::error(CONNECTION_FAILED);
                }
                debug!(
                    target: "city_client::transport",
                    action,
                    attempt,
                    backoff_ms = policy.backoff().as_millis() as u64,
                    error = %err,
                    "command.retry"
                );
                transport.pause(policy.backoff());
            }
            Err(err) => {
                error!(
                    target: "city_client::transport",
                    action,
                    error = %err,
                    "command.error"
                );
                return Response::error(err.to_string());
            }
        }
    }
}

fn exchange<T>(transport: &T, payload: &[u8]) -> Result<Response, TransportError>
where
    T: Transport + ?Sized,
{
    let reply = transport.round_trip(payload)?;
    if reply.is_empty() {
        return Err(TransportError::EmptyReply);
    }
    let text = std::str::from_utf8(&reply)?;
    trace!(target: "city_client::transport", reply = text, "command.reply");
    Ok(Response::from_slice(text.as_bytes())?)
}
