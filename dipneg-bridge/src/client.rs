//! Bridge client.
//!
//! Opens one TCP connection per request, sends a framed [`BandanaRequest`]
//! and waits for the framed [`DiplomacyGymResponse`].

use crate::framing::{BridgeError, read_frame, write_frame};
use crate::proto::{BandanaRequest, DiplomacyGymResponse};
use serde::{Deserialize, Serialize};
use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::{Duration, Instant};

/// Default server address.
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 5000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    pub host: String,
    pub port: u16,
    /// Connection timeout in milliseconds
    pub connect_timeout_ms: u64,
    /// Read timeout in milliseconds (policy evaluation can take a while)
    pub read_timeout_ms: u64,
    pub write_timeout_ms: u64,
    /// Time kept back from the round deadline when bounding a request.
    pub safety_margin_ms: u64,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            connect_timeout_ms: 1000,
            read_timeout_ms: 30000,
            write_timeout_ms: 5000,
            safety_margin_ms: 100,
        }
    }
}

impl BridgeConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn with_address(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Self::default()
        }
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn safety_margin(&self) -> Duration {
        Duration::from_millis(self.safety_margin_ms)
    }
}

pub struct BridgeClient {
    config: BridgeConfig,
}

impl BridgeClient {
    pub fn new(config: BridgeConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    fn resolve(&self) -> Result<SocketAddr, BridgeError> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        addr.to_socket_addrs()
            .map_err(|e| BridgeError::Unavailable(format!("{}: {}", addr, e)))?
            .next()
            .ok_or_else(|| BridgeError::Unavailable(format!("{} did not resolve", addr)))
    }

    /// One request/response exchange. The whole exchange, connect included,
    /// finishes or fails with [`BridgeError::Timeout`] within `budget`.
    pub fn exchange(
        &self,
        request: &BandanaRequest,
        budget: Duration,
    ) -> Result<DiplomacyGymResponse, BridgeError> {
        if budget.is_zero() {
            return Err(BridgeError::Timeout);
        }
        let deadline = Instant::now() + budget;
        let addr = self.resolve()?;
        let connect_timeout = budget.min(Duration::from_millis(self.config.connect_timeout_ms));

        log::debug!("Connecting to bridge at {}", addr);
        let stream = TcpStream::connect_timeout(&addr, connect_timeout).map_err(|e| {
            log::warn!("Could not connect to bridge at {}: {}", addr, e);
            BridgeError::Unavailable(format!("{}: {}", addr, e))
        })?;
        stream.set_nodelay(true).ok(); // Disable Nagle for lower latency

        let mut stream = DeadlineStream {
            stream,
            deadline,
            read_cap: self.config.read_timeout(),
            write_cap: Duration::from_millis(self.config.write_timeout_ms),
        };
        write_frame(&mut stream, request)?;
        let response = read_frame(&mut stream)?;
        log::debug!("Bridge exchange with {} complete", addr);
        Ok(response)
    }
}

/// A socket whose every read and write is bounded by the time left until a
/// fixed deadline, so a peer trickling bytes cannot stretch the exchange.
struct DeadlineStream {
    stream: TcpStream,
    deadline: Instant,
    read_cap: Duration,
    write_cap: Duration,
}

impl DeadlineStream {
    fn remaining(&self, cap: Duration) -> io::Result<Duration> {
        let left = self.deadline.saturating_duration_since(Instant::now());
        if left.is_zero() {
            return Err(io::ErrorKind::TimedOut.into());
        }
        Ok(left.min(cap))
    }
}

impl Read for DeadlineStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let timeout = self.remaining(self.read_cap)?;
        self.stream.set_read_timeout(Some(timeout))?;
        self.stream.read(buf)
    }
}

impl Write for DeadlineStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let timeout = self.remaining(self.write_cap)?;
        self.stream.set_write_timeout(Some(timeout))?;
        self.stream.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.stream.flush()
    }
}
