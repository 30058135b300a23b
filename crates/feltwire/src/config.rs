//! Client configuration.

use std::time::Duration;

/// Defaults match the public table server's expectations.
pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(5);
pub const DEFAULT_EVENT_CAPACITY: usize = 256;
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(1);

/// Tunable parameters for a [`TableClient`](crate::TableClient).
///
/// Built with `with_*` setters:
///
/// ```rust
/// use std::time::Duration;
/// use feltwire::ClientConfig;
///
/// let config = ClientConfig::new()
///     .with_host("table.example.net")
///     .with_port(443)
///     .with_heartbeat_interval(Duration::from_secs(15));
/// assert_eq!(config.url(), "ws://table.example.net:443");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Server hostname.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Interval between keepalive heartbeats. Zero disables heartbeats.
    pub heartbeat_interval: Duration,
    /// Delay before the single reconnection attempt after an unexpected
    /// connection loss.
    pub reconnect_delay: Duration,
    /// Capacity of the event channel handed to the caller. When the
    /// caller falls behind, non-terminal events are dropped (and logged)
    /// rather than blocking the connection manager.
    pub event_channel_capacity: usize,
    /// How long [`shutdown`](crate::TableClient::shutdown) waits for the
    /// manager task to exit cleanly before aborting it.
    pub shutdown_timeout: Duration,
}

impl ClientConfig {
    /// Creates a configuration with the default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the server hostname.
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Sets the server port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the heartbeat interval. Zero disables heartbeats.
    pub fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }

    /// Sets the reconnection delay.
    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    /// Sets the event channel capacity. Clamped to at least 1 so the
    /// terminal `Disconnected` event always has somewhere to go.
    pub fn with_event_channel_capacity(mut self, capacity: usize) -> Self {
        self.event_channel_capacity = capacity.max(1);
        self
    }

    /// Sets the shutdown timeout.
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    /// The WebSocket URL this configuration dials.
    pub fn url(&self) -> String {
        format!("ws://{}:{}", self.host, self.port)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            event_channel_capacity: DEFAULT_EVENT_CAPACITY,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
        }
    }
}
