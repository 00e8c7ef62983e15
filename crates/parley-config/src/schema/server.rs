use serde::{Deserialize, Serialize};

/// Listener and queue settings for the relay server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind.
    pub host: String,
    pub port: u16,
    /// Per-connection outbound event queue depth.
    pub outbound_capacity: usize,
    /// Depth of the coordinator's command queue.
    pub command_capacity: usize,
    /// Seconds allowed for the WebSocket handshake.
    pub handshake_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 5000,
            outbound_capacity: 256,
            command_capacity: 1024,
            handshake_timeout_secs: 10,
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
