//! Relay server configuration

use std::net::SocketAddr;

/// Relay configuration options
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Address to bind to
    pub bind_addr: SocketAddr,

    /// Origins allowed to open a signaling connection (empty = allow all)
    pub allowed_origins: Vec<String>,

    /// Per-connection outgoing message buffer
    pub outgoing_buffer: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:5000".parse().unwrap(),
            allowed_origins: Vec::new(),
            outgoing_buffer: 64,
        }
    }
}

impl RelayConfig {
    /// Build a config from the environment
    ///
    /// Reads `HUDDLE_BIND` (or `PORT` as a fallback for the port alone) and
    /// `HUDDLE_ALLOWED_ORIGINS` as a comma-separated list.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(bind) = std::env::var("HUDDLE_BIND") {
            if let Ok(addr) = bind.parse() {
                config.bind_addr = addr;
            }
        } else if let Ok(port) = std::env::var("PORT") {
            if let Ok(port) = port.parse() {
                config.bind_addr.set_port(port);
            }
        }

        if let Ok(origins) = std::env::var("HUDDLE_ALLOWED_ORIGINS") {
            config.allowed_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
        }

        config
    }

    /// Set the bind address
    pub fn bind(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    /// Restrict accepted Origin headers to the given list
    pub fn allowed_origins(mut self, origins: Vec<String>) -> Self {
        self.allowed_origins = origins;
        self
    }

    /// Set the per-connection outgoing buffer size
    pub fn outgoing_buffer(mut self, size: usize) -> Self {
        self.outgoing_buffer = size.max(1);
        self
    }

    /// Whether a connection with this Origin header may be accepted
    pub fn origin_allowed(&self, origin: Option<&str>) -> bool {
        if self.allowed_origins.is_empty() {
            return true;
        }
        match origin {
            Some(origin) => self.allowed_origins.iter().any(|o| o == origin),
            // Non-browser clients send no Origin header
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RelayConfig::default();

        assert_eq!(config.bind_addr.port(), 5000);
        assert!(config.allowed_origins.is_empty());
        assert_eq!(config.outgoing_buffer, 64);
    }

    #[test]
    fn test_builder_chaining() {
        let addr: SocketAddr = "127.0.0.1:9000".parse().unwrap();
        let config = RelayConfig::default()
            .bind(addr)
            .allowed_origins(vec!["http://localhost:3000".to_string()])
            .outgoing_buffer(16);

        assert_eq!(config.bind_addr, addr);
        assert_eq!(config.allowed_origins.len(), 1);
        assert_eq!(config.outgoing_buffer, 16);
    }

    #[test]
    fn test_origin_allowed() {
        let config = RelayConfig::default()
            .allowed_origins(vec!["https://meet.example.com".to_string()]);

        assert!(config.origin_allowed(Some("https://meet.example.com")));
        assert!(!config.origin_allowed(Some("https://evil.example.com")));
        // No Origin header is fine (native clients)
        assert!(config.origin_allowed(None));

        let open = RelayConfig::default();
        assert!(open.origin_allowed(Some("https://anything.example.com")));
    }
}
