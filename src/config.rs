use std::net::IpAddr;
use std::time::Duration;

/// Credentials and address of the router's admin interface
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionParams {
    pub host: String,
    pub username: String,
    pub password: String,
}

impl ConnectionParams {
    pub fn new(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            username: username.into(),
            password: password.into(),
        }
    }

    /// Params for a router known only by address; IPv6 literals are
    /// bracketed so they can go into URLs and the `Host` header
    pub fn for_address(
        ip: IpAddr,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        let host = match ip {
            IpAddr::V4(ip) => ip.to_string(),
            IpAddr::V6(ip) => format!("[{}]", ip),
        };
        Self::new(host, username, password)
    }
}

/// Transport settings for talking to the admin interface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientConfig {
    /// TCP port of the web UI
    pub port: u16,
    /// Upper bound for connect plus reading the whole response
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            port: 80,
            timeout: Duration::from_secs(4),
        }
    }
}
