//! Minimal HTTP/1.0 client for router admin pages
//!
//! Router web servers are small embedded daemons. Requests are written by
//! hand over a fresh TCP connection and the response is read until the
//! server closes it, then parsed with `httparse`.

use std::net::{IpAddr, SocketAddr};

use base64::prelude::*;
use cookie::Cookie;
use httparse::Status;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, trace};
use url::Url;

use crate::config::ClientConfig;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: Method,
    /// Path plus query string
    pub target: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl Request {
    pub fn get(target: impl Into<String>) -> Self {
        Self::new(Method::Get, target)
    }

    pub fn post(target: impl Into<String>) -> Self {
        Self::new(Method::Post, target)
    }

    fn new(method: Method, target: impl Into<String>) -> Self {
        Self {
            method,
            target: target.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Url-encoded form body
    pub fn form(self, fields: &[(&str, &str)]) -> Self {
        let body = fields
            .iter()
            .map(|(key, value)| {
                format!("{}={}", urlencoding::encode(key), urlencoding::encode(value))
            })
            .collect::<Vec<_>>()
            .join("&");
        self.header("Content-Type", "application/x-www-form-urlencoded; charset=UTF-8")
            .body(body)
    }

    /// Path without the query string
    pub fn path(&self) -> &str {
        self.target
            .split_once('?')
            .map_or(self.target.as_str(), |(path, _)| path)
    }

    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn render(&self, host: &str) -> String {
        let firstline = format!("{} {} HTTP/1.0", self.method.as_str(), self.target);
        let host = format!("Host: {}", host);
        let mut lines = vec![firstline, host];
        lines.extend(
            self.headers
                .iter()
                .map(|(name, value)| format!("{}: {}", name, value)),
        );
        lines.push("Connection: close".into());
        match &self.body {
            Some(body) => {
                lines.push(format!("Content-Length: {}", body.len()));
                lines.push(String::new());
                lines.push(body.clone());
            }
            None => {
                lines.push(String::new());
                lines.push(String::new());
            }
        }
        lines.join("\r\n")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl Response {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn parse(payload: &[u8]) -> Result<Self> {
        let mut headers = [httparse::EMPTY_HEADER; 64];
        let mut response = httparse::Response::new(&mut headers);
        let size = match response
            .parse(payload)
            .map_err(|err| Error::Parse(format!("malformed HTTP response: {}", err)))?
        {
            Status::Complete(size) => size,
            Status::Partial => return Err(Error::Parse("truncated HTTP response header".into())),
        };
        let status = response
            .code
            .ok_or_else(|| Error::Parse("HTTP response without status".into()))?;
        let headers = response
            .headers
            .iter()
            .map(|header| {
                (
                    header.name.to_string(),
                    String::from_utf8_lossy(header.value).into_owned(),
                )
            })
            .collect();
        let body = String::from_utf8_lossy(&payload[size..]).into_owned();
        Ok(Self {
            status,
            headers,
            body,
        })
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Cookies set by this response, unparseable ones skipped
    pub fn cookies(&self) -> Vec<Cookie<'static>> {
        self.headers
            .iter()
            .filter(|(key, _)| key.eq_ignore_ascii_case("Set-Cookie"))
            .filter_map(|(_, value)| Cookie::parse_encoded(value.clone()).ok())
            .collect()
    }

    /// Maps 401/403 to an auth failure and any other non-2xx to an error
    pub fn error_for_status(self, path: &str) -> Result<Self> {
        match self.status {
            200..=299 => Ok(self),
            401 | 403 => Err(Error::Authentication(format!(
                "HTTP {} from {}",
                self.status, path
            ))),
            status => Err(Error::UnexpectedStatus {
                status,
                path: path.to_string(),
            }),
        }
    }
}

/// Sends one request to the router and returns its full response
pub trait Transport {
    async fn send(&self, host: &str, request: &Request) -> Result<Response>;
}

/// Plain TCP transport, one connection per request
#[derive(Debug, Clone, Default)]
pub struct TcpTransport {
    config: ClientConfig,
}

impl TcpTransport {
    pub fn new(config: ClientConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    async fn connect(&self, host: &str) -> Result<TcpStream> {
        let stream = match socket_addr(host, self.config.port) {
            Some(addr) => TcpStream::connect(addr).await,
            None => TcpStream::connect((host, self.config.port)).await,
        };
        stream.map_err(|err| Error::Network(format!("could not connect to {}: {}", host, err)))
    }

    async fn exchange(&self, host: &str, request: &Request) -> Result<Response> {
        let mut stream = self.connect(host).await?;
        stream.write_all(request.render(host).as_bytes()).await?;
        stream.flush().await?;
        let mut payload = Vec::new();
        stream.read_to_end(&mut payload).await?;
        Response::parse(&payload)
    }
}

impl Transport for TcpTransport {
    async fn send(&self, host: &str, request: &Request) -> Result<Response> {
        debug!("{} http://{}{}", request.method.as_str(), host, request.target);
        let response = timeout(self.config.timeout, self.exchange(host, request)).await??;
        debug!("HTTP {} from {}", response.status, request.path());
        trace!("body: {}", response.body);
        Ok(response)
    }
}

/// Literal address of a host string: `ip`, `[ipv6]`, or either with a port
fn socket_addr(host: &str, port: u16) -> Option<SocketAddr> {
    if let Ok(addr) = host.parse::<SocketAddr>() {
        return Some(addr);
    }
    let bare = host
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .unwrap_or(host);
    bare.parse::<IpAddr>()
        .ok()
        .map(|ip| SocketAddr::new(ip, port))
}

/// Builds a request target from a path and query pairs
pub fn target(host: &str, path: &str, query: &[(&str, &str)]) -> Result<String> {
    let mut url = Url::parse(&format!("http://{}{}", host, path))
        .map_err(|err| Error::Network(format!("invalid router address {}: {}", host, err)))?;
    if !query.is_empty() {
        url.query_pairs_mut().extend_pairs(query);
    }
    Ok(match url.query() {
        Some(query) => format!("{}?{}", url.path(), query),
        None => url.path().to_string(),
    })
}

/// `Basic` credential string shared by the header and cookie auth schemes
pub fn basic_credentials(username: &str, password: &str) -> String {
    format!(
        "Basic {}",
        BASE64_STANDARD.encode(format!("{}:{}", username, password))
    )
}

/// Cookie header value for the firmwares that expect auth in a cookie
pub fn authorization_cookie(username: &str, password: &str) -> String {
    format!("Authorization={}", basic_credentials(username, password))
}
