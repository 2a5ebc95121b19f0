//! Normalized records for clients connected to a router

use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use crate::error::Error;

/// Hardware address of a client
///
/// Firmware reports MACs either hyphenated (`AA-BB-CC-DD-EE-FF`) or with
/// colons; both parse to the same value and always print with colons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MacAddress([u8; 6]);

impl MacAddress {
    pub fn new(octets: [u8; 6]) -> Self {
        Self(octets)
    }

    pub fn octets(&self) -> [u8; 6] {
        self.0
    }
}

impl FromStr for MacAddress {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let parts: Vec<&str> = s.split(|c| c == ':' || c == '-').collect();
        if parts.len() != 6 {
            return Err(Error::Parse(format!("invalid MAC address {s:?}")));
        }
        let mut octets = [0u8; 6];
        for (octet, part) in octets.iter_mut().zip(parts) {
            if part.len() != 2 || !part.bytes().all(|b| b.is_ascii_hexdigit()) {
                return Err(Error::Parse(format!("invalid MAC address {s:?}")));
            }
            *octet = u8::from_str_radix(part, 16)
                .map_err(|_| Error::Parse(format!("invalid MAC address {s:?}")))?;
        }
        Ok(Self(octets))
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02X}:{b:02X}:{c:02X}:{d:02X}:{e:02X}:{g:02X}")
    }
}

/// One client connected to the router
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    pub mac: MacAddress,
    pub name: Option<String>,
    pub ip: Option<IpAddr>,
}

impl Device {
    pub fn new(mac: MacAddress) -> Self {
        Self {
            mac,
            name: None,
            ip: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        // Firmware uses an empty string or "--" for unnamed hosts
        if !name.is_empty() && name != "--" {
            self.name = Some(name);
        }
        self
    }

    pub fn with_ip(mut self, ip: Option<IpAddr>) -> Self {
        self.ip = ip;
        self
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.mac)?;
        if let Some(name) = &self.name {
            write!(f, " {name}")?;
        }
        if let Some(ip) = &self.ip {
            write!(f, " {ip}")?;
        }
        Ok(())
    }
}
