pub mod archer_c20;
pub mod archer_c7;
pub mod archer_c9;
mod cgi;
pub mod eap;
pub mod json_grid;
pub mod legacy;
pub mod n600;
mod page;

use std::fmt;

use serde_json::Value;

use crate::config::ConnectionParams;
use crate::device::{Device, MacAddress};
use crate::error::{Error, Result};
use crate::http::{Response, Transport};

/// One firmware generation's login handshake and device list format
pub trait Router {
    fn descriptor(&self) -> &'static str;

    /// Checks that the router speaks this firmware's protocol.
    ///
    /// Probing is a full scan: only an authenticated device list proves the
    /// variant, and an empty list still counts as a match.
    async fn probe(&mut self) -> Result<()> {
        self.scan_devices().await.map(|_| ())
    }

    /// Establishes a session. Variants that send credentials with every
    /// request have nothing to do here.
    async fn login(&mut self) -> Result<()> {
        Ok(())
    }

    async fn scan_devices(&mut self) -> Result<Vec<Device>>;
}

/// Known firmware generations, in detection priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variant {
    EapV5,
    ArcherC7V4,
    ArcherC9V3,
    ArcherC20,
    JsonGridV2,
    N600V1,
    Legacy,
}

impl Variant {
    pub const ALL: [Variant; 7] = [
        Variant::EapV5,
        Variant::ArcherC7V4,
        Variant::ArcherC9V3,
        Variant::ArcherC20,
        Variant::JsonGridV2,
        Variant::N600V1,
        Variant::Legacy,
    ];

    pub fn tag(&self) -> &'static str {
        match self {
            Variant::EapV5 => "v5",
            Variant::ArcherC7V4 => "v4",
            Variant::ArcherC9V3 => "v3",
            Variant::ArcherC20 => "c20",
            Variant::JsonGridV2 => "v2",
            Variant::N600V1 => "v1",
            Variant::Legacy => "legacy",
        }
    }

    pub fn connect<T: Transport>(self, params: ConnectionParams, transport: T) -> TpLinkRouter<T> {
        match self {
            Variant::EapV5 => TpLinkRouter::EapV5(eap::Eap::new(params, transport)),
            Variant::ArcherC7V4 => {
                TpLinkRouter::ArcherC7V4(archer_c7::ArcherC7::new(params, transport))
            }
            Variant::ArcherC9V3 => {
                TpLinkRouter::ArcherC9V3(archer_c9::ArcherC9::new(params, transport))
            }
            Variant::ArcherC20 => {
                TpLinkRouter::ArcherC20(archer_c20::ArcherC20::new(params, transport))
            }
            Variant::JsonGridV2 => {
                TpLinkRouter::JsonGridV2(json_grid::JsonGrid::new(params, transport))
            }
            Variant::N600V1 => TpLinkRouter::N600V1(n600::N600::new(params, transport)),
            Variant::Legacy => TpLinkRouter::Legacy(legacy::Legacy::new(params, transport)),
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// A router bound to the variant detected for it
pub enum TpLinkRouter<T> {
    EapV5(eap::Eap<T>),
    ArcherC7V4(archer_c7::ArcherC7<T>),
    ArcherC9V3(archer_c9::ArcherC9<T>),
    ArcherC20(archer_c20::ArcherC20<T>),
    JsonGridV2(json_grid::JsonGrid<T>),
    N600V1(n600::N600<T>),
    Legacy(legacy::Legacy<T>),
}

macro_rules! dispatch {
    ($router:expr, $inner:ident => $call:expr) => {
        match $router {
            TpLinkRouter::EapV5($inner) => $call,
            TpLinkRouter::ArcherC7V4($inner) => $call,
            TpLinkRouter::ArcherC9V3($inner) => $call,
            TpLinkRouter::ArcherC20($inner) => $call,
            TpLinkRouter::JsonGridV2($inner) => $call,
            TpLinkRouter::N600V1($inner) => $call,
            TpLinkRouter::Legacy($inner) => $call,
        }
    };
}

impl<T> TpLinkRouter<T> {
    pub fn variant(&self) -> Variant {
        match self {
            TpLinkRouter::EapV5(_) => Variant::EapV5,
            TpLinkRouter::ArcherC7V4(_) => Variant::ArcherC7V4,
            TpLinkRouter::ArcherC9V3(_) => Variant::ArcherC9V3,
            TpLinkRouter::ArcherC20(_) => Variant::ArcherC20,
            TpLinkRouter::JsonGridV2(_) => Variant::JsonGridV2,
            TpLinkRouter::N600V1(_) => Variant::N600V1,
            TpLinkRouter::Legacy(_) => Variant::Legacy,
        }
    }
}

impl<T: Transport> Router for TpLinkRouter<T> {
    fn descriptor(&self) -> &'static str {
        dispatch!(self, router => router.descriptor())
    }

    async fn probe(&mut self) -> Result<()> {
        dispatch!(self, router => router.probe().await)
    }

    async fn login(&mut self) -> Result<()> {
        dispatch!(self, router => router.login().await)
    }

    async fn scan_devices(&mut self) -> Result<Vec<Device>> {
        dispatch!(self, router => router.scan_devices().await)
    }
}

fn referer(host: &str) -> String {
    format!("http://{}", host)
}

/// Decodes a JSON body, treating an HTML page as a bounce to the login screen
fn json_body(response: &Response) -> Result<Value> {
    match serde_json::from_str(response.body.trim()) {
        Ok(value) => Ok(value),
        Err(err) => {
            if response.body.to_ascii_lowercase().contains("<html") {
                Err(Error::Authentication(
                    "router answered with an HTML page instead of JSON".into(),
                ))
            } else {
                Err(Error::Parse(format!("router didn't respond with JSON: {}", err)))
            }
        }
    }
}

/// The `data` array most JSON endpoints wrap their rows in
fn data_array(json: &Value) -> Result<&Vec<Value>> {
    json.get("data")
        .and_then(Value::as_array)
        .ok_or_else(|| Error::Parse("JSON response without a data array".into()))
}

fn mac_field(entry: &Value, key: &str) -> Result<MacAddress> {
    entry
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| Error::Parse(format!("device entry without {}", key)))?
        .parse()
}

fn str_field<'a>(entry: &'a Value, key: &str) -> Option<&'a str> {
    entry.get(key).and_then(Value::as_str)
}
