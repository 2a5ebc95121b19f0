//! List the clients connected to a TP-Link router or access point.
//!
//! TP-Link has shipped several incompatible admin web UIs over the years.
//! [`RouterFactory`] probes them in turn and returns a router bound to the
//! one the device speaks.
//!
//! ```no_run
//! use tplink_scan::{ConnectionParams, Router, RouterFactory};
//!
//! # async fn run() -> tplink_scan::Result<()> {
//! let factory = RouterFactory::new(ConnectionParams::new("192.168.0.1", "admin", "admin"));
//! let mut router = factory.get_router().await?;
//! for device in router.scan_devices().await? {
//!     println!("{}", device);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod device;
pub mod error;
pub mod factory;
pub mod http;
pub mod routers;

#[cfg(test)]
mod testing;

pub use config::{ClientConfig, ConnectionParams};
pub use device::{Device, MacAddress};
pub use error::{Error, Result};
pub use factory::RouterFactory;
pub use routers::{Router, TpLinkRouter, Variant};
