//! Archer C20, firmware 160427: LAN host table from `/cgi?5`

use tracing::info;

use super::{cgi, referer, Router};
use crate::config::ConnectionParams;
use crate::device::Device;
use crate::error::{Error, Result};
use crate::http::{authorization_cookie, Request, Transport};

const HOST_TABLE: &str = "/cgi?5";
const HOST_TABLE_QUERY: &str = "[LAN_HOST_ENTRY#0,0,0,0,0,0#0,0,0,0,0,0]0,0\r\n";

pub struct ArcherC20<T> {
    params: ConnectionParams,
    transport: T,
}

impl<T: Transport> ArcherC20<T> {
    pub fn new(params: ConnectionParams, transport: T) -> Self {
        Self { params, transport }
    }
}

impl<T: Transport> Router for ArcherC20<T> {
    fn descriptor(&self) -> &'static str {
        "TP-Link Archer C20"
    }

    async fn scan_devices(&mut self) -> Result<Vec<Device>> {
        info!("Loading LAN hosts...");
        let host = &self.params.host;
        let request = Request::post(HOST_TABLE)
            .header("Referer", referer(host))
            .header(
                "Cookie",
                authorization_cookie(&self.params.username, &self.params.password),
            )
            .body(HOST_TABLE_QUERY);
        let response = self
            .transport
            .send(host, &request)
            .await?
            .error_for_status(HOST_TABLE)?;

        let mut devices = Vec::new();
        for section in cgi::parse(&response.body)? {
            let Some(ip) = section.get("IPAddress") else {
                continue;
            };
            let mac = section
                .get("MACAddress")
                .ok_or_else(|| Error::Parse(format!("host {} without MACAddress", ip)))?
                .parse()?;
            let device = Device::new(mac)
                .with_name(section.get("hostName").unwrap_or_default())
                .with_ip(ip.parse().ok());
            devices.push(device);
        }
        Ok(devices)
    }
}
