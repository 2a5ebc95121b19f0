//! N600-class routers: association table over the `/cgi` endpoints

use tracing::info;

use super::{cgi, referer, Router};
use crate::config::ConnectionParams;
use crate::device::Device;
use crate::error::Result;
use crate::http::{authorization_cookie, Request, Transport};

const REFRESH: &str = "/cgi?7";
const ASSOCIATIONS: &str = "/cgi?6";

/// 2.4 GHz and 5 GHz radios
const BANDS: [&str; 2] = ["1", "2"];

pub struct N600<T> {
    params: ConnectionParams,
    transport: T,
}

impl<T: Transport> N600<T> {
    pub fn new(params: ConnectionParams, transport: T) -> Self {
        Self { params, transport }
    }

    async fn post(&self, target: &str, body: String) -> Result<String> {
        let host = &self.params.host;
        let request = Request::post(target)
            .header("Referer", referer(host))
            .header(
                "Cookie",
                authorization_cookie(&self.params.username, &self.params.password),
            )
            .body(body);
        let response = self
            .transport
            .send(host, &request)
            .await?
            .error_for_status(target)?;
        Ok(response.body)
    }
}

impl<T: Transport> Router for N600<T> {
    fn descriptor(&self) -> &'static str {
        "TP-Link N600 (v1)"
    }

    async fn scan_devices(&mut self) -> Result<Vec<Device>> {
        info!("Loading wireless clients...");
        let mut devices = Vec::new();
        for band in BANDS {
            // Ask the radio to refresh its association list first
            self.post(
                REFRESH,
                format!("[ACT_WLAN_UPDATE_ASSOC#1,{},0,0,0,0#0,0,0,0,0,0]0,0\r\n", band),
            )
            .await?;
            let body = self
                .post(
                    ASSOCIATIONS,
                    format!(
                        "[LAN_WLAN_ASSOC_DEV#0,0,0,0,0,0#1,{},0,0,0,0]0,1\r\nAssociatedDeviceMACAddress\r\n",
                        band
                    ),
                )
                .await?;
            for section in cgi::parse(&body)? {
                if let Some(mac) = section.get("AssociatedDeviceMACAddress") {
                    devices.push(Device::new(mac.parse()?));
                }
            }
        }
        Ok(devices)
    }
}
